mod bot;
mod config;
mod display;
mod error;
mod metadata;
mod responder;
mod search;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::Result;
use crate::metadata::Aggregator;
use crate::responder::Responder;

fn setup_logging() {
    // Console always, plus a daily file in the data dir when we can create it
    let file_layer = match config::data_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }) {
        Ok(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, "oragi.log");
            Some(fmt::layer().with_writer(file_appender).with_ansi(false))
        }
        Err(e) => {
            eprintln!("Warning: Could not set up file logging: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("oragi=info".parse().unwrap()))
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    info!("Starting oragi");

    // Load configuration
    let path = config::config_path()?;
    let config = Config::load_from(&path)?;
    info!(path = %path.display(), "Loaded config");

    let token = config.token(&path)?.to_string();

    // One backend for the lifetime of the process
    let backend = Aggregator::from_config(&config.metadata, &config.cache)?;
    let responder = Responder::new(Box::new(backend), config.footer.clone());

    bot::run(&token, responder).await
}
