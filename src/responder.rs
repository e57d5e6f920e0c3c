use tracing::{debug, info, warn};

use crate::display::{Card, DisplayPayload, render};
use crate::error::Result;
use crate::metadata::MetadataBackend;
use crate::search::{Command, QueryDescriptor, clean_message, extract_commands, searches};

/// Where cards end up, a Discord channel in production
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_card(&self, card: &Card) -> Result<()>;
}

/// Answers one chat message: runs its commands, then looks up every tag in turn
pub struct Responder {
    backend: Box<dyn MetadataBackend>,
    footer: String,
}

impl Responder {
    pub fn new(backend: Box<dyn MetadataBackend>, footer: String) -> Self {
        Self { backend, footer }
    }

    /// Entry point for chat events. Other bots are never answered.
    pub async fn on_message(&self, author_is_bot: bool, content: &str, sink: &dyn MessageSink) {
        if author_is_bot {
            debug!("Ignoring message from a bot");
            return;
        }
        self.handle_message(content, sink).await;
    }

    pub async fn handle_message(&self, content: &str, sink: &dyn MessageSink) {
        let cleaned = clean_message(content);
        let (text, commands) = extract_commands(&cleaned);

        for command in commands {
            self.run_command(command, sink).await;
        }

        for query in searches(&text, true) {
            if let Some(card) = self.lookup(&query).await {
                info!(title = %card.title, "Found entry, creating message");
                if let Err(e) = sink.send_card(&card).await {
                    warn!("Failed to send card for {}: {}", query.search_text, e);
                }
            }
        }
    }

    async fn run_command(&self, command: Command, sink: &dyn MessageSink) {
        match command {
            Command::Help => {
                if let Err(e) = sink.send_card(&Card::help(&self.footer)).await {
                    warn!("Exception occurred when sending help: {}", e);
                }
            }
            // TODO: store the preference per channel once there is somewhere to keep it
            Command::ToggleExpanded => debug!("Toggle expanded requested, not supported yet"),
            Command::Unknown(name) => debug!(command = %name, "Ignoring unknown command"),
        }
    }

    async fn lookup(&self, query: &QueryDescriptor) -> Option<Card> {
        info!(
            search = %query.search_text,
            medium = %query.medium,
            expanded = query.expanded,
            "Searching"
        );

        let entry = match self.backend.search(&query.search_text, query.medium).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error searching for {}: {}", query.search_text, e);
                return None;
            }
        };

        let payload = match DisplayPayload::build(query.medium, &entry) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(search = %query.search_text, sources = entry.len(), "Skipping: {}", e);
                return None;
            }
        };

        match render(&payload, query.expanded, &self.footer) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("Error creating card: {}", e);
                None
            }
        }
    }
}
