//! Discord side of the bot, everything serenity touches lives here

use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tracing::info;

use crate::display::Card;
use crate::error::Result;
use crate::responder::{MessageSink, Responder};

struct Handler {
    responder: Arc<Responder>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let sink = ChannelSink {
            http: Arc::clone(&ctx.http),
            channel_id: msg.channel_id,
        };
        self.responder
            .on_message(msg.author.bot, &msg.content, &sink)
            .await;
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.tag());
    }
}

/// Posts cards as embeds into the channel a message came from
struct ChannelSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

fn to_embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&card.title);
    if let Some(description) = &card.description {
        embed = embed.description(description);
    }
    if let Some(thumbnail) = &card.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    for field in &card.fields {
        embed = embed.field(&field.name, &field.value, false);
    }
    embed
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send_card(&self, card: &Card) -> Result<()> {
        let message = CreateMessage::new().embed(to_embed(card));
        self.channel_id.send_message(&self.http, message).await?;
        Ok(())
    }
}

/// Connect to the gateway and answer messages until the connection ends
pub async fn run(token: &str, responder: Responder) -> Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler {
        responder: Arc::new(responder),
    };

    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await?;

    client.start().await?;
    Ok(())
}
