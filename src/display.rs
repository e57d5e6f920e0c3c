//! Turning lookup results into cards
//!
//! [`DisplayPayload::build`] merges the per-site records of one lookup into a
//! single entry, [`render`] lays that entry out the way it is posted.

use chrono::{TimeDelta, Utc};

use crate::error::{Error, Result};
use crate::metadata::{AiringEpisode, EntryInfo, Source, SourceRecord};
use crate::search::Medium;

/// Sites that fill the card, most trusted first. Every field is taken from the
/// first of these that has it.
const PRIORITY: [Source; 2] = [Source::Mal, Source::Anilist];

/// Source of genres and airing schedules, MAL records carry neither
const SECONDARY: Source = Source::Anilist;

const SYNOPSIS_LIMIT: usize = 1023;
const SYNOPSIS_CUT: usize = 1020;

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_LIMIT: usize = 1024;

const HELP_TEXT: &str = "You can call the bot by using specific tags on one of the active servers.\n\n\
Anime can be called using {curly braces}, manga can be called using <arrows> and light novels \
can be called using reverse ]square braces[ (e.g. {Nisekoi} or <Bonnouji> or \
]Utsuro no Hako to Zero no Maria[).\n\n\
{Single} will give you a normal set of information while {{double}} will give you expanded \
information. Only one expanded card is sent per message. Examples of these requests can be found \
[here](https://github.com/dashwav/Discordoragi/wiki/Example-Output).";

/// One lookup, merged and ready to lay out
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPayload {
    pub title: String,
    pub links: String,
    pub image: Option<String>,
    pub info: Vec<(&'static str, String)>,
    pub synopsis: String,
}

/// First value `field` yields walking the priority list
fn resolve<'a, T>(
    entry: &'a EntryInfo,
    field: impl FnMut(&'a SourceRecord) -> Option<T>,
) -> Option<T> {
    PRIORITY
        .iter()
        .filter_map(|source| entry.get(*source))
        .find_map(field)
}

impl DisplayPayload {
    pub fn build(medium: Medium, entry: &EntryInfo) -> Result<Self> {
        if PRIORITY.iter().all(|source| entry.get(*source).is_none()) {
            return Err(Error::MissingData);
        }

        let title = resolve(entry, SourceRecord::title).ok_or(Error::MissingData)?;

        let links = entry
            .iter()
            .filter_map(|(source, record)| {
                record
                    .url()
                    .map(|url| format!("[{}]({})", source.display_name(), url))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let secondary = entry.get(SECONDARY);

        let mut info = vec![("Medium", medium.as_display().to_string())];
        if let Some(genres) = secondary.and_then(SourceRecord::genres) {
            info.push(("Genres", genres.join(", ")));
        }
        if let Some(status) = resolve(entry, SourceRecord::status) {
            info.push(("Status", status.to_string()));
        }

        match medium {
            Medium::Anime => {
                if let Some(episodes) = resolve(entry, SourceRecord::episodes) {
                    info.push(("Episodes", episodes.to_string()));
                }
                if let Some(next) = secondary.and_then(SourceRecord::next_airing_episode) {
                    info.push(("Next Episode", format_next_episode(next)));
                }
            }
            Medium::Manga | Medium::LightNovel => {
                if let Some(chapters) = resolve(entry, SourceRecord::chapters) {
                    info.push(("Chapters", chapters.to_string()));
                }
                if let Some(volumes) = resolve(entry, SourceRecord::volumes) {
                    info.push(("Volumes", volumes.to_string()));
                }
            }
        }

        Ok(Self {
            title: title.to_string(),
            links,
            image: resolve(entry, SourceRecord::image).map(str::to_string),
            info,
            synopsis: resolve(entry, SourceRecord::synopsis)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// `(Medium: Anime | Status: Finished Airing | Episodes: 20)`
    pub fn info_line(&self) -> String {
        let parts: Vec<_> = self
            .info
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect();
        format!("({})", parts.join(" | "))
    }
}

fn format_next_episode(next: AiringEpisode) -> String {
    let remaining = TimeDelta::seconds(next.airing_at - Utc::now().timestamp());
    if remaining <= TimeDelta::zero() {
        return format!("Ep {} airing now", next.episode);
    }
    format!("Ep {} in {}", next.episode, format_countdown(remaining))
}

fn format_countdown(remaining: TimeDelta) -> String {
    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes.max(1))
    }
}

/// Synopsis text for the description field, cut to what a field can hold
pub fn truncate_synopsis(synopsis: &str) -> String {
    let synopsis = synopsis.trim_end();
    if synopsis.chars().count() > SYNOPSIS_LIMIT {
        let cut: String = synopsis.chars().take(SYNOPSIS_CUT).collect();
        format!("{}...", cut)
    } else {
        synopsis.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
}

/// A rich message as handed to the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub fields: Vec<CardField>,
}

impl Card {
    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn help(footer: &str) -> Self {
        let mut card = Card {
            title: "__Help__".to_string(),
            description: Some(HELP_TEXT.to_string()),
            thumbnail: None,
            fields: Vec::new(),
        };
        push_footer(&mut card, footer);
        card
    }
}

fn footer_rule() -> String {
    "\\_".repeat(59)
}

fn push_footer(card: &mut Card, footer: &str) {
    if !footer.trim().is_empty() {
        card.fields.push(CardField {
            name: footer_rule(),
            value: footer.to_string(),
        });
    }
}

/// Lay out `payload` as a card. The description field only appears when
/// `expanded` is set.
pub fn render(payload: &DisplayPayload, expanded: bool, footer: &str) -> Result<Card> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(Error::Render("entry has no title".to_string()));
    }
    let title = if title.chars().count() > TITLE_LIMIT {
        let cut: String = title.chars().take(TITLE_LIMIT - 3).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    };

    if payload.links.chars().count() > DESCRIPTION_LIMIT {
        return Err(Error::Render("link list too long".to_string()));
    }

    let mut card = Card {
        title,
        description: Some(payload.links.clone()).filter(|links| !links.is_empty()),
        thumbnail: payload
            .image
            .clone()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://")),
        fields: vec![CardField {
            name: "__Info__".to_string(),
            value: payload.info_line(),
        }],
    };

    if expanded {
        let synopsis = truncate_synopsis(&payload.synopsis);
        if !synopsis.is_empty() {
            card.fields.push(CardField {
                name: "__Description__".to_string(),
                value: synopsis,
            });
        }
    }

    push_footer(&mut card, footer);

    if let Some(field) = card.fields.iter().find(|f| f.value.chars().count() > FIELD_LIMIT) {
        return Err(Error::Render(format!("field {} too long", field.name)));
    }

    Ok(card)
}
