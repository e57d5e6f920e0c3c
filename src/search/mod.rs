//! Bracket tag grammar for chat messages
//!
//! `{anime}`, `<manga>` and `]light novel[` request a normal card, the doubled
//! forms `{{...}}`, `<<...>>` and `]]...[[` request the expanded one.

mod command;
mod parser;

pub use command::{Command, extract_commands};
pub use parser::{clean_message, searches};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Medium {
    Anime,
    Manga,
    LightNovel,
}

impl Medium {
    pub fn as_display(&self) -> &'static str {
        match self {
            Medium::Anime => "Anime",
            Medium::Manga => "Manga",
            Medium::LightNovel => "Light Novel",
        }
    }
}

impl std::fmt::Display for Medium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_display())
    }
}

/// A single lookup requested by a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub medium: Medium,
    pub search_text: String,
    pub expanded: bool,
}
