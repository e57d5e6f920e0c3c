use std::collections::BTreeMap;

use crate::error::Result;
use crate::search::Medium;

mod aggregator;
pub mod anilist;
pub mod kitsu;
pub mod mal;

pub use aggregator::Aggregator;

/// Upstream sites a record can come from.
///
/// Declaration order is the order links are listed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Mal,
    Anilist,
    Kitsu,
}

impl Source {
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Mal => "MAL",
            Source::Anilist => "AniList",
            Source::Kitsu => "Kitsu",
        }
    }
}

/// Flat MyAnimeList entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MalRecord {
    pub title: String,
    pub synopsis: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub status: Option<String>,
    pub episodes: Option<u32>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
}

/// Nested AniList media entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnilistRecord {
    pub title: AnilistTitle,
    pub description: Option<String>,
    pub url: String,
    pub cover_image: CoverImage,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub episodes: Option<u32>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub next_airing_episode: Option<AiringEpisode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnilistTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverImage {
    pub medium: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiringEpisode {
    pub episode: u32,
    /// Unix timestamp, seconds
    pub airing_at: i64,
}

/// Sites we only link to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkRecord {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Mal(MalRecord),
    Anilist(AnilistRecord),
    Link(LinkRecord),
}

impl SourceRecord {
    pub fn title(&self) -> Option<&str> {
        match self {
            SourceRecord::Mal(r) => non_empty(&r.title),
            SourceRecord::Anilist(r) => r
                .title
                .romaji
                .as_deref()
                .and_then(non_empty)
                .or_else(|| r.title.english.as_deref().and_then(non_empty)),
            SourceRecord::Link(r) => non_empty(&r.title),
        }
    }

    pub fn synopsis(&self) -> Option<&str> {
        match self {
            SourceRecord::Mal(r) => r.synopsis.as_deref().and_then(non_empty),
            SourceRecord::Anilist(r) => r.description.as_deref().and_then(non_empty),
            SourceRecord::Link(_) => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            SourceRecord::Mal(r) => non_empty(&r.url),
            SourceRecord::Anilist(r) => non_empty(&r.url),
            SourceRecord::Link(r) => non_empty(&r.url),
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            SourceRecord::Mal(r) => r.image.as_deref().and_then(non_empty),
            SourceRecord::Anilist(r) => r
                .cover_image
                .large
                .as_deref()
                .and_then(non_empty)
                .or_else(|| r.cover_image.medium.as_deref().and_then(non_empty)),
            SourceRecord::Link(_) => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            SourceRecord::Mal(r) => r.status.as_deref().and_then(non_empty),
            SourceRecord::Anilist(r) => r.status.as_deref().and_then(non_empty),
            SourceRecord::Link(_) => None,
        }
    }

    pub fn episodes(&self) -> Option<u32> {
        match self {
            SourceRecord::Mal(r) => r.episodes,
            SourceRecord::Anilist(r) => r.episodes,
            SourceRecord::Link(_) => None,
        }
    }

    pub fn chapters(&self) -> Option<u32> {
        match self {
            SourceRecord::Mal(r) => r.chapters,
            SourceRecord::Anilist(r) => r.chapters,
            SourceRecord::Link(_) => None,
        }
    }

    pub fn volumes(&self) -> Option<u32> {
        match self {
            SourceRecord::Mal(r) => r.volumes,
            SourceRecord::Anilist(r) => r.volumes,
            SourceRecord::Link(_) => None,
        }
    }

    /// Only AniList carries genres
    pub fn genres(&self) -> Option<&[String]> {
        match self {
            SourceRecord::Anilist(r) if !r.genres.is_empty() => Some(&r.genres),
            _ => None,
        }
    }

    pub fn next_airing_episode(&self) -> Option<AiringEpisode> {
        match self {
            SourceRecord::Anilist(r) => r.next_airing_episode,
            _ => None,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Everything the providers returned for one query, keyed by source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryInfo {
    records: BTreeMap<Source, SourceRecord>,
}

impl EntryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: Source, record: SourceRecord) {
        self.records.insert(source, record);
    }

    pub fn get(&self, source: Source) -> Option<&SourceRecord> {
        self.records.get(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Source, &SourceRecord)> {
        self.records.iter().map(|(source, record)| (*source, record))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<(Source, SourceRecord)> for EntryInfo {
    fn from_iter<I: IntoIterator<Item = (Source, SourceRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// One upstream site
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    fn source(&self) -> Source;

    /// Best match for `query`, or `None` when the site has nothing for it
    async fn search(&self, query: &str, medium: Medium) -> Result<Option<SourceRecord>>;
}

/// Resolves a query against every configured site
#[async_trait::async_trait]
pub trait MetadataBackend: Send + Sync {
    async fn search(&self, query: &str, medium: Medium) -> Result<EntryInfo>;
}

/// `finished_airing` and `NOT_YET_RELEASED` style codes to "Finished Airing"
pub fn title_case(code: &str) -> String {
    code.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
