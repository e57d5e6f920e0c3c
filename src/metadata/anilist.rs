//! AniList GraphQL client

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::{
    AiringEpisode, AnilistRecord, AnilistTitle, CoverImage, MetadataProvider, Source, SourceRecord,
    title_case,
};
use crate::search::Medium;

const ANILIST_API: &str = "https://graphql.anilist.co";

const MEDIA_QUERY: &str = r#"
query ($search: String, $type: MediaType, $formatIn: [MediaFormat], $formatNotIn: [MediaFormat]) {
  Media(search: $search, type: $type, format_in: $formatIn, format_not_in: $formatNotIn) {
    siteUrl
    title { romaji english }
    description(asHtml: false)
    coverImage { medium large }
    status
    genres
    episodes
    chapters
    volumes
    nextAiringEpisode { episode airingAt }
  }
}
"#;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

pub struct AnilistClient {
    client: Client,
}

impl AnilistClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<MediaData>,
}

#[derive(Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<AnilistMedia>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnilistMedia {
    site_url: Option<String>,
    title: Option<MediaTitle>,
    description: Option<String>,
    cover_image: Option<MediaCoverImage>,
    status: Option<String>,
    genres: Option<Vec<String>>,
    episodes: Option<u32>,
    chapters: Option<u32>,
    volumes: Option<u32>,
    next_airing_episode: Option<NextAiringEpisode>,
}

#[derive(Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Deserialize)]
struct MediaCoverImage {
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NextAiringEpisode {
    episode: u32,
    airing_at: i64,
}

fn variables(query: &str, medium: Medium) -> serde_json::Value {
    match medium {
        Medium::Anime => json!({ "search": query, "type": "ANIME" }),
        Medium::Manga => json!({ "search": query, "type": "MANGA", "formatNotIn": ["NOVEL"] }),
        Medium::LightNovel => json!({ "search": query, "type": "MANGA", "formatIn": ["NOVEL"] }),
    }
}

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

fn into_record(media: AnilistMedia) -> AnilistRecord {
    let title = media.title.map_or_else(AnilistTitle::default, |t| AnilistTitle {
        romaji: t.romaji,
        english: t.english,
    });
    let cover_image = media.cover_image.map_or_else(CoverImage::default, |c| CoverImage {
        medium: c.medium,
        large: c.large,
    });

    AnilistRecord {
        title,
        description: media.description.as_deref().map(strip_html),
        url: media.site_url.unwrap_or_default(),
        cover_image,
        status: media.status.as_deref().map(title_case),
        genres: media.genres.unwrap_or_default(),
        episodes: media.episodes,
        chapters: media.chapters,
        volumes: media.volumes,
        next_airing_episode: media.next_airing_episode.map(|n| AiringEpisode {
            episode: n.episode,
            airing_at: n.airing_at,
        }),
    }
}

#[async_trait::async_trait]
impl MetadataProvider for AnilistClient {
    fn source(&self) -> Source {
        Source::Anilist
    }

    async fn search(&self, query: &str, medium: Medium) -> Result<Option<SourceRecord>> {
        let body = json!({
            "query": MEDIA_QUERY,
            "variables": variables(query, medium),
        });

        let response = self.client.post(ANILIST_API).json(&body).send().await?;

        // AniList answers an empty search with 404 and a null Media
        if response.status() == StatusCode::NOT_FOUND {
            debug!(query = %query, "No AniList match");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Error::Metadata(format!(
                "AniList API Error: {}",
                response.status()
            )));
        }

        let resp: GraphQlResponse = response.json().await?;
        Ok(resp
            .data
            .and_then(|d| d.media)
            .map(|media| SourceRecord::Anilist(into_record(media))))
    }
}
