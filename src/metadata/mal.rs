use crate::error::{Error, Result};
use crate::metadata::{MalRecord, MetadataProvider, Source, SourceRecord, title_case};
use crate::search::Medium;
use reqwest::{Client, header};
use serde::Deserialize;

const MAL_API_BASE: &str = "https://api.myanimelist.net/v2";
const MAL_SITE_BASE: &str = "https://myanimelist.net";

const ANIME_FIELDS: &str = "synopsis,main_picture,status,num_episodes";
const MANGA_FIELDS: &str = "synopsis,main_picture,status,num_chapters,num_volumes,media_type";

/// MAL files light novels under manga with one of these media types
const NOVEL_MEDIA_TYPES: &[&str] = &["light_novel", "novel"];

pub struct MalClient {
    client: Client,
}

impl MalClient {
    pub fn new(client_id: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "X-MAL-CLIENT-ID",
            header::HeaderValue::from_str(client_id)
                .map_err(|e| Error::Metadata(format!("Invalid MAL client id: {}", e)))?,
        );

        let client = Client::builder()
            .user_agent(concat!("oragi/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[derive(Deserialize)]
struct MalSearchResponse {
    data: Vec<MalNode>,
}

#[derive(Deserialize)]
struct MalNode {
    node: MalEntryData,
}

#[derive(Deserialize)]
struct MalEntryData {
    id: u64,
    title: String,
    main_picture: Option<MalPicture>,
    synopsis: Option<String>,
    status: Option<String>,
    num_episodes: Option<u32>,
    num_chapters: Option<u32>,
    num_volumes: Option<u32>,
    media_type: Option<String>,
}

#[derive(Deserialize)]
struct MalPicture {
    #[serde(default)]
    medium: Option<String>,
    #[serde(default)]
    large: Option<String>,
}

fn endpoint(medium: Medium) -> (&'static str, &'static str) {
    match medium {
        Medium::Anime => ("anime", ANIME_FIELDS),
        Medium::Manga | Medium::LightNovel => ("manga", MANGA_FIELDS),
    }
}

/// Whether a manga search hit belongs to the requested medium
fn matches_medium(medium: Medium, media_type: Option<&str>) -> bool {
    let is_novel = media_type.is_some_and(|t| NOVEL_MEDIA_TYPES.contains(&t));
    match medium {
        Medium::Anime => true,
        Medium::Manga => !is_novel,
        Medium::LightNovel => is_novel,
    }
}

fn into_record(entry: MalEntryData, path: &str) -> MalRecord {
    MalRecord {
        url: format!("{}/{}/{}", MAL_SITE_BASE, path, entry.id),
        title: entry.title,
        synopsis: entry.synopsis,
        image: entry.main_picture.and_then(|p| p.large.or(p.medium)),
        status: entry.status.as_deref().map(title_case),
        episodes: entry.num_episodes.filter(|n| *n > 0),
        chapters: entry.num_chapters.filter(|n| *n > 0),
        volumes: entry.num_volumes.filter(|n| *n > 0),
    }
}

#[async_trait::async_trait]
impl MetadataProvider for MalClient {
    fn source(&self) -> Source {
        Source::Mal
    }

    async fn search(&self, query: &str, medium: Medium) -> Result<Option<SourceRecord>> {
        let (path, fields) = endpoint(medium);
        let url = format!("{}/{}", MAL_API_BASE, path);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", "10"), ("fields", fields)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Metadata(format!(
                "MAL API Error: {}",
                response.status()
            )));
        }

        let resp_json: MalSearchResponse = response.json().await?;

        let record = resp_json
            .data
            .into_iter()
            .map(|node| node.node)
            .find(|entry| matches_medium(medium, entry.media_type.as_deref()))
            .map(|entry| SourceRecord::Mal(into_record(entry, path)));

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novels_split_from_manga() {
        assert!(matches_medium(Medium::LightNovel, Some("light_novel")));
        assert!(matches_medium(Medium::LightNovel, Some("novel")));
        assert!(!matches_medium(Medium::LightNovel, Some("manga")));
        assert!(!matches_medium(Medium::LightNovel, None));
        assert!(matches_medium(Medium::Manga, Some("manhwa")));
        assert!(!matches_medium(Medium::Manga, Some("light_novel")));
        assert!(matches_medium(Medium::Anime, Some("tv")));
    }

    #[test]
    fn test_search_response_into_record() {
        let json = r#"{
            "data": [{
                "node": {
                    "id": 9919,
                    "title": "Nisekoi",
                    "main_picture": {"medium": "http://img/m", "large": "http://img/l"},
                    "synopsis": "Raku Ichijou...",
                    "status": "finished",
                    "num_chapters": 229,
                    "num_volumes": 0,
                    "media_type": "manga"
                }
            }]
        }"#;
        let resp: MalSearchResponse = serde_json::from_str(json).unwrap();
        let entry = resp.data.into_iter().next().unwrap().node;
        let record = into_record(entry, "manga");

        assert_eq!(record.url, "https://myanimelist.net/manga/9919");
        assert_eq!(record.image.as_deref(), Some("http://img/l"));
        assert_eq!(record.status.as_deref(), Some("Finished"));
        assert_eq!(record.chapters, Some(229));
        // MAL reports unknown counts as zero
        assert_eq!(record.volumes, None);
        assert_eq!(record.episodes, None);
    }
}
