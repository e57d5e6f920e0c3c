use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::{LinkRecord, MetadataProvider, Source, SourceRecord};
use crate::search::Medium;

const KITSU_API_BASE: &str = "https://kitsu.app/api/edge";
const KITSU_SITE_BASE: &str = "https://kitsu.app";

pub struct KitsuClient {
    client: Client,
}

impl KitsuClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct KitsuResponse {
    data: Vec<KitsuResource>,
}

#[derive(Deserialize)]
struct KitsuResource {
    attributes: KitsuAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KitsuAttributes {
    slug: String,
    canonical_title: Option<String>,
    subtype: Option<String>,
}

fn path(medium: Medium) -> &'static str {
    match medium {
        Medium::Anime => "anime",
        Medium::Manga | Medium::LightNovel => "manga",
    }
}

fn matches_medium(medium: Medium, subtype: Option<&str>) -> bool {
    let is_novel = subtype == Some("novel");
    match medium {
        Medium::Anime => true,
        Medium::Manga => !is_novel,
        Medium::LightNovel => is_novel,
    }
}

fn pick(resp: KitsuResponse, medium: Medium) -> Option<LinkRecord> {
    resp.data
        .into_iter()
        .map(|r| r.attributes)
        .find(|a| matches_medium(medium, a.subtype.as_deref()))
        .map(|a| LinkRecord {
            url: format!("{}/{}/{}", KITSU_SITE_BASE, path(medium), a.slug),
            title: a.canonical_title.unwrap_or_default(),
        })
}

#[async_trait::async_trait]
impl MetadataProvider for KitsuClient {
    fn source(&self) -> Source {
        Source::Kitsu
    }

    async fn search(&self, query: &str, medium: Medium) -> Result<Option<SourceRecord>> {
        let url = format!(
            "{}/{}?filter[text]={}&page[limit]=10",
            KITSU_API_BASE,
            path(medium),
            urlencoding::encode(query)
        );

        debug!(url = %url, "Searching Kitsu");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.api+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Metadata(format!(
                "Kitsu API Error: {}",
                response.status()
            )));
        }

        let resp: KitsuResponse = response.json().await?;
        Ok(pick(resp, medium).map(SourceRecord::Link))
    }
}
