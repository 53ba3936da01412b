//! RaiPlay catalog client: HTML show page → episode JSON → episode descriptors.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::EpisodeCatalog;
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::types::EpisodeDescriptor;

/// Custom element on show pages that points at the episode JSON
const EPISODE_INDEX_ELEMENT: &str = "rai-episodes";

/// Attributes of [`EPISODE_INDEX_ELEMENT`] joined with `/` to form the JSON path
const EPISODE_INDEX_ATTRIBUTES: [&str; 4] = ["base_path", "block", "set", "episode_path"];

/// [`EpisodeCatalog`] backed by the RaiPlay website
pub struct RaiPlayCatalog {
    client: reqwest::Client,
    base_url: Url,
}

impl RaiPlayCatalog {
    /// Create a client from catalog settings
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| CatalogError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::http(config.base_url.clone(), e))?;

        Ok(Self { client, base_url })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        tracing::debug!(url, "catalog request");
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CatalogError::http(url, e))
    }

    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        self.get(url)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::UnexpectedShape(format!("{url} is not valid JSON: {e}")))
    }

    fn join(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url.join(path).map_err(|e| CatalogError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl EpisodeCatalog for RaiPlayCatalog {
    async fn fetch_episodes(
        &self,
        show_url: &str,
        season_index: usize,
    ) -> Result<Vec<EpisodeDescriptor>, CatalogError> {
        let page = self
            .get(show_url)
            .await?
            .text()
            .await
            .map_err(|e| CatalogError::http(show_url, e))?;

        let index_path = episode_index_path(&page)?;
        let index_url = self.join(&index_path)?;
        let data = self.get_json(index_url.as_str()).await?;

        let episodes = parse_season(&data, season_index, &self.base_url)?;
        tracing::info!(
            show_url,
            season_index,
            episodes = episodes.len(),
            "fetched episode list"
        );
        Ok(episodes)
    }

    async fn episode_title(&self, episode_url: &str) -> Result<String, CatalogError> {
        let json_url = episode_url.replace(".html", ".json");
        let data = self.get_json(&json_url).await?;
        data.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::UnexpectedShape(format!("{json_url} has no \"name\"")))
    }

    fn name(&self) -> &'static str {
        "raiplay"
    }
}

/// Extract the episode JSON path from a show page.
///
/// The path is `{base_path}/{block}/{set}/{episode_path}` read from the attributes of
/// the first `rai-episodes` element.
pub(crate) fn episode_index_path(html: &str) -> Result<String, CatalogError> {
    let selector = Selector::parse(EPISODE_INDEX_ELEMENT)
        .map_err(|e| CatalogError::UnexpectedShape(format!("bad selector: {e}")))?;
    let document = Html::parse_document(html);

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| CatalogError::MissingEpisodeIndex {
            missing: EPISODE_INDEX_ELEMENT.to_string(),
        })?;

    let parts = EPISODE_INDEX_ATTRIBUTES
        .iter()
        .map(|attr| {
            element
                .value()
                .attr(attr)
                .ok_or_else(|| CatalogError::MissingEpisodeIndex {
                    missing: format!("{EPISODE_INDEX_ELEMENT}[{attr}]"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parts.join("/"))
}

/// Turn the episode JSON into descriptors for one season.
///
/// Expected shape: `seasons[season_index].episodes[0].cards[*]{name, weblink}`.
pub(crate) fn parse_season(
    data: &Value,
    season_index: usize,
    base_url: &Url,
) -> Result<Vec<EpisodeDescriptor>, CatalogError> {
    let seasons = data
        .get("seasons")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::UnexpectedShape("missing \"seasons\" array".into()))?;

    let season = seasons
        .get(season_index)
        .ok_or(CatalogError::SeasonOutOfRange {
            requested: season_index,
            available: seasons.len(),
        })?;

    let cards = season
        .pointer("/episodes/0/cards")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CatalogError::UnexpectedShape(format!(
                "season {season_index} has no episodes[0].cards array"
            ))
        })?;

    cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let field = |key: &str| {
                card.get(key).and_then(Value::as_str).ok_or_else(|| {
                    CatalogError::UnexpectedShape(format!("card {i} has no \"{key}\""))
                })
            };
            let name = field("name")?;
            let weblink = field("weblink")?;
            let url = base_url.join(weblink).map_err(|e| CatalogError::InvalidUrl {
                url: weblink.to_string(),
                reason: e.to_string(),
            })?;
            Ok(EpisodeDescriptor::new(name, url.as_str(), i + 1))
        })
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHOW_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <rai-episodes base_path="/programmi/ilcommissario" block="stagioni" set="ContentSet-123" episode_path="episodes.json"></rai-episodes>
</body></html>"#;

    fn season_json() -> Value {
        json!({
            "seasons": [
                { "episodes": [ { "cards": [
                    { "name": "Episodio 1", "weblink": "/video/2024/01/ep1.html" },
                    { "name": "Episodio 2", "weblink": "/video/2024/01/ep2.html" }
                ] } ] },
                { "episodes": [ { "cards": [
                    { "name": "S2 Episodio 1", "weblink": "/video/2025/01/s2ep1.html" }
                ] } ] }
            ]
        })
    }

    fn base() -> Url {
        Url::parse("https://www.raiplay.it").unwrap()
    }

    fn catalog_for(server: &MockServer) -> RaiPlayCatalog {
        RaiPlayCatalog::new(&CatalogConfig {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            ..CatalogConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn index_path_joins_attributes() {
        assert_eq!(
            episode_index_path(SHOW_PAGE).unwrap(),
            "/programmi/ilcommissario/stagioni/ContentSet-123/episodes.json"
        );
    }

    #[test]
    fn index_path_requires_element() {
        let err = episode_index_path("<html><body><p>nothing</p></body></html>").unwrap_err();
        assert!(matches!(err, CatalogError::MissingEpisodeIndex { ref missing } if missing == "rai-episodes"));
    }

    #[test]
    fn index_path_requires_every_attribute() {
        let html = r#"<rai-episodes base_path="/p" block="b" episode_path="e.json"></rai-episodes>"#;
        let err = episode_index_path(html).unwrap_err();
        assert!(matches!(err, CatalogError::MissingEpisodeIndex { ref missing } if missing == "rai-episodes[set]"));
    }

    #[test]
    fn parse_season_assigns_contiguous_ordinals() {
        let episodes = parse_season(&season_json(), 0, &base()).unwrap();

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].display_name, "Episodio 1");
        assert_eq!(episodes[0].source_url, "https://www.raiplay.it/video/2024/01/ep1.html");
        assert_eq!(episodes[0].ordinal, 1);
        assert_eq!(episodes[1].ordinal, 2);
    }

    #[test]
    fn parse_season_out_of_range() {
        let err = parse_season(&season_json(), 5, &base()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::SeasonOutOfRange {
                requested: 5,
                available: 2
            }
        ));
    }

    #[test]
    fn parse_season_rejects_unexpected_shape() {
        let err = parse_season(&json!({ "seasons": [ { "episodes": [] } ] }), 0, &base()).unwrap_err();
        assert!(matches!(err, CatalogError::UnexpectedShape(_)));

        let err = parse_season(&json!({ "items": [] }), 0, &base()).unwrap_err();
        assert!(matches!(err, CatalogError::UnexpectedShape(_)));

        let missing_link = json!({ "seasons": [ { "episodes": [ { "cards": [ { "name": "x" } ] } ] } ] });
        let err = parse_season(&missing_link, 0, &base()).unwrap_err();
        assert!(err.to_string().contains("weblink"));
    }

    #[tokio::test]
    async fn fetch_episodes_follows_show_page_to_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/programmi/ilcommissario"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SHOW_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/programmi/ilcommissario/stagioni/ContentSet-123/episodes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(season_json()))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let show_url = format!("{}/programmi/ilcommissario", server.uri());
        let episodes = catalog.fetch_episodes(&show_url, 1).await.unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].display_name, "S2 Episodio 1");
        assert_eq!(
            episodes[0].source_url,
            format!("{}/video/2025/01/s2ep1.html", server.uri())
        );
    }

    #[tokio::test]
    async fn fetch_episodes_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/programmi/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let err = catalog
            .fetch_episodes(&format!("{}/programmi/missing", server.uri()), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Http { .. }));
    }

    #[tokio::test]
    async fn episode_title_reads_json_sibling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/2024/01/ep1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Episodio 1" })))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let title = catalog
            .episode_title(&format!("{}/video/2024/01/ep1.html", server.uri()))
            .await
            .unwrap();

        assert_eq!(title, "Episodio 1");
    }

    #[tokio::test]
    async fn episode_title_requires_name_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/x.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "nope" })))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let err = catalog
            .episode_title(&format!("{}/video/x.html", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::UnexpectedShape(_)));
    }
}
