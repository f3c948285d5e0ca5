use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::{FetchError, Timeouts, get_text};

use super::episode::Episode;

pub(crate) const DEFAULT_CATALOG_URL: &str = "https://api.jikan.moe/v4";
pub(crate) const DEFAULT_ANIME_ID: u32 = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogPage {
    pub(crate) episodes: Vec<Episode>,
    pub(crate) has_next_page: bool,
}

pub(crate) trait CatalogSource {
    fn fetch_page(&mut self, page: u32) -> Result<CatalogPage, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CatalogOrigin {
    Remote { pages: u32 },
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedCatalog {
    pub(crate) episodes: Vec<Episode>,
    pub(crate) origin: CatalogOrigin,
}

#[derive(Debug, Clone)]
pub(crate) struct JikanCatalog {
    base_url: String,
    anime_id: u32,
    timeouts: Timeouts,
}

impl JikanCatalog {
    pub(crate) fn new(base_url: &str, anime_id: u32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anime_id,
            timeouts: Timeouts::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn episodes_url(&self) -> String {
        format!("{}/anime/{}/episodes", self.base_url, self.anime_id)
    }
}

impl CatalogSource for JikanCatalog {
    fn fetch_page(&mut self, page: u32) -> Result<CatalogPage, FetchError> {
        let query = vec![("page".to_string(), page.to_string())];
        let body = get_text(&self.episodes_url(), &query, self.timeouts)?;
        parse_episode_page(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RawEpisodePage {
    #[serde(default)]
    data: Vec<RawEpisode>,
    #[serde(default)]
    pagination: RawPagination,
}

#[derive(Debug, Default, Deserialize)]
struct RawPagination {
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    mal_id: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    episode_number: Option<u32>,
}

pub(crate) fn parse_episode_page(raw: &str) -> Result<CatalogPage, FetchError> {
    let page: RawEpisodePage =
        serde_json::from_str(raw).map_err(|err| FetchError::Decode(err.to_string()))?;
    let episodes = page
        .data
        .into_iter()
        .map(|item| {
            let title = item
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| format!("Episode {}", item.mal_id));
            Episode::new(item.mal_id, title, item.episode_number.unwrap_or(item.mal_id))
        })
        .collect();
    Ok(CatalogPage {
        episodes,
        has_next_page: page.pagination.has_next_page,
    })
}

pub(crate) fn fetch_all(
    source: &mut dyn CatalogSource,
) -> Result<(Vec<Episode>, u32), FetchError> {
    let mut episodes = Vec::new();
    let mut page = 1;
    loop {
        let fetched = source.fetch_page(page)?;
        debug!(
            page,
            count = fetched.episodes.len(),
            has_next_page = fetched.has_next_page,
            "fetched catalog page"
        );
        episodes.extend(fetched.episodes);
        if !fetched.has_next_page {
            return Ok((episodes, page));
        }
        page += 1;
    }
}

pub(crate) fn fallback_episodes() -> Vec<Episode> {
    vec![
        Episode::new(
            1,
            "I'm Luffy! The Man Who's Gonna Be King of the Pirates!",
            1,
        ),
        Episode::new(
            2,
            "Enter the Great Swordsman! Pirate Hunter Roronoa Zoro!",
            2,
        ),
    ]
}

pub(crate) fn load_episodes(source: &mut dyn CatalogSource) -> LoadedCatalog {
    match fetch_all(source) {
        Ok((episodes, pages)) => {
            info!(pages, episodes = episodes.len(), "catalog fetched");
            LoadedCatalog {
                episodes,
                origin: CatalogOrigin::Remote { pages },
            }
        }
        Err(err) => {
            warn!(error = %err, "catalog fetch failed; using fallback episode list");
            LoadedCatalog {
                episodes: fallback_episodes(),
                origin: CatalogOrigin::Fallback {
                    reason: err.to_string(),
                },
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OfflineCatalog;

impl CatalogSource for OfflineCatalog {
    fn fetch_page(&mut self, _page: u32) -> Result<CatalogPage, FetchError> {
        Err(FetchError::Transport("offline mode".to_string()))
    }
}
