//! TMDB API client.

use crate::models::media::{Candidate, MediaDetails, MediaType};
use crate::services::metadata::MetadataProvider;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const LANGUAGE_ZH: &str = "zh-CN";
const LANGUAGE_EN: &str = "en-US";

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API key or Bearer token (JWT)
    pub api_key: String,
    pub language: String,
    /// Whether to use Bearer token authentication (API v4 style)
    pub use_bearer: bool,
}

impl TmdbConfig {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        let api_key = api_key.into();
        // Bearer tokens start with "eyJ" (base64 encoded JWT header)
        let use_bearer = api_key.starts_with("eyJ");
        Self {
            api_key,
            language: language.into(),
            use_bearer,
        }
    }

    /// Create config from environment variable.
    /// Supports both API key (v3) and Bearer token (v4) formats.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("TMDB_API_KEY").map_err(|_| crate::Error::TmdbApiKeyMissing)?;
        Ok(Self::new(api_key, LANGUAGE_ZH))
    }

    /// Create config from the application settings, falling back to the
    /// environment.
    pub fn from_settings(settings: &crate::models::config::TmdbConfig) -> Result<Self> {
        match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Ok(Self::new(key, settings.language.clone())),
            None => Self::from_env(),
        }
    }
}

/// TMDB API client.
pub struct TmdbClient {
    config: TmdbConfig,
    client: reqwest::Client,
}

/// Movie search result.
#[derive(Debug, Deserialize)]
pub struct MovieSearchResult {
    pub results: Vec<MovieSearchItem>,
}

/// Movie search item.
#[derive(Debug, Deserialize)]
pub struct MovieSearchItem {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub release_date: Option<String>,
}

/// TV search result.
#[derive(Debug, Deserialize)]
pub struct TvSearchResult {
    pub results: Vec<TvSearchItem>,
}

/// TV search item.
#[derive(Debug, Deserialize)]
pub struct TvSearchItem {
    pub id: u64,
    pub name: String,
    pub original_name: String,
    pub first_air_date: Option<String>,
}

/// Genre.
#[derive(Debug, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Movie details.
#[derive(Debug, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub release_date: Option<String>,
    pub genres: Option<Vec<Genre>>,
}

/// TV show details.
#[derive(Debug, Deserialize)]
pub struct TvDetails {
    pub id: u64,
    pub name: String,
    pub original_name: String,
    pub first_air_date: Option<String>,
    pub number_of_seasons: u32,
    pub genres: Option<Vec<Genre>>,
}

/// Season details.
#[derive(Debug, Deserialize)]
pub struct SeasonDetails {
    pub season_number: u32,
    pub episodes: Vec<EpisodeInfo>,
}

/// Episode info within a season.
#[derive(Debug, Deserialize)]
pub struct EpisodeInfo {
    pub episode_number: u32,
    pub name: Option<String>,
}

/// Year from a `YYYY-MM-DD` date.
fn year_of(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn genre_names(genres: Option<Vec<Genre>>) -> Vec<String> {
    genres
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.name)
        .collect()
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Create a new TMDB client from environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(TmdbConfig::from_env()?))
    }

    /// Build a request with proper authentication.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        if self.config.use_bearer {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        } else {
            request
        }
    }

    /// Build URL with optional api_key parameter (only for v3 style).
    fn build_url(&self, path: &str, language: &str, extra_params: &str) -> String {
        if self.config.use_bearer {
            format!(
                "{}/{}?language={}{}",
                TMDB_BASE_URL, path, language, extra_params
            )
        } else {
            format!(
                "{}/{}?api_key={}&language={}{}",
                TMDB_BASE_URL, path, self.config.api_key, language, extra_params
            )
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.build_request(url).send().await?;
        if !resp.status().is_success() {
            return Err(crate::Error::TmdbRequest(format!(
                "{} returned {}",
                url.split('?').next().unwrap_or(url),
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    /// Verify API key is valid.
    pub async fn verify_api_key(&self) -> Result<bool> {
        let url = if self.config.use_bearer {
            format!("{}/authentication", TMDB_BASE_URL)
        } else {
            format!(
                "{}/authentication?api_key={}",
                TMDB_BASE_URL, self.config.api_key
            )
        };

        match self.build_request(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Search for movies.
    pub async fn search_movie(&self, query: &str) -> Result<Vec<MovieSearchItem>> {
        let url = self.build_url(
            "search/movie",
            &self.config.language,
            &format!("&query={}", urlencoding::encode(query)),
        );
        let resp: MovieSearchResult = self.get_json(&url).await?;
        Ok(resp.results)
    }

    /// Search for TV shows.
    pub async fn search_tv(&self, query: &str) -> Result<Vec<TvSearchItem>> {
        let url = self.build_url(
            "search/tv",
            &self.config.language,
            &format!("&query={}", urlencoding::encode(query)),
        );
        let resp: TvSearchResult = self.get_json(&url).await?;
        Ok(resp.results)
    }

    /// Get movie details in one language.
    pub async fn get_movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails> {
        let url = self.build_url(&format!("movie/{}", movie_id), language, "");
        self.get_json(&url).await
    }

    /// Get TV show details in one language.
    pub async fn get_tv_details(&self, tv_id: u64, language: &str) -> Result<TvDetails> {
        let url = self.build_url(&format!("tv/{}", tv_id), language, "");
        self.get_json(&url).await
    }

    /// Get season details.
    pub async fn get_season_details(&self, tv_id: u64, season_number: u32) -> Result<SeasonDetails> {
        let url = self.build_url(
            &format!("tv/{}/season/{}", tv_id, season_number),
            &self.config.language,
            "",
        );
        self.get_json(&url).await
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(&self, query: &str, media_type: MediaType) -> Result<Vec<Candidate>> {
        let candidates = match media_type {
            MediaType::Tv => self
                .search_tv(query)
                .await?
                .into_iter()
                .map(|item| Candidate {
                    id: item.id,
                    name: item.name,
                    year: year_of(item.first_air_date.as_deref()),
                    media_type,
                })
                .collect(),
            MediaType::Movie => self
                .search_movie(query)
                .await?
                .into_iter()
                .map(|item| Candidate {
                    id: item.id,
                    name: item.title,
                    year: year_of(item.release_date.as_deref()),
                    media_type,
                })
                .collect(),
        };
        Ok(candidates)
    }

    async fn details(&self, id: u64, media_type: MediaType) -> Result<MediaDetails> {
        tracing::debug!("Fetching TMDB {} details for {}", media_type, id);
        match media_type {
            MediaType::Tv => {
                let (zh, en) = futures::try_join!(
                    self.get_tv_details(id, LANGUAGE_ZH),
                    self.get_tv_details(id, LANGUAGE_EN)
                )?;
                Ok(MediaDetails {
                    id,
                    title_zh: Some(zh.name),
                    title_en: Some(en.name),
                    year: year_of(zh.first_air_date.as_deref()),
                    genres: genre_names(zh.genres),
                    season_count: zh.number_of_seasons,
                })
            }
            MediaType::Movie => {
                let (zh, en) = futures::try_join!(
                    self.get_movie_details(id, LANGUAGE_ZH),
                    self.get_movie_details(id, LANGUAGE_EN)
                )?;
                Ok(MediaDetails {
                    id,
                    title_zh: Some(zh.title),
                    title_en: Some(en.title),
                    year: year_of(zh.release_date.as_deref()),
                    genres: genre_names(zh.genres),
                    season_count: 0,
                })
            }
        }
    }

    async fn season_episode_count(&self, id: u64, season: u32) -> Result<u32> {
        let details = self.get_season_details(id, season).await?;
        Ok(details.episodes.len() as u32)
    }
}
