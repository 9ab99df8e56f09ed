use crate::config::{AppConfig, Credentials};
use crate::error::{AlbumPickerError, Result};
use reqwest::{Client, Request, Response};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Bearer token issued by the accounts service
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Outcome of resolving a free-text query to an artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistLookup {
    Found(String),
    NotFound,
}

/// Cover art entry; the API lists the largest image first
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Album as returned by the artist albums endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Album {
    pub fn cover_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }

    pub fn link(&self) -> Option<&str> {
        self.external_urls.spotify.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    artists: Page<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Port for the three catalog calls the application makes
pub trait AlbumCatalog: Send + Sync {
    fn request_token(&self) -> impl Future<Output = Result<AccessToken>> + Send;

    fn find_artist(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> impl Future<Output = Result<ArtistLookup>> + Send;

    fn artist_albums(
        &self,
        token: &AccessToken,
        artist_id: &str,
    ) -> impl Future<Output = Result<Vec<Album>>> + Send;
}

/// HTTP client for the Spotify accounts service and Web API
pub struct SpotifyClient {
    http_client: Client,
    credentials: Option<Credentials>,
    api_base_url: String,
    accounts_base_url: String,
    market: String,
    album_limit: u32,
}

impl SpotifyClient {
    /// Create a new SpotifyClient; without credentials every token request fails
    pub fn new(config: &AppConfig, credentials: Option<Credentials>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            credentials,
            api_base_url: config.api_base_url.clone(),
            accounts_base_url: config.accounts_base_url.clone(),
            market: config.market.clone(),
            album_limit: config.album_limit,
        })
    }

    /// Client credentials grant, credentials carried in the form body
    pub fn token_request(&self) -> Result<Request> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AlbumPickerError::ConfigError("Spotify client credentials are not configured".to_string())
        })?;

        let request = self
            .http_client
            .post(format!("{}/api/token", self.accounts_base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .build()?;
        Ok(request)
    }

    pub fn artist_search_request(&self, token: &AccessToken, query: &str) -> Result<Request> {
        let request = self
            .http_client
            .get(format!("{}/v1/search", self.api_base_url))
            .query(&[("q", query), ("type", "artist")])
            .bearer_auth(token.as_str())
            .build()?;
        Ok(request)
    }

    pub fn artist_albums_request(&self, token: &AccessToken, artist_id: &str) -> Result<Request> {
        let limit = self.album_limit.to_string();
        let request = self
            .http_client
            .get(format!(
                "{}/v1/artists/{}/albums",
                self.api_base_url,
                urlencoding::encode(artist_id)
            ))
            .query(&[
                ("include_groups", "album"),
                ("market", self.market.as_str()),
                ("limit", limit.as_str()),
            ])
            .bearer_auth(token.as_str())
            .build()?;
        Ok(request)
    }

    async fn send_api_request(&self, request: Request) -> Result<Response> {
        log::debug!("{} {}", request.method(), request.url());

        let response = self.http_client.execute(request).await?;
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 401 {
            Err(AlbumPickerError::AuthenticationFailed(format!(
                "API rejected the access token ({})",
                status
            )))
        } else {
            Err(AlbumPickerError::SpotifyApiError(format!(
                "API returned status: {}",
                status
            )))
        }
    }
}

impl AlbumCatalog for SpotifyClient {
    async fn request_token(&self) -> Result<AccessToken> {
        let request = self.token_request()?;
        log::info!("Requesting access token from {}", request.url());

        let response = self.http_client.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlbumPickerError::AuthenticationFailed(token_failure_reason(
                status, &body,
            )));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(AlbumPickerError::AuthenticationFailed(
                "accounts service returned an empty access token".to_string(),
            ));
        }

        log::info!("Successfully acquired access token");
        Ok(AccessToken::new(token.access_token))
    }

    async fn find_artist(&self, token: &AccessToken, query: &str) -> Result<ArtistLookup> {
        let request = self.artist_search_request(token, query)?;
        let response = self.send_api_request(request).await?;
        let search: ArtistSearchResponse = response.json().await?;

        Ok(first_artist(search))
    }

    async fn artist_albums(&self, token: &AccessToken, artist_id: &str) -> Result<Vec<Album>> {
        let request = self.artist_albums_request(token, artist_id)?;
        let response = self.send_api_request(request).await?;
        let page: Page<Album> = response.json().await?;

        Ok(page.items)
    }
}

fn first_artist(search: ArtistSearchResponse) -> ArtistLookup {
    match search.artists.items.into_iter().next() {
        Some(artist) => ArtistLookup::Found(artist.id),
        None => ArtistLookup::NotFound,
    }
}

fn token_failure_reason(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{} ({}: {})", status, error, description),
        Ok(TokenErrorResponse { error, .. }) => format!("{} ({})", status, error),
        Err(_) => format!("accounts service returned status: {}", status),
    }
}
