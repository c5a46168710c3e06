//! HTTP client for the daemon's `/api/v2` surface.

use std::time::Duration;

use qbweb_models::{
    AddTorrentsRequest, LogEntry, LoginCredentials, MainDataUpdate, Preferences, TorrentAction,
    TorrentFile, TorrentPeers, TrackerEntry, TransferInfo,
};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::raw::RawCall;

/// Versioned base path every endpoint lives under.
pub const API_BASE_PATH: &str = "/api/v2";
/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const TORRENT_FILE_FIELD: &str = "torrents";
const TORRENT_MIME: &str = "application/x-bittorrent";

type FormFields = Vec<(&'static str, String)>;

/// Connection settings for [`ApiClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Origin the web UI is served from, e.g. `http://127.0.0.1:8080/`.
    pub base_url: Url,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Settings for `base_url` with the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Parse the daemon origin from user input.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when `input` is not an absolute URL.
    pub fn parse(input: &str) -> ApiResult<Self> {
        let base_url = input.parse::<Url>().map_err(|source| ApiError::InvalidUrl {
            url: input.to_string(),
            source,
        })?;
        Ok(Self::new(base_url))
    }

    /// Replace the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of `/auth/login`. Both accepted and rejected credentials resolve
/// to this value; the daemon answers `Ok.` or `Fails.` in the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    /// HTTP status, either 200 or 403.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl LoginResponse {
    /// Whether the daemon accepted the credentials.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == StatusCode::OK.as_u16() && self.body.trim() == "Ok."
    }
}

/// Async client bound to one daemon.
///
/// Cloning is cheap and clones share the session cookie set by
/// [`ApiClient::login`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    api_root: Url,
}

impl ApiClient {
    /// Build a client for the daemon described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot host the API path or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let api_root = api_root(&config.base_url)?;

        let mut default_headers = HeaderMap::new();
        let referer = HeaderValue::from_str(config.base_url.as_str())
            .map_err(|_| ApiError::InvalidHeader { name: "referer" })?;
        default_headers.insert(REFERER, referer);

        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;

        Ok(Self { http, api_root })
    }

    /// Absolute URL of the API root (`<origin>/api/v2/`).
    #[must_use]
    pub const fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// `GET /app/version`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn app_version(&self) -> ApiResult<String> {
        const PATH: &str = "/app/version";
        let response = self.execute(PATH, self.get(PATH, Vec::new())?).await?;
        read_text(PATH, response).await
    }

    /// `GET /app/webapiVersion`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn api_version(&self) -> ApiResult<String> {
        const PATH: &str = "/app/webapiVersion";
        let response = self.execute(PATH, self.get(PATH, Vec::new())?).await?;
        read_text(PATH, response).await
    }

    /// `POST /auth/login`. A 403 resolves normally so the caller can inspect
    /// the body; only other non-200 statuses are errors.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a status other than 200/403.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<LoginResponse> {
        const PATH: &str = "/auth/login";
        let builder = self.http.post(self.url(PATH)?).form(credentials);
        debug!(method = "POST", path = PATH, "api request");
        let response = builder
            .send()
            .await
            .map_err(|source| transport(PATH, source))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::FORBIDDEN {
            return Err(status_error(PATH, response).await);
        }
        let body = read_text(PATH, response).await?;
        Ok(LoginResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /transfer/info`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn transfer_info(&self) -> ApiResult<TransferInfo> {
        const PATH: &str = "/transfer/info";
        let response = self.execute(PATH, self.get(PATH, Vec::new())?).await?;
        read_json(PATH, response).await
    }

    /// `GET /app/preferences`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn app_preferences(&self) -> ApiResult<Preferences> {
        const PATH: &str = "/app/preferences";
        let response = self.execute(PATH, self.get(PATH, Vec::new())?).await?;
        read_json(PATH, response).await
    }

    /// `POST /app/setPreferences` with the preferences serialised into the
    /// `json` form field.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be encoded, on transport
    /// failure or on a non-2xx status.
    pub async fn set_preferences(&self, preferences: &Preferences) -> ApiResult<String> {
        const PATH: &str = "/app/setPreferences";
        let builder = self.set_preferences_request(preferences)?;
        let response = self.execute(PATH, builder).await?;
        read_text(PATH, response).await
    }

    /// Turn off the alternative web UI so the daemon serves its bundled one.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::set_preferences`].
    pub async fn switch_to_legacy_ui(&self) -> ApiResult<String> {
        let mut preferences = Preferences::new();
        preferences.insert("alternative_webui_enabled".to_string(), Value::Bool(false));
        self.set_preferences(&preferences).await
    }

    /// `GET /sync/maindata`, sending `rid` when a cursor is known.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn main_data(&self, rid: Option<u64>) -> ApiResult<MainDataUpdate> {
        const PATH: &str = "/sync/maindata";
        let mut query = Vec::new();
        push_query(&mut query, "rid", rid);
        let response = self.execute(PATH, self.get(PATH, query)?).await?;
        read_json(PATH, response).await
    }

    /// `POST /torrents/add`. With files attached the body is multipart
    /// (scalar fields plus one `torrents` part per file); otherwise it is
    /// URL-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn add_torrents(
        &self,
        request: &AddTorrentsRequest,
        files: &[TorrentFile],
    ) -> ApiResult<String> {
        const PATH: &str = "/torrents/add";
        let builder = self.add_torrents_request(request, files)?;
        let response = self.execute(PATH, builder).await?;
        read_text(PATH, response).await
    }

    /// `POST /transfer/toggleSpeedLimitsMode`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn toggle_speed_limits_mode(&self) -> ApiResult<String> {
        const PATH: &str = "/transfer/toggleSpeedLimitsMode";
        let builder = self.http.post(self.url(PATH)?);
        let response = self.execute(PATH, builder).await?;
        read_text(PATH, response).await
    }

    /// `POST /torrents/<action>` for the given hashes.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn torrent_action(
        &self,
        action: &TorrentAction,
        hashes: &[String],
    ) -> ApiResult<String> {
        let path = format!("/torrents/{}", action.endpoint());
        let builder = self.post_form(&path, &action.form_fields(hashes))?;
        let response = self.execute(&path, builder).await?;
        read_text(&path, response).await
    }

    /// Remove torrents, optionally deleting their files.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn delete_torrents(
        &self,
        hashes: &[String],
        delete_files: bool,
    ) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::Delete { delete_files }, hashes)
            .await
    }

    /// Pause torrents.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn pause_torrents(&self, hashes: &[String]) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::Pause, hashes).await
    }

    /// Resume torrents.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn resume_torrents(&self, hashes: &[String]) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::Resume, hashes).await
    }

    /// Reannounce torrents to their trackers.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn reannounce_torrents(&self, hashes: &[String]) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::Reannounce, hashes).await
    }

    /// Recheck torrent data.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn recheck_torrents(&self, hashes: &[String]) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::Recheck, hashes).await
    }

    /// Assign a category to torrents.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn set_torrents_category(
        &self,
        hashes: &[String],
        category: &str,
    ) -> ApiResult<String> {
        let action = TorrentAction::SetCategory {
            category: category.to_string(),
        };
        self.torrent_action(&action, hashes).await
    }

    /// Toggle automatic torrent management.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::torrent_action`].
    pub async fn set_torrents_automatic(
        &self,
        hashes: &[String],
        enable: bool,
    ) -> ApiResult<String> {
        self.torrent_action(&TorrentAction::SetAutoManagement { enable }, hashes)
            .await
    }

    /// `GET /torrents/trackers` for one torrent.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn torrent_trackers(&self, hash: &str) -> ApiResult<Vec<TrackerEntry>> {
        const PATH: &str = "/torrents/trackers";
        let query = vec![("hash", hash.to_string())];
        let response = self.execute(PATH, self.get(PATH, query)?).await?;
        read_json(PATH, response).await
    }

    /// `GET /sync/torrentPeers` for one torrent, sending `rid` when known.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn torrent_peers(&self, hash: &str, rid: Option<u64>) -> ApiResult<TorrentPeers> {
        const PATH: &str = "/sync/torrentPeers";
        let mut query = vec![("hash", hash.to_string())];
        push_query(&mut query, "rid", rid);
        let response = self.execute(PATH, self.get(PATH, query)?).await?;
        read_json(PATH, response).await
    }

    /// `GET /log/main`, returning entries newer than `last_known_id`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn logs(&self, last_known_id: Option<i64>) -> ApiResult<Vec<LogEntry>> {
        const PATH: &str = "/log/main";
        let mut query = Vec::new();
        push_query(&mut query, "last_known_id", last_known_id);
        let response = self.execute(PATH, self.get(PATH, query)?).await?;
        read_json(PATH, response).await
    }

    /// Post a raw, form-encoded action and return the body verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidAction`] for actions that escape their
    /// scope, or an error on transport failure or a non-2xx status.
    pub async fn call(&self, call: &RawCall) -> ApiResult<String> {
        let path = call.path()?;
        let builder = self.http.post(self.url(&path)?).form(&call.params);
        let response = self.execute(&path, builder).await?;
        read_text(&path, response).await
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.api_root
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    fn get(&self, path: &str, query: FormFields) -> ApiResult<RequestBuilder> {
        Ok(self.http.get(self.url(path)?).query(&query))
    }

    fn post_form(&self, path: &str, fields: &FormFields) -> ApiResult<RequestBuilder> {
        Ok(self.http.post(self.url(path)?).form(fields))
    }

    fn set_preferences_request(&self, preferences: &Preferences) -> ApiResult<RequestBuilder> {
        const PATH: &str = "/app/setPreferences";
        let encoded = serde_json::to_string(preferences).map_err(|source| ApiError::Encode {
            path: PATH.to_string(),
            source,
        })?;
        self.post_form(PATH, &vec![("json", encoded)])
    }

    fn add_torrents_request(
        &self,
        request: &AddTorrentsRequest,
        files: &[TorrentFile],
    ) -> ApiResult<RequestBuilder> {
        const PATH: &str = "/torrents/add";
        let fields = request.form_fields();
        if files.is_empty() {
            return self.post_form(PATH, &fields);
        }

        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name, value);
        }
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(TORRENT_MIME)
                .map_err(|source| transport(PATH, source))?;
            form = form.part(TORRENT_FILE_FIELD, part);
        }
        Ok(self.http.post(self.url(PATH)?).multipart(form))
    }

    async fn execute(&self, path: &str, builder: RequestBuilder) -> ApiResult<Response> {
        let (client, request) = builder.build_split();
        let request = request.map_err(|source| transport(path, source))?;
        debug!(method = %request.method(), path, "api request");
        let response = client
            .execute(request)
            .await
            .map_err(|source| transport(path, source))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(path, response).await)
        }
    }
}

fn api_root(base_url: &Url) -> ApiResult<Url> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let relative = format!("{}/", API_BASE_PATH.trim_start_matches('/'));
    base.join(&relative).map_err(|source| ApiError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })
}

fn push_query<T: ToString>(query: &mut FormFields, name: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

fn transport(path: &str, source: reqwest::Error) -> ApiError {
    ApiError::Transport {
        path: path.to_string(),
        source,
    }
}

async fn status_error(path: &str, response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Status {
        path: path.to_string(),
        status,
        body,
    }
}

async fn read_text(path: &str, response: Response) -> ApiResult<String> {
    response.text().await.map_err(|source| transport(path, source))
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> ApiResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| transport(path, source))?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}
