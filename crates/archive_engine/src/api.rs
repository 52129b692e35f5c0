use std::time::Duration;

use archive_core::{ArchiveFile, Catalog, SearchRequest, SearchResult, Source};
use archive_logging::{archive_debug, archive_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::{ApiError, FailureKind};

const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL every endpoint path is resolved against.
    pub api_root: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(api_root: Url) -> Self {
        Self {
            api_root,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The backend endpoints the viewer consumes.
#[async_trait::async_trait]
pub trait ArchiveApi: Send + Sync {
    async fn sites(&self) -> Result<Vec<Source>, ApiError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError>;

    async fn archives(&self) -> Result<Vec<ArchiveFile>, ApiError>;

    async fn reindex(&self, file_name: &str) -> Result<(), ApiError>;

    async fn download(&self, url: &str, file_name: &str) -> Result<(), ApiError>;

    /// Fetches sources and archives concurrently; fails if either fails.
    async fn catalog(&self) -> Result<Catalog, ApiError> {
        let (sources, archives) =
            futures_util::future::try_join(self.sites(), self.archives()).await?;
        Ok(Catalog { sources, archives })
    }
}

#[derive(Serialize)]
struct ReindexBody<'a> {
    file_name: &'a str,
}

#[derive(Serialize)]
struct DownloadBody<'a> {
    url: &'a str,
    file_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    root: Url,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        if settings.api_root.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as an API root", settings.api_root),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        // Endpoint paths are joined relative to the root, which needs a trailing slash
        // to keep its last segment.
        let mut root = settings.api_root;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(Self { client, root })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.root
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        archive_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(path, response).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        archive_debug!("POST {} ({} bytes)", url, payload.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(path, response)
    }
}

#[async_trait::async_trait]
impl ArchiveApi for ReqwestApi {
    async fn sites(&self) -> Result<Vec<Source>, ApiError> {
        self.get_json("sites").await
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError> {
        let response = self.post("search", request).await?;
        decode("search", response).await
    }

    async fn archives(&self) -> Result<Vec<ArchiveFile>, ApiError> {
        self.get_json("admin/archives").await
    }

    async fn reindex(&self, file_name: &str) -> Result<(), ApiError> {
        self.post("admin/reindex", &ReindexBody { file_name })
            .await
            .map(drop)
    }

    async fn download(&self, url: &str, file_name: &str) -> Result<(), ApiError> {
        self.post("admin/download", &DownloadBody { url, file_name })
            .await
            .map(drop)
    }
}

fn check_status(path: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        archive_warn!("{} answered {}", path, status);
        Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ApiError> {
    let response = check_status(path, response)?;
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| {
        archive_warn!("{} returned an unexpected body: {}", path, err);
        ApiError::new(FailureKind::Decode, err.to_string())
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
