pub mod client;
pub mod envelope;
pub mod remote;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use envelope::ErrorCode;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered with HTTP {status}")]
    Status { path: String, status: StatusCode },
    #[error("could not decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Network { .. } => ErrorCode::Network,
            ApiError::Status { .. } | ApiError::Decode { .. } => ErrorCode::Server,
        }
    }
}

/// JSON over HTTP against a single base url.
///
/// When a token is set it is sent as the `token` field of POST bodies and as
/// the `token` query parameter of GET requests.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        mut body: Map<String, Value>,
    ) -> Result<T, ApiError> {
        if let Some(token) = &self.token {
            body.insert("token".to_owned(), Value::String(token.clone()));
        }

        tracing::debug!(path, "POST");
        let request = self.http.post(self.url(path)).json(&body);
        self.execute(path, request).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(self.url(path)).query(query);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        tracing::debug!(path, "GET");
        self.execute(path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            path: path.to_owned(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_owned(),
                status,
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            path: path.to_owned(),
            source,
        })
    }
}
