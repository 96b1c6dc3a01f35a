//! HTTP access to the analysis server.

use crate::config::ClientConfig;
use crate::intake::CandidateFile;
use crate::prediction::{HealthStatus, PredictResponse};
use reqwest::blocking::{Client, multipart};
use thiserror::Error;

/// Multipart field the server reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not read upload: {0}")]
    Read(#[from] std::io::Error),
}

/// Something that can send a file for classification.
pub trait PredictClient: Send + Sync {
    fn predict(&self, file: &CandidateFile) -> Result<PredictResponse, ClientError>;
}

/// Blocking reqwest client bound to one server.
#[derive(Debug, Clone)]
pub struct HttpPredictClient {
    http: Client,
    predict_url: String,
    health_url: String,
}

impl HttpPredictClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            predict_url: config.predict_url(),
            health_url: config.health_url(),
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    /// `GET /` on the server.
    pub fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.http.get(&self.health_url).send()?;
        tracing::debug!("GET {} -> {}", self.health_url, response.status());
        let body = response.bytes()?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl PredictClient for HttpPredictClient {
    /// The body is decoded whatever the status code; the server puts its error
    /// message in JSON on 4xx/5xx too. Files on disk are read here, on the
    /// caller's (worker) thread.
    fn predict(&self, file: &CandidateFile) -> Result<PredictResponse, ClientError> {
        let content = file.read_content()?.into_owned();
        let part = multipart::Part::bytes(content)
            .file_name(file.name().to_string())
            .mime_str(file.media_type())?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        tracing::info!("POST {} ({} bytes)", self.predict_url, file.size());
        let response = self.http.post(&self.predict_url).multipart(form).send()?;
        let status = response.status();
        let body = response.bytes()?;
        tracing::debug!("POST {} -> {status} ({} bytes)", self.predict_url, body.len());
        Ok(serde_json::from_slice(&body)?)
    }
}
