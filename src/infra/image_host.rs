//! HTTP adapter for the external image host.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url, multipart};
use serde::Deserialize;
use tracing::{info, warn};

use crate::application::uploads::{DocumentUpload, HostedFile, ImageHost, UploadError};
use crate::config::ImageHostSettings;

use super::error::InfraError;

const SOURCE: &str = "infra::image_host";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    #[serde(alias = "secure_url")]
    url: String,
    format: Option<String>,
}

/// Uploads documents as multipart forms to a configured endpoint.
pub struct HttpImageHost {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpImageHost {
    pub fn new(settings: &ImageHostSettings, endpoint: &str) -> Result<Self, InfraError> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            InfraError::configuration(format!("invalid image_host.endpoint `{endpoint}`: {err}"))
        })?;
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("talentdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| InfraError::configuration(format!("image host client: {err}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, document: &DocumentUpload) -> Result<HostedFile, UploadError> {
        let filename = document
            .filename
            .clone()
            .unwrap_or_else(|| "document".to_string());
        let part = multipart::Part::bytes(document.bytes.to_vec())
            .file_name(filename)
            .mime_str(&document.content_type)
            .map_err(|err| UploadError::InvalidArgument(err.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.post(self.endpoint.clone()).multipart(form);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            warn!(target = SOURCE, error = %err, "image host request failed");
            UploadError::Unavailable(err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(target = SOURCE, status = status.as_u16(), "image host rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| UploadError::Unavailable(format!("malformed response: {err}")))?;

        info!(
            target = SOURCE,
            public_id = %body.public_id,
            bytes = document.bytes.len(),
            "document uploaded"
        );

        Ok(HostedFile {
            public_id: body.public_id,
            url: body.url,
            format: body.format,
        })
    }
}

/// Stand-in used when no endpoint is configured; every upload is refused.
#[derive(Debug, Default)]
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _document: &DocumentUpload) -> Result<HostedFile, UploadError> {
        Err(UploadError::Unavailable(
            "image_host.endpoint is not configured".to_string(),
        ))
    }
}

/// Builds the image host named by `settings`.
pub fn from_settings(settings: &ImageHostSettings) -> Result<Arc<dyn ImageHost>, InfraError> {
    match settings.endpoint.as_deref() {
        Some(endpoint) => Ok(Arc::new(HttpImageHost::new(settings, endpoint)?)),
        None => {
            warn!(
                target = SOURCE,
                "image_host.endpoint not set; document uploads are disabled"
            );
            Ok(Arc::new(DisabledImageHost))
        }
    }
}
