//! Cloudinary upload/destroy client.

use anyhow::Context as _;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::info;

use duet_core::config::Config;

use crate::error::MediaError;
use crate::signature::sign_request;

/// Settings loaded from `CLOUDINARY_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config for CloudinaryConfig {}

impl CloudinaryConfig {
    pub fn load() -> Self {
        Self::from_env_prefixed("CLOUDINARY_")
    }
}

#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl MediaClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{action}",
            self.config.cloud_name
        )
    }

    /// Upload image bytes under `public_id` (optionally folder-prefixed).
    /// Returns the hosted `secure_url`.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        public_id: &str,
        folder: Option<&str>,
        extension: &str,
    ) -> Result<String, MediaError> {
        let timestamp = Utc::now().timestamp();
        let full_public_id = match folder {
            Some(folder) => format!("{folder}/{public_id}"),
            None => public_id.to_owned(),
        };
        let signature = sign_request(&full_public_id, timestamp, &self.config.api_secret);

        let file = Part::bytes(bytes)
            .file_name(format!("{public_id}.{extension}"))
            .mime_str(mime_for_extension(extension))
            .context("build multipart file part")?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("public_id", full_public_id.clone())
            .text("signature", signature);

        let resp = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .context("media upload request")?;
        let body: Json = resp.json().await.context("media upload response")?;

        match body["secure_url"].as_str() {
            Some(url) => {
                info!(public_id = %full_public_id, "image uploaded");
                Ok(url.to_owned())
            }
            None => {
                let message = body["error"]["message"]
                    .as_str()
                    .unwrap_or("upload failed")
                    .to_owned();
                Err(MediaError::UploadRejected(message))
            }
        }
    }

    /// Delete a hosted image. `Ok(true)` when the host confirms removal.
    pub async fn destroy(&self, public_id: &str) -> Result<bool, MediaError> {
        let timestamp = Utc::now().timestamp();
        let signature = sign_request(public_id, timestamp, &self.config.api_secret);

        let form = Form::new()
            .text("public_id", public_id.to_owned())
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let resp = self
            .http
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await
            .context("media destroy request")?;
        let body: Json = resp.json().await.context("media destroy response")?;
        Ok(body["result"].as_str() == Some("ok"))
    }
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "webp" => "image/webp",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MediaClient {
        MediaClient::new(CloudinaryConfig {
            cloud_name: "demo".to_owned(),
            api_key: "key".to_owned(),
            api_secret: "secret".to_owned(),
        })
    }

    #[test]
    fn endpoints_target_the_configured_cloud() {
        assert_eq!(
            client().endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            client().endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn unknown_extensions_default_to_jpeg() {
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("webp"), "image/webp");
        assert_eq!(mime_for_extension("heic"), "image/jpeg");
    }
}
