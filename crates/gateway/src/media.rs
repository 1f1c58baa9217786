//! Upload of user-supplied media to the Fal CDN.
//!
//! Uploaded images get a public URL that the generation tools can take as
//! input. Upload failure is never fatal: the image still enters history as
//! an inline block, the model just cannot reference it by URL.

use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

const INITIATE_URL: &str =
    "https://rest.alpha.fal.ai/storage/upload/initiate?storage_type=fal-cdn-v3";

#[derive(Deserialize)]
struct InitiateResponse {
    file_url: String,
    upload_url: String,
}

pub struct MediaUploader {
    fal_key: Option<String>,
    client: reqwest::Client,
}

impl MediaUploader {
    pub fn new(fal_key: Option<String>) -> Self {
        Self {
            fal_key,
            client: reqwest::Client::new(),
        }
    }

    /// Upload a base64 image and return its public URL, or `None` when no
    /// key is configured or the upload fails.
    pub async fn upload_base64(&self, data: &str, media_type: &str) -> Option<String> {
        let key = self.fal_key.as_deref()?;

        let bytes = match base64::engine::general_purpose::STANDARD.decode(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "invalid base64 in media attachment");
                return None;
            }
        };

        match self.upload(key, bytes, media_type).await {
            Ok(url) => {
                debug!(url = %url, "media uploaded to Fal CDN");
                Some(url)
            }
            Err(e) => {
                warn!(error = %e, "Fal CDN upload failed");
                None
            }
        }
    }

    /// Two-step CDN upload: initiate for a signed URL, then PUT the bytes.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<String, reqwest::Error> {
        let extension = media_type.rsplit('/').next().unwrap_or("bin");
        let file_name = format!("upload-{}.{extension}", Uuid::new_v4());

        let initiate: InitiateResponse = self
            .client
            .post(INITIATE_URL)
            .header("Authorization", format!("Key {key}"))
            .json(&serde_json::json!({
                "content_type": media_type,
                "file_name": file_name,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        self.client
            .put(&initiate.upload_url)
            .header("Content-Type", media_type)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        Ok(initiate.file_url)
    }
}
