use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::{StorageBackend, StorageError};

/// Unsigned Cloudinary upload: a multipart POST of the file plus the
/// upload preset. The preset controls folder and transformations on the
/// Cloudinary side; no API secret is involved.
pub struct CloudinaryStorage {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            client: Client::new(),
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                cloud_name
            ),
            upload_preset: upload_preset.to_string(),
        }
    }
}

#[async_trait]
impl StorageBackend for CloudinaryStorage {
    async fn upload(&self, filename: &str, data: &[u8]) -> Result<String, StorageError> {
        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| StorageError::UploadFailed(format!("Invalid upload part: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Cloudinary request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(format!(
                "Cloudinary error {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            StorageError::UploadFailed(format!("Malformed Cloudinary response: {}", e))
        })?;

        // A response without secure_url is a failed upload, whatever the
        // status code said.
        body.get("secure_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                StorageError::UploadFailed("Upload response missing secure_url".to_string())
            })
    }
}
