use std::io::Write;
use std::path::Path;
use std::time::Duration;

use publisher_core::{ImageReference, MediaId};
use publisher_logging::{pipeline_info, pipeline_warn};
use reqwest::multipart::{Form, Part};
use tempfile::NamedTempFile;

use crate::fetch::{map_reqwest_error, read_json, ImageDownloader};
use crate::platform::{MediaEnvelope, PlatformClient};
use crate::{CallError, FailureKind};

/// Permanent material store; the returned id stays valid as a draft cover.
const PERMANENT_UPLOAD_PATH: &str = "/cgi-bin/material/add_material";
/// Raw multipart media endpoint.
const RAW_UPLOAD_PATH: &str = "/cgi-bin/media/upload";

#[async_trait::async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, reference: &ImageReference) -> Result<MediaId, CallError>;
}

pub struct PlatformMediaUploader {
    platform: PlatformClient,
    downloader: ImageDownloader,
    timeout: Duration,
}

impl PlatformMediaUploader {
    pub fn new(platform: PlatformClient, downloader: ImageDownloader, timeout: Duration) -> Self {
        Self {
            platform,
            downloader,
            timeout,
        }
    }

    /// Downloads once and tries the permanent store. Only a failed permanent
    /// upload falls back to the raw endpoint, reusing the downloaded bytes.
    async fn upload_remote(&self, token: &str, url: &str) -> Result<MediaId, CallError> {
        let fetched = self.downloader.fetch(url).await?;
        let filename = filename_for(&fetched.final_url);
        let mime = fetched
            .content_type
            .as_deref()
            .filter(|ct| ct.starts_with("image/"))
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
            .unwrap_or_else(|| mime_for(&filename).to_string());
        match self
            .post_media(PERMANENT_UPLOAD_PATH, token, fetched.bytes.clone(), &filename, &mime)
            .await
        {
            Ok(media_id) => Ok(media_id),
            Err(err) => {
                pipeline_warn!(
                    "permanent upload of {} failed ({}); retrying through a temp file",
                    url,
                    err
                );
                self.upload_via_temp_file(token, &fetched.bytes, &filename).await
            }
        }
    }

    async fn upload_via_temp_file(
        &self,
        token: &str,
        bytes: &[u8],
        filename: &str,
    ) -> Result<MediaId, CallError> {
        let mut tmp = NamedTempFile::new().map_err(io_error)?;
        tmp.write_all(bytes).map_err(io_error)?;
        tmp.flush().map_err(io_error)?;
        pipeline_info!("staged {} bytes in {:?}", bytes.len(), tmp.path());
        self.upload_file(token, tmp.path(), filename).await
    }

    async fn upload_local(&self, token: &str, path: &Path) -> Result<MediaId, CallError> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| "cover.jpg".to_string());
        self.upload_file(token, path, &filename).await
    }

    async fn upload_file(&self, token: &str, path: &Path, filename: &str) -> Result<MediaId, CallError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            let kind = if err.kind() == std::io::ErrorKind::NotFound {
                FailureKind::MissingResource
            } else {
                FailureKind::Io
            };
            CallError::new(kind, format!("{}: {err}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(CallError::new(
                FailureKind::MalformedResponse,
                format!("{} is empty", path.display()),
            ));
        }
        self.post_media(RAW_UPLOAD_PATH, token, bytes, filename, mime_for(filename))
            .await
    }

    async fn post_media(
        &self,
        path: &str,
        token: &str,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<MediaId, CallError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|err| CallError::new(FailureKind::MalformedResponse, err.to_string()))?;
        let form = Form::new().part("media", part);

        let response = self
            .platform
            .http()
            .post(self.platform.endpoint(path))
            .query(&[("access_token", token), ("type", "image")])
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: MediaEnvelope = read_json(response).await?;
        match envelope.into_media_id() {
            Ok(id) => Ok(MediaId(id)),
            Err(err) => {
                self.platform.observe(&err).await;
                Err(err)
            }
        }
    }
}

#[async_trait::async_trait]
impl MediaUploader for PlatformMediaUploader {
    /// The access token is obtained once per upload; a failed exchange ends the upload.
    async fn upload(&self, reference: &ImageReference) -> Result<MediaId, CallError> {
        let token = self.platform.access_token().await?;
        let result = match reference {
            ImageReference::Remote(url) => self.upload_remote(&token, url).await,
            ImageReference::Local(path) => self.upload_local(&token, path).await,
        };
        if let Ok(media_id) = &result {
            pipeline_info!("uploaded cover {} as media_id={}", reference, media_id);
        }
        result
    }
}

fn io_error(err: std::io::Error) -> CallError {
    CallError::new(FailureKind::Io, err.to_string())
}

/// Last path segment of `url` with a known image extension, else `cover.jpg`.
fn filename_for(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(ToOwned::to_owned))
        })
        .filter(|segment| mime_for_extension(segment).is_some())
        .unwrap_or_else(|| "cover.jpg".to_string())
}

fn mime_for(filename: &str) -> &'static str {
    mime_for_extension(filename).unwrap_or("image/jpeg")
}

fn mime_for_extension(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
