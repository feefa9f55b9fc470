//! Image and file upload API
//!
//! Binary content must be uploaded before it can be referenced by a message.
//! Uploads return an opaque key (`image_key` / `file_key`) that is embedded
//! into the following send call. Nothing is cached: every send re-uploads.
//!
//! - POST /open-apis/im/v1/images (multipart: `image_type`, `image`)
//! - POST /open-apis/im/v1/files (multipart: `file_type`, `file`, `filename`)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::FeishuContext;
use crate::error::FeishuError;
use crate::types::ApiResponse;

pub(crate) const UPLOAD_IMAGE_PATH: &str = "/open-apis/im/v1/images";
pub(crate) const UPLOAD_FILE_PATH: &str = "/open-apis/im/v1/files";

const DEFAULT_FILENAME: &str = "file";

/// File type accepted by the file upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Opus audio
    Opus,
    /// MP4 video
    Mp4,
    Pdf,
    Doc,
    Xls,
    Ppt,
    /// Any other binary stream
    Stream,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Opus => "opus",
            FileType::Mp4 => "mp4",
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Xls => "xls",
            FileType::Ppt => "ppt",
            FileType::Stream => "stream",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = FeishuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opus" => Ok(FileType::Opus),
            "mp4" => Ok(FileType::Mp4),
            "pdf" => Ok(FileType::Pdf),
            "doc" => Ok(FileType::Doc),
            "xls" => Ok(FileType::Xls),
            "ppt" => Ok(FileType::Ppt),
            "stream" => Ok(FileType::Stream),
            other => Err(FeishuError::Config(format!("unsupported file type: {other}"))),
        }
    }
}

/// Which upload endpoint a payload goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    File(FileType),
}

/// Binary content to upload
///
/// A `Path` is read from disk and names the upload after its basename;
/// raw `Bytes` are named `"file"` unless a filename is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl FileSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileSource::Path(path) => Some(path),
            FileSource::Bytes(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FileSource::Bytes(bytes) if bytes.is_empty())
    }

    fn default_filename(&self) -> String {
        self.path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
    }

    async fn into_bytes(self) -> Result<Vec<u8>, FeishuError> {
        match self {
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

impl From<&Path> for FileSource {
    fn from(path: &Path) -> Self {
        FileSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        FileSource::Bytes(bytes)
    }
}

impl From<&[u8]> for FileSource {
    fn from(bytes: &[u8]) -> Self {
        FileSource::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for FileSource {
    fn from(bytes: &[u8; N]) -> Self {
        FileSource::Bytes(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct ImageUploadData {
    image_key: String,
}

#[derive(Debug, Deserialize)]
struct FileUploadData {
    file_key: String,
}

pub struct UploadApi {
    context: Arc<FeishuContext>,
}

impl UploadApi {
    pub fn new(context: Arc<FeishuContext>) -> Self {
        Self { context }
    }

    /// Upload binary content and return the remote key.
    ///
    /// `UploadKind::Image` returns an `image_key`; every other kind returns
    /// a `file_key`. An explicit `filename` overrides the one derived from
    /// the source.
    pub async fn upload(
        &self,
        kind: UploadKind,
        source: FileSource,
        filename: Option<&str>,
    ) -> Result<String, FeishuError> {
        let filename = match filename {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => source.default_filename(),
        };
        let bytes = source.into_bytes().await?;
        debug!(
            "[FeishuBot] uploading {} ({} bytes) as {:?}",
            filename,
            bytes.len(),
            kind
        );

        let token = self.context.token_manager.get_token().await?;
        let part = Part::bytes(bytes).file_name(filename.clone());

        match kind {
            UploadKind::Image => {
                let form = Form::new().text("image_type", "message").part("image", part);
                let response: ApiResponse<ImageUploadData> = self
                    .context
                    .client
                    .post_multipart(UPLOAD_IMAGE_PATH, Some(&token), form)
                    .await?;
                Ok(response.into_data()?.image_key)
            }
            UploadKind::File(file_type) => {
                let form = Form::new()
                    .text("file_type", file_type.as_str())
                    .part("file", part)
                    .text("filename", filename);
                let response: ApiResponse<FileUploadData> = self
                    .context
                    .client
                    .post_multipart(UPLOAD_FILE_PATH, Some(&token), form)
                    .await?;
                Ok(response.into_data()?.file_key)
            }
        }
    }
}
