//! 上传表单读取
//!
//! 表单包含两个字段：`metadata`（JSON）与 `file`（CSV 或 Excel 原文）。

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::models::ErrorCode;
use crate::models::batches::requests::UploadMetadata;

const DEFAULT_FILE_NAME: &str = "upload.csv";
// metadata 字段只是一段小 JSON
const MAX_METADATA_BYTES: usize = 64 * 1024;

/// 读取到的上传表单
#[derive(Debug)]
pub struct UploadForm {
    pub metadata: UploadMetadata,
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub enum UploadFormError {
    Stream(String),
    MissingFile,
    DuplicateFile,
    TooLarge(usize),
    Metadata(String),
}

impl UploadFormError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Stream(_) => ErrorCode::BadRequest,
            Self::MissingFile | Self::DuplicateFile => ErrorCode::UploadFileMissing,
            Self::TooLarge(_) => ErrorCode::UploadFileTooLarge,
            Self::Metadata(_) => ErrorCode::UploadMetadataInvalid,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Stream(msg) => format!("读取上传数据失败: {msg}"),
            Self::MissingFile => "未找到 file 字段".to_string(),
            Self::DuplicateFile => "一次只能上传一个文件".to_string(),
            Self::TooLarge(limit) => format!("文件大小超过限制 ({limit} bytes)"),
            Self::Metadata(msg) => format!("metadata 字段无效: {msg}"),
        }
    }
}

/// 解析 metadata 字段，空字段视为全部缺省
pub fn parse_metadata(raw: &[u8]) -> Result<UploadMetadata, UploadFormError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(UploadMetadata::default());
    }
    serde_json::from_slice(raw).map_err(|e| UploadFormError::Metadata(e.to_string()))
}

/// 读取上传表单，文件超过 `max_size` 时立即中止
pub async fn read_upload_form(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<UploadForm, UploadFormError> {
    let mut metadata_raw: Vec<u8> = Vec::new();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadFormError::Stream(e.to_string()))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(UploadFormError::DuplicateFile);
                }
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();

                let mut content = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| UploadFormError::Stream(e.to_string()))?;
                    if content.len() + data.len() > max_size {
                        return Err(UploadFormError::TooLarge(max_size));
                    }
                    content.extend_from_slice(&data);
                }
                file = Some((file_name, content));
            }
            "metadata" => {
                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| UploadFormError::Stream(e.to_string()))?;
                    if metadata_raw.len() + data.len() > MAX_METADATA_BYTES {
                        return Err(UploadFormError::Metadata("too large".to_string()));
                    }
                    metadata_raw.extend_from_slice(&data);
                }
            }
            other => {
                tracing::debug!("Ignoring unexpected multipart field '{}'", other);
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| UploadFormError::Stream(e.to_string()))?;
                }
            }
        }
    }

    let (file_name, content) = file.ok_or(UploadFormError::MissingFile)?;
    let metadata = parse_metadata(&metadata_raw)?;

    Ok(UploadForm {
        metadata,
        file_name,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batches::entities::BatchType;

    #[test]
    fn test_parse_metadata() {
        let metadata = parse_metadata(
            r#"{"course_name":"統計学入門","lecture_on":"2025-04-10","batch_type":"confirmed","zoom_participants":42}"#
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(metadata.course_name.as_deref(), Some("統計学入門"));
        assert_eq!(metadata.batch_type, BatchType::Confirmed);
        assert_eq!(metadata.zoom_participants, Some(42));
    }

    #[test]
    fn test_blank_metadata_uses_defaults() {
        let metadata = parse_metadata(b"  ").unwrap();
        assert!(metadata.course_name.is_none());
        assert_eq!(metadata.batch_type, BatchType::Preliminary);
    }

    #[test]
    fn test_invalid_metadata() {
        let err = parse_metadata(b"{\"course_name\": 1").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::UploadMetadataInvalid);
    }
}
