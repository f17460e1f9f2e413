//! 源文件存储
//!
//! URI 的 scheme 区分后端：`local://相对路径` 或 `s3://bucket/key`。
//! 流水线只接收字节，不关心文件来自哪个后端。

mod key;
mod local;
mod s3;

use std::sync::Arc;

use crate::config::UploadConfig;
use crate::errors::{Result, SurveyError};

pub use key::{slugify, storage_key};
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// 写入并返回 URI
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String>;
    /// 按 URI 读取
    async fn get(&self, uri: &str) -> Result<Vec<u8>>;
}

/// 把键规范化为 `a/b/c`，拒绝 `..` 等越界片段
pub(crate) fn normalize_key(key: &str) -> Result<String> {
    let mut parts = Vec::new();
    for part in key.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(SurveyError::storage(format!(
                    "storage key escapes its root: {key}"
                )));
            }
            _ => parts.push(part),
        }
    }
    if parts.is_empty() {
        return Err(SurveyError::storage("storage key is empty"));
    }
    Ok(parts.join("/"))
}

/// 按上传配置创建存储后端
pub async fn create_blob_store(config: &UploadConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend.trim().to_lowercase().as_str() {
        "s3" => {
            if config.s3_bucket.trim().is_empty() {
                return Err(SurveyError::storage(
                    "upload.s3_bucket is required when upload.backend is s3",
                ));
            }
            let store = S3BlobStore::from_env(&config.s3_bucket, &config.s3_prefix).await;
            Ok(Arc::new(store))
        }
        "" | "local" => Ok(Arc::new(LocalBlobStore::new(&config.dir))),
        other => Err(SurveyError::storage(format!(
            "unsupported upload backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("/a//b/./c.csv").unwrap(), "a/b/c.csv");
        assert!(normalize_key("a/../../etc/passwd").is_err());
        assert!(normalize_key("..\\secret").is_err());
        assert!(normalize_key("//").is_err());
    }
}
