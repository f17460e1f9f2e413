use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BlobStore, normalize_key};
use crate::errors::{Result, SurveyError};

const SCHEME: &str = "local://";

/// 以上传目录为根的本地文件存储
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, key: &str) -> Result<(String, PathBuf)> {
        let key = normalize_key(key)?;
        let path = self.root.join(&key);
        Ok((key, path))
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        let (key, path) = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SurveyError::storage(format!("创建目录失败 {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| SurveyError::storage(format!("写入文件失败 {}: {e}", path.display())))?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("{SCHEME}{key}"))
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let key = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| SurveyError::storage(format!("not a local URI: {uri}")))?;
        let (_, path) = self.resolve(key)?;

        tokio::fs::read(&path)
            .await
            .map_err(|e| SurveyError::storage(format!("读取文件失败 {}: {e}", path.display())))
    }
}
