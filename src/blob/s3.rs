use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, error};

use super::{BlobStore, normalize_key};
use crate::errors::{Result, SurveyError};

const SCHEME: &str = "s3://";

/// S3 存储，键前缀来自配置
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: &str, prefix: &str) -> Self {
        Self {
            client,
            bucket: bucket.trim().to_string(),
            prefix: normalize_key(prefix).unwrap_or_default(),
        }
    }

    /// 从环境加载 AWS 凭证与区域
    pub async fn from_env(bucket: &str, prefix: &str) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&aws_config), bucket, prefix)
    }

    fn object_key(&self, key: &str) -> Result<String> {
        let key = normalize_key(key)?;
        Ok(if self.prefix.is_empty() {
            key
        } else {
            format!("{}/{key}", self.prefix)
        })
    }
}

/// 拆分 `s3://bucket/key`
fn parse_uri(uri: &str) -> Result<(&str, &str)> {
    uri.strip_prefix(SCHEME)
        .and_then(|rest| rest.split_once('/'))
        .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .ok_or_else(|| SurveyError::storage(format!("not an s3 URI: {uri}")))
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        let key = self.object_key(key)?;
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("text/csv")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!("Error uploading to s3://{}/{}: {:?}", self.bucket, key, e);
                SurveyError::storage(format!("S3 上传失败: {e}"))
            })?;

        debug!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);
        Ok(format!("{SCHEME}{}/{key}", self.bucket))
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let (bucket, key) = parse_uri(uri)?;

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Error downloading {}: {:?}", uri, e);
                SurveyError::storage(format!("S3 下载失败: {e}"))
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| SurveyError::storage(format!("S3 读取失败: {e}")))?;

        Ok(data.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uri() {
        assert_eq!(
            parse_uri("s3://surveys/raw/a.csv").unwrap(),
            ("surveys", "raw/a.csv")
        );
        assert!(parse_uri("s3://surveys").is_err());
        assert!(parse_uri("local://a.csv").is_err());
    }
}
