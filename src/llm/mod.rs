//! LLM 评论分类客户端
//!
//! - `mock`: 不访问网络，返回固定结果
//! - `openai`: chat-completions（JSON 模式）
//! - `generic`: POST `{comment, instructions}` 到任意端点
//!
//! 超时、429 与 5xx 在客户端内部按指数退避有限重试。

pub mod parse;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::errors::{Result, SurveyError};
use crate::models::surveys::{Category, CommentClassification, Importance, Sentiment};
use crate::pipeline::{ClassificationRequest, CommentClassifier};

const OPENAI_CHAT_COMPLETIONS: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Mock,
    OpenAi,
    Generic,
}

impl LlmProvider {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "" | "mock" | "disabled" => LlmProvider::Mock,
            "openai" | "gpt" => LlmProvider::OpenAi,
            _ => LlmProvider::Generic,
        }
    }
}

/// 单次请求的失败类型
enum AttemptError {
    Retryable(String),
    Fatal(String),
}

pub struct LlmClient {
    provider: LlmProvider,
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let provider = LlmProvider::from_name(&config.provider);

        let endpoint = match provider {
            LlmProvider::Mock => String::new(),
            LlmProvider::OpenAi if config.api_base.trim().is_empty() => {
                OPENAI_CHAT_COMPLETIONS.to_string()
            }
            _ if config.api_base.trim().is_empty() => {
                return Err(SurveyError::classification(
                    "llm.api_base is required for the generic provider",
                ));
            }
            _ => config.api_base.trim().to_string(),
        };

        let model = if config.model.trim().is_empty() && provider == LlmProvider::OpenAi {
            DEFAULT_OPENAI_MODEL.to_string()
        } else {
            config.model.trim().to_string()
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| SurveyError::classification(format!("HTTP 客户端初始化失败: {e}")))?;

        Ok(Self {
            provider,
            http,
            endpoint,
            model,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn mock_classification() -> CommentClassification {
        CommentClassification {
            sentiment: Some(Sentiment::Neutral),
            category: Some(Category::Other),
            importance: Some(Importance::Low),
            is_abusive: false,
        }
    }

    fn build_body(&self, request: &ClassificationRequest) -> Value {
        let prompt = prompt::build_prompt(&request.course_name, &request.question, &request.text);
        match self.provider {
            LlmProvider::OpenAi => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "response_format": {"type": "json_object"},
            }),
            _ => {
                let mut body = json!({
                    "comment": request.text,
                    "instructions": prompt,
                });
                if !self.model.is_empty() {
                    body["model"] = Value::String(self.model.clone());
                }
                body
            }
        }
    }

    async fn post_once(&self, body: &Value) -> std::result::Result<Value, AttemptError> {
        let mut builder = self.http.post(&self.endpoint).json(body);
        if !self.api_key.is_empty() {
            builder = match self.provider {
                LlmProvider::OpenAi => builder.bearer_auth(&self.api_key),
                _ => builder.header("X-API-Key", &self.api_key),
            };
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                AttemptError::Retryable(format!("request failed: {e}"))
            } else {
                AttemptError::Fatal(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let msg = format!("HTTP {status}: {}", text.chars().take(200).collect::<String>());
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                AttemptError::Retryable(msg)
            } else {
                AttemptError::Fatal(msg)
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AttemptError::Fatal(format!("non-JSON response: {e}")))
    }

    async fn post_with_retry(&self, body: &Value) -> Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            match self.post_once(body).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Retryable(msg)) if attempt < self.max_retries => {
                    let delay = self.retry_backoff * 2u32.saturating_pow(attempt);
                    warn!(
                        "LLM call failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        msg
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Retryable(msg)) | Err(AttemptError::Fatal(msg)) => {
                    return Err(SurveyError::classification(msg));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl CommentClassifier for LlmClient {
    async fn classify(&self, request: &ClassificationRequest) -> Result<CommentClassification> {
        if request.text.trim().is_empty() {
            return Err(SurveyError::classification("comment text is empty"));
        }

        if self.provider == LlmProvider::Mock {
            debug!("LLM provider is mock, returning fixed classification");
            return Ok(Self::mock_classification());
        }

        let body = self.build_body(request);
        let response = self.post_with_retry(&body).await?;
        parse::parse_classification(&response)
    }
}

/// 按配置构造分类器
pub fn build_classifier(config: &LlmConfig) -> Result<Arc<dyn CommentClassifier>> {
    let client = LlmClient::new(config)?;
    tracing::info!("LLM classifier initialized with provider {:?}", client.provider());
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, api_base: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            api_base: api_base.to_string(),
            model: String::new(),
            api_key: String::new(),
            timeout_seconds: 5,
            max_retries: 0,
            retry_backoff_ms: 10,
        }
    }

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            text: "資料の文字が小さかった".to_string(),
            course_name: "統計学入門".to_string(),
            question: "改善してほしい点".to_string(),
        }
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(LlmProvider::from_name("Mock"), LlmProvider::Mock);
        assert_eq!(LlmProvider::from_name("gpt"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::from_name("bedrock"), LlmProvider::Generic);
    }

    #[test]
    fn test_generic_requires_endpoint() {
        assert!(LlmClient::new(&config("generic", "")).is_err());
        let client = LlmClient::new(&config("openai", "")).unwrap();
        assert_eq!(client.endpoint, OPENAI_CHAT_COMPLETIONS);
        assert_eq!(client.model, DEFAULT_OPENAI_MODEL);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let client = LlmClient::new(&config("mock", "")).unwrap();
        let first = client.classify(&request()).await.unwrap();
        let second = client.classify(&request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sentiment, Some(Sentiment::Neutral));
        assert!(!first.is_abusive);
    }

    #[test]
    fn test_request_bodies() {
        let openai = LlmClient::new(&config("openai", "")).unwrap();
        let body = openai.build_body(&request());
        assert_eq!(body["response_format"]["type"], "json_object");
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("統計学入門"));

        let generic = LlmClient::new(&config("generic", "http://localhost:9/classify")).unwrap();
        let body = generic.build_body(&request());
        assert_eq!(body["comment"], "資料の文字が小さかった");
        assert!(body.get("model").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_classification_failure() {
        let client = LlmClient::new(&config("generic", "http://127.0.0.1:9/classify")).unwrap();
        let err = client.classify(&request()).await.unwrap_err();
        assert!(matches!(err, SurveyError::Classification(_)));
    }
}
