//! 解析分类接口的响应
//!
//! 不同供应商的响应形态差异较大，这里统一成一个 JSON 对象后再读取字段。

use serde_json::{Map, Value};

use crate::errors::{Result, SurveyError};
use crate::models::surveys::{Category, CommentClassification, Importance, Sentiment};

const ENVELOPE_KEYS: &[&str] = &["analysis", "result", "data"];
const SENTIMENT_KEYS: &[&str] = &["sentiment", "sentiment_type"];
const CATEGORY_KEYS: &[&str] = &["category"];
const IMPORTANCE_KEYS: &[&str] = &[
    "importance",
    "priority",
    "importance_level",
    "importanceLevel",
    "importance_label",
];
const ABUSIVE_KEYS: &[&str] = &["is_abusive", "abusive"];
// 含义相反：true 表示安全
const SAFE_KEYS: &[&str] = &["is_safe", "safety", "safe"];

fn malformed(msg: impl Into<String>) -> SurveyError {
    SurveyError::classification(format!("malformed classification response: {}", msg.into()))
}

/// 从响应体中解析分类结果
pub fn parse_classification(body: &Value) -> Result<CommentClassification> {
    let payload = unwrap_body(body)?;

    let sentiment = first_str(&payload, SENTIMENT_KEYS).and_then(sentiment_label);
    let category = first_str(&payload, CATEGORY_KEYS).and_then(category_label);
    let importance = first_str(&payload, IMPORTANCE_KEYS).and_then(importance_label);

    if sentiment.is_none() && category.is_none() && importance.is_none() {
        return Err(malformed("no recognizable sentiment, category or importance"));
    }

    let is_abusive = match first_bool(&payload, ABUSIVE_KEYS) {
        Some(abusive) => abusive,
        None => first_bool(&payload, SAFE_KEYS).is_some_and(|safe| !safe),
    };

    Ok(CommentClassification {
        sentiment,
        category,
        importance,
        is_abusive,
    })
}

/// 剥掉信封，得到承载字段的对象
fn unwrap_body(body: &Value) -> Result<Map<String, Value>> {
    match body {
        Value::Object(map) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Object(inner)) = map.get(*key) {
                    return Ok(inner.clone());
                }
            }
            if let Some(Value::Array(choices)) = map.get("choices") {
                return extract_from_choices(choices);
            }
            Ok(map.clone())
        }
        Value::Array(items) => match items.first() {
            Some(first) => unwrap_body(first),
            None => Err(malformed("empty array")),
        },
        Value::String(text) => parse_json_text(text),
        other => Err(malformed(format!("unexpected JSON value: {other}"))),
    }
}

/// chat-completions 形式：choices[0].message.content
fn extract_from_choices(choices: &[Value]) -> Result<Map<String, Value>> {
    let first = choices.first().ok_or_else(|| malformed("choices is empty"))?;

    let content = first
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| first.get("content"))
        .ok_or_else(|| malformed("missing message content"))?;

    match content {
        Value::String(text) => parse_json_text(text),
        Value::Array(parts) => {
            let joined: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            parse_json_text(&joined)
        }
        Value::Object(map) => Ok(map.clone()),
        _ => Err(malformed("unsupported message content type")),
    }
}

fn parse_json_text(text: &str) -> Result<Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(malformed("content is not a JSON object")),
        Err(e) => Err(malformed(format!("content is not JSON: {e}"))),
    }
}

/// 去掉 ```json ... ``` 代码块标记
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if text.starts_with("```") {
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

fn first_str<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .find_map(Value::as_str)
}

fn first_bool(payload: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|k| payload.get(*k)).find_map(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn sentiment_label(raw: &str) -> Option<Sentiment> {
    match raw.trim().to_lowercase().as_str() {
        "positive" | "ポジティブ" | "肯定的" => Some(Sentiment::Positive),
        "neutral" | "ニュートラル" | "中立" => Some(Sentiment::Neutral),
        "negative" | "ネガティブ" | "否定的" => Some(Sentiment::Negative),
        _ => None,
    }
}

fn category_label(raw: &str) -> Option<Category> {
    match raw.trim().to_lowercase().as_str() {
        "content" | "講義内容" => Some(Category::Content),
        "material" | "materials" | "講義資料" => Some(Category::Material),
        "instructor" | "講師" => Some(Category::Instructor),
        "operation" | "operations" | "運営" => Some(Category::Operation),
        "other" | "その他" => Some(Category::Other),
        _ => None,
    }
}

fn importance_label(raw: &str) -> Option<Importance> {
    match raw.trim().to_lowercase().as_str() {
        "high" | "高" => Some(Importance::High),
        "medium" | "mid" | "中" => Some(Importance::Medium),
        "low" | "低" => Some(Importance::Low),
        _ => None,
    }
}
