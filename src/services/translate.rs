//! Google Translate client (public `translate_a/single` endpoint)

use super::{ServiceError, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslator {
    client: Client,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::Translation(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Join the translated segments of a `dt=t` response.
///
/// The body looks like `[[["Hallo","Hello",null,null,10], ...], null, "en", ...]`.
pub fn parse_response(body: &Value) -> Result<String, ServiceError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::Translation("unexpected response shape".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(ServiceError::Translation("empty translation".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(TRANSLATE_URL)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| ServiceError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Translation(format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Translation(e.to_string()))?;
        parse_response(&body)
    }
}
