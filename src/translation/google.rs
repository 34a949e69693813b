//! Google Translate backend (public `translate_a/single` endpoint)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{TranslateError, Translator};

/// Default public endpoint
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translator backed by the public Google Translate endpoint
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a translator against `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TranslateError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn query(&self, text: &str, source: &str, target: &str) -> Result<Value, TranslateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslateError::Timeout
                } else {
                    TranslateError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TranslateError::Malformed(e.to_string()))
    }
}

/// Concatenate the translated segments at `[0][i][0]`
fn extract_translation(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing segment list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslateError::Malformed("no translated segments".to_string()));
    }
    Ok(translated)
}

/// Detected source language at `[2]`
fn extract_language(body: &Value) -> Result<String, TranslateError> {
    body.get(2)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TranslateError::Malformed("missing detected language".to_string()))
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let body = self.query(text, source_lang, target_lang).await?;
        extract_translation(&body)
    }

    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let body = self.query(text, "auto", "en").await?;
        extract_language(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_translation_joins_segments() {
        let body = json!([
            [["Grande mise à jour. ", "Big update. ", null, null, 10], ["Bonne partie", "Have fun", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(
            extract_translation(&body).unwrap(),
            "Grande mise à jour. Bonne partie"
        );
        assert_eq!(extract_language(&body).unwrap(), "en");
    }

    #[test]
    fn test_extract_translation_rejects_bad_shape() {
        assert!(extract_translation(&json!({"error": "nope"})).is_err());
        assert!(extract_translation(&json!([[]])).is_err());
        assert!(extract_language(&json!([[], null])).is_err());
    }
}
