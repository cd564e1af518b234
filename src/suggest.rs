//! Task suggestions from a diagnosis.
//!
//! The service is best-effort enrichment: every failure is logged and turned
//! into "no suggestions", never an error for the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Diagnoses shorter than this are never sent out.
pub const MIN_DIAGNOSIS_LEN: usize = 3;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// What the service proposes for a diagnosis.
///
/// `precautions` is a free-text summary. It is passed back to callers but not
/// written into any room field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub suggested_tasks: Vec<String>,
    pub precautions: String,
}

#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, diagnosis: &str) -> Option<Suggestions>;
}

/// Ask `service` about `diagnosis`, skipping the call when it is too short to be useful.
pub async fn suggest_for(service: &dyn SuggestionService, diagnosis: &str) -> Option<Suggestions> {
    let diagnosis = diagnosis.trim();
    if diagnosis.chars().count() < MIN_DIAGNOSIS_LEN {
        tracing::debug!("diagnosis too short for suggestions");
        return None;
    }
    service.suggest(diagnosis).await
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSuggester;

#[async_trait]
impl SuggestionService for DisabledSuggester {
    async fn suggest(&self, _diagnosis: &str) -> Option<Suggestions> {
        tracing::debug!("suggestions disabled, no API key configured");
        None
    }
}

// Failures inside the client; these never leave this module
#[derive(Debug, Error)]
enum SuggestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {0}: {1}")]
    Status(reqwest::StatusCode, String),

    #[error("response had no text candidate")]
    EmptyResponse,

    #[error("response text is not a suggestion object: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the Generative Language `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiSuggester {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiSuggester {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, diagnosis: &str) -> Result<Suggestions, SuggestError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(diagnosis))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestError::Status(status, body));
        }

        let body: GenerateContentResponse = response.json().await?;
        parse_response(body)
    }
}

#[async_trait]
impl SuggestionService for GeminiSuggester {
    async fn suggest(&self, diagnosis: &str) -> Option<Suggestions> {
        match self.request(diagnosis).await {
            Ok(s) => {
                tracing::info!("received {} task suggestions", s.suggested_tasks.len());
                Some(s)
            }
            Err(e) => {
                tracing::error!("suggestion request failed: {}", e);
                None
            }
        }
    }
}

fn prompt(diagnosis: &str) -> String {
    format!(
        "Suggest 3-5 standard nursing tasks and monitoring precautions for a patient with the \
         following diagnosis: \"{diagnosis}\". Provide the response as a JSON object."
    )
}

fn request_body(diagnosis: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(diagnosis) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "suggestedTasks": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Actionable nursing tasks."
                    },
                    "precautions": {
                        "type": "STRING",
                        "description": "Key safety precautions."
                    }
                },
                "required": ["suggestedTasks", "precautions"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

// The model answers with JSON inside the first text part
fn parse_response(body: GenerateContentResponse) -> Result<Suggestions, SuggestError> {
    let text = body
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or(SuggestError::EmptyResponse)?;

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl SuggestionService for Fixed {
        async fn suggest(&self, _diagnosis: &str) -> Option<Suggestions> {
            Some(Suggestions {
                suggested_tasks: vec!["Monitor SpO2".into()],
                precautions: "Aspiration".into(),
            })
        }
    }

    #[tokio::test]
    async fn short_diagnosis_skips_the_service() {
        assert!(suggest_for(&Fixed, "ab").await.is_none());
        assert!(suggest_for(&Fixed, "  ab  ").await.is_none());
        assert!(suggest_for(&Fixed, "CAP").await.is_some());
    }

    #[tokio::test]
    async fn disabled_suggester_returns_nothing() {
        assert!(suggest_for(&DisabledSuggester, "Pneumonia").await.is_none());
    }

    #[test]
    fn parses_json_from_first_text_part() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"suggestedTasks\":[\"Check vitals\",\"Reposition q2h\"],\"precautions\":\"Fall risk\"}"}]}}]}"#,
        )
        .unwrap();

        let s = parse_response(body).unwrap();
        assert_eq!(s.suggested_tasks, vec!["Check vitals", "Reposition q2h"]);
        assert_eq!(s.precautions, "Fall risk");
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(parse_response(body), Err(SuggestError::EmptyResponse)));
    }

    #[test]
    fn precautions_field_is_required() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"suggestedTasks\":[]}"}]}}]}"#,
        )
        .unwrap();
        assert!(matches!(parse_response(body), Err(SuggestError::Parse(_))));
    }

    #[test]
    fn request_asks_for_both_required_fields() {
        let body = request_body("Pneumonia");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["suggestedTasks", "precautions"])
        );
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"Pneumonia\""));
    }

    #[tokio::test]
    async fn unreachable_service_fails_closed() {
        let client = GeminiSuggester::new("key", DEFAULT_MODEL, "http://127.0.0.1:9");
        assert!(client.suggest("Pneumonia").await.is_none());
    }
}
