use log::{debug, info, warn};

use crate::error::{ConnectionError, SummarizationError};

const HELLO_PROMPT: &str = "Say 'Hello' in one word.";

const SUMMARY_PROMPT: &str = "You are an expert in summarizing YouTube videos.
You will be given a transcript of a YouTube video and your job is to provide a concise summary.

Please provide a well-structured summary that includes:
1. Main topic and key points
2. Important insights or findings
3. Conclusion or main takeaways

Here is the transcript:
{transcript}

Summary:
";

pub const DEFAULT_MODELS: [&str; 5] = [
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-2.5-pro",
    "gemini-flash-latest",
    "gemini-pro-latest",
];

const GEMINI_TEMPERATURE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
    OpenAi,
}

impl Provider {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Provider::Anthropic
        } else if ["gpt", "o1", "o3", "o4"].iter().any(|p| model.starts_with(p)) {
            Provider::OpenAi
        } else {
            Provider::Gemini
        }
    }

    /// Environment variable conventionally holding this provider's key
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Models to try, in order, and the key to call them with
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub candidate_models: Vec<String>,
    pub api_key: String,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            candidate_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            api_key: api_key.into(),
        }
    }
}

/// A language model that answered a hello prompt
#[derive(Debug, Clone)]
pub struct LanguageModelClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    provider: Provider,
}

impl LanguageModelClient {
    /// Try each candidate model in order and bind to the first that responds
    pub async fn connect(http: reqwest::Client, config: ModelConfig) -> Result<Self, ConnectionError> {
        if config.api_key.trim().is_empty() {
            return Err(ConnectionError::NoApiKey);
        }

        for model in &config.candidate_models {
            let client = Self {
                http: http.clone(),
                api_key: config.api_key.clone(),
                model: model.clone(),
                provider: Provider::for_model(model),
            };
            match client.complete(HELLO_PROMPT).await {
                Ok(_) => {
                    info!("Connected to language model {model}");
                    return Ok(client);
                }
                Err(e) => warn!("Model {model} unavailable: {e}"),
            }
        }

        Err(ConnectionError::NoModelAvailable {
            tried: config.candidate_models,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize a plain-text transcript
    pub async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError> {
        let prompt = build_prompt(transcript);
        debug!("Summarizing {} chars via {}", transcript.len(), self.model);
        self.complete(&prompt).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, SummarizationError> {
        let request = match self.provider {
            Provider::Gemini => self.gemini_request(prompt),
            Provider::Anthropic => self.anthropic_request(prompt),
            Provider::OpenAi => self.openai_request(prompt),
        };

        let request_error = |e: reqwest::Error| SummarizationError::Request {
            model: self.model.clone(),
            reason: e.to_string(),
        };

        let resp = request.send().await.map_err(request_error)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizationError::Status {
                model: self.model.clone(),
                status,
                body,
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(request_error)?;
        let text = match self.provider {
            Provider::Gemini => extract_gemini_text(&json),
            Provider::Anthropic => extract_anthropic_text(&json),
            Provider::OpenAi => extract_openai_text(&json),
        };
        text.ok_or_else(|| SummarizationError::Response {
            model: self.model.clone(),
        })
    }

    fn gemini_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": GEMINI_TEMPERATURE }
        });
        self.http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
    }

    fn anthropic_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 4096,
            "messages": [{ "role": "user", "content": prompt }]
        });
        self.http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
    }

    fn openai_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }]
        });
        self.http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
    }
}

fn build_prompt(transcript: &str) -> String {
    SUMMARY_PROMPT.replace("{transcript}", transcript)
}

fn extract_gemini_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text")?.as_str())
        .collect();
    (!text.is_empty()).then_some(text)
}

fn extract_anthropic_text(json: &serde_json::Value) -> Option<String> {
    let content = json.get("content")?.as_array()?;
    let text: String = content
        .iter()
        .filter_map(|block| {
            if block.get("type")?.as_str()? == "text" {
                block.get("text")?.as_str()
            } else {
                None
            }
        })
        .collect();
    (!text.is_empty()).then_some(text)
}

fn extract_openai_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_model() {
        assert_eq!(Provider::for_model("gemini-2.5-flash"), Provider::Gemini);
        assert_eq!(Provider::for_model("claude-sonnet-4-6"), Provider::Anthropic);
        assert_eq!(Provider::for_model("gpt-4o-mini"), Provider::OpenAi);
        assert_eq!(Provider::for_model("o3-mini"), Provider::OpenAi);
        assert_eq!(Provider::for_model("gemini-pro-latest").api_key_env(), "GOOGLE_API_KEY");
    }

    #[test]
    fn test_default_model_config() {
        let config = ModelConfig::new("key");
        assert_eq!(config.candidate_models.first().map(String::as_str), Some("gemini-2.5-flash"));
        assert_eq!(config.candidate_models.len(), 5);
    }

    #[test]
    fn test_build_prompt_embeds_transcript() {
        let prompt = build_prompt("hello world");
        assert!(prompt.contains("Here is the transcript:\nhello world\n"));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Part one. " }, { "text": "Part two." }], "role": "model" } }
            ]
        });
        assert_eq!(extract_gemini_text(&json).as_deref(), Some("Part one. Part two."));
        assert!(extract_gemini_text(&serde_json::json!({"candidates": []})).is_none());
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                { "type": "text", "text": "Here is the summary." }
            ]
        });
        assert_eq!(extract_anthropic_text(&json).as_deref(), Some("Here is the summary."));
        assert!(extract_anthropic_text(&serde_json::json!({"content": []})).is_none());
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Summary of the video." } }
            ]
        });
        assert_eq!(extract_openai_text(&json).as_deref(), Some("Summary of the video."));
        assert!(extract_openai_text(&serde_json::json!({"choices": []})).is_none());
    }

    #[tokio::test]
    async fn test_connect_requires_api_key() {
        let config = ModelConfig::new("  ");
        let err = LanguageModelClient::connect(reqwest::Client::new(), config).await.unwrap_err();
        assert!(matches!(err, ConnectionError::NoApiKey));
    }

    #[tokio::test]
    async fn test_connect_with_no_candidates() {
        let config = ModelConfig {
            candidate_models: vec![],
            api_key: "key".to_string(),
        };
        let err = LanguageModelClient::connect(reqwest::Client::new(), config).await.unwrap_err();
        assert!(matches!(err, ConnectionError::NoModelAvailable { tried } if tried.is_empty()));
    }
}
