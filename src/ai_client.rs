use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{Config, GROQ_MODEL};
use crate::models::{Lead, LeadAnalysis, Urgency};

/// Canned reasoning used whenever a real analysis could not be produced.
const DEFAULT_REASONING: &str = "Analysis failed, default applied";

/// Transport-level failures of the outbound AI call.
///
/// These are the only conditions `analyze` raises: a malformed model
/// response is defaulted, not surfaced, because the call itself worked.
#[derive(Debug, Clone)]
pub enum AiError {
    /// Provider responded with HTTP 429.
    RateLimited,
    /// The bounded request timeout fired.
    Timeout,
    /// Any other network or protocol failure.
    Transport(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::RateLimited => write!(f, "Groq rate limit exceeded"),
            AiError::Timeout => write!(f, "Groq request timeout"),
            AiError::Transport(msg) => write!(f, "Groq request failed: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

/// The fixed fallback analysis.
///
/// Returned both when no credential is configured and when the model's
/// response is unusable; one shared value, not two.
pub fn default_analysis() -> LeadAnalysis {
    LeadAnalysis {
        score: 50,
        budget: None,
        urgency: Urgency::Medium,
        reasoning: DEFAULT_REASONING.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct GroqChatResponse {
    #[serde(default)]
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: Option<GroqMessage>,
}

#[derive(Debug, Deserialize)]
struct GroqMessage {
    content: Option<String>,
}

/// Client for the Groq chat-completions API (OpenAI-compatible).
#[derive(Clone)]
pub struct AiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.ai_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create Groq client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.groq_base_url.clone(),
            api_key: config.groq_api_key.clone(),
        })
    }

    /// Scores a lead and extracts budget, urgency and reasoning.
    ///
    /// Without a credential this returns the fixed default analysis with no
    /// network call. Unparseable or structurally invalid model output also
    /// returns the default. Only transport failures are raised.
    pub async fn analyze(&self, lead: &Lead) -> Result<LeadAnalysis, AiError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("GROQ_API_KEY not set, returning default analysis");
            return Ok(default_analysis());
        };

        let prompt = format!(
            "You are a sales lead qualification expert. Analyze this lead:\n\n\
             Company: {}\n\
             Email: {}\n\
             Message: {}\n\n\
             Provide analysis in JSON format:\n\
             {{\n\
               \"score\": 0-100 (fit score),\n\
               \"budget\": number or null (extracted from message),\n\
               \"urgency\": \"low|medium|high\",\n\
               \"reasoning\": \"brief explanation of score\"\n\
             }}\n\n\
             Only respond with valid JSON, no other text.",
            lead.name, lead.email, lead.message
        );

        let content = self
            .chat_completion(
                api_key,
                "You are a sales lead qualification expert. Respond only with valid JSON.",
                &prompt,
                0.3,
            )
            .await?;

        match content {
            Some(text) => Ok(parse_analysis(&text)),
            None => {
                tracing::warn!("Groq returned empty content, using default analysis");
                Ok(default_analysis())
            }
        }
    }

    /// Generates a personalized reply email (150-200 words, no subject).
    ///
    /// Without a credential this returns empty text; the caller treats empty
    /// as "skip". Transport failures propagate unmodified: an email claiming
    /// to be personalized is never fabricated locally.
    pub async fn generate_email(
        &self,
        lead: &Lead,
        analysis: &LeadAnalysis,
    ) -> Result<String, AiError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("GROQ_API_KEY not set, skipping email generation");
            return Ok(String::new());
        };

        let budget = analysis
            .budget
            .map(|b| b.to_string())
            .unwrap_or_else(|| "not specified".to_string());

        let prompt = format!(
            "You are a professional sales representative. Write a personalized email \
             response to this lead:\n\n\
             Company: {}\n\
             Their message: {}\n\
             Lead score: {}/100\n\
             Budget: {}\n\
             Urgency: {}\n\n\
             Write a professional, friendly email that:\n\
             - Thanks them for reaching out\n\
             - Addresses their specific needs\n\
             - Mentions the budget if appropriate\n\
             - Suggests next steps\n\
             - Keep it concise (150-200 words)\n\n\
             Only respond with the email text, no subject line.",
            lead.name,
            lead.message,
            analysis.score,
            budget,
            analysis.urgency.as_str()
        );

        let content = self
            .chat_completion(
                api_key,
                "You are a professional sales rep. Reply with email body only, no subject.",
                &prompt,
                0.5,
            )
            .await?;

        Ok(content.unwrap_or_default())
    }

    /// Sends one chat completion request and returns the trimmed content.
    ///
    /// `Ok(None)` means the call succeeded but the envelope carried no usable
    /// text; the caller decides what that means.
    async fn chat_completion(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
        temperature: f64,
    ) -> Result<Option<String>, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": GROQ_MODEL,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": temperature,
            "max_completion_tokens": 500,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Groq API rate limited (429)");
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Groq API error ({}): {}", status, error_text);
            return Err(AiError::Transport(format!(
                "Groq returned status {}: {}",
                status, error_text
            )));
        }

        let envelope: GroqChatResponse = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                // The call itself succeeded; an unreadable envelope is
                // treated as empty content, not a transport failure.
                tracing::warn!("Failed to parse Groq envelope: {}", e);
                return Ok(None);
            }
        };

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(content)
    }
}

/// Parses the model's JSON text into a `LeadAnalysis`.
///
/// Defensive on every field: score clamped into [0,100] (50 if not numeric),
/// budget only if numeric, urgency normalized case-insensitively, reasoning
/// falls back to the canned string. Malformed JSON yields the full default.
pub fn parse_analysis(content: &str) -> LeadAnalysis {
    let raw: Value = match serde_json::from_str(content) {
        Ok(raw) => raw,
        Err(_) => {
            tracing::warn!("Invalid JSON from Groq, using default analysis");
            return default_analysis();
        }
    };

    let score = raw
        .get("score")
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 100.0).round() as i32)
        .unwrap_or(50);

    let budget = raw.get("budget").and_then(Value::as_f64);

    let urgency = normalize_urgency(raw.get("urgency"));

    let reasoning = raw
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REASONING)
        .to_string();

    LeadAnalysis {
        score,
        budget,
        urgency,
        reasoning,
    }
}

/// Any value that is not a recognized urgency string maps to medium.
fn normalize_urgency(value: Option<&Value>) -> Urgency {
    match value.and_then(Value::as_str) {
        Some(s) => match s.to_lowercase().as_str() {
            "low" => Urgency::Low,
            "medium" => Urgency::Medium,
            "high" => Urgency::High,
            _ => Urgency::Medium,
        },
        None => Urgency::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_analysis() {
        let content = r#"{"score": 87, "budget": 20000, "urgency": "medium", "reasoning": "Clear budget and timeline"}"#;
        let analysis = parse_analysis(content);
        assert_eq!(analysis.score, 87);
        assert_eq!(analysis.budget, Some(20000.0));
        assert_eq!(analysis.urgency, Urgency::Medium);
        assert_eq!(analysis.reasoning, "Clear budget and timeline");
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let analysis = parse_analysis(r#"{"score": 150, "budget": null, "urgency": "high", "reasoning": "x"}"#);
        assert_eq!(analysis.score, 100);

        let analysis = parse_analysis(r#"{"score": -20, "budget": null, "urgency": "low", "reasoning": "x"}"#);
        assert_eq!(analysis.score, 0);
    }

    #[test]
    fn non_numeric_score_defaults_to_50() {
        let analysis = parse_analysis(r#"{"score": "great", "urgency": "high", "reasoning": "x"}"#);
        assert_eq!(analysis.score, 50);
    }

    #[test]
    fn malformed_json_yields_full_default() {
        for content in ["not json at all", "{broken", "", "<html>oops</html>"] {
            let analysis = parse_analysis(content);
            assert_eq!(analysis, default_analysis(), "content: {}", content);
        }
    }

    #[test]
    fn non_object_json_yields_full_default() {
        assert_eq!(parse_analysis("42"), default_analysis());
        assert_eq!(parse_analysis("[1,2,3]"), default_analysis());
    }

    #[test]
    fn urgency_normalized_case_insensitively() {
        let analysis = parse_analysis(r#"{"score": 10, "urgency": "HIGH", "reasoning": "x"}"#);
        assert_eq!(analysis.urgency, Urgency::High);

        let analysis = parse_analysis(r#"{"score": 10, "urgency": "Low", "reasoning": "x"}"#);
        assert_eq!(analysis.urgency, Urgency::Low);
    }

    #[test]
    fn unrecognized_urgency_maps_to_medium() {
        for urgency in [r#""urgent""#, "42", "null", "true"] {
            let content = format!(r#"{{"score": 10, "urgency": {}, "reasoning": "x"}}"#, urgency);
            assert_eq!(parse_analysis(&content).urgency, Urgency::Medium);
        }
    }

    #[test]
    fn non_numeric_budget_dropped() {
        let analysis = parse_analysis(r#"{"score": 10, "budget": "20k", "urgency": "low", "reasoning": "x"}"#);
        assert_eq!(analysis.budget, None);
    }

    #[test]
    fn missing_reasoning_falls_back_to_canned_string() {
        let analysis = parse_analysis(r#"{"score": 10, "urgency": "low"}"#);
        assert_eq!(analysis.reasoning, DEFAULT_REASONING);
    }
}
