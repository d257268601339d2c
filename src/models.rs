use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::errors::AppError;

/// A persisted sales inquiry.
///
/// `score`, `analysis` and `generated_email` are written once by the
/// enrichment step and stay NULL when enrichment is skipped or fails.
/// `updated_at` only changes when enrichment is written.
#[derive(Debug, Clone, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub score: Option<i32>,
    pub analysis: Option<serde_json::Value>,
    pub generated_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Urgency level extracted from the lead message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// AI qualification result for a lead.
///
/// Always fully populated: the parser replaces anything unusable with the
/// shared default value, never leaves fields half-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadAnalysis {
    pub score: i32,
    pub budget: Option<f64>,
    pub urgency: Urgency,
    pub reasoning: String,
}

/// Incoming lead submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@domain.tld
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .unwrap()
    })
}

impl CreateLeadRequest {
    /// Strips HTML tags from all fields and trims whitespace.
    ///
    /// Applied before validation; keeps sanitization separate from validation.
    pub fn sanitize(&mut self) {
        self.name = strip_html(&self.name);
        self.email = strip_html(&self.email);
        self.message = strip_html(&self.message);
    }

    /// Validates field lengths and email format.
    ///
    /// Returns a field-specific message so 400 responses tell the caller
    /// exactly what was wrong.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if self.name.chars().count() > 200 {
            return Err(AppError::Validation(
                "Name must not exceed 200 characters".to_string(),
            ));
        }
        if self.email.is_empty() {
            return Err(AppError::Validation("Email is required".to_string()));
        }
        if !email_regex().is_match(&self.email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        if self.message.is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }
        if self.message.chars().count() < 10 {
            return Err(AppError::Validation(
                "Message must be at least 10 characters long".to_string(),
            ));
        }
        if self.message.chars().count() > 5000 {
            return Err(AppError::Validation(
                "Message must not exceed 5000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Strips HTML tags from a string value to prevent stored XSS.
pub fn strip_html(value: &str) -> String {
    html_tag_regex().replace_all(value, "").trim().to_string()
}

/// Response body for POST /leads.
#[derive(Debug, Clone, Serialize)]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
    pub data: LeadResponseData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponseData {
    pub lead_id: Uuid,
    pub received_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<LeadAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_email: Option<String>,
}

/// Response body for GET /leads.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListResponse {
    pub success: bool,
    pub data: Vec<LeadItem>,
    pub count: usize,
}

/// Flat projection of a stored lead. Optional enrichment fields are omitted
/// from the payload (not emitted as null) when absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadItem {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            name: lead.name,
            email: lead.email,
            message: lead.message,
            score: lead.score,
            analysis: lead.analysis,
            generated_email: lead.generated_email,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> CreateLeadRequest {
        CreateLeadRequest {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn valid_request_passes() {
        let req = request(
            "Tech Startup GmbH",
            "cto@startup.de",
            "We need CRM. Budget 20,000. Start Q2.",
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let req = request("", "cto@startup.de", "We need a CRM solution now");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Name is required"));
    }

    #[test]
    fn overlong_name_rejected() {
        let req = request(
            &"x".repeat(201),
            "cto@startup.de",
            "We need a CRM solution now",
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn invalid_email_rejected() {
        for email in ["not_an_email", "missing@domain", "@example.com", "user@"] {
            let req = request("Acme", email, "We need a CRM solution now");
            let err = req.validate().unwrap_err();
            assert!(
                matches!(err, AppError::Validation(_)),
                "accepted bad email: {}",
                email
            );
        }
    }

    #[test]
    fn short_message_rejected() {
        let req = request("Acme", "cto@startup.de", "short");
        let err = req.validate().unwrap_err();
        assert!(
            matches!(err, AppError::Validation(ref m) if m == "Message must be at least 10 characters long")
        );
    }

    #[test]
    fn overlong_message_rejected() {
        let req = request("Acme", "cto@startup.de", &"m".repeat(5001));
        assert!(req.validate().is_err());
    }

    #[test]
    fn sanitize_strips_html_and_trims() {
        let mut req = request(
            "  <b>Acme</b> Corp ",
            "cto@startup.de",
            "<script>alert(1)</script>We need a CRM solution",
        );
        req.sanitize();
        assert_eq!(req.name, "Acme Corp");
        assert_eq!(req.message, "alert(1)We need a CRM solution");
    }

    #[test]
    fn optional_enrichment_fields_omitted_when_absent() {
        let item = LeadItem {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            email: "a@b.co".into(),
            message: "We need a CRM solution".into(),
            score: None,
            analysis: None,
            generated_email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("score").is_none());
        assert!(json.get("analysis").is_none());
        assert!(json.get("generatedEmail").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn analysis_serializes_budget_as_null_when_absent() {
        let analysis = LeadAnalysis {
            score: 50,
            budget: None,
            urgency: Urgency::Medium,
            reasoning: "Analysis failed, default applied".into(),
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("budget").unwrap().is_null());
        assert_eq!(json.get("urgency").unwrap(), "medium");
    }
}
