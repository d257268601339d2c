//! Lead creation workflow and read path.
//!
//! The creation workflow is a sequence of dependent steps:
//! 1. Persist the lead (any failure aborts, classified)
//! 2. Attempt enrichment: analyze, then generate the reply email
//! 3. Persist the enrichment result onto the lead
//!
//! Enrichment failure is a soft degrade: the lead stays saved and the caller
//! gets a warning instead of the analysis. A failure while persisting the
//! enrichment result is hard, because the AI work already succeeded and
//! silently discarding it would hide a real reliability incident.

use sqlx::PgPool;

use crate::ai_client::{AiClient, AiError};
use crate::errors::AppError;
use crate::models::{
    CreateLeadRequest, Lead, LeadAnalysis, LeadItem, LeadListResponse, LeadResponse,
    LeadResponseData,
};
use crate::storage::LeadStore;

const LEAD_RECEIVED_MESSAGE: &str = "Lead received successfully";
const AI_FAILED_WARNING: &str = "AI analysis failed, lead saved successfully";

pub struct LeadService {
    store: LeadStore,
    ai: AiClient,
}

impl LeadService {
    pub fn new(pool: PgPool, ai: AiClient) -> Self {
        Self {
            store: LeadStore::new(pool),
            ai,
        }
    }

    /// Persists a lead, attempts AI enrichment, and returns a response
    /// describing what succeeded.
    ///
    /// The input is assumed sanitized and validated by the handler. No step
    /// is retried.
    pub async fn create_lead(&self, req: &CreateLeadRequest) -> Result<LeadResponse, AppError> {
        let lead = self
            .store
            .create_lead(&req.name, &req.email, &req.message)
            .await?;

        tracing::info!("Lead received: {} from {}", lead.id, lead.email);

        let (analysis, generated_email) = match self.enrich(&lead).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("AI analysis failed for lead {}: {}", lead.id, e);
                return Ok(LeadResponse {
                    success: true,
                    message: LEAD_RECEIVED_MESSAGE.to_string(),
                    data: LeadResponseData {
                        lead_id: lead.id,
                        received_at: lead.created_at,
                        analysis: None,
                        generated_email: None,
                    },
                    warning: Some(AI_FAILED_WARNING.to_string()),
                });
            }
        };

        // Empty generated text means the email step was skipped; store NULL.
        let email_to_store = Some(generated_email.as_str()).filter(|e| !e.is_empty());

        if let Err(e) = self
            .store
            .update_enrichment(lead.id, &analysis, email_to_store)
            .await
        {
            tracing::error!("Failed to persist AI results for lead {}: {}", lead.id, e);
            return Err(e);
        }

        Ok(LeadResponse {
            success: true,
            message: LEAD_RECEIVED_MESSAGE.to_string(),
            data: LeadResponseData {
                lead_id: lead.id,
                received_at: lead.created_at,
                analysis: Some(analysis),
                generated_email: email_to_store.map(str::to_string),
            },
            warning: None,
        })
    }

    /// Runs both AI calls in sequence; email generation needs the analysis.
    ///
    /// Raises on any transport failure so the caller can degrade the whole
    /// enrichment step at once (no partial analysis is ever written).
    async fn enrich(&self, lead: &Lead) -> Result<(LeadAnalysis, String), AiError> {
        let analysis = self.ai.analyze(lead).await?;
        let generated_email = self.ai.generate_email(lead, &analysis).await?;
        Ok((analysis, generated_email))
    }

    /// Returns all leads, newest first, with enrichment fields when present.
    pub async fn list_leads(&self) -> Result<LeadListResponse, AppError> {
        let leads = self.store.list_leads().await?;

        let data: Vec<LeadItem> = leads.into_iter().map(LeadItem::from).collect();
        let count = data.len();

        Ok(LeadListResponse {
            success: true,
            data,
            count,
        })
    }
}
