use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Lead, LeadAnalysis};

const LEAD_COLUMNS: &str =
    "id, name, email, message, score, analysis, generated_email, created_at, updated_at";

/// Typed access to the `leads` table.
///
/// All failures are classified through `AppError::from(sqlx::Error)` so the
/// create and list paths report storage problems identically.
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new lead and returns the stored row.
    ///
    /// Each call creates a distinct row with a fresh id; create is not
    /// idempotent.
    pub async fn create_lead(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            "INSERT INTO leads (name, email, message) VALUES ($1, $2, $3) RETURNING {}",
            LEAD_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(lead)
    }

    /// Writes the enrichment result onto an existing lead.
    ///
    /// This is the only mutation of a lead after creation; it bumps
    /// `updated_at`.
    pub async fn update_enrichment(
        &self,
        id: Uuid,
        analysis: &LeadAnalysis,
        generated_email: Option<&str>,
    ) -> Result<Lead, AppError> {
        let analysis_json = serde_json::to_value(analysis)
            .map_err(|e| AppError::Internal(format!("Failed to serialize analysis: {}", e)))?;

        let lead = sqlx::query_as::<_, Lead>(&format!(
            "UPDATE leads SET score = $2, analysis = $3, generated_email = $4, \
             updated_at = now() WHERE id = $1 RETURNING {}",
            LEAD_COLUMNS
        ))
        .bind(id)
        .bind(analysis.score)
        .bind(analysis_json)
        .bind(generated_email)
        .fetch_one(&self.pool)
        .await?;

        Ok(lead)
    }

    /// Fetches all leads, newest first.
    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {} FROM leads ORDER BY created_at DESC",
            LEAD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }
}
