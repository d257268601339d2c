//! Lead-Intake API Library
//!
//! Core functionality for the lead-intake API: accepting sales inquiries,
//! persisting them, and enriching them with an AI-generated fit score and
//! reply email. Enrichment is best-effort; a lead is never lost because the
//! AI provider is unavailable.
//!
//! # Modules
//!
//! - `ai_client`: Groq chat-completions client and response parsing.
//! - `app`: Router assembly and middleware stack.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error taxonomy and storage failure classification.
//! - `handlers`: HTTP request handlers.
//! - `leads`: Lead creation workflow and read path.
//! - `models`: Data models and request/response DTOs.
//! - `storage`: Typed access to the leads table.

pub mod ai_client;
pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod leads;
pub mod models;
pub mod storage;
