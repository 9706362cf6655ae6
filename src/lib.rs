//! KYC Orchestrator
//!
//! A multilingual KYC intake service for an exempt market dealer:
//! - Extracts structured client data from call transcripts (LLM)
//! - Validates it against exemption, suitability, AML and concentration rules
//! - Drafts the matching KYC form field map
//! - Emails the run summary to the dealing representative
//!
//! PIPELINE:
//! TRANSCRIPT → EXTRACT → VALIDATE → GENERATE → NOTIFY

pub mod api;
pub mod config;
pub mod documents;
pub mod error;
pub mod extractor;
pub mod fields;
pub mod jobs;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod validation;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use validation::{ValidationOutcome, Validator};
