//! Extractor trait and implementations
//!
//! The extractor turns free-text transcripts into structured records. It
//! is an opaque external capability: it may fail, return partial data, or
//! return unparseable output (surfaced as an error-marker record, never a
//! panic).

use async_trait::async_trait;

use crate::models::{
    Address, Contact, Employment, ExtractedRecord, Financials, FormType, InvestmentObjective,
    InvestmentProfile, NameParts, Personal, QuickExtract, RiskTolerance, TimeHorizon,
};
use crate::Result;

pub mod claude;
pub use claude::ClaudeExtractor;

/// Trait for transcript extraction (LLM controlled)
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Full extraction of one transcript into a structured record.
    async fn extract(
        &self,
        transcript: &str,
        language_hint: &str,
        form_type: FormType,
    ) -> Result<ExtractedRecord>;

    /// Name-only extraction for the immediate webhook acknowledgment.
    async fn quick_extract(&self, transcript: &str) -> Result<QuickExtract>;
}

/// Mock extractor for development & testing.
/// Keeps the pipeline functional without LLM dependency. The record is a
/// complete individual intake so downstream stages see a clean validation.
pub struct MockExtractor;

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(
        &self,
        _transcript: &str,
        _language_hint: &str,
        _form_type: FormType,
    ) -> Result<ExtractedRecord> {
        Ok(ExtractedRecord {
            client_name: Some(NameParts {
                first: Some("Test".into()),
                last: Some("Client".into()),
                ..Default::default()
            }),
            address: Some(Address {
                street: Some("123 Main Street".into()),
                city: Some("Calgary".into()),
                province: Some("AB".into()),
                postal_code: Some("T2P 1J9".into()),
                ..Default::default()
            }),
            contact: Some(Contact {
                email: Some("test.client@example.com".into()),
                phone: Some("403-555-1234".into()),
                ..Default::default()
            }),
            personal: Some(Personal {
                dob: Some("1980-01-15".into()),
                ..Default::default()
            }),
            employment: Some(Employment {
                occupation: Some("Engineer".into()),
                employer: Some("Tech Corp".into()),
                ..Default::default()
            }),
            financials: Some(Financials {
                annual_income: Some(180000.0),
                income_stable_2_years: Some(true),
                net_financial_assets: Some(500000.0),
                ..Default::default()
            }),
            investment_profile: Some(InvestmentProfile {
                risk_tolerance: Some(RiskTolerance::Moderate),
                time_horizon: Some(TimeHorizon::Years10Plus),
                investment_objective: Some(InvestmentObjective::Growth),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    async fn quick_extract(&self, _transcript: &str) -> Result<QuickExtract> {
        Ok(QuickExtract {
            first_name: Some("Test".into()),
            last_name: Some("Client".into()),
            missing_fields: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExemptionTier;
    use crate::validation::Validator;

    #[tokio::test]
    async fn test_mock_record_validates_clean() {
        let record = MockExtractor
            .extract("transcript", "auto", FormType::Individual)
            .await
            .unwrap();

        let outcome = Validator.validate(&record, FormType::Individual);

        assert!(outcome.report.missing_required.is_empty());
        assert!(outcome.report.is_valid);
        assert!(!outcome.report.follow_up_needed);
        assert!(outcome.report.red_flags.is_empty());
        // 180k income with 2-year stability clears the eligible tier only.
        assert_eq!(outcome.report.exemption_status, ExemptionTier::Eligible);
    }
}
