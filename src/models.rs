//! Core data models for the KYC orchestrator
//!
//! The extracted record mirrors the JSON schema the extraction agent is
//! instructed to emit. Every field is optional: absence means "not stated
//! in the source transcript", never a default. Field names match the wire
//! schema exactly so dotted required-field paths stay stable.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTolerance {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCapacity {
    High,
    Medium,
    Low,
    Nil,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeHorizon {
    #[serde(rename = "1-3")]
    Years1To3,
    #[serde(rename = "3-5")]
    Years3To5,
    #[serde(rename = "6-10")]
    Years6To10,
    #[serde(rename = "10+")]
    Years10Plus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentObjective {
    Growth,
    GrowthAndIncome,
    Income,
    TaxEfficiency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum KnowledgeLevel {
    Good,
    Average,
    Limited,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceOfFunds {
    NonRegistered,
    Rrsp,
    Tfsa,
    Borrowed,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Exemption tier under the securities-exemption thresholds.
/// ACCREDITED strictly dominates ELIGIBLE, which dominates NON_ELIGIBLE.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExemptionTier {
    Accredited,
    Eligible,
    NonEligible,
    Unknown,
}

/// Which KYC form (and therefore rule set + document template) applies.
///
/// Unknown form types are accepted at the request boundary: the validator
/// treats them as having no required fields, and only the document stage
/// rejects them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Individual,
    Corporate,
    Trade,
    Unknown,
}

impl FormType {
    pub fn parse(value: &str) -> FormType {
        match value.to_lowercase().as_str() {
            "individual" => FormType::Individual,
            "corporate" => FormType::Corporate,
            "trade" => FormType::Trade,
            _ => FormType::Unknown,
        }
    }
}

//
// ================= Lenient Enum Deserialization =================
//

/// Deserialize an optional enum field, degrading unknown values to `None`.
///
/// The extraction agent is instructed to emit exact enum strings, but it
/// may not comply; an off-schema value means "not usable", not a failed
/// extraction.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

//
// ================= Record Sections =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameParts {
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpouseName {
    pub first: Option<String>,
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub cell: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Personal {
    /// YYYY-MM-DD as stated; only the leading year is ever parsed.
    pub dob: Option<String>,
    pub citizenship: Option<String>,
    pub dependents: Option<u32>,
    pub marital_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Employment {
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub years_employed: Option<f64>,
    pub is_self_employed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpouseEmployment {
    pub occupation: Option<String>,
    pub employer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Financials {
    pub annual_income: Option<f64>,
    pub spouse_income: Option<f64>,
    pub other_income: Option<f64>,
    pub total_income: Option<f64>,
    pub net_financial_assets: Option<f64>,
    pub non_financial_assets: Option<f64>,
    pub total_assets: Option<f64>,
    pub liabilities: Option<f64>,
    pub net_worth: Option<f64>,
    /// Corporate forms only: net assets of the corporation.
    pub net_assets: Option<f64>,
    pub income_stable_2_years: Option<bool>,
    pub borrowed_to_invest: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetComposition {
    pub cash_pct: Option<f64>,
    pub stocks_pct: Option<f64>,
    pub bonds_pct: Option<f64>,
    pub real_estate_pct: Option<f64>,
    pub other_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub knowledge_level: Option<KnowledgeLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_capacity: Option<RiskCapacity>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_horizon: Option<TimeHorizon>,
    #[serde(default, deserialize_with = "lenient")]
    pub investment_objective: Option<InvestmentObjective>,
    pub planned_retirement_year: Option<i32>,
    #[serde(default)]
    pub products_owned: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExemptionStatus {
    pub is_accredited: Option<bool>,
    pub is_eligible: Option<bool>,
    pub accreditation_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmlFlags {
    pub is_pep: Option<bool>,
    pub pep_position: Option<String>,
    pub is_hio: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentDetails {
    pub issuer: Option<String>,
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub source_of_funds: Option<SourceOfFunds>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceScores {
    #[serde(default, deserialize_with = "lenient")]
    pub client_name: Option<ConfidenceLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub financials: Option<ConfidenceLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_profile: Option<ConfidenceLevel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizedPerson {
    pub full_name: Option<String>,
    pub title: Option<String>,
}

/// Marker placed on a record when the extractor returned output that could
/// not be parsed. The pipeline logs it and aborts the run; it never panics
/// or propagates through the request that queued the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub message: String,
    pub raw_response: String,
    pub parse_error: String,
}

//
// ================= Extracted Record =================
//

/// Structured KYC data extracted from one transcript.
///
/// Created by the extractor, owned by the pipeline for the duration of one
/// run. The exemption conclusion is merged in by the pipeline (see
/// [`ExtractedRecord::with_exemption`]) rather than written in place by the
/// classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedRecord {
    pub client_name: Option<NameParts>,
    pub spouse_name: Option<SpouseName>,
    pub address: Option<Address>,
    pub contact: Option<Contact>,
    pub personal: Option<Personal>,
    pub employment: Option<Employment>,
    pub spouse_employment: Option<SpouseEmployment>,
    pub financials: Option<Financials>,
    pub asset_composition: Option<AssetComposition>,
    pub investment_profile: Option<InvestmentProfile>,
    pub exemption_status: Option<ExemptionStatus>,
    pub aml: Option<AmlFlags>,
    pub investment_details: Option<InvestmentDetails>,
    pub confidence_scores: Option<ConfidenceScores>,

    // Corporate forms
    pub corporate_name: Option<String>,
    pub business_number: Option<String>,
    pub authorized_persons: Option<Vec<AuthorizedPerson>>,

    // Auxiliary lists from the extractor
    pub missing_fields: Vec<String>,
    pub ambiguous_items: Vec<String>,
    pub follow_up_questions: Vec<String>,

    /// Set when extractor output was malformed (see [`ExtractionFailure`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractionFailure>,
}

impl ExtractedRecord {
    /// Build the failure-marker record the extractor substitutes for
    /// unparseable output.
    pub fn extraction_failure(raw_response: &str, parse_error: String) -> Self {
        let truncated: String = raw_response.chars().take(500).collect();
        ExtractedRecord {
            error: Some(ExtractionFailure {
                message: "Failed to parse extraction".to_string(),
                raw_response: truncated,
                parse_error,
            }),
            ..Default::default()
        }
    }

    /// "First Last", if either part was stated.
    pub fn client_full_name(&self) -> Option<String> {
        let name = self.client_name.as_ref()?;
        let full = format!(
            "{} {}",
            name.first.as_deref().unwrap_or(""),
            name.last.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if full.is_empty() {
            None
        } else {
            Some(full)
        }
    }

    /// Merge the classifier's conclusion into the record view handed to the
    /// document and notification stages.
    pub fn with_exemption(mut self, conclusion: &ExemptionConclusion) -> Self {
        self.exemption_status = Some(ExemptionStatus {
            is_accredited: Some(conclusion.is_accredited),
            is_eligible: Some(conclusion.is_eligible),
            accreditation_reason: conclusion.reason.clone(),
        });
        self
    }
}

//
// ================= Quick Extraction =================
//

/// Name-only extraction used for the immediate webhook acknowledgment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickExtract {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub missing_fields: Vec<String>,
}

impl QuickExtract {
    pub fn full_name(&self) -> Option<String> {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if full.is_empty() {
            None
        } else {
            Some(full)
        }
    }

    /// Count of non-empty quick-extracted values.
    pub fn fields_extracted(&self) -> usize {
        let mut count = 0;
        if self.first_name.as_deref().is_some_and(|s| !s.is_empty()) {
            count += 1;
        }
        if self.last_name.as_deref().is_some_and(|s| !s.is_empty()) {
            count += 1;
        }
        if !self.missing_fields.is_empty() {
            count += 1;
        }
        count
    }
}

//
// ================= Validation Report =================
//

/// The single output of the rule engine. Lists are appended to by each
/// sub-checker in a fixed order (required-fields → exemption → suitability
/// → AML → concentration); order matters only for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub exemption_status: ExemptionTier,
    pub red_flags: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_required: Vec<String>,
    pub suitability_concerns: Vec<String>,
    pub follow_up_needed: bool,
}

impl Default for ValidationReport {
    fn default() -> Self {
        ValidationReport {
            is_valid: true,
            exemption_status: ExemptionTier::Unknown,
            red_flags: Vec::new(),
            warnings: Vec::new(),
            missing_required: Vec::new(),
            suitability_concerns: Vec::new(),
            follow_up_needed: false,
        }
    }
}

/// Exemption classifier output, merged into the record by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemptionConclusion {
    pub tier: ExemptionTier,
    pub is_accredited: bool,
    pub is_eligible: bool,
    pub reason: Option<String>,
}

//
// ================= Display =================
//

impl fmt::Display for ExemptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExemptionTier::Accredited => "ACCREDITED",
            ExemptionTier::Eligible => "ELIGIBLE",
            ExemptionTier::NonEligible => "NON_ELIGIBLE",
            ExemptionTier::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormType::Individual => "individual",
            FormType::Corporate => "corporate",
            FormType::Trade => "trade",
            FormType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_deserializes() {
        let json = r#"{"financials": {"annual_income": 180000}}"#;
        let record: ExtractedRecord = serde_json::from_str(json).unwrap();
        let fin = record.financials.unwrap();
        assert_eq!(fin.annual_income, Some(180000.0));
        assert!(fin.net_worth.is_none());
        assert!(record.client_name.is_none());
    }

    #[test]
    fn test_enum_wire_strings() {
        let profile: InvestmentProfile = serde_json::from_str(
            r#"{
                "risk_tolerance": "MODERATE",
                "risk_capacity": "NIL",
                "time_horizon": "10+",
                "investment_objective": "GROWTH_AND_INCOME"
            }"#,
        )
        .unwrap();
        assert_eq!(profile.risk_tolerance, Some(RiskTolerance::Moderate));
        assert_eq!(profile.risk_capacity, Some(RiskCapacity::Nil));
        assert_eq!(profile.time_horizon, Some(TimeHorizon::Years10Plus));
        assert_eq!(
            profile.investment_objective,
            Some(InvestmentObjective::GrowthAndIncome)
        );

        let out = serde_json::to_value(&profile).unwrap();
        assert_eq!(out["time_horizon"], "10+");
        assert_eq!(out["investment_objective"], "GROWTH_AND_INCOME");
    }

    #[test]
    fn test_off_schema_enum_degrades_to_none() {
        let profile: InvestmentProfile =
            serde_json::from_str(r#"{"risk_tolerance": "VERY HIGH"}"#).unwrap();
        assert!(profile.risk_tolerance.is_none());
    }

    #[test]
    fn test_form_type_parse() {
        assert_eq!(FormType::parse("Individual"), FormType::Individual);
        assert_eq!(FormType::parse("trade"), FormType::Trade);
        assert_eq!(FormType::parse("nonexistent"), FormType::Unknown);
    }

    #[test]
    fn test_quick_extract_counts() {
        let quick = QuickExtract {
            first_name: Some("Ivan".into()),
            last_name: Some("Petrenko".into()),
            missing_fields: vec!["address".into()],
        };
        assert_eq!(quick.fields_extracted(), 3);
        assert_eq!(quick.full_name().as_deref(), Some("Ivan Petrenko"));

        let empty = QuickExtract::default();
        assert_eq!(empty.fields_extracted(), 0);
        assert!(empty.full_name().is_none());
    }

    #[test]
    fn test_with_exemption_merges_conclusion() {
        let record = ExtractedRecord::default();
        let conclusion = ExemptionConclusion {
            tier: ExemptionTier::Accredited,
            is_accredited: true,
            is_eligible: false,
            reason: Some("Net financial assets $1,500,000 >= $1,000,000".into()),
        };
        let merged = record.with_exemption(&conclusion);
        let status = merged.exemption_status.unwrap();
        assert_eq!(status.is_accredited, Some(true));
        assert_eq!(status.is_eligible, Some(false));
        assert!(status.accreditation_reason.is_some());
    }
}
