//! KYC rule engine
//!
//! Composes the sub-checkers into one report per record, in a fixed order:
//! required fields → exemption → suitability → AML → concentration. The
//! engine is total: an entirely absent record yields NON_ELIGIBLE, a full
//! completeness failure, and no flags, never an error.

pub mod aml;
pub mod completeness;
pub mod concentration;
pub mod exemption;
pub mod suitability;

use serde_json::Value;
use tracing::info;

use crate::models::{ExemptionConclusion, ExtractedRecord, FormType, ValidationReport};

/// More required fields missing than this renders the record invalid.
/// Fixed regardless of the per-form requirement count, matching the
/// upstream compliance workflow.
pub const MAX_MISSING_BEFORE_INVALID: usize = 3;

/// Outcome of one validation run: the report plus the exemption conclusion
/// for the pipeline to merge into the record it hands downstream.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub report: ValidationReport,
    pub exemption: ExemptionConclusion,
}

/// The rule engine. Stateless; one instance serves all runs.
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Validator
    }

    /// Run every check against one record and derive the verdict flags.
    pub fn validate(&self, record: &ExtractedRecord, form_type: FormType) -> ValidationOutcome {
        let mut report = ValidationReport::default();

        // Dotted-path checks operate on a JSON view of the record.
        let view = serde_json::to_value(record).unwrap_or(Value::Null);

        completeness::apply(&view, form_type, &mut report);
        let exemption = exemption::apply(record.financials.as_ref(), &mut report);
        suitability::apply(record, &mut report);
        aml::apply(record, &mut report);
        concentration::apply(record, &mut report);

        report.follow_up_needed = !report.red_flags.is_empty()
            || report.missing_required.len() > MAX_MISSING_BEFORE_INVALID
            || !report.suitability_concerns.is_empty();

        report.is_valid = report.red_flags.is_empty()
            && report.missing_required.len() <= MAX_MISSING_BEFORE_INVALID;

        info!(
            form_type = %form_type,
            exemption = %report.exemption_status,
            red_flags = report.red_flags.len(),
            missing = report.missing_required.len(),
            is_valid = report.is_valid,
            "Validation completed"
        );

        ValidationOutcome { report, exemption }
    }
}

/// Whole-dollar amount with thousands separators, e.g. `1500000 → "1,500,000"`.
pub(crate) fn format_amount(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if whole < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
