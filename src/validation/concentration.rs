//! Concentration limit check
//!
//! Proposed investment as a share of net financial assets. Only computed
//! when both figures are strictly positive; otherwise no signal at all.

use crate::models::{ExtractedRecord, ValidationReport};

/// Above this share of NFA, a suitability justification must be documented.
pub const WARNING_THRESHOLD_PCT: f64 = 10.0;
/// Above this share, concentration is itself a suitability concern.
pub const CONCERN_THRESHOLD_PCT: f64 = 25.0;

pub(crate) fn apply(record: &ExtractedRecord, report: &mut ValidationReport) {
    let nfa = record
        .financials
        .as_ref()
        .and_then(|f| f.net_financial_assets)
        .unwrap_or(0.0);
    let amount = record
        .investment_details
        .as_ref()
        .and_then(|d| d.amount)
        .unwrap_or(0.0);

    if nfa > 0.0 && amount > 0.0 {
        let concentration_pct = (amount / nfa) * 100.0;

        if concentration_pct > WARNING_THRESHOLD_PCT {
            report.warnings.push(format!(
                "Investment represents {:.1}% of NFA (>10%) - document suitability justification",
                concentration_pct
            ));
        }

        // Not a replacement for the warning: both fire past 25%.
        if concentration_pct > CONCERN_THRESHOLD_PCT {
            report.suitability_concerns.push(format!(
                "High concentration: {:.1}% of NFA in single investment",
                concentration_pct
            ));
        }
    }
}
