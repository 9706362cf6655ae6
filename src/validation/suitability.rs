//! Suitability cross-checks
//!
//! Independent advisory checks between stated risk profile, objectives,
//! horizon, retirement plans, and age. None of them blocks validity:
//! concerns feed the follow-up verdict, warnings are informational only.

use chrono::{Datelike, Utc};

use crate::models::{
    ExtractedRecord, InvestmentObjective, RiskCapacity, RiskTolerance, TimeHorizon,
    ValidationReport,
};

pub(crate) fn apply(record: &ExtractedRecord, report: &mut ValidationReport) {
    check(record, Utc::now().year(), report);
}

/// All checks run unconditionally; none short-circuits another.
/// `current_year` is threaded through so the age and retirement arithmetic
/// is deterministic under test.
fn check(record: &ExtractedRecord, current_year: i32, report: &mut ValidationReport) {
    let profile = record.investment_profile.as_ref();

    let risk_tolerance = profile.and_then(|p| p.risk_tolerance);
    let risk_capacity = profile.and_then(|p| p.risk_capacity);
    let time_horizon = profile.and_then(|p| p.time_horizon);
    let objective = profile.and_then(|p| p.investment_objective);

    // Tolerance vs capacity mismatch
    if risk_tolerance == Some(RiskTolerance::High)
        && matches!(risk_capacity, Some(RiskCapacity::Low) | Some(RiskCapacity::Nil))
    {
        report.suitability_concerns.push(
            "Risk tolerance (HIGH) exceeds risk capacity (LOW/NIL) - verify with client"
                .to_string(),
        );
    }

    // Horizon vs planned retirement
    if let Some(retirement_year) = profile.and_then(|p| p.planned_retirement_year) {
        let years_to_retirement = retirement_year - current_year;
        if time_horizon == Some(TimeHorizon::Years10Plus) && years_to_retirement < 5 {
            report.suitability_concerns.push(format!(
                "Time horizon mismatch: selected 10+ years but retirement in {} years",
                years_to_retirement
            ));
        }
    }

    // Objective vs tolerance alignment
    if objective == Some(InvestmentObjective::Growth) && risk_tolerance == Some(RiskTolerance::Low)
    {
        report
            .suitability_concerns
            .push("Growth objective may not align with LOW risk tolerance".to_string());
    }

    if objective == Some(InvestmentObjective::Income) && risk_tolerance == Some(RiskTolerance::High)
    {
        report
            .warnings
            .push("Income objective with HIGH risk tolerance - verify client understands".to_string());
    }

    // Age-based checks; a malformed date of birth silently skips them.
    let dob = record.personal.as_ref().and_then(|p| p.dob.as_deref());
    if let Some(birth_year) = dob.and_then(parse_birth_year) {
        let age = current_year - birth_year;
        if age >= 65 && risk_tolerance == Some(RiskTolerance::High) {
            report.suitability_concerns.push(format!(
                "Client is {} years old with HIGH risk tolerance - ensure this is appropriate",
                age
            ));
        }
        if age >= 70 && time_horizon == Some(TimeHorizon::Years10Plus) {
            report.suitability_concerns.push(format!(
                "Client is {} years old with 10+ year time horizon - verify suitability",
                age
            ));
        }
    }
}

/// Year-only parse of a YYYY-MM-DD date: everything before the first dash.
fn parse_birth_year(dob: &str) -> Option<i32> {
    dob.split('-').next()?.parse().ok()
}
