//! Exemption tier classifier
//!
//! Applies the accredited/eligible investor thresholds to a client's
//! stated financials. Absent figures degrade to zero and an absent
//! stability flag to false, so every record classifies; the floor is
//! NON_ELIGIBLE, never an error.

use crate::models::{ExemptionConclusion, ExemptionTier, Financials, ValidationReport};

use super::format_amount;

// Accredited investor thresholds
pub const ACCREDITED_INCOME_SINGLE: f64 = 200_000.0;
pub const ACCREDITED_INCOME_JOINT: f64 = 300_000.0;
pub const ACCREDITED_NFA: f64 = 1_000_000.0;
pub const ACCREDITED_NET_ASSETS: f64 = 5_000_000.0;

// Eligible investor thresholds
pub const ELIGIBLE_INCOME_SINGLE: f64 = 75_000.0;
pub const ELIGIBLE_INCOME_JOINT: f64 = 125_000.0;
pub const ELIGIBLE_NET_ASSETS: f64 = 400_000.0;

/// Classify a client's exemption tier. Pure: same inputs always yield the
/// same tier and reason string. First matching accredited rule wins.
pub fn classify(financials: &Financials) -> ExemptionConclusion {
    let annual_income = financials.annual_income.unwrap_or(0.0);
    let spouse_income = financials.spouse_income.unwrap_or(0.0);
    let total_income = annual_income + spouse_income;
    let nfa = financials.net_financial_assets.unwrap_or(0.0);
    let net_worth = financials.net_worth.unwrap_or(0.0);
    let income_stable = financials.income_stable_2_years.unwrap_or(false);

    let mut is_accredited = false;
    let mut reason = None;

    if annual_income >= ACCREDITED_INCOME_SINGLE && income_stable {
        is_accredited = true;
        reason = Some(format!(
            "Annual income ${} >= $200,000 for 2 years",
            format_amount(annual_income)
        ));
    } else if total_income >= ACCREDITED_INCOME_JOINT && income_stable {
        is_accredited = true;
        reason = Some(format!(
            "Joint income ${} >= $300,000 for 2 years",
            format_amount(total_income)
        ));
    } else if nfa >= ACCREDITED_NFA {
        is_accredited = true;
        reason = Some(format!(
            "Net financial assets ${} >= $1,000,000",
            format_amount(nfa)
        ));
    } else if net_worth >= ACCREDITED_NET_ASSETS {
        is_accredited = true;
        reason = Some(format!(
            "Net assets ${} >= $5,000,000",
            format_amount(net_worth)
        ));
    }

    let is_eligible = !is_accredited
        && (annual_income >= ELIGIBLE_INCOME_SINGLE
            || total_income >= ELIGIBLE_INCOME_JOINT
            || net_worth >= ELIGIBLE_NET_ASSETS);

    let tier = if is_accredited {
        ExemptionTier::Accredited
    } else if is_eligible {
        ExemptionTier::Eligible
    } else {
        ExemptionTier::NonEligible
    };

    ExemptionConclusion {
        tier,
        is_accredited,
        is_eligible,
        reason,
    }
}

/// Classify and record the tier plus its standing warning on the report.
pub(crate) fn apply(
    financials: Option<&Financials>,
    report: &mut ValidationReport,
) -> ExemptionConclusion {
    let default = Financials::default();
    let conclusion = classify(financials.unwrap_or(&default));

    report.exemption_status = conclusion.tier;
    match conclusion.tier {
        ExemptionTier::Eligible => {
            report.warnings.push(
                "Eligible investors have $100k rolling 12-month limit (non-BC)".to_string(),
            );
        }
        ExemptionTier::NonEligible => {
            report.warnings.push(
                "Client may only invest up to $10,000 under minimum amount exemption".to_string(),
            );
        }
        _ => {}
    }

    conclusion
}

#[cfg(test)]
mod tests {
    use super::*;

    fn financials() -> Financials {
        Financials::default()
    }

    #[test]
    fn test_accredited_by_single_income() {
        let conclusion = classify(&Financials {
            annual_income: Some(250_000.0),
            income_stable_2_years: Some(true),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
        assert!(conclusion.is_accredited);
        assert!(!conclusion.is_eligible);
        assert_eq!(
            conclusion.reason.as_deref(),
            Some("Annual income $250,000 >= $200,000 for 2 years")
        );
    }

    #[test]
    fn test_accredited_by_joint_income() {
        let conclusion = classify(&Financials {
            annual_income: Some(180_000.0),
            spouse_income: Some(150_000.0),
            income_stable_2_years: Some(true),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
        assert_eq!(
            conclusion.reason.as_deref(),
            Some("Joint income $330,000 >= $300,000 for 2 years")
        );
    }

    #[test]
    fn test_accredited_by_nfa() {
        let conclusion = classify(&Financials {
            net_financial_assets: Some(1_500_000.0),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
        assert_eq!(
            conclusion.reason.as_deref(),
            Some("Net financial assets $1,500,000 >= $1,000,000")
        );
    }

    #[test]
    fn test_accredited_by_net_worth() {
        let conclusion = classify(&Financials {
            net_worth: Some(6_000_000.0),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
        assert_eq!(
            conclusion.reason.as_deref(),
            Some("Net assets $6,000,000 >= $5,000,000")
        );
    }

    #[test]
    fn test_not_accredited_without_stable_income() {
        let conclusion = classify(&Financials {
            annual_income: Some(250_000.0),
            income_stable_2_years: Some(false),
            ..financials()
        });
        assert!(!conclusion.is_accredited);
        // Still clears the eligible single-income threshold.
        assert_eq!(conclusion.tier, ExemptionTier::Eligible);
    }

    #[test]
    fn test_eligible_by_each_rule() {
        let by_income = classify(&Financials {
            annual_income: Some(80_000.0),
            ..financials()
        });
        assert_eq!(by_income.tier, ExemptionTier::Eligible);
        assert!(by_income.reason.is_none());

        let by_joint = classify(&Financials {
            annual_income: Some(70_000.0),
            spouse_income: Some(60_000.0),
            ..financials()
        });
        assert_eq!(by_joint.tier, ExemptionTier::Eligible);

        let by_net_worth = classify(&Financials {
            net_worth: Some(450_000.0),
            ..financials()
        });
        assert_eq!(by_net_worth.tier, ExemptionTier::Eligible);
    }

    #[test]
    fn test_non_eligible() {
        let conclusion = classify(&Financials {
            annual_income: Some(50_000.0),
            net_worth: Some(100_000.0),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::NonEligible);
        assert!(!conclusion.is_accredited);
        assert!(!conclusion.is_eligible);
    }

    #[test]
    fn test_accredited_dominates_eligible() {
        // Income clears only the eligible bar, but NFA clears accredited.
        let conclusion = classify(&Financials {
            annual_income: Some(100_000.0),
            net_financial_assets: Some(1_500_000.0),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
    }

    #[test]
    fn test_income_boundary() {
        let at = classify(&Financials {
            annual_income: Some(200_000.0),
            income_stable_2_years: Some(true),
            ..financials()
        });
        assert_eq!(at.tier, ExemptionTier::Accredited);

        let below = classify(&Financials {
            annual_income: Some(199_999.0),
            income_stable_2_years: Some(true),
            ..financials()
        });
        assert_eq!(below.tier, ExemptionTier::Eligible);
    }

    #[test]
    fn test_nfa_boundary() {
        let conclusion = classify(&Financials {
            net_financial_assets: Some(1_000_000.0),
            ..financials()
        });
        assert_eq!(conclusion.tier, ExemptionTier::Accredited);
    }

    #[test]
    fn test_empty_financials_is_non_eligible() {
        let conclusion = classify(&financials());
        assert_eq!(conclusion.tier, ExemptionTier::NonEligible);
        assert!(conclusion.reason.is_none());
    }

    #[test]
    fn test_apply_records_standing_warnings() {
        let mut report = ValidationReport::default();
        apply(
            Some(&Financials {
                annual_income: Some(80_000.0),
                ..financials()
            }),
            &mut report,
        );
        assert_eq!(report.exemption_status, ExemptionTier::Eligible);
        assert!(report.warnings[0].contains("$100k rolling 12-month limit"));

        let mut report = ValidationReport::default();
        apply(None, &mut report);
        assert_eq!(report.exemption_status, ExemptionTier::NonEligible);
        assert!(report.warnings[0].contains("$10,000"));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let fin = Financials {
            annual_income: Some(250_000.0),
            income_stable_2_years: Some(true),
            net_worth: Some(3_000_000.0),
            ..financials()
        };
        let first = classify(&fin);
        let second = classify(&fin);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.reason, second.reason);
    }
}
