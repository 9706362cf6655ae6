//! AML / FINTRAC screening
//!
//! Independent boolean triggers; any subset may fire on one record.
//! PEP and HIO status are red flags (validity-blocking); leveraged
//! investing and large-asset verification are warnings.

use crate::models::{ExtractedRecord, ValidationReport};

use super::format_amount;

/// NFA at or above this requires verification documentation.
pub const NFA_VERIFICATION_THRESHOLD: f64 = 1_000_000.0;

pub(crate) fn apply(record: &ExtractedRecord, report: &mut ValidationReport) {
    let aml = record.aml.as_ref();
    let financials = record.financials.as_ref();

    if aml.and_then(|a| a.is_pep) == Some(true) {
        let position = aml
            .and_then(|a| a.pep_position.as_deref())
            .unwrap_or("position unknown");
        report.red_flags.push(format!(
            "Client is a Politically Exposed Person: {}",
            position
        ));
    }

    if aml.and_then(|a| a.is_hio) == Some(true) {
        report.red_flags.push(
            "Client is Head of International Organization - enhanced due diligence required"
                .to_string(),
        );
    }

    if financials.and_then(|f| f.borrowed_to_invest) == Some(true) {
        report
            .warnings
            .push("Client using borrowed funds - leverage disclosure required".to_string());
    }

    let nfa = financials
        .and_then(|f| f.net_financial_assets)
        .unwrap_or(0.0);
    if nfa >= NFA_VERIFICATION_THRESHOLD {
        report.warnings.push(format!(
            "NFA of ${} requires verification documentation",
            format_amount(nfa)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmlFlags, Financials};

    fn run(record: &ExtractedRecord) -> ValidationReport {
        let mut report = ValidationReport::default();
        apply(record, &mut report);
        report
    }

    #[test]
    fn test_pep_with_position() {
        let record = ExtractedRecord {
            aml: Some(AmlFlags {
                is_pep: Some(true),
                pep_position: Some("City Councillor".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert_eq!(
            report.red_flags[0],
            "Client is a Politically Exposed Person: City Councillor"
        );
    }

    #[test]
    fn test_pep_without_position() {
        let record = ExtractedRecord {
            aml: Some(AmlFlags {
                is_pep: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert!(report.red_flags[0].ends_with("position unknown"));
    }

    #[test]
    fn test_hio_red_flag() {
        let record = ExtractedRecord {
            aml: Some(AmlFlags {
                is_hio: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert!(report.red_flags[0].contains("Head of International Organization"));
    }

    #[test]
    fn test_borrowed_funds_warning() {
        let record = ExtractedRecord {
            financials: Some(Financials {
                borrowed_to_invest: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert!(report.red_flags.is_empty());
        assert!(report.warnings[0].contains("borrowed funds"));
    }

    #[test]
    fn test_large_nfa_needs_verification() {
        let record = ExtractedRecord {
            financials: Some(Financials {
                net_financial_assets: Some(2_000_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert_eq!(
            report.warnings[0],
            "NFA of $2,000,000 requires verification documentation"
        );
    }

    #[test]
    fn test_triggers_fire_together() {
        let record = ExtractedRecord {
            aml: Some(AmlFlags {
                is_pep: Some(true),
                is_hio: Some(true),
                ..Default::default()
            }),
            financials: Some(Financials {
                borrowed_to_invest: Some(true),
                net_financial_assets: Some(1_000_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = run(&record);
        assert_eq!(report.red_flags.len(), 2);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_clean_client_no_output() {
        let report = run(&ExtractedRecord::default());
        assert!(report.red_flags.is_empty());
        assert!(report.warnings.is_empty());
    }
}
