//! Required-field audit per form type
//!
//! Each form type carries a fixed list of dotted paths that must be
//! present (and, for text, non-empty) in the extracted record. Unknown
//! form types have no requirements.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::fields;
use crate::models::{FormType, ValidationReport};

lazy_static! {
    static ref REQUIRED_FIELDS: HashMap<FormType, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert(
            FormType::Individual,
            vec![
                "client_name.first",
                "client_name.last",
                "address.city",
                "address.province",
                "contact.email",
                "personal.dob",
                "employment.occupation",
                "financials.annual_income",
                "financials.net_financial_assets",
                "investment_profile.risk_tolerance",
                "investment_profile.time_horizon",
                "investment_profile.investment_objective",
            ],
        );
        map.insert(
            FormType::Corporate,
            vec![
                "corporate_name",
                "business_number",
                "authorized_persons",
                "financials.annual_income",
                "financials.net_assets",
            ],
        );
        map.insert(
            FormType::Trade,
            vec![
                "client_name",
                "investment_details.issuer",
                "investment_details.amount",
                "investment_details.source_of_funds",
            ],
        );
        map
    };
}

/// The dotted paths required for a form type; empty for unknown forms.
pub fn required_fields(form_type: FormType) -> &'static [&'static str] {
    REQUIRED_FIELDS
        .get(&form_type)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

pub(crate) fn apply(view: &Value, form_type: FormType, report: &mut ValidationReport) {
    for path in required_fields(form_type) {
        if fields::resolve(view, path).is_missing_or_blank() {
            report.missing_required.push((*path).to_string());
        }
    }
}
