//! Document drafting stage
//!
//! Maps an extracted record onto the fillable fields of the dealer's KYC
//! form templates and writes the draft field map to the output directory.
//! Field names match the AcroForm fields of the registered templates so
//! the map can be applied to the real form downstream.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::KycError;
use crate::models::{
    ExtractedRecord, FormType, InvestmentObjective, KnowledgeLevel, RiskTolerance, SourceOfFunds,
    TimeHorizon,
};
use crate::Result;

/// A single form field value: free text or a checkbox state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Text(String),
    Check(bool),
}

impl FieldEntry {
    fn text(value: Option<&str>) -> Self {
        FieldEntry::Text(value.unwrap_or_default().to_string())
    }
}

pub type FieldMap = BTreeMap<String, FieldEntry>;

/// Produces the client-facing document for a completed extraction.
pub trait DocumentGenerator: Send + Sync {
    fn fill(
        &self,
        record: &ExtractedRecord,
        form_type: FormType,
        dealing_rep: &str,
    ) -> Result<PathBuf>;
}

/// Maps records onto the registered form templates.
pub struct TemplateFiller {
    templates_dir: PathBuf,
    output_dir: PathBuf,
}

impl TemplateFiller {
    pub fn new(templates_dir: PathBuf, output_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            templates_dir,
            output_dir,
        })
    }

    /// Template filename for a form type. Unknown forms have no template.
    pub fn template_name(form_type: FormType) -> Option<&'static str> {
        match form_type {
            FormType::Individual => Some("3. ACA KYC Individual v.5.f - 2025.10.01.pdf"),
            FormType::Corporate => Some("4. ACA Corporate KYC v.6.5 - 2025.10.01.pdf"),
            FormType::Trade => Some("7. Trade Suitability V.6.pdf"),
            FormType::Unknown => None,
        }
    }

    fn output_filename(record: &ExtractedRecord, form_type: FormType) -> String {
        let name = record.client_name.clone().unwrap_or_default();
        let first = name.first.as_deref().unwrap_or("Unknown");
        let last = name.last.as_deref().unwrap_or("Client");
        let name_part = format!("{}_{}", first, last).replace(' ', "_");
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        format!(
            "{}_KYC_{}_{}.json",
            form_type.to_string().to_uppercase(),
            name_part,
            timestamp
        )
    }
}

impl DocumentGenerator for TemplateFiller {
    fn fill(
        &self,
        record: &ExtractedRecord,
        form_type: FormType,
        dealing_rep: &str,
    ) -> Result<PathBuf> {
        let template_name = Self::template_name(form_type)
            .ok_or_else(|| KycError::UnknownFormType(form_type.to_string()))?;

        let template_path = self.templates_dir.join(template_name);
        if !template_path.exists() {
            return Err(KycError::TemplateNotFound(
                template_path.display().to_string(),
            ));
        }

        let fields = map_fields(record, form_type, dealing_rep);

        let output_path = self.output_dir.join(Self::output_filename(record, form_type));
        write_field_map(&output_path, &fields)?;

        info!(
            form_type = %form_type,
            fields = fields.len(),
            path = %output_path.display(),
            "Drafted document field map"
        );

        Ok(output_path)
    }
}

fn write_field_map(path: &Path, fields: &FieldMap) -> Result<()> {
    let json = serde_json::to_string_pretty(fields)?;
    fs::write(path, json)?;
    Ok(())
}

/// Build the per-form field map.
pub fn map_fields(record: &ExtractedRecord, form_type: FormType, dealing_rep: &str) -> FieldMap {
    match form_type {
        FormType::Individual => map_individual(record, dealing_rep),
        FormType::Corporate => map_corporate(record, dealing_rep),
        FormType::Trade => map_trade(record, dealing_rep),
        FormType::Unknown => FieldMap::new(),
    }
}

fn map_individual(record: &ExtractedRecord, dealing_rep: &str) -> FieldMap {
    let name = record.client_name.clone().unwrap_or_default();
    let address = record.address.clone().unwrap_or_default();
    let contact = record.contact.clone().unwrap_or_default();
    let personal = record.personal.clone().unwrap_or_default();
    let employment = record.employment.clone().unwrap_or_default();
    let financials = record.financials.clone().unwrap_or_default();
    let assets = record.asset_composition.clone().unwrap_or_default();
    let profile = record.investment_profile.clone().unwrap_or_default();
    let aml = record.aml.clone().unwrap_or_default();

    let full_name = [name.last.as_deref(), name.first.as_deref(), name.middle.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut fields = common_header(dealing_rep);

    // Section 1 - client profile
    fields.insert("Full Name".into(), FieldEntry::Text(full_name));
    fields.insert("Last".into(), FieldEntry::text(name.last.as_deref()));
    fields.insert("First".into(), FieldEntry::text(name.first.as_deref()));
    fields.insert("Middle".into(), FieldEntry::text(name.middle.as_deref()));
    fields.insert(
        "Street Address cannot be a PO Box".into(),
        FieldEntry::text(address.street.as_deref()),
    );
    fields.insert("ApartmentUnit".into(), FieldEntry::text(address.unit.as_deref()));
    fields.insert("City".into(), FieldEntry::text(address.city.as_deref()));
    fields.insert("Prov".into(), FieldEntry::text(address.province.as_deref()));
    fields.insert(
        "Postal Code".into(),
        FieldEntry::text(address.postal_code.as_deref()),
    );
    fields.insert("Phone day".into(), FieldEntry::text(contact.phone.as_deref()));
    fields.insert("Cell".into(), FieldEntry::text(contact.cell.as_deref()));
    fields.insert("Email".into(), FieldEntry::text(contact.email.as_deref()));
    fields.insert("Date of Birth".into(), FieldEntry::text(personal.dob.as_deref()));
    // SIN is collected in person, never from a transcript.
    fields.insert("SIN".into(), FieldEntry::Text(String::new()));
    fields.insert(
        "Dependents".into(),
        FieldEntry::Text(personal.dependents.map(|d| d.to_string()).unwrap_or_default()),
    );
    fields.insert(
        "Primary Occupation".into(),
        FieldEntry::text(employment.occupation.as_deref()),
    );
    fields.insert("Employer".into(), FieldEntry::text(employment.employer.as_deref()));

    // Section 2 - investment knowledge
    fields.insert(
        "Good".into(),
        FieldEntry::Check(profile.knowledge_level == Some(KnowledgeLevel::Good)),
    );
    fields.insert(
        "Average".into(),
        FieldEntry::Check(profile.knowledge_level == Some(KnowledgeLevel::Average)),
    );
    fields.insert(
        "Limited".into(),
        FieldEntry::Check(profile.knowledge_level == Some(KnowledgeLevel::Limited)),
    );

    // Section 3 - suitability
    fields.insert(
        "LOW".into(),
        FieldEntry::Check(profile.risk_tolerance == Some(RiskTolerance::Low)),
    );
    fields.insert(
        "MODERATE".into(),
        FieldEntry::Check(profile.risk_tolerance == Some(RiskTolerance::Moderate)),
    );
    fields.insert(
        "HIGH".into(),
        FieldEntry::Check(profile.risk_tolerance == Some(RiskTolerance::High)),
    );

    fields.insert(
        "Growth".into(),
        FieldEntry::Check(profile.investment_objective == Some(InvestmentObjective::Growth)),
    );
    fields.insert(
        "Growth  Income".into(),
        FieldEntry::Check(
            profile.investment_objective == Some(InvestmentObjective::GrowthAndIncome),
        ),
    );
    fields.insert(
        "Income".into(),
        FieldEntry::Check(profile.investment_objective == Some(InvestmentObjective::Income)),
    );
    fields.insert(
        "Tax Efficiency".into(),
        FieldEntry::Check(profile.investment_objective == Some(InvestmentObjective::TaxEfficiency)),
    );

    fields.insert(
        "13 years".into(),
        FieldEntry::Check(profile.time_horizon == Some(TimeHorizon::Years1To3)),
    );
    fields.insert(
        "35 years".into(),
        FieldEntry::Check(profile.time_horizon == Some(TimeHorizon::Years3To5)),
    );
    fields.insert(
        "610 years".into(),
        FieldEntry::Check(profile.time_horizon == Some(TimeHorizon::Years6To10)),
    );
    fields.insert(
        "10 years".into(),
        FieldEntry::Check(profile.time_horizon == Some(TimeHorizon::Years10Plus)),
    );

    // Section 4 - financial
    fields.insert(
        "Employment Annual Income".into(),
        FieldEntry::Text(amount_text(financials.annual_income)),
    );
    fields.insert(
        "SpousePartner Annual Income".into(),
        FieldEntry::Text(amount_text(financials.spouse_income)),
    );
    fields.insert(
        "Other Income".into(),
        FieldEntry::Text(amount_text(financials.other_income)),
    );
    fields.insert(
        "Total Income".into(),
        FieldEntry::Text(amount_text(financials.total_income)),
    );
    fields.insert(
        "Estimated Net Financial Assets".into(),
        FieldEntry::Text(amount_text(financials.net_financial_assets)),
    );
    fields.insert(
        "Estimated NonFinancial Assets".into(),
        FieldEntry::Text(amount_text(financials.non_financial_assets)),
    );
    fields.insert(
        "Estimated Total Assets".into(),
        FieldEntry::Text(amount_text(financials.total_assets)),
    );
    fields.insert(
        "Estimated Liabilities".into(),
        FieldEntry::Text(amount_text(financials.liabilities)),
    );
    fields.insert(
        "Estimated Net Worth".into(),
        FieldEntry::Text(amount_text(financials.net_worth)),
    );

    fields.insert(
        "Cash  Deposits".into(),
        FieldEntry::Text(amount_text(assets.cash_pct)),
    );
    fields.insert(
        "Public Equities  Stocks".into(),
        FieldEntry::Text(amount_text(assets.stocks_pct)),
    );
    fields.insert(
        "Fixed Income  Bonds".into(),
        FieldEntry::Text(amount_text(assets.bonds_pct)),
    );

    // Section 5 - AML/PEP
    let is_pep = aml.is_pep.unwrap_or(false);
    let is_hio = aml.is_hio.unwrap_or(false);
    fields.insert("PEP Yes".into(), FieldEntry::Check(is_pep));
    fields.insert("PEP No".into(), FieldEntry::Check(!is_pep));
    fields.insert("HIO Yes".into(), FieldEntry::Check(is_hio));
    fields.insert("HIO No".into(), FieldEntry::Check(!is_hio));

    fields
}

fn map_corporate(record: &ExtractedRecord, dealing_rep: &str) -> FieldMap {
    let address = record.address.clone().unwrap_or_default();
    let financials = record.financials.clone().unwrap_or_default();
    let first_person = record
        .authorized_persons
        .as_ref()
        .and_then(|persons| persons.first())
        .and_then(|person| person.full_name.clone());

    let mut fields = common_header(dealing_rep);

    fields.insert("Name".into(), FieldEntry::text(record.corporate_name.as_deref()));
    fields.insert("Legal Address".into(), FieldEntry::text(address.street.as_deref()));
    fields.insert("City".into(), FieldEntry::text(address.city.as_deref()));
    fields.insert("Prov".into(), FieldEntry::text(address.province.as_deref()));
    fields.insert(
        "Postal Code".into(),
        FieldEntry::text(address.postal_code.as_deref()),
    );
    fields.insert(
        "CRA Business Number".into(),
        FieldEntry::text(record.business_number.as_deref()),
    );
    fields.insert("Person 1".into(), FieldEntry::text(first_person.as_deref()));
    fields.insert(
        "Estimated annual income from all sources".into(),
        FieldEntry::Text(amount_text(financials.annual_income)),
    );
    fields.insert(
        "Net Assets of corporation".into(),
        FieldEntry::Text(amount_text(financials.net_assets)),
    );

    fields
}

fn map_trade(record: &ExtractedRecord, dealing_rep: &str) -> FieldMap {
    let investment = record.investment_details.clone().unwrap_or_default();
    let source = investment.source_of_funds;

    let mut fields = common_header(dealing_rep);

    fields.insert(
        "Client".into(),
        FieldEntry::Text(record.client_full_name().unwrap_or_default()),
    );

    fields.insert(
        "Nonregd".into(),
        FieldEntry::Check(source == Some(SourceOfFunds::NonRegistered)),
    );
    fields.insert("RRSP".into(), FieldEntry::Check(source == Some(SourceOfFunds::Rrsp)));
    fields.insert("TFSA".into(), FieldEntry::Check(source == Some(SourceOfFunds::Tfsa)));
    fields.insert(
        "Borrowed".into(),
        FieldEntry::Check(source == Some(SourceOfFunds::Borrowed)),
    );
    fields.insert("Other".into(), FieldEntry::Check(source == Some(SourceOfFunds::Other)));

    fields.insert("Issuer 1".into(), FieldEntry::text(investment.issuer.as_deref()));
    fields.insert(
        "Amount 1".into(),
        FieldEntry::Text(amount_text(investment.amount)),
    );

    fields
}

fn common_header(dealing_rep: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        "Date".into(),
        FieldEntry::Text(Utc::now().format("%Y-%m-%d").to_string()),
    );
    fields.insert(
        "Dealing Representative".into(),
        FieldEntry::Text(dealing_rep.to_string()),
    );
    fields
}

/// Render a numeric field. Whole amounts print without a decimal point.
fn amount_text(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
        None => String::new(),
    }
}
