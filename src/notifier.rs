//! Email notification stage
//!
//! Sends the extraction summary to the dealing representative via Resend.
//! Notification failures never fail the pipeline run: every error path logs
//! and reports `false`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::models::{ExtractedRecord, ExemptionTier, FormType, ValidationReport};
use crate::validation::format_amount;

const RESEND_URL: &str = "https://api.resend.com/emails";

/// Delivers the run summary. Implementations must not fail the pipeline;
/// a lost notification is reported as `false` and logged.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        record: &ExtractedRecord,
        report: &ValidationReport,
        document: Option<&Path>,
        form_type: FormType,
    ) -> bool;
}

pub struct ResendNotifier {
    client: Client,
    api_key: String,
    from: String,
    to: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

impl ResendNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            from,
            to,
            base_url: RESEND_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(
        &self,
        record: &ExtractedRecord,
        report: &ValidationReport,
        document: Option<&Path>,
        form_type: FormType,
    ) -> bool {
        if self.api_key.is_empty() {
            warn!("RESEND_API_KEY not configured, skipping notification");
            return false;
        }

        let subject = build_subject(record, report);
        let html = build_email_html(record, report, document, form_type);

        let request = SendEmailRequest {
            from: self.from.clone(),
            to: vec![self.to.clone()],
            subject: subject.clone(),
            html,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(subject = %subject, "Notification email sent");
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!(%status, "Resend rejected email: {}", body);
                false
            }
            Err(e) => {
                error!("Failed to send notification email: {}", e);
                false
            }
        }
    }
}

/// Subject line: warning indicator when any red flag is present.
pub fn build_subject(record: &ExtractedRecord, report: &ValidationReport) -> String {
    let name = record.client_name.clone().unwrap_or_default();
    let full_name = format!(
        "{} {}",
        name.first.as_deref().unwrap_or("Unknown"),
        name.last.as_deref().unwrap_or("Client")
    );
    let indicator = if report.red_flags.is_empty() {
        "✅ "
    } else {
        "⚠️ "
    };
    format!("{}KYC Extraction Complete: {}", indicator, full_name)
}

fn fmt_currency(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", format_amount(v)),
        None => "N/A".to_string(),
    }
}

/// Wire-string rendering of an optional enum, "N/A" when absent.
fn enum_text<T: Serialize>(value: &Option<T>) -> String {
    value
        .as_ref()
        .and_then(|v| serde_json::to_value(v).ok())
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "N/A".to_string())
}

fn text_or_na(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_string()
}

fn list_section(title: &str, color: &str, background: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let list: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", item))
        .collect();
    format!(
        "<div style=\"background: {background}; border-left: 4px solid {color}; \
         padding: 15px; margin: 20px 0;\">\
         <h3 style=\"color: {color}; margin-top: 0;\">{title}</h3>\
         <ul>{list}</ul></div>"
    )
}

fn exemption_badge_colors(tier: ExemptionTier) -> (&'static str, &'static str) {
    match tier {
        ExemptionTier::Accredited => ("#28a745", "white"),
        ExemptionTier::Eligible => ("#17a2b8", "white"),
        ExemptionTier::NonEligible => ("#6c757d", "white"),
        ExemptionTier::Unknown => ("#ffc107", "black"),
    }
}

/// Render the HTML summary body.
pub fn build_email_html(
    record: &ExtractedRecord,
    report: &ValidationReport,
    document: Option<&Path>,
    form_type: FormType,
) -> String {
    let name = record.client_name.clone().unwrap_or_default();
    let full_name = {
        let joined = format!(
            "{} {}",
            name.first.as_deref().unwrap_or(""),
            name.last.as_deref().unwrap_or("")
        );
        let trimmed = joined.trim().to_string();
        if trimmed.is_empty() {
            "Unknown".to_string()
        } else {
            trimmed
        }
    };

    let address = record.address.clone().unwrap_or_default();
    let contact = record.contact.clone().unwrap_or_default();
    let personal = record.personal.clone().unwrap_or_default();
    let employment = record.employment.clone().unwrap_or_default();
    let financials = record.financials.clone().unwrap_or_default();
    let profile = record.investment_profile.clone().unwrap_or_default();
    let exemption = record.exemption_status.clone().unwrap_or_default();
    let confidence = record.confidence_scores.clone().unwrap_or_default();

    let red_flags_html = list_section(
        "⚠️ Red Flags - Action Required",
        "#dc3545",
        "#fff5f5",
        &report.red_flags,
    );
    let warnings_html = list_section("⚡ Warnings", "#ffc107", "#fff8e6", &report.warnings);
    let suitability_html = list_section(
        "📋 Suitability Concerns",
        "#0066cc",
        "#e7f3ff",
        &report.suitability_concerns,
    );
    let follow_up_html = list_section(
        "💬 Suggested Follow-up Questions",
        "#17a2b8",
        "#f0f7ff",
        &record.follow_up_questions,
    );

    let missing_html = if report.missing_required.is_empty() {
        String::new()
    } else {
        format!(
            "<div style=\"background: #f8f9fa; border-left: 4px solid #6c757d; \
             padding: 15px; margin: 20px 0;\">\
             <h3 style=\"color: #6c757d; margin-top: 0;\">❓ Missing Fields</h3>\
             <p>The following required fields were not found in the transcript:</p>\
             <p><code>{}</code></p></div>",
            report.missing_required.join(", ")
        )
    };

    let document_html = match document {
        Some(path) => format!(
            "<p><strong>Draft document:</strong> <code>{}</code></p>",
            path.display()
        ),
        None => String::new(),
    };

    let (badge_bg, badge_fg) = exemption_badge_colors(report.exemption_status);

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head>\
         <body style=\"font-family: -apple-system, 'Segoe UI', Roboto, Helvetica, Arial, \
         sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; \
         padding: 20px;\">\
         <h1 style=\"color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px;\">\
         KYC Extraction Results \
         <span style=\"background: {badge_bg}; color: {badge_fg}; padding: 5px 15px; \
         border-radius: 20px; font-size: 14px;\">{tier}</span></h1>\
         <p><strong>Form Type:</strong> {form} KYC</p>\
         <p><strong>Confidence:</strong> Name: {conf_name} | Financials: {conf_fin} | \
         Risk Profile: {conf_risk}</p>\
         {document_html}\
         {red_flags_html}{warnings_html}{suitability_html}{missing_html}\
         <h2>👤 Client Information</h2><table>\
         <tr><th>Full Name</th><td>{full_name}</td></tr>\
         <tr><th>Address</th><td>{street}, {city}, {province} {postal}</td></tr>\
         <tr><th>Phone</th><td>{phone} / {cell}</td></tr>\
         <tr><th>Email</th><td>{email}</td></tr>\
         <tr><th>Date of Birth</th><td>{dob}</td></tr>\
         <tr><th>Occupation</th><td>{occupation}</td></tr>\
         <tr><th>Employer</th><td>{employer}</td></tr>\
         </table>\
         <h2>💰 Financial Profile</h2><table>\
         <tr><th>Annual Income</th><td>{income}</td></tr>\
         <tr><th>Spouse Income</th><td>{spouse_income}</td></tr>\
         <tr><th>Total Income</th><td>{total_income}</td></tr>\
         <tr><th>Net Financial Assets</th><td>{nfa}</td></tr>\
         <tr><th>Non-Financial Assets</th><td>{non_fin}</td></tr>\
         <tr><th>Total Assets</th><td>{total_assets}</td></tr>\
         <tr><th>Liabilities</th><td>{liabilities}</td></tr>\
         <tr><th>Net Worth</th><td><strong>{net_worth}</strong></td></tr>\
         </table>\
         <h2>📊 Investment Profile</h2><table>\
         <tr><th>Knowledge Level</th><td>{knowledge}</td></tr>\
         <tr><th>Risk Tolerance</th><td>{tolerance}</td></tr>\
         <tr><th>Risk Capacity</th><td>{capacity}</td></tr>\
         <tr><th>Time Horizon</th><td>{horizon} years</td></tr>\
         <tr><th>Investment Objective</th><td>{objective}</td></tr>\
         </table>\
         <h2>🏦 Exemption Status</h2><table>\
         <tr><th>Status</th><td><strong>{tier}</strong></td></tr>\
         <tr><th>Is Accredited</th><td>{accredited}</td></tr>\
         <tr><th>Is Eligible</th><td>{eligible}</td></tr>\
         <tr><th>Reason</th><td>{reason}</td></tr>\
         </table>\
         {follow_up_html}\
         <hr style=\"margin-top: 40px;\">\
         <p style=\"color: #6c757d; font-size: 12px;\">\
         This extraction was generated automatically. Please review all data before \
         finalizing the KYC form. The draft document may require manual adjustments.</p>\
         </body></html>",
        tier = report.exemption_status,
        form = form_type.to_string().to_uppercase(),
        conf_name = enum_text(&confidence.client_name),
        conf_fin = enum_text(&confidence.financials),
        conf_risk = enum_text(&confidence.risk_profile),
        street = text_or_na(address.street.as_deref()),
        city = text_or_na(address.city.as_deref()),
        province = text_or_na(address.province.as_deref()),
        postal = address.postal_code.as_deref().unwrap_or(""),
        phone = text_or_na(contact.phone.as_deref()),
        cell = text_or_na(contact.cell.as_deref()),
        email = text_or_na(contact.email.as_deref()),
        dob = text_or_na(personal.dob.as_deref()),
        occupation = text_or_na(employment.occupation.as_deref()),
        employer = text_or_na(employment.employer.as_deref()),
        income = fmt_currency(financials.annual_income),
        spouse_income = fmt_currency(financials.spouse_income),
        total_income = fmt_currency(financials.total_income),
        nfa = fmt_currency(financials.net_financial_assets),
        non_fin = fmt_currency(financials.non_financial_assets),
        total_assets = fmt_currency(financials.total_assets),
        liabilities = fmt_currency(financials.liabilities),
        net_worth = fmt_currency(financials.net_worth),
        knowledge = enum_text(&profile.knowledge_level),
        tolerance = enum_text(&profile.risk_tolerance),
        capacity = enum_text(&profile.risk_capacity),
        horizon = enum_text(&profile.time_horizon),
        objective = enum_text(&profile.investment_objective),
        accredited = if exemption.is_accredited.unwrap_or(false) { "Yes" } else { "No" },
        eligible = if exemption.is_eligible.unwrap_or(false) { "Yes" } else { "No" },
        reason = text_or_na(exemption.accreditation_reason.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Financials, NameParts};
    use std::path::PathBuf;

    fn record_with_name() -> ExtractedRecord {
        ExtractedRecord {
            client_name: Some(NameParts {
                first: Some("Ivan".to_string()),
                last: Some("Petrenko".to_string()),
                ..Default::default()
            }),
            financials: Some(Financials {
                annual_income: Some(250000.0),
                ..Default::default()
            }),
            follow_up_questions: vec!["Can you confirm your SIN for the form?".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_subject_clean_run() {
        let report = ValidationReport::default();
        let subject = build_subject(&record_with_name(), &report);
        assert_eq!(subject, "✅ KYC Extraction Complete: Ivan Petrenko");
    }

    #[test]
    fn test_subject_with_red_flags() {
        let report = ValidationReport {
            red_flags: vec!["Client is a Politically Exposed Person: Minister".to_string()],
            ..Default::default()
        };
        let subject = build_subject(&record_with_name(), &report);
        assert!(subject.starts_with("⚠️ "));
    }

    #[test]
    fn test_subject_unknown_client() {
        let report = ValidationReport::default();
        let subject = build_subject(&ExtractedRecord::default(), &report);
        assert_eq!(subject, "✅ KYC Extraction Complete: Unknown Client");
    }

    #[test]
    fn test_html_includes_sections_that_have_content() {
        let report = ValidationReport {
            exemption_status: ExemptionTier::Accredited,
            red_flags: vec!["Client is Head of International Organization - enhanced due diligence required".to_string()],
            warnings: vec!["Client borrowed funds to invest - additional disclosure required".to_string()],
            missing_required: vec!["contact.email".to_string()],
            ..Default::default()
        };
        let html = build_email_html(&record_with_name(), &report, None, FormType::Individual);

        assert!(html.contains("Red Flags - Action Required"));
        assert!(html.contains("Head of International Organization"));
        assert!(html.contains("⚡ Warnings"));
        assert!(html.contains("<code>contact.email</code>"));
        assert!(html.contains("ACCREDITED"));
        assert!(html.contains("$250,000"));
        assert!(html.contains("Suggested Follow-up Questions"));
        assert!(html.contains("INDIVIDUAL KYC"));
    }

    #[test]
    fn test_html_omits_empty_sections() {
        let html = build_email_html(
            &ExtractedRecord::default(),
            &ValidationReport::default(),
            None,
            FormType::Trade,
        );
        assert!(!html.contains("Red Flags"));
        assert!(!html.contains("Missing Fields"));
        assert!(!html.contains("Suggested Follow-up Questions"));
        assert!(html.contains("UNKNOWN"));
        assert!(html.contains("N/A"));
    }

    #[test]
    fn test_html_links_document_path() {
        let path = PathBuf::from("/tmp/INDIVIDUAL_KYC_Ivan_Petrenko_20260830_120000.json");
        let html = build_email_html(
            &record_with_name(),
            &ValidationReport::default(),
            Some(&path),
            FormType::Individual,
        );
        assert!(html.contains("INDIVIDUAL_KYC_Ivan_Petrenko_20260830_120000.json"));
    }
}
