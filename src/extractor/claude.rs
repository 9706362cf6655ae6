//! Claude-powered KYC extractor
//!
//! Calls the Anthropic Messages API to turn multilingual call transcripts
//! (Russian, Ukrainian, English) into structured records.
//! Uses a long-lived reqwest::Client for connection pooling.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use async_trait::async_trait;

use crate::error::KycError;
use crate::models::{ExtractedRecord, FormType, QuickExtract};
use crate::Result;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS_FULL: u32 = 4000;
const MAX_TOKENS_QUICK: u32 = 200;
/// Quick extraction only needs the opening of the call.
const QUICK_TRANSCRIPT_CHARS: usize = 1000;

const EXTRACTION_PROMPT: &str = r#"You are a KYC Data Extraction Agent for a Canadian Exempt Market Dealer. Extract client information from call transcripts and return structured JSON.

## CRITICAL RULES

1. **NEVER HALLUCINATE** - If information is not explicitly stated, return null for that field.

2. **SENSITIVE DATA**:
   - SIN (Social Insurance Number): ALWAYS return null - flag for manual collection
   - Bank account numbers: ALWAYS return null

3. **MULTILINGUAL HANDLING**:
   - Transcript may be in Russian, Ukrainian, or English (or mixed)
   - Translate all values to English
   - Transliterate names to Latin alphabet (Cyrillic -> English)

4. **EXEMPTION DETERMINATION** (Canadian NI 45-106):
   - Accredited: Income >$200k (alone) or >$300k (with spouse) for 2 years, OR NFA >$1M, OR Net Assets >$5M
   - Eligible: Income >$75k (alone) or >$125k (with spouse), OR Net Assets >$400k
   - Set is_accredited/is_eligible based on stated financials

5. **RISK TOLERANCE MAPPING**:
   - LOW: "can't lose money", "safety first", "need access to funds"
   - MODERATE: "some risk ok", "long-term", "don't need money soon"
   - HIGH: "maximize returns", "willing to lose", "aggressive growth"

6. **TIME HORIZON**: one of "1-3", "3-5", "6-10", "10+" ("retirement in X years" - calculate)

## OUTPUT FORMAT

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:

{
  "client_name": {"first": null, "middle": null, "last": null},
  "spouse_name": {"first": null, "last": null},
  "address": {"street": null, "unit": null, "city": null, "province": null, "postal_code": null},
  "contact": {"phone": null, "cell": null, "email": null},
  "personal": {"dob": "YYYY-MM-DD or null", "citizenship": null, "dependents": null, "marital_status": null},
  "employment": {"occupation": null, "employer": null, "years_employed": null, "is_self_employed": null},
  "spouse_employment": {"occupation": null, "employer": null},
  "financials": {"annual_income": null, "spouse_income": null, "other_income": null, "total_income": null, "net_financial_assets": null, "non_financial_assets": null, "total_assets": null, "liabilities": null, "net_worth": null, "income_stable_2_years": null, "borrowed_to_invest": null},
  "asset_composition": {"cash_pct": null, "stocks_pct": null, "bonds_pct": null, "real_estate_pct": null, "other_pct": null},
  "investment_profile": {"knowledge_level": "GOOD | AVERAGE | LIMITED | null", "risk_tolerance": "LOW | MODERATE | HIGH | null", "risk_capacity": "HIGH | MEDIUM | LOW | NIL | null", "time_horizon": "1-3 | 3-5 | 6-10 | 10+ | null", "investment_objective": "GROWTH | GROWTH_AND_INCOME | INCOME | TAX_EFFICIENCY | null", "planned_retirement_year": null, "products_owned": []},
  "exemption_status": {"is_accredited": null, "is_eligible": null, "accreditation_reason": null},
  "aml": {"is_pep": null, "pep_position": null, "is_hio": null},
  "investment_details": {"issuer": null, "amount": null, "source_of_funds": "NON_REGISTERED | RRSP | TFSA | BORROWED | OTHER | null"},
  "confidence_scores": {"client_name": "HIGH | MEDIUM | LOW", "financials": "HIGH | MEDIUM | LOW", "risk_profile": "HIGH | MEDIUM | LOW"},
  "missing_fields": [],
  "ambiguous_items": [],
  "follow_up_questions": []
}"#;

const QUICK_PROMPT: &str = r#"Extract ONLY the client's name from this transcript.
Return JSON with: {"first_name": "...", "last_name": "...", "missing_fields": [...]}
If name not found, use null. Transliterate from Russian/Ukrainian to English if needed.
Return ONLY valid JSON."#;

/// Reusable Claude client (connection-pooled)
pub struct ClaudeExtractor {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ClaudeExtractor {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| KycError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
        })
    }

    /// Override the endpoint, e.g. for a local stub.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn complete(
        &self,
        system: Option<&str>,
        user_message: String,
        max_tokens: u32,
    ) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(KycError::ConfigError(
                "ANTHROPIC_API_KEY not configured".to_string(),
            ));
        }

        let request = MessagesRequest {
            model: MODEL.to_string(),
            max_tokens,
            system: system.map(|s| s.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message,
            }],
        };

        info!(max_tokens, "Calling Claude API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Claude API request failed: {}", e);
                KycError::LlmError(format!("Claude API error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Claude API error response: {}", error_text);
            return Err(KycError::LlmError(format!(
                "Claude API error: {}",
                error_text
            )));
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Claude response envelope: {}", e);
            KycError::LlmError(format!("Claude parse error: {}", e))
        })?;

        let text = body
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| KycError::LlmError("Empty response from Claude".to_string()))?;

        Ok(text)
    }
}

#[async_trait]
impl super::Extractor for ClaudeExtractor {
    async fn extract(
        &self,
        transcript: &str,
        language_hint: &str,
        form_type: FormType,
    ) -> Result<ExtractedRecord> {
        let user_message = format!(
            "Extract KYC data from this transcript.\n\n\
             Source language hint: {}\n\
             Form type: {}\n\n\
             TRANSCRIPT:\n{}\n\n\
             Remember: Return ONLY valid JSON, no markdown formatting.",
            language_hint, form_type, transcript
        );

        let text = self
            .complete(Some(EXTRACTION_PROMPT), user_message, MAX_TOKENS_FULL)
            .await?;

        Ok(parse_record(&text))
    }

    async fn quick_extract(&self, transcript: &str) -> Result<QuickExtract> {
        let head: String = transcript.chars().take(QUICK_TRANSCRIPT_CHARS).collect();
        let user_message = format!("{}\n\nTRANSCRIPT:\n{}", QUICK_PROMPT, head);

        let text = self.complete(None, user_message, MAX_TOKENS_QUICK).await?;

        Ok(parse_quick(&text))
    }
}

/// Strip a potential markdown code fence from a model reply.
fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a full-extraction reply. Never fails: unparseable output becomes
/// a record carrying the extraction-failure marker.
fn parse_record(text: &str) -> ExtractedRecord {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<ExtractedRecord>(cleaned) {
        Ok(record) => record,
        Err(e) => {
            warn!("Extraction output was not valid JSON: {}", e);
            ExtractedRecord::extraction_failure(cleaned, e.to_string())
        }
    }
}

/// Parse a quick-extraction reply, falling back to a name-missing stub.
fn parse_quick(text: &str) -> QuickExtract {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).unwrap_or_else(|e| {
        warn!("Quick extraction output was not valid JSON: {}", e);
        QuickExtract {
            first_name: None,
            last_name: None,
            missing_fields: vec!["name".to_string()],
        }
    })
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: MODEL.to_string(),
            max_tokens: MAX_TOKENS_FULL,
            system: Some(EXTRACTION_PROMPT.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: "TRANSCRIPT: hello".to_string(),
            }],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("claude-sonnet-4"));
        assert!(json.contains("NEVER HALLUCINATE"));
    }

    #[test]
    fn test_parse_clean_json() {
        let record = parse_record(r#"{"financials": {"annual_income": 180000}}"#);
        assert!(record.error.is_none());
        assert_eq!(
            record.financials.unwrap().annual_income,
            Some(180000.0)
        );
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let reply = "```json\n{\"client_name\": {\"first\": \"Ivan\", \"last\": \"Petrenko\"}}\n```";
        let record = parse_record(reply);
        assert!(record.error.is_none());
        assert_eq!(record.client_full_name().as_deref(), Some("Ivan Petrenko"));

        let unlabeled = "```\n{\"missing_fields\": [\"address\"]}\n```";
        let record = parse_record(unlabeled);
        assert_eq!(record.missing_fields, vec!["address"]);
    }

    #[test]
    fn test_invalid_json_becomes_failure_marker() {
        let record = parse_record("I could not find any client data in this transcript.");
        let failure = record.error.expect("marker expected");
        assert_eq!(failure.message, "Failed to parse extraction");
        assert!(failure.raw_response.starts_with("I could not"));
        assert!(!failure.parse_error.is_empty());
    }

    #[test]
    fn test_failure_marker_truncates_raw_response() {
        let long = "x".repeat(2000);
        let record = parse_record(&long);
        assert_eq!(record.error.unwrap().raw_response.chars().count(), 500);
    }

    #[test]
    fn test_parse_quick_success_and_fallback() {
        let quick = parse_quick(r#"{"first_name": "Olena", "last_name": "Shevchenko", "missing_fields": []}"#);
        assert_eq!(quick.full_name().as_deref(), Some("Olena Shevchenko"));

        let fallback = parse_quick("no json here");
        assert!(fallback.first_name.is_none());
        assert_eq!(fallback.missing_fields, vec!["name"]);
    }

    #[test]
    fn test_quick_prompt_head_truncation() {
        let transcript = "а".repeat(5000);
        let head: String = transcript.chars().take(QUICK_TRANSCRIPT_CHARS).collect();
        assert_eq!(head.chars().count(), 1000);
    }
}
