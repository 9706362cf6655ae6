//! Application configuration
//!
//! All configuration comes from the environment (plus `.env` via dotenv in
//! the binary). The config is built once at startup and passed into the
//! components explicitly.

use std::env;
use std::path::PathBuf;

use crate::error::KycError;
use crate::models::FormType;
use crate::Result;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub anthropic_api_key: String,
    pub resend_api_key: String,
    pub notification_email: String,
    pub from_email: String,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    pub port: u16,
    pub pipeline: PipelineConfig,
}

/// Per-run defaults the pipeline applies when a request omits them.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub default_representative: String,
    pub default_form_type: FormType,
    pub default_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_representative: "Andrii Andriushchenko".to_string(),
            default_form_type: FormType::Individual,
            default_language: "auto".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let resend_api_key = env::var("RESEND_API_KEY").unwrap_or_default();

        let notification_email =
            env::var("NOTIFICATION_EMAIL").unwrap_or_else(|_| "andrii@example.com".to_string());
        let from_email = env::var("FROM_EMAIL").unwrap_or_else(|_| "kyc@yourdomain.com".to_string());

        let templates_dir =
            PathBuf::from(env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()));
        let output_dir =
            PathBuf::from(env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()));

        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| KycError::ConfigError(format!("Invalid port: {}", e)))?;

        let pipeline = PipelineConfig {
            default_representative: env::var("DEALING_REP")
                .unwrap_or_else(|_| "Andrii Andriushchenko".to_string()),
            default_form_type: env::var("DEFAULT_FORM_TYPE")
                .map(|s| FormType::parse(&s))
                .unwrap_or(FormType::Individual),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "auto".to_string()),
        };

        Ok(Self {
            anthropic_api_key,
            resend_api_key,
            notification_email,
            from_email,
            templates_dir,
            output_dir,
            port,
            pipeline,
        })
    }
}
