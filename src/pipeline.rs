//! Pipeline controller
//!
//! Runs the four stages of a KYC extraction: Extract, Validate, Generate,
//! Notify. The webhook spawns runs as detached tokio tasks tracked in the
//! job log; the sync endpoint runs the first two stages inline.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::documents::DocumentGenerator;
use crate::error::KycError;
use crate::extractor::Extractor;
use crate::jobs::JobLog;
use crate::models::{ExtractedRecord, FormType, ValidationReport};
use crate::notifier::Notifier;
use crate::validation::Validator;
use crate::Result;

/// One unit of work for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub transcript: String,
    pub language: String,
    pub form_type: FormType,
    pub dealing_rep: String,
    pub client_id: Option<String>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub record: ExtractedRecord,
    pub report: ValidationReport,
    pub document: Option<PathBuf>,
    pub notified: bool,
}

/// A stage failure, tagged with the stage that raised it for the job log.
#[derive(Debug)]
pub struct StageError {
    pub stage: &'static str,
    pub error: KycError,
}

impl StageError {
    fn new(stage: &'static str, error: KycError) -> Self {
        Self { stage, error }
    }
}

pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    validator: Validator,
    documents: Arc<dyn DocumentGenerator>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
    jobs: JobLog,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        documents: Arc<dyn DocumentGenerator>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            validator: Validator,
            documents,
            notifier,
            config,
            jobs: JobLog::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    pub fn jobs(&self) -> &JobLog {
        &self.jobs
    }

    /// Extract and validate, without document or notification stages.
    /// Serves the synchronous endpoint.
    pub async fn extract_and_validate(
        &self,
        transcript: &str,
        language: &str,
        form_type: FormType,
    ) -> Result<(ExtractedRecord, ValidationReport)> {
        let record = self
            .extractor
            .extract(transcript, language, form_type)
            .await?;

        if let Some(failure) = &record.error {
            return Err(KycError::ExtractionError(failure.message.clone()));
        }

        let outcome = self.validator.validate(&record, form_type);
        let record = record.with_exemption(&outcome.exemption);

        Ok((record, outcome.report))
    }

    /// Run all four stages. Notification failures are swallowed (reported
    /// in the outcome); every other stage failure aborts the run.
    pub async fn run(&self, job: &PipelineJob) -> std::result::Result<PipelineOutcome, StageError> {
        info!(
            form_type = %job.form_type,
            client_id = ?job.client_id,
            "Extracting KYC data"
        );
        let record = self
            .extractor
            .extract(&job.transcript, &job.language, job.form_type)
            .await
            .map_err(|e| StageError::new("extract", e))?;

        if let Some(failure) = &record.error {
            warn!(parse_error = %failure.parse_error, "Extractor returned unparseable output");
            return Err(StageError::new(
                "extract",
                KycError::ExtractionError(failure.message.clone()),
            ));
        }

        info!("Validating extracted data");
        let outcome = self.validator.validate(&record, job.form_type);
        let record = record.with_exemption(&outcome.exemption);
        let report = outcome.report;

        info!("Drafting document");
        let document = self
            .documents
            .fill(&record, job.form_type, &job.dealing_rep)
            .map_err(|e| StageError::new("document", e))?;

        info!("Sending notification");
        let notified = self
            .notifier
            .notify(&record, &report, Some(&document), job.form_type)
            .await;
        if !notified {
            warn!("Notification failed, continuing");
        }

        info!(
            client = record.client_full_name().as_deref().unwrap_or("Unknown"),
            is_valid = report.is_valid,
            "KYC processing complete"
        );

        Ok(PipelineOutcome {
            record,
            report,
            document: Some(document),
            notified,
        })
    }

    /// Queue a detached run. Returns immediately with the job ID; the
    /// terminal state lands in the job log and the log stream.
    pub async fn spawn(self: &Arc<Self>, job: PipelineJob, client_hint: Option<String>) -> Uuid {
        let job_id = self.jobs.queued(job.form_type, client_hint).await;
        let pipeline = Arc::clone(self);

        tokio::spawn(async move {
            match pipeline.run(&job).await {
                Ok(outcome) => {
                    pipeline.jobs.completed(job_id).await;
                    info!(
                        %job_id,
                        notified = outcome.notified,
                        "Job completed"
                    );
                }
                Err(stage_error) => {
                    let message = stage_error.error.to_string();
                    error!(
                        %job_id,
                        stage = stage_error.stage,
                        "Job failed: {}",
                        message
                    );
                    pipeline
                        .jobs
                        .failed(job_id, stage_error.stage, message)
                        .await;
                }
            }
        });

        job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MockExtractor;
    use crate::jobs::JobState;
    use crate::models::{ExtractionFailure, QuickExtract};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct StubDocuments;

    impl DocumentGenerator for StubDocuments {
        fn fill(
            &self,
            _record: &ExtractedRecord,
            form_type: FormType,
            _dealing_rep: &str,
        ) -> Result<PathBuf> {
            if form_type == FormType::Unknown {
                return Err(KycError::UnknownFormType(form_type.to_string()));
            }
            Ok(PathBuf::from("/tmp/draft.json"))
        }
    }

    struct RecordingNotifier {
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            _record: &ExtractedRecord,
            _report: &ValidationReport,
            _document: Option<&Path>,
            _form_type: FormType,
        ) -> bool {
            self.called.store(true, Ordering::SeqCst);
            true
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl Extractor for FailingExtractor {
        async fn extract(
            &self,
            _transcript: &str,
            _language_hint: &str,
            _form_type: FormType,
        ) -> Result<ExtractedRecord> {
            Ok(ExtractedRecord {
                error: Some(ExtractionFailure {
                    message: "Failed to parse extraction".to_string(),
                    raw_response: "gibberish".to_string(),
                    parse_error: "expected value".to_string(),
                }),
                ..Default::default()
            })
        }

        async fn quick_extract(&self, _transcript: &str) -> Result<QuickExtract> {
            Ok(QuickExtract::default())
        }
    }

    fn pipeline_with(
        extractor: Arc<dyn Extractor>,
        called: Arc<AtomicBool>,
    ) -> Arc<Pipeline> {
        Arc::new(Pipeline::new(
            extractor,
            Arc::new(StubDocuments),
            Arc::new(RecordingNotifier { called }),
            PipelineConfig::default(),
        ))
    }

    fn job(form_type: FormType) -> PipelineJob {
        PipelineJob {
            transcript: "Client call transcript with enough content.".to_string(),
            language: "auto".to_string(),
            form_type,
            dealing_rep: "Rep".to_string(),
            client_id: None,
        }
    }

    #[tokio::test]
    async fn test_run_all_stages() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(MockExtractor), Arc::clone(&called));

        let outcome = pipeline.run(&job(FormType::Individual)).await.unwrap();

        assert!(outcome.notified);
        assert!(called.load(Ordering::SeqCst));
        assert_eq!(
            outcome.record.client_full_name().as_deref(),
            Some("Test Client")
        );
        assert_eq!(outcome.document, Some(PathBuf::from("/tmp/draft.json")));
    }

    #[tokio::test]
    async fn test_run_aborts_on_extraction_marker() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(FailingExtractor), Arc::clone(&called));

        let err = pipeline.run(&job(FormType::Individual)).await.unwrap_err();

        assert_eq!(err.stage, "extract");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unknown_form_fails_at_document_stage() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(MockExtractor), Arc::clone(&called));

        let err = pipeline.run(&job(FormType::Unknown)).await.unwrap_err();

        assert_eq!(err.stage, "document");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spawn_records_terminal_state() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(MockExtractor), called);

        let job_id = pipeline
            .spawn(job(FormType::Individual), Some("Test Client".to_string()))
            .await;

        // Detached task; poll until terminal.
        let mut state = JobState::Queued;
        for _ in 0..50 {
            if let Some(record) = pipeline.jobs().get(job_id).await {
                state = record.state;
                if state != JobState::Queued {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state, JobState::Completed);
    }

    #[tokio::test]
    async fn test_spawn_records_failure_with_stage() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(FailingExtractor), called);

        let job_id = pipeline.spawn(job(FormType::Individual), None).await;

        let mut state = JobState::Queued;
        for _ in 0..50 {
            if let Some(record) = pipeline.jobs().get(job_id).await {
                state = record.state;
                if state != JobState::Queued {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        match state {
            JobState::Failed { stage, .. } => assert_eq!(stage, "extract"),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extract_and_validate_merges_exemption() {
        let called = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline_with(Arc::new(MockExtractor), called);

        let (record, report) = pipeline
            .extract_and_validate("transcript", "auto", FormType::Individual)
            .await
            .unwrap();

        // The classifier's conclusion is merged into the record view:
        // 180k stable income qualifies as eligible, not accredited.
        let exemption = record.exemption_status.unwrap();
        assert_eq!(exemption.is_accredited, Some(false));
        assert_eq!(exemption.is_eligible, Some(true));
        assert!(report.is_valid);
        assert!(report.missing_required.is_empty());
    }
}
