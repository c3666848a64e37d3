//! CV pipeline: document bytes to a committed skill profile.
//!
//! `analyze_document` is the pure part. `CvProcessor` runs it on the blocking
//! pool under a timeout and records the outcome: `READY` with the new skills,
//! or `FAILED` with a reason while the previous skills stay in place. Failures
//! are terminal; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::extraction::text::{extract_text, DocumentFormat};
use crate::extraction::{ExtractedSkill, ExtractionError, SkillExtractor, SkillProfile};
use crate::store::{ProfileStatus, ProfileStore, ProfileWrite};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    pub text: String,
    pub skills: Vec<ExtractedSkill>,
}

/// Text Extractor followed by Skill Extractor. Synchronous and CPU-bound.
pub fn analyze_document(
    bytes: &[u8],
    format: DocumentFormat,
    extractor: &SkillExtractor,
) -> Result<DocumentAnalysis, ExtractionError> {
    let text = extract_text(bytes, format)?;
    let skills = extractor.extract(&text)?;
    Ok(DocumentAnalysis { text, skills })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillScore {
    pub name: String,
    pub confidence: f64,
}

/// What the pipeline hands to persistence: status, `{name, confidence}`
/// pairs and an optional reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub employee_id: Uuid,
    pub status: ProfileStatus,
    pub skills: Vec<SkillScore>,
    pub error_message: Option<String>,
    /// A newer upload replaced this one before it finished; nothing was stored.
    pub superseded: bool,
}

#[derive(Clone)]
pub struct CvProcessor {
    extractor: SkillExtractor,
    profiles: Arc<dyn ProfileStore>,
    timeout: Duration,
}

impl CvProcessor {
    pub fn new(extractor: SkillExtractor, profiles: Arc<dyn ProfileStore>, timeout: Duration) -> Self {
        Self {
            extractor,
            profiles,
            timeout,
        }
    }

    /// `analyze_document` on the blocking pool, bounded by the timeout.
    pub async fn analyze(
        &self,
        bytes: Bytes,
        format: DocumentFormat,
    ) -> Result<DocumentAnalysis, ExtractionError> {
        let extractor = self.extractor.clone();
        let job = tokio::task::spawn_blocking(move || analyze_document(&bytes, format, &extractor));

        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                error!("Extraction worker aborted: {join_err}");
                Err(ExtractionError::CorruptDocument(
                    "extraction aborted on malformed input".to_string(),
                ))
            }
            Err(_) => Err(ExtractionError::ExtractionTimeout {
                limit_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Runs extraction for the upload stored under `document_key` and
    /// records the result against it.
    ///
    /// Extraction failures become a `FAILED` outcome, not an `Err`; only a
    /// store failure is returned as an error. When a newer upload took over
    /// while this one ran, nothing is recorded and the outcome is
    /// `superseded`.
    pub async fn process(
        &self,
        employee_id: Uuid,
        document_key: &str,
        bytes: Bytes,
        format: DocumentFormat,
    ) -> anyhow::Result<ExtractionOutcome> {
        info!(
            "CV extraction started for employee {employee_id} ({document_key}, {:?}, {} bytes)",
            format,
            bytes.len()
        );

        let result = self.analyze(bytes, format).await;

        match result {
            Ok(analysis) => {
                let profile = SkillProfile::from_skills(employee_id, analysis.skills);
                let write = match self.profiles.commit_profile(&profile, document_key).await {
                    Ok(write) => write,
                    Err(err) => {
                        let reason = format!("Extracted skills could not be saved: {err}");
                        if let Err(mark_err) = self
                            .profiles
                            .mark_failed(employee_id, document_key, &reason)
                            .await
                        {
                            error!("Could not mark {document_key} as failed: {mark_err:?}");
                        }
                        return Err(err);
                    }
                };
                info!(
                    "CV extraction for employee {employee_id} found {} skills",
                    profile.skills.len()
                );
                Ok(ExtractionOutcome {
                    employee_id,
                    status: ProfileStatus::Ready,
                    skills: profile
                        .skills
                        .iter()
                        .map(|s| SkillScore {
                            name: s.name.clone(),
                            confidence: s.confidence,
                        })
                        .collect(),
                    error_message: None,
                    superseded: write == ProfileWrite::Superseded,
                })
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("CV extraction for employee {employee_id} failed: {reason}");
                let write = self
                    .profiles
                    .mark_failed(employee_id, document_key, &reason)
                    .await?;
                Ok(ExtractionOutcome {
                    employee_id,
                    status: ProfileStatus::Failed,
                    skills: Vec::new(),
                    error_message: Some(reason),
                    superseded: write == ProfileWrite::Superseded,
                })
            }
        }
    }

    /// Runs `process` as a detached task so the upload request can return.
    pub fn spawn(
        &self,
        employee_id: Uuid,
        document_key: String,
        bytes: Bytes,
        format: DocumentFormat,
    ) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move {
            match processor
                .process(employee_id, &document_key, bytes, format)
                .await
            {
                Ok(outcome) if outcome.superseded => {
                    info!("Upload {document_key} was superseded by a newer CV; result dropped")
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Could not record CV outcome for employee {employee_id}: {e:?}")
                }
            }
        })
    }
}
