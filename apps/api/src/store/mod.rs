//! Persistence seams. The pipeline and handlers talk to these traits only;
//! `PgStore` + `S3DocumentStore` back them in production, `InMemoryStore`
//! in tests.

pub mod documents;
#[cfg(test)]
pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::{ExtractedSkill, SkillProfile};
use crate::matching::{Candidate, TaskPriority, WorkloadCalculator};

pub use documents::S3DocumentStore;
#[cfg(test)]
pub use memory::InMemoryStore;
pub use postgres::PgStore;

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    NotUploaded,
    Processing,
    Ready,
    Failed,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::NotUploaded => "NOT_UPLOADED",
            ProfileStatus::Processing => "PROCESSING",
            ProfileStatus::Ready => "READY",
            ProfileStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "PROCESSING" => ProfileStatus::Processing,
            "READY" => ProfileStatus::Ready,
            "FAILED" => ProfileStatus::Failed,
            _ => ProfileStatus::NotUploaded,
        }
    }
}

/// CV processing state plus the skills from the last successful extraction.
/// A `FAILED` record still carries those earlier skills.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub employee_id: Uuid,
    pub status: ProfileStatus,
    pub error_message: Option<String>,
    pub document_key: Option<String>,
    pub skills: Vec<ExtractedSkill>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    pub fn not_uploaded(employee_id: Uuid) -> Self {
        Self {
            employee_id,
            status: ProfileStatus::NotUploaded,
            error_message: None,
            document_key: None,
            skills: Vec::new(),
            uploaded_at: None,
            processed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub title: String,
    /// Raw skill names as stored by the task owner; canonicalized at match time.
    pub required_skills: Vec<String>,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRecord {
    pub employee_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub skills: Vec<ExtractedSkill>,
    pub active_assignments: u32,
}

impl EmployeeRecord {
    pub fn into_candidate(self, workload: &WorkloadCalculator) -> Candidate {
        Candidate {
            employee_id: self.employee_id,
            name: self.name,
            title: self.title,
            profile: SkillProfile::from_skills(self.employee_id, self.skills),
            workload: workload.snapshot(self.employee_id, f64::from(self.active_assignments)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

/// Result of a profile write tied to one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileWrite {
    Applied,
    /// A newer upload owns the record; the write was dropped.
    Superseded,
}

/// Per-employee skill profile and its processing status.
///
/// `commit_profile` replaces the skill set and flips the status to `READY`
/// as one step; readers see either the old profile or the new one. Writes
/// from a job only land while its `document_key` is still the employee's
/// current upload, so a slow job for an older CV cannot overwrite a newer one.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Makes `document_key` the current upload and sets `PROCESSING`.
    async fn mark_processing(&self, employee_id: Uuid, document_key: &str) -> Result<()>;

    async fn commit_profile(
        &self,
        profile: &SkillProfile,
        document_key: &str,
    ) -> Result<ProfileWrite>;

    /// Records the failure reason; previously stored skills are left alone.
    async fn mark_failed(
        &self,
        employee_id: Uuid,
        document_key: &str,
        reason: &str,
    ) -> Result<ProfileWrite>;

    /// Marks an upload refused before it was stored as `FAILED`. Clears the
    /// current upload, so jobs still running for an earlier one are dropped.
    async fn reject_upload(&self, employee_id: Uuid, reason: &str) -> Result<()>;

    async fn profile_record(&self, employee_id: Uuid) -> Result<Option<ProfileRecord>>;
}

/// Read side of the task/employee CRUD layer.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    async fn task(&self, task_id: Uuid) -> Result<Option<TaskRecord>>;

    /// Every employee, ordered by id.
    async fn employees(&self) -> Result<Vec<EmployeeRecord>>;

    async fn employee(&self, employee_id: Uuid) -> Result<Option<EmployeeRecord>>;
}

/// Blob storage for uploaded CVs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put_document(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;
}

/// Storage key for an uploaded CV: `cvs/<employee>/<upload>.<ext>`.
pub fn cv_document_key(employee_id: Uuid, upload_id: Uuid, extension: &str) -> String {
    format!("cvs/{employee_id}/{upload_id}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::SourceSection;

    #[test]
    fn test_profile_status_round_trip() {
        for status in [
            ProfileStatus::NotUploaded,
            ProfileStatus::Processing,
            ProfileStatus::Ready,
            ProfileStatus::Failed,
        ] {
            assert_eq!(ProfileStatus::parse(status.as_str()), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_employee_record_into_candidate() {
        let record = EmployeeRecord {
            employee_id: Uuid::from_u128(5),
            name: "Ada".to_string(),
            title: Some("Engineer".to_string()),
            skills: vec![ExtractedSkill {
                name: "Rust".to_string(),
                confidence: 0.8,
                source: SourceSection::SkillsSection,
            }],
            active_assignments: 3,
        };
        let calc = WorkloadCalculator::new(4.0).unwrap();
        let candidate = record.into_candidate(&calc);
        assert_eq!(candidate.workload.load_ratio, 0.75);
        assert_eq!(candidate.profile.confidence_of("rust"), Some(0.8));
    }

    #[test]
    fn test_cv_document_key_layout() {
        let key = cv_document_key(Uuid::nil(), Uuid::from_u128(1), "pdf");
        assert_eq!(
            key,
            "cvs/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000001.pdf"
        );
    }
}
