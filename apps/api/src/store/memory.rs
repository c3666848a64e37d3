use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::extraction::SkillProfile;
use crate::store::{
    CandidateDirectory, DocumentStore, EmployeeRecord, ProfileRecord, ProfileStatus, ProfileStore,
    ProfileWrite, TaskRecord,
};

#[derive(Debug, Clone)]
struct EmployeeEntry {
    name: String,
    title: Option<String>,
    active_assignments: u32,
}

/// Process-local store implementing every store trait.
///
/// Each profile write swaps the whole record under the write lock, so a
/// reader never sees a half-replaced skill set.
#[derive(Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<Uuid, ProfileRecord>>,
    employees: RwLock<HashMap<Uuid, EmployeeEntry>>,
    tasks: RwLock<HashMap<Uuid, TaskRecord>>,
    documents: RwLock<HashMap<String, (Bytes, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_employee(
        &self,
        employee_id: Uuid,
        name: &str,
        title: Option<&str>,
        active_assignments: u32,
    ) {
        self.employees.write().await.insert(
            employee_id,
            EmployeeEntry {
                name: name.to_string(),
                title: title.map(str::to_string),
                active_assignments,
            },
        );
    }

    pub async fn insert_task(&self, task: TaskRecord) {
        self.tasks.write().await.insert(task.task_id, task);
    }

    pub async fn document(&self, key: &str) -> Option<(Bytes, String)> {
        self.documents.read().await.get(key).cloned()
    }

    async fn employee_record(&self, employee_id: Uuid, entry: &EmployeeEntry) -> EmployeeRecord {
        let skills = self
            .profiles
            .read()
            .await
            .get(&employee_id)
            .map(|record| record.skills.clone())
            .unwrap_or_default();
        EmployeeRecord {
            employee_id,
            name: entry.name.clone(),
            title: entry.title.clone(),
            skills,
            active_assignments: entry.active_assignments,
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn mark_processing(&self, employee_id: Uuid, document_key: &str) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        let record = profiles
            .entry(employee_id)
            .or_insert_with(|| ProfileRecord::not_uploaded(employee_id));
        record.status = ProfileStatus::Processing;
        record.error_message = None;
        record.document_key = Some(document_key.to_string());
        record.uploaded_at = Some(Utc::now());
        record.processed_at = None;
        Ok(())
    }

    async fn commit_profile(
        &self,
        profile: &SkillProfile,
        document_key: &str,
    ) -> Result<ProfileWrite> {
        let mut profiles = self.profiles.write().await;
        let Some(current) = profiles
            .get(&profile.employee_id)
            .filter(|r| r.document_key.as_deref() == Some(document_key))
        else {
            return Ok(ProfileWrite::Superseded);
        };
        let record = ProfileRecord {
            employee_id: profile.employee_id,
            status: ProfileStatus::Ready,
            error_message: None,
            document_key: current.document_key.clone(),
            skills: profile.skills.clone(),
            uploaded_at: current.uploaded_at,
            processed_at: Some(Utc::now()),
        };
        profiles.insert(profile.employee_id, record);
        Ok(ProfileWrite::Applied)
    }

    async fn mark_failed(
        &self,
        employee_id: Uuid,
        document_key: &str,
        reason: &str,
    ) -> Result<ProfileWrite> {
        let mut profiles = self.profiles.write().await;
        match profiles
            .get_mut(&employee_id)
            .filter(|r| r.document_key.as_deref() == Some(document_key))
        {
            Some(record) => {
                record.status = ProfileStatus::Failed;
                record.error_message = Some(reason.to_string());
                record.processed_at = Some(Utc::now());
                Ok(ProfileWrite::Applied)
            }
            None => Ok(ProfileWrite::Superseded),
        }
    }

    async fn reject_upload(&self, employee_id: Uuid, reason: &str) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        let record = profiles
            .entry(employee_id)
            .or_insert_with(|| ProfileRecord::not_uploaded(employee_id));
        record.status = ProfileStatus::Failed;
        record.error_message = Some(reason.to_string());
        record.document_key = None;
        record.uploaded_at = Some(Utc::now());
        record.processed_at = record.uploaded_at;
        Ok(())
    }

    async fn profile_record(&self, employee_id: Uuid) -> Result<Option<ProfileRecord>> {
        Ok(self.profiles.read().await.get(&employee_id).cloned())
    }
}

#[async_trait]
impl CandidateDirectory for InMemoryStore {
    async fn task(&self, task_id: Uuid) -> Result<Option<TaskRecord>> {
        Ok(self.tasks.read().await.get(&task_id).cloned())
    }

    async fn employees(&self) -> Result<Vec<EmployeeRecord>> {
        let mut entries: Vec<(Uuid, EmployeeEntry)> = self
            .employees
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let mut records = Vec::with_capacity(entries.len());
        for (id, entry) in &entries {
            records.push(self.employee_record(*id, entry).await);
        }
        Ok(records)
    }

    async fn employee(&self, employee_id: Uuid) -> Result<Option<EmployeeRecord>> {
        let entry = self.employees.read().await.get(&employee_id).cloned();
        match entry {
            Some(entry) => Ok(Some(self.employee_record(employee_id, &entry).await)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn put_document(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractedSkill, SourceSection};
    use crate::matching::TaskPriority;

    fn skill(name: &str, confidence: f64) -> ExtractedSkill {
        ExtractedSkill {
            name: name.to_string(),
            confidence,
            source: SourceSection::BodyText,
        }
    }

    /// Uploads `key` and commits its extracted skills.
    async fn commit(store: &InMemoryStore, id: Uuid, key: &str, skills: Vec<ExtractedSkill>) {
        store.mark_processing(id, key).await.unwrap();
        let write = store
            .commit_profile(&SkillProfile::from_skills(id, skills), key)
            .await
            .unwrap();
        assert_eq!(write, ProfileWrite::Applied);
    }

    #[tokio::test]
    async fn test_commit_replaces_previous_skills() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(1);

        commit(&store, id, "cvs/1/a.pdf", vec![skill("Python", 0.8)]).await;
        commit(&store, id, "cvs/1/b.pdf", vec![skill("Rust", 0.5)]).await;

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Ready);
        assert_eq!(record.skills, vec![skill("Rust", 0.5)]);
        assert_eq!(record.document_key.as_deref(), Some("cvs/1/b.pdf"));
    }

    #[tokio::test]
    async fn test_older_upload_finishing_last_is_dropped() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(1);
        store.mark_processing(id, "cvs/1/old.pdf").await.unwrap();
        store.mark_processing(id, "cvs/1/new.pdf").await.unwrap();

        let newer = store
            .commit_profile(&SkillProfile::from_skills(id, vec![skill("Rust", 0.8)]), "cvs/1/new.pdf")
            .await
            .unwrap();
        let older = store
            .commit_profile(&SkillProfile::from_skills(id, vec![skill("Cobol", 0.9)]), "cvs/1/old.pdf")
            .await
            .unwrap();
        assert_eq!(newer, ProfileWrite::Applied);
        assert_eq!(older, ProfileWrite::Superseded);

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Ready);
        assert_eq!(record.document_key.as_deref(), Some("cvs/1/new.pdf"));
        assert_eq!(record.skills, vec![skill("Rust", 0.8)]);
    }

    #[tokio::test]
    async fn test_older_upload_cannot_settle_newer_one() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(4);
        store.mark_processing(id, "cvs/4/old.pdf").await.unwrap();
        store.mark_processing(id, "cvs/4/new.pdf").await.unwrap();

        let committed = store
            .commit_profile(&SkillProfile::from_skills(id, vec![skill("Go", 0.5)]), "cvs/4/old.pdf")
            .await
            .unwrap();
        let failed = store.mark_failed(id, "cvs/4/old.pdf", "boom").await.unwrap();
        assert_eq!(committed, ProfileWrite::Superseded);
        assert_eq!(failed, ProfileWrite::Superseded);

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Processing);
        assert!(record.skills.is_empty());
        assert_eq!(record.error_message, None);
    }

    #[tokio::test]
    async fn test_rejected_upload_supersedes_running_job() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(5);
        commit(&store, id, "cvs/5/a.pdf", vec![skill("SQL", 0.6)]).await;
        store.mark_processing(id, "cvs/5/b.pdf").await.unwrap();
        store
            .reject_upload(id, "Unsupported document format: cv.txt")
            .await
            .unwrap();

        let late = store
            .commit_profile(&SkillProfile::from_skills(id, vec![skill("Go", 0.5)]), "cvs/5/b.pdf")
            .await
            .unwrap();
        assert_eq!(late, ProfileWrite::Superseded);

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Failed);
        assert_eq!(record.document_key, None);
        assert_eq!(record.skills, vec![skill("SQL", 0.6)]);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_skills() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(2);

        commit(&store, id, "cvs/2/a.docx", vec![skill("SQL", 0.6)]).await;
        store.mark_processing(id, "cvs/2/b.docx").await.unwrap();
        store
            .mark_failed(id, "cvs/2/b.docx", "Document contains no extractable text")
            .await
            .unwrap();

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Failed);
        assert_eq!(
            record.error_message.as_deref(),
            Some("Document contains no extractable text")
        );
        assert_eq!(record.skills, vec![skill("SQL", 0.6)]);
    }

    #[tokio::test]
    async fn test_processing_clears_previous_error() {
        let store = InMemoryStore::new();
        let id = Uuid::from_u128(3);
        store.reject_upload(id, "boom").await.unwrap();
        store.mark_processing(id, "cvs/3/c.pdf").await.unwrap();

        let record = store.profile_record(id).await.unwrap().unwrap();
        assert_eq!(record.status, ProfileStatus::Processing);
        assert_eq!(record.error_message, None);
    }

    #[tokio::test]
    async fn test_unknown_employee_has_no_record() {
        let store = InMemoryStore::new();
        assert!(store
            .profile_record(Uuid::from_u128(9))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_employees_sorted_and_joined_with_skills() {
        let store = InMemoryStore::new();
        let (a, b) = (Uuid::from_u128(20), Uuid::from_u128(10));
        store.insert_employee(a, "Ada", None, 2).await;
        store.insert_employee(b, "Bob", Some("Analyst"), 0).await;
        commit(&store, a, "cvs/20/cv.pdf", vec![skill("Go", 0.7)]).await;

        let employees = store.employees().await.unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].employee_id, b);
        assert!(employees[0].skills.is_empty());
        assert_eq!(employees[1].skills, vec![skill("Go", 0.7)]);
        assert_eq!(employees[1].active_assignments, 2);

        assert!(store.employee(Uuid::from_u128(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_and_document_round_trip() {
        let store = InMemoryStore::new();
        let task_id = Uuid::from_u128(7);
        store
            .insert_task(TaskRecord {
                task_id,
                title: "Migrate reports".to_string(),
                required_skills: vec!["SQL".to_string()],
                priority: TaskPriority::High,
            })
            .await;
        assert_eq!(
            store.task(task_id).await.unwrap().unwrap().priority,
            TaskPriority::High
        );

        store
            .put_document("cvs/x.pdf", Bytes::from_static(b"%PDF-"), "application/pdf")
            .await
            .unwrap();
        let (bytes, content_type) = store.document("cvs/x.pdf").await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-");
        assert_eq!(content_type, "application/pdf");
    }
}
