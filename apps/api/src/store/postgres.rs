use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::extraction::{ExtractedSkill, SkillProfile, SourceSection};
use crate::matching::{AssignmentStatus, TaskPriority};
use crate::models::employee::{CandidateRow, CvDocumentRow, EmployeeSkillRow};
use crate::models::task::TaskRow;
use crate::store::{
    CandidateDirectory, EmployeeRecord, ProfileRecord, ProfileStatus, ProfileStore, ProfileWrite,
    TaskRecord,
};

/// PostgreSQL-backed profile store and candidate directory.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn skills_for(&self, employee_id: Uuid) -> Result<Vec<ExtractedSkill>> {
        let rows = sqlx::query_as::<_, EmployeeSkillRow>(
            r#"
            SELECT employee_id, name, confidence, source_section
            FROM employee_skills
            WHERE employee_id = $1
            ORDER BY confidence DESC, name ASC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ExtractedSkill::from).collect())
    }
}

impl From<EmployeeSkillRow> for ExtractedSkill {
    fn from(row: EmployeeSkillRow) -> Self {
        ExtractedSkill {
            name: row.name,
            confidence: row.confidence,
            source: SourceSection::parse(&row.source_section),
        }
    }
}

fn active_statuses() -> Vec<String> {
    AssignmentStatus::ACTIVE
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

fn employee_record(row: CandidateRow, skills: Vec<ExtractedSkill>) -> EmployeeRecord {
    EmployeeRecord {
        employee_id: row.id,
        name: row.name,
        title: row.title,
        skills,
        active_assignments: u32::try_from(row.active_assignments).unwrap_or(u32::MAX),
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn mark_processing(&self, employee_id: Uuid, document_key: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cv_documents (employee_id, status, document_key, uploaded_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (employee_id) DO UPDATE
            SET status = EXCLUDED.status,
                document_key = EXCLUDED.document_key,
                error_message = NULL,
                uploaded_at = now(),
                processed_at = NULL
            "#,
        )
        .bind(employee_id)
        .bind(ProfileStatus::Processing.as_str())
        .bind(document_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces the skill set and sets `READY` in one transaction. The
    /// `cv_documents` row stays locked from the key check to the commit, so a
    /// concurrent `mark_processing` waits for it.
    async fn commit_profile(
        &self,
        profile: &SkillProfile,
        document_key: &str,
    ) -> Result<ProfileWrite> {
        let employee_id = profile.employee_id;
        let mut tx = self.pool.begin().await?;

        let current: Option<Option<String>> = sqlx::query_scalar(
            "SELECT document_key FROM cv_documents WHERE employee_id = $1 FOR UPDATE",
        )
        .bind(employee_id)
        .fetch_optional(&mut *tx)
        .await?;
        if current.flatten().as_deref() != Some(document_key) {
            tx.rollback().await?;
            info!("Dropped extraction result for superseded upload {document_key}");
            return Ok(ProfileWrite::Superseded);
        }

        sqlx::query("DELETE FROM employee_skills WHERE employee_id = $1")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        for skill in &profile.skills {
            sqlx::query(
                r#"
                INSERT INTO employee_skills (employee_id, name, confidence, source_section)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(employee_id)
            .bind(&skill.name)
            .bind(skill.confidence)
            .bind(skill.source.as_str())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE cv_documents
            SET status = $2, error_message = NULL, processed_at = now()
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id)
        .bind(ProfileStatus::Ready.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Committed {} skills for employee {employee_id}",
            profile.skills.len()
        );
        Ok(ProfileWrite::Applied)
    }

    async fn mark_failed(
        &self,
        employee_id: Uuid,
        document_key: &str,
        reason: &str,
    ) -> Result<ProfileWrite> {
        let result = sqlx::query(
            r#"
            UPDATE cv_documents
            SET status = $2, error_message = $3, processed_at = now()
            WHERE employee_id = $1 AND document_key = $4
            "#,
        )
        .bind(employee_id)
        .bind(ProfileStatus::Failed.as_str())
        .bind(reason)
        .bind(document_key)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            ProfileWrite::Superseded
        } else {
            ProfileWrite::Applied
        })
    }

    async fn reject_upload(&self, employee_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cv_documents
                (employee_id, status, document_key, error_message, uploaded_at, processed_at)
            VALUES ($1, $2, NULL, $3, now(), now())
            ON CONFLICT (employee_id) DO UPDATE
            SET status = EXCLUDED.status,
                document_key = NULL,
                error_message = EXCLUDED.error_message,
                uploaded_at = now(),
                processed_at = now()
            "#,
        )
        .bind(employee_id)
        .bind(ProfileStatus::Failed.as_str())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn profile_record(&self, employee_id: Uuid) -> Result<Option<ProfileRecord>> {
        let row: Option<CvDocumentRow> = sqlx::query_as(
            r#"
            SELECT employee_id, status, document_key, error_message, uploaded_at, processed_at
            FROM cv_documents
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let skills = self.skills_for(employee_id).await?;

        Ok(Some(ProfileRecord {
            employee_id,
            status: ProfileStatus::parse(&row.status),
            error_message: row.error_message,
            document_key: row.document_key,
            skills,
            uploaded_at: Some(row.uploaded_at),
            processed_at: row.processed_at,
        }))
    }
}

#[async_trait]
impl CandidateDirectory for PgStore {
    async fn task(&self, task_id: Uuid) -> Result<Option<TaskRecord>> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, title, priority, status, created_at FROM tasks WHERE id = $1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let required_skills: Vec<String> = sqlx::query_scalar(
            "SELECT skill_name FROM task_skills WHERE task_id = $1 ORDER BY position, skill_name",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TaskRecord {
            task_id: row.id,
            title: row.title,
            required_skills,
            priority: TaskPriority::parse(&row.priority),
        }))
    }

    async fn employees(&self) -> Result<Vec<EmployeeRecord>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT e.id, e.name, e.title,
                   COUNT(a.task_id) FILTER (WHERE a.status = ANY($1)) AS active_assignments
            FROM employees e
            LEFT JOIN task_assignments a ON a.employee_id = e.id
            GROUP BY e.id, e.name, e.title
            ORDER BY e.id
            "#,
        )
        .bind(active_statuses())
        .fetch_all(&self.pool)
        .await?;

        let skill_rows = sqlx::query_as::<_, EmployeeSkillRow>(
            "SELECT employee_id, name, confidence, source_section FROM employee_skills",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut skills_by_employee: HashMap<Uuid, Vec<ExtractedSkill>> = HashMap::new();
        for row in skill_rows {
            skills_by_employee
                .entry(row.employee_id)
                .or_default()
                .push(ExtractedSkill::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let skills = skills_by_employee.remove(&row.id).unwrap_or_default();
                employee_record(row, skills)
            })
            .collect())
    }

    async fn employee(&self, employee_id: Uuid) -> Result<Option<EmployeeRecord>> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT e.id, e.name, e.title,
                   COUNT(a.task_id) FILTER (WHERE a.status = ANY($1)) AS active_assignments
            FROM employees e
            LEFT JOIN task_assignments a ON a.employee_id = e.id
            WHERE e.id = $2
            GROUP BY e.id, e.name, e.title
            "#,
        )
        .bind(active_statuses())
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let skills = self.skills_for(employee_id).await?;
                Ok(Some(employee_record(row, skills)))
            }
            None => Ok(None),
        }
    }
}
