use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::details::extract_contact_email;
use crate::extraction::pipeline::SkillScore;
use crate::extraction::{DocumentFormat, ExtractedSkill, ExtractionError};
use crate::state::AppState;
use crate::store::{cv_document_key, ProfileRecord, ProfileStatus};

const FILE_FIELD: &str = "file";

/// The `file` part of a multipart upload.
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

impl Upload {
    /// Extension first, then the part's declared content type.
    fn format(&self) -> Result<DocumentFormat, ExtractionError> {
        let by_name = self.filename.as_deref().map(DocumentFormat::from_filename);
        if let Some(Ok(format)) = by_name {
            return Ok(format);
        }
        if let Some(Ok(format)) = self.content_type.as_deref().map(DocumentFormat::from_mime) {
            return Ok(format);
        }
        Err(match by_name {
            Some(Err(err)) => err,
            _ => ExtractionError::UnsupportedFormat(
                self.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
        })
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(Upload {
            filename,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

#[derive(Serialize)]
pub struct UploadAccepted {
    pub message: String,
    pub status: ProfileStatus,
    pub document_key: String,
}

#[derive(Serialize)]
pub struct CvAnalysisResponse {
    pub email: Option<String>,
    pub skills: Vec<SkillScore>,
}

#[derive(Serialize)]
pub struct TaskAnalysisResponse {
    pub required_skills: Vec<String>,
    pub skills: Vec<SkillScore>,
}

fn scores(skills: &[ExtractedSkill]) -> Vec<SkillScore> {
    skills
        .iter()
        .map(|s| SkillScore {
            name: s.name.clone(),
            confidence: s.confidence,
        })
        .collect()
}

/// POST /api/v1/employees/:id/cv
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAccepted>), AppError> {
    if state.directory.employee(employee_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Employee {employee_id} not found")));
    }

    let upload = read_upload(multipart).await?;
    let format = match upload.format() {
        Ok(format) => format,
        Err(err) => {
            state.profiles.reject_upload(employee_id, &err.to_string()).await?;
            return Err(err.into());
        }
    };

    let key = cv_document_key(employee_id, Uuid::new_v4(), format.extension());
    state
        .documents
        .put_document(&key, upload.bytes.clone(), format.mime())
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    state.profiles.mark_processing(employee_id, &key).await?;

    info!("Queued CV {key} for employee {employee_id}");
    state
        .cv_processor
        .spawn(employee_id, key.clone(), upload.bytes, format);

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAccepted {
            message: "CV uploaded, skill extraction started".to_string(),
            status: ProfileStatus::Processing,
            document_key: key,
        }),
    ))
}

/// GET /api/v1/employees/:id/cv
pub async fn handle_cv_status(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<ProfileRecord>, AppError> {
    if let Some(record) = state.profiles.profile_record(employee_id).await? {
        return Ok(Json(record));
    }
    match state.directory.employee(employee_id).await? {
        Some(_) => Ok(Json(ProfileRecord::not_uploaded(employee_id))),
        None => Err(AppError::NotFound(format!("Employee {employee_id} not found"))),
    }
}

/// POST /api/v1/cv/analyze
///
/// Extracts skills and a contact email without storing anything; used to
/// pre-fill the new-employee form.
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CvAnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let format = upload.format()?;
    let analysis = state.cv_processor.analyze(upload.bytes, format).await?;

    Ok(Json(CvAnalysisResponse {
        email: extract_contact_email(&analysis.text),
        skills: scores(&analysis.skills),
    }))
}

/// POST /api/v1/tasks/analyze
pub async fn handle_analyze_task(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TaskAnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let format = upload.format()?;
    let analysis = state.cv_processor.analyze(upload.bytes, format).await?;

    Ok(Json(TaskAnalysisResponse {
        required_skills: analysis.skills.iter().map(|s| s.name.clone()).collect(),
        skills: scores(&analysis.skills),
    }))
}
