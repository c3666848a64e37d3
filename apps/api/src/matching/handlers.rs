use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{ExtractedSkill, SkillProfile, SourceSection};
use crate::matching::engine::ScoreBreakdown;
use crate::matching::{
    Candidate, MatchFilter, MatchView, TaskPriority, TaskRequirement, WorkloadSnapshot,
};
use crate::state::AppState;
use crate::store::TaskRecord;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub limit: Option<usize>,
    pub min_score: Option<u32>,
}

#[derive(Serialize)]
pub struct WorkloadResponse {
    #[serde(flatten)]
    pub snapshot: WorkloadSnapshot,
    pub percentage: f64,
    pub overloaded: bool,
}

#[derive(Serialize)]
pub struct MatchDetail {
    pub task_id: Uuid,
    #[serde(flatten)]
    pub view: MatchView,
    pub breakdown: ScoreBreakdown,
}

fn requirement(state: &AppState, task: TaskRecord) -> TaskRequirement {
    TaskRequirement::new(
        task.task_id,
        &task.required_skills,
        task.priority,
        &state.taxonomy,
    )
}

async fn load_task(state: &AppState, task_id: Uuid) -> Result<TaskRequirement, AppError> {
    let task = state
        .directory
        .task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))?;
    Ok(requirement(state, task))
}

/// Candidates must have distinct ids.
fn rank_views(
    state: &AppState,
    task: &TaskRequirement,
    candidates: &[Candidate],
    filter: MatchFilter,
) -> Vec<MatchView> {
    let by_id: HashMap<Uuid, &Candidate> =
        candidates.iter().map(|c| (c.employee_id, c)).collect();
    filter
        .apply(state.matcher.rank(task, candidates))
        .into_iter()
        .filter_map(|result| {
            let candidate = by_id.get(&result.employee_id)?;
            Some(MatchView::new(result, candidate))
        })
        .collect()
}

/// GET /api/v1/employees/:id/workload
pub async fn handle_workload(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<WorkloadResponse>, AppError> {
    let employee = state
        .directory
        .employee(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))?;

    let snapshot = state
        .workload
        .snapshot(employee_id, f64::from(employee.active_assignments));
    Ok(Json(WorkloadResponse {
        percentage: snapshot.percentage(),
        overloaded: snapshot.is_overloaded(),
        snapshot,
    }))
}

/// GET /api/v1/tasks/:id/matches
pub async fn handle_task_matches(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<MatchView>>, AppError> {
    let task = load_task(&state, task_id).await?;
    let candidates: Vec<Candidate> = state
        .directory
        .employees()
        .await?
        .into_iter()
        .map(|e| e.into_candidate(&state.workload))
        .collect();

    let filter = MatchFilter {
        limit: Some(query.limit.unwrap_or(state.config.match_default_limit)),
        min_score: query.min_score,
    };
    Ok(Json(rank_views(&state, &task, &candidates, filter)))
}

/// GET /api/v1/tasks/:id/matches/:employee_id
pub async fn handle_task_match(
    State(state): State<AppState>,
    Path((task_id, employee_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchDetail>, AppError> {
    let task = load_task(&state, task_id).await?;
    let candidate = state
        .directory
        .employee(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))?
        .into_candidate(&state.workload);

    let result = state.matcher.score(&task, &candidate);
    let breakdown = result.breakdown;
    Ok(Json(MatchDetail {
        task_id,
        view: MatchView::new(result, &candidate),
        breakdown,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless matching
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InlineTask {
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
pub struct InlineSkill {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
pub struct InlineCandidate {
    pub employee_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub skills: Vec<InlineSkill>,
    /// Active task count (or hours).
    #[serde(default)]
    pub active_load: f64,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub task: InlineTask,
    #[serde(default)]
    pub candidates: Vec<InlineCandidate>,
    pub limit: Option<usize>,
    pub min_score: Option<u32>,
}

impl InlineCandidate {
    fn into_candidate(self, state: &AppState) -> Result<Candidate, AppError> {
        if let Some(bad) = self
            .skills
            .iter()
            .find(|s| !(0.0..=1.0).contains(&s.confidence))
        {
            return Err(AppError::Validation(format!(
                "Confidence for '{}' must be between 0 and 1",
                bad.name
            )));
        }
        if !self.active_load.is_finite() || self.active_load < 0.0 {
            return Err(AppError::Validation(format!(
                "active_load for employee {} must be a non-negative number",
                self.employee_id
            )));
        }

        let taxonomy = &state.taxonomy;
        let skills = self.skills.into_iter().map(|s| ExtractedSkill {
            name: taxonomy.canonicalize(&s.name),
            confidence: s.confidence,
            source: SourceSection::BodyText,
        });
        Ok(Candidate {
            employee_id: self.employee_id,
            name: self.name,
            title: self.title,
            profile: SkillProfile::from_skills(self.employee_id, skills),
            workload: state.workload.snapshot(self.employee_id, self.active_load),
        })
    }
}

/// POST /api/v1/matches
///
/// Ranks an inline task against inline candidates; nothing is read from or
/// written to the stores.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<Vec<MatchView>>, AppError> {
    let task = TaskRequirement::new(
        req.task.task_id.unwrap_or_else(Uuid::nil),
        &req.task.required_skills,
        req.task.priority,
        &state.taxonomy,
    );
    let mut seen = HashSet::new();
    if let Some(dup) = req.candidates.iter().find(|c| !seen.insert(c.employee_id)) {
        return Err(AppError::Validation(format!(
            "Candidate {} is listed more than once",
            dup.employee_id
        )));
    }

    let candidates = req
        .candidates
        .into_iter()
        .map(|c| c.into_candidate(&state))
        .collect::<Result<Vec<_>, _>>()?;

    let filter = MatchFilter {
        limit: req.limit,
        min_score: req.min_score,
    };
    Ok(Json(rank_views(&state, &task, &candidates, filter)))
}
