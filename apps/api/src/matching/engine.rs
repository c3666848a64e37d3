//! Matching Engine: ranks employees for a task by weighted suitability.
//!
//! suitability = round(100 × (0.70·skill_match + 0.20·availability + 0.10·experience))
//!
//! - skill_match  = |required ∩ skills| / |required|, 1.0 when nothing is required
//! - availability = max(0, 1 − min(load_ratio, 1))
//! - experience   = mean confidence over the matched skills, 0 when none match
//!
//! Ranking is score desc, then load_ratio asc, then employee id asc, so the
//! same inputs always produce the same order.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::{SkillProfile, SkillTaxonomy};
use crate::matching::workload::WorkloadSnapshot;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

pub const SKILL_MATCH_WEIGHT: f64 = 0.70;
pub const AVAILABILITY_WEIGHT: f64 = 0.20;
pub const EXPERIENCE_WEIGHT: f64 = 0.10;

pub const MAX_SCORE: u32 = 100;

/// Component weights. They sum to 1.0 so the score tops out at 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill_match: f64,
    pub availability: f64,
    pub experience: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill_match: SKILL_MATCH_WEIGHT,
            availability: AVAILABILITY_WEIGHT,
            experience: EXPERIENCE_WEIGHT,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Lenient parse; anything unrecognised is `Medium`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => TaskPriority::Low,
            "HIGH" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }
}

/// A task's required skills, canonical and unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequirement {
    pub task_id: Uuid,
    required_skills: Vec<String>,
    pub priority: TaskPriority,
}

impl TaskRequirement {
    /// Canonicalizes raw skill names through the taxonomy and drops blanks and
    /// duplicates (case-insensitive, first occurrence kept, order preserved).
    pub fn new<I, S>(
        task_id: Uuid,
        raw_skills: I,
        priority: TaskPriority,
        taxonomy: &SkillTaxonomy,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let required_skills = raw_skills
            .into_iter()
            .map(|raw| taxonomy.canonicalize(raw.as_ref()))
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();

        Self {
            task_id,
            required_skills,
            priority,
        }
    }

    pub fn required_skills(&self) -> &[String] {
        &self.required_skills
    }
}

/// One employee as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub employee_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub profile: SkillProfile,
    pub workload: WorkloadSnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_match: f64,
    pub availability: f64,
    pub experience: f64,
}

/// Derived, never persisted. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub task_id: Uuid,
    pub employee_id: Uuid,
    pub suitability_score: u32,
    /// Required skills the employee has, in requirement order.
    pub matching_skills: Vec<String>,
    /// Required skills the employee lacks, in requirement order.
    pub missing_skills: Vec<String>,
    pub load_ratio: f64,
    pub breakdown: ScoreBreakdown,
}

/// The ranked-list entry consumed by the assignment workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_title: Option<String>,
    pub suitability_score: u32,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Workload percentage, unclamped (140.0 means overloaded).
    pub current_workload: f64,
}

impl MatchView {
    pub fn new(result: MatchResult, candidate: &Candidate) -> Self {
        Self {
            employee_id: result.employee_id,
            employee_name: candidate.name.clone(),
            employee_title: candidate.title.clone(),
            suitability_score: result.suitability_score,
            matching_skills: result.matching_skills,
            missing_skills: result.missing_skills,
            current_workload: (candidate.workload.percentage() * 100.0).round() / 100.0,
        }
    }
}

/// Post-ranking cut: drop results under `min_score`, then keep the top `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MatchFilter {
    pub limit: Option<usize>,
    pub min_score: Option<u32>,
}

impl MatchFilter {
    pub fn apply(&self, ranked: Vec<MatchResult>) -> Vec<MatchResult> {
        let min_score = self.min_score.unwrap_or(0);
        ranked
            .into_iter()
            .filter(|r| r.suitability_score >= min_score)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Scores candidates against a task. Implementations must be pure: the same
/// inputs always give the same results.
///
/// Carried in `AppState` as `Arc<dyn TaskMatcher>`.
pub trait TaskMatcher: Send + Sync {
    fn score(&self, task: &TaskRequirement, candidate: &Candidate) -> MatchResult;

    /// Scores every candidate and sorts into ranking order.
    fn rank(&self, task: &TaskRequirement, candidates: &[Candidate]) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> =
            candidates.iter().map(|c| self.score(task, c)).collect();
        results.sort_by(ranking_order);
        results
    }
}

/// Score desc, then load ratio asc, then employee id asc.
pub fn ranking_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.suitability_score
        .cmp(&a.suitability_score)
        .then_with(|| a.load_ratio.total_cmp(&b.load_ratio))
        .then_with(|| a.employee_id.cmp(&b.employee_id))
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedSkillMatcher: the default matcher
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSkillMatcher {
    weights: ScoringWeights,
}

impl WeightedSkillMatcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl TaskMatcher for WeightedSkillMatcher {
    fn score(&self, task: &TaskRequirement, candidate: &Candidate) -> MatchResult {
        let required = task.required_skills();

        let mut matching_skills = Vec::new();
        let mut missing_skills = Vec::new();
        let mut confidence_sum = 0.0;
        for skill in required {
            match candidate.profile.confidence_of(skill) {
                Some(confidence) => {
                    confidence_sum += confidence;
                    matching_skills.push(skill.clone());
                }
                None => missing_skills.push(skill.clone()),
            }
        }

        let skill_match = if required.is_empty() {
            1.0
        } else {
            matching_skills.len() as f64 / required.len() as f64
        };
        let load_ratio = candidate.workload.load_ratio;
        let availability = availability(load_ratio);
        let experience = if matching_skills.is_empty() {
            0.0
        } else {
            confidence_sum / matching_skills.len() as f64
        };

        let raw = self.weights.skill_match * skill_match
            + self.weights.availability * availability
            + self.weights.experience * experience;

        MatchResult {
            task_id: task.task_id,
            employee_id: candidate.employee_id,
            suitability_score: to_score(raw),
            matching_skills,
            missing_skills,
            load_ratio,
            breakdown: ScoreBreakdown {
                skill_match,
                availability,
                experience,
            },
        }
    }
}

/// 1 for an idle employee, 0 at or beyond capacity.
fn availability(load_ratio: f64) -> f64 {
    if load_ratio.is_nan() {
        return 0.0;
    }
    (1.0 - load_ratio.clamp(0.0, 1.0)).max(0.0)
}

/// Converts a 0..1 composite into a 0..100 integer score.
fn to_score(raw: f64) -> u32 {
    let points = raw * 100.0;
    // Snap sub-micro-point float noise so 87.49999999999999 rounds like 87.5.
    let snapped = (points * 1e6).round() / 1e6;
    if snapped.is_nan() {
        return 0;
    }
    snapped.round().clamp(0.0, MAX_SCORE as f64) as u32
}
