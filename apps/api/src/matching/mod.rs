// Matching pipeline.
// task requirement + candidates (profile, workload snapshot) -> ranked MatchResults.
// engine and workload are pure; handlers load inputs from the stores.

pub mod engine;
pub mod handlers;
pub mod workload;

pub use engine::{
    Candidate, MatchFilter, MatchResult, MatchView, ScoringWeights, TaskMatcher, TaskPriority,
    TaskRequirement, WeightedSkillMatcher,
};
pub use workload::{AssignmentStatus, WorkloadCalculator, WorkloadSnapshot};
