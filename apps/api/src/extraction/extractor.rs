//! Skill Extractor: plain text in, confidence-scored canonical skills out.
//!
//! Algorithm:
//! 1. Split text into sections (`SectionDetector`) and sections into clauses of tokens.
//! 2. At each token position take the longest taxonomy alias that matches,
//!    then continue after it (so "machine learning" hides "learning").
//! 3. Tally occurrences per canonical name, noting any inside a skills section.
//! 4. confidence = min(1, 0.5 + 0.3 if seen in a skills section + 0.1 per extra occurrence)
//!
//! Extraction is deterministic for a given (text, taxonomy, detector). The only
//! failure is the time budget running out.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::sections::{HeaderSectionDetector, SectionDetector, SectionKind};
use crate::extraction::taxonomy::SkillTaxonomy;
use crate::extraction::tokenizer::clauses;
use crate::extraction::ExtractionError;

pub const BASE_CONFIDENCE: f64 = 0.5;
pub const SKILLS_SECTION_BONUS: f64 = 0.3;
pub const REPEAT_MENTION_BONUS: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSection {
    SkillsSection,
    BodyText,
}

impl SourceSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSection::SkillsSection => "skills_section",
            SourceSection::BodyText => "body_text",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "skills_section" => SourceSection::SkillsSection,
            _ => SourceSection::BodyText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    /// Canonical taxonomy name.
    pub name: String,
    /// 0.0 – 1.0
    pub confidence: f64,
    pub source: SourceSection,
}

/// The skills attributed to one employee, unique by canonical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub employee_id: Uuid,
    pub skills: Vec<ExtractedSkill>,
}

impl SkillProfile {
    /// Builds a profile, keeping the higher-confidence entry when a skill
    /// appears twice (names compare case-insensitively).
    pub fn from_skills(employee_id: Uuid, skills: impl IntoIterator<Item = ExtractedSkill>) -> Self {
        let mut by_name: HashMap<String, ExtractedSkill> = HashMap::new();
        for skill in skills {
            let key = skill.name.to_lowercase();
            match by_name.get(&key) {
                Some(existing) if existing.confidence >= skill.confidence => {}
                _ => {
                    by_name.insert(key, skill);
                }
            }
        }
        let mut skills: Vec<ExtractedSkill> = by_name.into_values().collect();
        sort_skills(&mut skills);
        Self {
            employee_id,
            skills,
        }
    }

    pub fn confidence_of(&self, name: &str) -> Option<f64> {
        self.skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.confidence)
    }
}

#[derive(Debug, Default)]
struct Tally {
    occurrences: usize,
    in_skills_section: bool,
}

/// Extracts skills against an injected taxonomy. Cheap to clone and safe to
/// share across worker threads.
#[derive(Clone)]
pub struct SkillExtractor {
    taxonomy: Arc<SkillTaxonomy>,
    detector: Arc<dyn SectionDetector>,
    time_budget: Duration,
}

impl SkillExtractor {
    pub fn new(taxonomy: Arc<SkillTaxonomy>) -> Self {
        Self {
            taxonomy,
            detector: Arc::new(HeaderSectionDetector),
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn SectionDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Extracts skills from text, sorted by confidence (desc) then name.
    /// No skills found is `Ok(vec![])`.
    pub fn extract(&self, text: &str) -> Result<Vec<ExtractedSkill>, ExtractionError> {
        let started = Instant::now();
        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();

        for section in self.detector.split(text) {
            for clause in clauses(&section.text) {
                if started.elapsed() >= self.time_budget {
                    return Err(ExtractionError::ExtractionTimeout {
                        limit_ms: self.time_budget.as_millis() as u64,
                    });
                }

                let mut pos = 0;
                while pos < clause.len() {
                    match self.taxonomy.longest_match(&clause[pos..]) {
                        Some((entry, width)) => {
                            let tally = tallies.entry(entry.name.clone()).or_default();
                            tally.occurrences += 1;
                            tally.in_skills_section |= section.kind == SectionKind::Skills;
                            pos += width;
                        }
                        None => pos += 1,
                    }
                }
            }
        }

        let mut skills: Vec<ExtractedSkill> = tallies
            .into_iter()
            .map(|(name, tally)| ExtractedSkill {
                name,
                confidence: score_confidence(tally.occurrences, tally.in_skills_section),
                source: if tally.in_skills_section {
                    SourceSection::SkillsSection
                } else {
                    SourceSection::BodyText
                },
            })
            .collect();
        sort_skills(&mut skills);
        Ok(skills)
    }
}

/// Confidence of the best occurrence of a skill seen `occurrences` times.
pub fn score_confidence(occurrences: usize, in_skills_section: bool) -> f64 {
    let section_bonus = if in_skills_section {
        SKILLS_SECTION_BONUS
    } else {
        0.0
    };
    let repeats = occurrences.saturating_sub(1) as f64;
    let raw = (BASE_CONFIDENCE + section_bonus + REPEAT_MENTION_BONUS * repeats).min(MAX_CONFIDENCE);
    // Four decimals keeps 0.5 + 0.3 + 0.1 from printing as 0.8999999999999999.
    (raw * 10_000.0).round() / 10_000.0
}

fn sort_skills(skills: &mut [ExtractedSkill]) {
    skills.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::sections::Section;
    use crate::extraction::taxonomy::tests::mini_taxonomy;
    use proptest::prelude::*;

    fn extractor() -> SkillExtractor {
        SkillExtractor::new(Arc::new(mini_taxonomy()))
    }

    fn find<'a>(skills: &'a [ExtractedSkill], name: &str) -> &'a ExtractedSkill {
        skills
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("{name} not extracted from {skills:?}"))
    }

    const SAMPLE_CV: &str = "\
Jane Doe
Senior Data Engineer

Technical Skills
Python, SQL, PostgreSQL

Experience
Built ML pipelines in Python for the analytics team.
";

    #[test]
    fn test_skills_section_and_repeat_mentions() {
        let skills = extractor().extract(SAMPLE_CV).unwrap();

        let python = find(&skills, "Python");
        assert_eq!(python.confidence, 0.9);
        assert_eq!(python.source, SourceSection::SkillsSection);

        let sql = find(&skills, "SQL");
        assert_eq!(sql.confidence, 0.8);

        let ml = find(&skills, "Machine Learning");
        assert_eq!(ml.confidence, 0.5);
        assert_eq!(ml.source, SourceSection::BodyText);
    }

    #[test]
    fn test_output_sorted_by_confidence_then_name() {
        let skills = extractor().extract(SAMPLE_CV).unwrap();
        let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "PostgreSQL", "SQL", "Machine Learning"]);
    }

    #[test]
    fn test_aliases_resolve_to_canonical_names() {
        let skills = extractor()
            .extract("Worked with postgres and reactjs, shipped CI-CD pipelines")
            .unwrap();
        let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"PostgreSQL"));
        assert!(names.contains(&"React"));
        assert!(names.contains(&"CI/CD"));
    }

    #[test]
    fn test_longest_match_consumes_shorter_alias() {
        let skills = extractor()
            .extract("Shipped two React Native apps")
            .unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "React Native");
    }

    #[test]
    fn test_multi_word_skill_hides_its_substring() {
        let taxonomy =
            SkillTaxonomy::from_json(r#"[{"name": "Machine Learning"}, {"name": "Learning"}]"#)
                .unwrap();
        let skills = SkillExtractor::new(Arc::new(taxonomy))
            .extract("Applied machine learning to churn")
            .unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Machine Learning");
    }

    #[test]
    fn test_confidence_is_capped() {
        let text = "Skills: Python, Python, Python, Python, Python, Python, Python, Python";
        let skills = extractor().extract(text).unwrap();
        assert_eq!(find(&skills, "Python").confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_case_insensitive_detection() {
        let skills = extractor().extract("PYTHON and sql").unwrap();
        assert_eq!(skills.len(), 2);
    }

    #[test]
    fn test_no_skills_is_empty_not_error() {
        assert!(extractor().extract("Enjoys hiking and chess").unwrap().is_empty());
        assert!(extractor().extract("").unwrap().is_empty());
    }

    #[test]
    fn test_zero_budget_times_out() {
        let result = extractor()
            .with_time_budget(Duration::ZERO)
            .extract("Python and SQL");
        assert_eq!(
            result,
            Err(ExtractionError::ExtractionTimeout { limit_ms: 0 })
        );
    }

    struct EverythingIsSkills;

    impl SectionDetector for EverythingIsSkills {
        fn split(&self, text: &str) -> Vec<Section> {
            vec![Section {
                kind: SectionKind::Skills,
                text: text.to_string(),
            }]
        }
    }

    #[test]
    fn test_detector_is_pluggable() {
        let skills = extractor()
            .with_detector(Arc::new(EverythingIsSkills))
            .extract("Used SQL daily")
            .unwrap();
        assert_eq!(skills[0].confidence, 0.8);
        assert_eq!(skills[0].source, SourceSection::SkillsSection);
    }

    #[test]
    fn test_profile_keeps_higher_confidence_duplicate() {
        let employee_id = Uuid::from_u128(7);
        let profile = SkillProfile::from_skills(
            employee_id,
            vec![
                ExtractedSkill {
                    name: "Python".to_string(),
                    confidence: 0.5,
                    source: SourceSection::BodyText,
                },
                ExtractedSkill {
                    name: "python".to_string(),
                    confidence: 0.9,
                    source: SourceSection::SkillsSection,
                },
            ],
        );
        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.confidence_of("PYTHON"), Some(0.9));
    }

    #[test]
    fn test_score_confidence_formula() {
        assert_eq!(score_confidence(1, false), 0.5);
        assert_eq!(score_confidence(1, true), 0.8);
        assert_eq!(score_confidence(3, false), 0.7);
        assert_eq!(score_confidence(2, true), 0.9);
        assert_eq!(score_confidence(9, true), 1.0);
    }

    #[test]
    fn test_source_section_round_trips_through_str() {
        for source in [SourceSection::SkillsSection, SourceSection::BodyText] {
            assert_eq!(SourceSection::parse(source.as_str()), source);
        }
    }

    const KNOWN: &[&str] = &[
        "Python",
        "SQL",
        "React",
        "React Native",
        "Machine Learning",
        "PostgreSQL",
        "CI/CD",
    ];

    proptest! {
        #[test]
        fn prop_skills_section_phrase_scores_at_least_0_8(
            idx in 0..KNOWN.len(),
            filler in "[a-z ]{0,40}",
        ) {
            let text = format!("Summary\n{filler}\nSkills\n{}\n", KNOWN[idx]);
            let skills = extractor().extract(&text).unwrap();
            let skill = skills.iter().find(|s| s.name == KNOWN[idx]).unwrap();
            prop_assert!(skill.confidence >= 0.8);
        }

        #[test]
        fn prop_extraction_is_idempotent(text in "[A-Za-z ,.\n]{0,200}") {
            let ex = extractor();
            prop_assert_eq!(ex.extract(&text).unwrap(), ex.extract(&text).unwrap());
        }

        #[test]
        fn prop_confidence_within_unit_interval(text in "(Python|SQL|py|ml|React|, |\n|Skills\n){0,60}") {
            for skill in extractor().extract(&text).unwrap() {
                prop_assert!(skill.confidence > 0.0 && skill.confidence <= 1.0);
            }
        }
    }
}
