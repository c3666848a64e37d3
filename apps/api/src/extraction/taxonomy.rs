//! Skill Taxonomy: canonical skill names and their aliases.
//!
//! Loaded once at startup (built-in list or a JSON override) and shared
//! read-only behind an `Arc`. Lookups are case-insensitive because every key
//! goes through the same tokenizer as document text.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::tokenizer::normalize_phrase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Language,
    Web,
    Database,
    CloudDevops,
    DataMl,
    Tooling,
    Testing,
    Messaging,
    Mobile,
    Practice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTaxonomyEntry {
    /// Canonical display name, e.g. `Node.js`.
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub category: Option<SkillCategory>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Skill '{0}' is defined more than once")]
    DuplicateCanonical(String),

    #[error("Alias '{alias}' maps to both '{first}' and '{second}'")]
    ConflictingAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Alias '{alias}' of skill '{skill}' normalizes to no usable phrase")]
    UnusableAlias { alias: String, skill: String },

    #[error("Invalid taxonomy JSON: {0}")]
    Json(String),
}

#[derive(Debug, Clone)]
pub struct SkillTaxonomy {
    entries: Vec<SkillTaxonomyEntry>,
    /// Normalized phrase -> index into `entries`.
    index: HashMap<String, usize>,
    max_alias_words: usize,
}

impl SkillTaxonomy {
    /// Builds and validates a taxonomy. Every canonical name is also an alias
    /// of itself.
    pub fn from_entries(entries: Vec<SkillTaxonomyEntry>) -> Result<Self, TaxonomyError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut max_alias_words = 0;

        for (idx, entry) in entries.iter().enumerate() {
            let name_key = normalize_phrase(&entry.name).ok_or_else(|| {
                TaxonomyError::UnusableAlias {
                    alias: entry.name.clone(),
                    skill: entry.name.clone(),
                }
            })?;
            if let Some(&existing) = index.get(&name_key) {
                if entries[existing].name.eq_ignore_ascii_case(&entry.name) {
                    return Err(TaxonomyError::DuplicateCanonical(entry.name.clone()));
                }
            }

            let alias_keys = std::iter::once(Ok(name_key)).chain(entry.aliases.iter().map(|alias| {
                normalize_phrase(alias).ok_or_else(|| TaxonomyError::UnusableAlias {
                    alias: alias.clone(),
                    skill: entry.name.clone(),
                })
            }));

            for key in alias_keys {
                let key = key?;
                match index.get(&key) {
                    Some(&other) if other != idx => {
                        return Err(TaxonomyError::ConflictingAlias {
                            alias: key,
                            first: entries[other].name.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        max_alias_words = max_alias_words.max(key.split(' ').count());
                        index.insert(key, idx);
                    }
                }
            }
        }

        Ok(Self {
            entries,
            index,
            max_alias_words,
        })
    }

    /// Parses a JSON array of `{"name", "aliases", "category"}` objects.
    pub fn from_json(json: &str) -> Result<Self, TaxonomyError> {
        let entries: Vec<SkillTaxonomyEntry> =
            serde_json::from_str(json).map_err(|e| TaxonomyError::Json(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// The built-in technical vocabulary.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        let entries = BUILTIN_SKILLS
            .iter()
            .map(|(name, aliases, category)| SkillTaxonomyEntry {
                name: name.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                category: Some(*category),
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Resolves the longest alias starting at `tokens[0]`.
    ///
    /// Returns the entry and the number of tokens the alias spans, so
    /// "react native" wins over "react" at the same position.
    pub fn longest_match(&self, tokens: &[String]) -> Option<(&SkillTaxonomyEntry, usize)> {
        let upper = tokens.len().min(self.max_alias_words);
        (1..=upper).rev().find_map(|width| {
            let key = tokens[..width].join(" ");
            self.index
                .get(&key)
                .map(|&idx| (&self.entries[idx], width))
        })
    }

    /// Exact (whole-phrase) alias lookup, case-insensitive.
    pub fn lookup(&self, phrase: &str) -> Option<&SkillTaxonomyEntry> {
        let key = normalize_phrase(phrase)?;
        self.index.get(&key).map(|&idx| &self.entries[idx])
    }

    /// Canonical name for a known skill, otherwise the trimmed input.
    pub fn canonicalize(&self, raw: &str) -> String {
        self.lookup(raw)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| raw.trim().to_string())
    }

    pub fn max_alias_words(&self) -> usize {
        self.max_alias_words
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use SkillCategory::*;

const BUILTIN_SKILLS: &[(&str, &[&str], SkillCategory)] = &[
    // Languages
    ("Python", &["py"], Language),
    ("Java", &[], Language),
    ("JavaScript", &["js", "ecmascript"], Language),
    ("TypeScript", &["ts"], Language),
    ("C++", &["cplusplus", "c plus plus", "cpp"], Language),
    ("C#", &["c sharp", "csharp"], Language),
    ("C", &[], Language),
    ("Go", &["golang"], Language),
    ("Rust", &[], Language),
    ("Kotlin", &[], Language),
    ("Swift", &[], Language),
    ("PHP", &[], Language),
    ("Ruby", &[], Language),
    ("Scala", &[], Language),
    ("R", &[], Language),
    ("MATLAB", &[], Language),
    ("Perl", &[], Language),
    ("Shell", &["shell scripting"], Language),
    ("Bash", &[], Language),
    ("PowerShell", &[], Language),
    (".NET", &["dotnet", "dot net"], Language),
    // Web
    ("HTML", &["html5"], Web),
    ("CSS", &["css3"], Web),
    ("React", &["reactjs", "react js", "react.js"], Web),
    ("Vue", &["vuejs", "vue js", "vue.js"], Web),
    ("Angular", &["angularjs"], Web),
    ("Svelte", &[], Web),
    ("SvelteKit", &["svelte kit"], Web),
    ("Node.js", &["nodejs", "node js"], Web),
    ("Express", &["expressjs", "express.js"], Web),
    ("Django", &[], Web),
    ("Flask", &[], Web),
    ("FastAPI", &[], Web),
    ("Spring", &["spring boot"], Web),
    ("Laravel", &[], Web),
    ("ASP.NET", &["asp net"], Web),
    ("jQuery", &[], Web),
    ("Bootstrap", &[], Web),
    ("Sass", &["scss"], Web),
    ("Webpack", &[], Web),
    ("Vite", &[], Web),
    ("Tailwind", &["tailwindcss", "tailwind css"], Web),
    ("Redux", &[], Web),
    ("Next.js", &["nextjs", "next js"], Web),
    ("Nuxt.js", &["nuxtjs", "nuxt js"], Web),
    ("GraphQL", &[], Web),
    ("REST", &["restful", "rest api", "restful api"], Web),
    ("API", &["apis"], Web),
    ("Microservices", &["microservice"], Web),
    // Databases
    ("SQL", &[], Database),
    ("PostgreSQL", &["postgres", "postgre"], Database),
    ("MySQL", &[], Database),
    ("MongoDB", &["mongo"], Database),
    ("Redis", &[], Database),
    ("Oracle", &[], Database),
    ("SQLite", &[], Database),
    ("Cassandra", &[], Database),
    ("Elasticsearch", &["elastic search"], Database),
    ("DynamoDB", &[], Database),
    ("Neo4j", &[], Database),
    ("Snowflake", &[], Database),
    ("BigQuery", &["big query"], Database),
    // Cloud and DevOps
    ("AWS", &["amazon web services"], CloudDevops),
    ("Azure", &["microsoft azure"], CloudDevops),
    ("GCP", &["google cloud", "google cloud platform"], CloudDevops),
    ("Docker", &[], CloudDevops),
    ("Kubernetes", &["k8s"], CloudDevops),
    ("Jenkins", &[], CloudDevops),
    ("Git", &[], CloudDevops),
    ("CI/CD", &["cicd", "ci-cd"], CloudDevops),
    ("Terraform", &[], CloudDevops),
    ("Ansible", &[], CloudDevops),
    ("Linux", &[], CloudDevops),
    ("Unix", &[], CloudDevops),
    ("Nginx", &[], CloudDevops),
    ("Apache", &[], CloudDevops),
    ("Prometheus", &[], CloudDevops),
    ("Grafana", &[], CloudDevops),
    ("DevOps", &[], CloudDevops),
    // Data science and ML
    ("Machine Learning", &["ml"], DataMl),
    ("Deep Learning", &["dl"], DataMl),
    ("Artificial Intelligence", &["ai"], DataMl),
    ("TensorFlow", &[], DataMl),
    ("PyTorch", &[], DataMl),
    ("scikit-learn", &["sklearn"], DataMl),
    ("Pandas", &[], DataMl),
    ("NumPy", &[], DataMl),
    ("Data Analysis", &[], DataMl),
    ("Data Science", &[], DataMl),
    ("NLP", &["natural language processing"], DataMl),
    ("XGBoost", &[], DataMl),
    ("LightGBM", &[], DataMl),
    ("Spark", &["apache spark", "pyspark"], DataMl),
    ("Hadoop", &[], DataMl),
    ("ETL", &[], DataMl),
    ("Data Engineering", &[], DataMl),
    // Tools
    ("GitHub", &[], Tooling),
    ("GitLab", &[], Tooling),
    ("Bitbucket", &[], Tooling),
    ("Jira", &[], Tooling),
    ("Confluence", &[], Tooling),
    ("Slack", &[], Tooling),
    ("Figma", &[], Tooling),
    ("Sketch", &[], Tooling),
    ("Adobe", &[], Tooling),
    ("Photoshop", &[], Tooling),
    ("Illustrator", &[], Tooling),
    ("Postman", &[], Tooling),
    ("Swagger", &[], Tooling),
    ("OpenAPI", &[], Tooling),
    // Testing
    ("Testing", &[], Testing),
    ("Unit Testing", &["unit tests"], Testing),
    ("Integration Testing", &["integration tests"], Testing),
    ("Test Automation", &["automated testing"], Testing),
    ("Selenium", &[], Testing),
    ("Jest", &[], Testing),
    ("Pytest", &[], Testing),
    ("JUnit", &[], Testing),
    ("Cypress", &[], Testing),
    ("TDD", &["test driven development"], Testing),
    ("BDD", &["behavior driven development"], Testing),
    // Messaging and streaming
    ("Kafka", &["apache kafka"], Messaging),
    ("RabbitMQ", &[], Messaging),
    // Mobile
    ("Android", &[], Mobile),
    ("iOS", &[], Mobile),
    ("React Native", &[], Mobile),
    ("Flutter", &[], Mobile),
    ("Xamarin", &[], Mobile),
    // Practices
    ("Agile", &[], Practice),
    ("Scrum", &[], Practice),
    ("Kanban", &[], Practice),
    ("UI", &[], Practice),
    ("UX", &[], Practice),
    ("UI/UX", &["ux ui", "ux/ui"], Practice),
    ("Design", &[], Practice),
    ("Research", &[], Practice),
    ("Analytics", &[], Practice),
    ("Documentation", &[], Practice),
    ("Process Mapping", &[], Practice),
    ("Stakeholder Management", &[], Practice),
    ("Project Management", &[], Practice),
    ("Leadership", &[], Practice),
    ("Mentoring", &[], Practice),
];
