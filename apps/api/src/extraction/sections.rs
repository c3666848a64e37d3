//! Section detection: splits a CV into skills sections and body text.
//!
//! Header detection is heuristic, so it sits behind `SectionDetector` and the
//! extractor only ever sees the resulting `Section`s.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Skills,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

/// Strategy for partitioning document text into sections.
pub trait SectionDetector: Send + Sync {
    fn split(&self, text: &str) -> Vec<Section>;
}

const MAX_HEADER_CHARS: usize = 40;
const MAX_HEADER_WORDS: usize = 5;

lazy_static! {
    static ref SKILLS_HEADER: Regex = Regex::new(
        r"(?i)^(?:(?:(?:technical|key|core|professional)\s+)?(?:skills?(?:\s+(?:&|and)\s+(?:tools|technologies))?|competenc(?:y|ies)|expertise|technologies|tools|tech\s+stack)|programming\s+languages)$"
    ).unwrap();

    static ref OTHER_HEADER: Regex = Regex::new(
        r"(?i)^(?:(?:work|professional|relevant)\s+)?(?:experience|employment(?:\s+history)?|work\s+history|education|academic\s+background|projects?|personal\s+projects|summary|profile|about(?:\s+me)?|objective|certifications?|licenses?|awards?|honou?rs|publications?|interests|hobbies|references|contact(?:\s+information)?|volunteer(?:ing)?|achievements|courses|training|languages)$"
    ).unwrap();
}

/// Header-vocabulary detector: a short, capitalized line naming a known
/// section ("Technical Skills", "EXPERIENCE", "Skills: Rust, Go") starts a new
/// section which runs until the next header.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderSectionDetector;

struct Header<'a> {
    kind: SectionKind,
    /// Content after an inline `Header:` on the same line.
    rest: &'a str,
}

impl HeaderSectionDetector {
    fn classify<'a>(&self, line: &'a str) -> Option<Header<'a>> {
        let (head, rest) = match line.split_once(':') {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let head = head
            .trim()
            .trim_matches(|c: char| matches!(c, '#' | '*' | '-' | '=' | '_') || c.is_whitespace());

        if head.is_empty()
            || head.chars().count() > MAX_HEADER_CHARS
            || head.split_whitespace().count() > MAX_HEADER_WORDS
        {
            return None;
        }
        let capitalized = head
            .chars()
            .find(|c| c.is_alphabetic())
            .map(char::is_uppercase)
            .unwrap_or(false);
        if !capitalized {
            return None;
        }

        let kind = if SKILLS_HEADER.is_match(head) {
            SectionKind::Skills
        } else if OTHER_HEADER.is_match(head) {
            SectionKind::Body
        } else {
            return None;
        };
        Some(Header { kind, rest })
    }
}

impl SectionDetector for HeaderSectionDetector {
    fn split(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut kind = SectionKind::Body;
        let mut buffer = String::new();

        for line in text.lines() {
            match self.classify(line) {
                Some(header) => {
                    push_section(&mut sections, kind, &mut buffer);
                    kind = header.kind;
                    if !header.rest.is_empty() {
                        buffer.push_str(header.rest);
                        buffer.push('\n');
                    }
                }
                None => {
                    buffer.push_str(line);
                    buffer.push('\n');
                }
            }
        }
        push_section(&mut sections, kind, &mut buffer);

        sections
    }
}

fn push_section(sections: &mut Vec<Section>, kind: SectionKind, buffer: &mut String) {
    let text = std::mem::take(buffer);
    if !text.trim().is_empty() {
        sections.push(Section { kind, text });
    }
}
