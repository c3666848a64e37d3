//! Contact details surfaced alongside the skill list by the analyze endpoint.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}\b").unwrap();
}

/// First email address in the text, lowercased.
pub fn extract_contact_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_first_email() {
        let text = "Jane Doe | Jane.Doe@Example.com | backup: jd@mail.org";
        assert_eq!(
            extract_contact_email(text).as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn test_subdomains_and_plus_tags() {
        assert_eq!(
            extract_contact_email("reach me at dev+cv@eng.acme.co.uk today").as_deref(),
            Some("dev+cv@eng.acme.co.uk")
        );
    }

    #[test]
    fn test_no_email() {
        assert_eq!(extract_contact_email("Skills: Rust, Go @ scale"), None);
    }
}
