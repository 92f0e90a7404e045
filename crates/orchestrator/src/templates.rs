//! Per-specialty template overrides.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PipelineError;

/// Source tag for drafts rendered from the campaign's own templates.
pub const CAMPAIGN_DEFAULT: &str = "campaign_default";

/// Specialty keyword to template slug; the first match wins.
pub const SPECIALTY_SLUGS: &[(&str, &str)] = &[
    ("dent", "dentiste"),
    ("cardio", "cardiology"),
    ("pedi", "pediatrics"),
    ("nutrition", "nutrition"),
    ("diab", "diabetes"),
];

/// Subject and body templates chosen for one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChoice {
    pub subject: String,
    pub body: String,
    /// `campaign_default` or the file stem pair that was used, e.g. `cardiology`.
    pub source: String,
}

/// Looks for `subject_<slug>.txt` / `body_<slug>.txt` in a directory.
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    dir: PathBuf,
}

pub fn specialty_slug(specialty: &str) -> Option<&'static str> {
    let specialty = specialty.to_lowercase();
    SPECIALTY_SLUGS
        .iter()
        .find(|(keyword, _)| specialty.contains(keyword))
        .map(|(_, slug)| *slug)
}

impl TemplateSelector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick templates for a specialty.
    ///
    /// Both override files must exist; otherwise the campaign templates are
    /// used. A file that exists but cannot be read is an error.
    pub fn select(
        &self,
        specialty: &str,
        fallback_subject: &str,
        fallback_body: &str,
    ) -> Result<TemplateChoice, PipelineError> {
        if let Some(slug) = specialty_slug(specialty) {
            let subject_path = self.dir.join(format!("subject_{}.txt", slug));
            let body_path = self.dir.join(format!("body_{}.txt", slug));

            if subject_path.is_file() && body_path.is_file() {
                debug!("Using {} templates from {}", slug, self.dir.display());
                return Ok(TemplateChoice {
                    subject: fs::read_to_string(&subject_path)?,
                    body: fs::read_to_string(&body_path)?,
                    source: slug.to_string(),
                });
            }
        }

        Ok(TemplateChoice {
            subject: fallback_subject.to_string(),
            body: fallback_body.to_string(),
            source: CAMPAIGN_DEFAULT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_lookup() {
        assert_eq!(specialty_slug("Cardiologist"), Some("cardiology"));
        assert_eq!(specialty_slug("Chirurgien Dentiste"), Some("dentiste"));
        assert_eq!(specialty_slug("Dermatology"), None);
    }

    #[test]
    fn test_override_pair_used() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("subject_cardiology.txt"), "Heart health, {{ city }}").unwrap();
        fs::write(dir.path().join("body_cardiology.txt"), "Hello {{ first_name }}").unwrap();

        let choice = TemplateSelector::new(dir.path())
            .select("Cardiologist", "S", "B")
            .unwrap();

        assert_eq!(choice.source, "cardiology");
        assert_eq!(choice.subject, "Heart health, {{ city }}");
        assert_eq!(choice.body, "Hello {{ first_name }}");
    }

    #[test]
    fn test_half_pair_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("subject_cardiology.txt"), "Only a subject").unwrap();

        let choice = TemplateSelector::new(dir.path())
            .select("Cardiologist", "S", "B")
            .unwrap();

        assert_eq!(choice.source, CAMPAIGN_DEFAULT);
        assert_eq!((choice.subject.as_str(), choice.body.as_str()), ("S", "B"));
    }

    #[test]
    fn test_missing_directory_falls_back() {
        let choice = TemplateSelector::new("/nonexistent/templates")
            .select("Pediatrics", "S", "B")
            .unwrap();
        assert_eq!(choice.source, CAMPAIGN_DEFAULT);
    }
}
