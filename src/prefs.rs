//! Locally persisted form preferences: the last used school profile and the
//! subjects a user added on top of the built-in catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::error::Result;
use crate::params::{GenerationParameters, OutputLanguage};
use crate::prompt::GenerationMode;

const APP_DIR: &str = "guru_gen";
const FILE_NAME: &str = "preferences.json";

/// Fields remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolProfile {
    #[serde(alias = "sekolah")]
    pub school: String,
    #[serde(alias = "nama_guru")]
    pub teacher: String,
    #[serde(alias = "yayasan")]
    pub foundation: String,
    #[serde(alias = "alamat_sekolah")]
    pub school_address: String,
    #[serde(alias = "jenjang")]
    pub education_level: String,
    #[serde(alias = "kelas")]
    pub grade: String,
    #[serde(alias = "mata_pelajaran")]
    pub subject: String,
    #[serde(alias = "tahun_ajaran")]
    pub academic_year: String,
    #[serde(alias = "bahasa")]
    pub language: Option<OutputLanguage>,
    pub semester: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(alias = "guruAppData")]
    pub profile: SchoolProfile,
    /// Education level -> user-added subjects.
    #[serde(alias = "customMataPelajaran")]
    pub custom_subjects: BTreeMap<String, Vec<String>>,
}

/// `<config dir>/guru_gen/preferences.json`, or a relative file when the
/// platform has no config dir.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(FILE_NAME))
}

fn fill(target: &mut String, saved: &str) {
    if target.trim().is_empty() && !saved.is_empty() {
        *target = saved.to_string();
    }
}

fn keep(saved: &mut String, current: &str) {
    if !current.trim().is_empty() {
        *saved = current.trim().to_string();
    }
}

impl Preferences {
    /// Missing or unreadable files give defaults; saved preferences are
    /// a convenience and never block a run.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                log::info!("no preferences at {} ({e}), using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("ignoring unreadable preferences {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("preferences saved to {}", path.display());
        Ok(())
    }

    /// Copy the reusable parts of a submitted form.
    pub fn remember(&mut self, params: &GenerationParameters) {
        let p = &mut self.profile;
        let m = &params.metadata;
        keep(&mut p.school, &m.school);
        keep(&mut p.teacher, &m.teacher);
        keep(&mut p.foundation, &m.foundation);
        keep(&mut p.school_address, &m.school_address);
        keep(&mut p.academic_year, &m.academic_year);
        keep(&mut p.education_level, &params.education_level);
        keep(&mut p.grade, &params.grade);
        keep(&mut p.subject, &params.subject);
        keep(&mut p.semester, &params.semester);
        p.language = Some(params.language);
    }

    /// Fill blank fields of `params` from the saved profile, then the
    /// assessment title and duration from the defaults for `mode`. Values
    /// already present always win.
    pub fn apply_to(&self, params: &mut GenerationParameters, mode: GenerationMode) {
        let p = &self.profile;
        let m = &mut params.metadata;
        fill(&mut m.school, &p.school);
        fill(&mut m.teacher, &p.teacher);
        fill(&mut m.foundation, &p.foundation);
        fill(&mut m.school_address, &p.school_address);
        fill(&mut m.academic_year, &p.academic_year);
        if m.academic_year.is_empty() {
            m.academic_year = catalog::DEFAULT_ACADEMIC_YEAR.to_string();
        }
        let title = match mode {
            GenerationMode::ComprehensiveExam => catalog::DEFAULT_TRYOUT_TITLE,
            GenerationMode::Administrative | GenerationMode::QuestionBank => {
                catalog::DEFAULT_ASSESSMENT_TITLE
            }
        };
        fill(&mut m.assessment_title, title);
        fill(&mut m.exam_duration, catalog::DEFAULT_EXAM_DURATION);
        fill(&mut params.grade, &p.grade);
        fill(&mut params.subject, &p.subject);
    }

    /// Returns false when the name was blank or already known.
    pub fn add_custom_subject(&mut self, level: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || catalog::subjects_for(level).contains(&name) {
            return false;
        }
        let list = self.custom_subjects.entry(level.to_string()).or_default();
        if list.iter().any(|s| s == name) {
            return false;
        }
        list.push(name.to_string());
        true
    }

    /// Built-in and custom subjects for a level, sorted, no duplicates.
    pub fn subjects_for(&self, level: &str) -> Vec<String> {
        let mut all: Vec<String> = catalog::subjects_for(level)
            .iter()
            .map(|s| s.to_string())
            .chain(self.custom_subjects.get(level).into_iter().flatten().cloned())
            .collect();
        all.sort();
        all.dedup();
        all
    }
}
