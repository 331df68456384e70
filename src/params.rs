//! Generation parameters as filled in by the teacher.
//!
//! Field aliases accept the form-state JSON saved by the web front end
//! (`mata_pelajaran`, `jumlah_pg`, ...) next to the English names.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog;
use crate::error::{GenError, Result};
use crate::prompt::GenerationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "Mudah", alias = "easy")]
    Easy,
    #[default]
    #[serde(alias = "Sedang", alias = "medium")]
    Medium,
    #[serde(alias = "Sulit (HOTS)", alias = "Sulit", alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Mudah",
            Difficulty::Medium => "Sedang",
            Difficulty::Hard => "Sulit (HOTS)",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputLanguage {
    #[default]
    #[serde(alias = "Bahasa Indonesia", alias = "indonesian")]
    Indonesian,
    #[serde(alias = "Bahasa Inggris", alias = "english")]
    English,
    #[serde(alias = "Bahasa Arab", alias = "arabic")]
    Arabic,
}

impl OutputLanguage {
    pub fn label(self) -> &'static str {
        match self {
            OutputLanguage::Indonesian => "Bahasa Indonesia",
            OutputLanguage::English => "Bahasa Inggris",
            OutputLanguage::Arabic => "Bahasa Arab",
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, OutputLanguage::Arabic)
    }
}

impl fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Academic-aptitude (TKA) subject grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AptitudeTrack {
    #[default]
    Saintek,
    Soshum,
}

impl AptitudeTrack {
    pub fn label(self) -> &'static str {
        match self {
            AptitudeTrack::Saintek => "Saintek (Sains & Teknologi)",
            AptitudeTrack::Soshum => "Soshum (Sosial & Humaniora)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionCounts {
    #[serde(default, alias = "jumlah_pg")]
    pub multiple_choice: u32,
    #[serde(default, alias = "jumlah_uraian")]
    pub essay: u32,
    #[serde(default, alias = "jumlah_isian_singkat")]
    pub short_answer: u32,
    #[serde(default, alias = "jumlah_soal_tka")]
    pub aptitude_multiple_choice: u32,
    #[serde(default, alias = "jumlah_soal_tka_uraian")]
    pub aptitude_essay: u32,
}

/// School / teacher details. Only used for file names, headers and saved
/// preferences, never for prompt logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, alias = "sekolah")]
    pub school: String,
    #[serde(default, alias = "nama_guru")]
    pub teacher: String,
    #[serde(default, alias = "yayasan")]
    pub foundation: String,
    #[serde(default, alias = "alamat_sekolah")]
    pub school_address: String,
    #[serde(default, alias = "tahun_ajaran")]
    pub academic_year: String,
    #[serde(default, alias = "judul_asesmen")]
    pub assessment_title: String,
    #[serde(default, alias = "tanggal_ujian")]
    pub exam_date: String,
    #[serde(default, alias = "waktu_ujian")]
    pub exam_duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParameters {
    #[serde(default = "default_level", alias = "jenjang")]
    pub education_level: String,
    #[serde(default, alias = "kelas")]
    pub grade: String,
    #[serde(default, alias = "mata_pelajaran")]
    pub subject: String,
    #[serde(default = "default_semester")]
    pub semester: String,
    #[serde(default, alias = "fase")]
    pub phase: String,
    #[serde(default, alias = "cp_elements", deserialize_with = "de_string_or_list")]
    pub curriculum_elements: Vec<String>,
    #[serde(default, alias = "topik_materi")]
    pub topic: String,
    #[serde(default, alias = "alokasi_waktu")]
    pub time_allocation: String,
    #[serde(default = "default_module_count", alias = "jumlah_modul_ajar")]
    pub module_count: u32,

    #[serde(flatten)]
    pub counts: QuestionCounts,
    #[serde(default, alias = "sertakan_soal_tka")]
    pub include_aptitude_multiple_choice: bool,
    #[serde(default, alias = "sertakan_soal_tka_uraian")]
    pub include_aptitude_essay: bool,
    #[serde(default, alias = "kelompok_tka")]
    pub aptitude_track: AptitudeTrack,

    #[serde(default, alias = "tingkat_kesulitan")]
    pub difficulty: Difficulty,
    #[serde(default, alias = "bahasa")]
    pub language: OutputLanguage,
    #[serde(default, alias = "use_thinking_mode")]
    pub deep_reasoning: bool,

    #[serde(flatten)]
    pub metadata: DocumentMetadata,
}

fn default_level() -> String {
    catalog::DEFAULT_EDUCATION_LEVEL.to_string()
}

fn default_semester() -> String {
    catalog::DEFAULT_SEMESTER.to_string()
}

fn default_module_count() -> u32 {
    1
}

// accept either "a; b" or ["a", "b"] for the curriculum elements
fn de_string_or_list<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a list of strings")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![v.to_string()])
            }
        }

        fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                let item = item.trim();
                if !item.is_empty() {
                    out.push(item.to_string());
                }
            }
            Ok(out)
        }
    }
    de.deserialize_any(Visitor)
}

impl GenerationParameters {
    /// Curriculum elements as one line for prompts.
    pub fn curriculum_text(&self) -> String {
        self.curriculum_elements.join("; ")
    }

    /// Fill an empty phase from the grade (phase is never validated beyond this).
    pub fn resolve_phase(&mut self) {
        if self.phase.trim().is_empty() {
            if let Some(phase) = catalog::phase_for(&self.education_level, &self.grade) {
                self.phase = phase.to_string();
            }
        }
    }

    fn has_question_bank_request(&self) -> bool {
        let c = &self.counts;
        c.multiple_choice > 0
            || c.essay > 0
            || c.short_answer > 0
            || (self.include_aptitude_multiple_choice && c.aptitude_multiple_choice > 0)
            || (self.include_aptitude_essay && c.aptitude_essay > 0)
    }

    fn has_exam_request(&self) -> bool {
        let c = &self.counts;
        c.multiple_choice > 0 || c.essay > 0 || c.aptitude_multiple_choice > 0 || c.aptitude_essay > 0
    }

    /// Caller-side checks before a generation call.
    pub fn validate(&self, mode: GenerationMode) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(GenError::Validation("subject is required".into()));
        }
        match mode {
            GenerationMode::Administrative => {
                if self.grade.trim().is_empty() {
                    return Err(GenError::Validation("grade is required".into()));
                }
                if self.curriculum_elements.is_empty() {
                    return Err(GenError::Validation(
                        "at least one curriculum element is required".into(),
                    ));
                }
            }
            GenerationMode::QuestionBank => {
                if !self.has_question_bank_request() {
                    return Err(GenError::Validation(
                        "select at least one question type: standard (multiple choice / essay / short answer) or aptitude".into(),
                    ));
                }
            }
            GenerationMode::ComprehensiveExam => {
                if !self.has_exam_request() {
                    return Err(GenError::Validation(
                        "select at least one question type".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}
