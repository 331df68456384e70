//! Prompt construction for the three generation modes.
//!
//! Output is a pure function of the parameters: no clock, no randomness, so
//! the same form always yields byte-identical instructions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::params::{GenerationParameters, OutputLanguage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// ATP, Prota, Promes, teaching modules, KKTP and daily journal.
    Administrative,
    /// Question bank plus assessment package for one topic.
    QuestionBank,
    /// Try-out / final exam package over cumulative material.
    ComprehensiveExam,
}

impl GenerationMode {
    pub fn name(self) -> &'static str {
        match self {
            GenerationMode::Administrative => "admin",
            GenerationMode::QuestionBank => "question-bank",
            GenerationMode::ComprehensiveExam => "exam",
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            GenerationMode::Administrative => 0.7,
            GenerationMode::QuestionBank => 0.5,
            GenerationMode::ComprehensiveExam => 0.6,
        }
    }

    /// Stage messages shown while a request is in flight, paired with the
    /// rough progress percentage at which each stage is announced.
    pub fn progress_steps(self) -> &'static [(u8, &'static str)] {
        match self {
            GenerationMode::Administrative => &[
                (5, "Initialising AI model..."),
                (15, "Analysing learning outcomes (CP) and phase..."),
                (30, "Drafting learning objective flow (ATP)..."),
                (45, "Generating annual and semester programs..."),
                (60, "Designing teaching modules..."),
                (75, "Drafting KKTP..."),
                (90, "Finalising document format..."),
            ],
            GenerationMode::QuestionBank => &[
                (5, "Initialising AI model..."),
                (15, "Analysing topic..."),
                (30, "Drafting question blueprint..."),
                (50, "Generating question script..."),
                (70, "Writing answer key..."),
                (85, "Running qualitative analysis..."),
                (95, "Finalising document format..."),
            ],
            GenerationMode::ComprehensiveExam => &[
                (5, "Initialising AI model..."),
                (15, "Analysing cumulative curriculum (grades 10-12)..."),
                (30, "Drafting try-out blueprint..."),
                (50, "Generating standard questions..."),
                (70, "Generating aptitude questions..."),
                (85, "Finalising answer key and rubric..."),
            ],
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrative" => Ok(GenerationMode::Administrative),
            "question-bank" | "soal" | "bank" => Ok(GenerationMode::QuestionBank),
            "exam" | "tryout" | "comprehensive-exam" => Ok(GenerationMode::ComprehensiveExam),
            other => Err(format!("unknown generation mode {other}")),
        }
    }
}

/// Everything the orchestrator needs for one structured request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub mode: GenerationMode,
    pub instruction: String,
    pub schema: Value,
    pub temperature: f32,
}

const SUPERSCRIPT_RULE: &str = "**MATH FORMAT (MANDATORY):** write every power or exponent with Unicode superscript characters (x², m³, 10⁻⁴). NEVER use the caret symbol (^).";

const NO_TRUNCATION_RULE: &str = "**IMPORTANT:** you are strictly forbidden to summarise, truncate or shorten the number of questions. If 30 questions are requested you must write all 30 in full, one by one. Do not stop halfway and do not give examples only.";

const ARABIC_HARAKAT_RULE: &str = "**ARABIC TEXT:** every Arabic word MUST carry complete harakat (full diacritical marks).";

const JSON_SHAPE: &str = "Return one JSON object with a `sections` array; every section is an object {id, title, content} with a unique `id` and HTML in `content`.";

/// Response schema: an object whose `sections` array holds {id, title, content}.
pub fn sections_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sections": {
                "type": "array",
                "description": "An array of generated document sections.",
                "items": {
                    "type": "object",
                    "properties": {
                        "id":      { "type": "string", "description": "Unique identifier for the section." },
                        "title":   { "type": "string", "description": "The title of the generated section." },
                        "content": { "type": "string", "description": "The full HTML content of the section." }
                    },
                    "required": ["id", "title", "content"]
                }
            }
        },
        "required": ["sections"]
    })
}

pub fn build(params: &GenerationParameters, mode: GenerationMode) -> PromptSpec {
    let instruction = match mode {
        GenerationMode::Administrative => administrative(params),
        GenerationMode::QuestionBank => question_bank(params),
        GenerationMode::ComprehensiveExam => comprehensive_exam(params),
    };
    PromptSpec {
        mode,
        instruction,
        schema: sections_schema(),
        temperature: mode.temperature(),
    }
}

fn language_line(language: OutputLanguage) -> String {
    format!("Write every section in {}.", language.label())
}

fn administrative(p: &GenerationParameters) -> String {
    let mut lines = vec![
        "You are an expert teaching assistant. Produce the Kurikulum Merdeka administrative documents for a teacher.".to_string(),
        format!(
            "**Data:** subject {}, grade {}, phase {}, semester {}.",
            p.subject, p.grade, p.phase, p.semester
        ),
        format!("**Learning outcome (CP) elements:** {}", p.curriculum_text()),
        "Generate these documents, each as its own section:".to_string(),
        "1. ATP (learning objective flow).".to_string(),
        "2. Prota (annual program).".to_string(),
        "3. Promes (semester program).".to_string(),
        format!("4. Modul Ajar (teaching module) - {} module(s).", p.module_count.max(1)),
        "5. KKTP (criteria for achieving learning objectives).".to_string(),
        "6. Jurnal Harian (daily teaching journal).".to_string(),
    ];
    if !p.time_allocation.trim().is_empty() {
        lines.push(format!("Weekly time allocation: {}.", p.time_allocation));
    }
    lines.push(language_line(p.language));
    if p.language == OutputLanguage::Arabic {
        lines.push(ARABIC_HARAKAT_RULE.to_string());
    }
    lines.push(SUPERSCRIPT_RULE.to_string());
    lines.push("Use '<table>' markup for every document.".to_string());
    lines.push(JSON_SHAPE.to_string());
    lines.join("\n")
}

fn question_bank(p: &GenerationParameters) -> String {
    let c = &p.counts;
    let mut lines = vec![
        "Produce a complete assessment package: question script, answer key with explanations, question blueprint (kisi-kisi), scoring rubric, qualitative analysis and material summary.".to_string(),
        format!("Subject: {}, grade {}, topic: {}.", p.subject, p.grade, p.topic),
        format!("Difficulty: {}.", p.difficulty),
        String::new(),
        "**QUESTION COUNT RULES (MANDATORY):**".to_string(),
    ];

    let standard = [
        (c.multiple_choice, "standard multiple-choice"),
        (c.essay, "standard essay"),
        (c.short_answer, "standard short-answer"),
    ];
    for (count, label) in standard {
        if count > 0 {
            lines.push(format!("- Produce EXACTLY {count} {label} questions."));
        }
    }

    let aptitude_mc = p.include_aptitude_multiple_choice;
    let aptitude_essay = p.include_aptitude_essay;
    if aptitude_mc || aptitude_essay {
        lines.push(String::new());
        lines.push(format!(
            "**ADDITIONAL TKA (academic aptitude test) QUESTIONS - track {}:**",
            p.aptitude_track.label()
        ));
        if aptitude_mc {
            lines.push(format!(
                "- Add EXACTLY {} TKA multiple-choice questions.",
                c.aptitude_multiple_choice
            ));
        }
        if aptitude_essay {
            lines.push(format!("- Add EXACTLY {} TKA essay questions.", c.aptitude_essay));
        }
    }

    lines.push(String::new());
    lines.push(NO_TRUNCATION_RULE.to_string());
    lines.push(language_line(p.language));
    if p.language == OutputLanguage::Arabic {
        lines.push(ARABIC_HARAKAT_RULE.to_string());
    }
    lines.push(SUPERSCRIPT_RULE.to_string());
    lines.push(JSON_SHAPE.to_string());
    lines.join("\n")
}

fn comprehensive_exam(p: &GenerationParameters) -> String {
    let c = &p.counts;
    let material = if p.topic.trim().is_empty() {
        "standard cumulative material of grades 10, 11 and 12"
    } else {
        p.topic.trim()
    };

    let mut lines = vec![
        "Produce a COMPREHENSIVE assessment package (TRY OUT / final school exam) for senior high school.".to_string(),
        format!("Subject: {}", p.subject),
        format!("TKA track: {}", p.aptitude_track.label()),
        format!("Language: {}", p.language.label()),
        format!("Difficulty: {}", p.difficulty),
        String::new(),
        format!("**Main material tested:** {material}"),
        String::new(),
        "**QUESTION COUNT RULES (MANDATORY - DO NOT SHORTEN):**".to_string(),
        format!("1. Standard multiple-choice questions: EXACTLY {}.", c.multiple_choice),
        format!("2. Standard essay questions: EXACTLY {}.", c.essay),
        format!(
            "3. TKA (academic aptitude test) multiple-choice questions: EXACTLY {}.",
            c.aptitude_multiple_choice
        ),
        format!("4. TKA essay questions: EXACTLY {}.", c.aptitude_essay),
        String::new(),
        NO_TRUNCATION_RULE.to_string(),
        "The total number of questions must match the sum of the counts above.".to_string(),
    ];
    if p.language == OutputLanguage::Arabic {
        lines.push(ARABIC_HARAKAT_RULE.to_string());
    }
    lines.push(SUPERSCRIPT_RULE.to_string());
    lines.push(String::new());
    lines.push("The sections must cover:".to_string());
    lines.push("- Question script (use a table for multiple-choice questions).".to_string());
    lines.push("- Answer key with detailed rationale.".to_string());
    lines.push(
        "- Question blueprint (table columns: No, Topic, Grade, Cognitive Level, Indicator)."
            .to_string(),
    );
    lines.push("- Scoring rubric.".to_string());
    lines.push(JSON_SHAPE.to_string());
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    /// Learning-outcome (CP) elements for the administrative form.
    CurriculumElements,
    /// Topic / material ideas for question generation.
    Topics,
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cp" | "curriculum" => Ok(SuggestionKind::CurriculumElements),
            "topic" | "topics" => Ok(SuggestionKind::Topics),
            other => Err(format!("unknown suggestion kind {other}")),
        }
    }
}

/// Free-text prompt for the suggestion assistant (Markdown answer).
pub fn suggestion(p: &GenerationParameters, kind: SuggestionKind) -> String {
    match kind {
        SuggestionKind::CurriculumElements => format!(
            "List the learning outcome (Capaian Pembelajaran, CP) elements for the subject {}, level {}, grade {}, {}. Present them in Markdown.",
            p.subject, p.education_level, p.grade, p.phase
        ),
        SuggestionKind::Topics => format!(
            "Suggest relevant learning topics / materials for the subject {}, level {}, grade {}, semester {}. If this is for a try out, give cumulative material from grades 10, 11 and 12 that frequently appears in exams. Present them in Markdown.",
            p.subject, p.education_level, p.grade, p.semester
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{AptitudeTrack, QuestionCounts};

    fn bank_params() -> GenerationParameters {
        GenerationParameters {
            education_level: "SMA".into(),
            grade: "10".into(),
            subject: "Matematika".into(),
            topic: "Eksponen".into(),
            counts: QuestionCounts {
                multiple_choice: 30,
                essay: 4,
                short_answer: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn same_input_same_instruction() {
        let p = bank_params();
        for mode in [
            GenerationMode::Administrative,
            GenerationMode::QuestionBank,
            GenerationMode::ComprehensiveExam,
        ] {
            assert_eq!(build(&p, mode), build(&p, mode));
        }
    }

    #[test]
    fn question_bank_states_exact_counts_and_skips_zero_categories() {
        let spec = build(&bank_params(), GenerationMode::QuestionBank);
        assert!(spec.instruction.contains("EXACTLY 30 standard multiple-choice"));
        assert!(spec.instruction.contains("EXACTLY 4 standard essay"));
        assert!(!spec.instruction.to_lowercase().contains("short-answer"));
        assert_eq!(spec.temperature, 0.5);
    }

    #[test]
    fn aptitude_clause_absent_without_flags() {
        let mut p = bank_params();
        p.counts.aptitude_multiple_choice = 10;
        let text = build(&p, GenerationMode::QuestionBank).instruction;
        assert!(!text.contains("TKA"));
        assert!(!text.to_lowercase().contains("aptitude"));
        assert!(!text.contains("Saintek"));
    }

    #[test]
    fn aptitude_clause_names_track() {
        let mut p = bank_params();
        p.include_aptitude_essay = true;
        p.counts.aptitude_essay = 5;
        p.aptitude_track = AptitudeTrack::Soshum;
        let text = build(&p, GenerationMode::QuestionBank).instruction;
        assert!(text.contains("Soshum"));
        assert!(text.contains("EXACTLY 5 TKA essay"));
        assert!(!text.contains("TKA multiple-choice"));
    }

    #[test]
    fn every_mode_forbids_caret_powers() {
        let p = bank_params();
        for mode in [
            GenerationMode::Administrative,
            GenerationMode::QuestionBank,
            GenerationMode::ComprehensiveExam,
        ] {
            let text = build(&p, mode).instruction;
            assert!(text.contains("NEVER use the caret symbol (^)"), "{mode}");
            assert!(text.contains("x²"), "{mode}");
        }
    }

    #[test]
    fn truncation_ban_in_question_modes_only() {
        let p = bank_params();
        assert!(build(&p, GenerationMode::QuestionBank).instruction.contains("forbidden to summarise"));
        assert!(build(&p, GenerationMode::ComprehensiveExam).instruction.contains("forbidden to summarise"));
        assert!(!build(&p, GenerationMode::Administrative).instruction.contains("forbidden to summarise"));
    }

    #[test]
    fn administrative_lists_documents_and_data() {
        let mut p = bank_params();
        p.phase = "Fase E".into();
        p.curriculum_elements = vec!["Bilangan".into(), "Aljabar".into()];
        let text = build(&p, GenerationMode::Administrative).instruction;
        for needle in ["Matematika", "grade 10", "Fase E", "Bilangan; Aljabar", "ATP", "Prota", "Promes", "Modul Ajar", "KKTP", "Jurnal Harian"] {
            assert!(text.contains(needle), "missing {needle}");
        }
        assert!(!text.contains("harakat"));
    }

    #[test]
    fn arabic_requires_harakat() {
        let mut p = bank_params();
        p.language = OutputLanguage::Arabic;
        let text = build(&p, GenerationMode::Administrative).instruction;
        assert!(text.contains("harakat"));
    }

    #[test]
    fn exam_states_all_four_counts_and_defaults_to_cumulative_material() {
        let mut p = bank_params();
        p.topic.clear();
        p.counts.aptitude_multiple_choice = 20;
        p.counts.aptitude_essay = 0;
        let text = build(&p, GenerationMode::ComprehensiveExam).instruction;
        assert!(text.contains("Standard multiple-choice questions: EXACTLY 30."));
        assert!(text.contains("Standard essay questions: EXACTLY 4."));
        assert!(text.contains("multiple-choice questions: EXACTLY 20."));
        assert!(text.contains("TKA essay questions: EXACTLY 0."));
        assert!(text.contains("grades 10, 11 and 12"));
        assert!(text.contains("No, Topic, Grade, Cognitive Level, Indicator"));
        assert!(text.contains("rubric"));
    }

    #[test]
    fn schema_requires_sections_of_id_title_content() {
        let schema = sections_schema();
        assert_eq!(schema["required"][0], "sections");
        let items = &schema["properties"]["sections"]["items"];
        assert_eq!(items["required"], json!(["id", "title", "content"]));
    }

    #[test]
    fn mode_names_round_trip_through_from_str() {
        for mode in [
            GenerationMode::Administrative,
            GenerationMode::QuestionBank,
            GenerationMode::ComprehensiveExam,
        ] {
            assert_eq!(mode.name().parse::<GenerationMode>(), Ok(mode));
        }
        assert!("quiz".parse::<GenerationMode>().is_err());
    }

    #[test]
    fn topic_suggestion_mentions_cumulative_material() {
        let text = suggestion(&bank_params(), SuggestionKind::Topics);
        assert!(text.contains("Matematika"));
        assert!(text.contains("Markdown"));
        assert!(text.contains("grades 10, 11 and 12"));
    }
}
