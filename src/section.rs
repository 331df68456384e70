//! Generated sections and the list operations the results view needs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// One titled, HTML-formatted block of generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Filter value that matches every section.
pub const ALL_CATEGORY: &str = "Semua";

// Title keywords mapped to a filter chip; checked in order, last match wins
const CATEGORY_KEYWORDS: [(&str, &str); 8] = [
    ("atp", "ATP"),
    ("naskah", "Naskah"),
    ("soal", "Soal"),
    ("kunci", "Kunci"),
    ("modul", "Modul"),
    ("prota", "Prota"),
    ("promes", "Promes"),
    ("kktp", "KKTP"),
];

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
}

fn space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

impl GeneratedSection {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Filter chip this section falls under.
    pub fn category(&self) -> String {
        let lower = self.title.to_lowercase();
        let mut category: String = self
            .title
            .split(' ')
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        for (keyword, label) in CATEGORY_KEYWORDS {
            if lower.contains(keyword) {
                category = label.to_string();
            }
        }
        category
    }

    /// Content without markup, for text-to-speech.
    pub fn plain_text(&self) -> String {
        let stripped = tag_re().replace_all(&self.content, " ");
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");
        space_re().replace_all(decoded.trim(), " ").into_owned()
    }

    /// Text read aloud for this section.
    pub fn speech_text(&self) -> String {
        format!("{}. {}", self.title, self.plain_text())
    }
}

/// Rename repeated ids (`x`, `x` -> `x`, `x-2`). Returns how many were renamed.
pub fn ensure_unique_ids(sections: &mut [GeneratedSection]) -> usize {
    let mut seen: HashSet<String> = HashSet::with_capacity(sections.len());
    let mut renamed = 0;
    for section in sections.iter_mut() {
        if seen.insert(section.id.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}-{n}", section.id);
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{n}", section.id);
        }
        seen.insert(candidate.clone());
        section.id = candidate;
        renamed += 1;
    }
    renamed
}

/// Append `incoming`; a section whose id already exists replaces the old one in place.
pub fn merge(existing: &mut Vec<GeneratedSection>, incoming: Vec<GeneratedSection>) {
    for section in incoming {
        match existing.iter().position(|s| s.id == section.id) {
            Some(i) => existing[i] = section,
            None => existing.push(section),
        }
    }
}

pub fn update_content(sections: &mut [GeneratedSection], id: &str, html: &str) -> bool {
    match sections.iter_mut().find(|s| s.id == id) {
        Some(section) => {
            section.content = html.to_string();
            true
        }
        None => false,
    }
}

pub fn remove(sections: &mut Vec<GeneratedSection>, id: &str) -> Option<GeneratedSection> {
    let pos = sections.iter().position(|s| s.id == id)?;
    Some(sections.remove(pos))
}

/// Filter chips: `Semua` first, then each distinct category in first-seen order.
pub fn categories(sections: &[GeneratedSection]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORY.to_string()];
    for section in sections {
        let cat = section.category();
        if !out.contains(&cat) {
            out.push(cat);
        }
    }
    out
}

pub fn filter<'a>(sections: &'a [GeneratedSection], category: &str) -> Vec<&'a GeneratedSection> {
    if category == ALL_CATEGORY {
        return sections.iter().collect();
    }
    let needle = category.to_lowercase();
    sections
        .iter()
        .filter(|s| s.title.to_lowercase().contains(&needle) || s.title.starts_with(category))
        .collect()
}

/// Sections whose id is in `ids`, in list order.
pub fn select<'a>(sections: &'a [GeneratedSection], ids: &[String]) -> Vec<&'a GeneratedSection> {
    sections.iter().filter(|s| ids.contains(&s.id)).collect()
}
