//! Word-processor export: sections wrapped in an Office-flavoured HTML page
//! saved with a `.doc` extension.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::params::{GenerationParameters, OutputLanguage};
use crate::prompt::GenerationMode;
use crate::section::GeneratedSection;

pub const DOC_MIME: &str = "application/vnd.ms-word";
pub const DOC_EXTENSION: &str = "doc";

const PAGE_BREAK: &str = "<br style=\"page-break-after: always;\">";

fn styles(language: OutputLanguage) -> String {
    let direction = if language.is_rtl() { "rtl" } else { "ltr" };
    let cell_align = if language.is_rtl() {
        "th, td { text-align: right; }"
    } else {
        ""
    };
    format!(
        r#"
        @page WordSection1 {{
            size: 8.5in 14.0in;
            margin: 1.5cm;
            mso-header-margin:.5in;
            mso-footer-margin:.5in;
            mso-paper-source:0;
        }}
        div.WordSection1 {{
            page: WordSection1;
        }}
        body {{ font-family: 'Times New Roman', serif; direction: {direction}; font-size: 10pt; }}
        table {{
            border-collapse: collapse;
            width: 100%;
            table-layout: auto;
        }}
        th, td {{
            border: 1px solid black;
            padding: 4px;
            text-align: left;
            vertical-align: top;
            word-wrap: break-word;
            overflow-wrap: break-word;
        }}
        th {{
            background-color: #f2f2f2;
            text-align: center;
            font-weight: bold;
        }}
        h1, h2, h3, h4 {{
            font-family: 'Arial', sans-serif;
            page-break-after: avoid;
        }}
        {cell_align}
    "#
    )
}

/// Escape text placed into markup; section content is already HTML and is left alone.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Full document around an already joined HTML body.
pub fn render_document(title: &str, body_html: &str, language: OutputLanguage) -> String {
    let class = if language.is_rtl() {
        "WordSection1 arabic-font-preview"
    } else {
        "WordSection1"
    };
    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>\n\
         <head>\n<meta charset='utf-8'>\n<title>{title}</title>\n<style>{styles}</style>\n</head>\n\
         <body>\n<div class=\"{class}\">\n{body_html}</div></body></html>",
        title = escape_html(title),
        styles = styles(language)
    )
}

/// `<h2>title</h2>content` per section; administrative documents each start on a new page.
pub fn join_sections(sections: &[&GeneratedSection], mode: GenerationMode) -> String {
    let separator = match mode {
        GenerationMode::Administrative => PAGE_BREAK,
        GenerationMode::QuestionBank | GenerationMode::ComprehensiveExam => "",
    };
    sections
        .iter()
        .map(|s| format!("<h2>{}</h2>{}", escape_html(&s.title), s.content))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Base name for a multi-section download.
pub fn selection_file_name(params: &GenerationParameters) -> String {
    format!("{}_Kelas_{}_Pilihan", params.subject, params.grade)
}

/// Base name for a single-section download.
pub fn section_file_name(params: &GenerationParameters, section: &GeneratedSection) -> String {
    format!("{}_{}", params.subject, section.title.replace(' ', "_"))
}

pub fn to_data_uri(html: &str) -> String {
    format!("data:{DOC_MIME};charset=utf-8,{}", urlencoding::encode(html))
}

pub fn write_doc(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    log::info!("exported {} bytes to {}", html.len(), path.display());
    Ok(())
}

/// Render and write the selected sections in one go.
pub fn export_sections(
    path: &Path,
    sections: &[&GeneratedSection],
    params: &GenerationParameters,
    mode: GenerationMode,
) -> Result<String> {
    let title = match sections {
        [single] => section_file_name(params, single),
        _ => selection_file_name(params),
    };
    let html = render_document(&title, &join_sections(sections, mode), params.language);
    write_doc(path, &html)?;
    Ok(html)
}
