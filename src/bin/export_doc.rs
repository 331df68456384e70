/*
cargo run --bin export_doc -- out/fisika_10_sections.json forms/fisika_10.json out/soal.doc --category Soal
*/

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};

use guru_gen::export;
use guru_gen::section::{self, GeneratedSection, ALL_CATEGORY};
use guru_gen::{GenerationMode, GenerationParameters};

#[derive(Parser, Debug)]
#[command(version, about = "Export generated sections to a word-processor document")]
struct Cli {
    sections: PathBuf,
    params: PathBuf,
    output: PathBuf,

    /// Page-break rules follow this mode
    #[arg(long, default_value = "question-bank")]
    mode: GenerationMode,

    /// Only sections in this category (see the listed categories)
    #[arg(long, default_value = ALL_CATEGORY)]
    category: String,

    /// Only these section ids (repeatable)
    #[arg(long = "id")]
    ids: Vec<String>,

    /// Print the document as a data URI as well
    #[arg(long)]
    data_uri: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    guru_gen::logging::init(&cli.log_dir, "export_doc")?;

    let raw = fs::read_to_string(&cli.sections)
        .with_context(|| format!("failed to read {}", cli.sections.display()))?;
    let sections: Vec<GeneratedSection> = serde_json::from_str(&raw)?;
    let raw = fs::read_to_string(&cli.params)
        .with_context(|| format!("failed to read {}", cli.params.display()))?;
    let params: GenerationParameters = serde_json::from_str(&raw)?;

    println!("categories: {}", section::categories(&sections).join(", "));

    let mut picked = section::filter(&sections, &cli.category);
    if !cli.ids.is_empty() {
        picked.retain(|s| cli.ids.contains(&s.id));
    }
    if picked.is_empty() {
        bail!("nothing to export for category {:?}", cli.category);
    }

    if cli.output.extension().and_then(|e| e.to_str()) != Some(export::DOC_EXTENSION) {
        log::warn!("{} does not end in .{}", cli.output.display(), export::DOC_EXTENSION);
    }
    let html = export::export_sections(&cli.output, &picked, &params, cli.mode)
        .with_context(|| format!("failed to export {}", cli.output.display()))?;
    if cli.data_uri {
        println!("{}", export::to_data_uri(&html));
    }
    println!("{} section(s) exported to {}", picked.len(), cli.output.display());
    Ok(())
}

