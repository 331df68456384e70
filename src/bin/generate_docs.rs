/*
cargo run --release --bin generate_docs -- \
  --mode question-bank \
  forms/fisika_10.json \
  out/fisika_10_sections.json \
  --doc out/fisika_10.doc
*/

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::{fs, path::PathBuf};
use tokio::time::{sleep, Duration};

use guru_gen::cli::{ctrl_c_token, ApiArgs};
use guru_gen::export;
use guru_gen::prefs::{self, Preferences};
use guru_gen::section::{self, GeneratedSection};
use guru_gen::{GenError, GenerationMode, GenerationParameters};

// command-line args
#[derive(Parser, Debug)]
#[command(version, about = "Generate curriculum documents or question banks with Gemini")]
struct Cli {
    /// admin | question-bank | exam
    #[arg(long, default_value = "question-bank")]
    mode: GenerationMode,

    /// Form parameters (JSON)
    params: PathBuf,

    /// Generated sections (JSON)
    output: PathBuf,

    /// Also export all sections to a .doc file
    #[arg(long)]
    doc: Option<PathBuf>,

    /// Merge into an existing sections file instead of overwriting it
    #[arg(long)]
    append: bool,

    /// Preferences file (defaults to the user config dir)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Don't save this form's school profile
    #[arg(long)]
    no_remember: bool,

    #[command(flatten)]
    api: ApiArgs,
}

// seconds between stage messages on the spinner
const STEP_SECS: u64 = 4;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.api.init_logging(&format!("generate_docs_{}", cli.mode))?;

    // form + saved preferences
    let raw = fs::read_to_string(&cli.params)
        .with_context(|| format!("failed to read {}", cli.params.display()))?;
    let mut params: GenerationParameters = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", cli.params.display()))?;

    let prefs_path = cli.prefs.clone().unwrap_or_else(prefs::default_path);
    let mut saved = Preferences::load(&prefs_path);
    saved.apply_to(&mut params, cli.mode);
    params.resolve_phase();
    params.validate(cli.mode)?;

    let client = cli.api.client()?;
    let cancel = ctrl_c_token();

    // spinner walks through the stage messages while the request is pending
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}",
    )?);
    bar.enable_steady_tick(Duration::from_millis(120));
    let steps = cli.mode.progress_steps();
    let ticker = {
        let bar = bar.clone();
        tokio::spawn(async move {
            for (pct, msg) in steps {
                bar.set_position(u64::from(*pct));
                bar.set_message(*msg);
                sleep(Duration::from_secs(STEP_SECS)).await;
            }
        })
    };

    let result = client.generate(&params, cli.mode, Some(&cancel)).await;
    ticker.abort();

    let sections = match result {
        Ok(sections) => {
            bar.set_position(100);
            bar.finish_with_message("done");
            sections
        }
        Err(e) => {
            bar.abandon_with_message("failed");
            log::error!("generation failed: {e}");
            if matches!(e, GenError::Canceled) {
                println!("generation canceled");
                return Ok(());
            }
            return Err(e).context("generation failed");
        }
    };

    // merge / write out
    let mut all: Vec<GeneratedSection> = Vec::new();
    if cli.append && cli.output.exists() {
        let existing = fs::read_to_string(&cli.output)
            .with_context(|| format!("failed to read {}", cli.output.display()))?;
        all = serde_json::from_str(&existing)
            .with_context(|| format!("failed to parse {}", cli.output.display()))?;
    }
    section::merge(&mut all, sections);

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&cli.output, serde_json::to_string_pretty(&all)?)?;
    log::info!("{} section(s) written to {}", all.len(), cli.output.display());

    if let Some(doc) = &cli.doc {
        let refs: Vec<&GeneratedSection> = all.iter().collect();
        export::export_sections(doc, &refs, &params, cli.mode)
            .with_context(|| format!("failed to export {}", doc.display()))?;
        println!("document exported to {}", doc.display());
    }

    if !cli.no_remember {
        saved.remember(&params);
        if let Err(e) = saved.save(&prefs_path) {
            log::warn!("could not save preferences: {e}");
        }
    }

    for s in &all {
        println!("  [{}] {}", s.id, s.title);
    }
    println!("{} section(s) written to {}", all.len(), cli.output.display());
    Ok(())
}
