/*
cargo run --bin speak_sections -- out/fisika_10_sections.json out/audio --id kunci_jawaban
*/

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::{fs, path::PathBuf};

use guru_gen::audio::{PlaybackAction, SpeechSession};
use guru_gen::cli::ApiArgs;
use guru_gen::GeneratedSection;

#[derive(Parser, Debug)]
#[command(version, about = "Read generated sections aloud (raw 24 kHz mono s16le files)")]
struct Cli {
    sections: PathBuf,
    out_dir: PathBuf,

    /// Only these section ids (repeatable)
    #[arg(long = "id")]
    ids: Vec<String>,

    #[command(flatten)]
    api: ApiArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.api.init_logging("speak_sections")?;

    let raw = fs::read_to_string(&cli.sections)
        .with_context(|| format!("failed to read {}", cli.sections.display()))?;
    let sections: Vec<GeneratedSection> = serde_json::from_str(&raw)?;
    let picked: Vec<&GeneratedSection> = if cli.ids.is_empty() {
        sections.iter().collect()
    } else {
        guru_gen::section::select(&sections, &cli.ids)
    };
    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;

    let client = cli.api.client()?;
    let mut session = SpeechSession::new();

    let bar = ProgressBar::new(picked.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )?);

    let mut written = 0usize;
    for s in picked {
        bar.inc(1);
        if let PlaybackAction::Unavailable = session.toggle(&s.id) {
            log::warn!("skipping {}: speech disabled for this session", s.id);
            continue;
        }

        match client.text_to_speech(&s.speech_text()).await {
            Ok(clip) => {
                let path = cli.out_dir.join(format!("{}.pcm", s.id));
                fs::write(&path, &clip.pcm)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                log::info!(
                    "{} -> {} ({:.1}s, peak {:.2})",
                    s.id,
                    path.display(),
                    clip.audio.duration().as_secs_f64(),
                    clip.audio.peak()
                );
                session.finished(&s.id);
                written += 1;
            }
            Err(e) => {
                if session.record_failure(&s.id, &e) {
                    bar.println("speech quota exhausted, skipping remaining sections");
                }
            }
        }
    }
    bar.finish_with_message("done");

    println!("{written} audio file(s) written to {}", cli.out_dir.display());
    Ok(())
}
