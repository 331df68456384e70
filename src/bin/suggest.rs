/*
cargo run --bin suggest -- --kind topic forms/fisika_10.json --out out/topics.md
*/

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};

use guru_gen::cli::{ctrl_c_token, ApiArgs};
use guru_gen::prompt::SuggestionKind;
use guru_gen::GenerationParameters;

#[derive(Parser, Debug)]
#[command(version, about = "Ask Gemini for curriculum-element or topic suggestions")]
struct Cli {
    /// cp | topic
    #[arg(long, default_value = "topic")]
    kind: SuggestionKind,

    params: PathBuf,

    /// Write the Markdown answer here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    api: ApiArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.api.init_logging("suggest")?;

    let raw = fs::read_to_string(&cli.params)
        .with_context(|| format!("failed to read {}", cli.params.display()))?;
    let mut params: GenerationParameters = serde_json::from_str(&raw)?;
    params.resolve_phase();

    let client = cli.api.client()?;
    let cancel = ctrl_c_token();
    let text = client
        .suggest(&params, cli.kind, Some(&cancel))
        .await
        .context("suggestion request failed")?;

    match &cli.out {
        Some(path) => {
            fs::write(path, &text)?;
            println!("suggestions written to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
