/*
cargo run --bin grounded_search -- "jadwal asesmen nasional 2025"
cargo run --bin grounded_search -- --tool maps --lat -6.9 --lng 107.6 "perpustakaan umum terdekat"
*/

use anyhow::{bail, Context, Result};
use clap::Parser;

use guru_gen::cli::{ctrl_c_token, ApiArgs};
use guru_gen::gemini::{LatLng, SearchTool};

#[derive(Parser, Debug)]
#[command(version, about = "Search-grounded question answering")]
struct Cli {
    query: String,

    /// web | maps
    #[arg(long, default_value = "web")]
    tool: SearchTool,

    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// Print the answer as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    api: ApiArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.api.init_logging("grounded_search")?;

    let location = match (cli.lat, cli.lng) {
        (Some(latitude), Some(longitude)) => Some(LatLng { latitude, longitude }),
        _ => None,
    };
    if location.is_some() && cli.tool == SearchTool::Web {
        bail!("--lat/--lng only apply to --tool maps");
    }

    let client = cli.api.client()?;
    let cancel = ctrl_c_token();
    let answer = client
        .grounded_search(&cli.query, cli.tool, location, Some(&cancel))
        .await
        .context("grounded search failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!("\nSources:");
        for (i, s) in answer.sources.iter().enumerate() {
            println!("  {}. {} <{}>", i + 1, s.title, s.uri);
        }
    }
    Ok(())
}
