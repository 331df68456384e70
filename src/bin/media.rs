/*
cargo run --bin media -- image-gen "diagram siklus air untuk kelas 10" --out out/siklus.png
cargo run --bin media -- image-edit foto.jpg "tambahkan label bagian-bagian" --out out/label.png
cargo run --bin media -- frames-analyze "apa yang terjadi di video ini?" f1.jpg f2.jpg f3.jpg
cargo run --bin media -- video-gen "animasi gerak parabola" --aspect 16:9
cargo run --bin media -- video-status models/veo-3.1-fast-generate-preview/operations/abc --wait
*/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::time::Duration;

use guru_gen::cli::{ctrl_c_token, ApiArgs};
use guru_gen::gemini::media::{InlineData, VideoAspect, VideoOperation, VIDEO_POLL_INTERVAL};

#[derive(Parser, Debug)]
#[command(version, about = "Image and video helpers for teaching material")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate a square image from a prompt
    ImageGen {
        prompt: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Edit an existing image
    ImageEdit {
        image: PathBuf,
        prompt: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Describe an image
    ImageAnalyze { image: PathBuf, prompt: String },
    /// Describe a video from sampled frames (in order)
    FramesAnalyze {
        prompt: String,
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
    /// Start a video generation
    VideoGen {
        prompt: String,
        /// Optional starting image
        #[arg(long)]
        image: Option<PathBuf>,
        /// 16:9 | 9:16
        #[arg(long, default_value = "16:9")]
        aspect: VideoAspect,
    },
    /// Check (or wait for) a video generation
    VideoStatus {
        name: String,
        #[arg(long)]
        wait: bool,
        #[arg(long, default_value_t = VIDEO_POLL_INTERVAL.as_secs())]
        poll_secs: u64,
    },
}

fn write_image(img: &InlineData, out: &Path) -> Result<()> {
    let bytes = img.decode()?;
    fs::write(out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    log::info!("{} bytes of {} written to {}", bytes.len(), img.mime_type, out.display());
    println!("image written to {} ({})", out.display(), img.mime_type);
    Ok(())
}

fn print_operation(op: &VideoOperation) {
    println!("operation: {}", op.name);
    println!("done: {}", op.done);
    if let Some(err) = &op.error {
        println!("error: {err}");
    }
    for uri in &op.video_uris {
        println!("video: {uri}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.api.init_logging("media")?;
    let client = cli.api.client()?;

    match cli.cmd {
        Cmd::ImageGen { prompt, out } => {
            let img = client.generate_image(&prompt).await.context("image generation failed")?;
            write_image(&img, &out)?;
        }
        Cmd::ImageEdit { image, prompt, out } => {
            let src = InlineData::from_file(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            let img = client.edit_image(&src, &prompt).await.context("image edit failed")?;
            write_image(&img, &out)?;
        }
        Cmd::ImageAnalyze { image, prompt } => {
            let src = InlineData::from_file(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            let text = client.analyze_image(&src, &prompt).await?;
            println!("{text}");
        }
        Cmd::FramesAnalyze { prompt, frames } => {
            let frames = frames
                .iter()
                .map(|p| {
                    InlineData::from_file(p).with_context(|| format!("failed to read {}", p.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let text = client.analyze_video_frames(&frames, &prompt).await?;
            println!("{text}");
        }
        Cmd::VideoGen { prompt, image, aspect } => {
            let start = match &image {
                Some(path) => Some(
                    InlineData::from_file(path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let op = client
                .generate_video(&prompt, start.as_ref(), aspect)
                .await
                .context("video generation failed to start")?;
            print_operation(&op);
        }
        Cmd::VideoStatus { name, wait, poll_secs } => {
            let op = if wait {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] {msg}",
                )?);
                spinner.set_message("waiting for video...");
                spinner.enable_steady_tick(Duration::from_millis(120));
                let cancel = ctrl_c_token();
                let op = client
                    .wait_for_video(&name, Duration::from_secs(poll_secs.max(1)), Some(&cancel))
                    .await;
                spinner.finish_and_clear();
                op?
            } else {
                client.check_video_operation(&name).await?
            };
            print_operation(&op);
            if op.done && op.error.is_some() {
                bail!("video generation failed");
            }
        }
    }
    Ok(())
}
