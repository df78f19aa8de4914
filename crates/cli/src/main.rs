//! otto-studio CLI
//!
//! Command-line front end for AI product-photo backgrounds: scene ideas,
//! background generation and follow-up edits, all driven through the
//! workflow controller.

mod export;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use llm_bridge::GeminiClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio_core::codec::load_image_file;
use studio_core::{ImageFile, SettingKey, WorkflowController, WorkflowError};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("BUILT_GIT_COMMIT_HASH"),
    "\nhost: ",
    env!("BUILT_HOST"),
    "\nbuilt: ",
    env!("BUILT_TIME_UTC"),
);

#[derive(Parser)]
#[command(name = "otto-studio")]
#[command(about = "AI-powered backgrounds for your product photos", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest scene ideas from a description or a style reference image
    Ideas {
        /// Free-text description of the desired scene
        #[arg(long, conflicts_with = "style_image", required_unless_present = "style_image")]
        text: Option<String>,

        /// Reference image whose mood and environment inspire the ideas
        #[arg(long)]
        style_image: Option<PathBuf>,
    },

    /// Replace the background of a product photo, then apply edits
    Generate(GenerateArgs),

    /// List the accepted lighting, aspect ratio and camera options
    Options,
}

#[derive(Args)]
struct GenerateArgs {
    /// Product image (PNG, JPEG, WebP, ...)
    #[arg(short, long)]
    product: PathBuf,

    /// Scene description for the new background
    #[arg(long, required_unless_present = "idea_from")]
    prompt: Option<String>,

    /// Ask for scene ideas from this description and use one as the prompt
    #[arg(long, conflicts_with = "prompt")]
    idea_from: Option<String>,

    /// Which suggested idea to use (1-based)
    #[arg(long, default_value_t = 1)]
    pick: usize,

    #[arg(long, default_value = "Soft")]
    lighting: String,

    #[arg(long, default_value = "1:1")]
    aspect_ratio: String,

    #[arg(long, default_value = "Eye-level")]
    camera: String,

    /// Follow-up edit instruction; repeat to apply several in order
    #[arg(long = "edit")]
    edits: Vec<String>,

    /// Directory for exported images
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also export every intermediate result
    #[arg(long)]
    keep_history: bool,

    /// Print the session history as JSON (without image data)
    #[arg(long)]
    json: bool,
}

/// Surface the display-ready message rather than the internal chain
fn user_facing(err: WorkflowError) -> anyhow::Error {
    anyhow!(err.user_message())
}

fn load_required(path: &Path) -> Result<ImageFile> {
    load_image_file(path)?.with_context(|| format!("{} is not a supported image", path.display()))
}

fn controller_from_env() -> Result<WorkflowController> {
    let client = GeminiClient::from_env()?;
    tracing::debug!(
        "Gemini endpoint {} with models {} / {}",
        client.config().base_url,
        client.config().text_model,
        client.config().image_model
    );
    Ok(WorkflowController::new(Arc::new(client)))
}

fn print_ideas(ideas: &[String]) {
    if ideas.is_empty() {
        println!("No scene ideas were returned.");
    }
    for (index, idea) in ideas.iter().enumerate() {
        println!("{}. {}", index + 1, idea);
    }
}

async fn run_ideas(text: Option<String>, style_image: Option<PathBuf>) -> Result<()> {
    let controller = controller_from_env()?;

    let ideas = match (text, style_image) {
        (Some(text), _) => controller.request_ideas_from_text(&text).await,
        (None, Some(path)) => controller.request_ideas_from_image(load_required(&path)?).await,
        (None, None) => bail!("Provide --text or --style-image"),
    }
    .map_err(user_facing)?;

    print_ideas(&ideas);
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let controller = controller_from_env()?;

    controller
        .upload(load_required(&args.product)?)
        .map_err(user_facing)?;
    controller
        .set_setting(SettingKey::Lighting, &args.lighting)
        .map_err(user_facing)?;
    controller
        .set_setting(SettingKey::AspectRatio, &args.aspect_ratio)
        .map_err(user_facing)?;
    controller
        .set_setting(SettingKey::CameraPerspective, &args.camera)
        .map_err(user_facing)?;

    match (&args.prompt, &args.idea_from) {
        (Some(prompt), _) => controller.set_custom_prompt(prompt.as_str()),
        (None, Some(description)) => {
            let ideas = controller
                .request_ideas_from_text(description)
                .await
                .map_err(user_facing)?;
            print_ideas(&ideas);
            let index = args.pick.checked_sub(1).context("--pick starts at 1")?;
            let idea = controller.use_idea(index).map_err(user_facing)?;
            println!("Using idea {}: {}", args.pick, idea);
        }
        (None, None) => bail!("Provide --prompt or --idea-from"),
    }

    let generated = controller
        .generate_from_settings()
        .await
        .map_err(user_facing)?;
    tracing::info!("Generated {}", generated.id);

    for edit in &args.edits {
        let edited = controller.edit(edit).await.map_err(user_facing)?;
        tracing::info!("Applied edit \"{}\" -> {}", edit, edited.id);
    }

    let now = chrono::Utc::now();
    if args.keep_history {
        for path in export::save_history(&controller.history(), &args.output_dir, now)? {
            println!("Saved {}", path.display());
        }
    }

    let current = controller
        .current()
        .context("No generated image to save")?;
    let path = export::save_image(&current, &args.output_dir, now)?;
    println!("Saved {}", path.display());

    if args.json {
        let summary: Vec<serde_json::Value> = controller
            .history()
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.id,
                    "prompt": entry.prompt,
                    "settings": entry.settings,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn print_options() {
    for key in SettingKey::ALL {
        println!("{}: {}", key.as_str(), key.options().join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    tracing::debug!(
        "otto-studio {} (rustc {})",
        built_info::PKG_VERSION,
        built_info::RUSTC_VERSION
    );

    match cli.command {
        Commands::Ideas { text, style_image } => run_ideas(text, style_image).await,
        Commands::Generate(args) => run_generate(args).await,
        Commands::Options => {
            print_options();
            Ok(())
        }
    }
}
