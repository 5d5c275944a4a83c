//! Chat Layout - Script Replay Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use chat_layout::config::CompensationAnchor;

/// Chat Layout - replay host interactions against the layout engine
#[derive(Parser, Debug)]
#[command(name = "chat-layout")]
#[command(version)]
#[command(about = "Replay a JSON script of batch updates and measurements, printing the resulting layout")]
pub struct Args {
    /// Path to the JSON replay script
    pub script: PathBuf,

    /// Override the compensation anchor (disabled, top or bottom)
    #[arg(short, long)]
    pub anchor: Option<CompensationAnchor>,

    /// Print the report on a single line
    #[arg(long)]
    pub compact: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = chat_layout::config::load_config_with_precedence(args.config.clone())?;
        let merged = chat_layout::config::merge_config(config_file);
        let with_env = chat_layout::config::apply_env_overrides(merged);
        chat_layout::config::apply_cli_overrides(with_env, args.anchor, args.log_file.clone())
    };

    chat_layout::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let script = chat_layout::integration::load_script(&args.script)?;
    let settings = chat_layout::integration::resolve_settings(&script, config.settings, args.anchor);
    let report = chat_layout::integration::replay(&script, settings)?;

    let output = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{output}");

    Ok(())
}
