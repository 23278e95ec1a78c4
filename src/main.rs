//! chatpane - a terminal chat client with scroll anchoring and pictograms.
//!
//! # Usage
//!
//! ```bash
//! chatpane feeds.json
//! chatpane --watch --user sam feeds.json
//! chatpane --media-timeout-ms 500 feeds.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chatpane::app::App;
use chatpane::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use chatpane::feed::AnchorConfig;
use chatpane::perf;

/// A terminal chat client with scroll anchoring and pictograms
#[derive(Parser, Debug)]
#[command(name = "chatpane", version, about, long_about = None)]
struct Cli {
    /// Transcript (JSON) to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Reload the transcript when it changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Show sequences like :) as typed instead of as pictograms
    #[arg(long)]
    no_pictograms: bool,

    /// Sender id of the local user (defaults to the transcript's)
    #[arg(long, value_name = "ID")]
    user: Option<String>,

    /// Longest wait for media before first paint
    #[arg(long, value_name = "MS")]
    media_timeout_ms: Option<u64>,

    /// Rows from the bottom at which reading back locks the scroll
    #[arg(long, value_name = "ROWS")]
    engage_distance: Option<f64>,

    /// Rows from the bottom at which the scroll lock releases
    #[arg(long, value_name = "ROWS")]
    disengage_distance: Option<f64>,

    /// New messages follow the bottom only within this many rows of it
    #[arg(long, value_name = "ROWS")]
    near_bottom_distance: Option<f64>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed anchor/composer debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("CHATPANE_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let mut app = App::new(cli.file)
        .with_watch(effective.watch)
        .with_pictograms(!effective.no_pictograms)
        .with_anchor_config(effective.anchor_config(AnchorConfig::terminal()))
        .with_local_user(effective.user.clone())
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}
