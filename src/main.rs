use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use file_organizer_lib::commands::{config_commands, file_commands, pipeline_commands};
use file_organizer_lib::models::category::FileCategory;
use file_organizer_lib::models::scan::Role;
use file_organizer_lib::settings::AppSettings;
use file_organizer_lib::{init_state, logging};

#[derive(Parser)]
#[command(version, about = "Run the file-organizing pipeline against a backend")]
struct Opts {
    /// Directory whose files are processed
    #[arg(long)]
    source: String,
    /// Directory that receives the organized files
    #[arg(long)]
    target: String,
    /// Only count and process files of this kind (photos, video, audio, docs, code, others)
    #[arg(long)]
    category: Option<FileCategory>,
    /// Preset to apply before running
    #[arg(long)]
    preset: Option<String>,
    /// Touch the disk instead of previewing changes
    #[arg(long)]
    apply: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    logging::init_logger();

    let settings = AppSettings::from_env().context("reading settings")?;
    let state = init_state(&settings).context("initializing local state")?;

    let health = file_commands::health_check(&state).await;
    if !health.ok {
        bail!(
            "backend at {} is unavailable: {}",
            settings.backend_url,
            health.error.unwrap_or_default()
        );
    }

    if let Some(preset) = opts.preset.as_deref() {
        config_commands::apply_preset(&state, preset).await?;
    }
    config_commands::set_target_dir(&state, opts.target).await;
    config_commands::set_source_dir(&state, opts.source).await;
    if let Some(category) = opts.category {
        config_commands::set_file_category(&state, category).await?;
    }
    config_commands::set_dry_run(&state, !opts.apply)?;

    for role in Role::ALL {
        state.scans.settle(role).await;
    }
    let scans = state.scans.snapshot();
    info!(
        source = scans.view(Role::Source).count,
        target = scans.view(Role::Target).count,
        "directories scanned"
    );

    let report = pipeline_commands::run_all(&state).await?;
    if let Err(err) = state.overrides.flush().await {
        warn!(error = %err, "failed to persist directory override");
    }

    let output = json!({
        "scans": scans,
        "report": report,
        "manifest": pipeline_commands::get_manifest(&state),
        "stats": pipeline_commands::get_file_stats(&state),
        "undo": state.undo.availability(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
