use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::backend::PathPair;
use crate::models::category::FileCategory;
use crate::models::config::{PipelineConfig, SectionName, SettingValue};
use crate::models::preset::{self, Preset, NONE_PRESET_ID, SAVED_LOGIC_PRESET_ID};
use crate::models::scan::{Role, ScanSnapshot};
use crate::models::step::StepId;
use crate::scope_path;
use crate::services::pipeline_service::PipelineEvent;
use crate::services::preset_service::PresetPlan;
use crate::state::AppState;

/// Scans both roles against the live config. `refresh` drops cached counts first.
pub(crate) async fn rescan_all(state: &AppState, refresh: bool) -> ScanSnapshot {
    let config = state.config();
    let category = config.file_category;
    if refresh {
        tokio::join!(
            state
                .scans
                .refresh(Role::Source, &config.source_dir, category, None),
            state
                .scans
                .refresh(Role::Target, &config.target_dir, category, None),
        );
    } else {
        tokio::join!(
            state.scans.scan(Role::Source, &config.source_dir, category, None),
            state.scans.scan(Role::Target, &config.target_dir, category, None),
        );
    }
    state.scans.snapshot()
}

fn schedule_override(state: &AppState, config: &PipelineConfig) {
    let (source, target) = (config.source_dir.trim(), config.target_dir.trim());
    if source.is_empty() || target.is_empty() || scope_path::is_invalid_pair(source, target) {
        return;
    }
    state.overrides.schedule(
        &state.active_preset_id(),
        PathPair {
            source: source.to_string(),
            target: target.to_string(),
        },
    );
}

async fn set_directory(state: &AppState, role: Role, path: String) -> ScanSnapshot {
    let config = state.update_config(|config| match role {
        Role::Source => config.source_dir = path,
        Role::Target => config.target_dir = path,
    });
    schedule_override(state, &config);

    let dir = match role {
        Role::Source => &config.source_dir,
        Role::Target => &config.target_dir,
    };
    state.scans.scan(role, dir, config.file_category, None).await;
    state.scans.snapshot()
}

pub async fn set_source_dir(state: &AppState, path: String) -> ScanSnapshot {
    set_directory(state, Role::Source, path).await
}

pub async fn set_target_dir(state: &AppState, path: String) -> ScanSnapshot {
    set_directory(state, Role::Target, path).await
}

pub async fn set_file_category(
    state: &AppState,
    category: FileCategory,
) -> Result<ScanSnapshot, AppError> {
    state.update_config(|config| config.file_category = category);
    state.persist_config()?;
    Ok(rescan_all(state, false).await)
}

pub fn set_dry_run(state: &AppState, is_dry_run: bool) -> Result<PipelineConfig, AppError> {
    let config = state.update_config(|config| config.is_dry_run = is_dry_run);
    state.persist_config()?;
    Ok(config)
}

pub fn update_setting(
    state: &AppState,
    section: SectionName,
    key: &str,
    value: SettingValue,
) -> Result<PipelineConfig, AppError> {
    if state.is_locked() {
        return Err(AppError::Validation(format!(
            "settings are locked while preset '{}' is active",
            state.active_preset_id()
        )));
    }
    let config = state.update_config(|config| {
        config
            .sections
            .get_mut(section)
            .insert(key.to_string(), value);
    });
    state.persist_config()?;
    Ok(config)
}

fn resolve_preset(state: &AppState, preset_id: &str) -> Result<Preset, AppError> {
    if preset_id == SAVED_LOGIC_PRESET_ID {
        return state
            .lock_presets()
            .saved_logic()
            .cloned()
            .ok_or_else(|| AppError::Validation("no saved logic to apply".to_string()));
    }
    preset::find_builtin(preset_id)
        .ok_or_else(|| AppError::Validation(format!("unknown preset: {preset_id}")))
}

/// Commits a preset plan, then pulls in any directories remembered for that preset.
async fn commit_plan(
    state: &AppState,
    preset_id: &str,
    plan: PresetPlan,
) -> Result<PipelineConfig, AppError> {
    let previous = state.config();
    *state.lock_config() = plan.config;
    state.pipeline.dispatch_all(plan.step_events);
    state.persist_config()?;
    state.persist_presets()?;

    let overrides = match state.backend.preset_overrides().await {
        Ok(overrides) => overrides,
        Err(err) => {
            warn!(preset = preset_id, error = %err, "failed to load preset overrides");
            BTreeMap::new()
        }
    };
    if let Some(pair) = overrides.get(preset_id) {
        let (source, target) = (pair.source.trim(), pair.target.trim());
        if !source.is_empty() && !target.is_empty() && !scope_path::is_invalid_pair(source, target) {
            debug!(preset = preset_id, source, target, "applying preset directories");
            state.update_config(|config| {
                config.source_dir = source.to_string();
                config.target_dir = target.to_string();
            });
        }
    }

    let config = state.config();
    if config.source_dir != previous.source_dir
        || config.target_dir != previous.target_dir
        || config.file_category != previous.file_category
    {
        rescan_all(state, false).await;
    }
    Ok(config)
}

pub async fn apply_preset(state: &AppState, preset_id: &str) -> Result<PipelineConfig, AppError> {
    let preset = resolve_preset(state, preset_id)?;
    if let Err(err) = state.overrides.flush().await {
        warn!(error = %err, "failed to flush pending preset override");
    }

    let plan = {
        let config = state.config();
        state.lock_presets().plan(&config, &preset)
    };
    info!(preset = %preset.id, locked = preset.id != NONE_PRESET_ID, "applying preset");
    commit_plan(state, &preset.id, plan).await
}

pub fn save_current_logic(state: &AppState) -> Result<Preset, AppError> {
    let config = state.config();
    let steps = state.pipeline.snapshot();
    let saved = state.lock_presets().save_current_logic(&config, &steps);
    state.persist_presets()?;
    info!("saved current logic");
    Ok(saved)
}

/// Returns `None` when nothing has been saved yet.
pub async fn use_saved_logic(state: &AppState) -> Result<Option<PipelineConfig>, AppError> {
    let plan = {
        let config = state.config();
        state.lock_presets().use_saved_logic(&config)
    };
    match plan {
        Some(plan) => commit_plan(state, SAVED_LOGIC_PRESET_ID, plan)
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// Reopens one step for editing: its results are dropped and every scan starts over.
pub async fn adjust_configuration(state: &AppState, step: StepId) -> ScanSnapshot {
    state
        .pipeline
        .dispatch_all([PipelineEvent::Reset(step), PipelineEvent::Activated(step)]);
    state.scans.reset();
    rescan_all(state, false).await
}

pub async fn refresh_scans(state: &AppState) -> ScanSnapshot {
    rescan_all(state, true).await
}
