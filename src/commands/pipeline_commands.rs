use tracing::debug;

use crate::error::AppError;
use crate::models::config::PipelineConfig;
use crate::models::step::{StepId, StepStatus};
use crate::scope_path;
use crate::services::consolidation_service::{self, FileStats, Manifest};
use crate::services::execution_service::BatchReport;
use crate::services::pipeline_service::{PipelineEvent, PipelineState};
use crate::state::AppState;

/// `Ok(None)` means there is nothing to run against yet.
fn runnable_config(state: &AppState) -> Result<Option<PipelineConfig>, AppError> {
    let config = state.config();
    if config.source_dir.trim().is_empty() {
        return Ok(None);
    }
    scope_path::validate_pair(&config.source_dir, &config.target_dir)?;
    Ok(Some(config))
}

pub fn get_pipeline(state: &AppState) -> PipelineState {
    state.pipeline.snapshot()
}

/// Returns whether the step changed. Toggles are ignored while a preset is active.
pub fn toggle_step(state: &AppState, id: StepId) -> bool {
    if state.is_locked() {
        debug!(step = %id, preset = %state.active_preset_id(), "toggle ignored while locked");
        return false;
    }
    state.pipeline.dispatch(PipelineEvent::Toggled(id))
}

pub async fn run_step(state: &AppState, id: StepId) -> Result<Option<StepStatus>, AppError> {
    let Some(config) = runnable_config(state)? else {
        return Ok(None);
    };
    Ok(state.execution.run_step(id, &config).await)
}

pub async fn run_all(state: &AppState) -> Result<BatchReport, AppError> {
    let Some(config) = runnable_config(state)? else {
        return Ok(BatchReport::default());
    };
    let (enabled, all) = state
        .pipeline
        .read(|pipeline| (pipeline.enabled_processing_ids(), pipeline.processing_ids()));
    Ok(state.execution.run_all(&enabled, &all, &config).await)
}

pub fn get_manifest(state: &AppState) -> Manifest {
    state
        .pipeline
        .read(consolidation_service::build_manifest)
}

pub fn get_file_stats(state: &AppState) -> FileStats {
    state.pipeline.read(consolidation_service::file_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::config_commands;
    use crate::models::step::{ChangeStatus, FileChange};
    use crate::services::backend_client::testing::step_ok;
    use crate::state::testing::scripted_state;

    #[tokio::test]
    async fn toggle_is_a_no_op_while_locked() {
        let (_, state) = scripted_state();
        config_commands::apply_preset(&state, "rename_only").await.unwrap();
        let before = state.pipeline.snapshot().step(StepId::Transfer).unwrap().enabled;

        assert!(!toggle_step(&state, StepId::Transfer));
        assert_eq!(
            state.pipeline.snapshot().step(StepId::Transfer).unwrap().enabled,
            before
        );

        config_commands::apply_preset(&state, "none").await.unwrap();
        assert!(toggle_step(&state, StepId::Transfer));
        assert_ne!(
            state.pipeline.snapshot().step(StepId::Transfer).unwrap().enabled,
            before
        );
    }

    #[tokio::test]
    async fn identical_directories_fail_before_any_request() {
        let (backend, state) = scripted_state();
        state.update_config(|c| {
            c.source_dir = "/photos".to_string();
            c.target_dir = "/photos/".to_string();
        });

        assert!(matches!(
            run_all(&state).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            run_step(&state, StepId::Group).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn empty_source_is_a_silent_no_op() {
        let (backend, state) = scripted_state();
        assert_eq!(run_step(&state, StepId::Group).await.unwrap(), None);
        assert_eq!(run_all(&state).await.unwrap(), BatchReport::default());
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn run_all_feeds_the_manifest() {
        let (backend, state) = scripted_state();
        state.update_config(|c| {
            c.source_dir = "/in".to_string();
            c.target_dir = "/out".to_string();
        });
        toggle_step(&state, StepId::Group);
        backend.script_batch(Ok(vec![
            step_ok(
                StepId::Standardize,
                vec![FileChange::new("x.jpg", "x.jpg", ChangeStatus::Success)],
            ),
            step_ok(
                StepId::Filename,
                vec![FileChange::new("x.jpg", "1993-07-12_x.jpg", ChangeStatus::Success)],
            ),
        ]));

        let report = run_all(&state).await.unwrap();

        assert_eq!(report.cleared, vec![StepId::Group]);
        assert_eq!(
            backend.batch_calls(),
            vec![vec![
                StepId::Standardize,
                StepId::Deduplicate,
                StepId::Filename,
                StepId::Transfer
            ]]
        );
        let manifest = get_manifest(&state);
        assert_eq!(manifest.get("x.jpg").unwrap().new, "1993-07-12_x.jpg");
        assert_eq!(get_file_stats(&state).photos, 1);
    }
}
