use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::config::PipelineConfig;
use crate::models::preset::{self, Preset, SAVED_LOGIC_PRESET_ID};
use crate::services::backend_client::Backend;
use crate::services::execution_service::ExecutionCoordinator;
use crate::services::override_service::OverrideWriter;
use crate::services::persistence_service;
use crate::services::pipeline_service::{PipelineState, PipelineStore};
use crate::services::preset_service::{self, PresetResolver};
use crate::services::scan_service::ScanCoordinator;
use crate::services::undo_service::UndoService;

pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub db: Mutex<Connection>,
    pub config: Mutex<PipelineConfig>,
    pub presets: Mutex<PresetResolver>,
    pub pipeline: Arc<PipelineStore>,
    pub scans: ScanCoordinator,
    pub undo: Arc<UndoService>,
    pub overrides: OverrideWriter,
    pub execution: ExecutionCoordinator,
}

impl AppState {
    /// Wires the coordinators around `backend` and restores what the last session saved.
    pub fn new(backend: Arc<dyn Backend>, conn: Connection) -> Self {
        let config = persistence_service::load_config(&conn).unwrap_or_default();
        let saved_logic = persistence_service::load_saved_logic(&conn);
        let active = persistence_service::load_active_preset(&conn)
            .and_then(|id| restored_preset(&id, saved_logic.as_ref()))
            .unwrap_or_else(Preset::none);
        info!(active_preset = %active.id, "restored local state");

        // A locked pipeline must come back with the step choices of its preset.
        let mut steps = PipelineState::new();
        for event in preset_service::step_events(&active) {
            steps.apply(event);
        }
        let pipeline = Arc::new(PipelineStore::new(steps));
        let undo = Arc::new(UndoService::new(backend.clone()));
        Self {
            scans: ScanCoordinator::new(backend.clone()),
            overrides: OverrideWriter::new(backend.clone()),
            execution: ExecutionCoordinator::new(backend.clone(), pipeline.clone(), undo.clone()),
            backend,
            db: Mutex::new(conn),
            config: Mutex::new(config),
            presets: Mutex::new(PresetResolver::new(active.id, saved_logic)),
            pipeline,
            undo,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.lock_config().clone()
    }

    /// Edits the live config in place and returns the result.
    pub fn update_config(&self, edit: impl FnOnce(&mut PipelineConfig)) -> PipelineConfig {
        let mut config = self.lock_config();
        edit(&mut config);
        config.clone()
    }

    pub fn active_preset_id(&self) -> String {
        self.lock_presets().active_preset_id().to_string()
    }

    pub fn is_locked(&self) -> bool {
        self.lock_presets().is_locked()
    }

    pub fn lock_config(&self) -> MutexGuard<'_, PipelineConfig> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lock_presets(&self) -> MutexGuard<'_, PresetResolver> {
        self.presets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lock_db(&self) -> MutexGuard<'_, Connection> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn persist_config(&self) -> Result<(), AppError> {
        let config = self.config();
        persistence_service::save_config(&self.lock_db(), &config)
    }

    pub fn persist_presets(&self) -> Result<(), AppError> {
        let (active, saved) = {
            let presets = self.lock_presets();
            (
                presets.active_preset_id().to_string(),
                presets.saved_logic().cloned(),
            )
        };
        let conn = self.lock_db();
        persistence_service::save_active_preset(&conn, &active)?;
        if let Some(saved) = saved {
            persistence_service::save_saved_logic(&conn, &saved)?;
        }
        Ok(())
    }

    /// Persistence failures never block an edit; they are logged and dropped.
    pub fn persist_quietly(&self) {
        if let Err(err) = self.persist_config().and_then(|_| self.persist_presets()) {
            warn!(error = %err, "failed to persist local state");
        }
    }
}

/// Unknown ids, and the saved-logic id without a snapshot, restore nothing.
fn restored_preset(id: &str, saved_logic: Option<&Preset>) -> Option<Preset> {
    if id == SAVED_LOGIC_PRESET_ID {
        return saved_logic.cloned();
    }
    preset::find_builtin(id)
}
