use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::undo::{UndoAvailability, UndoHistoryEntry, UndoResult};
use crate::services::backend_client::Backend;

/// Client-side view of the backend undo log.
pub struct UndoService {
    backend: Arc<dyn Backend>,
    availability: Mutex<UndoAvailability>,
}

impl UndoService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            availability: Mutex::new(UndoAvailability::default()),
        }
    }

    pub fn availability(&self) -> UndoAvailability {
        self.availability
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-reads the history. Failures leave undo unavailable rather than erroring.
    pub async fn refresh(&self) -> UndoAvailability {
        let next = match self.backend.undo_history().await {
            Ok(entries) => UndoAvailability::from_history(entries),
            Err(err) => {
                warn!(error = %err, "undo history refresh failed");
                UndoAvailability::default()
            }
        };
        *self
            .availability
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next.clone();
        next
    }

    pub async fn history(&self) -> Result<Vec<UndoHistoryEntry>, AppError> {
        let entries = self.backend.undo_history().await?;
        *self
            .availability
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) =
            UndoAvailability::from_history(entries.clone());
        Ok(entries)
    }

    pub async fn undo_last(&self) -> Result<UndoResult, AppError> {
        let result = self.backend.undo_last().await;
        self.refresh().await;
        let result = result?;
        info!(undone = result.undone_count, success = result.success, "undo last");
        Ok(result)
    }

    pub async fn undo_operation(&self, operation_id: &str) -> Result<UndoResult, AppError> {
        let result = self.backend.undo_operation(operation_id).await;
        self.refresh().await;
        let result = result?;
        info!(operation_id, undone = result.undone_count, success = result.success, "undo operation");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend_client::testing::ScriptedBackend;

    fn entry(id: &str) -> UndoHistoryEntry {
        UndoHistoryEntry {
            id: id.to_string(),
            timestamp: "2025-01-01T00:00:00".to_string(),
            changes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn refresh_reports_latest_operation() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_history(vec![entry("summary_2"), entry("summary_1")]);
        let undo = UndoService::new(backend.clone());

        let availability = undo.refresh().await;

        assert!(availability.available);
        assert_eq!(availability.latest_operation_id.as_deref(), Some("summary_2"));
        assert_eq!(undo.availability(), availability);
    }

    #[tokio::test]
    async fn undo_refreshes_availability_afterwards() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_history(vec![entry("summary_1")]);
        backend.script_undo(UndoResult {
            success: true,
            message: "Undone 3 changes".to_string(),
            undone_count: 3,
            ..Default::default()
        });
        let undo = UndoService::new(backend.clone());
        undo.refresh().await;
        backend.set_history(Vec::new());

        let result = undo.undo_last().await.unwrap();

        assert_eq!(result.undone_count, 3);
        assert!(!undo.availability().available);
        assert_eq!(backend.history_calls(), 2);
    }

    #[tokio::test]
    async fn undo_specific_operation_passes_id() {
        let backend = Arc::new(ScriptedBackend::new());
        let undo = UndoService::new(backend.clone());
        let result = undo.undo_operation("filename_ab12cd34").await.unwrap();
        assert_eq!(result.operation_id.as_deref(), Some("filename_ab12cd34"));
    }
}
