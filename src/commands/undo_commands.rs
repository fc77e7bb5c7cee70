use crate::error::AppError;
use crate::models::undo::{UndoAvailability, UndoHistoryEntry, UndoResult};
use crate::services::pipeline_service::PipelineEvent;
use crate::state::AppState;

/// Reviewed results stop describing the disk once anything is undone.
fn after_undo(state: &AppState, result: &UndoResult) {
    if result.success {
        state.pipeline.dispatch(PipelineEvent::ResetAll);
    }
}

pub async fn undo_last(state: &AppState) -> Result<UndoResult, AppError> {
    let result = state.undo.undo_last().await?;
    after_undo(state, &result);
    Ok(result)
}

pub async fn undo_operation(state: &AppState, operation_id: &str) -> Result<UndoResult, AppError> {
    if operation_id.trim().is_empty() {
        return Err(AppError::Validation("operation id is required".to_string()));
    }
    let result = state.undo.undo_operation(operation_id).await?;
    after_undo(state, &result);
    Ok(result)
}

pub async fn undo_history(state: &AppState) -> Result<Vec<UndoHistoryEntry>, AppError> {
    state.undo.history().await
}

pub fn undo_availability(state: &AppState) -> UndoAvailability {
    state.undo.availability()
}
