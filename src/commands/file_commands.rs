use crate::error::AppError;
use crate::models::backend::{
    CustomPreset, DefaultLocations, HealthStatus, ListFilesResponse, PathPair, SuccessResponse,
};
use crate::models::category::FileCategory;
use crate::scope_path;
use crate::state::AppState;

pub async fn list_files(
    state: &AppState,
    path: &str,
    category: FileCategory,
) -> Result<ListFilesResponse, AppError> {
    if path.trim().is_empty() {
        return Ok(ListFilesResponse {
            success: true,
            files: Vec::new(),
            error: None,
        });
    }
    state.backend.list_files(path, category).await
}

pub async fn create_path(state: &AppState, path: &str) -> Result<SuccessResponse, AppError> {
    if path.trim().is_empty() {
        return Err(AppError::Validation("path is required".to_string()));
    }
    state.backend.create_path(path).await
}

pub async fn health_check(state: &AppState) -> HealthStatus {
    state.backend.health_check().await
}

pub async fn default_locations(state: &AppState) -> Result<DefaultLocations, AppError> {
    state.backend.defaults().await
}

pub async fn list_custom_presets(state: &AppState) -> Result<Vec<CustomPreset>, AppError> {
    state.backend.custom_presets().await
}

pub async fn create_custom_preset(
    state: &AppState,
    name: &str,
    source: &str,
    target: &str,
) -> Result<CustomPreset, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("preset name is required".to_string()));
    }
    if source.trim().is_empty() || target.trim().is_empty() {
        return Err(AppError::Validation(
            "custom presets need both a source and a target".to_string(),
        ));
    }
    scope_path::validate_pair(source, target)?;
    let pair = PathPair {
        source: source.to_string(),
        target: target.to_string(),
    };
    state.backend.create_custom_preset(name, &pair).await
}

pub async fn delete_custom_preset(state: &AppState, preset_id: i64) -> Result<(), AppError> {
    state.backend.delete_custom_preset(preset_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::scripted_state;

    #[tokio::test]
    async fn empty_path_lists_nothing_without_a_request() {
        let (backend, state) = scripted_state();
        let listed = list_files(&state, "  ", FileCategory::Photos).await.unwrap();
        assert!(listed.success);
        assert!(listed.files.is_empty());
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn create_path_requires_a_path() {
        let (backend, state) = scripted_state();
        assert!(matches!(
            create_path(&state, "").await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(create_path(&state, "/out/new").await.unwrap().success);
        assert_eq!(backend.network_calls(), 1);
    }

    #[tokio::test]
    async fn custom_preset_lifecycle() {
        let (_, state) = scripted_state();
        let created = create_custom_preset(&state, " Trip ", "/in", "/out")
            .await
            .unwrap();
        assert_eq!(created.name, "Trip");
        assert_eq!(list_custom_presets(&state).await.unwrap().len(), 1);

        delete_custom_preset(&state, created.id).await.unwrap();
        assert!(list_custom_presets(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_preset_rejects_overlapping_pair() {
        let (backend, state) = scripted_state();
        let err = create_custom_preset(&state, "Same", "/a/b", "/a/b/")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn health_and_defaults_come_from_backend() {
        let (_, state) = scripted_state();
        assert!(health_check(&state).await.ok);
        assert_eq!(
            default_locations(&state).await.unwrap().home,
            "/home/test"
        );
    }
}
