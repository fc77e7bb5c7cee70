use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;
use crate::models::backend::{
    CreatePathRequest, CustomPreset, CustomPresetCreated, CustomPresetRequest,
    CustomPresetsResponse, DefaultLocations, HealthStatus, ListFilesRequest, ListFilesResponse,
    PathPair, PresetOverrideRequest, PresetOverridesResponse, RunAllRequest, RunStepRequest,
    ScanPathRequest, ScanPathResponse, StepResponse, SuccessResponse,
};
use crate::models::category::FileCategory;
use crate::models::config::PipelineConfig;
use crate::models::step::StepId;
use crate::models::undo::{UndoHistoryEntry, UndoResult};

/// Remote executor and scanner. Every call is a suspension point.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health_check(&self) -> HealthStatus;

    async fn run_step(
        &self,
        step_id: StepId,
        config: &PipelineConfig,
    ) -> Result<StepResponse, AppError>;

    /// One request for the whole batch so the backend records one undo entry.
    async fn run_all(
        &self,
        steps: &[StepId],
        config: &PipelineConfig,
    ) -> Result<Vec<StepResponse>, AppError>;

    async fn scan_path(
        &self,
        path: &str,
        category: FileCategory,
        limit: Option<u64>,
    ) -> Result<ScanPathResponse, AppError>;

    async fn list_files(
        &self,
        path: &str,
        category: FileCategory,
    ) -> Result<ListFilesResponse, AppError>;

    async fn create_path(&self, path: &str) -> Result<SuccessResponse, AppError>;

    async fn undo_last(&self) -> Result<UndoResult, AppError>;

    async fn undo_history(&self) -> Result<Vec<UndoHistoryEntry>, AppError>;

    async fn undo_operation(&self, operation_id: &str) -> Result<UndoResult, AppError>;

    async fn preset_overrides(&self) -> Result<BTreeMap<String, PathPair>, AppError>;

    async fn set_preset_override(&self, preset_key: &str, pair: &PathPair)
        -> Result<(), AppError>;

    async fn custom_presets(&self) -> Result<Vec<CustomPreset>, AppError>;

    async fn create_custom_preset(
        &self,
        name: &str,
        pair: &PathPair,
    ) -> Result<CustomPreset, AppError>;

    async fn delete_custom_preset(&self, preset_id: i64) -> Result<(), AppError>;

    async fn defaults(&self) -> Result<DefaultLocations, AppError>;
}

#[derive(serde::Deserialize)]
struct ErrorDetail {
    detail: String,
}

#[derive(serde::Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    history: Vec<UndoHistoryEntry>,
}

/// JSON-over-HTTP client for the organizer backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, AppError> {
        let response = self.client.get(self.url(route)).send().await?;
        Ok(check_status(response).await?.json::<T>().await?)
    }

    async fn post_json<B, T>(&self, route: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(route)).json(body).send().await?;
        Ok(check_status(response).await?.json::<T>().await?)
    }

    async fn post_empty<T: DeserializeOwned>(&self, route: &str) -> Result<T, AppError> {
        let response = self.client.post(self.url(route)).send().await?;
        Ok(check_status(response).await?.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorDetail>(&body)
        .map(|d| d.detail)
        .unwrap_or(body);
    Err(AppError::Backend(format!("{status}: {detail}")))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health_check(&self) -> HealthStatus {
        match self.defaults().await {
            Ok(_) => HealthStatus {
                ok: true,
                error: None,
            },
            Err(err) => HealthStatus {
                ok: false,
                error: Some(err.to_string()),
            },
        }
    }

    async fn run_step(
        &self,
        step_id: StepId,
        config: &PipelineConfig,
    ) -> Result<StepResponse, AppError> {
        self.post_json("/api/run-step", &RunStepRequest { step_id, config })
            .await
    }

    async fn run_all(
        &self,
        steps: &[StepId],
        config: &PipelineConfig,
    ) -> Result<Vec<StepResponse>, AppError> {
        let responses: Option<Vec<StepResponse>> = self
            .post_json("/api/run-all", &RunAllRequest { steps, config })
            .await?;
        Ok(responses.unwrap_or_default())
    }

    async fn scan_path(
        &self,
        path: &str,
        category: FileCategory,
        limit: Option<u64>,
    ) -> Result<ScanPathResponse, AppError> {
        self.post_json(
            "/api/scan-path",
            &ScanPathRequest {
                path,
                category,
                limit,
            },
        )
        .await
    }

    async fn list_files(
        &self,
        path: &str,
        category: FileCategory,
    ) -> Result<ListFilesResponse, AppError> {
        self.post_json("/api/list-files", &ListFilesRequest { path, category })
            .await
    }

    async fn create_path(&self, path: &str) -> Result<SuccessResponse, AppError> {
        self.post_json("/api/create-path", &CreatePathRequest { path })
            .await
    }

    async fn undo_last(&self) -> Result<UndoResult, AppError> {
        self.post_empty("/api/undo").await
    }

    async fn undo_history(&self) -> Result<Vec<UndoHistoryEntry>, AppError> {
        let envelope: HistoryEnvelope = self.get_json("/api/undo/history").await?;
        Ok(envelope.history)
    }

    async fn undo_operation(&self, operation_id: &str) -> Result<UndoResult, AppError> {
        self.post_empty(&format!("/api/undo/{operation_id}")).await
    }

    async fn preset_overrides(&self) -> Result<BTreeMap<String, PathPair>, AppError> {
        let response: PresetOverridesResponse = self.get_json("/api/preset-overrides").await?;
        Ok(response.overrides)
    }

    async fn set_preset_override(
        &self,
        preset_key: &str,
        pair: &PathPair,
    ) -> Result<(), AppError> {
        let response: SuccessResponse = self
            .post_json(
                "/api/preset-overrides",
                &PresetOverrideRequest {
                    preset_key,
                    source: &pair.source,
                    target: &pair.target,
                },
            )
            .await?;
        expect_success(response)
    }

    async fn custom_presets(&self) -> Result<Vec<CustomPreset>, AppError> {
        let response: CustomPresetsResponse = self.get_json("/api/custom-presets").await?;
        Ok(response.presets)
    }

    async fn create_custom_preset(
        &self,
        name: &str,
        pair: &PathPair,
    ) -> Result<CustomPreset, AppError> {
        let created: CustomPresetCreated = self
            .post_json(
                "/api/custom-presets",
                &CustomPresetRequest {
                    name,
                    source: &pair.source,
                    target: &pair.target,
                },
            )
            .await?;
        Ok(created.preset)
    }

    async fn delete_custom_preset(&self, preset_id: i64) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/custom-presets/{preset_id}")))
            .send()
            .await?;
        let response: SuccessResponse = check_status(response).await?.json().await?;
        expect_success(response)
    }

    async fn defaults(&self) -> Result<DefaultLocations, AppError> {
        self.get_json("/api/defaults").await
    }
}

fn expect_success(response: SuccessResponse) -> Result<(), AppError> {
    if response.success {
        Ok(())
    } else {
        Err(AppError::Backend(
            response
                .error
                .unwrap_or_else(|| "request was not accepted".to_string()),
        ))
    }
}
