use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::config::PipelineConfig;
use crate::models::step::{Step, StepId, StepStatus};
use crate::services::backend_client::Backend;
use crate::services::pipeline_service::{PipelineEvent, PipelineStore};
use crate::services::undo_service::UndoService;

pub const BATCH_FAILURE_MESSAGE: &str = "Batch run returned no results";
const STEP_FAILURE_MESSAGE: &str = "Step failed";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub requested: Vec<StepId>,
    pub cleared: Vec<StepId>,
    pub succeeded: Vec<StepId>,
    pub failed: Vec<StepId>,
    /// Requested but absent from the response; prior state kept.
    pub skipped: Vec<StepId>,
}

/// Runs steps on the backend and folds the answers back into the pipeline store.
pub struct ExecutionCoordinator {
    backend: Arc<dyn Backend>,
    pipeline: Arc<PipelineStore>,
    undo: Arc<UndoService>,
}

impl ExecutionCoordinator {
    pub fn new(
        backend: Arc<dyn Backend>,
        pipeline: Arc<PipelineStore>,
        undo: Arc<UndoService>,
    ) -> Self {
        Self {
            backend,
            pipeline,
            undo,
        }
    }

    /// Returns the final status, or `None` when nothing was run.
    pub async fn run_step(&self, id: StepId, config: &PipelineConfig) -> Option<StepStatus> {
        if id.is_structural() || config.source_dir.trim().is_empty() {
            return None;
        }

        self.pipeline.dispatch(PipelineEvent::StatusUpdated {
            id,
            status: StepStatus::Running,
            results: Vec::new(),
            error: None,
        });

        let event = match self.backend.run_step(id, config).await {
            Ok(response) if response.success => PipelineEvent::StatusUpdated {
                id,
                status: StepStatus::Success,
                results: response.processed_files,
                error: None,
            },
            Ok(response) => PipelineEvent::StatusUpdated {
                id,
                status: StepStatus::Error,
                results: Vec::new(),
                error: Some(
                    response
                        .error
                        .unwrap_or_else(|| STEP_FAILURE_MESSAGE.to_string()),
                ),
            },
            Err(err) => {
                warn!(step = %id, error = %err, "step request failed");
                PipelineEvent::StatusUpdated {
                    id,
                    status: StepStatus::Error,
                    results: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        self.pipeline.dispatch(event);

        // The backend may have journaled a partial run even when it failed.
        self.undo.refresh().await;
        self.pipeline.read(|state| state.step(id).map(|step| step.status))
    }

    /// Runs every enabled step in one backend call and clears the disabled ones.
    pub async fn run_all(
        &self,
        enabled: &[StepId],
        all: &[StepId],
        config: &PipelineConfig,
    ) -> BatchReport {
        let (to_run, to_clear): (Vec<StepId>, Vec<StepId>) = all
            .iter()
            .copied()
            .filter(|id| !id.is_structural())
            .partition(|id| enabled.contains(id));

        self.pipeline
            .dispatch_all(to_clear.iter().map(|id| PipelineEvent::Reset(*id)));

        let mut report = BatchReport {
            requested: to_run.clone(),
            cleared: to_clear,
            ..Default::default()
        };
        if to_run.is_empty() {
            return report;
        }

        let prior: HashMap<StepId, Step> = self.pipeline.read(|state| {
            to_run
                .iter()
                .filter_map(|id| state.step(*id).cloned().map(|step| (*id, step)))
                .collect()
        });
        self.pipeline
            .dispatch_all(to_run.iter().enumerate().filter_map(|(index, id)| {
                let step = prior.get(id)?;
                Some(PipelineEvent::StatusUpdated {
                    id: *id,
                    status: if index == 0 {
                        StepStatus::Running
                    } else {
                        StepStatus::Idle
                    },
                    results: step.results.clone(),
                    error: step.error.clone(),
                })
            }));

        info!(steps = ?to_run, "running batch");
        let events: Vec<PipelineEvent> = match self.backend.run_all(&to_run, config).await {
            Ok(responses) if responses.is_empty() => {
                report.failed = to_run.clone();
                failed_events(&to_run, BATCH_FAILURE_MESSAGE)
            }
            Ok(responses) => {
                let mut by_id: HashMap<StepId, _> = responses
                    .into_iter()
                    .map(|response| (response.step_id, response))
                    .collect();
                to_run
                    .iter()
                    .filter_map(|id| match by_id.remove(id) {
                        None => {
                            report.skipped.push(*id);
                            prior.get(id).map(|step| PipelineEvent::StatusUpdated {
                                id: *id,
                                status: step.status,
                                results: step.results.clone(),
                                error: step.error.clone(),
                            })
                        }
                        Some(response) if response.success => {
                            report.succeeded.push(*id);
                            Some(PipelineEvent::StatusUpdated {
                                id: *id,
                                status: StepStatus::Success,
                                results: response.processed_files,
                                error: None,
                            })
                        }
                        Some(response) => {
                            report.failed.push(*id);
                            Some(PipelineEvent::StatusUpdated {
                                id: *id,
                                status: StepStatus::Error,
                                results: Vec::new(),
                                error: Some(
                                    response
                                        .error
                                        .unwrap_or_else(|| STEP_FAILURE_MESSAGE.to_string()),
                                ),
                            })
                        }
                    })
                    .collect()
            }
            Err(err) => {
                warn!(error = %err, "batch request failed");
                report.failed = to_run.clone();
                failed_events(&to_run, &err.to_string())
            }
        };
        self.pipeline.dispatch_all(events);

        self.undo.refresh().await;
        report
    }
}

fn failed_events(ids: &[StepId], message: &str) -> Vec<PipelineEvent> {
    ids.iter()
        .map(|id| PipelineEvent::StatusUpdated {
            id: *id,
            status: StepStatus::Error,
            results: Vec::new(),
            error: Some(message.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::step::{ChangeStatus, FileChange};
    use crate::services::backend_client::testing::{step_failed, step_ok, ScriptedBackend};

    struct Harness {
        backend: Arc<ScriptedBackend>,
        pipeline: Arc<PipelineStore>,
        runner: ExecutionCoordinator,
    }

    fn harness() -> Harness {
        let backend = Arc::new(ScriptedBackend::new());
        let pipeline = Arc::new(PipelineStore::default());
        let undo = Arc::new(UndoService::new(backend.clone()));
        let runner = ExecutionCoordinator::new(backend.clone(), pipeline.clone(), undo);
        Harness {
            backend,
            pipeline,
            runner,
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            source_dir: "/in".to_string(),
            target_dir: "/out".to_string(),
            ..Default::default()
        }
    }

    fn file(name: &str) -> FileChange {
        FileChange::new(name, name, ChangeStatus::Success)
    }

    #[tokio::test]
    async fn run_step_without_source_is_a_no_op() {
        let h = harness();
        let status = h
            .runner
            .run_step(StepId::Filename, &PipelineConfig::default())
            .await;
        assert_eq!(status, None);
        assert_eq!(h.backend.network_calls(), 0);
    }

    #[tokio::test]
    async fn run_step_success_stores_results_and_refreshes_undo() {
        let h = harness();
        h.backend
            .script_step(StepId::Filename, Ok(step_ok(StepId::Filename, vec![file("a.jpg")])));

        let status = h.runner.run_step(StepId::Filename, &config()).await;

        assert_eq!(status, Some(StepStatus::Success));
        let step = h.pipeline.read(|s| s.step(StepId::Filename).cloned()).unwrap();
        assert_eq!(step.results, vec![file("a.jpg")]);
        assert_eq!(h.backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn run_step_backend_failure_keeps_message_verbatim() {
        let h = harness();
        h.backend.script_step(
            StepId::Group,
            Ok(step_failed(StepId::Group, "Source directory not found: /in")),
        );

        h.runner.run_step(StepId::Group, &config()).await;

        let step = h.pipeline.read(|s| s.step(StepId::Group).cloned()).unwrap();
        assert_eq!(step.status, StepStatus::Error);
        assert_eq!(step.error.as_deref(), Some("Source directory not found: /in"));
        assert!(step.results.is_empty());
        assert_eq!(h.backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn run_step_transport_failure_still_refreshes_undo() {
        let h = harness();
        h.backend
            .script_step(StepId::Transfer, Err("connection refused".to_string()));

        let status = h.runner.run_step(StepId::Transfer, &config()).await;

        assert_eq!(status, Some(StepStatus::Error));
        let step = h.pipeline.read(|s| s.step(StepId::Transfer).cloned()).unwrap();
        assert!(step.error.unwrap().contains("connection refused"));
        assert_eq!(h.backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn run_all_with_nothing_enabled_only_clears() {
        let h = harness();
        h.pipeline.dispatch(PipelineEvent::StatusUpdated {
            id: StepId::Group,
            status: StepStatus::Success,
            results: vec![file("a.jpg")],
            error: None,
        });

        let report = h.runner.run_all(&[], &StepId::PROCESSING, &config()).await;

        assert!(report.requested.is_empty());
        assert_eq!(report.cleared, StepId::PROCESSING.to_vec());
        assert_eq!(h.backend.network_calls(), 0);
        let state = h.pipeline.snapshot();
        assert!(state
            .steps()
            .iter()
            .all(|s| s.status == StepStatus::Idle && s.results.is_empty()));
    }

    #[tokio::test]
    async fn run_all_sends_exactly_one_batch_request() {
        let h = harness();
        let enabled = [StepId::Standardize, StepId::Filename, StepId::Transfer];

        let report = h.runner.run_all(&enabled, &StepId::PROCESSING, &config()).await;

        assert_eq!(h.backend.batch_calls(), vec![enabled.to_vec()]);
        assert_eq!(report.succeeded, enabled.to_vec());
        assert_eq!(report.cleared, vec![StepId::Deduplicate, StepId::Group]);
    }

    #[tokio::test]
    async fn absent_batch_entry_keeps_prior_state() {
        let h = harness();
        let earlier = vec![file("old.jpg")];
        h.pipeline.dispatch(PipelineEvent::StatusUpdated {
            id: StepId::Standardize,
            status: StepStatus::Success,
            results: earlier.clone(),
            error: None,
        });
        h.backend.script_batch(Ok(vec![step_ok(
            StepId::Deduplicate,
            vec![FileChange::new("a.jpg", "a.jpg", ChangeStatus::Success)],
        )]));

        let report = h
            .runner
            .run_all(
                &[StepId::Standardize, StepId::Deduplicate],
                &[StepId::Standardize, StepId::Deduplicate],
                &config(),
            )
            .await;

        let state = h.pipeline.snapshot();
        let standardize = state.step(StepId::Standardize).unwrap();
        assert_eq!(standardize.status, StepStatus::Success);
        assert_eq!(standardize.results, earlier);
        let dedupe = state.step(StepId::Deduplicate).unwrap();
        assert_eq!(dedupe.status, StepStatus::Success);
        assert_eq!(dedupe.results.len(), 1);
        assert_eq!(report.skipped, vec![StepId::Standardize]);
    }

    #[tokio::test]
    async fn empty_batch_response_fails_every_requested_step() {
        let h = harness();
        h.backend.script_batch(Ok(Vec::new()));
        let enabled = [StepId::Deduplicate, StepId::Group];

        let report = h.runner.run_all(&enabled, &enabled, &config()).await;

        assert_eq!(report.failed, enabled.to_vec());
        let state = h.pipeline.snapshot();
        for id in enabled {
            let step = state.step(id).unwrap();
            assert_eq!(step.status, StepStatus::Error);
            assert_eq!(step.error.as_deref(), Some(BATCH_FAILURE_MESSAGE));
        }
        assert_eq!(h.backend.history_calls(), 1);
    }

    #[tokio::test]
    async fn failed_batch_entry_carries_backend_message() {
        let h = harness();
        h.backend.script_batch(Ok(vec![
            step_failed(StepId::Group, "unreadable EXIF"),
            step_ok(StepId::Filename, vec![file("x.jpg")]),
        ]));
        let enabled = [StepId::Filename, StepId::Group];

        h.runner.run_all(&enabled, &enabled, &config()).await;

        let state = h.pipeline.snapshot();
        assert_eq!(state.step(StepId::Group).unwrap().error.as_deref(), Some("unreadable EXIF"));
        assert_eq!(state.step(StepId::Filename).unwrap().status, StepStatus::Success);
    }
}
