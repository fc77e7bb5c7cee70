use std::sync::Mutex;

use crate::models::step::{FileChange, Step, StepId, StepStatus};

/// Mutations accepted by [`PipelineState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Toggled(StepId),
    /// Preset sweep: set enablement and drop stale run-state.
    EnablementSet { id: StepId, enabled: bool },
    StatusUpdated {
        id: StepId,
        status: StepStatus,
        results: Vec<FileChange>,
        error: Option<String>,
    },
    Reset(StepId),
    ResetAll,
    Activated(StepId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    steps: Vec<Step>,
    active_step: StepId,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            steps: StepId::ALL.into_iter().map(|id| Step::new(id, true)).collect(),
            active_step: StepId::Setup,
        }
    }

    /// Returns whether the event changed anything.
    pub fn apply(&mut self, event: PipelineEvent) -> bool {
        match event {
            PipelineEvent::Toggled(id) => self.toggle_step(id),
            PipelineEvent::EnablementSet { id, enabled } => {
                let Some(step) = self.processing_step_mut(id) else {
                    return false;
                };
                step.enabled = enabled;
                step.reset();
                true
            }
            PipelineEvent::StatusUpdated {
                id,
                status,
                results,
                error,
            } => self.update_step_status(id, status, results, error),
            PipelineEvent::Reset(id) => self.reset_step(id),
            PipelineEvent::ResetAll => {
                for step in self.steps.iter_mut().filter(|s| !s.id.is_structural()) {
                    step.reset();
                }
                true
            }
            PipelineEvent::Activated(id) => {
                let changed = self.active_step != id;
                self.active_step = id;
                changed
            }
        }
    }

    pub fn toggle_step(&mut self, id: StepId) -> bool {
        match self.processing_step_mut(id) {
            Some(step) => {
                step.enabled = !step.enabled;
                true
            }
            None => false,
        }
    }

    /// Replaces the run-state of one step. Never touches `enabled`.
    pub fn update_step_status(
        &mut self,
        id: StepId,
        status: StepStatus,
        results: Vec<FileChange>,
        error: Option<String>,
    ) -> bool {
        let Some(step) = self.processing_step_mut(id) else {
            return false;
        };
        step.status = status;
        step.results = results;
        step.error = error;
        true
    }

    pub fn reset_step(&mut self, id: StepId) -> bool {
        match self.processing_step_mut(id) {
            Some(step) => {
                step.reset();
                true
            }
            None => false,
        }
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active_step(&self) -> StepId {
        self.active_step
    }

    pub fn processing_ids(&self) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|step| !step.id.is_structural())
            .map(|step| step.id)
            .collect()
    }

    pub fn enabled_processing_ids(&self) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|step| !step.id.is_structural() && step.enabled)
            .map(|step| step.id)
            .collect()
    }

    fn processing_step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        if id.is_structural() {
            return None;
        }
        self.steps.iter_mut().find(|step| step.id == id)
    }
}

/// Single-writer wrapper: every mutation goes through [`PipelineStore::dispatch`].
#[derive(Debug, Default)]
pub struct PipelineStore {
    state: Mutex<PipelineState>,
}

impl PipelineStore {
    pub fn new(state: PipelineState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn dispatch(&self, event: PipelineEvent) -> bool {
        self.lock().apply(event)
    }

    pub fn dispatch_all(&self, events: impl IntoIterator<Item = PipelineEvent>) {
        let mut state = self.lock();
        for event in events {
            state.apply(event);
        }
    }

    pub fn snapshot(&self) -> PipelineState {
        self.lock().clone()
    }

    pub fn read<T>(&self, f: impl FnOnce(&PipelineState) -> T) -> T {
        f(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PipelineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
