use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::ApplicationGateway;
use crate::application::{Application, ApplicationDraft, ApplicationPatch};
use crate::error::{BoardError, BoardResult};

/// In-process gateway. Timestamps come from a clock that advances one
/// second per write so ordering is deterministic.
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    records: Vec<Application>,
    clock: DateTime<Utc>,
    calls: usize,
    fail_next: Option<String>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn starting_at(clock: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records: Vec::new(),
                clock,
                calls: 0,
                fail_next: None,
            }),
        }
    }

    /// Makes the next gateway call fail with a transport error.
    pub async fn fail_next_call(&self, message: impl Into<String>) {
        self.state.lock().await.fail_next = Some(message.into());
    }

    /// Number of gateway calls received so far, failed ones included.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }

    pub async fn records(&self) -> Vec<Application> {
        self.state.lock().await.records.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Application> {
        self.state
            .lock()
            .await
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn enter(&mut self) -> BoardResult<()> {
        self.calls += 1;
        match self.fail_next.take() {
            Some(message) => Err(BoardError::Transport(message)),
            None => Ok(()),
        }
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }
}

#[async_trait]
impl ApplicationGateway for MemoryGateway {
    async fn list_all(&self, owner: Option<&str>) -> BoardResult<Vec<Application>> {
        let mut state = self.state.lock().await;
        state.enter()?;

        let mut records: Vec<Application> = state
            .records
            .iter()
            .filter(|r| owner.is_none() || r.owner.as_deref() == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn create(&self, draft: &ApplicationDraft) -> BoardResult<Application> {
        let mut state = self.state.lock().await;
        state.enter()?;
        draft.validate()?;

        let now = state.tick();
        let record = Application {
            id: Uuid::new_v4().to_string(),
            owner: draft.owner.clone(),
            company: draft.company.clone(),
            role: draft.role.clone(),
            status: draft.status,
            deadline: draft.deadline,
            applied_on: draft.applied_on.unwrap_or_else(|| now.date_naive()),
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        debug!("memory gateway stored application {}", record.id);
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &ApplicationPatch) -> BoardResult<Application> {
        let mut state = self.state.lock().await;
        state.enter()?;

        let now = state.tick();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        record.apply(patch);
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> BoardResult<()> {
        let mut state = self.state.lock().await;
        state.enter()?;

        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Err(BoardError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
