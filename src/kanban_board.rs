use std::collections::{HashSet, VecDeque};

use chrono::Local;
use tracing::{error, info, warn};

use crate::application::{Application, ApplicationDraft, ApplicationFields, ApplicationPatch, Status};
use crate::error::{BoardError, BoardResult};
use crate::gateway::ApplicationGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Counts shown in the header tiles. Rejected applications only count
/// towards `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardSummary {
    pub total: usize,
    pub applied: usize,
    pub interviewing: usize,
    pub offers: usize,
}

/// A status change that has been applied locally but not yet confirmed.
/// Carries the status to restore if the gateway refuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: String,
    pub previous: Status,
    pub next: Status,
}

/// Board state: the list of applications and every mutation of it.
///
/// Local state only changes after the gateway confirms a create, edit or
/// delete. Status changes are applied up front and compensated on failure.
/// Each mutation is available as one async call or as separate phases for
/// callers that keep working while the gateway call is in flight.
#[derive(Debug, Default)]
pub struct KanbanBoard {
    owner: Option<String>,
    applications: Vec<Application>,
    deleting: HashSet<String>,
    notifications: VecDeque<Notification>,
    loading: bool,
}

impl KanbanBoard {
    pub fn new(owner: Option<String>) -> Self {
        Self {
            owner,
            applications: Vec::new(),
            deleting: HashSet::new(),
            notifications: VecDeque::new(),
            loading: true,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    pub fn get_applications_by_status(&self, status: Status) -> Vec<&Application> {
        self.applications.iter().filter(|a| a.status == status).collect()
    }

    pub fn summary(&self) -> BoardSummary {
        let count = |status| self.applications.iter().filter(|a| a.status == status).count();
        BoardSummary {
            total: self.applications.len(),
            applied: count(Status::Applied),
            interviewing: count(Status::Interviewing),
            offers: count(Status::Offer),
        }
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn notify_success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.notifications.push_back(Notification {
            kind: NotificationKind::Success,
            message,
        });
    }

    fn notify_error(&mut self, message: &str, err: &BoardError) {
        error!("{message}: {err}");
        self.notifications.push_back(Notification {
            kind: NotificationKind::Error,
            message: message.to_string(),
        });
    }

    // ── load ────────────────────────────────────────────────────────────

    pub async fn load(&mut self, gateway: &dyn ApplicationGateway) {
        let result = gateway.list_all(self.owner()).await;
        self.finish_load(result);
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// On failure the last loaded list is kept (empty before the first
    /// success); nothing is retried.
    pub fn finish_load(&mut self, result: BoardResult<Vec<Application>>) {
        self.loading = false;
        match result {
            Ok(mut applications) => {
                let mut seen = HashSet::new();
                applications.retain(|a| seen.insert(a.id.clone()));
                info!("loaded {} applications", applications.len());
                self.applications = applications;
            }
            Err(err) => self.notify_error("Failed to load job applications", &err),
        }
    }

    // ── create ──────────────────────────────────────────────────────────

    pub async fn create(
        &mut self,
        gateway: &dyn ApplicationGateway,
        draft: ApplicationDraft,
    ) -> BoardResult<Application> {
        let draft = self.begin_create(draft)?;
        let result = gateway.create(&draft).await;
        self.finish_create(result)
    }

    /// Validates the draft and stamps owner and application date. Nothing
    /// should be sent to the gateway if this fails.
    pub fn begin_create(&mut self, mut draft: ApplicationDraft) -> BoardResult<ApplicationDraft> {
        if let Err(err) = draft.validate() {
            self.notify_error("Please fill in the required fields", &err);
            return Err(err);
        }
        if draft.owner.is_none() {
            draft.owner = self.owner.clone();
        }
        if draft.applied_on.is_none() {
            draft.applied_on = Some(Local::now().date_naive());
        }
        Ok(draft)
    }

    /// Prepends the server's record, so later mutations target its real id.
    pub fn finish_create(&mut self, result: BoardResult<Application>) -> BoardResult<Application> {
        match result {
            Ok(created) => {
                self.applications.retain(|a| a.id != created.id);
                self.applications.insert(0, created.clone());
                self.notify_success("Job application added successfully!");
                Ok(created)
            }
            Err(err) => {
                self.notify_error("Failed to add job application", &err);
                Err(err)
            }
        }
    }

    // ── edit ────────────────────────────────────────────────────────────

    pub async fn edit(
        &mut self,
        gateway: &dyn ApplicationGateway,
        id: &str,
        fields: ApplicationFields,
    ) -> BoardResult<Application> {
        let patch = self.begin_edit(id, fields)?;
        let result = gateway.update(id, &patch).await;
        self.finish_edit(result)
    }

    pub fn begin_edit(&mut self, id: &str, fields: ApplicationFields) -> BoardResult<ApplicationPatch> {
        if let Err(err) = fields.validate() {
            self.notify_error("Please fill in the required fields", &err);
            return Err(err);
        }
        if self.get(id).is_none() {
            let err = BoardError::NotFound(id.to_string());
            self.notify_error("Failed to update job application", &err);
            return Err(err);
        }
        Ok(ApplicationPatch::from(fields))
    }

    /// Replaces the local entry with the server's copy, adopting its `updated_at`.
    pub fn finish_edit(&mut self, result: BoardResult<Application>) -> BoardResult<Application> {
        match result {
            Ok(updated) => {
                if let Some(slot) = self.applications.iter_mut().find(|a| a.id == updated.id) {
                    *slot = updated.clone();
                }
                self.notify_success("Job application updated successfully!");
                Ok(updated)
            }
            Err(err) => {
                self.notify_error("Failed to update job application", &err);
                Err(err)
            }
        }
    }

    // ── delete ──────────────────────────────────────────────────────────

    pub async fn delete(&mut self, gateway: &dyn ApplicationGateway, id: &str) -> BoardResult<()> {
        self.begin_delete(id);
        let result = gateway.delete(id).await;
        self.finish_delete(id, result)
    }

    /// Marks the card as deleting. The entry itself stays until confirmed.
    pub fn begin_delete(&mut self, id: &str) {
        self.deleting.insert(id.to_string());
    }

    pub fn finish_delete(&mut self, id: &str, result: BoardResult<()>) -> BoardResult<()> {
        self.deleting.remove(id);
        match result {
            Ok(()) => {
                self.applications.retain(|a| a.id != id);
                self.notify_success("Job application deleted successfully!");
                Ok(())
            }
            Err(err) => {
                self.notify_error("Failed to delete job application", &err);
                Err(err)
            }
        }
    }

    // ── status change ───────────────────────────────────────────────────

    /// Moves an application to another column. Returns `Ok(false)` when
    /// there was nothing to do (unknown id or same status).
    pub async fn change_status(
        &mut self,
        gateway: &dyn ApplicationGateway,
        id: &str,
        status: Status,
    ) -> BoardResult<bool> {
        let Some(change) = self.begin_status_change(id, status) else {
            return Ok(false);
        };
        match gateway.update(&change.id, &ApplicationPatch::status(change.next)).await {
            Ok(_) => {
                self.confirm_status_change(&change);
                Ok(true)
            }
            Err(err) => {
                self.rollback_status_change(&change, &err);
                Err(err)
            }
        }
    }

    /// Applies the new status locally and captures the old one.
    ///
    /// Two overlapping changes on the same record are not coordinated: the
    /// second overwrites the first locally, and a failing first change
    /// restores the status it captured.
    pub fn begin_status_change(&mut self, id: &str, status: Status) -> Option<StatusChange> {
        let application = self.applications.iter_mut().find(|a| a.id == id)?;
        if application.status == status {
            return None;
        }
        let change = StatusChange {
            id: id.to_string(),
            previous: application.status,
            next: status,
        };
        application.status = status;
        Some(change)
    }

    pub fn confirm_status_change(&mut self, change: &StatusChange) {
        self.notify_success(format!("Moved to {}!", change.next));
    }

    /// Restores only the status captured when the change began.
    pub fn rollback_status_change(&mut self, change: &StatusChange, err: &BoardError) {
        match self.applications.iter_mut().find(|a| a.id == change.id) {
            Some(application) => application.status = change.previous,
            None => warn!("application {} vanished before status rollback", change.id),
        }
        self.notify_error("Failed to update job status", err);
    }
}
