//! Persistence gateway: the remote collection of applications.
//!
//! `RestGateway` talks to the hosted store; `MemoryGateway` keeps records in
//! process. The board only ever sees `Arc<dyn ApplicationGateway>`.

use async_trait::async_trait;

use crate::application::{Application, ApplicationDraft, ApplicationPatch};
use crate::error::BoardResult;

pub mod memory;
pub mod rest;

pub use memory::MemoryGateway;
pub use rest::RestGateway;

#[async_trait]
pub trait ApplicationGateway: Send + Sync {
    /// All applications, newest `created_at` first. `owner` narrows the
    /// listing to one owner when given.
    async fn list_all(&self, owner: Option<&str>) -> BoardResult<Vec<Application>>;

    /// Stores `draft`; the returned record carries the assigned id and timestamps.
    async fn create(&self, draft: &ApplicationDraft) -> BoardResult<Application>;

    async fn update(&self, id: &str, patch: &ApplicationPatch) -> BoardResult<Application>;

    async fn delete(&self, id: &str) -> BoardResult<()>;
}
