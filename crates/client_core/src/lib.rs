use async_trait::async_trait;
use shared::{
    domain::{Client, ClientDraft, ClientId, ToggleField},
    protocol::{ListClientsParams, PageResult, StatsOverview},
};

pub mod controller;
pub mod dashboard;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod http;
pub mod query;
pub mod selection;
pub mod sequencer;
pub mod session;
pub mod store;

pub use controller::{BulkDeleteReport, ControllerOptions, ListController, ListState, ReloadOutcome};
pub use dashboard::{load_dashboard, DashboardSummary, Mood};
pub use error::{CrmError, CrmResult};
pub use http::HttpCrmApi;
pub use session::{SessionContext, ThemeContext};
pub use store::{FileStore, LocalStore, MemoryStore};

/// The remote collaborator behind the list view and the dashboard.
#[async_trait]
pub trait ClientsApi: Send + Sync {
    async fn list_clients(&self, params: &ListClientsParams) -> CrmResult<PageResult<Client>>;
    async fn create_client(&self, draft: &ClientDraft) -> CrmResult<()>;
    async fn update_client(&self, id: ClientId, draft: &ClientDraft) -> CrmResult<()>;
    async fn delete_client(&self, id: ClientId) -> CrmResult<()>;
    async fn toggle_field(&self, id: ClientId, field: ToggleField) -> CrmResult<()>;
    async fn export_csv(&self, params: &ListClientsParams) -> CrmResult<Vec<u8>>;
    async fn stats_overview(&self) -> CrmResult<StatsOverview>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A list response was applied to visible state.
    PageApplied { request: u64, total: u64 },
    Notice(Notice),
}
