//! List-view controller: owns the query, applies only the newest list
//! response, keeps the selection pruned to the visible page and runs the
//! mutating operations against the remote API.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use futures::future::join_all;
use shared::{
    domain::{
        Client, ClientDraft, ClientId, ClientStatus, PaymentStatus, SortColumn, SortDirection,
        ToggleField,
    },
    validation::prepare_draft,
};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    debounce::{SearchDebouncer, DEFAULT_QUIET_PERIOD},
    editor::{EditorMode, EditorState},
    error::{CrmError, CrmResult},
    query::{page_count, range_text, ListQuery, DEFAULT_PAGE_SIZE},
    selection::SelectionSet,
    sequencer::RequestSequencer,
    ClientsApi, ControllerEvent, Notice,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: u32,
    pub search_quiet_period: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub query: ListQuery,
    pub items: Vec<Client>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub selection: SelectionSet,
    pub editor: EditorState,
}

impl ListState {
    pub fn visible_ids(&self) -> Vec<ClientId> {
        self.items.iter().map(|client| client.id).collect()
    }

    pub fn find(&self, id: ClientId) -> Option<&Client> {
        self.items.iter().find(|client| client.id == id)
    }

    pub fn page_count(&self) -> u32 {
        page_count(self.total, self.query.page_size)
    }

    pub fn range_text(&self) -> String {
        range_text(self.query.page, self.query.page_size, self.total)
    }

    pub fn all_selected_on_page(&self) -> bool {
        self.selection.all_selected(&self.visible_ids())
    }

    pub fn any_selected_on_page(&self) -> bool {
        self.selection.any_selected(&self.visible_ids())
    }

    pub fn summary_line(&self) -> String {
        let mut line = if self.loading {
            "Loading...".to_string()
        } else {
            format!(
                "Showing {} of {} • Page {}/{}",
                self.range_text(),
                self.total,
                self.query.page,
                self.page_count()
            )
        };
        if let Some(error) = &self.error {
            line.push_str(&format!(" • {error}"));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { total: u64 },
    /// A newer request was issued before this one answered.
    Superseded,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<ClientId>,
    pub failed: Vec<(ClientId, String)>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ListController {
    api: Arc<dyn ClientsApi>,
    state: Mutex<ListState>,
    search: Mutex<SearchDebouncer>,
    search_commits: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    sequencer: RequestSequencer,
    events: broadcast::Sender<ControllerEvent>,
}

impl ListController {
    pub fn new(api: Arc<dyn ClientsApi>, options: ControllerOptions) -> Arc<Self> {
        let (search, search_commits) = SearchDebouncer::new(options.search_quiet_period);
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            state: Mutex::new(ListState {
                query: ListQuery::with_page_size(options.page_size),
                ..ListState::default()
            }),
            search: Mutex::new(search),
            search_commits: Mutex::new(Some(search_commits)),
            sequencer: RequestSequencer::new(),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ListState {
        self.state.lock().await.clone()
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(ControllerEvent::Notice(notice));
    }

    /// Starts the task that turns debounced search commits into reloads.
    /// Returns `None` if the listener is already running. The task ends once
    /// the controller is dropped.
    pub async fn spawn_search_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut commits = self.search_commits.lock().await.take()?;
        let controller: Weak<Self> = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            while let Some(text) = commits.recv().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.apply_search_text(&text).await;
            }
        }))
    }

    /// Records a keystroke; the reload happens after the quiet period.
    pub async fn search_input(&self, raw: &str) {
        self.search.lock().await.input(raw);
    }

    pub async fn search_draft(&self) -> String {
        self.search.lock().await.draft().to_string()
    }

    /// Explicit confirm: commits the draft immediately and always reloads.
    pub async fn submit_search(&self) -> ReloadOutcome {
        let text = self.search.lock().await.commit_now();
        self.state.lock().await.query.set_text(&text);
        self.reload().await
    }

    async fn apply_search_text(&self, text: &str) -> Option<ReloadOutcome> {
        let changed = self.state.lock().await.query.set_text(text);
        if !changed {
            return None;
        }
        debug!(text, "search: committed");
        Some(self.reload().await)
    }

    /// Changes the query without reloading.
    pub async fn edit_query(&self, apply: impl FnOnce(&mut ListQuery)) {
        apply(&mut self.state.lock().await.query);
    }

    pub async fn update_query(&self, apply: impl FnOnce(&mut ListQuery)) -> ReloadOutcome {
        self.edit_query(apply).await;
        self.reload().await
    }

    pub async fn set_status_filter(&self, status: Option<ClientStatus>) -> ReloadOutcome {
        self.update_query(|query| query.set_status(status)).await
    }

    pub async fn set_payment_filter(&self, payment: Option<PaymentStatus>) -> ReloadOutcome {
        self.update_query(|query| query.set_payment(payment)).await
    }

    pub async fn set_course_filter(&self, course: &str) -> ReloadOutcome {
        self.update_query(|query| query.set_course(course)).await
    }

    pub async fn set_sort(&self, column: SortColumn) -> ReloadOutcome {
        self.update_query(|query| query.set_sort(column)).await
    }

    pub async fn set_order(&self, order: SortDirection) -> ReloadOutcome {
        self.update_query(|query| query.set_order(order)).await
    }

    pub async fn toggle_sort(&self, column: SortColumn) -> ReloadOutcome {
        self.update_query(|query| query.toggle_sort(column)).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> ReloadOutcome {
        self.update_query(|query| query.set_page_size(page_size))
            .await
    }

    /// Jumps to `page`, clamped to the pages known from the last result.
    pub async fn set_page(&self, page: u32) -> ReloadOutcome {
        {
            let mut state = self.state.lock().await;
            let last = state.page_count();
            state.query.set_page(page.min(last));
        }
        self.reload().await
    }

    /// `None` when already on the last page.
    pub async fn next_page(&self) -> Option<ReloadOutcome> {
        {
            let mut state = self.state.lock().await;
            if state.query.page >= state.page_count() {
                return None;
            }
            state.query.page += 1;
        }
        Some(self.reload().await)
    }

    /// `None` when already on the first page.
    pub async fn prev_page(&self) -> Option<ReloadOutcome> {
        {
            let mut state = self.state.lock().await;
            if state.query.page <= 1 {
                return None;
            }
            state.query.page -= 1;
        }
        Some(self.reload().await)
    }

    pub async fn reset_all(&self) -> ReloadOutcome {
        self.search.lock().await.clear();
        {
            let mut state = self.state.lock().await;
            state.query.reset();
            state.selection.clear();
        }
        self.notify(Notice::info("Filters reset"));
        self.reload().await
    }

    /// Fetches the page for the current query. The response is applied only
    /// if no newer reload was issued meanwhile.
    pub async fn reload(&self) -> ReloadOutcome {
        let ticket = self.sequencer.issue();
        let params = {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
            state.query.to_params()
        };
        debug!(
            request = ticket.value(),
            page = ?params.page,
            q = ?params.q,
            "clients: loading page"
        );

        let result = self.api.list_clients(&params).await;

        let mut state = self.state.lock().await;
        if !self.sequencer.is_current(ticket) {
            debug!(
                request = ticket.value(),
                latest = self.sequencer.latest(),
                "clients: discarding superseded response"
            );
            return ReloadOutcome::Superseded;
        }
        state.loading = false;
        match result {
            Ok(page) => {
                state
                    .selection
                    .retain_visible(page.items.iter().map(|client| client.id));
                state.items = page.items;
                state.total = page.total;
                let total = page.total;
                drop(state);
                let _ = self.events.send(ControllerEvent::PageApplied {
                    request: ticket.value(),
                    total,
                });
                ReloadOutcome::Applied { total }
            }
            Err(err) => {
                let message = err.user_message("Load error");
                state.error = Some(message.clone());
                drop(state);
                warn!(request = ticket.value(), error = %err, "clients: load failed");
                self.notify(Notice::error(message.clone()));
                ReloadOutcome::Failed(message)
            }
        }
    }

    /// Returns whether the row is selected afterwards.
    pub async fn toggle_select(&self, id: ClientId) -> CrmResult<bool> {
        let mut state = self.state.lock().await;
        if state.find(id).is_none() {
            return Err(CrmError::NotVisible(id));
        }
        Ok(state.selection.toggle(id))
    }

    pub async fn select_all_on_page(&self) {
        let mut state = self.state.lock().await;
        let visible = state.visible_ids();
        state.selection.select_all(visible);
    }

    pub async fn unselect_all_on_page(&self) {
        let mut state = self.state.lock().await;
        let visible = state.visible_ids();
        state.selection.clear_visible(visible);
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection.clear();
    }

    pub async fn open_create(&self) {
        self.state.lock().await.editor.open_create();
    }

    pub async fn open_edit(&self, id: ClientId) -> CrmResult<()> {
        let mut state = self.state.lock().await;
        let client = state.find(id).cloned().ok_or(CrmError::NotVisible(id))?;
        state.editor.open_edit(&client);
        Ok(())
    }

    pub async fn edit_draft(&self, apply: impl FnOnce(&mut ClientDraft)) -> CrmResult<()> {
        let mut state = self.state.lock().await;
        if !state.editor.open {
            return Err(CrmError::EditorClosed);
        }
        apply(&mut state.editor.draft);
        Ok(())
    }

    pub async fn close_editor(&self) {
        self.state.lock().await.editor.close();
    }

    /// Validates and submits the open editor. Success closes the editor and
    /// reloads; failure keeps it open with the error text.
    pub async fn save(&self) -> CrmResult<()> {
        let (mode, payload) = {
            let mut state = self.state.lock().await;
            if !state.editor.open {
                return Err(CrmError::EditorClosed);
            }
            match prepare_draft(&state.editor.draft) {
                Ok(payload) => {
                    state.editor.saving = true;
                    state.editor.error = None;
                    (state.editor.mode, payload)
                }
                Err(err) => {
                    state.editor.error = Some(err.to_string());
                    drop(state);
                    self.notify(Notice::error(err.to_string()));
                    return Err(err.into());
                }
            }
        };

        let result = match mode {
            EditorMode::Create => self.api.create_client(&payload).await,
            EditorMode::Edit(id) => self.api.update_client(id, &payload).await,
        };

        match result {
            Ok(()) => {
                self.state.lock().await.editor.close();
                let message = match mode {
                    EditorMode::Create => "Client added",
                    EditorMode::Edit(_) => "Client updated",
                };
                info!(?mode, "clients: saved");
                self.notify(Notice::success(message));
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                let message = err.user_message("Save error");
                {
                    let mut state = self.state.lock().await;
                    state.editor.saving = false;
                    state.editor.error = Some(message.clone());
                }
                warn!(?mode, error = %err, "clients: save failed");
                self.notify(Notice::error(message));
                Err(err)
            }
        }
    }

    pub async fn delete(&self, id: ClientId) -> CrmResult<()> {
        match self.api.delete_client(id).await {
            Ok(()) => {
                info!(client_id = id.0, "clients: deleted");
                self.notify(Notice::info("Deleted"));
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                warn!(client_id = id.0, error = %err, "clients: delete failed");
                self.notify(Notice::error(err.user_message("Delete error")));
                Err(err)
            }
        }
    }

    /// Deletes every selected id concurrently.
    pub async fn bulk_delete(&self) -> BulkDeleteReport {
        let ids: Vec<ClientId> = self.state.lock().await.selection.ids().collect();
        self.delete_many(&ids).await
    }

    /// Issues one delete per id concurrently. Deletions that succeed stay
    /// deleted even when others fail; failures are reported, not retried.
    /// Deleted ids leave the selection.
    pub async fn delete_many(&self, ids: &[ClientId]) -> BulkDeleteReport {
        if ids.is_empty() {
            return BulkDeleteReport::default();
        }

        let api = &self.api;
        let results = join_all(
            ids.iter()
                .map(|&id| async move { (id, api.delete_client(id).await) }),
        )
        .await;

        let mut report = BulkDeleteReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.deleted.push(id),
                Err(err) => {
                    warn!(client_id = id.0, error = %err, "clients: bulk delete item failed");
                    report.failed.push((id, err.user_message("Delete error")));
                }
            }
        }

        self.state
            .lock()
            .await
            .selection
            .clear_visible(report.deleted.iter().copied());

        if report.is_complete() {
            info!(count = report.deleted.len(), "clients: bulk delete finished");
            self.notify(Notice::info(format!("{} deleted", report.deleted.len())));
        } else {
            self.notify(Notice::error(format!(
                "Bulk delete error: {} of {} failed",
                report.failed.len(),
                ids.len()
            )));
        }

        self.reload().await;
        report
    }

    /// Flips the field locally before the request; a failed request writes
    /// the pre-toggle value back.
    pub async fn toggle_field(&self, id: ClientId, field: ToggleField) -> CrmResult<()> {
        let before = {
            let mut state = self.state.lock().await;
            state.items.iter_mut().find(|client| client.id == id).map(|client| {
                let before = client.field(field);
                client.flip(field);
                before
            })
        };

        match self.api.toggle_field(id, field).await {
            Ok(()) => {
                debug!(client_id = id.0, %field, "clients: toggled");
                self.notify(Notice::success("Updated"));
                Ok(())
            }
            Err(err) => {
                if let Some(before) = before {
                    let mut state = self.state.lock().await;
                    if let Some(client) = state.items.iter_mut().find(|client| client.id == id) {
                        client.restore(before);
                    }
                }
                warn!(client_id = id.0, %field, error = %err, "clients: toggle failed, reverted");
                self.notify(Notice::error(err.user_message("Toggle error")));
                Err(err)
            }
        }
    }

    pub async fn export_csv(&self) -> CrmResult<Vec<u8>> {
        let params = self.state.lock().await.query.export_params();
        match self.api.export_csv(&params).await {
            Ok(bytes) => {
                info!(bytes = bytes.len(), "clients: exported csv");
                self.notify(Notice::success("CSV exported"));
                Ok(bytes)
            }
            Err(err) => {
                warn!(error = %err, "clients: export failed");
                self.notify(Notice::error(err.user_message("Export error")));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
