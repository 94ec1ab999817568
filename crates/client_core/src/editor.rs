use shared::domain::{Client, ClientDraft, ClientId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Create,
    Edit(ClientId),
}

/// Create/edit form of the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub open: bool,
    pub mode: EditorMode,
    pub draft: ClientDraft,
    pub error: Option<String>,
    pub saving: bool,
}

impl EditorState {
    pub fn open_create(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    pub fn open_edit(&mut self, client: &Client) {
        *self = Self {
            open: true,
            mode: EditorMode::Edit(client.id),
            draft: ClientDraft::from(client),
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        self.open = false;
        self.saving = false;
    }
}
