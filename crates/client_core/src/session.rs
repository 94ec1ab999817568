//! Session and theme contexts. Both are explicit objects over a
//! [`LocalStore`]; nothing here is global.

use std::sync::Arc;

use shared::domain::Theme;
use tracing::{debug, warn};

use crate::{
    error::{CrmError, CrmResult},
    store::LocalStore,
};

pub const TOKEN_KEY: &str = "token";
pub const THEME_KEY: &str = "theme";

pub struct SessionContext {
    store: Arc<dyn LocalStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> CrmResult<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    pub fn require_token(&self) -> CrmResult<String> {
        self.token()?.ok_or(CrmError::MissingSession)
    }

    /// Store failures surface as errors rather than a logged-out session.
    pub fn is_logged_in(&self) -> CrmResult<bool> {
        Ok(self.token()?.is_some())
    }

    pub fn store_token(&self, token: &str) -> CrmResult<()> {
        debug!("session: storing token");
        self.store.set(TOKEN_KEY, token)
    }

    pub fn clear(&self) -> CrmResult<()> {
        debug!("session: clearing token");
        self.store.remove(TOKEN_KEY)
    }
}

pub struct ThemeContext {
    store: Arc<dyn LocalStore>,
    fallback: Theme,
}

impl ThemeContext {
    pub fn new(store: Arc<dyn LocalStore>, fallback: Theme) -> Self {
        Self { store, fallback }
    }

    /// Stored preference, or the configured fallback when nothing valid is
    /// stored.
    pub fn current(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "theme: ignoring unknown stored theme");
                self.fallback
            }),
            Ok(None) => self.fallback,
            Err(error) => {
                warn!(%error, "theme: failed to read stored theme");
                self.fallback
            }
        }
    }

    pub fn set(&self, theme: Theme) -> CrmResult<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn toggle(&self) -> CrmResult<Theme> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }
}
