use shared::{
    domain::ClientId,
    error::{ApiError, ErrorCode},
    validation::ValidationError,
};
use thiserror::Error;

pub type CrmResult<T> = std::result::Result<T, CrmError>;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("not logged in: missing session token")]
    MissingSession,
    #[error("session expired or token rejected; log in again")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("local store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("local store is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("client {0} is not on the current page")]
    NotVisible(ClientId),
    #[error("editor is not open")]
    EditorClosed,
}

impl CrmError {
    /// Text for a user-facing notice: the server's own message when it sent
    /// one, the validation message for local checks, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(ApiError {
                message: Some(message),
                ..
            }) => message.clone(),
            Self::Validation(err) => err.to_string(),
            Self::MissingSession | Self::Unauthorized => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::MissingSession | Self::Unauthorized => true,
            Self::Api(err) => err.code == ErrorCode::Unauthorized,
            _ => false,
        }
    }
}
