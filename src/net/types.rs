//! Persistence action requests and the response envelope.
//!
//! DESIGN
//! ======
//! Each board mutation maps to one backend action posted as form fields.
//! Requests are typed here and flattened to `(name, value)` pairs only at the
//! transport boundary, so handlers cannot build a malformed payload.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::state::ids::{ColumnId, WidgetInstanceId, WidgetTypeId};

/// Backend action verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Move,
    Remove,
    SaveSettings,
}

impl ActionKind {
    /// Action path relative to the configured action base.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Add => "widgets/add",
            Self::Move => "widgets/move",
            Self::Remove => "widgets/delete",
            Self::SaveSettings => "widgets/save",
        }
    }

    /// Whether a successful response carries markup to splice in.
    #[must_use]
    pub fn expects_fragment(self) -> bool {
        matches!(self, Self::Add | Self::SaveSettings)
    }
}

/// A persistence request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Add {
        handler: WidgetTypeId,
        user_guid: Option<String>,
        context: Option<String>,
    },
    Move {
        guid: WidgetInstanceId,
        column: ColumnId,
        position: usize,
    },
    Remove {
        guid: WidgetInstanceId,
    },
    SaveSettings {
        /// Widget the form belongs to; not sent, the form carries its own guid.
        #[serde(skip)]
        guid: Option<WidgetInstanceId>,
        fields: Vec<(String, String)>,
    },
}

impl ActionRequest {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Add { .. } => ActionKind::Add,
            Self::Move { .. } => ActionKind::Move,
            Self::Remove { .. } => ActionKind::Remove,
            Self::SaveSettings { .. } => ActionKind::SaveSettings,
        }
    }

    /// Flatten to form fields in the order the backend documents them.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match self {
            Self::Add { handler, user_guid, context } => vec![
                ("handler".to_owned(), handler.to_string()),
                ("user_guid".to_owned(), user_guid.clone().unwrap_or_default()),
                ("context".to_owned(), context.clone().unwrap_or_default()),
            ],
            Self::Move { guid, column, position } => vec![
                ("guid".to_owned(), guid.to_string()),
                ("column".to_owned(), column.to_string()),
                ("position".to_owned(), position.to_string()),
            ],
            Self::Remove { guid } => vec![("guid".to_owned(), guid.to_string())],
            Self::SaveSettings { fields, .. } => fields.clone(),
        }
    }
}

/// Lists of messages the backend wants shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessages {
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub success: Vec<String>,
}

/// JSON envelope returned by every action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Rendered markup for add/save; absent or empty otherwise.
    #[serde(default)]
    pub output: Option<String>,
    /// Zero on success.
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub system_messages: SystemMessages,
}

impl ActionResponse {
    #[must_use]
    pub fn with_output(output: impl Into<String>) -> Self {
        Self { output: Some(output.into()), ..Self::default() }
    }

    /// Treat a non-zero status or any error message as a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Rejected`] carrying the backend's messages.
    pub fn into_result(self) -> Result<Self, ActionError> {
        if self.status != 0 || !self.system_messages.error.is_empty() {
            let message = if self.system_messages.error.is_empty() {
                format!("status {}", self.status)
            } else {
                self.system_messages.error.join("; ")
            };
            return Err(ActionError::Rejected(message));
        }
        Ok(self)
    }
}

/// Why a persistence request failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("action returned HTTP {0}")]
    Status(u16),
    #[error("malformed action response: {0}")]
    Decode(String),
    #[error("action rejected: {0}")]
    Rejected(String),
    #[error("response had no markup to insert")]
    MissingOutput,
}

/// Parse the JSON envelope and apply [`ActionResponse::into_result`].
///
/// # Errors
///
/// Returns [`ActionError::Decode`] for invalid JSON, or the rejection.
pub fn parse_response(body: &str) -> Result<ActionResponse, ActionError> {
    if body.trim().is_empty() {
        return Ok(ActionResponse::default());
    }
    let response: ActionResponse = serde_json::from_str(body).map_err(|e| ActionError::Decode(e.to_string()))?;
    response.into_result()
}
