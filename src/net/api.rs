//! Action transport for persisting board mutations.
//!
//! Client-side (hydrate): form posts via `gloo-net`, one spawned task per
//! request. Other builds supply their own [`ActionTransport`].
//!
//! ERROR HANDLING
//! ==============
//! Every outcome, including network failure, reaches the completion as a
//! `Result`; the transport never panics and never drops a completion.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::types::{ActionError, ActionKind, ActionRequest, ActionResponse};
#[cfg(feature = "hydrate")]
use crate::config::BoardConfig;

/// Called exactly once with the outcome of a request.
pub type Completion = Box<dyn FnOnce(Result<ActionResponse, ActionError>)>;

/// Fire-and-forget persistence collaborator.
pub trait ActionTransport {
    /// Start `request`. `done` runs later with the outcome; implementations
    /// must not call it before `send` returns.
    fn send(&self, request: ActionRequest, done: Completion);
}

/// Full URL of `kind` under `action_base`.
pub(crate) fn action_url(action_base: &str, kind: ActionKind) -> String {
    if action_base.is_empty() {
        return kind.endpoint().to_owned();
    }
    format!("{}/{}", action_base.trim_end_matches('/'), kind.endpoint())
}

/// Request fields followed by the page's security token fields. A token
/// whose name the request already carries is not repeated.
pub(crate) fn request_fields(request: &ActionRequest, token_fields: &[(String, String)]) -> Vec<(String, String)> {
    let mut fields = request.form_fields();
    for (name, value) in token_fields {
        if !fields.iter().any(|(existing, _)| existing == name) {
            fields.push((name.clone(), value.clone()));
        }
    }
    fields
}

/// Browser transport posting form-encoded actions.
#[cfg(feature = "hydrate")]
#[derive(Clone, Debug)]
pub struct GlooTransport {
    action_base: String,
    token_fields: Vec<(String, String)>,
}

#[cfg(feature = "hydrate")]
impl GlooTransport {
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            action_base: config.action_base.clone(),
            token_fields: config.token_fields(),
        }
    }
}

#[cfg(feature = "hydrate")]
impl ActionTransport for GlooTransport {
    fn send(&self, request: ActionRequest, done: Completion) {
        let url = action_url(&self.action_base, request.kind());
        let fields = request_fields(&request, &self.token_fields);
        leptos::task::spawn_local(async move {
            done(post_form(&url, &fields).await);
        });
    }
}

#[cfg(feature = "hydrate")]
async fn post_form(url: &str, fields: &[(String, String)]) -> Result<ActionResponse, ActionError> {
    let params = web_sys::UrlSearchParams::new().map_err(|e| ActionError::Transport(format!("{e:?}")))?;
    for (name, value) in fields {
        params.append(name, value);
    }
    let body: String = params.to_string().into();

    let resp = gloo_net::http::Request::post(url)
        .header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
        .header("X-Requested-With", "XMLHttpRequest")
        .body(body)
        .map_err(|e| ActionError::Transport(e.to_string()))?
        .send()
        .await
        .map_err(|e| ActionError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(ActionError::Status(resp.status()));
    }
    let text = resp.text().await.map_err(|e| ActionError::Transport(e.to_string()))?;
    super::types::parse_response(&text)
}
