//! Widget dashboard layout sync.
//!
//! SYSTEM CONTEXT
//! ==============
//! A dashboard shows widgets in ordered columns. The user adds widgets from
//! an add panel, drags them between columns, deletes them, toggles their
//! settings and collapses them. Every mutation is applied to the page and
//! the local layout model right away and persisted through fire-and-forget
//! actions; settings and added widgets come back as server-rendered markup.
//!
//! `board::WidgetBoard` is the per-page context. It talks to the displayed
//! markup through `dom::Page` and to the backend through
//! `net::api::ActionTransport`, so the whole protocol runs against the
//! in-memory page in tests and against `web_sys` in the browser.

pub mod board;
pub mod components;
pub mod config;
pub mod dom;
#[cfg(feature = "hydrate")]
pub mod mount;
pub mod net;
pub mod state;
pub mod util;
