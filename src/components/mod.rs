//! Server-rendered board chrome.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components emit the markup contract the board reads at init: the add
//! panel with its triggers and the empty column containers. Widget bodies
//! come from the backend as fragments and are not rendered here.

pub mod widget_shell;
