//! Client-side board state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `layout` is the ordered column model re-derived from the page, and
//! `availability` tracks which single-instance widget types may still be added.
//! `content` remembers what to restore when a settings save fails.
//! All of them are owned by `board::WidgetBoard` and mutated only from its handlers.

pub mod availability;
pub mod content;
pub mod ids;
pub mod layout;
