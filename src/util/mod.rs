//! Utility helpers shared across board modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `ident` decodes the composite element ids the markup carries, and
//! `equal_height` levels column containers so empty columns stay droppable.

pub mod equal_height;
pub mod ident;
