//! Editing session for archstudio diagrams.
//!
//! [`Editor`] owns a [`Diagram`](archstudio_core::Diagram), routes pointer
//! input through the interaction state machine and reports every change to the
//! configured collaborators.

mod config;
mod editor;
mod hit;
mod interaction;

pub use config::EditorConfig;
pub use editor::Editor;
pub use hit::{hit_test, HitTarget};
pub use interaction::{ConnectionRequest, Interaction, PointerResponse, Selection};
