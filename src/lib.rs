//! # menu-admin
//!
//! Terminal administration panel for a restaurant menu catalog hosted on a
//! Supabase-style backend (password auth, object storage, row API).
//!
//! The [`panel::PanelController`] owns UI-session state and reaches the
//! backend only through the capability traits in [`backend`]. The terminal
//! front end in [`terminal`] is one implementation of
//! [`panel::view::PanelView`]; tests drive the controller with a recording
//! view and an in-memory backend instead.

pub mod backend;
pub mod config;
pub mod panel;
pub mod sanitize;
pub mod session;
pub mod terminal;
pub mod upload;
