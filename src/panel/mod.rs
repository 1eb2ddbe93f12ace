//! Panel controller and the view contract it drives.
//!
//! DESIGN
//! ======
//! One `PanelController` per panel owns everything the page used to keep in
//! loose globals: auth state, the pending upload, and the view handle.
//! Auth transitions only happen in `handle_auth_event`; sign-in never flips
//! the view itself and waits for the provider's event instead.

pub mod controller;
pub mod form;
pub mod view;

#[cfg(test)]
pub(crate) mod recording;

pub use controller::{AuthState, PanelController, SaveError};
