//! The bindings the panel controller needs from a front end.
//!
//! Every widget the controller touches is a required method here, so a
//! front end missing a binding fails to compile rather than failing on the
//! first click.

use std::path::PathBuf;

use crate::backend::Product;

/// Contents of the sign-in inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Raw contents of the add-product inputs, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub category: String,
}

#[async_trait::async_trait]
pub trait PanelView: Send {
    /// Show the main view and put `email` in the identity label.
    fn show_authenticated(&mut self, email: &str);

    /// Show the sign-in view and clear the identity label.
    fn show_anonymous(&mut self);

    fn credentials(&self) -> Credentials;

    /// Let the user choose an image file. `None` when the picker is dismissed.
    async fn pick_image(&mut self) -> Option<PathBuf>;

    /// Show the add-product form with the image preview.
    fn open_form(&mut self, file_name: &str, preview_data_url: &str);

    /// Hide the form, clear its inputs, and restore the "no preview"
    /// placeholder.
    fn reset_form(&mut self);

    fn form(&self) -> ProductForm;

    /// Disable the save control and show the busy label, or undo that.
    fn set_saving(&mut self, saving: bool);

    fn clear_products(&mut self);

    fn render_products(&mut self, products: &[Product]);

    /// Blocking notice to the user.
    fn alert(&mut self, message: &str);

    /// Yes/no question to the user.
    async fn confirm(&mut self, message: &str) -> bool;

    /// Return every widget to its initial state, as a page reload would.
    fn reload(&mut self);
}
