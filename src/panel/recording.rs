//! A view that records what the controller did to it, for tests.

use std::collections::VecDeque;
use std::path::PathBuf;

use super::view::{Credentials, PanelView, ProductForm};
use crate::backend::Product;

#[derive(Debug, Default)]
pub(crate) struct RecordingView {
    pub credentials: Credentials,
    pub form: ProductForm,
    /// Answers for successive `pick_image` calls; empty means dismissed.
    pub picks: VecDeque<PathBuf>,
    /// Answers for successive `confirm` calls; empty means "no".
    pub confirms: VecDeque<bool>,

    pub identity: Option<String>,
    pub main_visible: bool,
    pub form_open: bool,
    pub preview: Option<String>,
    pub saving: bool,
    pub saving_history: Vec<bool>,
    pub rows: Vec<Product>,
    pub alerts: Vec<String>,
    pub questions: Vec<String>,
    pub reloads: usize,
}

impl RecordingView {
    pub(crate) fn last_alert(&self) -> Option<&str> {
        self.alerts.last().map(String::as_str)
    }
}

#[async_trait::async_trait]
impl PanelView for RecordingView {
    fn show_authenticated(&mut self, email: &str) {
        self.identity = Some(email.to_owned());
        self.main_visible = true;
    }

    fn show_anonymous(&mut self) {
        self.identity = None;
        self.main_visible = false;
    }

    fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }

    async fn pick_image(&mut self) -> Option<PathBuf> {
        self.picks.pop_front()
    }

    fn open_form(&mut self, _file_name: &str, preview_data_url: &str) {
        self.form_open = true;
        self.preview = Some(preview_data_url.to_owned());
    }

    fn reset_form(&mut self) {
        self.form_open = false;
        self.preview = None;
        self.form = ProductForm::default();
    }

    fn form(&self) -> ProductForm {
        self.form.clone()
    }

    fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
        self.saving_history.push(saving);
    }

    fn clear_products(&mut self) {
        self.rows.clear();
    }

    fn render_products(&mut self, products: &[Product]) {
        self.rows = products.to_vec();
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }

    async fn confirm(&mut self, message: &str) -> bool {
        self.questions.push(message.to_owned());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn reload(&mut self) {
        self.reset_form();
        self.show_anonymous();
        self.rows.clear();
        self.reloads += 1;
    }
}
