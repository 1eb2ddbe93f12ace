//! Line-oriented terminal front end for the panel.
//!
//! `TerminalView` implements the view contract over any async line source
//! and any writer; `run` multiplexes typed commands with the auth event
//! stream. Widgets that are hidden in the current state (the sign-in inputs
//! once signed in, the form before an image is picked) reject commands the
//! same way a hidden button cannot be clicked.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::{AuthEvent, Product, ProductId};
use crate::panel::PanelController;
use crate::panel::view::{Credentials, PanelView, ProductForm};

pub const HELP: &str = "\
Commands:
  email <address>     set the sign-in email
  password <secret>   set the sign-in password
  signin              sign in
  signout             sign out
  add                 pick an image and open the add-product form
  name <text>         set the product name
  price <number>      set the price (12.50 or 12,50)
  category <text>     set the category (may be empty)
  save                upload the image and add the product
  cancel              close the form
  refresh             reload the product list
  delete <id>         delete a product
  help                show this list
  quit                exit";

const CURRENCY_SYMBOL: &str = "₺";

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Email(String),
    Password(String),
    SignIn,
    SignOut,
    Add,
    Name(String),
    Price(String),
    Category(String),
    Save,
    Cancel,
    Refresh,
    Delete(ProductId),
    Help,
    Quit,
}

impl Command {
    fn needs_anonymous(&self) -> bool {
        matches!(self, Self::Email(_) | Self::Password(_) | Self::SignIn)
    }

    fn needs_session(&self) -> bool {
        !self.needs_anonymous() && !matches!(self, Self::Help | Self::Quit)
    }

    fn needs_form(&self) -> bool {
        matches!(self, Self::Name(_) | Self::Price(_) | Self::Category(_) | Self::Save | Self::Cancel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
}

/// Parse one input line. Blank lines parse to `None`.
///
/// # Errors
///
/// Returns `Unknown` for unrecognized verbs and `MissingArgument` when a
/// verb that needs one has none.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let required = |name: &'static str| {
        if rest.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(rest.to_owned())
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "email" => Command::Email(required("email")?),
        "password" => Command::Password(required("password")?),
        "signin" => Command::SignIn,
        "signout" => Command::SignOut,
        "add" => Command::Add,
        "name" => Command::Name(rest.to_owned()),
        "price" => Command::Price(rest.to_owned()),
        "category" => Command::Category(rest.to_owned()),
        "save" => Command::Save,
        "cancel" => Command::Cancel,
        "refresh" => Command::Refresh,
        "delete" => Command::Delete(ProductId::new(required("delete")?)),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

// =============================================================================
// VIEW
// =============================================================================

pub struct TerminalView<R, W> {
    lines: Lines<R>,
    out: W,
    credentials: Credentials,
    form: ProductForm,
    identity: Option<String>,
    form_open: bool,
}

impl<R, W> TerminalView<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
            credentials: Credentials::default(),
            form: ProductForm::default(),
            identity: None,
            form_open: false,
        }
    }

    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Next input line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Propagates read failures from the input.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    pub fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "terminal write failed");
        }
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        if let Err(e) = write!(self.out, "{question} ").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "terminal write failed");
        }
        match self.next_line().await {
            Ok(line) => line.map(|answer| answer.trim().to_owned()),
            Err(e) => {
                tracing::warn!(error = %e, "terminal read failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl<R, W> PanelView for TerminalView<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    fn show_authenticated(&mut self, email: &str) {
        self.identity = Some(email.to_owned());
        self.say(&format!("Signed in as {email}. Type `help` for commands."));
    }

    fn show_anonymous(&mut self) {
        if self.identity.take().is_none() {
            return;
        }
        self.say("Signed out. Set `email` and `password`, then `signin`.");
    }

    fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }

    async fn pick_image(&mut self) -> Option<PathBuf> {
        let answer = self.ask("Image file (empty to cancel):").await?;
        (!answer.is_empty()).then(|| PathBuf::from(answer))
    }

    fn open_form(&mut self, file_name: &str, preview_data_url: &str) {
        self.form_open = true;
        self.say(&format!(
            "Add new product with image {file_name} (preview: {} bytes as data URL).\n\
             Set `name`, `price`, `category`, then `save` or `cancel`.",
            preview_data_url.len()
        ));
    }

    fn reset_form(&mut self) {
        self.form_open = false;
        self.form = ProductForm::default();
    }

    fn form(&self) -> ProductForm {
        self.form.clone()
    }

    fn set_saving(&mut self, saving: bool) {
        if saving {
            self.say("Saving...");
        }
    }

    fn clear_products(&mut self) {}

    fn render_products(&mut self, products: &[Product]) {
        self.say(&render_table(products));
    }

    fn alert(&mut self, message: &str) {
        self.say(&format!("! {message}"));
    }

    async fn confirm(&mut self, message: &str) -> bool {
        self.ask(&format!("{message} [y/N]"))
            .await
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn reload(&mut self) {
        self.credentials = Credentials::default();
        self.reset_form();
        self.identity = None;
        self.say("Panel reloaded. Set `email` and `password`, then `signin`.");
    }
}

/// Product table, one row per product, newest first.
#[must_use]
pub fn render_table(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products yet.".to_owned();
    }
    let header = format!("{:<8} {:<28} {:>10} {:<16} {}", "ID", "NAME", "PRICE", "CATEGORY", "IMAGE");
    let rows = products.iter().map(|p| {
        let category = p.category.as_deref().filter(|c| !c.is_empty()).unwrap_or("-");
        let image = p.image_url.as_deref().unwrap_or("-");
        format!(
            "{:<8} {:<28} {:>10} {:<16} {image}",
            p.id.as_str(),
            p.name,
            format!("{CURRENCY_SYMBOL}{}", p.price),
            category
        )
    });
    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

// =============================================================================
// DRIVER
// =============================================================================

enum Input {
    Line(Option<String>),
    Auth(Result<AuthEvent, RecvError>),
}

/// Run the panel until `quit` or end of input.
///
/// Auth events win over pending input so a sign-in's view change lands
/// before the next command is read.
///
/// # Errors
///
/// Returns input read failures.
pub async fn run<R, W>(
    controller: &mut PanelController<TerminalView<R, W>>,
    mut events: broadcast::Receiver<AuthEvent>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    loop {
        let input = tokio::select! {
            biased;
            event = events.recv() => Input::Auth(event),
            line = controller.view_mut().next_line() => Input::Line(line?),
        };

        match input {
            Input::Auth(Ok(event)) => controller.handle_auth_event(event).await,
            Input::Auth(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!(skipped, "auth events lagged");
            }
            Input::Auth(Err(RecvError::Closed)) => {
                tracing::warn!("auth event stream closed");
                return Ok(());
            }
            Input::Line(None) => return Ok(()),
            Input::Line(Some(line)) => {
                if !dispatch(controller, &line).await {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply one command line. Returns `false` when the panel should exit.
async fn dispatch<R, W>(controller: &mut PanelController<TerminalView<R, W>>, line: &str) -> bool
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            controller.view_mut().say(&format!("{e}; type `help` for commands."));
            return true;
        }
    };

    let signed_in = controller.auth_state().is_authenticated();
    let notice = if command.needs_anonymous() && signed_in {
        Some("Already signed in.")
    } else if command.needs_session() && !signed_in {
        Some("Sign in first.")
    } else if command.needs_form() && !controller.view().form_open {
        Some("Open the add-product form with `add` first.")
    } else {
        None
    };
    if let Some(notice) = notice {
        controller.view_mut().say(notice);
        return true;
    }

    match command {
        Command::Email(email) => controller.view_mut().credentials.email = email,
        Command::Password(password) => controller.view_mut().credentials.password = password,
        Command::SignIn => controller.sign_in().await,
        Command::SignOut => controller.sign_out().await,
        Command::Add => controller.select_image().await,
        Command::Name(name) => controller.view_mut().form.name = name,
        Command::Price(price) => controller.view_mut().form.price = price,
        Command::Category(category) => controller.view_mut().form.category = category,
        Command::Save => controller.save().await,
        Command::Cancel => controller.cancel_form(),
        Command::Refresh => controller.load_products().await,
        Command::Delete(id) => controller.delete_product(&id).await,
        Command::Help => controller.view_mut().say(HELP),
        Command::Quit => return false,
    }
    true
}

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;
