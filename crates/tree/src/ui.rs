//! User interaction surface supplied by the host.
//!
//! Every prompt resolves to `None` when the user dismisses it.

use std::fmt;

use futures_util::future::BoxFuture;

/// One entry of a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickPickItem {
    pub label: String,
    pub description: Option<String>,
}

impl QuickPickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Severity of a message dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// Validation callback: `Some(message)` rejects the input.
pub type InputValidator = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Options for a free-text prompt.
#[derive(Default)]
pub struct InputBoxOptions {
    pub prompt: String,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub validate: Option<InputValidator>,
}

impl InputBoxOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_validator(
        mut self,
        validate: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Runs the validator, if any.
    pub fn check(&self, input: &str) -> Option<String> {
        self.validate.as_ref().and_then(|v| v(input))
    }
}

impl fmt::Debug for InputBoxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBoxOptions")
            .field("prompt", &self.prompt)
            .field("value", &self.value)
            .field("placeholder", &self.placeholder)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

/// Prompts the host shows on behalf of tree and workflow code.
pub trait UserPrompt: Send + Sync {
    /// Shows a selection list; returns the chosen index.
    fn show_quick_pick<'a>(
        &'a self,
        items: &'a [QuickPickItem],
        placeholder: &'a str,
    ) -> BoxFuture<'a, Option<usize>>;

    /// Shows a modal message with buttons; returns the chosen button index.
    fn show_message<'a>(
        &'a self,
        level: MessageLevel,
        message: &'a str,
        buttons: &'a [&'a str],
    ) -> BoxFuture<'a, Option<usize>>;

    /// Asks for free text.
    fn show_input_box<'a>(&'a self, options: &'a InputBoxOptions)
    -> BoxFuture<'a, Option<String>>;

    /// Opens a URL in the user's browser.
    fn open_url(&self, url: &str);
}
