//! Terminal prompts.

use appservice_tree::{InputBoxOptions, MessageLevel, QuickPickItem, UserPrompt};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use futures_util::future::BoxFuture;

/// [`UserPrompt`] backed by `dialoguer`.
///
/// Prompts block the calling worker thread while the user types, so this
/// needs the multi-threaded runtime.
pub struct TerminalPrompt {
    theme: ColorfulTheme,
    /// Answer every confirmation with its first button.
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            assume_yes,
        }
    }

    fn pick(&self, labels: &[String], prompt: &str) -> Option<usize> {
        let result = tokio::task::block_in_place(|| {
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(labels)
                .default(0)
                .interact_opt()
        });
        match result {
            Ok(choice) => choice,
            Err(e) => {
                tracing::debug!(error = %e, "selection aborted");
                None
            }
        }
    }
}

fn level_prefix(level: MessageLevel) -> &'static str {
    match level {
        MessageLevel::Info => "info",
        MessageLevel::Warning => "warning",
        MessageLevel::Error => "error",
    }
}

impl UserPrompt for TerminalPrompt {
    fn show_quick_pick<'a>(
        &'a self,
        items: &'a [QuickPickItem],
        placeholder: &'a str,
    ) -> BoxFuture<'a, Option<usize>> {
        let labels: Vec<String> = items
            .iter()
            .map(|item| match &item.description {
                Some(description) => format!("{}  {description}", item.label),
                None => item.label.clone(),
            })
            .collect();
        Box::pin(async move { self.pick(&labels, placeholder) })
    }

    fn show_message<'a>(
        &'a self,
        level: MessageLevel,
        message: &'a str,
        buttons: &'a [&'a str],
    ) -> BoxFuture<'a, Option<usize>> {
        Box::pin(async move {
            eprintln!("{}: {message}", level_prefix(level));
            if buttons.is_empty() {
                return None;
            }
            if self.assume_yes {
                return Some(0);
            }
            let mut labels: Vec<String> = buttons.iter().map(|b| b.to_string()).collect();
            labels.push("Cancel".into());
            self.pick(&labels, "Choose an action")
                .filter(|&i| i < buttons.len())
        })
    }

    fn show_input_box<'a>(
        &'a self,
        options: &'a InputBoxOptions,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let result = tokio::task::block_in_place(|| {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(&options.prompt)
                    .validate_with(|text: &String| match options.check(text) {
                        Some(reason) => Err(reason),
                        None => Ok(()),
                    });
                if let Some(value) = &options.value {
                    input = input.with_initial_text(value);
                }
                input.interact_text()
            });
            match result {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::debug!(error = %e, "input aborted");
                    None
                }
            }
        })
    }

    fn open_url(&self, url: &str) {
        println!("Open {url} in your browser.");
    }
}
