//! User interaction
//!
//! Command handlers never talk to the terminal directly; they go through a
//! [`Prompter`]. Dismissing any prompt yields [`WorkbenchError::Cancelled`].

use crate::error::{Result, WorkbenchError};
use crate::logging::Logger;
use async_trait::async_trait;
use std::ops::Range;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// One entry of a pick list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: Option<String>,
    /// Pre-selected in a multi-pick
    pub picked: bool,
}

impl PickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            picked: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn picked(mut self, picked: bool) -> Self {
        self.picked = picked;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBoxOptions {
    pub prompt: String,
    pub value: String,
    /// Character range of `value` to pre-select
    pub value_selection: Option<Range<usize>>,
}

#[async_trait]
pub trait Prompter: Send + Sync {
    async fn input_box(&self, options: InputBoxOptions) -> Result<String>;

    /// Returns the index of the chosen item
    async fn pick_one(&self, placeholder: &str, items: &[PickItem]) -> Result<usize>;

    /// Returns the indices of the chosen items, possibly none
    async fn pick_many(&self, placeholder: &str, items: &[PickItem]) -> Result<Vec<usize>>;

    /// Modal confirmation; declining is a cancellation
    async fn confirm(&self, message: &str, action: &str) -> Result<()>;

    async fn show_warning(&self, message: &str, learn_more: Option<&str>);

    async fn show_info(&self, message: &str);
}

/// Line-based prompts on stdin/stdout
pub struct ConsolePrompter {
    logger: Logger,
    assume_yes: bool,
    input: Mutex<BufReader<Stdin>>,
}

impl ConsolePrompter {
    pub fn new(logger: Logger, assume_yes: bool) -> Self {
        Self {
            logger,
            assume_yes,
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn ask(&self, question: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Err(WorkbenchError::cancelled());
        }
        Ok(line.trim().to_string())
    }

    fn print_items(&self, placeholder: &str, items: &[PickItem]) {
        println!("{}", placeholder);
        for (i, item) in items.iter().enumerate() {
            let marker = if item.picked { "*" } else { " " };
            match &item.description {
                Some(description) => {
                    println!(" {}{:>3}) {}  {}", marker, i + 1, item.label, description)
                }
                None => println!(" {}{:>3}) {}", marker, i + 1, item.label),
            }
        }
    }
}

fn parse_choice(answer: &str, len: usize) -> Result<usize> {
    answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| {
            WorkbenchError::Validation(format!(
                "'{}' is not a number between 1 and {}",
                answer, len
            ))
        })
}

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn input_box(&self, options: InputBoxOptions) -> Result<String> {
        let question = if options.value.is_empty() {
            format!("{}: ", options.prompt)
        } else {
            format!("{} [{}]: ", options.prompt, options.value)
        };
        let answer = self.ask(&question).await?;

        // An empty answer accepts the suggestion
        if answer.is_empty() {
            if options.value.is_empty() {
                return Err(WorkbenchError::cancelled());
            }
            return Ok(options.value);
        }
        Ok(answer)
    }

    async fn pick_one(&self, placeholder: &str, items: &[PickItem]) -> Result<usize> {
        if items.is_empty() {
            return Err(WorkbenchError::NotFound(format!(
                "Nothing to choose for: {}",
                placeholder
            )));
        }
        if self.assume_yes && items.len() == 1 {
            return Ok(0);
        }

        self.print_items(placeholder, items);
        let answer = self.ask("> ").await?;
        if answer.is_empty() {
            return Err(WorkbenchError::cancelled());
        }
        parse_choice(&answer, items.len())
    }

    async fn pick_many(&self, placeholder: &str, items: &[PickItem]) -> Result<Vec<usize>> {
        let preselected: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.picked)
            .map(|(i, _)| i)
            .collect();
        if self.assume_yes {
            return Ok(preselected);
        }

        self.print_items(
            &format!("{} (comma separated, empty keeps *)", placeholder),
            items,
        );
        let answer = self.ask("> ").await?;
        if answer.is_empty() {
            return Ok(preselected);
        }
        answer
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_choice(part, items.len()))
            .collect()
    }

    async fn confirm(&self, message: &str, action: &str) -> Result<()> {
        if self.assume_yes {
            self.logger
                .verbose(&format!("{} ({}: assumed)", message, action));
            return Ok(());
        }

        let answer = self
            .ask(&format!("{} {} [y/N]: ", message, action))
            .await?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" => Ok(()),
            _ => Err(WorkbenchError::cancelled()),
        }
    }

    async fn show_warning(&self, message: &str, learn_more: Option<&str>) {
        self.logger.warning(message);
        if let Some(link) = learn_more {
            self.logger.detail(&format!("Learn more: {}", link));
        }
    }

    async fn show_info(&self, message: &str) {
        self.logger.success(message);
    }
}
