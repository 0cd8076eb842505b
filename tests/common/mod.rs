#![allow(dead_code)]

use async_trait::async_trait;
use docker_workbench::config::AppConfig;
use docker_workbench::engine::ContainerEngine;
use docker_workbench::error::{Result, WorkbenchError};
use docker_workbench::logging::Logger;
use docker_workbench::prompt::{InputBoxOptions, PickItem, Prompter};
use docker_workbench::runner::{CommandOutput, CommandRunner};
use docker_workbench::state::StateStore;
use docker_workbench::workbench::Workbench;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records every command; captured output is scripted by command suffix
#[derive(Default)]
pub struct FakeRunner {
    pub ran: Mutex<Vec<String>>,
    pub captured: Mutex<Vec<String>>,
    outputs: Mutex<Vec<(String, String)>>,
}

impl FakeRunner {
    pub fn with_output(self, suffix: &str, stdout: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push((suffix.to_string(), stdout.to_string()));
        self
    }

    pub fn ran(&self) -> Vec<String> {
        self.ran.lock().unwrap().clone()
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn capture(&self, command_line: &str, _cwd: &Path) -> Result<CommandOutput> {
        self.captured.lock().unwrap().push(command_line.to_string());
        let stdout = self
            .outputs
            .lock()
            .unwrap()
            .iter()
            .find(|(suffix, _)| command_line.ends_with(suffix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }

    async fn run(&self, command_line: &str, _cwd: &Path) -> Result<()> {
        self.ran.lock().unwrap().push(command_line.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    One(usize),
    Many(Vec<usize>),
    /// `pick_many` keeps whatever was pre-selected
    Preselected,
    Yes,
    Dismiss,
}

/// Answers prompts from a script and records what was asked
#[derive(Default)]
pub struct FakePrompter {
    answers: Mutex<VecDeque<Answer>>,
    pub inputs: Mutex<Vec<InputBoxOptions>>,
    pub picks: Mutex<Vec<(String, Vec<PickItem>)>>,
    pub confirms: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<(String, Option<String>)>>,
    pub infos: Mutex<Vec<String>>,
}

impl FakePrompter {
    pub fn answering(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    fn next(&self) -> Answer {
        self.answers.lock().unwrap().pop_front().unwrap_or(Answer::Dismiss)
    }

    pub fn pick_placeholders(&self) -> Vec<String> {
        self.picks.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }
}

#[async_trait]
impl Prompter for FakePrompter {
    async fn input_box(&self, options: InputBoxOptions) -> Result<String> {
        let value = options.value.clone();
        self.inputs.lock().unwrap().push(options);
        match self.next() {
            Answer::Text(text) => Ok(text),
            Answer::Yes => Ok(value),
            _ => Err(WorkbenchError::cancelled()),
        }
    }

    async fn pick_one(&self, placeholder: &str, items: &[PickItem]) -> Result<usize> {
        self.picks
            .lock()
            .unwrap()
            .push((placeholder.to_string(), items.to_vec()));
        match self.next() {
            Answer::One(index) => Ok(index),
            _ => Err(WorkbenchError::cancelled()),
        }
    }

    async fn pick_many(&self, placeholder: &str, items: &[PickItem]) -> Result<Vec<usize>> {
        self.picks
            .lock()
            .unwrap()
            .push((placeholder.to_string(), items.to_vec()));
        match self.next() {
            Answer::Many(indices) => Ok(indices),
            Answer::Preselected => Ok(items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.picked)
                .map(|(i, _)| i)
                .collect()),
            _ => Err(WorkbenchError::cancelled()),
        }
    }

    async fn confirm(&self, message: &str, _action: &str) -> Result<()> {
        self.confirms.lock().unwrap().push(message.to_string());
        match self.next() {
            Answer::Yes => Ok(()),
            _ => Err(WorkbenchError::cancelled()),
        }
    }

    async fn show_warning(&self, message: &str, learn_more: Option<&str>) {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_string(), learn_more.map(str::to_string)));
    }

    async fn show_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }
}

/// Engine whose removals fail for names starting with `bad`
#[derive(Default)]
pub struct FakeEngine {
    pub tagged: Mutex<Vec<(String, String)>>,
    pub removed: Mutex<Vec<String>>,
    pub ports: Vec<String>,
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn tag_image(&self, from_image: &str, to_image: &str) -> Result<()> {
        self.tagged
            .lock()
            .unwrap()
            .push((from_image.to_string(), to_image.to_string()));
        Ok(())
    }

    async fn remove_container(&self, container: &str) -> Result<()> {
        if container.starts_with("bad") {
            return Err(WorkbenchError::CommandFailed {
                command: format!("docker container rm --force {}", container),
                code: Some(1),
                stderr: format!("No such container: {}", container),
            });
        }
        self.removed.lock().unwrap().push(container.to_string());
        Ok(())
    }

    async fn inspect_image_user(&self, _image: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn inspect_image_ports(&self, _image: &str) -> Result<Vec<String>> {
        Ok(self.ports.clone())
    }
}

pub struct Harness {
    pub workbench: Workbench,
    pub runner: Arc<FakeRunner>,
    pub prompter: Arc<FakePrompter>,
    pub engine: Arc<FakeEngine>,
}

pub fn harness(
    workspace: &Path,
    config: AppConfig,
    runner: FakeRunner,
    prompter: FakePrompter,
    engine: FakeEngine,
) -> Harness {
    let runner = Arc::new(runner);
    let prompter = Arc::new(prompter);
    let engine = Arc::new(engine);
    let workbench = Workbench {
        config,
        workspace: workspace.to_path_buf(),
        runner: runner.clone(),
        engine: engine.clone(),
        prompter: prompter.clone(),
        state: StateStore::for_workspace(workspace),
        logger: Logger::new_quiet(),
    };
    Harness {
        workbench,
        runner,
        prompter,
        engine,
    }
}
