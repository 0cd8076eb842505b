//! Dispatches parsed arguments to the command handlers

use crate::cli::args::{Args, Command, ComposeCommand, ComposeFiles, NetcoreCommand, RegistryCommand};
use crate::commands::{self, DockerHubItem};
use crate::compose::{self, ComposeTarget};
use crate::config::AppConfig;
use crate::engine::DockerCli;
use crate::error::{Result, WorkbenchError};
use crate::logging::Logger;
use crate::prompt::ConsolePrompter;
use crate::registry::RegistryClient;
use crate::runner::ShellRunner;
use crate::state::StateStore;
use crate::tasks::netcore::{DockerBuildOptions, DockerRunOptions, NetCoreTaskHelper, NetCoreTaskOptions, PlatformOs};
use crate::workbench::Workbench;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        args.validate().map_err(WorkbenchError::Validation)?;

        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, logger })
    }

    fn workspace(&self) -> Result<PathBuf> {
        match &self.args.workspace {
            Some(path) => Ok(std::fs::canonicalize(path)?),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn workbench(&self) -> Result<Workbench> {
        let workspace = self.workspace()?;
        let config = AppConfig::load(self.args.config.as_deref(), &workspace)?;

        let runner = Arc::new(ShellRunner::new(self.logger.clone()).with_dry_run(self.args.dry_run));
        let engine = Arc::new(DockerCli::new(
            runner.clone(),
            config.container_command.clone(),
            workspace.clone(),
        ));
        let prompter = Arc::new(ConsolePrompter::new(self.logger.clone(), self.args.yes));

        self.logger.verbose(&format!("Workspace: {}", workspace.display()));
        Ok(Workbench {
            state: StateStore::for_workspace(&workspace),
            config,
            workspace,
            runner,
            engine,
            prompter,
            logger: self.logger.clone(),
        })
    }

    fn registry_client(&self, config: &AppConfig) -> Result<RegistryClient> {
        RegistryClient::builder(config.client_id.clone())
            .with_timeout(config.timeout)
            .with_skip_tls(config.skip_tls)
            .with_rules(config.registries.clone())
            .build()
    }

    pub async fn run(&self) -> Result<()> {
        self.dispatch().await?;
        self.logger
            .verbose(&format!("Completed in {}", self.logger.elapsed_time()));
        Ok(())
    }

    async fn dispatch(&self) -> Result<()> {
        match &self.args.command {
            Command::Build { dockerfile } => {
                let workbench = self.workbench()?;
                commands::build_image(&workbench, dockerfile.as_deref()).await
            }
            Command::Run { image, interactive } => {
                let workbench = self.workbench()?;
                commands::run_image(&workbench, image, *interactive).await
            }
            Command::Tag {
                image,
                base_image_path,
            } => {
                let workbench = self.workbench()?;
                let new_name = commands::tag_image(&workbench, image, base_image_path.as_deref()).await?;
                self.logger.value(&new_name);
                Ok(())
            }
            Command::Rm { containers } => {
                let workbench = self.workbench()?;
                commands::remove_containers(&workbench, containers).await
            }
            Command::Compose(command) => self.run_compose(command).await,
            Command::Registry(command) => self.run_registry(command).await,
            Command::Netcore(command) => self.run_netcore(command).await,
        }
    }

    async fn run_compose(&self, command: &ComposeCommand) -> Result<()> {
        let workbench = self.workbench()?;
        let target = |files: &ComposeFiles| ComposeTarget {
            file: None,
            selected_files: files.files.clone(),
        };

        match command {
            ComposeCommand::Up(files) => compose::compose_up(&workbench, &target(files)).await,
            ComposeCommand::UpSubset(files) => {
                compose::compose_up_subset(&workbench, &target(files)).await
            }
            ComposeCommand::Down(files) => compose::compose_down(&workbench, &target(files)).await,
            ComposeCommand::Restart(files) => {
                compose::compose_restart(&workbench, &target(files)).await
            }
        }
    }

    async fn run_registry(&self, command: &RegistryCommand) -> Result<()> {
        match command {
            RegistryCommand::HubUrl { item, print } => {
                let item = DockerHubItem::parse(item)?;
                if *print {
                    self.logger.value(&commands::docker_hub_url(&item));
                } else {
                    let url = commands::open_docker_hub_in_browser(&item)?;
                    self.logger.verbose(&format!("Opened {}", url));
                }
                Ok(())
            }
            RegistryCommand::Help => commands::registry_help(),
            RegistryCommand::Digest { image } => {
                let workbench = self.workbench()?;
                let client = self.registry_client(&workbench.config)?;
                commands::copy_remote_image_digest(&workbench, &client, image).await?;
                Ok(())
            }
            RegistryCommand::Tags { image } => {
                let workbench = self.workbench()?;
                let client = self.registry_client(&workbench.config)?;
                commands::list_remote_tags(&workbench, &client, image).await?;
                Ok(())
            }
            RegistryCommand::Delete { image } => {
                let workbench = self.workbench()?;
                let client = self.registry_client(&workbench.config)?;
                commands::delete_remote_image(&workbench, &client, image).await
            }
        }
    }

    async fn run_netcore(&self, command: &NetcoreCommand) -> Result<()> {
        let workbench = self.workbench()?;
        let helper = NetCoreTaskHelper::new(workbench.engine.clone());

        match command {
            NetcoreCommand::RunOptions {
                project,
                debug,
                ssl,
                image,
                windows,
            } => {
                let options = NetCoreTaskOptions {
                    app_project: project.project.clone(),
                    configure_ssl: *ssl,
                    enable_debugging: *debug,
                    use_sdk_build: false,
                };
                let app_project = helper
                    .infer_app_project(&workbench.workspace, &options, workbench.prompter.as_ref())
                    .await?;
                let run = DockerRunOptions {
                    image: image.clone(),
                    os: windows.then_some(PlatformOs::Windows),
                    ..Default::default()
                };
                let run = helper
                    .run_options(&workbench.workspace, &app_project, &options, run)
                    .await?;
                self.logger.value(&serde_json::to_string_pretty(&run)?);
                Ok(())
            }
            NetcoreCommand::SdkBuild {
                project,
                tag,
                platform,
            } => {
                workbench.ensure_trusted()?;
                let options = NetCoreTaskOptions {
                    app_project: project.project.clone(),
                    use_sdk_build: true,
                    ..Default::default()
                };
                let app_project = helper
                    .infer_app_project(&workbench.workspace, &options, workbench.prompter.as_ref())
                    .await?;
                let build = DockerBuildOptions {
                    tag: tag.clone(),
                    platform: platform.clone(),
                    ..Default::default()
                };
                let Some(line) = helper
                    .sdk_build_command(&workbench.workspace, &app_project, &options, build)
                    .await?
                else {
                    return Ok(());
                };
                let folder = app_project
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| workbench.workspace.clone());
                workbench.runner.run(&line, &folder).await
            }
        }
    }
}
