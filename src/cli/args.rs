//! Command-line argument parsing

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docker-workbench")]
#[command(about = "Build, run and compose containers and manage remote registry images")]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(long = "quiet", short = 'q', global = true, help = "Only print errors and results")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(
        long = "config",
        global = true,
        help = "Path to configuration file (default: .docker-workbench/config.toml)"
    )]
    pub config: Option<PathBuf>,

    /// Workspace folder
    #[arg(
        long = "workspace",
        short = 'w',
        global = true,
        help = "Workspace folder (default: current directory)"
    )]
    pub workspace: Option<PathBuf>,

    /// Assume yes for confirmations
    #[arg(
        long = "yes",
        short = 'y',
        global = true,
        help = "Answer confirmations with yes and keep pre-selected choices"
    )]
    pub yes: bool,

    /// Dry run mode
    #[arg(
        long = "dry-run",
        short = 'n',
        global = true,
        help = "Print terminal commands instead of running them"
    )]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an image from a Dockerfile
    Build {
        #[arg(help = "Dockerfile to build (prompted when omitted)")]
        dockerfile: Option<PathBuf>,
    },
    /// Run a container from an image
    Run {
        #[arg(help = "Image to run")]
        image: String,
        #[arg(long = "interactive", short = 'i', help = "Run attached with a TTY")]
        interactive: bool,
    },
    /// Tag a local image under a new name
    Tag {
        #[arg(help = "Image to tag")]
        image: String,
        #[arg(
            long = "base-image-path",
            help = "Registry path suggested as the new name's prefix"
        )]
        base_image_path: Option<String>,
    },
    /// Remove containers
    Rm {
        #[arg(required = true, help = "Containers to remove")]
        containers: Vec<String>,
    },
    /// Docker Compose commands
    #[command(subcommand)]
    Compose(ComposeCommand),
    /// Remote registry commands
    #[command(subcommand, disable_help_subcommand = true)]
    Registry(RegistryCommand),
    /// .NET container task helpers
    #[command(subcommand)]
    Netcore(NetcoreCommand),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ComposeFiles {
    #[arg(long = "file", short = 'f', help = "Compose files (prompted when omitted)")]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ComposeCommand {
    /// Bring the application up
    Up(ComposeFiles),
    /// Bring selected services or profiles up
    UpSubset(ComposeFiles),
    /// Take the application down
    Down(ComposeFiles),
    /// Take the application down, then up
    Restart(ComposeFiles),
}

#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// Print the manifest digest of a remote image
    Digest {
        image: String,
    },
    /// List the tags of a remote repository
    Tags {
        image: String,
    },
    /// Delete a remote image (and every tag sharing its digest)
    Delete {
        image: String,
    },
    /// Open a Docker Hub user, repository or tag in the browser
    HubUrl {
        #[arg(help = "user, namespace/repository or namespace/repository:tag")]
        item: String,
        #[arg(long = "print", help = "Print the URL instead of opening it")]
        print: bool,
    },
    /// Open the registry help page
    Help,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct NetcoreProject {
    #[arg(long = "project", help = "Project file (.csproj or .fsproj)")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum NetcoreCommand {
    /// Print the run options for a .NET container as JSON
    RunOptions {
        #[command(flatten)]
        project: NetcoreProject,
        #[arg(long = "debug", help = "Include debugging volumes")]
        debug: bool,
        #[arg(long = "ssl", help = "Configure SSL (mounts dev certificates)")]
        ssl: Option<bool>,
        #[arg(long = "image", help = "Image to run")]
        image: Option<String>,
        #[arg(long = "windows", help = "Target Windows containers")]
        windows: bool,
    },
    /// Build a container image with the .NET SDK
    SdkBuild {
        #[command(flatten)]
        project: NetcoreProject,
        #[arg(long = "tag", short = 't', help = "Image tag (default: folder name)")]
        tag: Option<String>,
        #[arg(long = "platform", help = "Target platform, e.g. linux/amd64")]
        platform: Option<String>,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be combined".to_string());
        }
        if let Some(workspace) = &self.workspace {
            if !workspace.is_dir() {
                return Err(format!(
                    "Workspace folder does not exist: {}",
                    workspace.display()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_compose_up_subset() {
        let args = Args::try_parse_from([
            "docker-workbench",
            "compose",
            "up-subset",
            "-f",
            "compose.yml",
            "--yes",
        ])
        .unwrap();
        assert!(args.yes);
        match args.command {
            Command::Compose(ComposeCommand::UpSubset(files)) => {
                assert_eq!(files.files, vec![PathBuf::from("compose.yml")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_registry_delete() {
        let args =
            Args::try_parse_from(["docker-workbench", "-v", "registry", "delete", "alpine:3.19"])
                .unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Registry(RegistryCommand::Delete { ref image }) if image == "alpine:3.19"
        ));
    }

    #[test]
    fn test_validate_conflicting_verbosity() {
        let args =
            Args::try_parse_from(["docker-workbench", "-v", "-q", "registry", "help"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rm_requires_containers() {
        assert!(Args::try_parse_from(["docker-workbench", "rm"]).is_err());
    }
}
