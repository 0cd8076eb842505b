//! .NET container task options
//!
//! Fills in build and run options for .NET projects: defaults for the image,
//! container and environment, the volumes a debug session needs, and the SDK
//! container publish command.

use crate::engine::ContainerEngine;
use crate::error::{Result, WorkbenchError};
use crate::image::valid_image_name_from_path;
use crate::prompt::{PickItem, Prompter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

static USER_SECRETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)UserSecretsId").unwrap());
static WEB_SDK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)Sdk\s*=\s*"Microsoft\.NET\.Sdk\.Web""#).unwrap());
static PROJECT_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(cs|fs)proj$").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformOs {
    #[default]
    Linux,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumePermissions {
    Rw,
    Ro,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerVolume {
    pub local_path: PathBuf,
    pub container_path: String,
    pub permissions: VolumePermissions,
}

impl ContainerVolume {
    fn new(local_path: impl Into<PathBuf>, container_path: impl Into<String>, permissions: VolumePermissions) -> Self {
        Self {
            local_path: local_path.into(),
            container_path: container_path.into(),
            permissions,
        }
    }
}

/// Add `volume` unless another one already mounts at the same container path
pub fn add_volume_without_conflicts(volumes: &mut Vec<ContainerVolume>, volume: ContainerVolume) -> bool {
    if volumes.iter().any(|v| v.container_path == volume.container_path) {
        return false;
    }
    volumes.push(volume);
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetCoreTaskOptions {
    pub app_project: Option<PathBuf>,
    /// `None` means "not configured", which leaves SSL off
    pub configure_ssl: Option<bool>,
    #[serde(default)]
    pub enable_debugging: bool,
    #[serde(default)]
    pub use_sdk_build: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerBuildOptions {
    pub context: Option<String>,
    pub dockerfile: Option<String>,
    pub tag: Option<String>,
    pub target: Option<String>,
    /// e.g. `linux/amd64`
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerRunOptions {
    pub container_name: Option<String>,
    pub image: Option<String>,
    pub os: Option<PlatformOs>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<ContainerVolume>,
}

/// Host folders holding user secrets and dev certificates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSecretsFolders {
    pub user_secrets: PathBuf,
    pub certificates: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSecretsFolders {
    pub user_secrets: String,
    pub certificates: String,
}

/// `name:tag` derived from a workspace folder name
pub fn default_image_name(folder: &Path, tag: &str) -> String {
    valid_image_name_from_path(folder, tag)
}

pub fn default_container_name(folder: &Path, tag: &str) -> String {
    let image = valid_image_name_from_path(folder, tag);
    image.replacen(':', "-", 1)
}

pub fn container_secrets_folders(os: PlatformOs, user: Option<&str>) -> ContainerSecretsFolders {
    match os {
        PlatformOs::Windows => {
            let user = user.unwrap_or("ContainerUser");
            let roaming = format!("C:\\Users\\{}\\AppData\\Roaming", user);
            ContainerSecretsFolders {
                user_secrets: format!("{}\\Microsoft\\UserSecrets", roaming),
                certificates: format!("{}\\ASP.NET\\Https", roaming),
            }
        }
        PlatformOs::Linux => {
            let home = match user {
                None | Some("root") => "/root".to_string(),
                Some(user) => format!("/home/{}", user),
            };
            ContainerSecretsFolders {
                user_secrets: format!("{}/.microsoft/usersecrets", home),
                certificates: format!("{}/.aspnet/https", home),
            }
        }
    }
}

/// Map a Docker platform such as `linux/amd64` to .NET runtime os and arch
pub fn runtime_os_and_arch(platform: Option<&str>) -> (String, String) {
    let Some((os, arch)) = platform.and_then(|p| p.split_once('/')) else {
        return ("linux".to_string(), "x64".to_string());
    };
    let arch = match arch.to_lowercase().as_str() {
        "amd64" => "x64".to_string(),
        "386" => "x86".to_string(),
        _ => arch.to_string(),
    };
    (os.to_string(), arch)
}

/// `dotnet publish` invocation building a container image without a Dockerfile
pub fn sdk_build_command(build: &DockerBuildOptions, is_web_app: bool) -> Result<String> {
    let tag = build
        .tag
        .as_deref()
        .ok_or_else(|| WorkbenchError::Validation("An image tag is required for SDK builds".to_string()))?;
    let (name, image_tag) = split_image_tag(tag);
    let (os, arch) = runtime_os_and_arch(build.platform.as_deref());
    let publish_flag = if is_web_app {
        "-p:PublishProfile=DefaultContainer"
    } else {
        "/t:PublishContainer"
    };

    Ok(format!(
        "dotnet publish --os {} --arch {} {} -c Debug -p:ContainerImageName={} -p:ContainerImageTag={}",
        os, arch, publish_flag, name, image_tag
    ))
}

/// Split `name:tag` at the tag separator, not at a registry port
fn split_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image, "latest"),
    }
}

pub fn is_web_app(project_contents: &str) -> bool {
    WEB_SDK.is_match(project_contents)
}

pub fn has_user_secrets(project_contents: &str) -> bool {
    USER_SECRETS.is_match(project_contents)
}

pub struct NetCoreTaskHelper {
    engine: Arc<dyn ContainerEngine>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
}

impl NetCoreTaskHelper {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            engine,
            home: dirs::home_dir(),
            app_data: dirs::config_dir(),
        }
    }

    /// Override the user's home folder
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.app_data = Some(home.join("AppData").join("Roaming"));
        self.home = Some(home);
        self
    }

    fn home(&self) -> Result<&Path> {
        self.home
            .as_deref()
            .ok_or_else(|| WorkbenchError::Config("Cannot determine the home folder".to_string()))
    }

    pub fn host_secrets_folders(&self) -> Result<HostSecretsFolders> {
        if cfg!(windows) {
            let app_data = self
                .app_data
                .as_deref()
                .ok_or_else(|| WorkbenchError::Config("Cannot determine %APPDATA%".to_string()))?;
            Ok(HostSecretsFolders {
                user_secrets: app_data.join("Microsoft").join("UserSecrets"),
                certificates: app_data.join("ASP.NET").join("Https"),
            })
        } else {
            let home = self.home()?;
            Ok(HostSecretsFolders {
                user_secrets: home.join(".microsoft").join("usersecrets"),
                certificates: home.join(".aspnet").join("https"),
            })
        }
    }

    /// The explicit project, else the single `.csproj`/`.fsproj` in `folder`, else ask
    pub async fn infer_app_project(
        &self,
        folder: &Path,
        options: &NetCoreTaskOptions,
        prompter: &dyn Prompter,
    ) -> Result<PathBuf> {
        if let Some(project) = &options.app_project {
            return Ok(resolve_workspace_folder(project, folder));
        }

        let mut projects: Vec<PathBuf> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .is_some_and(|n| PROJECT_FILE.is_match(&n.to_string_lossy()))
            })
            .collect();
        projects.sort();

        match projects.len() {
            0 => Err(WorkbenchError::NotFound(
                "No .NET project file (.csproj or .fsproj) could be found.".to_string(),
            )),
            1 => Ok(projects.swap_remove(0)),
            _ => {
                let items: Vec<PickItem> = projects
                    .iter()
                    .map(|p| PickItem::new(p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()))
                    .collect();
                let index = prompter.pick_one("Choose a .NET project", &items).await?;
                projects
                    .into_iter()
                    .nth(index)
                    .ok_or_else(|| WorkbenchError::Validation("Invalid project choice".to_string()))
            }
        }
    }

    /// Fill unset build options with the .NET defaults
    pub fn build_options(&self, folder: &Path, mut build: DockerBuildOptions) -> DockerBuildOptions {
        build.context.get_or_insert_with(|| WORKSPACE_FOLDER.to_string());
        build
            .dockerfile
            .get_or_insert_with(|| format!("{}/Dockerfile", WORKSPACE_FOLDER));
        build
            .tag
            .get_or_insert_with(|| default_image_name(folder, "latest"));
        build
    }

    /// The SDK publish command when `use_sdk_build` is set; `None` means a Dockerfile build
    pub async fn sdk_build_command(
        &self,
        folder: &Path,
        app_project: &Path,
        options: &NetCoreTaskOptions,
        build: DockerBuildOptions,
    ) -> Result<Option<String>> {
        if !options.use_sdk_build {
            return Ok(None);
        }
        let build = self.build_options(folder, build);
        let contents = tokio::fs::read_to_string(app_project).await?;
        sdk_build_command(&build, is_web_app(&contents)).map(Some)
    }

    /// Fill unset run options and infer the volumes the configuration needs
    ///
    /// User volumes are kept; inferred ones are only added where no user
    /// volume already uses the container path.
    pub async fn run_options(
        &self,
        folder: &Path,
        app_project: &Path,
        options: &NetCoreTaskOptions,
        mut run: DockerRunOptions,
    ) -> Result<DockerRunOptions> {
        run.container_name
            .get_or_insert_with(|| default_container_name(folder, "dev"));
        let os = *run.os.get_or_insert(PlatformOs::Linux);
        run.image
            .get_or_insert_with(|| default_image_name(folder, "dev"));

        let ssl = options.configure_ssl == Some(true);
        let ssl_setting = options
            .configure_ssl
            .map(|v| v.to_string())
            .unwrap_or_else(|| "undefined".to_string());
        tracing::info!(
            target: crate::telemetry::TELEMETRY_TARGET,
            net_core_ssl_setting = %ssl_setting,
            "netcore run options"
        );
        let user_secrets = ssl || {
            let contents = tokio::fs::read_to_string(app_project).await?;
            has_user_secrets(&contents)
        };

        run.env
            .entry("DOTNET_USE_POLLING_FILE_WATCHER".to_string())
            .or_insert_with(|| "1".to_string());
        run.env
            .entry("ASPNETCORE_ENVIRONMENT".to_string())
            .or_insert_with(|| "Development".to_string());

        let user_volumes = std::mem::take(&mut run.volumes);
        run.volumes = self
            .infer_volumes(folder, app_project, os, run.image.as_deref(), user_volumes, options, ssl, user_secrets)
            .await?;
        Ok(run)
    }

    #[allow(clippy::too_many_arguments)]
    async fn infer_volumes(
        &self,
        folder: &Path,
        app_project: &Path,
        os: PlatformOs,
        image: Option<&str>,
        user_volumes: Vec<ContainerVolume>,
        options: &NetCoreTaskOptions,
        ssl: bool,
        user_secrets: bool,
    ) -> Result<Vec<ContainerVolume>> {
        let windows = os == PlatformOs::Windows;
        let pick = |win: &str, linux: &str| if windows { win.to_string() } else { linux.to_string() };

        let mut volumes = Vec::new();
        for volume in user_volumes {
            add_volume_without_conflicts(&mut volumes, volume);
        }

        if options.enable_debugging {
            let app_folder = app_project.parent().unwrap_or(folder);
            let home = self.home()?;
            let nuget = home.join(".nuget").join("packages");

            add_volume_without_conflicts(
                &mut volumes,
                ContainerVolume::new(app_folder, pick("C:\\app", "/app"), VolumePermissions::Rw),
            );
            add_volume_without_conflicts(
                &mut volumes,
                ContainerVolume::new(folder, pick("C:\\src", "/src"), VolumePermissions::Rw),
            );
            add_volume_without_conflicts(
                &mut volumes,
                ContainerVolume::new(
                    home.join(".vsdbg"),
                    pick("C:\\remote_debugger", "/remote_debugger"),
                    VolumePermissions::Ro,
                ),
            );

            if nuget.exists() {
                let nuget_paths = [
                    pick("C:\\.nuget\\packages", "/root/.nuget/packages"),
                    pick("C:\\Users\\ContainerUser\\.nuget\\packages", "/home/appuser/.nuget/packages"),
                    pick("C:\\Users\\ContainerUser\\.nuget\\packages", "/home/app/.nuget/packages"),
                ];
                for container_path in nuget_paths {
                    add_volume_without_conflicts(
                        &mut volumes,
                        ContainerVolume::new(&nuget, container_path, VolumePermissions::Ro),
                    );
                }
            }
        }

        if user_secrets || ssl {
            let user = match image {
                Some(image) => match self.engine.inspect_image_user(image).await {
                    Ok(user) => user,
                    Err(e) => {
                        tracing::warn!(image, error = %e, "could not determine the container user");
                        None
                    }
                },
                None => None,
            };

            let host = self.host_secrets_folders()?;
            let container = container_secrets_folders(os, user.as_deref());

            add_volume_without_conflicts(
                &mut volumes,
                ContainerVolume::new(host.user_secrets, container.user_secrets, VolumePermissions::Ro),
            );
            if ssl {
                add_volume_without_conflicts(
                    &mut volumes,
                    ContainerVolume::new(host.certificates, container.certificates, VolumePermissions::Ro),
                );
            }
        }

        Ok(volumes)
    }
}

/// Expand a leading `${workspaceFolder}`; relative paths are taken from `folder`
pub fn resolve_workspace_folder(path: &Path, folder: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix(WORKSPACE_FOLDER) {
        return folder.join(rest.trim_start_matches(['/', '\\']));
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        folder.join(path)
    }
}
