//! Container engine operations
//!
//! [`DockerCli`] drives any Docker-compatible CLI (`docker`, `podman`, ...)
//! through a [`CommandRunner`].

use crate::error::{Result, WorkbenchError};
use crate::runner::{CommandRunner, quote_arg};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn tag_image(&self, from_image: &str, to_image: &str) -> Result<()>;

    async fn remove_container(&self, container: &str) -> Result<()>;

    /// The `USER` the image runs as, if it sets one
    async fn inspect_image_user(&self, image: &str) -> Result<Option<String>>;

    /// Container ports the image exposes, e.g. `80/tcp`
    async fn inspect_image_ports(&self, image: &str) -> Result<Vec<String>>;
}

pub struct DockerCli {
    runner: Arc<dyn CommandRunner>,
    command: String,
    cwd: PathBuf,
}

impl DockerCli {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            runner,
            command: command.into(),
            cwd,
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.command.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&quote_arg(arg));
        }
        line
    }

    async fn exec(&self, args: &[&str]) -> Result<String> {
        let line = self.command_line(args);
        self.runner.capture_success(&line, &self.cwd).await
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn tag_image(&self, from_image: &str, to_image: &str) -> Result<()> {
        self.exec(&["image", "tag", from_image, to_image]).await?;
        Ok(())
    }

    async fn remove_container(&self, container: &str) -> Result<()> {
        self.exec(&["container", "rm", "--force", container]).await?;
        Ok(())
    }

    async fn inspect_image_user(&self, image: &str) -> Result<Option<String>> {
        let out = self
            .exec(&["image", "inspect", "--format", "{{.Config.User}}", image])
            .await?;
        let user = out.trim();
        Ok((!user.is_empty()).then(|| user.to_string()))
    }

    async fn inspect_image_ports(&self, image: &str) -> Result<Vec<String>> {
        let out = self
            .exec(&[
                "image",
                "inspect",
                "--format",
                "{{json .Config.ExposedPorts}}",
                image,
            ])
            .await?;
        parse_exposed_ports(&out)
    }
}

/// Keys of the `ExposedPorts` object, sorted; `null` means none
pub fn parse_exposed_ports(json: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(json.trim())?;
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Object(map) => {
            let mut ports: Vec<String> = map.keys().cloned().collect();
            ports.sort();
            Ok(ports)
        }
        other => Err(WorkbenchError::Parse(format!(
            "Unexpected ExposedPorts value: {}",
            other
        ))),
    }
}
