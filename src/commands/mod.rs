//! Command handlers
//!
//! Each handler is a short sequence: confirm or prompt, call the engine,
//! runner or registry, then report. Dismissed prompts surface as
//! [`WorkbenchError::Cancelled`](crate::error::WorkbenchError::Cancelled).

pub mod browser;
pub mod build_image;
pub mod remote_image;
pub mod remove_container;
pub mod run_image;
pub mod tag_image;

pub use browser::{DockerHubItem, docker_hub_url, open_docker_hub_in_browser, registry_help};
pub use build_image::build_image;
pub use remote_image::{copy_remote_image_digest, delete_remote_image, list_remote_tags};
pub use remove_container::remove_containers;
pub use run_image::run_image;
pub use tag_image::{get_tag_from_user_input, tag_image};
