//! Image reference handling
//!
//! Parsing and normalization of image names ([`ImageNameInfo`],
//! [`NormalizedImageNameInfo`]) and digest helpers used by the registry client.

pub mod digest;
pub mod name;

pub use digest::DigestUtils;
pub use name::{ImageNameInfo, NormalizedImageNameInfo, valid_image_name_from_path};
