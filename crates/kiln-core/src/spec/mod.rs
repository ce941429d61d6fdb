//! Declarative image specification.
//!
//! An [`ImageSpec`] is the full description of an environment build: an
//! ordered list of provisioning steps, the pinned version set, and the
//! configuration baked into the finished artifact.

mod image;
mod pins;
mod step;
mod submit;

pub use image::{ImageSpec, ANCHOR_LIBRARY, ANCHOR_VERSION};
pub use pins::PinnedVersionSet;
pub use step::{ProvisionStep, Requirement};
pub use submit::SubmitConfig;
