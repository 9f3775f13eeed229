// ABOUTME: Composable capability traits for the engine gateway.
// ABOUTME: Defines ContainerOps, ImageOps, ExecOps, NetworkOps, RuntimeInfo.

mod container;
mod exec;
mod image;
mod network;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerOps};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use network::{NetworkError, NetworkOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// The full gateway surface the orchestrator depends on.
///
/// A blanket impl covers any type providing all four capability traits, so
/// the orchestrator can take a single bound.
pub trait Gateway: ContainerOps + ImageOps + ExecOps + NetworkOps {}

impl<T> Gateway for T where T: ContainerOps + ImageOps + ExecOps + NetworkOps {}
