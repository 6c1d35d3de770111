//! scl-sandbox
//!
//! Container runtime abstraction behind one capability set:
//! `{create, exec, copy_to, copy_from, remove}`.
//!
//! Two backends, dispatched by exhaustive match:
//! - `Docker` wraps the external docker CLI
//! - `Host` keeps each "container" in a temp directory and interprets
//!   absolute container paths as paths under that root
//!
//! `exec` reports the command's own exit code in `ExecResult`; every other
//! backend operation turns a non-zero exit into an error carrying the
//! captured stderr. Tests run on the host backend; production runs docker.

mod docker;
mod host;
mod runtime;

pub use runtime::{
    copy_recursive, ContainerHandle, ContainerRuntime, ContainerSpec, ExecResult, Mount,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("container backend command failed ({argv}): {stderr}")]
    Backend { argv: String, stderr: String },

    #[error("container path must be absolute: {0}")]
    RelativeContainerPath(String),

    #[error("copy source missing: {0}")]
    CopySourceMissing(PathBuf),

    #[error("sandbox io: {0}")]
    Io(#[from] std::io::Error),
}
