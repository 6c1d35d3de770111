//! Host backend: each "container" is a temp directory; absolute container
//! paths map to paths under it. Commands run directly on the host with the
//! mapped directory as their working directory. This is the test double for
//! every container-dependent code path.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::runtime::copy_recursive;
use crate::{ContainerHandle, ContainerSpec, ExecResult, SandboxError};

/// Map an absolute container path into the container's host root.
fn map_path(root: &Path, container_path: &str) -> Result<PathBuf, SandboxError> {
    let stripped = container_path
        .strip_prefix('/')
        .ok_or_else(|| SandboxError::RelativeContainerPath(container_path.to_string()))?;
    if stripped.is_empty() {
        return Ok(root.to_path_buf());
    }
    Ok(root.join(stripped))
}

pub(crate) fn create(spec: &ContainerSpec) -> Result<ContainerHandle, SandboxError> {
    let dir = tempfile::Builder::new()
        .prefix("scl-container-")
        .tempdir()?
        .keep();
    fs::create_dir_all(map_path(&dir, &spec.workdir)?)?;
    for m in &spec.mounts {
        // No bind mounts on the host backend; materialize a copy instead.
        copy_recursive(&m.host_path, &map_path(&dir, &m.container_path)?)?;
    }
    debug!(root = %dir.display(), image = %spec.image, "host container created");
    Ok(ContainerHandle {
        id: dir.display().to_string(),
        host_root: Some(dir),
    })
}

fn root(handle: &ContainerHandle) -> &Path {
    handle
        .host_root
        .as_deref()
        .expect("host handle always carries its root")
}

pub(crate) async fn exec(
    handle: &ContainerHandle,
    argv: &[String],
    cwd: Option<&str>,
    env: &[(String, String)],
) -> Result<ExecResult, SandboxError> {
    let root = root(handle);
    let cwd = match cwd {
        Some(c) => map_path(root, c)?,
        None => root.to_path_buf(),
    };
    fs::create_dir_all(&cwd)?;

    let (cmd, rest) = argv.split_first().ok_or_else(|| SandboxError::Backend {
        argv: String::new(),
        stderr: "empty argv".into(),
    })?;

    let mut command = Command::new(cmd);
    command.args(rest).current_dir(&cwd);
    for (k, v) in env {
        command.env(k, v);
    }
    // The fake root lets scripts resolve absolute container paths.
    command.env("SCL_CONTAINER_ROOT", root);

    let output = command.output().await?;
    Ok(ExecResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

pub(crate) fn copy_to(
    handle: &ContainerHandle,
    host_path: &Path,
    container_path: &str,
) -> Result<(), SandboxError> {
    copy_recursive(host_path, &map_path(root(handle), container_path)?)
}

pub(crate) fn copy_from(
    handle: &ContainerHandle,
    container_path: &str,
    host_path: &Path,
) -> Result<(), SandboxError> {
    // map_path keeps a trailing `/.`, so the contents-only convention
    // survives the translation.
    let src = map_path(root(handle), container_path)?;
    copy_recursive(&src, host_path)
}

pub(crate) fn remove(handle: &ContainerHandle) -> Result<(), SandboxError> {
    let root = root(handle);
    if root.exists() {
        fs::remove_dir_all(root)?;
    }
    Ok(())
}
