use std::fs;
use std::path::{Path, PathBuf};

use crate::{docker, host, SandboxError};

/// What to start a container from.
#[derive(Clone, Debug)]
pub struct ContainerSpec {
    pub image: String,
    pub workdir: String,
    pub env: Vec<(String, String)>,
    pub mounts: Vec<Mount>,
}

#[derive(Clone, Debug)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: String,
}

/// Opaque handle to a created container.
#[derive(Clone, Debug)]
pub struct ContainerHandle {
    pub id: String,
    /// Host backend only: the directory acting as the container's root.
    pub(crate) host_root: Option<PathBuf>,
}

/// Captured outcome of an in-container command.
#[derive(Clone, Debug)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The two backends. Same surface, dispatched by match.
#[derive(Clone, Debug)]
pub enum ContainerRuntime {
    Docker,
    Host,
}

impl ContainerRuntime {
    pub async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle, SandboxError> {
        match self {
            ContainerRuntime::Docker => docker::create(spec).await,
            ContainerRuntime::Host => host::create(spec),
        }
    }

    pub async fn exec(
        &self,
        handle: &ContainerHandle,
        argv: &[String],
        cwd: Option<&str>,
        env: &[(String, String)],
    ) -> Result<ExecResult, SandboxError> {
        match self {
            ContainerRuntime::Docker => docker::exec(handle, argv, cwd, env).await,
            ContainerRuntime::Host => host::exec(handle, argv, cwd, env).await,
        }
    }

    pub async fn copy_to(
        &self,
        handle: &ContainerHandle,
        host_path: &Path,
        container_path: &str,
    ) -> Result<(), SandboxError> {
        match self {
            ContainerRuntime::Docker => docker::copy_to(handle, host_path, container_path).await,
            ContainerRuntime::Host => host::copy_to(handle, host_path, container_path),
        }
    }

    pub async fn copy_from(
        &self,
        handle: &ContainerHandle,
        container_path: &str,
        host_path: &Path,
    ) -> Result<(), SandboxError> {
        match self {
            ContainerRuntime::Docker => docker::copy_from(handle, container_path, host_path).await,
            ContainerRuntime::Host => host::copy_from(handle, container_path, host_path),
        }
    }

    pub async fn remove(&self, handle: &ContainerHandle) -> Result<(), SandboxError> {
        match self {
            ContainerRuntime::Docker => docker::remove(handle).await,
            ContainerRuntime::Host => host::remove(handle),
        }
    }
}

/// Copy a file or directory tree. `src` ending in `/.` copies the directory's
/// contents into `dst` (docker-cp convention); both backends share this.
pub fn copy_recursive(src: &Path, dst: &Path) -> Result<(), SandboxError> {
    let (src, contents_only) = match src.to_str() {
        Some(s) if s.ends_with("/.") => (PathBuf::from(&s[..s.len() - 2]), true),
        _ => (src.to_path_buf(), false),
    };

    if !src.exists() {
        return Err(SandboxError::CopySourceMissing(src));
    }

    if src.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, dst)?;
        return Ok(());
    }

    let target = if contents_only || !dst.exists() {
        dst.to_path_buf()
    } else {
        // Copying a directory into an existing directory nests it.
        match src.file_name() {
            Some(name) => dst.join(name),
            None => dst.to_path_buf(),
        }
    };
    copy_dir_contents(&src, &target)
}

fn copy_dir_contents(src: &Path, dst: &Path) -> Result<(), SandboxError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_contents(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}
