//! Docker CLI backend. Every operation shells out to `docker`; non-zero
//! exits from the CLI itself become `SandboxError::Backend` with stderr,
//! while `exec` passes the inner command's exit code through.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::{ContainerHandle, ContainerSpec, ExecResult, SandboxError};

async fn docker(args: &[String]) -> Result<ExecResult, SandboxError> {
    debug!(?args, "docker");
    let output = Command::new("docker").args(args).output().await?;
    Ok(ExecResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

async fn docker_checked(args: Vec<String>) -> Result<ExecResult, SandboxError> {
    let result = docker(&args).await?;
    if !result.success() {
        return Err(SandboxError::Backend {
            argv: format!("docker {}", args.join(" ")),
            stderr: result.stderr,
        });
    }
    Ok(result)
}

pub(crate) async fn create(spec: &ContainerSpec) -> Result<ContainerHandle, SandboxError> {
    let mut args: Vec<String> = vec![
        "create".into(),
        "-w".into(),
        spec.workdir.clone(),
    ];
    for (k, v) in &spec.env {
        args.push("-e".into());
        args.push(format!("{k}={v}"));
    }
    for m in &spec.mounts {
        args.push("-v".into());
        args.push(format!("{}:{}", m.host_path.display(), m.container_path));
    }
    args.push(spec.image.clone());
    // Keep the container alive for exec until removed.
    args.push("sleep".into());
    args.push("infinity".into());

    let created = docker_checked(args).await?;
    let id = created.stdout.trim().to_string();
    docker_checked(vec!["start".into(), id.clone()]).await?;

    Ok(ContainerHandle {
        id,
        host_root: None,
    })
}

pub(crate) async fn exec(
    handle: &ContainerHandle,
    argv: &[String],
    cwd: Option<&str>,
    env: &[(String, String)],
) -> Result<ExecResult, SandboxError> {
    let mut args: Vec<String> = vec!["exec".into()];
    if let Some(cwd) = cwd {
        args.push("-w".into());
        args.push(cwd.into());
    }
    for (k, v) in env {
        args.push("-e".into());
        args.push(format!("{k}={v}"));
    }
    args.push(handle.id.clone());
    args.extend(argv.iter().cloned());

    // docker exec propagates the inner exit code; hand it to the caller.
    docker(&args).await
}

pub(crate) async fn copy_to(
    handle: &ContainerHandle,
    host_path: &Path,
    container_path: &str,
) -> Result<(), SandboxError> {
    docker_checked(vec![
        "cp".into(),
        host_path.display().to_string(),
        format!("{}:{container_path}", handle.id),
    ])
    .await?;
    Ok(())
}

pub(crate) async fn copy_from(
    handle: &ContainerHandle,
    container_path: &str,
    host_path: &Path,
) -> Result<(), SandboxError> {
    docker_checked(vec![
        "cp".into(),
        format!("{}:{container_path}", handle.id),
        host_path.display().to_string(),
    ])
    .await?;
    Ok(())
}

pub(crate) async fn remove(handle: &ContainerHandle) -> Result<(), SandboxError> {
    docker_checked(vec!["rm".into(), "-f".into(), handle.id.clone()]).await?;
    Ok(())
}
