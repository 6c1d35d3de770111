use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use scl_orchestrator::{
    run_edit_phase, AgentSpec, EditSettings, EditStatus, NetworkPolicy,
};
use scl_sandbox::ContainerRuntime;
use scl_schemas::AgentProvider;

fn settings(runner_script: &str, timeout_ms: Option<u64>) -> EditSettings {
    EditSettings {
        enabled: true,
        edit_round_one: true,
        prompt: "default".into(),
        max_turns: 10,
        tool_allowlist: vec!["Read".into(), "Edit".into()],
        sandbox_enabled: true,
        network_policy: NetworkPolicy {
            enabled: false,
            allowlist: vec![],
        },
        settings_sources: vec![],
        concurrency: 2,
        timeout_ms,
        image: "solclash-edit:test".into(),
        runner_script: runner_script.into(),
        model: None,
    }
}

fn write_runner(dir: &Path, body: &str) -> String {
    let path = dir.join("runner.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

fn agent(id: &str, workspace: &Path) -> AgentSpec {
    AgentSpec {
        id: id.into(),
        provider: AgentProvider::Anthropic,
        workspace: Some(workspace.to_path_buf()),
        model: None,
    }
}

fn seed_workspace(root: &Path, id: &str) -> std::path::PathBuf {
    let ws = root.join(id);
    std::fs::create_dir_all(ws.join("src")).unwrap();
    std::fs::write(ws.join("src/policy.rs"), "// original\n").unwrap();
    ws
}

/// Deep snapshot of a workspace: relative path -> bytes.
fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().display().to_string();
                out.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

#[tokio::test]
async fn successful_session_replaces_the_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let ws = seed_workspace(dir.path(), "alpha");
    let runner = write_runner(
        dir.path(),
        r#"echo "// improved" > src/policy.rs
mkdir -p "$SCL_CONTAINER_ROOT/logs"
printf '{"agent_id":"alpha","status":"success","session_id":"s-1","prompt_ref":"default","prompt_sha256":"d"}' \
  > "$SCL_CONTAINER_ROOT/logs/edit_meta.json"
"#,
    );

    let outcomes = run_edit_phase(
        1,
        &[agent("alpha", &ws)],
        &settings(&runner, None),
        &dir.path().join("edits/1"),
        &ContainerRuntime::Host,
    )
    .await
    .unwrap();

    let outcome = &outcomes["alpha"];
    assert_eq!(outcome.status, EditStatus::Success);
    assert_eq!(outcome.session_id.as_deref(), Some("s-1"));
    assert_eq!(
        std::fs::read_to_string(ws.join("src/policy.rs")).unwrap(),
        "// improved\n"
    );
    // The runner's logs were captured back.
    assert!(dir.path().join("edits/1/alpha/edit_meta.json").exists());
}

#[tokio::test]
async fn failed_session_leaves_the_workspace_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let ws = seed_workspace(dir.path(), "alpha");
    let before = snapshot(&ws);

    // Mutates its container workspace, then fails.
    let runner = write_runner(
        dir.path(),
        r#"echo "// sabotage" > src/policy.rs
exit 3
"#,
    );

    let outcomes = run_edit_phase(
        1,
        &[agent("alpha", &ws)],
        &settings(&runner, None),
        &dir.path().join("edits/1"),
        &ContainerRuntime::Host,
    )
    .await
    .unwrap();

    assert_eq!(outcomes["alpha"].status, EditStatus::Failure);
    assert_eq!(snapshot(&ws), before);
}

#[tokio::test]
async fn timed_out_session_leaves_the_workspace_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let ws = seed_workspace(dir.path(), "alpha");
    let before = snapshot(&ws);

    let runner = write_runner(dir.path(), "sleep 30\n");

    let outcomes = run_edit_phase(
        1,
        &[agent("alpha", &ws)],
        &settings(&runner, Some(300)),
        &dir.path().join("edits/1"),
        &ContainerRuntime::Host,
    )
    .await
    .unwrap();

    assert_eq!(outcomes["alpha"].status, EditStatus::Timeout);
    assert_eq!(snapshot(&ws), before);
}

#[tokio::test]
async fn runner_exit_code_10_maps_to_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let ws = seed_workspace(dir.path(), "alpha");

    let runner = write_runner(dir.path(), "exit 10\n");
    let outcomes = run_edit_phase(
        1,
        &[agent("alpha", &ws)],
        &settings(&runner, None),
        &dir.path().join("edits/1"),
        &ContainerRuntime::Host,
    )
    .await
    .unwrap();
    assert_eq!(outcomes["alpha"].status, EditStatus::Timeout);
}

#[tokio::test]
async fn builtin_agents_are_skipped_and_sessions_run_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let ws_a = seed_workspace(dir.path(), "alpha");
    let ws_b = seed_workspace(dir.path(), "beta");

    let runner = write_runner(
        dir.path(),
        r#"mkdir -p "$SCL_CONTAINER_ROOT/logs"
exit 0
"#,
    );

    let agents = vec![
        AgentSpec {
            id: "FLAT".into(),
            provider: AgentProvider::Builtin,
            workspace: None,
            model: None,
        },
        agent("alpha", &ws_a),
        agent("beta", &ws_b),
    ];
    let outcomes = run_edit_phase(
        2,
        &agents,
        &settings(&runner, None),
        &dir.path().join("edits/2"),
        &ContainerRuntime::Host,
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains_key("alpha"));
    assert!(outcomes.contains_key("beta"));
    assert!(!outcomes.contains_key("FLAT"));
    assert!(outcomes.values().all(|o| o.status == EditStatus::Success));
}
