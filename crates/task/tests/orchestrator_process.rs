//! End-to-end runs against real child processes
#![cfg(unix)]

use forcebridge_cache::{ConflictCacheService, FileStorage, StaticIdentity, Storage};
use forcebridge_config::BridgeConfig;
use forcebridge_core::{Result, DEFAULT_CLI_PROGRAM};
use forcebridge_task::{
    CacheStatus, CacheUpdate, Command, CommandBuilder, ExecutionOrchestrator, ExecutionOutcome,
    ExecutionState, Operation, OperationKind, ParsedResult, ResultParser, SourcePull,
    SourceResultParser, SystemProcessExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// A pull whose "CLI" is a shell script
struct ScriptedPull {
    script: String,
}

impl ScriptedPull {
    fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Operation for ScriptedPull {
    fn kind(&self) -> OperationKind {
        OperationKind::Custom("scripted-pull")
    }

    fn build(&self, _program: &str) -> Result<Command> {
        CommandBuilder::new("sh")
            .with_action("-c")
            .with_arg(self.script.clone())
            .with_description("scripted pull")
            .with_log_name("scripted_pull")
            .build()
    }

    fn parse(&self, stdout: &str) -> Option<ParsedResult> {
        Some(SourceResultParser::pull().parse(stdout))
    }

    fn cache_update(&self) -> CacheUpdate {
        CacheUpdate::PushPull
    }
}

struct Workspace {
    root: TempDir,
    storage: Arc<FileStorage>,
    orchestrator: ExecutionOrchestrator,
}

fn workspace() -> Workspace {
    workspace_with(|_| {})
}

fn workspace_with(configure: impl FnOnce(&mut BridgeConfig)) -> Workspace {
    let root = TempDir::new().unwrap();
    let mut config = BridgeConfig::with_project_root(root.path());
    config.cache_file = root.path().join(".forcebridge").join("conflict-cache.json");
    config.org_identity = Some("dev@example.com".to_string());
    configure(&mut config);

    let storage = Arc::new(FileStorage::open(&config.cache_file).unwrap());
    let cache = Arc::new(ConflictCacheService::new(
        storage.clone(),
        Arc::new(StaticIdentity::new(
            config.org_identity.clone(),
            config.project_root.clone(),
        )),
    ));
    let orchestrator =
        ExecutionOrchestrator::new(config, Arc::new(SystemProcessExecutor::new()), cache);
    Workspace {
        root,
        storage,
        orchestrator,
    }
}

const FOO_PULLED: &str = r#"{"status":0,"result":{"pulledSource":[{"filePath":"classes/Foo.cls","fullName":"Foo","type":"ApexClass","state":"Changed"}]}}"#;

#[tokio::test]
async fn pull_success_persists_source_and_meta_entries() {
    let ws = workspace();
    let op = ScriptedPull::new(format!("printf '%s' '{FOO_PULLED}'"));

    let report = ws
        .orchestrator
        .run(&op, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.state, ExecutionState::Completed);
    assert!(matches!(
        report.outcome,
        ExecutionOutcome::Succeeded { ref items } if items.len() == 1
    ));
    assert_eq!(report.cache, CacheStatus::Written { entries: 2 });

    let reopened = FileStorage::open(ws.storage.path()).unwrap();
    let keys = reopened.keys().unwrap();
    assert_eq!(keys.len(), 2);
    let root = ws.root.path().to_string_lossy().into_owned();
    assert!(keys.contains(&format!("dev@example.com#{root}#ApexClass#Foo")));
    assert!(keys.contains(&format!("dev@example.com#{root}#ApexClass#Foo-meta.xml")));

    let cache = ws.orchestrator.cache();
    assert_eq!(
        cache.get("ApexClass", "Foo").unwrap(),
        cache.get("ApexClass", "Foo-meta.xml").unwrap()
    );
}

#[tokio::test]
async fn child_sees_json_request_and_runs_in_project_root() {
    let ws = workspace();
    let op = ScriptedPull::new(format!(
        "[ \"$SFDX_JSON_TO_STDOUT\" = true ] && [ \"$(pwd -P)\" = '{}' ] && printf '%s' '{FOO_PULLED}'",
        ws.root.path().canonicalize().unwrap().display()
    ));

    let report = ws
        .orchestrator
        .run(&op, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success(), "stdout: {:?}", report.stdout);
}

#[tokio::test]
async fn stdout_is_observed_while_running() {
    let ws = workspace();
    let op = ScriptedPull::new(format!(
        "echo 'Pulling source...'; printf '%s\\n' '{FOO_PULLED}'"
    ));

    let mut chunks = Vec::new();
    let report = ws
        .orchestrator
        .run_observed(&op, CancellationToken::new(), |chunk| {
            chunks.push(chunk.to_string())
        })
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(chunks.first().map(String::as_str), Some("Pulling source...\n"));
    assert_eq!(chunks.concat(), report.stdout);
}

#[tokio::test]
async fn cancellation_terminates_process_without_cache_writes() {
    let ws = workspace();
    let op = ScriptedPull::new(format!("sleep 30; printf '%s' '{FOO_PULLED}'"));
    let token = CancellationToken::new();

    let cancel = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        })
    };

    let report = tokio::time::timeout(Duration::from_secs(15), ws.orchestrator.run(&op, token))
        .await
        .expect("cancelled run should finish promptly")
        .unwrap();
    cancel.await.unwrap();

    assert_eq!(report.state, ExecutionState::Cancelled);
    assert_eq!(report.outcome, ExecutionOutcome::Cancelled);
    assert_eq!(report.exit_code, None);
    assert!(ws.storage.keys().unwrap().is_empty());
}

#[tokio::test]
async fn background_descendant_does_not_stall_the_run() {
    let ws = workspace();
    let op = ScriptedPull::new(format!("sleep 20 & printf '%s' '{FOO_PULLED}'; exit 0"));
    let token = CancellationToken::new();

    let cancel = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            token.cancel();
        })
    };

    let report = tokio::time::timeout(Duration::from_secs(8), ws.orchestrator.run(&op, token))
        .await
        .expect("run finishes even though a descendant keeps stdout open")
        .unwrap();
    cancel.await.unwrap();

    assert_eq!(report.state, ExecutionState::Completed);
    assert_eq!(report.exit_code, Some(0));
    assert!(report.is_success(), "stdout: {:?}", report.stdout);
    assert_eq!(report.cache, CacheStatus::Written { entries: 2 });
}

#[tokio::test]
async fn missing_binary_is_spawn_failure() {
    let ws = workspace_with(|config| {
        config.cli_program = "/nonexistent/forcebridge-test/sfdx".to_string();
    });

    let report = ws
        .orchestrator
        .run(&SourcePull::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.state, ExecutionState::SpawnFailed);
    assert!(matches!(report.outcome, ExecutionOutcome::SpawnFailed { .. }));
    assert_ne!(report.command.program(), DEFAULT_CLI_PROGRAM);
    assert!(ws.storage.keys().unwrap().is_empty());
}

#[tokio::test]
async fn failed_exit_commits_partial_successes() {
    let ws = workspace();
    let payload = r#"{"status":1,"name":"PullFailed","message":"1 file failed","data":[{"filePath":"classes/Bad.cls","fullName":"Bad","type":"ApexClass","error":"Invalid","lineNumber":"4","columnNumber":"2"}],"partialSuccess":[{"filePath":"lwc/good/good.js","fullName":"good","type":"LightningComponentBundle"}]}"#;
    let op = ScriptedPull::new(format!("printf '%s' '{payload}'; exit 1"));

    let report = ws
        .orchestrator
        .run(&op, CancellationToken::new())
        .await
        .unwrap();

    match &report.outcome {
        ExecutionOutcome::Failed {
            exit_code: 1,
            parsed: Some(ParsedResult::Error { items, .. }),
        } => {
            assert_eq!(items[0].line_number, Some(4));
            assert_eq!(items[0].column_number, Some(2));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    // Not a class or component, so no companion entry
    assert_eq!(report.cache, CacheStatus::Written { entries: 1 });
    let cache = ws.orchestrator.cache();
    assert!(cache.get("LightningComponentBundle", "good").unwrap().is_some());
    assert!(cache.get("ApexClass", "Bad").unwrap().is_none());
}
