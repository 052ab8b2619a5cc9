//! Runs one operation end to end
//!
//! Build the command, spawn it, wait for a terminal state, interpret stdout
//! and commit the attributable successes to the conflict cache. Every
//! invocation is independent, so one orchestrator can drive several
//! operations at once.

use crate::command::Command;
use crate::command_executor::{ExecutionOptions, ProcessExecutor, TerminalState};
use crate::operations::{CacheUpdate, Operation, OperationKind};
use crate::result::ParsedResult;
use forcebridge_cache::ConflictCacheService;
use forcebridge_config::BridgeConfig;
use forcebridge_core::{Error, FileOutcome, Result};
use forcebridge_utils::tracing::{command_metric, command_span};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Lifecycle of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Built,
    Running,
    Completed,
    Cancelled,
    SpawnFailed,
}

impl ExecutionState {
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Built, Running) | (Built, SpawnFailed) | (Running, Completed) | (Running, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Cancelled | ExecutionState::SpawnFailed
        )
    }
}

/// What the caller is told about an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded {
        items: Vec<FileOutcome>,
    },
    PartiallySucceeded {
        items: Vec<FileOutcome>,
    },
    /// Non-zero exit, or a clean exit whose payload reported an error or
    /// could not be read. `parsed` holds whatever was decoded.
    Failed {
        exit_code: i32,
        parsed: Option<ParsedResult>,
    },
    Cancelled,
    SpawnFailed {
        message: String,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::Succeeded { .. } | ExecutionOutcome::PartiallySucceeded { .. }
        )
    }
}

/// Result of the conflict-cache step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Unchanged,
    Written { entries: usize },
    Failed { message: String },
}

/// Final report for one invocation
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub execution_id: Option<Uuid>,
    pub kind: OperationKind,
    pub command: Command,
    pub state: ExecutionState,
    pub outcome: ExecutionOutcome,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
    /// Outcomes handed to the cache, before companion files are added
    pub committed: Vec<FileOutcome>,
    pub cache: CacheStatus,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The failure as an error value, if the invocation did not succeed
    pub fn error(&self) -> Option<Error> {
        match &self.outcome {
            ExecutionOutcome::Succeeded { .. } | ExecutionOutcome::PartiallySucceeded { .. } => {
                None
            }
            ExecutionOutcome::Failed {
                parsed: Some(parsed),
                ..
            } if parsed.error().is_some() => parsed.error(),
            ExecutionOutcome::Failed { exit_code, .. } => Some(Error::tool_reported(
                format!("{} exited with code {exit_code}", self.command),
                None,
            )),
            ExecutionOutcome::Cancelled => Some(Error::cancelled(self.command.to_command_line())),
            ExecutionOutcome::SpawnFailed { message } => Some(Error::Spawn {
                program: self.command.program().to_string(),
                args: self.command.argv(),
                message: message.clone(),
                source: None,
            }),
        }
    }
}

/// Sequences builder, executor, parser and cache for each operation
pub struct ExecutionOrchestrator {
    config: BridgeConfig,
    executor: Arc<dyn ProcessExecutor>,
    cache: Arc<ConflictCacheService>,
}

impl ExecutionOrchestrator {
    pub fn new(
        config: BridgeConfig,
        executor: Arc<dyn ProcessExecutor>,
        cache: Arc<ConflictCacheService>,
    ) -> Self {
        Self {
            config,
            executor,
            cache,
        }
    }

    /// Use the process-wide conflict cache; fails if it was never initialized
    pub fn from_global(config: BridgeConfig, executor: Arc<dyn ProcessExecutor>) -> Result<Self> {
        let cache = forcebridge_cache::instance()?;
        Ok(Self::new(config, executor, cache))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ConflictCacheService> {
        &self.cache
    }

    /// Working directory, environment and channel sizing for spawned commands
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::new(&self.config.project_root)
            .with_environment(self.config.process_environment())
            .with_stdout_capacity(self.config.stdout_channel_capacity)
    }

    /// Run `operation` to a terminal state.
    ///
    /// Returns `Err` only when the command cannot be built. Spawn failures,
    /// cancellation and tool failures are reported in the outcome.
    pub async fn run(
        &self,
        operation: &dyn Operation,
        cancellation: CancellationToken,
    ) -> Result<ExecutionReport> {
        self.run_observed(operation, cancellation, |_| {}).await
    }

    /// Like `run`, handing every stdout chunk to `observer` as it arrives
    pub async fn run_observed<F>(
        &self,
        operation: &dyn Operation,
        cancellation: CancellationToken,
        mut observer: F,
    ) -> Result<ExecutionReport>
    where
        F: FnMut(&str) + Send,
    {
        let command = operation.build(&self.config.cli_program)?;
        let kind = operation.kind();
        let mut state = ExecutionState::Built;
        tracing::debug!(
            log_name = %command.log_name(),
            command = %command.to_command_line(),
            "command built"
        );

        let mut execution =
            match self
                .executor
                .execute(&command, &self.execution_options(), cancellation)
            {
                Ok(execution) => execution,
                Err(Error::Spawn { message, .. }) => {
                    advance(&mut state, ExecutionState::SpawnFailed, &command);
                    tracing::error!(
                        log_name = %command.log_name(),
                        command = %command.to_command_line(),
                        error = %message,
                        "failed to start command"
                    );
                    return Ok(ExecutionReport {
                        execution_id: None,
                        kind,
                        command,
                        state,
                        outcome: ExecutionOutcome::SpawnFailed { message },
                        exit_code: None,
                        duration: Duration::ZERO,
                        stdout: String::new(),
                        stderr: String::new(),
                        committed: Vec::new(),
                        cache: CacheStatus::Unchanged,
                    });
                }
                Err(other) => return Err(other),
            };
        advance(&mut state, ExecutionState::Running, &command);

        let execution_id = execution.id();
        let span = command_span(command.log_name(), &execution_id.to_string());
        tracing::info!(
            parent: &span,
            started_at = %execution.started_at().to_rfc3339(),
            "{}",
            command.to_command_line()
        );

        let stdout = execution.take_stdout();
        let forward = async {
            let Some(mut stdout) = stdout else {
                return;
            };
            while let Some(chunk) = stdout.next().await {
                match chunk {
                    Ok(chunk) => observer(&chunk),
                    Err(e) => tracing::debug!(error = %e, "live output lagged"),
                }
            }
        };
        let (output, ()) = async { tokio::join!(execution.wait(), forward) }
            .instrument(span.clone())
            .await;
        let output = output?;

        command_metric(command.log_name(), duration_millis(output.duration));

        let (outcome, committed, exit_code) = match output.terminal {
            TerminalState::Cancelled => {
                advance(&mut state, ExecutionState::Cancelled, &command);
                tracing::info!(parent: &span, "command cancelled");
                (ExecutionOutcome::Cancelled, Vec::new(), None)
            }
            TerminalState::Completed { exit_code } => {
                advance(&mut state, ExecutionState::Completed, &command);
                let (outcome, committed) = interpret(exit_code, operation.parse(&output.stdout));
                tracing::info!(
                    parent: &span,
                    exit_code,
                    success = outcome.is_success(),
                    committed = committed.len(),
                    "command finished"
                );
                (outcome, committed, Some(exit_code))
            }
        };

        let cache = self.commit(operation.cache_update(), &committed);

        Ok(ExecutionReport {
            execution_id: Some(execution_id),
            kind,
            command,
            state,
            outcome,
            exit_code,
            duration: output.duration,
            stdout: output.stdout,
            stderr: output.stderr,
            committed,
            cache,
        })
    }

    fn commit(&self, update: CacheUpdate, committed: &[FileOutcome]) -> CacheStatus {
        if committed.is_empty() {
            return CacheStatus::Unchanged;
        }
        let written = match update {
            CacheUpdate::None => return CacheStatus::Unchanged,
            CacheUpdate::PushPull => self.cache.update_after_push_pull(committed),
            CacheUpdate::Deploy => self.cache.update_after_deploy(committed, None),
        };
        match written {
            Ok(entries) => CacheStatus::Written { entries },
            Err(e) => {
                tracing::error!(error = %e, "conflict cache update failed");
                CacheStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Map exit code and decoded payload to an outcome plus the outcomes the
/// cache may record.
fn interpret(
    exit_code: i32,
    parsed: Option<ParsedResult>,
) -> (ExecutionOutcome, Vec<FileOutcome>) {
    let Some(parsed) = parsed else {
        let outcome = if exit_code == 0 {
            ExecutionOutcome::Succeeded { items: Vec::new() }
        } else {
            ExecutionOutcome::Failed {
                exit_code,
                parsed: None,
            }
        };
        return (outcome, Vec::new());
    };

    let committed = parsed.committable(exit_code).to_vec();
    let outcome = match (exit_code, parsed) {
        (0, ParsedResult::Success { items }) => ExecutionOutcome::Succeeded { items },
        (0, ParsedResult::PartialSuccess { items }) => {
            ExecutionOutcome::PartiallySucceeded { items }
        }
        (exit_code, parsed) => ExecutionOutcome::Failed {
            exit_code,
            parsed: Some(parsed),
        },
    };
    (outcome, committed)
}

fn advance(state: &mut ExecutionState, next: ExecutionState, command: &Command) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid transition {state:?} -> {next:?}"
    );
    tracing::debug!(log_name = %command.log_name(), from = ?state, to = ?next, "execution state changed");
    *state = next;
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
