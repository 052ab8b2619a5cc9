//! Spawning and supervising external CLI processes
//!
//! `ProcessExecutor::execute` starts a process and hands back a
//! `CommandExecution` right away. Standard output is streamed in line-sized
//! chunks over a broadcast channel and also buffered for the final result.
//! The terminal state is published once on a watch channel.

use crate::command::Command;
use chrono::{DateTime, Utc};
use forcebridge_core::{EnvironmentVariables, Error, Result, DEFAULT_STDOUT_CHANNEL_CAPACITY};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Time a cancelled process gets to exit after SIGTERM before it is killed
pub const TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// Time output readers get to reach end of file once the process is gone.
/// Descendants that inherited the pipes can hold them open indefinitely.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Where and how a command runs
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub working_directory: PathBuf,
    pub environment: EnvironmentVariables,
    pub stdout_capacity: usize,
}

impl ExecutionOptions {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            environment: EnvironmentVariables::new(),
            stdout_capacity: DEFAULT_STDOUT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentVariables) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_stdout_capacity(mut self, capacity: usize) -> Self {
        self.stdout_capacity = capacity;
        self
    }
}

/// How a started process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Completed { exit_code: i32 },
    Cancelled,
}

/// Everything a finished execution produced
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub terminal: TerminalState,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Raw result of a driver before timing is attached
pub(crate) struct CapturedOutput {
    pub(crate) terminal: TerminalState,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Senders a driver publishes output chunks and its terminal state on
pub(crate) struct OutputSinks {
    pub(crate) stdout: broadcast::Sender<String>,
    pub(crate) stderr: broadcast::Sender<String>,
    pub(crate) terminal: Arc<watch::Sender<Option<TerminalState>>>,
}

/// Starts external processes
pub trait ProcessExecutor: Send + Sync {
    /// Start `command`. Fails synchronously with `Error::Spawn` when the
    /// program cannot be started; otherwise the returned handle tracks the
    /// running process until it reaches a terminal state.
    fn execute(
        &self,
        command: &Command,
        options: &ExecutionOptions,
        cancellation: CancellationToken,
    ) -> Result<CommandExecution>;
}

/// Handle to one running (or finished) process
pub struct CommandExecution {
    id: Uuid,
    command: Command,
    started_at: DateTime<Utc>,
    cancellation: CancellationToken,
    stdout: broadcast::Receiver<String>,
    first_stdout: Option<broadcast::Receiver<String>>,
    stderr: broadcast::Receiver<String>,
    terminal: watch::Receiver<Option<TerminalState>>,
    driver: JoinHandle<Result<ExecutionOutput>>,
}

impl CommandExecution {
    /// Create the output channels, then call `launch` to start the process.
    /// The first stdout receiver exists before `launch` runs, so it observes
    /// every chunk.
    pub(crate) fn start<F, Fut>(
        command: Command,
        stdout_capacity: usize,
        cancellation: CancellationToken,
        launch: F,
    ) -> Result<Self>
    where
        F: FnOnce(OutputSinks, CancellationToken) -> Result<Fut>,
        Fut: Future<Output = Result<CapturedOutput>> + Send + 'static,
    {
        let capacity = stdout_capacity.max(1);
        let (stdout_tx, first_stdout) = broadcast::channel(capacity);
        let (stderr_tx, stderr) = broadcast::channel(capacity);
        let stdout = first_stdout.resubscribe();
        let (terminal_tx, terminal) = watch::channel(None);
        let terminal_tx = Arc::new(terminal_tx);

        let started = Instant::now();
        let started_at = Utc::now();
        let driver = launch(
            OutputSinks {
                stdout: stdout_tx,
                stderr: stderr_tx,
                terminal: terminal_tx.clone(),
            },
            cancellation.clone(),
        )?;

        let driver = tokio::spawn(async move {
            let captured = driver.await?;
            terminal_tx.send_if_modified(|state| {
                let unset = state.is_none();
                if unset {
                    *state = Some(captured.terminal);
                }
                unset
            });
            Ok::<_, Error>(ExecutionOutput {
                terminal: captured.terminal,
                stdout: captured.stdout,
                stderr: captured.stderr,
                duration: started.elapsed(),
            })
        });

        Ok(Self {
            id: Uuid::new_v4(),
            command,
            started_at,
            cancellation,
            stdout,
            first_stdout: Some(first_stdout),
            stderr,
            terminal,
            driver,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Ask the process to terminate. Has no effect once it has exited.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Stream of every stdout chunk since spawn. Available once.
    pub fn take_stdout(&mut self) -> Option<BroadcastStream<String>> {
        self.first_stdout.take().map(BroadcastStream::new)
    }

    /// Live stdout chunks produced after this call
    pub fn subscribe_stdout(&self) -> BroadcastStream<String> {
        BroadcastStream::new(self.stdout.resubscribe())
    }

    /// Live stderr chunks produced after this call
    pub fn subscribe_stderr(&self) -> BroadcastStream<String> {
        BroadcastStream::new(self.stderr.resubscribe())
    }

    /// Terminal state, once reached
    pub fn terminal_state(&self) -> Option<TerminalState> {
        *self.terminal.borrow()
    }

    /// Watch for the terminal state
    pub fn watch_terminal(&self) -> watch::Receiver<Option<TerminalState>> {
        self.terminal.clone()
    }

    /// Wait for the terminal state and collect the buffered output
    pub async fn wait(self) -> Result<ExecutionOutput> {
        match self.driver.await {
            Ok(output) => output,
            Err(e) => Err(Error::supervision(
                self.command.to_command_line(),
                e.to_string(),
            )),
        }
    }
}

/// Runs commands as real child processes via tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessExecutor;

impl SystemProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor for SystemProcessExecutor {
    fn execute(
        &self,
        command: &Command,
        options: &ExecutionOptions,
        cancellation: CancellationToken,
    ) -> Result<CommandExecution> {
        let argv = command.argv();
        let mut process = tokio::process::Command::new(command.program());
        process
            .args(&argv)
            .current_dir(&options.working_directory)
            .envs(options.environment.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so cancellation reaches grandchildren
        #[cfg(unix)]
        process.process_group(0);

        let command_line = command.to_command_line();
        CommandExecution::start(
            command.clone(),
            options.stdout_capacity,
            cancellation,
            move |sinks, cancellation| {
                let mut child = process
                    .spawn()
                    .map_err(|e| Error::spawn(command.program(), argv, e))?;
                tracing::debug!(pid = ?child.id(), command = %command_line, "spawned process");

                let stdout = child
                    .stdout
                    .take()
                    .map(|out| OutputPump::spawn(out, sinks.stdout));
                let stderr = child
                    .stderr
                    .take()
                    .map(|err| OutputPump::spawn(err, sinks.stderr));

                Ok(supervise(
                    child,
                    Pumps { stdout, stderr },
                    sinks.terminal,
                    cancellation,
                    command_line,
                ))
            },
        )
    }
}

async fn supervise(
    mut child: Child,
    mut pumps: Pumps,
    terminal_tx: Arc<watch::Sender<Option<TerminalState>>>,
    cancellation: CancellationToken,
    command_line: String,
) -> Result<CapturedOutput> {
    let group = child.id();
    let terminal = tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| Error::supervision(&command_line, e.to_string()))?;
            TerminalState::Completed { exit_code: status.code().unwrap_or(1) }
        }
        () = cancellation.cancelled() => {
            tracing::info!(command = %command_line, "cancellation requested, terminating process");
            terminate(&mut child).await;
            TerminalState::Cancelled
        }
    };
    // The process is gone; observers should not wait on its pipes
    terminal_tx.send_replace(Some(terminal));

    match terminal {
        TerminalState::Cancelled => {
            if tokio::time::timeout(DRAIN_GRACE, pumps.finished()).await.is_err() {
                tracing::debug!(command = %command_line, "output still open after cancellation");
            }
        }
        TerminalState::Completed { .. } => {
            tokio::select! {
                drained = tokio::time::timeout(DRAIN_GRACE, pumps.finished()) => {
                    if drained.is_err() {
                        tracing::debug!(
                            command = %command_line,
                            "output held open by descendants, abandoning readers"
                        );
                    }
                }
                () = cancellation.cancelled() => {
                    #[cfg(unix)]
                    if let Some(pid) = group {
                        signal_group(pid, libc::SIGTERM);
                    }
                    tracing::info!(command = %command_line, "cancellation requested after exit, terminated descendants");
                }
            }
        }
    }
    #[cfg(not(unix))]
    let _ = group;

    let (stdout, stderr) = pumps.into_captured();
    Ok(CapturedOutput {
        terminal,
        stdout,
        stderr,
    })
}

/// SIGTERM the process group, then kill whatever is left after the grace period
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            signal_group(pid, libc::SIGTERM);
            if let Ok(Ok(_)) = tokio::time::timeout(TERMINATION_GRACE, child.wait()).await {
                return;
            }
            signal_group(pid, libc::SIGKILL);
        }
    }

    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "kill after cancellation failed");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "failed to reap cancelled process");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory
    let rc = unsafe { libc::kill(-pid, signal) };
    if rc != 0 {
        tracing::debug!(pid, signal, "signalling process group failed");
    }
}

/// Reader task for one output pipe. Everything read so far stays in
/// `captured`, so the text survives when the task is abandoned.
struct OutputPump {
    captured: Arc<Mutex<String>>,
    task: JoinHandle<()>,
}

impl OutputPump {
    fn spawn<R>(reader: R, sink: broadcast::Sender<String>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let captured = Arc::new(Mutex::new(String::new()));
        let task = tokio::spawn(pump(reader, sink, captured.clone()));
        Self { captured, task }
    }

    /// Stop reading and hand back what was captured
    fn into_captured(self) -> String {
        self.task.abort();
        std::mem::take(&mut *self.captured.lock())
    }
}

#[derive(Default)]
struct Pumps {
    stdout: Option<OutputPump>,
    stderr: Option<OutputPump>,
}

impl Pumps {
    /// Resolves once both pipes reached end of file
    async fn finished(&mut self) {
        for pump in [self.stdout.as_mut(), self.stderr.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = (&mut pump.task).await {
                tracing::debug!(error = %e, "output reader ended abnormally");
            }
        }
    }

    fn into_captured(self) -> (String, String) {
        (
            self.stdout.map(OutputPump::into_captured).unwrap_or_default(),
            self.stderr.map(OutputPump::into_captured).unwrap_or_default(),
        )
    }
}

/// Forward line-sized chunks to `sink` while appending them to `captured`
async fn pump<R>(reader: R, sink: broadcast::Sender<String>, captured: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&line).into_owned();
                captured.lock().push_str(&chunk);
                // No receivers is fine; the buffered copy is authoritative
                let _ = sink.send(chunk);
            }
            Err(e) => {
                tracing::warn!(error = %e, "reading process output failed");
                break;
            }
        }
    }
}

/// Canned behaviour for one command line in `TestProcessExecutor`
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponse {
    pub stdout: Vec<String>,
    pub stderr: String,
    pub exit_code: i32,
    /// Run until cancelled instead of exiting
    pub hang: bool,
}

impl ScriptedResponse {
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, chunk: impl Into<String>) -> Self {
        self.stdout.push(chunk.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Executor that replays scripted responses keyed by command line.
/// Unknown command lines fail to spawn.
#[derive(Default)]
pub struct TestProcessExecutor {
    responses: Mutex<HashMap<String, ScriptedResponse>>,
    calls: Mutex<Vec<String>>,
}

impl TestProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the response for an exact command line
    pub fn add_response(&self, command_line: impl Into<String>, response: ScriptedResponse) {
        self.responses.lock().insert(command_line.into(), response);
    }

    /// Command lines executed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ProcessExecutor for TestProcessExecutor {
    fn execute(
        &self,
        command: &Command,
        options: &ExecutionOptions,
        cancellation: CancellationToken,
    ) -> Result<CommandExecution> {
        let command_line = command.to_command_line();
        self.calls.lock().push(command_line.clone());
        let response = self.responses.lock().get(&command_line).cloned();

        CommandExecution::start(
            command.clone(),
            options.stdout_capacity,
            cancellation,
            move |sinks, cancellation| {
                let response = response.ok_or_else(|| {
                    Error::spawn(
                        command.program(),
                        command.argv(),
                        std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted response"),
                    )
                })?;
                Ok(async move {
                    let mut stdout = String::new();
                    for chunk in response.stdout {
                        stdout.push_str(&chunk);
                        let _ = sinks.stdout.send(chunk);
                    }
                    if !response.stderr.is_empty() {
                        let _ = sinks.stderr.send(response.stderr.clone());
                    }
                    let terminal = if response.hang {
                        cancellation.cancelled().await;
                        TerminalState::Cancelled
                    } else {
                        TerminalState::Completed {
                            exit_code: response.exit_code,
                        }
                    };
                    Ok(CapturedOutput {
                        terminal,
                        stdout,
                        stderr: response.stderr,
                    })
                })
            },
        )
    }
}
