// ─── Process Supervisor ───
// Spawns the dedicated server and asks it to shut down.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::error::{ServerError, ServerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// One line of captured server output.
#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub stream: ConsoleStream,
    pub line: String,
    pub at: DateTime<Utc>,
}

/// A running server process.
pub struct ServerProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    console: Option<mpsc::UnboundedReceiver<ConsoleLine>>,
}

impl ServerProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether stdin is piped, i.e. `stop` can type `quit`.
    pub fn has_console_input(&self) -> bool {
        self.stdin.is_some()
    }

    /// Captured output. `None` without capture or once taken.
    pub fn console(&mut self) -> Option<mpsc::UnboundedReceiver<ConsoleLine>> {
        self.console.take()
    }

    pub async fn wait(&mut self) -> ServerResult<ExitStatus> {
        self.child
            .wait()
            .await
            .map_err(|e| ServerError::Process(format!("Failed while waiting for server: {e}")))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self
    }

    /// Launch `executable` with whitespace-separated `args`.
    ///
    /// `working_dir` defaults to the executable's directory. With `capture`,
    /// each stdout/stderr line is forwarded through [`ServerProcess::console`].
    /// Stdin is kept for console commands whenever [`pipes_stdin`] says so.
    pub fn start(
        &self,
        executable: &Path,
        working_dir: Option<&Path>,
        args: &str,
        capture: bool,
    ) -> ServerResult<ServerProcess> {
        if !executable.is_file() {
            return Err(ServerError::ExecutableNotFound {
                name: executable
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: executable.to_path_buf(),
            });
        }

        let working_dir: PathBuf = working_dir
            .map(Path::to_path_buf)
            .or_else(|| executable.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let mut cmd = Command::new(executable);
        cmd.args(args.split_whitespace());
        cmd.current_dir(&working_dir);
        configure_platform_spawn(&mut cmd);

        if pipes_stdin(capture) {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        if capture {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        }

        debug!("Command: {:?}", cmd);
        let mut child = cmd
            .spawn()
            .map_err(|e| ServerError::Process(format!("Cannot start {executable:?}: {e}")))?;
        info!("Started {:?} (pid {:?})", executable, child.id());

        let stdin = child.stdin.take();
        let console = if capture {
            let (tx, rx) = mpsc::unbounded_channel();
            if let Some(stdout) = child.stdout.take() {
                forward_lines(stdout, ConsoleStream::Stdout, tx.clone());
            }
            if let Some(stderr) = child.stderr.take() {
                forward_lines(stderr, ConsoleStream::Stderr, tx);
            }
            Some(rx)
        } else {
            None
        };

        Ok(ServerProcess {
            child,
            stdin,
            console,
        })
    }

    /// Ask the server to shut down. Never kills it.
    ///
    /// With piped stdin, types `quit`. Otherwise the OS is asked to close it
    /// gracefully (`SIGTERM`, or `taskkill` without `/F` on Windows).
    pub async fn stop(&self, process: &mut ServerProcess) -> ServerResult<()> {
        if let Some(stdin) = process.stdin.as_mut() {
            stdin
                .write_all(b"quit\n")
                .await
                .map_err(|e| ServerError::Process(format!("Cannot send quit: {e}")))?;
            stdin
                .flush()
                .await
                .map_err(|e| ServerError::Process(format!("Cannot send quit: {e}")))?;
            info!("Sent quit to server console (pid {:?})", process.id());
            return Ok(());
        }

        let Some(pid) = process.id() else {
            debug!("Server already exited, nothing to stop");
            return Ok(());
        };
        request_close(pid).await
    }
}

/// Windows servers run in their own console, which `taskkill` cannot close
/// without `/F`; there stdin is always piped so `stop` can type `quit`.
pub fn pipes_stdin(capture: bool) -> bool {
    capture || cfg!(target_os = "windows")
}

fn forward_lines<R>(reader: R, stream: ConsoleStream, tx: mpsc::UnboundedSender<ConsoleLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let sent = tx.send(ConsoleLine {
                        stream,
                        line,
                        at: Utc::now(),
                    });
                    if sent.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped reading server {:?}: {}", stream, e);
                    break;
                }
            }
        }
    });
}

#[cfg(target_os = "windows")]
async fn request_close(pid: u32) -> ServerResult<()> {
    // Only reached when stdin is gone. Without /F taskkill posts WM_CLOSE,
    // which a console-only server may ignore.
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .status()
        .await
        .map_err(|e| ServerError::Process(format!("Cannot ask {pid} to close: {e}")))?;
    if !status.success() {
        return Err(ServerError::Process(format!(
            "Close request for {pid} returned {:?}",
            status.code()
        )));
    }
    info!("Requested close of server (pid {pid})");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
async fn request_close(pid: u32) -> ServerResult<()> {
    let status = Command::new("kill")
        .args(["-15", &pid.to_string()])
        .status()
        .await
        .map_err(|e| ServerError::Process(format!("Cannot send SIGTERM to {pid}: {e}")))?;
    if !status.success() {
        return Err(ServerError::Process(format!(
            "SIGTERM for {pid} returned {:?}",
            status.code()
        )));
    }
    info!("Sent SIGTERM to server (pid {pid})");
    Ok(())
}

#[cfg(target_os = "windows")]
fn configure_platform_spawn(cmd: &mut Command) {
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    cmd.creation_flags(CREATE_NEW_CONSOLE);
}

#[cfg(not(target_os = "windows"))]
fn configure_platform_spawn(_cmd: &mut Command) {}
