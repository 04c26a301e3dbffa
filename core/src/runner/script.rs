use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::broadcast;

use super::exit::{check_exit, exit_code};
use super::output::{self, MergedPipe};
use super::traits::ScriptExecutor;
use crate::config::ScriptsConfig;
use crate::error::ScriptError;

/// Spawns `<interpreter> <script>` and blocks the calling task until the
/// child exits and its output is fully read.
///
/// On unix the script leads its own process group. When a run is
/// interrupted the whole group is killed, so background jobs started by
/// the script do not outlive it.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    workdir: Option<PathBuf>,
    timeout: Option<Duration>,
    shutdown: Option<broadcast::Sender<()>>,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            workdir: None,
            timeout: None,
            shutdown: None,
        }
    }

    pub fn from_config(cfg: &ScriptsConfig) -> Self {
        Self::new(cfg.interpreter.clone())
            .with_workdir(cfg.workdir())
            .with_timeout(cfg.timeout())
    }

    pub fn with_workdir(mut self, workdir: Option<PathBuf>) -> Self {
        self.workdir = workdir;
        self
    }

    /// Bounds the whole run: waiting for the exit and reading the output
    /// until every holder of the pipe is gone.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Running scripts are killed and fail with `Interrupted` once a value
    /// is sent on `shutdown`.
    pub fn with_shutdown(mut self, shutdown: broadcast::Sender<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn resolve(&self, script: &Path) -> PathBuf {
        match &self.workdir {
            Some(dir) if script.is_relative() => dir.join(script),
            _ => script.to_path_buf(),
        }
    }

    async fn run(&self, script: &Path) -> Result<String, ScriptError> {
        let mut shutdown_rx = self.shutdown.as_ref().map(|tx| tx.subscribe());

        let resolved = self.resolve(script);
        if !resolved.is_file() {
            return Err(ScriptError::ScriptNotFound {
                path: resolved,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ),
            });
        }

        let pipe = MergedPipe::open()?;
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::from(pipe.stdout))
            .stderr(Stdio::from(pipe.stderr))
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let spawned = cmd.spawn();
        // The command still owns the parent's write ends; the reader only
        // sees EOF once they are closed.
        drop(cmd);
        let mut child = spawned.map_err(|source| ScriptError::Spawn {
            program: self.interpreter.clone(),
            source,
        })?;
        let pgid = child.id();
        tracing::debug!(pid = ?pgid, script = %script.display(), "script spawned");

        let mut reader = match output::capture(pipe.reader) {
            Ok(reader) => reader,
            Err(err) => {
                terminate(&mut child, pgid).await;
                return Err(err);
            }
        };

        let finished = async {
            let status = child.wait().await.map_err(|source| ScriptError::Wait { source })?;
            let captured = (&mut reader).await.map_err(|e| ScriptError::Interrupted {
                reason: format!("output reader stopped: {e}"),
            })??;
            Ok::<_, ScriptError>((status, captured))
        };

        let outcome = tokio::select! {
            res = finished => res,
            _ = deadline(self.timeout) => Err(ScriptError::Interrupted {
                reason: format!("timed out after {:?}", self.timeout.unwrap_or_default()),
            }),
            _ = shutdown_signal(shutdown_rx.as_mut()) => Err(ScriptError::Interrupted {
                reason: "server shutting down".to_string(),
            }),
        };

        let (status, captured) = match outcome {
            Ok(done) => done,
            Err(err) => {
                terminate(&mut child, pgid).await;
                reader.abort();
                return Err(err);
            }
        };

        tracing::debug!(
            exit_code = exit_code(status),
            lines = captured.lines,
            "script exited"
        );
        if let Err(err) = check_exit(status) {
            tracing::debug!(output = %captured.output, "discarding output of failed script");
            return Err(err);
        }

        Ok(captured.output)
    }
}

#[async_trait]
impl ScriptExecutor for ScriptRunner {
    async fn execute(&self, script: &Path) -> Result<String, ScriptError> {
        let started = Instant::now();
        let result = self.run(script).await;
        tracing::debug!(
            script = %script.display(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "script execution finished"
        );
        result
    }
}

/// Kills the script's process group, then the script itself if it is still
/// running, and reaps it.
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        kill_group(pgid);
    }
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill interrupted script");
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg takes plain integers and only sends a signal.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: every member has already exited.
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %err, "failed to kill script process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending::<()>().await,
    }
}

async fn shutdown_signal(rx: Option<&mut broadcast::Receiver<()>>) {
    use tokio::sync::broadcast::error::RecvError;

    match rx {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            // Every sender is gone, nobody can request shutdown any more.
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        },
        None => std::future::pending::<()>().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ScriptErrorKind;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn success_returns_output_with_trailing_newlines() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "ok.sh", "echo one\necho two\nexit 0\n");

        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        let out = runner.execute(Path::new("ok.sh")).await.unwrap();
        assert_eq!(out, "one\ntwo\n");
    }

    #[tokio::test]
    async fn empty_output_is_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "quiet.sh", "exit 0\n");

        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        assert_eq!(runner.execute(Path::new("quiet.sh")).await.unwrap(), "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stderr_lines_keep_their_place_in_the_output() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "mixed.sh",
            "for i in $(seq 1 300); do\n  echo out$i\n  echo err$i 1>&2\ndone\n",
        );

        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        let out = runner.execute(Path::new("mixed.sh")).await.unwrap();

        let expected: String = (1..=300).map(|i| format!("out{i}\nerr{i}\n")).collect();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn runs_in_configured_workdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("marker.txt"), "here\n").unwrap();
        write_script(dir.path(), "cat.sh", "cat marker.txt\n");

        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        assert_eq!(runner.execute(Path::new("cat.sh")).await.unwrap(), "here\n");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_code_and_drops_output() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "fail.sh", "echo partial\nexit 3\n");

        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        let err = runner.execute(Path::new("fail.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::ExecutionFailed);
        assert_eq!(err.to_string(), "script failed with exit code: 3");
        assert!(!err.to_string().contains("partial"));
    }

    #[tokio::test]
    async fn missing_script_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptRunner::new("bash").with_workdir(Some(dir.path().to_path_buf()));
        let err = runner.execute(Path::new("absent.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::IoFailure);
        assert!(matches!(err, ScriptError::ScriptNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_interpreter_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "ok.sh", "exit 0\n");

        let runner = ScriptRunner::new("definitely-not-a-shell-4b1f")
            .with_workdir(Some(dir.path().to_path_buf()));
        let err = runner.execute(Path::new("ok.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::IoFailure);
        assert!(matches!(err, ScriptError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_interrupts_and_kills() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "hang.sh", "sleep 30\n");

        let runner = ScriptRunner::new("bash")
            .with_workdir(Some(dir.path().to_path_buf()))
            .with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = runner.execute(Path::new("hang.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn shutdown_interrupts_running_script() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "hang.sh", "sleep 30\n");

        let (shutdown_tx, _) = broadcast::channel(1);
        let runner = ScriptRunner::new("bash")
            .with_workdir(Some(dir.path().to_path_buf()))
            .with_shutdown(shutdown_tx.clone());

        let handle = tokio::spawn(async move { runner.execute(Path::new("hang.sh")).await });
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(()).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("script should be interrupted")
            .unwrap()
            .unwrap_err();
        match err {
            ScriptError::Interrupted { reason } => assert!(reason.contains("shutting down")),
            other => panic!("expected Interrupted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_covers_background_jobs_holding_the_output() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "detach.sh", "sleep 8 &\necho started\nexit 0\n");

        let runner = ScriptRunner::new("bash")
            .with_workdir(Some(dir.path().to_path_buf()))
            .with_timeout(Some(Duration::from_secs(1)));
        let started = Instant::now();
        let err = runner.execute(Path::new("detach.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(target_os = "linux")]
    fn is_alive(pid: &str) -> bool {
        // /proc/<pid>/stat is "<pid> (<comm>) <state> ..."; Z is a zombie.
        match fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn interrupt_kills_the_whole_process_group() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "spawner.sh",
            "sleep 30 &\necho $! > grandchild.pid\nwait\n",
        );

        let runner = ScriptRunner::new("bash")
            .with_workdir(Some(dir.path().to_path_buf()))
            .with_timeout(Some(Duration::from_secs(1)));
        let err = runner.execute(Path::new("spawner.sh")).await.unwrap_err();
        assert_eq!(err.kind(), ScriptErrorKind::Interrupted);

        let pid = fs::read_to_string(dir.path().join("grandchild.pid")).unwrap();
        let pid = pid.trim();
        assert!(!pid.is_empty());

        // The orphan is reaped by init asynchronously.
        let gone_by = Instant::now() + Duration::from_secs(5);
        while is_alive(pid) && Instant::now() < gone_by {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!is_alive(pid), "background job {pid} survived the interrupt");
    }
}
