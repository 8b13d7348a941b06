use super::command::CommandLine;
use crate::error::{MergeError, Result};
use std::fs::File;
use std::process::{Child, ExitStatus, Stdio};
use tracing::debug;

/// How to run an external tool: which streams to capture and whether stdin is a pipe.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    command: &'a CommandLine,
    capture_stdout: bool,
    capture_stderr: bool,
    pipe_stdin: bool,
}

/// Result of a run-to-completion invocation.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

impl<'a> Invocation<'a> {
    /// Captures stdout and stderr, with no stdin.
    pub fn new(command: &'a CommandLine) -> Self {
        Self {
            command,
            capture_stdout: true,
            capture_stderr: true,
            pipe_stdin: false,
        }
    }

    /// When off, stdout is inherited from this process.
    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    pub fn pipe_stdin(mut self, pipe: bool) -> Self {
        self.pipe_stdin = pipe;
        self
    }

    /// Start the process without waiting for it.
    pub fn spawn(&self) -> Result<Child> {
        let stderr = if self.capture_stderr { Stdio::piped() } else { Stdio::inherit() };
        self.spawn_with(stderr)
    }

    /// Like [`spawn`](Self::spawn), but stderr is appended to `log` instead of a pipe.
    ///
    /// For children that run alongside us: nothing reads a pipe until they exit,
    /// and a full one would stall them.
    pub fn spawn_logging(&self, log: &File) -> Result<Child> {
        self.spawn_with(Stdio::from(log.try_clone()?))
    }

    fn spawn_with(&self, stderr: Stdio) -> Result<Child> {
        debug!(command = %self.command, "spawning");
        let mut command = self.command.to_command();
        command
            .stdin(if self.pipe_stdin { Stdio::piped() } else { Stdio::null() })
            .stdout(if self.capture_stdout { Stdio::piped() } else { Stdio::inherit() })
            .stderr(stderr);

        command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MergeError::Config(format!(
                    "{} not found; install it or point to it with --ffmpeg/--ffprobe",
                    self.command.program().display()
                ))
            } else {
                MergeError::Io(e)
            }
        })
    }

    /// Run to completion, whatever the exit status.
    pub fn run(&self) -> Result<Captured> {
        let output = self.spawn()?.wait_with_output()?;
        Ok(Captured {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run to completion; a non-zero exit becomes a subprocess error.
    pub fn run_checked(&self) -> Result<Captured> {
        let captured = self.run()?;
        if !captured.status.success() {
            return Err(self.failure(&captured.stderr));
        }
        Ok(captured)
    }

    pub fn failure(&self, stderr: &[u8]) -> MergeError {
        MergeError::Subprocess {
            command: self.command.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim_end().to_string(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let mut cmd = CommandLine::new("echo");
        cmd.add_args(["hello"]);
        let captured = Invocation::new(&cmd).run_checked().unwrap();
        // echo prints the global "-v error" flags too
        assert!(String::from_utf8_lossy(&captured.stdout).contains("hello"));
    }

    #[test]
    fn test_non_zero_exit_is_subprocess_error() {
        let cmd = CommandLine::new("false");
        let err = Invocation::new(&cmd).run_checked().unwrap_err();
        assert!(matches!(err, MergeError::Subprocess { .. }));
        assert!(err.to_string().contains("'false'"));
    }

    #[test]
    fn test_spawn_logging_writes_stderr_to_file() {
        use std::io::{Read, Seek, SeekFrom};

        // cat complains on stderr about the missing file
        let mut cmd = CommandLine::new("cat");
        cmd.add_args(["/nonexistent/abmerge-log"]);
        let mut log = tempfile::tempfile().unwrap();
        let status = Invocation::new(&cmd)
            .capture_stdout(false)
            .spawn_logging(&log)
            .unwrap()
            .wait()
            .unwrap();
        assert!(!status.success());

        let mut text = String::new();
        log.seek(SeekFrom::Start(0)).unwrap();
        log.read_to_string(&mut text).unwrap();
        assert!(text.contains("/nonexistent/abmerge-log"));
    }

    #[test]
    fn test_missing_program_is_config_error() {
        let cmd = CommandLine::new("/definitely/not/a/real/tool");
        let err = Invocation::new(&cmd).run().unwrap_err();
        assert!(matches!(err, MergeError::Config(_)));
    }
}
