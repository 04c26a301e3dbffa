use std::io::{PipeReader, PipeWriter};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::error::ScriptError;

const STREAM: &str = "script output";

/// One OS pipe whose write end is handed to both stdout and stderr of
/// the child, so the kernel orders the lines as they are written.
pub(crate) struct MergedPipe {
    pub reader: PipeReader,
    pub stdout: PipeWriter,
    pub stderr: PipeWriter,
}

impl MergedPipe {
    pub fn open() -> Result<Self, ScriptError> {
        let io_err = |source| ScriptError::StreamIo { stream: STREAM, source };
        let (reader, stdout) = std::io::pipe().map_err(io_err)?;
        let stderr = stdout.try_clone().map_err(io_err)?;
        Ok(Self { reader, stdout, stderr })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Captured {
    pub output: String,
    pub lines: usize,
}

/// Reads the merged stream to EOF on a runtime task. EOF only arrives once
/// every process holding the write end has exited.
pub(crate) fn capture(
    reader: PipeReader,
) -> Result<JoinHandle<Result<Captured, ScriptError>>, ScriptError> {
    let reader =
        into_async(reader).map_err(|source| ScriptError::StreamIo { stream: STREAM, source })?;
    Ok(tokio::spawn(read_lines(reader)))
}

#[cfg(unix)]
fn into_async(reader: PipeReader) -> std::io::Result<tokio::net::unix::pipe::Receiver> {
    tokio::net::unix::pipe::Receiver::from_owned_fd(std::os::fd::OwnedFd::from(reader))
}

#[cfg(windows)]
fn into_async(reader: PipeReader) -> std::io::Result<tokio::fs::File> {
    let handle = std::os::windows::io::OwnedHandle::from(reader);
    Ok(tokio::fs::File::from_std(std::fs::File::from(handle)))
}

/// Splits on `\n`, drops a trailing `\r`, decodes lossily and terminates
/// every line, including an unterminated tail, with `\n`.
pub(crate) async fn read_lines<R>(reader: R) -> Result<Captured, ScriptError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut captured = Captured::default();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| ScriptError::StreamIo { stream: STREAM, source })?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(strip_eol(&buf));
        tracing::trace!(target: "deploy_hook.script", line = %line);
        captured.output.push_str(&line);
        captured.output.push('\n');
        captured.lines += 1;
    }
    Ok(captured)
}

fn strip_eol(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
