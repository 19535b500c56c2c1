//! Draining of subprocess output streams into temporary log files.
//!
//! A child whose stdout or stderr pipe fills up blocks until someone reads
//! it, so both streams must be drained while the caller waits for exit. Each
//! [`StreamCapture`] owns one tokio task and one private log file; the file
//! is deleted once the capture is finished or dropped.

use crate::error::Result;

use std::path::Path;
use tempfile::TempPath;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub struct StreamCapture {
    label: String,
    path: TempPath,
    handle: JoinHandle<()>,
}

impl StreamCapture {
    /// Starts draining `stream` line by line into a fresh `<label>*.log` file.
    ///
    /// Must be called before waiting on the child process.
    pub fn spawn<R>(stream: R, label: &str, temp_dir: Option<&Path>) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut builder = tempfile::Builder::new();
        builder.prefix(label).suffix(".log");
        let file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (file, path) = file.into_parts();

        let task_label = label.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = drain(stream, tokio::fs::File::from_std(file)).await {
                log::error!("Exception while draining the {task_label} output: {e}");
            }
        });

        Ok(Self {
            label: label.to_string(),
            path,
            handle,
        })
    }

    /// Waits for the stream to close and returns everything captured.
    ///
    /// Never fails: a drain or read error is logged and yields whatever text
    /// could be recovered, so that it cannot mask the child's exit status.
    pub async fn finish(self) -> String {
        self.finish_by(None).await
    }

    /// Like [`finish`](Self::finish), but stops waiting at `deadline`.
    ///
    /// The stream outlives the child when a descendant inherited the pipe.
    /// Past the deadline the drain is aborted and the text captured so far
    /// is returned.
    pub async fn finish_by(self, deadline: Option<Instant>) -> String {
        let StreamCapture {
            label,
            path,
            mut handle,
        } = self;

        let joined = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    log::warn!(
                        "The {label} stream is still open past the deadline; abandoning it"
                    );
                    handle.abort();
                    // Resolves as cancelled once the task has stopped writing.
                    let _ = handle.await;
                    Ok(())
                }
            },
            None => handle.await,
        };
        if let Err(e) = joined {
            log::error!("The {label} capture task did not complete: {e}");
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                log::error!("Could not read the captured {label} output: {e}");
                String::new()
            }
        }
    }

    /// Stops draining without waiting for the stream to close.
    ///
    /// Used when the child was killed: grandchildren may still hold the pipe.
    pub fn abort(self) {
        self.handle.abort();
    }
}

async fn drain<R>(stream: R, file: tokio::fs::File) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut writer = BufWriter::new(file);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        writer.write_all(&line).await?;
        if !line.ends_with(b"\n") {
            writer.write_all(b"\n").await?;
        }
        if reader.buffer().is_empty() {
            writer.flush().await?;
        }
    }

    writer.flush().await
}
