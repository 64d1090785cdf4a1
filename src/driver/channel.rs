//! The single serialization point for all wallet interaction.
//!
//! One `send` is one write of a newline-terminated command followed by one
//! drain of the child's stdout. There are no correlation ids and no
//! pipelining: responses are matched to commands purely by call order, and
//! `send` takes `&mut self` so a second command cannot be issued while the
//! first is still draining.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, ChildStdout};

use super::drain::{drain, DrainConfig};
use super::transcript::Transcript;

/// Transport-level failure on the command/response channel.
///
/// These are the only errors allowed to abort a test; a child rejecting a
/// command in prose comes back as ordinary response text.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    /// Stream closed, write rejected, or transcript write failed.
    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The child produced bytes that are not valid UTF-8.
    #[error("Response is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Command/response channel over a wallet child's stdin and stdout.
#[derive(Debug)]
pub struct CommandChannel {
    stdin: ChildStdin,
    stdout: ChildStdout,
    config: DrainConfig,
    transcript: Transcript,
}

impl CommandChannel {
    /// Wrap the child's streams together with the transcript sink.
    #[must_use]
    pub fn new(
        stdin: ChildStdin,
        stdout: ChildStdout,
        config: DrainConfig,
        transcript: Transcript,
    ) -> Self {
        Self {
            stdin,
            stdout,
            config,
            transcript,
        }
    }

    /// Send one command line and drain its response.
    ///
    /// A trailing newline is appended if the command does not already carry
    /// one. The raw trimmed response text is returned; an empty string means
    /// the child produced no output within the bounded wait.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` on transport failure.
    pub async fn send(&mut self, command: &str) -> Result<String, ChannelError> {
        let mut line = command.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }

        tracing::debug!(command = %command, "sending wallet command");
        self.transcript.record_write(line.as_bytes())?;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        drain(&mut self.stdout, &self.config, &mut self.transcript).await
    }

    /// Path of the transcript capture file.
    #[must_use]
    pub fn transcript_path(&self) -> &Path {
        self.transcript.path()
    }
}
