//! Response completion detection over an unframed byte stream.
//!
//! The wallet writes each response as one or more flushes with no length
//! prefix or delimiter, so "the response is done" has to be inferred. The
//! drain is two-phase: a generous bounded wait for the first chunk, then
//! short-timeout reads until one yields nothing. The quiescence window is a
//! heuristic trading a fixed ~100ms of latency per command for correctness;
//! a response emitted in two bursts farther apart than the window is
//! truncated at the gap, which is a known source of flakiness under load.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use super::channel::ChannelError;
use super::transcript::Transcript;

/// Transcript note written when the first read times out.
const TIMEOUT_NOTE: &str = "read from stdout timedout";

/// Timeouts and buffer size for the two-phase drain.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Bounded wait for the first chunk of a response.
    pub first_read_timeout: Duration,
    /// Quiescence window: a read attempt yielding nothing within this window
    /// ends the response.
    pub quiescence_window: Duration,
    /// Read buffer size per attempt.
    pub chunk_size: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            first_read_timeout: Duration::from_secs(30),
            quiescence_window: Duration::from_millis(100),
            chunk_size: 1 << 20,
        }
    }
}

/// Read all currently-available output for one command.
///
/// A first-read timeout is a degraded result, not an error: it is noted in
/// the transcript and an empty string is returned, so the caller can assert
/// on the (missing) prose. Every chunk read is duplicated into the
/// transcript before being accumulated.
///
/// # Errors
///
/// Returns `ChannelError::Io` on stream failure and `ChannelError::Utf8` if
/// the accumulated bytes are not valid UTF-8.
pub async fn drain<R>(
    stdout: &mut R,
    config: &DrainConfig,
    transcript: &mut Transcript,
) -> Result<String, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; config.chunk_size];
    let mut collected = Vec::new();

    match timeout(config.first_read_timeout, stdout.read(&mut buf)).await {
        Err(_) => {
            transcript.annotate(TIMEOUT_NOTE)?;
            return Ok(String::new());
        }
        Ok(read) => {
            let n = read?;
            if n > 0 {
                transcript.record_read(&buf[..n])?;
                collected.extend_from_slice(&buf[..n]);
            }
        }
    }

    loop {
        match timeout(config.quiescence_window, stdout.read(&mut buf)).await {
            // Quiescence: no further output is forthcoming.
            Err(_) => break,
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                transcript.record_read(&buf[..n])?;
                collected.extend_from_slice(&buf[..n]);
            }
            Ok(Err(err)) => return Err(err.into()),
        }
    }

    let text = String::from_utf8(collected)?;
    Ok(text.trim().to_string())
}
