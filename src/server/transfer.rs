//! Request body reading with size and throughput limits.
//!
//! The body is read in chunks, each bounded by [`CHUNK_READ_TIMEOUT`]. Once the
//! grace period is over, throughput is sampled at most once a second and the
//! read is abandoned as soon as a sample falls under the configured minimum.
//! This keeps slow uploads from pinning a connection for the whole request
//! timeout.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout, Instant};

use crate::server::config::ServerConfig;
use crate::server::error::TransferError;

/// Largest single read from the socket.
pub const CHUNK_SIZE: usize = 8192;

/// Upper bound for one chunk read, independent of the connection deadline.
pub const CHUNK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Time after which throughput is checked even if little has arrived.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Minimum spacing between two throughput samples.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Tracks body throughput between samples.
#[derive(Debug)]
pub(crate) struct ThroughputMeter {
    started: Instant,
    last_sample: Instant,
    last_total: usize,
    expected: usize,
    minimum: u64,
}

impl ThroughputMeter {
    pub(crate) fn new(started: Instant, already_read: usize, expected: usize, minimum: u64) -> Self {
        Self {
            started,
            last_sample: started,
            last_total: already_read,
            expected,
            minimum,
        }
    }

    /// Record that `total` body bytes have arrived by `now`.
    ///
    /// The grace period lasts until more than [`GRACE_PERIOD`] has elapsed or
    /// more than a tenth of the body has arrived, whichever comes first.
    pub(crate) fn record(&mut self, total: usize, now: Instant) -> Result<(), TransferError> {
        let in_grace = now.duration_since(self.started) <= GRACE_PERIOD && total <= self.expected / 10;
        if in_grace {
            return Ok(());
        }

        let since_sample = now.duration_since(self.last_sample);
        if since_sample <= SAMPLE_INTERVAL {
            return Ok(());
        }

        let received = total.saturating_sub(self.last_total);
        let rate = (received as f64 / since_sample.as_secs_f64()) as u64;
        if rate < self.minimum {
            return Err(TransferError::TooSlow {
                rate,
                min: self.minimum,
            });
        }

        self.last_sample = now;
        self.last_total = total;
        Ok(())
    }
}

/// Read a body of `content_length` bytes.
///
/// `prefix` holds body bytes that arrived together with the headers; reading
/// continues after them. The body is never read past `content_length`.
///
/// # Errors
///
/// - [`TransferError::TooLarge`] before any read when `content_length` is over
///   `config.max_content_length`
/// - [`TransferError::ReadTimeout`] when one chunk takes longer than
///   [`CHUNK_READ_TIMEOUT`]
/// - [`TransferError::TooSlow`] when a throughput sample is under
///   `config.minimum_transfer_speed`
/// - [`TransferError::ConnectionClosed`] on EOF before the body is complete
pub async fn read_body<R>(
    reader: &mut R,
    prefix: Vec<u8>,
    content_length: usize,
    config: &ServerConfig,
) -> Result<Vec<u8>, TransferError>
where
    R: AsyncRead + Unpin,
{
    if content_length > config.max_content_length {
        return Err(TransferError::TooLarge {
            declared: content_length,
            max: config.max_content_length,
        });
    }

    let mut body = prefix;
    if body.len() >= content_length {
        body.truncate(content_length);
        return Ok(body);
    }
    body.reserve(content_length - body.len());

    let mut chunk = vec![0; CHUNK_SIZE.min(content_length)];
    let mut meter = ThroughputMeter::new(
        Instant::now(),
        body.len(),
        content_length,
        config.minimum_transfer_speed,
    );

    while body.len() < content_length {
        let wanted = chunk.len().min(content_length - body.len());
        let n = match timeout(CHUNK_READ_TIMEOUT, reader.read(&mut chunk[..wanted])).await {
            Ok(read) => read?,
            Err(_) => return Err(TransferError::ReadTimeout),
        };

        if n == 0 {
            return Err(TransferError::ConnectionClosed {
                received: body.len(),
                expected: content_length,
            });
        }

        body.extend_from_slice(&chunk[..n]);
        meter.record(body.len(), Instant::now())?;
    }

    debug!("Read {len} body bytes", len = body.len());
    Ok(body)
}
