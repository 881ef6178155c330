//! Reader and stream configuration.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Configuration for segment readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Maximum number of bytes requested from the store per fill.
    ///
    /// Default: 64 KB
    pub read_length: usize,

    /// Timeout passed to every store call.
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// How long a fill waits before asking again when it has caught up with
    /// an unsealed segment.
    ///
    /// Default: 10 ms
    pub poll_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_length: 64 * 1024,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl ReaderConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fill read length.
    pub fn read_length(mut self, bytes: usize) -> Self {
        self.read_length = bytes;
        self
    }

    /// Sets the store call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the tailing poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Checks that the configuration can be used.
    pub fn validate(&self) -> ClientResult<()> {
        if self.read_length == 0 {
            return Err(ClientError::invalid_configuration("read_length must be positive"));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::invalid_configuration("timeout must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(ClientError::invalid_configuration("poll_interval must be positive"));
        }
        Ok(())
    }
}

/// How a stream's segment count is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleType {
    /// A fixed number of segments.
    FixedNumSegments,
    /// Scale on incoming kilobytes per second.
    ByRateInKbytesPerSec,
    /// Scale on incoming events per second.
    ByRateInEventsPerSec,
}

/// Scaling settings for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// What drives scaling.
    pub scale_type: ScaleType,
    /// Target rate per segment; unused for a fixed policy.
    pub target_rate: u32,
    /// Number of segments one segment splits into; unused for a fixed policy.
    pub scale_factor: u32,
    /// Lower bound on the number of segments.
    pub min_num_segments: u32,
}

impl ScalingPolicy {
    /// A fixed number of segments.
    pub fn fixed(num_segments: u32) -> Self {
        Self {
            scale_type: ScaleType::FixedNumSegments,
            target_rate: 0,
            scale_factor: 0,
            min_num_segments: num_segments,
        }
    }

    /// Scale to keep each segment near `target_kbps` kilobytes per second.
    pub fn by_data_rate(target_kbps: u32, scale_factor: u32, min_num_segments: u32) -> Self {
        Self {
            scale_type: ScaleType::ByRateInKbytesPerSec,
            target_rate: target_kbps,
            scale_factor,
            min_num_segments,
        }
    }

    /// Scale to keep each segment near `target_events` events per second.
    pub fn by_event_rate(target_events: u32, scale_factor: u32, min_num_segments: u32) -> Self {
        Self {
            scale_type: ScaleType::ByRateInEventsPerSec,
            target_rate: target_events,
            scale_factor,
            min_num_segments,
        }
    }

    fn validate(&self) -> ClientResult<()> {
        if self.min_num_segments == 0 {
            return Err(ClientError::invalid_configuration(
                "a stream needs at least one segment",
            ));
        }
        if self.scale_type != ScaleType::FixedNumSegments {
            if self.target_rate == 0 {
                return Err(ClientError::invalid_configuration("target rate must be positive"));
            }
            if self.scale_factor < 2 {
                return Err(ClientError::invalid_configuration(
                    "scale factor must be at least 2",
                ));
            }
        }
        Ok(())
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self::fixed(1)
    }
}

/// How long a stream's data is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Retention period; `None` keeps data forever.
    pub retention: Option<Duration>,
}

impl RetentionPolicy {
    /// Keep data forever.
    pub const fn infinite() -> Self {
        Self { retention: None }
    }

    /// Keep data for `period`.
    pub const fn by_time(period: Duration) -> Self {
        Self {
            retention: Some(period),
        }
    }

    /// Returns true if data is kept forever.
    pub const fn is_infinite(&self) -> bool {
        self.retention.is_none()
    }
}

/// Settings of a stream.
///
/// A passive record: nothing in the segment store acts on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    /// Scaling settings.
    #[serde(default)]
    pub scaling_policy: ScalingPolicy,

    /// Retention settings.
    #[serde(default)]
    pub retention_policy: RetentionPolicy,

    /// How long a noted writer time stays current.
    ///
    /// Default: zero, so a noted time is only current at the instant it was
    /// noted until a timeout is configured.
    #[serde(default)]
    pub timestamp_aggregation_timeout: Duration,
}

impl StreamConfiguration {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scaling policy.
    pub fn scaling_policy(mut self, policy: ScalingPolicy) -> Self {
        self.scaling_policy = policy;
        self
    }

    /// Sets the retention policy.
    pub fn retention_policy(mut self, policy: RetentionPolicy) -> Self {
        self.retention_policy = policy;
        self
    }

    /// Sets the timestamp aggregation timeout.
    pub fn timestamp_aggregation_timeout(mut self, timeout: Duration) -> Self {
        self.timestamp_aggregation_timeout = timeout;
        self
    }

    /// Checks that the configuration is consistent.
    pub fn validate(&self) -> ClientResult<()> {
        self.scaling_policy.validate()?;
        if self.retention_policy.retention.is_some_and(|d| d.is_zero()) {
            return Err(ClientError::invalid_configuration(
                "retention period must be positive",
            ));
        }
        Ok(())
    }
}

/// A writer-supplied timestamp and the local instant it was noted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotedTime {
    timestamp: u64,
    noted_at: Instant,
}

impl NotedTime {
    /// Records `timestamp` as noted at `noted_at`.
    pub fn new(timestamp: u64, noted_at: Instant) -> Self {
        Self {
            timestamp,
            noted_at,
        }
    }

    /// Records `timestamp` as noted now.
    pub fn now(timestamp: u64) -> Self {
        Self::new(timestamp, Instant::now())
    }

    /// Returns the noted timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the timestamp if it is still current at `now`.
    ///
    /// A noted time expires once the stream's timestamp aggregation timeout
    /// has passed since it was noted.
    pub fn current_at(&self, config: &StreamConfiguration, now: Instant) -> Option<u64> {
        let age = now.saturating_duration_since(self.noted_at);
        (age <= config.timestamp_aggregation_timeout).then_some(self.timestamp)
    }
}
