//! OSC time tags
//!
//! A time tag is a 64-bit fixed-point value: seconds since 1900-01-01 in the
//! high 32 bits, sub-second part in the low 32 bits. The raw value `1` is
//! reserved for "immediately".
//!
//! The low word carries nanoseconds (0..1e9), so 500 ms is `0x1DCD6500`.

use crate::codec::read_u64;
use crate::Result;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the OSC epoch (1900) and the Unix epoch (1970)
pub const UNIX_OSC_EPOCH_OFFSET: u64 = 2_208_988_800;

/// Encoded value of the "immediate" time tag
pub const IMMEDIATE: u64 = 0x01;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// An OSC time tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeTag {
    seconds: u32,
    fraction: u32,
    immediate: bool,
}

impl Default for TimeTag {
    fn default() -> Self {
        Self::immediate()
    }
}

impl TimeTag {
    /// Time tag for the given wall-clock time
    pub fn new(time: SystemTime) -> Self {
        let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                let secs = -(d.as_secs() as i64);
                match d.subsec_nanos() {
                    0 => (secs, 0),
                    n => (secs - 1, NANOS_PER_SECOND - n),
                }
            }
        };
        Self::from_unix(secs, nanos)
    }

    /// Time tag for a Unix timestamp
    ///
    /// Whole seconds in `nanos` carry into `secs`. Seconds wrap modulo 2^32,
    /// like the 32-bit OSC era field.
    pub fn from_unix(secs: i64, nanos: u32) -> Self {
        let carry = (nanos / NANOS_PER_SECOND) as i64;
        let osc_secs = secs
            .wrapping_add(carry)
            .wrapping_add(UNIX_OSC_EPOCH_OFFSET as i64);
        Self {
            seconds: osc_secs as u32,
            fraction: nanos % NANOS_PER_SECOND,
            immediate: false,
        }
    }

    /// The current time
    pub fn now() -> Self {
        Self::new(SystemTime::now())
    }

    /// The "execute immediately" sentinel
    pub const fn immediate() -> Self {
        Self {
            seconds: 0,
            fraction: 0,
            immediate: true,
        }
    }

    /// Build from the 64-bit wire value
    pub fn from_raw(raw: u64) -> Self {
        if raw == IMMEDIATE {
            return Self::immediate();
        }
        Self {
            seconds: (raw >> 32) as u32,
            fraction: raw as u32,
            immediate: false,
        }
    }

    /// The 64-bit wire value
    ///
    /// A real time of 1 ns past the OSC epoch shares the raw value `1` with
    /// the immediate sentinel, so it decodes as immediate.
    pub fn to_raw(&self) -> u64 {
        if self.immediate {
            IMMEDIATE
        } else {
            (self.seconds as u64) << 32 | self.fraction as u64
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    /// Seconds since the OSC epoch
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Low word of the time tag (nanoseconds)
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// Convert to wall-clock time; an immediate tag means "now"
    pub fn to_system_time(&self) -> SystemTime {
        if self.immediate {
            return SystemTime::now();
        }

        let unix_secs = self.seconds as i64 - UNIX_OSC_EPOCH_OFFSET as i64;
        let nanos = Duration::from_nanos(self.fraction as u64);
        if unix_secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(unix_secs as u64) + nanos
        } else {
            UNIX_EPOCH - Duration::from_secs(unix_secs.unsigned_abs()) + nanos
        }
    }
}

impl From<SystemTime> for TimeTag {
    fn from(time: SystemTime) -> Self {
        Self::new(time)
    }
}

impl fmt::Display for TimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.immediate {
            write!(f, "TimeTag: (immediate)")
        } else {
            write!(f, "TimeTag: {}.{:09}", self.seconds, self.fraction)
        }
    }
}

/// Write an 8-byte time tag
#[inline]
pub fn encode_time_tag(buf: &mut BytesMut, time_tag: &TimeTag) {
    buf.put_u64(time_tag.to_raw());
}

/// Read an 8-byte time tag
#[inline]
pub fn decode_time_tag(buf: &mut &[u8]) -> Result<TimeTag> {
    read_u64(buf).map(TimeTag::from_raw)
}
