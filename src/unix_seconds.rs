//! Unix timestamp type for time-related devices

use time::OffsetDateTime;

/// Units-safe wrapper for Unix timestamps (seconds since 1970-01-01 00:00:00 UTC)
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnixSeconds(pub i64);

/// 1900→1970 offset: 70 years * 365.25 days/year * 86400 seconds/day
const NTP_TO_UNIX_SECONDS: i64 = 2_208_988_800;
/// Length of one NTP era (2^32 seconds).
const NTP_ERA_SECONDS: i64 = 1 << 32;

impl UnixSeconds {
    /// Get the underlying i64 value
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Convert NTP seconds (since 1900-01-01) to Unix seconds (since 1970-01-01).
    ///
    /// Timestamps with the most significant bit clear are taken to be in NTP era 1
    /// (from 2036-02-07 onward), per RFC 4330 section 3.
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "a u32 plus one NTP era stays far inside i64"
    )]
    pub fn from_ntp_seconds(ntp: u32) -> Self {
        let mut seconds = i64::from(ntp);
        if ntp & 0x8000_0000 == 0 {
            seconds += NTP_ERA_SECONDS;
        }
        Self(seconds - NTP_TO_UNIX_SECONDS)
    }

    /// Shift by a signed number of seconds, saturating at the `i64` range.
    #[must_use]
    pub fn offset_by(self, seconds: i32) -> Self {
        Self(self.0.saturating_add(i64::from(seconds)))
    }

    /// Convert to a UTC calendar date and time, if within the supported range.
    #[must_use]
    pub fn to_utc_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.as_i64()).ok()
    }
}
