//! The report line written to the serial link: `T<DD><MM><YYYY>-<W>-<hh><mm><ss>\n`.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::unix_seconds::UnixSeconds;
use crate::{Error, Result};

/// One formatted report line, newline included.
pub type ReportLine = String<24>;

/// Calendar decomposition of a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarFields {
    pub day: u8,
    pub month: u8,
    pub year: i32,
    /// Day of the week, 0..=6 with Sunday = 0.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CalendarFields {
    /// Decompose `unix_seconds`, read as a wall-clock time (any offset already applied).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestampOutOfRange`] outside the calendar range of the `time` crate.
    pub fn from_unix(unix_seconds: UnixSeconds) -> Result<Self> {
        let date_time = unix_seconds
            .to_utc_datetime()
            .ok_or(Error::TimestampOutOfRange)?;
        Ok(Self {
            day: date_time.day(),
            month: u8::from(date_time.month()),
            year: date_time.year(),
            weekday: date_time.weekday().number_days_from_sunday(),
            hour: date_time.hour(),
            minute: date_time.minute(),
            second: date_time.second(),
        })
    }
}

impl fmt::Display for CalendarFields {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "T{:02}{:02}{}-{}-{:02}{:02}{:02}",
            self.day, self.month, self.year, self.weekday, self.hour, self.minute, self.second
        )
    }
}

/// Render the report line for `unix_seconds`.
///
/// # Errors
///
/// Returns [`Error::TimestampOutOfRange`] if the value has no calendar date, or
/// [`Error::FormatError`] if the line does not fit.
pub fn format_report(unix_seconds: UnixSeconds) -> Result<ReportLine> {
    let fields = CalendarFields::from_unix(unix_seconds)?;
    let mut line = ReportLine::new();
    writeln!(line, "{fields}")?;
    Ok(line)
}
