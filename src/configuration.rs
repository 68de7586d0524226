//! The device configuration: which time server to ask and how far local time is from UTC.

use heapless::String;

use crate::shared_constants::{
    DEFAULT_TIME_SERVER, DEFAULT_UTC_OFFSET_HOURS, MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS,
    TIME_SERVER_CAPACITY,
};

/// Bounded time server name or address.
pub type TimeServer = String<TIME_SERVER_CAPACITY>;

/// The device configuration.
///
/// Both fields always hold a usable value: [`Configuration::default`] supplies
/// `"pool.ntp.org"` and `+1.0` hours.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub time_server: TimeServer,
    pub utc_offset_hours: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            time_server: default_time_server(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl Configuration {
    /// The UTC offset rounded to whole seconds (half away from zero).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offset hours are range checked to -12..=14"
    )]
    pub fn utc_offset_seconds(&self) -> i32 {
        let seconds = self.utc_offset_hours * 3600.0;
        if seconds >= 0.0 {
            (seconds + 0.5) as i32
        } else {
            (seconds - 0.5) as i32
        }
    }
}

/// The default time server as a bounded string.
#[must_use]
pub fn default_time_server() -> TimeServer {
    truncated_time_server(DEFAULT_TIME_SERVER)
}

/// Copy `text` into a [`TimeServer`], cutting it at the last char boundary that fits.
#[must_use]
pub fn truncated_time_server(text: &str) -> TimeServer {
    let end = (0..=text.len().min(TIME_SERVER_CAPACITY))
        .rev()
        .find(|&index| text.is_char_boundary(index))
        .unwrap_or(0);
    let mut server = TimeServer::new();
    // `end` fits by construction.
    let _ = server.push_str(text.get(..end).unwrap_or_default());
    server
}

/// Whether `text` can name a time server: non-empty, and free of control characters and of
/// the JSON quote and escape characters, which the stored record keeps verbatim.
#[must_use]
pub fn is_valid_time_server(text: &str) -> bool {
    !text.is_empty()
        && !text
            .chars()
            .any(|character| matches!(character, '"' | '\\') || character.is_control())
}

/// Whether `hours` is a finite offset within the supported range.
#[must_use]
pub fn is_valid_utc_offset(hours: f32) -> bool {
    hours.is_finite() && (MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours)
}

#[cfg(test)]
mod tests {
    use super::{Configuration, is_valid_time_server, is_valid_utc_offset, truncated_time_server};

    fn with_offset(hours: f32) -> Configuration {
        Configuration {
            utc_offset_hours: hours,
            ..Configuration::default()
        }
    }

    #[test]
    fn default_is_pool_ntp_plus_one() {
        let config = Configuration::default();
        assert_eq!(config.time_server.as_str(), "pool.ntp.org");
        assert_eq!(config.utc_offset_seconds(), 3600);
    }

    #[test]
    fn fractional_offsets_round_to_seconds() {
        assert_eq!(with_offset(-5.0).utc_offset_seconds(), -18_000);
        assert_eq!(with_offset(5.5).utc_offset_seconds(), 19_800);
        assert_eq!(with_offset(5.75).utc_offset_seconds(), 20_700);
        assert_eq!(with_offset(-3.5).utc_offset_seconds(), -12_600);
        assert_eq!(with_offset(0.0).utc_offset_seconds(), 0);
    }

    #[test]
    fn long_server_names_are_truncated_on_char_boundary() {
        let mut long = std::string::String::new();
        long.push_str(&"a".repeat(254));
        long.push('é');
        let server = truncated_time_server(&long);
        assert_eq!(server.len(), 254);

        let exact = "b".repeat(300);
        assert_eq!(truncated_time_server(&exact).len(), 255);
    }

    #[test]
    fn server_names_exclude_json_escapes() {
        assert!(is_valid_time_server("pool.ntp.org"));
        assert!(is_valid_time_server("192.168.1.10"));
        assert!(!is_valid_time_server(""));
        assert!(!is_valid_time_server("ntp\"x"));
        assert!(!is_valid_time_server("ntp\\x"));
        assert!(!is_valid_time_server("ntp\nx"));
    }

    #[test]
    fn offset_range() {
        assert!(is_valid_utc_offset(-12.0));
        assert!(is_valid_utc_offset(14.0));
        assert!(!is_valid_utc_offset(14.5));
        assert!(!is_valid_utc_offset(f32::NAN));
    }
}
