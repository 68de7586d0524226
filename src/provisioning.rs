//! Network provisioning boundary.
//!
//! A [`ProvisioningGateway`] brings the network up, possibly after letting the user edit the
//! configuration. The form fields it presents are described by [`FormField`]; submitted text
//! is applied with [`apply_submission`].

use core::fmt::Write as _;

use embassy_time::Duration;
use heapless::String;

use crate::configuration::{
    Configuration, is_valid_time_server, is_valid_utc_offset, truncated_time_server,
};
use crate::shared_constants::TIME_SERVER_CAPACITY;
use crate::{Error, Result};

/// The outcome of a successful [`ProvisioningGateway::connect`].
#[derive(Clone, Debug, PartialEq)]
pub struct Provisioned {
    pub configuration: Configuration,
    /// The user edited and submitted the form; the configuration should be saved.
    pub changed: bool,
}

/// Establishes network connectivity, blocking up to a timeout.
#[expect(async_fn_in_trait, reason = "single-threaded executor, no Send bound needed")]
#[expect(
    clippy::module_name_repetitions,
    reason = "reads better than provisioning::Gateway at call sites"
)]
pub trait ProvisioningGateway {
    /// Connect using `prefill` as the starting configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProvisioningTimeout`] if no connection is made within `timeout`.
    async fn connect(&mut self, prefill: &Configuration, timeout: Duration) -> Result<Provisioned>;
}

/// One user-editable field of the provisioning form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormField {
    pub id: &'static str,
    pub label: &'static str,
    /// Longest accepted value in characters.
    pub max_len: usize,
}

pub const TIME_SERVER_FIELD: FormField = FormField {
    id: "timeserver",
    label: "Timeserver",
    max_len: TIME_SERVER_CAPACITY,
};

pub const TIMEZONE_FIELD: FormField = FormField {
    id: "timezone",
    label: "Timezone in [h]",
    max_len: 6,
};

/// Text shown in the timezone field before editing, such as `1.00`.
#[must_use]
pub fn prefill_timezone(configuration: &Configuration) -> String<16> {
    let mut text = String::new();
    // Fits: offsets are range checked to -12..=14.
    let _ = write!(text, "{:.2}", configuration.utc_offset_hours);
    text
}

/// Apply submitted form text to `configuration`, returning whether anything changed.
///
/// Both values are trimmed. Nothing is applied unless both are valid.
///
/// # Errors
///
/// Returns [`Error::InvalidSubmission`] if a value is empty or too long, if the server name
/// holds a quote, backslash or control character, or if the offset is not a number within
/// -12..=14 hours.
pub fn apply_submission(
    configuration: &mut Configuration,
    timeserver_text: &str,
    timezone_text: &str,
) -> Result<bool> {
    let timeserver = timeserver_text.trim();
    if !is_valid_time_server(timeserver) || timeserver.len() > TIME_SERVER_FIELD.max_len {
        warn!("Rejected timeserver ({} bytes)", timeserver.len());
        return Err(Error::InvalidSubmission);
    }

    let timezone = timezone_text.trim();
    if timezone.is_empty() || timezone.len() > TIMEZONE_FIELD.max_len {
        warn!("Rejected timezone ({} bytes)", timezone.len());
        return Err(Error::InvalidSubmission);
    }
    let utc_offset_hours = timezone.parse::<f32>().map_err(|_| Error::InvalidSubmission)?;
    if !is_valid_utc_offset(utc_offset_hours) {
        warn!("Rejected timezone {}", utc_offset_hours);
        return Err(Error::InvalidSubmission);
    }

    let submitted = Configuration {
        time_server: truncated_time_server(timeserver),
        utc_offset_hours,
    };
    let changed = submitted != *configuration;
    *configuration = submitted;
    Ok(changed)
}

/// Apply fixed overrides (such as build-time settings) as if the user had submitted them.
///
/// A missing value keeps the current one. Returns whether anything changed; invalid
/// overrides are logged and ignored.
pub fn apply_overrides(
    configuration: &mut Configuration,
    timeserver: Option<&str>,
    timezone: Option<&str>,
) -> bool {
    if timeserver.is_none() && timezone.is_none() {
        return false;
    }
    let current_server = configuration.time_server.clone();
    let current_zone = prefill_timezone(configuration);
    match apply_submission(
        configuration,
        timeserver.unwrap_or(current_server.as_str()),
        timezone.unwrap_or(current_zone.as_str()),
    ) {
        Ok(changed) => changed,
        Err(err) => {
            warn!("Ignoring configuration override: {}", err);
            false
        }
    }
}
