//! Load and save the [`Configuration`] as a small JSON record.
//!
//! The record looks like `{"timeserver":"pool.ntp.org","timezone":1.0}`. Unknown fields are
//! ignored and each missing or invalid field falls back to its own default. Server names never
//! hold characters JSON escapes, so the text is read back as stored.

use serde::{Deserialize, Serialize};

use crate::configuration::{
    Configuration, default_time_server, is_valid_time_server, is_valid_utc_offset,
    truncated_time_server,
};
use crate::shared_constants::{DEFAULT_UTC_OFFSET_HOURS, MAX_CONFIG_FILE_SIZE};
use crate::storage::{FileSystem, Mounted};
use crate::{Error, Result};

#[derive(Deserialize, Default)]
struct StoredFields<'a> {
    #[serde(default, borrow)]
    timeserver: Option<&'a str>,
    #[serde(default)]
    timezone: Option<f32>,
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    timeserver: &'a str,
    timezone: f32,
}

/// Load the configuration stored at `path`.
///
/// Never fails: an unreadable or unparsable file yields the defaults, and each missing or
/// out-of-range field yields its own default.
pub fn load<F: FileSystem>(storage: &mut Mounted<'_, F>, path: &str) -> Configuration {
    let mut buffer = [0u8; MAX_CONFIG_FILE_SIZE];
    let len = match storage.read_file(path, &mut buffer) {
        Ok(len) => len,
        Err(err) => {
            warn!("Failed to read file ({}), using default configuration", err);
            return Configuration::default();
        }
    };

    let fields = match serde_json_core::from_slice::<StoredFields<'_>>(buffer.get(..len).unwrap_or_default()) {
        Ok((fields, _)) => fields,
        Err(_) => {
            warn!("Failed to parse file, using default configuration");
            StoredFields::default()
        }
    };

    let configuration = from_fields(&fields);
    info!(
        "Configuration loaded: timeserver={} timezone={}",
        configuration.time_server.as_str(),
        configuration.utc_offset_hours
    );
    configuration
}

fn from_fields(fields: &StoredFields<'_>) -> Configuration {
    let time_server = match fields.timeserver {
        Some(server) if is_valid_time_server(server) => truncated_time_server(server),
        Some(_) => {
            warn!("Invalid timeserver, using default");
            default_time_server()
        }
        None => default_time_server(),
    };

    let utc_offset_hours = match fields.timezone {
        Some(hours) if is_valid_utc_offset(hours) => hours,
        Some(hours) => {
            warn!("Timezone {} out of range, using default", hours);
            DEFAULT_UTC_OFFSET_HOURS
        }
        None => DEFAULT_UTC_OFFSET_HOURS,
    };

    Configuration {
        time_server,
        utc_offset_hours,
    }
}

/// Replace the file at `path` with `configuration`.
///
/// # Errors
///
/// Returns [`Error::ConfigurationWriteFailed`] if nothing was written, or the storage error
/// if the file could not be opened for writing. There is no retry.
pub fn save<F: FileSystem>(
    storage: &mut Mounted<'_, F>,
    path: &str,
    configuration: &Configuration,
) -> Result<()> {
    let record = StoredRecord {
        timeserver: configuration.time_server.as_str(),
        timezone: configuration.utc_offset_hours,
    };
    let mut buffer = [0u8; MAX_CONFIG_FILE_SIZE];
    let len = serde_json_core::to_slice(&record, &mut buffer).map_err(|_| Error::FormatError)?;
    let contents = buffer.get(..len).ok_or(Error::FormatError)?;

    let written = storage.write_file(path, contents).map_err(|err| {
        error!("Failed to write to file: {}", err);
        err
    })?;
    if written == 0 {
        error!("Failed to write to file: no bytes written");
        return Err(Error::ConfigurationWriteFailed);
    }
    info!("Config saved");
    Ok(())
}
