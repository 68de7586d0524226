//! Time beacon: on every wake, report network time over a serial line three times, then
//! deep sleep.
//!
//! The library is hardware-independent apart from the feature-gated `flash_blocks`,
//! `wifi_station` and `power::WatchdogPower`; everything else runs and is tested on the host.
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod block_fs;
pub mod boot;
pub mod config_store;
pub mod configuration;
pub mod duty_cycle;
mod error;
pub mod file_record;
#[cfg(any(feature = "pico1", feature = "pico2"))]
pub mod flash_blocks;
pub mod ntp;
pub mod power;
pub mod provisioning;
mod shared_constants;
pub mod storage;
pub mod time_source;
pub mod timestamp;
pub mod unix_seconds;
#[cfg(all(feature = "wifi", feature = "arm", any(feature = "pico1", feature = "pico2")))]
pub mod wifi_station;

// Re-export commonly used items
pub use configuration::Configuration;
pub use error::{Error, Result};
pub use shared_constants::*;
pub use unix_seconds::UnixSeconds;
