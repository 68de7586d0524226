use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that `embassy_executor::SpawnError` does
    // not implement Rust's `core::error::Error` trait.
    #[cfg(feature = "arm")]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    #[cfg(any(feature = "pico1", feature = "pico2"))]
    #[display("Flash operation failed: {_0:?}")]
    Flash(#[error(not(source))] embassy_rp::flash::Error),

    #[display("Format error")]
    FormatError,

    #[display("Storage could not be mounted")]
    StorageMount,

    #[display("Storage is not mounted")]
    StorageNotMounted,

    #[display("Storage is corrupted")]
    StorageCorrupted,

    #[display("Storage has no free file slot")]
    StorageFull,

    #[display("File not found")]
    FileNotFound,

    #[display("File too large")]
    FileTooLarge,

    #[display("Configuration write produced no output")]
    ConfigurationWriteFailed,

    #[display("Network connection not established before timeout")]
    ProvisioningTimeout,

    #[display("Provisioning submission rejected")]
    InvalidSubmission,

    #[display("Time fetch failed: {_0}")]
    TimeFetch(#[error(not(source))] &'static str),

    #[display("Timestamp outside the calendar range")]
    TimestampOutOfRange,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::FormatError
    }
}

#[cfg(feature = "arm")]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}
