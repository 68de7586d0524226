//! Startup: load the stored configuration, provision the network, persist any edits.

#![allow(clippy::future_not_send, reason = "single-threaded")]

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::config_store;
use crate::configuration::Configuration;
use crate::power::PowerControl;
use crate::provisioning::ProvisioningGateway;
use crate::shared_constants::{CONFIG_PATH, PROVISIONING_RESET_DELAY, PROVISIONING_TIMEOUT};
use crate::storage::{FileSystem, Mounted};
use crate::{Error, Result};

/// Mount storage, load the configuration, connect, and save the result if the user edited it.
///
/// Storage stays mounted until provisioning finishes and is released on every path. A failed
/// save is logged and the in-memory configuration is still returned.
///
/// # Errors
///
/// Returns the mount error, or [`Error::ProvisioningTimeout`] if the gateway gives up.
pub async fn provision<F, G>(file_system: &mut F, gateway: &mut G) -> Result<Configuration>
where
    F: FileSystem,
    G: ProvisioningGateway,
{
    let mut storage = Mounted::new(file_system).inspect_err(|err| {
        error!("Failed to mount file system: {}", err);
    })?;
    let stored = config_store::load(&mut storage, CONFIG_PATH);

    let provisioned = gateway
        .connect(&stored, PROVISIONING_TIMEOUT)
        .await
        .inspect_err(|_| error!("Failed to connect and hit timeout"))?;
    info!("Connected");

    if provisioned.changed {
        info!("Saving edited configuration");
        if let Err(err) = config_store::save(&mut storage, CONFIG_PATH, &provisioned.configuration) {
            error!("Configuration not saved: {}", err);
        }
    }

    if let Err(err) = storage.unmount() {
        warn!("Unmount failed: {}", err);
    }
    Ok(provisioned.configuration)
}

/// What to do after a fatal startup error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureAction {
    /// Wait, then reset and start over.
    RestartAfter(Duration),
    /// Stop until power-cycled.
    Halt,
}

/// The recovery policy for a startup error.
#[must_use]
pub const fn failure_action(err: &Error) -> FailureAction {
    match err {
        Error::StorageMount => FailureAction::Halt,
        _ => FailureAction::RestartAfter(PROVISIONING_RESET_DELAY),
    }
}

/// Carry out [`failure_action`] for `err`.
pub async fn recover<P: PowerControl, D: DelayNs>(err: &Error, power: &mut P, delay: &mut D) -> ! {
    match failure_action(err) {
        FailureAction::RestartAfter(wait) => {
            error!("Startup failed ({}), restarting in {} ms", err, wait.as_millis());
            delay
                .delay_ms(u32::try_from(wait.as_millis()).unwrap_or(u32::MAX))
                .await;
            power.reset()
        }
        FailureAction::Halt => {
            error!("Startup failed ({}), halting", err);
            loop {
                delay.delay_ms(u32::MAX).await;
            }
        }
    }
}
