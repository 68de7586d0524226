//! Power-state transitions that never return.

#![allow(clippy::future_not_send, reason = "single-threaded")]

/// Ways of taking the device down.
#[expect(async_fn_in_trait, reason = "single-threaded executor, no Send bound needed")]
#[expect(
    clippy::module_name_repetitions,
    reason = "reads better than power::Control at call sites"
)]
pub trait PowerControl {
    /// Switch the radio off so nothing but the sleep timer draws current.
    async fn power_down_radio(&mut self);

    /// Enter the lowest-power state for the longest supported period. Waking is a full reset.
    fn deep_sleep_max(&mut self) -> !;

    /// Reset the device now.
    fn reset(&mut self) -> !;
}

/// A radio that can be switched off ahead of deep sleep.
#[expect(async_fn_in_trait, reason = "single-threaded executor, no Send bound needed")]
pub trait Radio {
    /// Leave the network and cut the radio's supply.
    async fn power_off(&mut self);
}

/// Placeholder for the time before a radio is handed over.
pub struct NoRadio;

impl Radio for NoRadio {
    async fn power_off(&mut self) {}
}

#[cfg(all(feature = "arm", any(feature = "pico1", feature = "pico2")))]
mod watchdog_impl {
    use embassy_rp::Peri;
    use embassy_rp::peripherals::WATCHDOG;
    use embassy_rp::watchdog::Watchdog;
    use embassy_time::Duration;

    use super::{NoRadio, PowerControl, Radio};

    /// Longest period the RP watchdog accepts.
    const MAX_SLEEP: Duration = Duration::from_millis(8_300);

    /// [`PowerControl`] built on the RP watchdog: deep sleep switches the radio off, then
    /// halts the core until the watchdog fires and resets the chip.
    pub struct WatchdogPower<R = NoRadio> {
        watchdog: Watchdog,
        radio: R,
    }

    impl WatchdogPower {
        #[must_use]
        pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
            Self {
                watchdog: Watchdog::new(watchdog),
                radio: NoRadio,
            }
        }
    }

    impl<R: Radio> WatchdogPower<R> {
        /// Take ownership of `radio` so deep sleep can switch it off.
        #[must_use]
        pub fn with_radio<T: Radio>(self, radio: T) -> WatchdogPower<T> {
            WatchdogPower {
                watchdog: self.watchdog,
                radio,
            }
        }
    }

    impl<R: Radio> PowerControl for WatchdogPower<R> {
        async fn power_down_radio(&mut self) {
            self.radio.power_off().await;
        }

        fn deep_sleep_max(&mut self) -> ! {
            info!("Sleeping {} ms until watchdog reset", MAX_SLEEP.as_millis());
            self.watchdog.start(MAX_SLEEP);
            // The executor is never polled again, so driver tasks stay parked until reset.
            loop {
                cortex_m::asm::wfi();
            }
        }

        fn reset(&mut self) -> ! {
            info!("Resetting device");
            cortex_m::peripheral::SCB::sys_reset()
        }
    }
}

#[cfg(all(feature = "arm", any(feature = "pico1", feature = "pico2")))]
pub use watchdog_impl::WatchdogPower;
