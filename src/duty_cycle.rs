//! Burst-then-sleep reporting.
//!
//! Each wake runs one BURST of [`BURST_REPORT_COUNT`] reports spaced by [`REPORT_SPACING`],
//! then sleeps. In deep sleep the device wakes by resetting, so the controller never sees a
//! second burst; the bench mode rests and loops instead.

#![allow(clippy::future_not_send, reason = "single-threaded")]

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::Write;

use crate::power::PowerControl;
use crate::shared_constants::{BENCH_REST, BURST_REPORT_COUNT, REPORT_SPACING};
use crate::time_source::{NtpClient, TimeSource};
use crate::timestamp::format_report;

/// Where the controller is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DutyState {
    Burst,
    Sleep,
    /// Waiting for the power controller to take the device down.
    Dormant,
}

/// How the SLEEP state is carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepMode {
    /// Stay awake, rest for `rest`, then burst again.
    Bench { rest: Duration },
    /// Hand over to [`PowerControl::deep_sleep_max`].
    DeepSleep,
}

impl SleepMode {
    /// The mode selected by the `bench` cargo feature.
    #[must_use]
    pub const fn from_build() -> Self {
        if cfg!(feature = "bench") {
            Self::Bench { rest: BENCH_REST }
        } else {
            Self::DeepSleep
        }
    }
}

/// Drives the report bursts over a serial link.
pub struct DutyCycle<C: NtpClient, W: Write, D: DelayNs> {
    time_source: TimeSource<C>,
    serial: W,
    delay: D,
    sleep_mode: SleepMode,
    reports_written: u32,
}

impl<C: NtpClient, W: Write, D: DelayNs> DutyCycle<C, W, D> {
    #[must_use]
    pub const fn new(time_source: TimeSource<C>, serial: W, delay: D, sleep_mode: SleepMode) -> Self {
        Self {
            time_source,
            serial,
            delay,
            sleep_mode,
            reports_written: 0,
        }
    }

    /// Carry out `state` and return its successor.
    pub async fn step(&mut self, state: DutyState) -> DutyState {
        match state {
            DutyState::Burst => {
                self.run_burst().await;
                DutyState::Sleep
            }
            DutyState::Sleep => match self.sleep_mode {
                SleepMode::Bench { rest } => {
                    info!("Resting {} ms", rest.as_millis());
                    self.delay.delay_ms(millis(rest)).await;
                    DutyState::Burst
                }
                SleepMode::DeepSleep => DutyState::Dormant,
            },
            DutyState::Dormant => DutyState::Dormant,
        }
    }

    /// Run one full burst. Not cancellable; individual report failures are logged and skipped.
    pub async fn run_burst(&mut self) {
        for index in 0..BURST_REPORT_COUNT {
            debug!("Report {}/{}", index.saturating_add(1), BURST_REPORT_COUNT);
            self.report_once().await;
            self.delay.delay_ms(millis(REPORT_SPACING)).await;
        }
    }

    async fn report_once(&mut self) {
        let reading = self.time_source.fetch_now().await;
        let line = match format_report(reading.unix_seconds()) {
            Ok(line) => line,
            Err(err) => {
                error!("Skipping report: {}", err);
                return;
            }
        };
        match self.serial.write_all(line.as_bytes()).await {
            Ok(()) => {
                self.reports_written = self.reports_written.saturating_add(1);
                info!("Reported {}", line.as_str());
            }
            Err(_) => error!("Serial write failed"),
        }
        if self.serial.flush().await.is_err() {
            warn!("Serial flush failed");
        }
    }

    /// Step from BURST until dormant, switch the radio off, then deep sleep.
    pub async fn run<P: PowerControl>(mut self, power: &mut P) -> ! {
        let mut state = DutyState::Burst;
        while state != DutyState::Dormant {
            state = self.step(state).await;
        }
        power.power_down_radio().await;
        info!("Entering deep sleep");
        power.deep_sleep_max()
    }

    #[must_use]
    pub const fn time_source(&self) -> &TimeSource<C> {
        &self.time_source
    }

    #[must_use]
    pub const fn serial(&self) -> &W {
        &self.serial
    }

    /// Lines successfully written since construction.
    #[must_use]
    pub const fn reports_written(&self) -> u32 {
        self.reports_written
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
