//! WiFi station mode on the Pico W's CYW43 radio.
//!
//! [`WifiStation`] joins the network named at build time (`WIFI_SSID`/`WIFI_PASS`) and
//! implements [`ProvisioningGateway`]. Build-time `TIME_SERVER` and `UTC_OFFSET_HOURS`, when
//! set, are applied on connect as a user edit so they get saved.
//!
//! The station is also the [`Radio`] switched off before deep sleep: it leaves the network
//! and drives WL_ON (GPIO 23) low.

#![allow(clippy::future_not_send, reason = "single-threaded")]

use core::cell::RefCell;
use core::convert::Infallible;

use cyw43::JoinOptions;
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_rp::{Peri, bind_interrupts};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer, with_timeout};
use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use static_cell::StaticCell;

use crate::configuration::Configuration;
use crate::power::Radio;
use crate::provisioning::{Provisioned, ProvisioningGateway, apply_overrides};
use crate::{Error, Result};

const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASS: &str = env!("WIFI_PASS");
const TIME_SERVER_OVERRIDE: Option<&str> = option_env!("TIME_SERVER");
const UTC_OFFSET_HOURS_OVERRIDE: Option<&str> = option_env!("UTC_OFFSET_HOURS");

/// The peripherals wired to the CYW43 on the Pico W boards.
pub struct WifiPins {
    pub pin_23: Peri<'static, PIN_23>,
    pub pin_25: Peri<'static, PIN_25>,
    pub pio0: Peri<'static, PIO0>,
    pub pin_24: Peri<'static, PIN_24>,
    pub pin_29: Peri<'static, PIN_29>,
    pub dma_ch0: Peri<'static, DMA_CH0>,
}

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

type WlOnCell = Mutex<CriticalSectionRawMutex, RefCell<Output<'static>>>;

/// WL_ON, shared by the CYW43 driver (which pulses it at start-up) and [`WifiStation`].
#[derive(Clone, Copy)]
struct WlOn(&'static WlOnCell);

impl WlOn {
    fn set_level(self, level: Level) {
        self.0.lock(|pin| pin.borrow_mut().set_level(level));
    }
}

impl ErrorType for WlOn {
    type Error = Infallible;
}

impl OutputPin for WlOn {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set_level(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set_level(Level::High);
        Ok(())
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Infallible> {
        self.set_level(Level::from(bool::from(state)));
        Ok(())
    }
}

static WL_ON: StaticCell<WlOnCell> = StaticCell::new();
static STATE: StaticCell<cyw43::State> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

/// A powered-up radio and DHCP network stack, not yet joined.
pub struct WifiStation {
    control: cyw43::Control<'static>,
    stack: Stack<'static>,
    wl_on: WlOn,
}

impl WifiStation {
    /// Power up the radio, start its driver tasks and create the network stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskSpawn`] if a driver task cannot be spawned.
    pub async fn new(pins: WifiPins, spawner: Spawner) -> Result<Self> {
        info!("WiFi device initializing in client mode");

        let fw = cyw43_firmware::CYW43_43439A0;
        let clm = cyw43_firmware::CYW43_43439A0_CLM;

        let wl_on = WlOn(WL_ON.init(Mutex::new(RefCell::new(Output::new(
            pins.pin_23,
            Level::Low,
        )))));
        let cs = Output::new(pins.pin_25, Level::High);
        let mut pio = Pio::new(pins.pio0, Irqs);
        let spi = PioSpi::new(
            &mut pio.common,
            pio.sm0,
            DEFAULT_CLOCK_DIVIDER,
            pio.irq0,
            cs,
            pins.pin_24,
            pins.pin_29,
            pins.dma_ch0,
        );

        let state = STATE.init(cyw43::State::new());
        let (net_device, mut control, runner) = cyw43::new(state, wl_on, spi, fw).await;
        spawner.spawn(wifi_task(runner)?);

        control.init(clm).await;
        control
            .set_power_management(cyw43::PowerManagementMode::PowerSave)
            .await;

        let config = Config::dhcpv4(Default::default());
        let seed = 0x7c8f_3a2e_9d14_6b5a;

        let (stack, runner) = embassy_net::new(
            net_device,
            config,
            RESOURCES.init(StackResources::<5>::new()),
            seed,
        );
        spawner.spawn(net_task(runner)?);

        Ok(Self {
            control,
            stack,
            wl_on,
        })
    }

    /// The network stack, for use once connected.
    #[must_use]
    pub const fn stack(&self) -> Stack<'static> {
        self.stack
    }

    async fn join(&mut self) {
        info!("Connecting to WiFi: {}", WIFI_SSID);
        loop {
            let options = if WIFI_PASS.is_empty() {
                JoinOptions::new_open()
            } else {
                JoinOptions::new(WIFI_PASS.as_bytes())
            };
            match self.control.join(WIFI_SSID, options).await {
                Ok(()) => break,
                Err(err) => {
                    info!("Join failed: {}", err.status);
                    Timer::after_secs(1).await;
                }
            }
        }

        info!("WiFi connected! Waiting for DHCP...");
        self.stack.wait_config_up().await;
        if let Some(config) = self.stack.config_v4() {
            info!("IP Address: {}", config.address);
        }
    }
}

impl ProvisioningGateway for WifiStation {
    async fn connect(&mut self, prefill: &Configuration, timeout: Duration) -> Result<Provisioned> {
        with_timeout(timeout, self.join())
            .await
            .map_err(|_| Error::ProvisioningTimeout)?;

        let mut configuration = prefill.clone();
        let changed = apply_overrides(
            &mut configuration,
            TIME_SERVER_OVERRIDE,
            UTC_OFFSET_HOURS_OVERRIDE,
        );
        Ok(Provisioned {
            configuration,
            changed,
        })
    }
}

impl Radio for WifiStation {
    async fn power_off(&mut self) {
        info!("Leaving WiFi and powering the radio down");
        self.control.leave().await;
        self.wl_on.set_level(Level::Low);
    }
}

#[embassy_executor::task]
async fn wifi_task(runner: cyw43::Runner<'static, WlOn, PioSpi<'static, PIO0, 0, DMA_CH0>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}
