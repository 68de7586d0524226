//! Time beacon firmware for the Raspberry Pi Pico W / Pico 2 W.
//!
//! On each power-up or watchdog reset: load `/config.json`, join WiFi, write three timestamp
//! lines on UART0 TX (GPIO 0, 9600 baud), then deep sleep until the watchdog resets the chip.
#![no_std]
#![no_main]
#![allow(clippy::future_not_send, reason = "Single-threaded")]

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUartTx};
use embassy_time::Delay;
use panic_probe as _;
use static_cell::StaticCell;
use time_beacon::block_fs::BlockFileSystem;
use time_beacon::boot;
use time_beacon::duty_cycle::{DutyCycle, SleepMode};
use time_beacon::flash_blocks::FlashBlocks;
use time_beacon::power::WatchdogPower;
use time_beacon::time_source::{FetchFallback, TimeSource, UdpNtpClient};
use time_beacon::wifi_station::{WifiPins, WifiStation};
use time_beacon::SERIAL_BAUD_RATE;

static TX_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Every startup error ends in `boot::recover`, so this never returns.
#[embassy_executor::main]
pub async fn main(spawner: Spawner) -> ! {
    let peripherals = embassy_rp::init(Default::default());
    defmt::info!("Booting");

    let mut power = WatchdogPower::new(peripherals.WATCHDOG);

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = SERIAL_BAUD_RATE;
    let serial = BufferedUartTx::new(
        peripherals.UART0,
        Irqs,
        peripherals.PIN_0,
        TX_BUFFER.init([0; 64]),
        uart_config,
    );

    let mut file_system = BlockFileSystem::new(FlashBlocks::new(peripherals.FLASH));
    let wifi_pins = WifiPins {
        pin_23: peripherals.PIN_23,
        pin_25: peripherals.PIN_25,
        pio0: peripherals.PIO0,
        pin_24: peripherals.PIN_24,
        pin_29: peripherals.PIN_29,
        dma_ch0: peripherals.DMA_CH0,
    };
    let mut station = match WifiStation::new(wifi_pins, spawner).await {
        Ok(station) => station,
        Err(err) => boot::recover(&err, &mut power, &mut Delay).await,
    };

    let configuration = match boot::provision(&mut file_system, &mut station).await {
        Ok(configuration) => configuration,
        Err(err) => boot::recover(&err, &mut power, &mut Delay).await,
    };

    let time_source = TimeSource::new(
        UdpNtpClient::new(station.stack()),
        &configuration,
        FetchFallback::LastKnownGood,
    );
    let mut sleep_power = power.with_radio(station);
    DutyCycle::new(time_source, serial, Delay, SleepMode::from_build())
        .run(&mut sleep_power)
        .await
}
