use embassy_time::Duration;

pub const ONE_SECOND: Duration = Duration::from_secs(1);

/// Where the configuration record lives on the device file store.
pub const CONFIG_PATH: &str = "/config.json";
/// Largest configuration file that is read back.
pub const MAX_CONFIG_FILE_SIZE: usize = 512;

pub const DEFAULT_TIME_SERVER: &str = "pool.ntp.org";
pub const DEFAULT_UTC_OFFSET_HOURS: f32 = 1.0;
pub const MIN_UTC_OFFSET_HOURS: f32 = -12.0;
pub const MAX_UTC_OFFSET_HOURS: f32 = 14.0;
/// Maximum time server length in bytes (not counting a terminator).
pub const TIME_SERVER_CAPACITY: usize = 255;

pub const PROVISIONING_TIMEOUT: Duration = Duration::from_secs(180);
pub const PROVISIONING_RESET_DELAY: Duration = Duration::from_secs(3);

pub const BURST_REPORT_COUNT: usize = 3;
pub const REPORT_SPACING: Duration = ONE_SECOND;
pub const BENCH_REST: Duration = Duration::from_secs(10);

pub const NTP_PORT: u16 = 123;
pub const NTP_TIMEOUT: Duration = Duration::from_secs(5);

pub const SERIAL_BAUD_RATE: u32 = 9600;
