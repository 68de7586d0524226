//! Host fakes shared by the integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorKind, ErrorType, Write};
use time_beacon::power::PowerControl;
use time_beacon::provisioning::{Provisioned, ProvisioningGateway, apply_submission};
use time_beacon::storage::FileSystem;
use time_beacon::time_source::NtpClient;
use time_beacon::{Configuration, Error, Result, UnixSeconds};

/// Logical time in microseconds, shared between fakes.
pub type Clock = Rc<Cell<u64>>;

pub fn clock() -> Clock {
    Rc::new(Cell::new(0))
}

/// Delay that advances the shared clock instead of waiting.
pub struct LogicalDelay {
    pub clock: Clock,
}

impl DelayNs for LogicalDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns.div_euclid(1_000)));
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance_us(u64::from(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance_us(u64::from(ms).saturating_mul(1_000));
    }
}

impl LogicalDelay {
    fn advance_us(&self, us: u64) {
        self.clock.set(self.clock.get().saturating_add(us));
    }
}

/// Power controller that panics instead of sleeping or resetting, so tests can observe
/// the terminal transition with `#[should_panic]`.
pub struct PanickingPower {
    pub clock: Clock,
    pub radio_off: bool,
}

impl PanickingPower {
    pub const fn new(clock: Clock) -> Self {
        Self {
            clock,
            radio_off: false,
        }
    }
}

impl PowerControl for PanickingPower {
    async fn power_down_radio(&mut self) {
        self.radio_off = true;
    }

    fn deep_sleep_max(&mut self) -> ! {
        let radio = if self.radio_off { "off" } else { "on" };
        panic!("deep sleep with radio {radio}");
    }

    fn reset(&mut self) -> ! {
        panic!("reset at {} us", self.clock.get());
    }
}

/// NTP client replaying a script: `Some(utc)` answers, `None` times out.
pub struct ScriptedNtp {
    replies: VecDeque<Option<i64>>,
    pub servers: Rc<RefCell<Vec<String>>>,
}

impl ScriptedNtp {
    pub fn new(replies: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            servers: Rc::default(),
        }
    }
}

impl NtpClient for ScriptedNtp {
    async fn request_unix_seconds(&mut self, server: &str) -> Result<UnixSeconds> {
        self.servers.borrow_mut().push(server.to_owned());
        self.replies
            .pop_front()
            .flatten()
            .map(UnixSeconds)
            .ok_or(Error::TimeFetch("NTP receive timeout"))
    }
}

/// Serial sink recording each completed line with the logical time it finished.
pub struct RecordingSerial {
    clock: Clock,
    pending: String,
    pub lines: Vec<(u64, String)>,
    pub fail: bool,
}

impl RecordingSerial {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            pending: String::new(),
            lines: Vec::new(),
            fail: false,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, line)| line.as_str()).collect()
    }
}

impl ErrorType for RecordingSerial {
    type Error = ErrorKind;
}

impl Write for RecordingSerial {
    async fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        if self.fail {
            return Err(ErrorKind::BrokenPipe);
        }
        for &byte in buf {
            self.pending.push(char::from(byte));
            if byte == b'\n' {
                let line = std::mem::take(&mut self.pending);
                self.lines.push((self.clock.get(), line));
            }
        }
        Ok(buf.len())
    }
}

/// In-memory file system with switchable failures and mount bookkeeping.
#[derive(Default)]
pub struct MemoryFs {
    pub files: HashMap<String, Vec<u8>>,
    pub mounted: bool,
    pub mounts: u32,
    pub unmounts: u32,
    pub fail_mount: bool,
    /// Writes report success but store nothing.
    pub zero_writes: bool,
}

impl MemoryFs {
    pub fn with_file(path: &str, contents: &str) -> Self {
        let mut fs = Self::default();
        fs.files.insert(path.to_owned(), contents.as_bytes().to_vec());
        fs
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl FileSystem for MemoryFs {
    fn mount(&mut self) -> Result<()> {
        if self.fail_mount {
            return Err(Error::StorageMount);
        }
        self.mounted = true;
        self.mounts = self.mounts.saturating_add(1);
        Ok(())
    }

    fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(Error::StorageNotMounted);
        }
        self.mounted = false;
        self.unmounts = self.unmounts.saturating_add(1);
        Ok(())
    }

    fn read_file(&mut self, path: &str, buffer: &mut [u8]) -> Result<usize> {
        assert!(self.mounted, "read while unmounted");
        let contents = self.files.get(path).ok_or(Error::FileNotFound)?;
        let target = buffer
            .get_mut(..contents.len())
            .ok_or(Error::FileTooLarge)?;
        target.copy_from_slice(contents);
        Ok(contents.len())
    }

    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<usize> {
        assert!(self.mounted, "write while unmounted");
        if self.zero_writes {
            return Ok(0);
        }
        self.files.insert(path.to_owned(), contents.to_vec());
        Ok(contents.len())
    }
}

/// What the fake provisioning UI does.
pub enum GatewayOutcome {
    /// Connect without showing the form.
    Unchanged,
    /// The user submits these field texts.
    Submit(&'static str, &'static str),
    /// Nothing connects before the timeout.
    Timeout,
}

pub struct FakeGateway {
    pub outcome: GatewayOutcome,
    pub prefill: Option<Configuration>,
    pub timeout: Option<Duration>,
}

impl FakeGateway {
    pub const fn new(outcome: GatewayOutcome) -> Self {
        Self {
            outcome,
            prefill: None,
            timeout: None,
        }
    }
}

impl ProvisioningGateway for FakeGateway {
    async fn connect(&mut self, prefill: &Configuration, timeout: Duration) -> Result<Provisioned> {
        self.prefill = Some(prefill.clone());
        self.timeout = Some(timeout);
        let mut configuration = prefill.clone();
        let changed = match self.outcome {
            GatewayOutcome::Unchanged => false,
            GatewayOutcome::Submit(server, zone) => {
                apply_submission(&mut configuration, server, zone)?
            }
            GatewayOutcome::Timeout => return Err(Error::ProvisioningTimeout),
        };
        Ok(Provisioned {
            configuration,
            changed,
        })
    }
}
