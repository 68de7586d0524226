//! Network time for the configured server and UTC offset.
//!
//! [`TimeSource`] asks an [`NtpClient`] for the time on every [`TimeSource::fetch_now`] and
//! shifts the reply by the configured offset. When an exchange fails, a named
//! [`FetchFallback`] policy decides what is reported instead; failures never reach the caller
//! as errors.

#![allow(clippy::future_not_send, reason = "single-threaded")]

use crate::Result;
use crate::configuration::{Configuration, TimeServer};
use crate::unix_seconds::UnixSeconds;

/// One request/response exchange with a time server.
#[expect(async_fn_in_trait, reason = "single-threaded executor, no Send bound needed")]
pub trait NtpClient {
    /// Ask `server` (host name or literal IPv4 address) for the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimeFetch`](crate::Error::TimeFetch) on resolution, transport or
    /// timeout failure.
    async fn request_unix_seconds(&mut self, server: &str) -> Result<UnixSeconds>;
}

/// What [`TimeSource::fetch_now`] reports when an exchange fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchFallback {
    /// Report the last successful reading, if any.
    LastKnownGood,
    /// Always report [`TimeReading::Unavailable`].
    Unavailable,
}

/// The result of one [`TimeSource::fetch_now`], offset already applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeReading {
    Fresh(UnixSeconds),
    Stale(UnixSeconds),
    Unavailable { utc_offset_seconds: i32 },
}

impl TimeReading {
    /// The value to report. [`TimeReading::Unavailable`] reports the epoch shifted by the
    /// configured offset.
    #[must_use]
    pub fn unix_seconds(self) -> UnixSeconds {
        match self {
            Self::Fresh(unix_seconds) | Self::Stale(unix_seconds) => unix_seconds,
            Self::Unavailable { utc_offset_seconds } => UnixSeconds(0).offset_by(utc_offset_seconds),
        }
    }
}

/// A time server client bound to one server and UTC offset.
pub struct TimeSource<C: NtpClient> {
    client: C,
    server: TimeServer,
    utc_offset_seconds: i32,
    fallback: FetchFallback,
    last_good: Option<UnixSeconds>,
}

impl<C: NtpClient> TimeSource<C> {
    /// Bind `client` to the server and offset in `configuration`. No network I/O happens here.
    #[must_use]
    pub fn new(client: C, configuration: &Configuration, fallback: FetchFallback) -> Self {
        let utc_offset_seconds = configuration.utc_offset_seconds();
        info!(
            "TimeSource: server={} offset={}s",
            configuration.time_server.as_str(),
            utc_offset_seconds
        );
        Self {
            client,
            server: configuration.time_server.clone(),
            utc_offset_seconds,
            fallback,
            last_good: None,
        }
    }

    #[must_use]
    pub const fn utc_offset_seconds(&self) -> i32 {
        self.utc_offset_seconds
    }

    #[must_use]
    pub fn server(&self) -> &str {
        self.server.as_str()
    }

    /// Run one exchange and return the offset-adjusted time, or the fallback reading.
    pub async fn fetch_now(&mut self) -> TimeReading {
        match self.client.request_unix_seconds(self.server.as_str()).await {
            Ok(utc) => {
                let local = utc.offset_by(self.utc_offset_seconds);
                self.last_good = Some(local);
                TimeReading::Fresh(local)
            }
            Err(err) => {
                warn!("TimeSource: fetch failed: {}", err);
                match (self.fallback, self.last_good) {
                    (FetchFallback::LastKnownGood, Some(last_good)) => TimeReading::Stale(last_good),
                    _ => TimeReading::Unavailable {
                        utc_offset_seconds: self.utc_offset_seconds,
                    },
                }
            }
        }
    }
}

// ============================================================================
// UDP client over an embassy-net stack
// ============================================================================

#[cfg(feature = "wifi")]
mod udp_impl {
    use core::net::Ipv4Addr;
    use core::str::FromStr;

    use embassy_net::{IpAddress, Stack, dns, udp};

    use super::NtpClient;
    use crate::ntp::{PACKET_SIZE, client_request, parse_reply};
    use crate::shared_constants::{NTP_PORT, NTP_TIMEOUT};
    use crate::unix_seconds::UnixSeconds;
    use crate::{Error, Result};

    /// [`NtpClient`] that talks to the server over UDP port 123.
    pub struct UdpNtpClient {
        stack: Stack<'static>,
    }

    impl UdpNtpClient {
        #[must_use]
        pub const fn new(stack: Stack<'static>) -> Self {
            Self { stack }
        }

        async fn resolve(&self, server: &str) -> Result<IpAddress> {
            if let Ok(address) = Ipv4Addr::from_str(server) {
                return Ok(IpAddress::Ipv4(address));
            }

            info!("Resolving NTP host {}...", server);
            let addresses = self
                .stack
                .dns_query(server, dns::DnsQueryType::A)
                .await
                .map_err(|err| {
                    warn!("DNS lookup failed: {:?}", err);
                    Error::TimeFetch("DNS lookup failed")
                })?;
            addresses
                .first()
                .copied()
                .ok_or(Error::TimeFetch("No DNS results"))
        }
    }

    impl NtpClient for UdpNtpClient {
        async fn request_unix_seconds(&mut self, server: &str) -> Result<UnixSeconds> {
            let server_addr = self.resolve(server).await?;

            let mut rx_meta = [udp::PacketMetadata::EMPTY; 1];
            let mut rx_buffer = [0; 128];
            let mut tx_meta = [udp::PacketMetadata::EMPTY; 1];
            let mut tx_buffer = [0; 128];
            let mut socket = udp::UdpSocket::new(
                self.stack,
                &mut rx_meta,
                &mut rx_buffer,
                &mut tx_meta,
                &mut tx_buffer,
            );
            socket.bind(0).map_err(|err| {
                warn!("Socket bind failed: {:?}", err);
                Error::TimeFetch("Socket bind failed")
            })?;

            debug!("Sending NTP request to {}", server_addr);
            socket
                .send_to(&client_request(), (server_addr, NTP_PORT))
                .await
                .map_err(|err| {
                    warn!("NTP send failed: {:?}", err);
                    Error::TimeFetch("NTP send failed")
                })?;

            let mut reply = [0u8; PACKET_SIZE];
            let (len, _from) = embassy_time::with_timeout(NTP_TIMEOUT, socket.recv_from(&mut reply))
                .await
                .map_err(|_| {
                    warn!("NTP receive timeout");
                    Error::TimeFetch("NTP receive timeout")
                })?
                .map_err(|err| {
                    warn!("NTP receive failed: {:?}", err);
                    Error::TimeFetch("NTP receive failed")
                })?;

            let utc = parse_reply(reply.get(..len).unwrap_or_default())?;
            info!("NTP time: {} (unix timestamp)", utc.as_i64());
            Ok(utc)
        }
    }
}

#[cfg(feature = "wifi")]
pub use udp_impl::UdpNtpClient;
