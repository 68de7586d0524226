//! Network Time Protocol (NTP) client packets.

use crate::unix_seconds::UnixSeconds;
use crate::{Error, Result};

/// Size of an NTP packet without extensions.
pub const PACKET_SIZE: usize = 48;

const TRANSMIT_TIMESTAMP: core::ops::Range<usize> = 40..44;
const MODE_MASK: u8 = 0b0000_0111;
const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;

/// Build a client request (48 bytes, version 3, client mode).
#[must_use]
pub const fn client_request() -> [u8; PACKET_SIZE] {
    let mut request = [0u8; PACKET_SIZE];
    request[0] = 0x1B; // LI=0, VN=3, Mode=3 (client)
    request
}

/// Extract the server's transmit timestamp from a reply as Unix seconds (UTC).
///
/// # Errors
///
/// Returns [`Error::TimeFetch`] if the reply is short, not from a server, a kiss-of-death
/// (stratum 0), or carries no timestamp.
pub fn parse_reply(reply: &[u8]) -> Result<UnixSeconds> {
    if reply.len() < PACKET_SIZE {
        warn!("NTP reply too short: {} bytes", reply.len());
        return Err(Error::TimeFetch("NTP reply too short"));
    }

    let mode = reply.first().copied().unwrap_or_default() & MODE_MASK;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(Error::TimeFetch("NTP reply not from a server"));
    }
    if reply.get(1).copied().unwrap_or_default() == 0 {
        return Err(Error::TimeFetch("NTP kiss-of-death reply"));
    }

    let ntp_seconds = reply
        .get(TRANSMIT_TIMESTAMP)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or(Error::TimeFetch("NTP reply too short"))?;
    if ntp_seconds == 0 {
        return Err(Error::TimeFetch("NTP reply has no transmit timestamp"));
    }

    Ok(UnixSeconds::from_ntp_seconds(ntp_seconds))
}
