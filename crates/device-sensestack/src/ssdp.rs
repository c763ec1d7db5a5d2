//! SSDP wire handling: M-SEARCH probe construction and response parsing.

use crate::error::Error;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Standard SSDP multicast group and port.
pub const SSDP_ADDR: &str = "239.255.255.250:1900";

/// One parsed M-SEARCH response datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsdpResponse {
    /// URL of the device description document.
    pub location: String,
    /// Search target the device answered for.
    pub st: String,
    /// Unique service name.
    pub usn: String,
    /// `max-age` component of the `cache-control` header. Informational:
    /// discovery does not expire entries.
    pub cache_max_age: u64,
}

impl SsdpResponse {
    /// Parse a raw datagram framed as an HTTP-style response (status line
    /// plus a header block, no body).
    ///
    /// The four required headers (`location`, `st`, `usn`, `cache-control`)
    /// are matched case-insensitively; `cache-control` must carry an
    /// `=`-delimited integer. Anything short of that is malformed and the
    /// datagram is dropped by the caller.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| Error::MalformedResponse("datagram is not UTF-8"))?;

        let mut lines = text.lines();
        let status = lines
            .next()
            .ok_or(Error::MalformedResponse("empty datagram"))?;
        if !status.starts_with("HTTP/") {
            return Err(Error::MalformedResponse("missing HTTP status line"));
        }

        let mut location = None;
        let mut st = None;
        let mut usn = None;
        let mut cache_max_age = None;

        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or(Error::MalformedResponse("header line without a colon"))?;
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "location" => location = Some(value.to_string()),
                "st" => st = Some(value.to_string()),
                "usn" => usn = Some(value.to_string()),
                "cache-control" => {
                    let (_, age) = value
                        .split_once('=')
                        .ok_or(Error::MalformedResponse("cache-control without max-age"))?;
                    let age = age
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| Error::MalformedResponse("cache-control max-age is not numeric"))?;
                    cache_max_age = Some(age);
                }
                _ => {}
            }
        }

        Ok(SsdpResponse {
            location: location.ok_or(Error::MalformedResponse("missing location header"))?,
            st: st.ok_or(Error::MalformedResponse("missing st header"))?,
            usn: usn.ok_or(Error::MalformedResponse("missing usn header"))?,
            cache_max_age: cache_max_age
                .ok_or(Error::MalformedResponse("missing cache-control header"))?,
        })
    }
}

/// Build the wire-exact M-SEARCH request for the given search target.
pub fn build_msearch(service_type: &str, mx: u8) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         ST: {}\r\n\
         MX: {}\r\n\
         \r\n",
        SSDP_ADDR, service_type, mx
    )
}

/// Create the UDP socket for one probe round: address reuse on, multicast
/// TTL 2, receive timeout bounding the response window.
pub fn open_probe_socket(timeout: Duration) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    let addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
    socket.bind(&addr.into())?;

    let socket: UdpSocket = socket.into();
    socket.set_multicast_ttl_v4(2)?;
    socket.set_read_timeout(Some(timeout))?;
    Ok(socket)
}
