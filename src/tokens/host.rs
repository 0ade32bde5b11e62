//! Identity of the machine serving requests.

use std::net::{IpAddr, UdpSocket};
use tracing::debug;

/// Server identity rendered by the `computer-name` and `server-ip` tokens.
///
/// Detected once when the token registry is built; both values are constant
/// for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    computer_name: String,
    server_ip: Option<IpAddr>,
}

impl HostInfo {
    pub fn new(computer_name: impl Into<String>, server_ip: Option<IpAddr>) -> Self {
        Self {
            computer_name: computer_name.into(),
            server_ip,
        }
    }

    /// Reads the host name and the primary outbound IPv4 address.
    ///
    /// The address is the source address of the default route, which on a
    /// multi-homed host is not necessarily the first non-loopback interface.
    /// Use [`Self::with_server_ip`] to pin a specific one.
    ///
    /// Detection failures are logged at debug level and leave the value
    /// unset; they never fail startup.
    pub fn detect() -> Self {
        let computer_name = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                debug!("Failed to read host name: {}", e);
                String::new()
            }
        };

        let server_ip = match outbound_ipv4() {
            Ok(ip) => ip,
            Err(e) => {
                debug!("Failed to detect server IP: {}", e);
                None
            }
        };

        Self {
            computer_name,
            server_ip,
        }
    }

    /// Replaces the detected server address.
    pub fn with_server_ip(mut self, ip: IpAddr) -> Self {
        self.server_ip = Some(ip);
        self
    }

    /// Host name, `None` if it could not be read.
    pub fn computer_name(&self) -> Option<&str> {
        Some(self.computer_name.as_str()).filter(|n| !n.is_empty())
    }

    pub fn server_ip(&self) -> Option<IpAddr> {
        self.server_ip
    }
}

/// Local address the OS would use to reach a public IPv4 host.
///
/// Connecting a UDP socket only selects a route; no packet is sent. Hosts
/// without a default route report no address.
fn outbound_ipv4() -> std::io::Result<Option<IpAddr>> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("192.0.2.1:9")?;
    let ip = socket.local_addr()?.ip();

    Ok(Some(ip).filter(|ip| ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified()))
}
