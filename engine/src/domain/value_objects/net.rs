//! Net value object
//! Network binding shared by every role

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NetRepr", into = "NetRepr")]
pub struct Net {
    bind_ip: Option<String>,
    port: u16,
    ipv6: bool,
    /// Resolved once at construction
    server_address: Option<IpAddr>,
}

/// Serialized form; the server address is derived again on load
#[derive(Serialize, Deserialize)]
struct NetRepr {
    bind_ip: Option<String>,
    port: u16,
    #[serde(default)]
    ipv6: bool,
}

impl TryFrom<NetRepr> for Net {
    type Error = DomainError;

    fn try_from(raw: NetRepr) -> Result<Self, Self::Error> {
        Net::new(raw.bind_ip, raw.port, raw.ipv6)
    }
}

impl From<Net> for NetRepr {
    fn from(net: Net) -> Self {
        NetRepr {
            bind_ip: net.bind_ip,
            port: net.port,
            ipv6: net.ipv6,
        }
    }
}

impl Net {
    /// Validates the binding and resolves the server address
    ///
    /// A host name in `bind_ip` is looked up here, once; an unresolvable
    /// name leaves the server address unknown.
    pub fn new(bind_ip: Option<String>, port: u16, ipv6: bool) -> Result<Self, DomainError> {
        if port == 0 {
            return Err(DomainError::InvalidConfiguration(
                "port must be greater than zero".to_string(),
            ));
        }
        if let Some(ip) = &bind_ip {
            if ip.trim().is_empty() {
                return Err(DomainError::InvalidConfiguration(
                    "bind address must not be empty".to_string(),
                ));
            }
        }
        let server_address = resolve(bind_ip.as_deref(), port, ipv6);
        Ok(Self {
            bind_ip,
            port,
            ipv6,
            server_address,
        })
    }

    /// All interfaces (no bind address), IPv4
    pub fn on_port(port: u16) -> Result<Self, DomainError> {
        Self::new(None, port, false)
    }

    /// Pick a free port on the loopback interface
    pub fn free_port() -> Result<Self, DomainError> {
        let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        Self::on_port(port)
    }

    pub fn bind_ip(&self) -> Option<&str> {
        self.bind_ip.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ipv6(&self) -> bool {
        self.ipv6
    }

    /// Address a client on this host would use to reach the server
    pub fn server_address(&self) -> Option<IpAddr> {
        self.server_address
    }

    /// Whether the server address is a loopback address
    pub fn is_loopback(&self) -> bool {
        self.server_address().is_some_and(|a| a.is_loopback())
    }
}

/// Without a bind address the server listens on all interfaces, so the
/// loopback address is used. A list of addresses resolves its first entry.
fn resolve(bind_ip: Option<&str>, port: u16, ipv6: bool) -> Option<IpAddr> {
    let Some(ip) = bind_ip else {
        return Some(if ipv6 {
            IpAddr::V6(Ipv6Addr::LOCALHOST)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        });
    };
    let first = ip.split(',').next().unwrap_or(ip).trim();
    if let Ok(addr) = first.parse::<IpAddr>() {
        return Some(addr);
    }
    (first, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|a| a.ip())
}
