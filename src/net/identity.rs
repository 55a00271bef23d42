//! Host and network identity for the default echo payload.
//!
//! # Responsibilities
//! - Report hostname, primary outbound IP and all IPs bound to the hostname
//! - Report OS platform, release and family
//! - Memoize the lookups; they involve syscalls and DNS
//!
//! # Design Decisions
//! - Lookups never fail: each falls back to a loopback-flavoured default
//! - The memo can be dropped with [`SystemIdentity::refresh`] if the host
//!   identity changes under a long-running process

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs, UdpSocket};
use std::sync::{Arc, RwLock};

use serde::Serialize;

/// OS description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsInfo {
    pub platform: String,
    pub release: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Everything the `host` section of the echo reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    pub hostname: String,
    pub ip: String,
    pub ips: Vec<String>,
    pub os: OsInfo,
}

/// Source of host identity.
pub trait NetworkIdentity: Send + Sync + std::fmt::Debug {
    fn snapshot(&self) -> Arc<HostSnapshot>;
}

/// Identity of the machine this process runs on.
#[derive(Debug, Default)]
pub struct SystemIdentity {
    cached: RwLock<Option<Arc<HostSnapshot>>>,
}

impl SystemIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the memoized snapshot; the next call recomputes it.
    pub fn refresh(&self) {
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn compute() -> HostSnapshot {
        let hostname = hostname();
        let ips = all_ips(&hostname);
        HostSnapshot {
            ip: primary_ip(),
            ips,
            os: os_info(),
            hostname,
        }
    }
}

impl NetworkIdentity for SystemIdentity {
    fn snapshot(&self) -> Arc<HostSnapshot> {
        if let Some(snapshot) = self.cached.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return snapshot.clone();
        }
        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
        cached
            .get_or_insert_with(|| {
                let snapshot = Arc::new(Self::compute());
                tracing::debug!(hostname = %snapshot.hostname, ip = %snapshot.ip, "Host identity resolved");
                snapshot
            })
            .clone()
    }
}

/// Fixed identity, for tests and for deployments that want to hide the host.
#[derive(Debug, Clone)]
pub struct StaticIdentity(Arc<HostSnapshot>);

impl StaticIdentity {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self(Arc::new(snapshot))
    }
}

impl NetworkIdentity for StaticIdentity {
    fn snapshot(&self) -> Arc<HostSnapshot> {
        self.0.clone()
    }
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Local address the kernel would route outbound traffic from. Connecting
/// a UDP socket sends nothing.
fn primary_ip() -> String {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| Ipv4Addr::LOCALHOST.to_string())
}

/// Loopback first, then every IPv4 address the hostname resolves to.
fn all_ips(hostname: &str) -> Vec<String> {
    let mut ips = vec![Ipv4Addr::LOCALHOST.to_string()];
    if let Ok(addrs) = (hostname, 0).to_socket_addrs() {
        for addr in addrs {
            if let IpAddr::V4(ip) = addr.ip() {
                let ip = ip.to_string();
                if !ips.contains(&ip) {
                    ips.push(ip);
                }
            }
        }
    }
    ips
}

fn os_info() -> OsInfo {
    let release = nix::sys::utsname::uname()
        .ok()
        .map(|uts| uts.release().to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    OsInfo {
        platform: std::env::consts::OS.to_string(),
        release,
        kind: std::env::consts::FAMILY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_identity_is_memoized() {
        let identity = SystemIdentity::new();
        let first = identity.snapshot();
        let second = identity.snapshot();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.ips[0], "127.0.0.1");
        assert!(!first.hostname.is_empty());
        assert_eq!(first.os.platform, std::env::consts::OS);
    }

    #[test]
    fn test_refresh_recomputes() {
        let identity = SystemIdentity::new();
        let first = identity.snapshot();
        identity.refresh();
        let second = identity.snapshot();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.hostname, second.hostname);
    }
}
