//! Host identity lookup for event stamping and heartbeats.

use std::net::{IpAddr, UdpSocket};

use tracing::warn;

/// Name this host reports in events and heartbeats.
pub fn resolve_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            warn!(error = %err, "hostname lookup failed");
            "unknown".to_string()
        }
    }
}

/// Address this host reports in heartbeats.
///
/// Without a configured override, a plain UDP connect picks the source
/// address the default route would use; no packet is sent. Hosts with
/// no route at all report the unspecified address.
pub fn resolve_address(configured: Option<IpAddr>) -> String {
    if let Some(addr) = configured {
        return addr.to_string();
    }

    let discovered = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
        socket.connect("8.8.8.8:80")?;
        socket.local_addr()
    });

    match discovered {
        Ok(local) => local.ip().to_string(),
        Err(err) => {
            warn!(error = %err, "local address discovery failed");
            "0.0.0.0".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_address_wins() {
        let addr: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(resolve_address(Some(addr)), "192.168.1.20");
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!resolve_hostname().is_empty());
    }
}
