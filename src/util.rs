// Host/port helpers used before a Prober is built.

use std::net::IpAddr;
use anyhow::Result;

/// Accepts `host`, `host:port`, `[v6]:port` and bare IPv6 literals.
pub fn split_host_port(s: &str, default_port: u16) -> (String, u16) {
    let s = s.trim();
    if s.parse::<IpAddr>().is_ok() {
        return (s.to_string(), default_port);
    }
    if let Some(rest) = s.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(default_port);
            return (host.to_string(), port);
        }
    }
    if let Some(idx) = s.rfind(':') {
        if let Ok(port) = s[idx+1..].parse::<u16>() {
            return (s[..idx].to_string(), port);
        }
    }
    (s.to_string(), default_port)
}

pub async fn resolve_host_to_ip(host: &str) -> Result<IpAddr> {
    // First try to parse as IP address
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    // If parsing fails, resolve via DNS
    let addr = format!("{}:0", host);
    let mut addrs = tokio::net::lookup_host(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot resolve host {}: {}", host, e))?;
    Ok(addrs
        .next()
        .ok_or_else(|| anyhow::anyhow!("Cannot resolve host: {}", host))?
        .ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_common_forms() {
        assert_eq!(split_host_port("example.org", 80), ("example.org".to_string(), 80));
        assert_eq!(split_host_port("example.org:8443", 80), ("example.org".to_string(), 8443));
        assert_eq!(split_host_port("10.0.0.1:22", 80), ("10.0.0.1".to_string(), 22));
        assert_eq!(split_host_port("::1", 80), ("::1".to_string(), 80));
        assert_eq!(split_host_port("[::1]:443", 80), ("::1".to_string(), 443));
        assert_eq!(split_host_port("[fe80::1]", 25), ("fe80::1".to_string(), 25));
        assert_eq!(split_host_port("host:notaport", 80), ("host:notaport".to_string(), 80));
    }

    #[tokio::test]
    async fn literals_skip_dns() {
        assert_eq!(resolve_host_to_ip("127.0.0.1").await.unwrap(), IpAddr::from([127, 0, 0, 1]));
        assert!(resolve_host_to_ip("::1").await.unwrap().is_ipv6());
    }

    #[tokio::test]
    async fn unresolvable_names_fail() {
        assert!(resolve_host_to_ip("no-such-host.invalid").await.is_err());
    }
}
