//! Private and reserved address classification.
//!
//! Hostnames are classified literally: bracket notation is stripped first,
//! then the remainder is parsed as an IP address. Names that are not IP
//! literals are never considered private here.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const BLOCKED_V4: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 0, 2, 0), 24),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    (Ipv4Addr::new(198, 51, 100, 0), 24),
    (Ipv4Addr::new(203, 0, 113, 0), 24),
    (Ipv4Addr::new(224, 0, 0, 0), 4),
    (Ipv4Addr::new(233, 252, 0, 0), 24),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
];

const BLOCKED_V6: &[(Ipv6Addr, u8)] = &[
    (Ipv6Addr::UNSPECIFIED, 128),
    (Ipv6Addr::LOCALHOST, 128),
    (Ipv6Addr::new(0x0100, 0, 0, 0, 0, 0, 0, 0), 64),
    // Teredo only; the rest of 2001::/16 holds public allocations.
    (Ipv6Addr::new(0x2001, 0, 0, 0, 0, 0, 0, 0), 32),
    (Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0), 32),
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
    (Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0), 8),
];

const NAT64_PREFIX: Ipv6Addr = Ipv6Addr::new(0x0064, 0xff9b, 0, 0, 0, 0, 0, 0);
const SIX_TO_FOUR_PREFIX: Ipv6Addr = Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0);

/// Remove surrounding `[` `]` from an IPv6 host.
pub fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Lowercase, bracket-free, trailing-dot-free form used for every host comparison.
pub fn normalize_host(host: &str) -> String {
    strip_brackets(host.trim()).trim_end_matches('.').to_ascii_lowercase()
}

/// Exactly the loopback hosts eligible for the plain-HTTP development exemption.
pub fn is_loopback_literal(host: &str) -> bool {
    matches!(normalize_host(host).as_str(), "localhost" | "127.0.0.1" | "::1")
}

/// Any name that refers to the local machine.
pub fn is_localhost_name(host: &str) -> bool {
    let host = normalize_host(host);
    host == "localhost"
        || host.ends_with(".localhost")
        || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback() || is_mapped_loopback(ip))
}

fn is_mapped_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
        IpAddr::V4(_) => false,
    }
}

/// Whether `host` is an IP literal inside a private or reserved range.
pub fn is_private_host(host: &str) -> bool {
    normalize_host(host)
        .parse::<IpAddr>()
        .is_ok_and(is_private_ip)
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_broadcast()
        || BLOCKED_V4
            .iter()
            .any(|(net, prefix)| prefix_match(&ip.octets(), &net.octets(), *prefix))
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(embedded) = embedded_v4(ip) {
        return is_private_v4(embedded);
    }
    BLOCKED_V6
        .iter()
        .any(|(net, prefix)| prefix_match(&ip.octets(), &net.octets(), *prefix))
}

/// IPv4 address carried inside an IPv6 one: mapped (`::ffff:a.b.c.d`),
/// compatible (`::a.b.c.d`), NAT64 (`64:ff9b::/96`) and 6to4 (`2002::/16`).
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }
    let o = ip.octets();
    if ip != Ipv6Addr::UNSPECIFIED && ip != Ipv6Addr::LOCALHOST && o[..12].iter().all(|b| *b == 0) {
        return Some(Ipv4Addr::new(o[12], o[13], o[14], o[15]));
    }
    if prefix_match(&o, &NAT64_PREFIX.octets(), 96) {
        return Some(Ipv4Addr::new(o[12], o[13], o[14], o[15]));
    }
    if prefix_match(&o, &SIX_TO_FOUR_PREFIX.octets(), 16) {
        return Some(Ipv4Addr::new(o[2], o[3], o[4], o[5]));
    }
    None
}

fn prefix_match(ip: &[u8], net: &[u8], prefix: u8) -> bool {
    if prefix == 0 {
        return true;
    }
    let full = usize::from(prefix / 8);
    let rem = prefix % 8;

    if ip.len() < full || net.len() < full || ip[..full] != net[..full] {
        return false;
    }
    if rem == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - rem);
    ip[full] & mask == net[full] & mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("[::1]"), "::1");
        assert_eq!(strip_brackets("::1"), "::1");
        assert_eq!(strip_brackets("example.com"), "example.com");
        assert_eq!(strip_brackets("[::1"), "[::1");
    }

    #[test]
    fn test_private_ipv4_ranges() {
        for host in [
            "10.1.2.3",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "127.0.0.1",
            "127.8.8.8",
            "169.254.169.254",
            "0.0.0.0",
            "100.64.0.1",
            "100.127.255.255",
            "192.0.0.8",
            "198.18.0.1",
            "198.19.255.255",
            "233.252.0.7",
            "255.255.255.255",
        ] {
            assert!(is_private_host(host), "{host} should be private");
        }
    }

    #[test]
    fn test_public_ipv4() {
        for host in ["8.8.8.8", "172.15.0.1", "172.32.0.1", "100.128.0.1", "198.20.0.1", "1.1.1.1"] {
            assert!(!is_private_host(host), "{host} should be public");
        }
    }

    #[test]
    fn test_private_ipv6_ranges_bracketed_or_not() {
        for host in [
            "::1",
            "::",
            "fe80::1",
            "febf::1",
            "fc00::1",
            "fd12:3456::1",
            "ff02::1",
            "100::1",
            "2001:db8::1",
            "2001:0:4136:e378::1",
        ] {
            assert!(is_private_host(host), "{host} should be private");
            assert!(is_private_host(&format!("[{host}]")), "[{host}] should be private");
        }
    }

    #[test]
    fn test_teredo_prefix_is_narrow() {
        assert!(!is_private_host("2001:4860:4860::8888"));
        assert!(!is_private_host("[2001:4860:4860::8888]"));
        assert!(!is_private_host("2001:1::1"));
        assert!(!is_private_host("2606:4700:4700::1111"));
    }

    #[test]
    fn test_ipv4_mapped_is_unwrapped() {
        assert!(is_private_host("[::ffff:127.0.0.1]"));
        assert!(is_private_host("::ffff:7f00:1"));
        assert!(is_private_host("::ffff:10.0.0.1"));
        assert!(is_private_host("::ffff:a00:1"));
        assert!(!is_private_host("::ffff:8.8.8.8"));
        assert!(!is_private_host("::ffff:808:808"));
    }

    #[test]
    fn test_other_embedded_forms() {
        assert!(is_private_host("64:ff9b::a00:1"));
        assert!(!is_private_host("64:ff9b::808:808"));
        assert!(is_private_host("2002:c0a8:101::1"));
        assert!(is_private_host("::127.0.0.1"));
    }

    #[test]
    fn test_domain_names_are_not_classified() {
        assert!(!is_private_host("example.com"));
        assert!(!is_private_host("10.example.com"));
        assert!(!is_private_host(""));
    }

    #[test]
    fn test_localhost_names() {
        assert!(is_loopback_literal("localhost"));
        assert!(is_loopback_literal("LOCALHOST."));
        assert!(is_loopback_literal("[::1]"));
        assert!(is_loopback_literal("127.0.0.1"));
        assert!(!is_loopback_literal("127.0.0.2"));
        assert!(!is_loopback_literal("api.localhost"));

        assert!(is_localhost_name("api.localhost"));
        assert!(is_localhost_name("127.0.0.2"));
        assert!(is_localhost_name("[::ffff:127.0.0.1]"));
        assert!(!is_localhost_name("example.com"));
    }
}
