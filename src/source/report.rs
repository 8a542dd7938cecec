//! Connectivity report parsing.
//!
//! Turns the text printed by `wg show` into [`LiveReading`]s:
//!
//! ```text
//! interface: wg0
//!   public key: ...
//!   listening port: 51820
//!
//! peer: xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
//!   endpoint: 203.0.113.9:51820
//!   allowed ips: 10.8.0.2/32
//!   latest handshake: 1 minute, 5 seconds ago
//!   transfer: 1.2 MiB received, 3.4 MiB sent
//! ```
//!
//! Blocks are separated by blank lines. Only blocks whose first line starts
//! with `peer` are read; everything else is ignored.

use crate::data::duration::parse_handshake_age;
use crate::data::{LiveReading, NEVER};

const PEER_MARKER: &str = "peer";
const ENDPOINT_MARKER: &str = "endpoint";
const HANDSHAKE_MARKER: &str = "handshake";

/// Parse a full connectivity report into per-peer readings, in report order.
pub fn parse_report(report: &str) -> Vec<LiveReading> {
    blocks(report).filter_map(parse_peer_block).collect()
}

/// Split the report into blocks of non-blank lines.
fn blocks(report: &str) -> impl Iterator<Item = Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in report.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks.into_iter()
}

fn parse_peer_block(lines: Vec<&str>) -> Option<LiveReading> {
    let (header, body) = lines.split_first()?;
    if !header.trim_start().starts_with(PEER_MARKER) {
        return None;
    }
    let id = value_of(header)?;
    if id.is_empty() {
        return None;
    }

    let mut endpoint = None;
    let mut age_seconds = NEVER;
    for line in body {
        if line.contains(ENDPOINT_MARKER) {
            endpoint = value_of(line).and_then(endpoint_host);
        } else if line.contains(HANDSHAKE_MARKER) {
            age_seconds = value_of(line).map_or(NEVER, parse_handshake_age);
        }
    }

    Some(LiveReading::new(id, age_seconds, endpoint))
}

/// Text after the first colon of a line, trimmed.
fn value_of(line: &str) -> Option<&str> {
    let (_, value) = line.split_once(':')?;
    Some(value.trim())
}

/// Strip the port from `host:port`, including bracketed IPv6 hosts.
fn endpoint_host(endpoint: &str) -> Option<String> {
    let host = match endpoint.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => endpoint,
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    (!host.is_empty()).then(|| host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> &'static str {
        "interface: wg0\n\
         \x20 public key: SERVERKEYsWdqlBY1Kk3xq7bC8WLrUnZWQOXkpnCyfWU=\n\
         \x20 private key: (hidden)\n\
         \x20 listening port: 51820\n\
         \n\
         peer: xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=\n\
         \x20 endpoint: 203.0.113.9:51820\n\
         \x20 allowed ips: 10.8.0.2/32\n\
         \x20 latest handshake: 1 minute, 5 seconds ago\n\
         \x20 transfer: 1.21 MiB received, 3.40 MiB sent\n\
         \n\
         peer: TrMvSoP4jYQlY6RIzBgbssQqY3vxI2Pi+y71lOWWXX0=\n\
         \x20 allowed ips: 10.8.0.3/32\n"
    }

    #[test]
    fn test_parse_report_skips_interface_block() {
        let readings = parse_report(sample_report());
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].id, "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=");
    }

    #[test]
    fn test_parse_endpoint_and_handshake() {
        let readings = parse_report(sample_report());
        assert_eq!(readings[0].endpoint.as_deref(), Some("203.0.113.9"));
        assert_eq!(readings[0].age_seconds, 65);
    }

    #[test]
    fn test_missing_lines_default_safely() {
        let readings = parse_report(sample_report());
        let idle = &readings[1];
        assert_eq!(idle.id, "TrMvSoP4jYQlY6RIzBgbssQqY3vxI2Pi+y71lOWWXX0=");
        assert!(idle.endpoint.is_none());
        assert_eq!(idle.age_seconds, NEVER);
    }

    #[test]
    fn test_empty_report() {
        assert!(parse_report("").is_empty());
        assert!(parse_report("\n\n\n").is_empty());
    }

    #[test]
    fn unindented_report_parses() {
        let report = "peer: abc=\nendpoint: 192.0.2.1:40000\nlatest handshake: 4 seconds ago\n";
        let readings = parse_report(report);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].age_seconds, 4);
        assert_eq!(readings[0].endpoint.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn ipv6_endpoint_strips_brackets_and_port() {
        let report = "peer: abc=\n  endpoint: [2001:db8::1]:51820\n";
        let readings = parse_report(report);
        assert_eq!(readings[0].endpoint.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn crlf_and_whitespace_only_separators() {
        let report = "interface: wg0\r\n   \r\npeer: abc=\r\n  latest handshake: Now\r\n";
        let readings = parse_report(report);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].age_seconds, 0);
    }

    #[test]
    fn malformed_handshake_is_never() {
        let report = "peer: abc=\n  latest handshake: garbled\n";
        assert_eq!(parse_report(report)[0].age_seconds, NEVER);
    }

    #[test]
    fn readings_are_unenriched() {
        let readings = parse_report(sample_report());
        assert!(readings[0].display_name.is_empty());
        assert!(readings[0].address.is_empty());
    }
}
