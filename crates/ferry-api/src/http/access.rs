//! Address allow-list gating every request.
//!
//! # Design
//! - Every entry is reduced to a network block; bare addresses become single-host blocks.
//! - Construction fails when no entry is usable, so an empty allow-list never admits anyone.
//! - Rejections carry no detail beyond a plain `Forbidden` body.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ipnet::IpNet;
use thiserror::Error;
use tracing::warn;

use crate::http::constants::FORBIDDEN_BODY;
use crate::state::ApiState;

/// Errors raised while building the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// None of the configured entries parsed as an address or CIDR block.
    #[error("no valid CIDRs or ip provided")]
    NoValidEntries {
        /// Entries that were supplied and skipped.
        rejected: Vec<String>,
    },
}

/// Set of network blocks whose members may use the service.
#[derive(Debug, Clone)]
pub struct AccessControl {
    networks: Arc<[IpNet]>,
}

impl AccessControl {
    /// Parse the configured entries into network blocks.
    ///
    /// Entries that are neither an address nor a CIDR block are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoValidEntries`] when no entry is usable.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self, AccessError> {
        let mut networks = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            match parse_entry(entry) {
                Some(network) => networks.push(network),
                None => {
                    warn!(entry = %entry, "skipping invalid allow-list entry");
                    rejected.push(entry.to_string());
                }
            }
        }
        if networks.is_empty() {
            return Err(AccessError::NoValidEntries { rejected });
        }
        Ok(Self {
            networks: networks.into(),
        })
    }

    /// Blocks admitted by this allow-list.
    #[must_use]
    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    /// Whether `addr` falls inside any configured block.
    #[must_use]
    pub fn allows(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        self.networks.iter().any(|network| network.contains(&addr))
    }
}

fn parse_entry(entry: &str) -> Option<IpNet> {
    let entry = entry.trim();
    if entry.contains('/') {
        return entry.parse::<IpNet>().ok();
    }
    let addr = entry.parse::<IpAddr>().ok()?;
    let prefix = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    IpNet::new(addr, prefix).ok()
}

/// Reject requests whose peer address is unknown or outside the allow-list.
pub(crate) async fn require_allowed_peer(
    State(state): State<Arc<ApiState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match peer {
        Some(addr) if state.access.allows(addr) => next.run(req).await,
        _ => {
            state.telemetry.inc_access_denied();
            warn!(
                peer = ?peer,
                path = %req.uri().path(),
                "request rejected by access control"
            );
            (StatusCode::FORBIDDEN, FORBIDDEN_BODY).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn addr(value: &str) -> Result<IpAddr, std::net::AddrParseError> {
        value.parse()
    }

    #[test]
    fn bare_addresses_become_single_host_blocks() -> Result<(), Box<dyn Error>> {
        let access = AccessControl::new(&["192.168.1.10", "fd00::1"])?;
        assert_eq!(access.networks()[0].to_string(), "192.168.1.10/32");
        assert_eq!(access.networks()[1].to_string(), "fd00::1/128");
        assert!(access.allows(addr("192.168.1.10")?));
        assert!(!access.allows(addr("192.168.1.11")?));
        assert!(access.allows(addr("fd00::1")?));
        Ok(())
    }

    #[test]
    fn cidr_blocks_admit_members_only() -> Result<(), Box<dyn Error>> {
        let access = AccessControl::new(&["10.0.0.0/8".to_string()])?;
        assert!(access.allows(addr("10.200.3.4")?));
        assert!(!access.allows(addr("11.0.0.1")?));
        assert!(!access.allows(addr("::1")?));
        Ok(())
    }

    #[test]
    fn invalid_entries_are_skipped() -> Result<(), Box<dyn Error>> {
        let access = AccessControl::new(&["not-an-ip", "127.0.0.1", "300.0.0.0/8"])?;
        assert_eq!(access.networks().len(), 1);
        Ok(())
    }

    #[test]
    fn no_valid_entries_fails_construction() {
        let err = AccessControl::new(&["nope", ""]).err();
        assert_eq!(
            err,
            Some(AccessError::NoValidEntries {
                rejected: vec!["nope".to_string(), String::new()],
            })
        );
        let empty: [&str; 0] = [];
        assert!(AccessControl::new(&empty).is_err());
    }

    #[test]
    fn ipv4_mapped_peers_match_ipv4_blocks() -> Result<(), Box<dyn Error>> {
        let access = AccessControl::new(&["127.0.0.1"])?;
        assert!(access.allows(addr("::ffff:127.0.0.1")?));
        Ok(())
    }
}
