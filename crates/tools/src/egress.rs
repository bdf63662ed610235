//! Outbound URL policy.
//!
//! Every tool request URL is checked here before the transport sees it:
//! only `http`/`https`, no loopback or private-network hosts (unless the
//! development override is on), and, when an allowlist is configured, only
//! listed hosts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use genail_core::error::ScriptError;
use reqwest::Url;

/// Egress rules for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EgressPolicy {
    allowed_hosts: Vec<String>,
    allow_private_network: bool,
}

impl EgressPolicy {
    pub fn new(allowed_hosts: Vec<String>, allow_private_network: bool) -> Self {
        Self {
            allowed_hosts,
            allow_private_network,
        }
    }

    /// Derive the allowlist from the hostnames of the configured endpoints.
    ///
    /// Entries that do not parse as URLs, or have no host, are skipped.
    pub fn from_endpoints<'a>(
        endpoints: impl IntoIterator<Item = &'a str>,
        allow_private_network: bool,
    ) -> Self {
        let mut allowed_hosts: Vec<String> = Vec::new();
        for endpoint in endpoints {
            let host = Url::parse(endpoint.trim())
                .ok()
                .and_then(|url| url.host_str().map(str::to_string));
            if let Some(host) = host {
                if !allowed_hosts.contains(&host) {
                    allowed_hosts.push(host);
                }
            }
        }
        Self::new(allowed_hosts, allow_private_network)
    }

    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Parse `url` and run [`check`](Self::check) on it.
    pub fn validate(&self, url: &str) -> Result<Url, ScriptError> {
        let parsed = Url::parse(url)
            .map_err(|e| ScriptError::validation(format!("invalid URL '{url}': {e}")))?;
        self.check(&parsed)?;
        Ok(parsed)
    }

    /// Reject URLs that violate the policy.
    pub fn check(&self, url: &Url) -> Result<(), ScriptError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScriptError::security(format!(
                "URL scheme not allowed: {scheme}"
            )));
        }

        let host = url.host_str().unwrap_or_default();
        if !self.allow_private_network && is_private_host(host) {
            return Err(ScriptError::security("URL host is not allowed"));
        }

        if !self.allowed_hosts.is_empty() && !self.allowed_hosts.iter().any(|h| h == host) {
            return Err(ScriptError::security("URL host not in allowlist"));
        }

        Ok(())
    }
}

/// Whether `host` (as returned by [`Url::host_str`]) names the local machine
/// or a private network.
pub fn is_private_host(host: &str) -> bool {
    if host.is_empty() {
        return true;
    }
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_private_v4(ip),
        Ok(IpAddr::V6(ip)) => is_private_v6(ip),
        Err(_) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            host == "localhost" || host.ends_with(".localhost")
        }
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}
