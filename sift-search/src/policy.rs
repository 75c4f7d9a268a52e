//! Network access policy guarding every outbound page fetch.
//!
//! A target is allowed only if it is plain http(s) on port 80/443, carries
//! no credentials, is not a known internal hostname, and every address it
//! resolves to is public. Resolutions are cached for a short TTL, so a
//! rebinding attack inside that window is not detected.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;
use url::{Host, Url};

use crate::config::PolicyConfig;
use crate::error::{Result, SearchError};

const FORBIDDEN_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "metadata",
    "metadata.google.internal",
];

/// Cloud metadata endpoints outside the generic private ranges.
const METADATA_ADDRESSES: &[Ipv4Addr] = &[
    Ipv4Addr::new(169, 254, 169, 254),
    Ipv4Addr::new(100, 100, 100, 200),
];

/// Decides whether a URL may be fetched. Runs before every request.
#[async_trait]
pub trait TargetGuard: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SearchError::ForbiddenTarget`] when the target is not allowed.
    async fn assert_allowed(&self, url: &Url) -> Result<()>;
}

/// Resolves a hostname to IP addresses.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// [`HostResolver`] backed by the system resolver via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 80)).await?;
        let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
        ips.dedup();
        Ok(ips)
    }
}

/// Anti-SSRF policy with a bounded, TTL-limited DNS cache.
pub struct NetworkAccessPolicy {
    resolver: Arc<dyn HostResolver>,
    dns_cache: Cache<String, Arc<Vec<IpAddr>>>,
    dns_timeout: Duration,
}

impl NetworkAccessPolicy {
    /// Policy using the system resolver.
    pub fn new(config: &PolicyConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    pub fn with_resolver(config: &PolicyConfig, resolver: Arc<dyn HostResolver>) -> Self {
        let dns_cache = Cache::builder()
            .max_capacity(config.dns_cache_entries)
            .time_to_live(Duration::from_secs(config.dns_cache_ttl_secs))
            .build();
        Self {
            resolver,
            dns_cache,
            dns_timeout: Duration::from_millis(config.dns_timeout_ms),
        }
    }

    async fn lookup(&self, url: &Url, host: &str) -> Result<Arc<Vec<IpAddr>>> {
        if let Some(cached) = self.dns_cache.get(host).await {
            return Ok(cached);
        }

        let resolved = tokio::time::timeout(self.dns_timeout, self.resolver.resolve(host))
            .await
            .map_err(|_| SearchError::Fetch {
                url: url.to_string(),
                reason: "DNS lookup timed out".into(),
            })?
            .map_err(|e| SearchError::Fetch {
                url: url.to_string(),
                reason: format!("DNS lookup failed: {e}"),
            })?;

        if resolved.is_empty() {
            return Err(SearchError::Fetch {
                url: url.to_string(),
                reason: "DNS lookup returned no addresses".into(),
            });
        }

        let resolved = Arc::new(resolved);
        self.dns_cache.insert(host.to_owned(), Arc::clone(&resolved)).await;
        Ok(resolved)
    }
}

#[async_trait]
impl TargetGuard for NetworkAccessPolicy {
    async fn assert_allowed(&self, url: &Url) -> Result<()> {
        let Some(host) = check_static(url)? else {
            return Ok(());
        };

        let addresses = self.lookup(url, &host).await?;
        for ip in addresses.iter() {
            if let Some(reason) = forbidden_ip_reason(*ip) {
                debug!(url = %url, ip = %ip, reason, "resolved address rejected");
                return Err(SearchError::forbidden(
                    url.as_str(),
                    format!("{host} resolves to {reason} address {ip}"),
                ));
            }
        }
        Ok(())
    }
}

/// Checks that need no DNS.
///
/// Returns the hostname that still has to be resolved, or `None` when the
/// host is an IP literal that already passed.
pub fn check_static(url: &Url) -> Result<Option<String>> {
    let forbid = |reason: &str| Err(SearchError::forbidden(url.as_str(), reason));

    if !matches!(url.scheme(), "http" | "https") {
        return forbid("only http and https URLs are allowed");
    }
    if !url.username().is_empty() || url.password().is_some() {
        return forbid("credentials in URL are not allowed");
    }
    if let Some(port) = url.port() {
        if port != 80 && port != 443 {
            return forbid("non-standard ports are not allowed");
        }
    }

    match url.host() {
        None => forbid("missing hostname"),
        Some(Host::Ipv4(ip)) => check_literal(url, IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_literal(url, IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => {
            let host = domain.trim_end_matches('.').to_ascii_lowercase();
            if host.is_empty() {
                return forbid("missing hostname");
            }
            if FORBIDDEN_HOSTNAMES.contains(&host.as_str()) || host.ends_with(".localhost") {
                return forbid("hostname is not allowed");
            }
            Ok(Some(host))
        }
    }
}

fn check_literal(url: &Url, ip: IpAddr) -> Result<Option<String>> {
    match forbidden_ip_reason(ip) {
        Some(reason) => Err(SearchError::forbidden(
            url.as_str(),
            format!("{reason} address is not allowed"),
        )),
        None => Ok(None),
    }
}

/// Classify `ip`; `Some(range name)` means it must not be contacted.
pub fn forbidden_ip_reason(ip: IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => forbidden_ipv4_reason(v4),
        IpAddr::V6(v6) => forbidden_ipv6_reason(v6),
    }
}

fn forbidden_ipv4_reason(ip: Ipv4Addr) -> Option<&'static str> {
    let [a, b, c, _] = ip.octets();

    if METADATA_ADDRESSES.contains(&ip) {
        Some("metadata")
    } else if a == 0 {
        Some("unspecified")
    } else if ip.is_loopback() {
        Some("loopback")
    } else if ip.is_link_local() {
        Some("link-local")
    } else if ip.is_private() {
        Some("private")
    } else if a == 100 && (b & 0xc0) == 64 {
        Some("carrier-grade NAT")
    } else if ip.is_broadcast() {
        Some("broadcast")
    } else if ip.is_multicast() {
        Some("multicast")
    } else if a >= 240
        || (a == 192 && b == 0 && c == 0)
        || (a == 192 && b == 0 && c == 2)
        || (a == 192 && b == 88 && c == 99)
        || (a == 198 && (b & 0xfe) == 18)
        || (a == 198 && b == 51 && c == 100)
        || (a == 203 && b == 0 && c == 113)
    {
        Some("reserved")
    } else {
        None
    }
}

fn forbidden_ipv6_reason(ip: Ipv6Addr) -> Option<&'static str> {
    let segments = ip.segments();
    let first = segments[0];

    if ip.is_unspecified() {
        return Some("unspecified");
    }
    if ip.is_loopback() {
        return Some("loopback");
    }
    if let Some(embedded) = embedded_ipv4(&ip) {
        return forbidden_ipv4_reason(embedded);
    }
    if (first & 0xffc0) == 0xfe80 {
        Some("link-local")
    } else if (first & 0xfe00) == 0xfc00 {
        Some("unique-local")
    } else if (first & 0xff00) == 0xff00 {
        Some("multicast")
    } else if (first & 0xffc0) == 0xfec0 || (first == 0x2001 && segments[1] == 0x0db8) {
        Some("reserved")
    } else {
        None
    }
}

/// IPv4 address carried inside an IPv4-mapped, IPv4-compatible, NAT64
/// (64:ff9b::/96) or 6to4 (2002::/16) IPv6 address.
fn embedded_ipv4(ip: &Ipv6Addr) -> Option<Ipv4Addr> {
    let s = ip.segments();
    let tail = || Ipv4Addr::new((s[6] >> 8) as u8, s[6] as u8, (s[7] >> 8) as u8, s[7] as u8);

    if s[..5].iter().all(|&x| x == 0) && (s[5] == 0xffff || s[5] == 0) {
        Some(tail())
    } else if s[0] == 0x0064 && s[1] == 0xff9b && s[2..6].iter().all(|&x| x == 0) {
        Some(tail())
    } else if s[0] == 0x2002 {
        Some(Ipv4Addr::new(
            (s[1] >> 8) as u8,
            s[1] as u8,
            (s[2] >> 8) as u8,
            s[2] as u8,
        ))
    } else {
        None
    }
}
