//! Host, subnet and login form validation, and the debounced IP-conflict check.
//!
//! Field rules run synchronously and never touch the network. The IP
//! uniqueness check runs in the background through [`IpConflictChecker`]: it
//! waits for the input to settle, then asks a [`ConflictProbe`]. A newer input
//! cancels the pending check, and results of superseded checks are dropped.

use crate::error::ValidationErrors;
use async_trait::async_trait;
use chrono::Utc;
use ipam_client::{Host, HostFilter, HostStatus, HostTag, IpamService, ServiceType, Subnet};
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Quiet period before an IP conflict check fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

const UNKNOWN_TAG_COLOR: &str = "#64748b";

#[allow(clippy::expect_used, reason = "literal pattern")]
static IPV4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("valid IPv4 pattern"));

#[allow(clippy::expect_used, reason = "literal pattern")]
static MAC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$").expect("valid MAC pattern"));

#[allow(clippy::expect_used, reason = "literal pattern")]
static CIDR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/([0-9]|[1-2][0-9]|3[0-2])$").expect("valid CIDR pattern")
});

#[allow(clippy::expect_used, reason = "literal pattern")]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

fn octets_in_range(caps: &regex::Captures<'_>) -> bool {
    (1..=4).all(|i| caps.get(i).and_then(|m| m.as_str().parse::<u8>().ok()).is_some())
}

/// Dotted-quad IPv4 with every octet in 0..=255
pub fn is_ipv4(value: &str) -> bool {
    IPV4_RE.captures(value).is_some_and(|caps| octets_in_range(&caps))
}

/// Six colon-separated hex octets
pub fn is_mac(value: &str) -> bool {
    MAC_RE.is_match(value)
}

/// IPv4 CIDR with a prefix length of 0..=32
pub fn is_cidr(value: &str) -> bool {
    CIDR_RE.captures(value).is_some_and(|caps| octets_in_range(&caps))
}

/// Loose `local@domain.tld` check
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// True when another host already uses `ip`; `exclude_id` skips the host being edited
pub fn ip_conflicts(hosts: &[Host], ip: &str, exclude_id: Option<&str>) -> bool {
    hosts
        .iter()
        .any(|h| h.ip_address == ip && Some(h.id.as_str()) != exclude_id)
}

/// Editable host fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostForm {
    /// Host name
    pub hostname: String,
    /// IPv4 address
    pub ip_address: String,
    /// MAC address
    pub mac_address: String,
    /// Subnet id
    pub subnet_id: String,
    /// Service type; required
    pub service_type: Option<ServiceType>,
    /// Status; required
    pub status: Option<HostStatus>,
    /// Operating system
    pub os: String,
    /// Free-form notes
    pub description: String,
    /// Selected tag ids
    pub tags: Vec<String>,
}

impl HostForm {
    /// Blank form for a new host, preselecting the first subnet
    pub fn blank(subnets: &[Subnet]) -> Self {
        Self {
            hostname: String::new(),
            ip_address: String::new(),
            mac_address: String::new(),
            subnet_id: subnets.first().map(|s| s.id.clone()).unwrap_or_default(),
            service_type: Some(ServiceType::Web),
            status: Some(HostStatus::Online),
            os: String::new(),
            description: String::new(),
            tags: Vec::new(),
        }
    }

    /// Form prefilled from an existing host
    pub fn from_host(host: &Host) -> Self {
        Self {
            hostname: host.hostname.clone(),
            ip_address: host.ip_address.clone(),
            mac_address: host.mac_address.clone(),
            subnet_id: host.subnet_id.clone(),
            service_type: Some(host.service_type),
            status: Some(host.status),
            os: host.os.clone(),
            description: host.description.clone().unwrap_or_default(),
            tags: host.tags.iter().map(|t| t.id.clone()).collect(),
        }
    }

    /// Field rules
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.hostname.trim().chars().count() < 2 {
            errors.push("hostname", "Hostname must be at least 2 characters");
        }
        if !is_ipv4(&self.ip_address) {
            errors.push("ipAddress", "Enter a valid IPv4 address");
        }
        if !is_mac(&self.mac_address) {
            errors.push("macAddress", "Enter a valid MAC address (AA:BB:CC:DD:EE:FF)");
        }
        if self.subnet_id.is_empty() {
            errors.push("subnetId", "Select a subnet");
        }
        if self.service_type.is_none() {
            errors.push("serviceType", "Select a service type");
        }
        if self.status.is_none() {
            errors.push("status", "Select a status");
        }
        if self.os.trim().chars().count() < 2 {
            errors.push("os", "Enter the operating system");
        }
        errors.into_result()
    }

    /// Field rules plus the state of the IP conflict check
    pub fn validate_for_submit(&self, conflict: ConflictStatus) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_default();
        match conflict {
            ConflictStatus::Conflict => errors.push("ipAddress", "IP address is already in use"),
            ConflictStatus::Pending => errors.push("ipAddress", "Checking IP address availability"),
            ConflictStatus::Idle | ConflictStatus::Clear => {}
        }
        errors.into_result()
    }

    /// Build the host to persist. `existing` keeps identity and topology
    /// fields when editing; tags resolve against `palette`, unknown ids get a grey placeholder.
    pub fn to_host(&self, existing: Option<&Host>, subnets: &[Subnet], palette: &[HostTag]) -> Host {
        let subnet_name = subnets
            .iter()
            .find(|s| s.id == self.subnet_id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let tags = self
            .tags
            .iter()
            .map(|id| {
                palette.iter().find(|t| &t.id == id).cloned().unwrap_or_else(|| HostTag {
                    id: id.clone(),
                    label: id.clone(),
                    color: UNKNOWN_TAG_COLOR.to_string(),
                })
            })
            .collect();
        let description = if self.description.trim().is_empty() {
            None
        } else {
            Some(self.description.trim().to_string())
        };

        Host {
            id: existing.map(|h| h.id.clone()).unwrap_or_default(),
            hostname: self.hostname.trim().to_string(),
            ip_address: self.ip_address.clone(),
            mac_address: self.mac_address.to_uppercase(),
            subnet_id: self.subnet_id.clone(),
            subnet_name,
            status: self.status.unwrap_or(HostStatus::Online),
            service_type: self.service_type.unwrap_or(ServiceType::Other),
            os: self.os.trim().to_string(),
            last_seen_at: existing.map(|h| h.last_seen_at).unwrap_or_else(Utc::now),
            description,
            tags,
            host_type: existing.and_then(|h| h.host_type),
            parent_host_id: existing.and_then(|h| h.parent_host_id.clone()),
            vm_count: existing.and_then(|h| h.vm_count),
            rack_id: existing.and_then(|h| h.rack_id.clone()),
            rack_position: existing.and_then(|h| h.rack_position),
            rack_units: existing.and_then(|h| h.rack_units),
        }
    }
}

/// Editable subnet fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetForm {
    /// Display name
    pub name: String,
    /// Address block in CIDR notation
    pub cidr: String,
    /// Free-form notes
    pub description: String,
    /// Colour as a CSS hex string
    pub color: String,
}

impl Default for SubnetForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            cidr: String::new(),
            description: String::new(),
            color: "#2563EB".to_string(),
        }
    }
}

impl SubnetForm {
    /// Form prefilled from an existing subnet
    pub fn from_subnet(subnet: &Subnet) -> Self {
        Self {
            name: subnet.name.clone(),
            cidr: subnet.cidr.clone(),
            description: subnet.description.clone().unwrap_or_default(),
            color: subnet.color.clone(),
        }
    }

    /// Field rules
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.trim().chars().count() < 2 {
            errors.push("name", "Name must be at least 2 characters");
        }
        if !is_cidr(&self.cidr) {
            errors.push("cidr", "Enter a valid CIDR, e.g. 192.168.0.0/24");
        }
        let color_len = self.color.chars().count();
        if !(4..=9).contains(&color_len) {
            errors.push("color", "Color must be 4 to 9 characters");
        }
        errors.into_result()
    }

    /// Build the subnet to persist; counters and members come from `existing`
    pub fn to_subnet(&self, existing: Option<&Subnet>) -> Subnet {
        let description = if self.description.trim().is_empty() {
            None
        } else {
            Some(self.description.trim().to_string())
        };
        Subnet {
            id: existing.map(|s| s.id.clone()).unwrap_or_default(),
            name: self.name.trim().to_string(),
            cidr: self.cidr.clone(),
            description,
            total_hosts: existing.map(|s| s.total_hosts).unwrap_or_else(|| usable_hosts(&self.cidr)),
            used_hosts: existing.map(|s| s.used_hosts).unwrap_or(0),
            color: self.color.clone(),
            tags: existing.map(|s| s.tags.clone()).unwrap_or_default(),
            hosts: existing.map(|s| s.hosts.clone()).unwrap_or_default(),
        }
    }
}

/// Usable host addresses in an IPv4 CIDR (network and broadcast excluded for /30 and wider)
pub fn usable_hosts(cidr: &str) -> u32 {
    let Some(prefix) = cidr.split_once('/').and_then(|(_, p)| p.parse::<u32>().ok()) else {
        return 0;
    };
    match prefix {
        32 => 1,
        31 => 2,
        0..=30 => (1u64 << (32 - prefix)).saturating_sub(2).min(u64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Address to sign in with
    pub email: String,
    /// Password, checked for length only
    pub password: String,
    /// Keep the session across restarts
    pub remember_me: bool,
}

impl LoginForm {
    /// Field rules
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !is_email(&self.email) {
            errors.push("email", "Enter a valid email");
        }
        if self.password.chars().count() < 8 {
            errors.push("password", "Password must be at least 8 characters");
        }
        errors.into_result()
    }
}

/// Source of truth for IP uniqueness
#[async_trait]
pub trait ConflictProbe: Send + Sync {
    /// True when `ip` is used by a host other than `exclude_id`
    async fn is_conflict(&self, ip: &str, exclude_id: Option<&str>) -> bool;
}

/// Probe over an already fetched host list
#[derive(Debug, Clone)]
pub struct CollectionProbe {
    hosts: Vec<Host>,
}

impl CollectionProbe {
    /// Probe over `hosts`
    pub fn new(hosts: Vec<Host>) -> Self {
        Self { hosts }
    }
}

#[async_trait]
impl ConflictProbe for CollectionProbe {
    async fn is_conflict(&self, ip: &str, exclude_id: Option<&str>) -> bool {
        ip_conflicts(&self.hosts, ip, exclude_id)
    }
}

/// Probe that refetches the inventory (with fallback) on every check
#[async_trait]
impl ConflictProbe for IpamService {
    async fn is_conflict(&self, ip: &str, exclude_id: Option<&str>) -> bool {
        let hosts = self.hosts(&HostFilter::default()).await;
        ip_conflicts(&hosts, ip, exclude_id)
    }
}

/// State of the IP uniqueness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStatus {
    /// Nothing to check (empty or malformed input)
    #[default]
    Idle,
    /// Waiting for the input to settle or for the probe
    Pending,
    /// Another host holds the address
    Conflict,
    /// The address is free
    Clear,
}

impl ConflictStatus {
    /// True when the form must not be submitted
    pub fn blocks_submit(self) -> bool {
        matches!(self, ConflictStatus::Pending | ConflictStatus::Conflict)
    }
}

/// Debounced, cancellable IP conflict check bound to one form.
///
/// Must be used inside a tokio runtime. Dropping the checker cancels any
/// pending timer and in-flight probe.
pub struct IpConflictChecker {
    probe: Arc<dyn ConflictProbe>,
    debounce: Duration,
    exclude_id: Option<String>,
    generation: Arc<AtomicU64>,
    root: CancellationToken,
    current: Option<CancellationToken>,
    last_input: Option<String>,
    status_tx: Arc<watch::Sender<ConflictStatus>>,
    status_rx: watch::Receiver<ConflictStatus>,
}

impl std::fmt::Debug for IpConflictChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpConflictChecker")
            .field("debounce", &self.debounce)
            .field("exclude_id", &self.exclude_id)
            .field("status", &*self.status_rx.borrow())
            .finish()
    }
}

impl IpConflictChecker {
    /// Checker for a new host (`exclude_id = None`) or the host being edited
    pub fn new(probe: Arc<dyn ConflictProbe>, debounce: Duration, exclude_id: Option<String>) -> Self {
        let (status_tx, status_rx) = watch::channel(ConflictStatus::Idle);
        Self {
            probe,
            debounce,
            exclude_id,
            generation: Arc::new(AtomicU64::new(0)),
            root: CancellationToken::new(),
            current: None,
            last_input: None,
            status_tx: Arc::new(status_tx),
            status_rx,
        }
    }

    /// Latest status
    pub fn status(&self) -> ConflictStatus {
        *self.status_rx.borrow()
    }

    /// Value of the last `input`; the status describes this value only
    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_deref()
    }

    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<ConflictStatus> {
        self.status_rx.clone()
    }

    /// Feed the current value of the IP field
    pub fn input(&mut self, ip: &str) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_input = Some(ip.to_string());

        if !is_ipv4(ip) {
            self.status_tx.send_replace(ConflictStatus::Idle);
            return;
        }
        self.status_tx.send_replace(ConflictStatus::Pending);

        let token = self.root.child_token();
        self.current = Some(token.clone());

        let probe = Arc::clone(&self.probe);
        let latest = Arc::clone(&self.generation);
        let status_tx = Arc::clone(&self.status_tx);
        let debounce = self.debounce;
        let ip = ip.to_string();
        let exclude_id = self.exclude_id.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            debug!("checking IP conflict for {}", ip);
            let conflict = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                conflict = probe.is_conflict(&ip, exclude_id.as_deref()) => conflict,
            };
            if token.is_cancelled() || latest.load(Ordering::SeqCst) != generation {
                debug!("discarding stale IP conflict result for {}", ip);
                return;
            }
            status_tx.send_replace(if conflict {
                ConflictStatus::Conflict
            } else {
                ConflictStatus::Clear
            });
        });
    }

    /// Wait until the status is no longer pending
    pub async fn settled(&self) -> ConflictStatus {
        let mut rx = self.status_rx.clone();
        match rx.wait_for(|status| *status != ConflictStatus::Pending).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }

    /// Cancel everything; the checker stays usable for new input
    pub fn reset(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.last_input = None;
        self.status_tx.send_replace(ConflictStatus::Idle);
    }
}

impl Drop for IpConflictChecker {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
