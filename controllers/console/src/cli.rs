//! Command-line interface.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use ipam_client::{ExportFormat, HostStatus, ReportType, ServiceType};
use ipam_view::topology::LayoutKind;
use ipam_view::{HostForm, SortKey, SubnetForm, Theme};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ipam-console", version, about = "IPAC console for IP and asset inventory")]
pub struct Cli {
    /// Base URL of the IPAC API (overrides IPAM_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding session and theme state (overrides IPAM_STATE_DIR)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Headline counts, subnet utilisation and service mix
    Dashboard,

    /// List hosts
    Hosts(HostsArgs),

    /// List subnets with their members
    Subnets {
        /// Match subnet name or CIDR
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Create, show, edit or delete a host
    Host {
        #[command(subcommand)]
        action: HostAction,
    },

    /// Create, edit or delete a subnet
    Subnet {
        #[command(subcommand)]
        action: SubnetAction,
    },

    /// Rack occupancy and invariant checks
    Racks,

    /// Print the initial topology layout and its edges
    Topology {
        #[arg(long, value_enum, default_value_t = LayoutArg::Graph)]
        layout: LayoutArg,
    },

    /// Move a host into another subnet
    MoveHost {
        host: String,
        subnet: String,
        /// Position in the destination member list (appended when omitted)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Ping hosts
    Ping {
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Attach a tag to hosts
    Tag {
        /// Tag id
        tag: String,
        #[arg(required = true)]
        hosts: Vec<String>,
        /// Label shown for the tag (defaults to the id)
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "#64748b")]
        color: String,
    },

    /// Export a report
    Export(ExportArgs),

    /// Sign in
    Login {
        email: String,
        #[arg(long, env = "IPAM_PASSWORD", hide_env_values = true)]
        password: String,
        /// Prefill this email next time
        #[arg(long)]
        remember: bool,
    },

    /// Sign out
    Logout,

    /// Show, set or toggle the color theme
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
}

#[derive(Debug, clap::Args)]
pub struct HostsArgs {
    /// Case-insensitive match on hostname or IP
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long = "subnet")]
    pub subnets: Vec<String>,
    #[arg(long = "service", value_parser = parse_service)]
    pub services: Vec<ServiceType>,
    #[arg(long = "status", value_parser = parse_status)]
    pub statuses: Vec<HostStatus>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Hostname)]
    pub sort: SortArg,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: usize,
    /// Rows per page (defaults to IPAM_PAGE_SIZE)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum HostAction {
    /// Show every field of a host
    Show { id: String },
    /// Add a host; the IP is checked against the inventory first
    Add(HostFields),
    /// Change the given fields of a host
    Edit {
        id: String,
        #[command(flatten)]
        fields: HostFields,
    },
    /// Delete a host
    Rm { id: String },
}

/// Host form fields; unset flags keep the current value
#[derive(Debug, Default, clap::Args)]
pub struct HostFields {
    #[arg(long)]
    pub hostname: Option<String>,
    #[arg(long)]
    pub ip: Option<String>,
    #[arg(long)]
    pub mac: Option<String>,
    #[arg(long)]
    pub subnet: Option<String>,
    #[arg(long, value_parser = parse_service)]
    pub service: Option<ServiceType>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<HostStatus>,
    #[arg(long)]
    pub os: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Tag ids; replaces the current tags when given
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl HostFields {
    /// Copy every given field except the IP onto `form`
    pub fn apply(self, form: &mut HostForm) {
        if let Some(hostname) = self.hostname {
            form.hostname = hostname;
        }
        if let Some(mac) = self.mac {
            form.mac_address = mac;
        }
        if let Some(subnet) = self.subnet {
            form.subnet_id = subnet;
        }
        if let Some(service) = self.service {
            form.service_type = Some(service);
        }
        if let Some(status) = self.status {
            form.status = Some(status);
        }
        if let Some(os) = self.os {
            form.os = os;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if !self.tags.is_empty() {
            form.tags = self.tags;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SubnetAction {
    /// Add a subnet
    Add(SubnetFields),
    /// Change the given fields of a subnet
    Edit {
        id: String,
        #[command(flatten)]
        fields: SubnetFields,
    },
    /// Delete a subnet
    Rm { id: String },
}

/// Subnet form fields; unset flags keep the current value
#[derive(Debug, Default, clap::Args)]
pub struct SubnetFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cidr: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
}

impl SubnetFields {
    /// Copy every given field onto `form`
    pub fn apply(self, form: &mut SubnetForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(cidr) = self.cidr {
            form.cidr = cidr;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(color) = self.color {
            form.color = color;
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[arg(long = "type", value_enum, default_value_t = ReportTypeArg::Usage)]
    pub report_type: ReportTypeArg,
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,
    /// First day (defaults to a week ago)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day (defaults to today)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Leave per-host details out
    #[arg(long)]
    pub no_details: bool,
    /// Directory to write the file into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Hostname,
    Ip,
    Service,
    Status,
    LastSeen,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Hostname => SortKey::Hostname,
            SortArg::Ip => SortKey::IpAddress,
            SortArg::Service => SortKey::ServiceType,
            SortArg::Status => SortKey::Status,
            SortArg::LastSeen => SortKey::LastSeenAt,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    /// Physical hosts with their VMs
    Graph,
    /// Hosts inside subnet areas
    Subnets,
}

impl From<LayoutArg> for LayoutKind {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Graph => LayoutKind::HostGraph,
            LayoutArg::Subnets => LayoutKind::SubnetAreas,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportTypeArg {
    Usage,
    Security,
    Inventory,
}

impl From<ReportTypeArg> for ReportType {
    fn from(arg: ReportTypeArg) -> Self {
        match arg {
            ReportTypeArg::Usage => ReportType::Usage,
            ReportTypeArg::Security => ReportType::Security,
            ReportTypeArg::Inventory => ReportType::Inventory,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Xlsx => ExportFormat::Xlsx,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

impl ThemeArg {
    /// Theme to apply, `None` for toggle
    pub fn theme(self) -> Option<Theme> {
        match self {
            ThemeArg::Light => Some(Theme::Light),
            ThemeArg::Dark => Some(Theme::Dark),
            ThemeArg::Toggle => None,
        }
    }
}

fn parse_status(raw: &str) -> Result<HostStatus, String> {
    HostStatus::ALL
        .into_iter()
        .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| format!("unknown status '{}', expected online, offline or idle", raw))
}

fn parse_service(raw: &str) -> Result<ServiceType, String> {
    ServiceType::ALL
        .into_iter()
        .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| format!("unknown service type '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hosts_filters_parse() {
        let cli = Cli::parse_from([
            "ipam-console",
            "--api-url",
            "http://ipac/api",
            "hosts",
            "--status",
            "Online",
            "--service",
            "database",
            "--subnet",
            "subnet-a",
            "--sort",
            "ip",
            "--desc",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://ipac/api"));
        let Command::Hosts(args) = cli.command else {
            panic!("expected hosts");
        };
        assert_eq!(args.statuses, [HostStatus::Online]);
        assert_eq!(args.services, [ServiceType::Database]);
        assert_eq!(SortKey::from(args.sort), SortKey::IpAddress);
        assert!(args.desc);
    }

    #[test]
    fn host_edit_keeps_unset_fields() {
        let cli = Cli::parse_from(["ipam-console", "host", "edit", "host-001", "--os", "Debian 12", "--tag", "prod"]);
        let Command::Host {
            action: HostAction::Edit { id, fields },
        } = cli.command
        else {
            panic!("expected host edit");
        };
        assert_eq!(id, "host-001");

        let mut form = HostForm::blank(&[]);
        form.hostname = "web-01".to_string();
        form.tags = vec!["db".to_string(), "critical".to_string()];
        fields.apply(&mut form);
        assert_eq!(form.hostname, "web-01");
        assert_eq!(form.os, "Debian 12");
        assert_eq!(form.tags, ["prod"]);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["ipam-console", "hosts", "--status", "asleep"]).is_err());
    }

    #[test]
    fn export_dates_parse() {
        let cli = Cli::parse_from(["ipam-console", "export", "--type", "inventory", "--from", "2024-05-01"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(ReportType::from(args.report_type), ReportType::Inventory);
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(args.to.is_none());
    }
}
