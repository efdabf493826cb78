//! Subcommand handlers.
//!
//! Each handler drives one page controller the way a user would on screen and
//! prints what the page would show.

use crate::cli::{
    Command, ExportArgs, HostAction, HostFields, HostsArgs, SubnetAction, SubnetFields, ThemeArg,
};
use crate::context::AppContext;
use crate::error::ConsoleError;
use crate::pages::Notice;
use crate::pages::dashboard::DashboardPage;
use crate::pages::hosts::HostsPage;
use crate::pages::reports::ReportsPage;
use crate::pages::subnets::SubnetsPage;
use chrono::Utc;
use ipam_client::{Host, HostFilter, HostTag, Subnet};
use ipam_view::rack::{SlotMap, hosts_in_rack, validate_parents, validate_rack};
use ipam_view::validation::LoginForm;
use ipam_view::{SortDirection, SortSpec};
use tracing::{debug, warn};

/// Utilisation at which the dashboard flags a subnet
const SATURATION_THRESHOLD: u32 = 80;

/// Run one subcommand
pub async fn run(command: Command, ctx: &mut AppContext) -> Result<(), ConsoleError> {
    match command {
        Command::Login {
            email,
            password,
            remember,
        } => login(ctx, email, password, remember),
        Command::Logout => {
            ctx.session.logout()?;
            println!("Signed out");
            Ok(())
        }
        Command::Theme { mode } => theme(ctx, mode),
        page => {
            ctx.require_login()?;
            run_page(page, ctx).await
        }
    }
}

async fn run_page(command: Command, ctx: &mut AppContext) -> Result<(), ConsoleError> {
    match command {
        Command::Dashboard => dashboard(ctx).await,
        Command::Hosts(args) => hosts(ctx, args).await,
        Command::Subnets { search } => subnets(ctx, &search).await,
        Command::Host { action } => host(ctx, action).await,
        Command::Subnet { action } => subnet(ctx, action).await,
        Command::Racks => racks(ctx).await,
        Command::Topology { layout } => {
            let mut page = SubnetsPage::new(ctx.service.clone());
            page.load().await;
            let state = page.open_topology(layout.into());
            let doc = serde_json::json!({
                "layout": format!("{:?}", state.kind()),
                "zoom": state.zoom(),
                "pan": state.pan(),
                "areas": state.areas(),
                "nodes": state.positions(),
                "edges": state.edges(),
            });
            println!("{:#}", doc);
            Ok(())
        }
        Command::MoveHost { host, subnet, index } => {
            let mut page = SubnetsPage::new(ctx.service.clone());
            page.load().await;
            let result = page.move_host(&host, &subnet, index).await;
            print_notices(page.notices());
            result.map(|_| ())
        }
        Command::Ping { hosts } => {
            let mut page = select_hosts(ctx, &hosts).await?;
            let (notice, results) = page.bulk_ping().await;
            for result in &results {
                println!("{:<12} {}", result.id, if result.success { "reachable" } else { "unreachable" });
            }
            println!("{}", notice);
            Ok(())
        }
        Command::Tag {
            tag,
            hosts,
            label,
            color,
        } => {
            let mut page = select_hosts(ctx, &hosts).await?;
            let tag = match (page.tags().into_iter().find(|t| t.id == tag), label) {
                (Some(known), None) => known,
                (_, label) => HostTag {
                    label: label.unwrap_or_else(|| tag.clone()),
                    id: tag,
                    color,
                },
            };
            let (notice, report) = page.bulk_tag(tag).await;
            for (id, reason) in &report.failed {
                println!("{:<12} failed: {}", id, reason);
            }
            println!("{}", notice);
            Ok(())
        }
        Command::Export(args) => export(ctx, args).await,
        Command::Login { .. } | Command::Logout | Command::Theme { .. } => Ok(()),
    }
}

fn login(ctx: &mut AppContext, email: String, password: String, remember_me: bool) -> Result<(), ConsoleError> {
    if let Some(user) = ctx.session.session().user.as_ref().filter(|_| ctx.session.is_authenticated()) {
        println!("Already signed in as {}", user.email);
        return Ok(());
    }
    let form = LoginForm {
        email,
        password,
        remember_me,
    };
    form.validate()?;
    let session = ctx.session.login(&form.email, form.remember_me)?;
    if let Some(user) = &session.user {
        println!("Signed in as {}", user.email);
    }
    Ok(())
}

fn theme(ctx: &mut AppContext, mode: Option<ThemeArg>) -> Result<(), ConsoleError> {
    let theme = match mode.map(ThemeArg::theme) {
        None => ctx.session.theme(),
        Some(Some(theme)) => ctx.session.set_theme(theme)?,
        Some(None) => ctx.session.toggle_theme()?,
    };
    println!("{}", theme.as_str());
    Ok(())
}

async fn dashboard(ctx: &AppContext) -> Result<(), ConsoleError> {
    let mut page = DashboardPage::new(ctx.service.clone());
    let view = page.refresh().await;

    println!(
        "IPs {}  online {}  offline {}  conflicts {}",
        view.total_ips, view.online_hosts, view.offline_hosts, view.conflict_count
    );
    println!();
    println!("Subnet utilisation");
    for bar in &view.utilization {
        println!("  {:<24} {:>3}% {}", bar.subnet_name, bar.usage, "#".repeat((bar.usage / 5) as usize));
    }
    for bar in view.saturated(SATURATION_THRESHOLD) {
        warn!("Subnet {} is at {}%", bar.subnet_name, bar.usage);
    }
    println!();
    println!("Services");
    for slice in &view.services {
        println!("  {:<12} {:>3} ({}%)", slice.service_type, slice.count, slice.percent);
    }
    println!();
    println!("Recently online");
    for host in &view.recent_online {
        println!("  {:<20} {}", host.hostname, host.ip_address);
    }
    println!("Recently offline");
    for host in &view.recent_offline {
        println!("  {:<20} {}", host.hostname, host.ip_address);
    }
    Ok(())
}

async fn hosts(ctx: &AppContext, args: HostsArgs) -> Result<(), ConsoleError> {
    let mut page = HostsPage::new(
        ctx.service.clone(),
        args.page_size.unwrap_or(ctx.config.page_size),
        ctx.config.ip_check_debounce,
    );
    page.set_filter(HostFilter {
        search: args.search,
        subnets: args.subnets,
        services: args.services,
        statuses: args.statuses,
        tags: args.tags,
    });
    page.set_sort(SortSpec {
        key: args.sort.into(),
        direction: if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    });
    page.load().await;
    page.set_page(args.page);

    let rows = page.page_rows();
    println!("{:<20} {:<16} {:<8} {:<12} {:<16} TAGS", "HOSTNAME", "IP", "STATUS", "SERVICE", "SUBNET");
    for host in &rows {
        println!(
            "{:<20} {:<16} {:<8} {:<12} {:<16} {}",
            host.hostname,
            host.ip_address,
            host.status,
            host.service_type,
            host.subnet_name,
            tag_labels(host)
        );
    }
    let total = page.total();
    let pagination = page.pagination();
    println!(
        "Page {}/{} ({} hosts)",
        pagination.index() + 1,
        pagination.page_count(total).max(1),
        total
    );
    Ok(())
}

async fn host(ctx: &AppContext, action: HostAction) -> Result<(), ConsoleError> {
    let mut page = HostsPage::new(ctx.service.clone(), ctx.config.page_size, ctx.config.ip_check_debounce);
    page.load().await;

    let result = match action {
        HostAction::Show { id } => {
            let host = page.open_detail(&id)?;
            print_host(&host);
            return Ok(());
        }
        HostAction::Add(fields) => save_host(&mut page, None, fields).await,
        HostAction::Edit { id, fields } => save_host(&mut page, Some(&id), fields).await,
        HostAction::Rm { id } => {
            page.request_delete(&id)?;
            page.confirm_delete().await
        }
    };
    print_notices(page.notices());
    result.map(|_| ())
}

async fn save_host(page: &mut HostsPage, id: Option<&str>, fields: HostFields) -> Result<Host, ConsoleError> {
    let editor = match id {
        Some(id) => page.open_edit(id)?,
        None => page.open_create(),
    };
    let ip = fields.ip.clone();
    fields.apply(&mut editor.form);
    if let Some(ip) = ip {
        editor.set_ip(&ip);
        let status = editor.settle().await;
        debug!("IP {} check: {:?}", editor.form.ip_address, status);
    }
    page.submit().await
}

fn print_host(host: &Host) {
    let rows = [
        ("ID", host.id.clone()),
        ("Hostname", host.hostname.clone()),
        ("IP", host.ip_address.clone()),
        ("MAC", host.mac_address.clone()),
        ("Subnet", format!("{} ({})", host.subnet_name, host.subnet_id)),
        ("Status", host.status.to_string()),
        ("Service", host.service_type.to_string()),
        ("OS", host.os.clone()),
        ("Last seen", host.last_seen_at.to_rfc3339()),
        ("Description", host.description.clone().unwrap_or_default()),
        ("Tags", tag_labels(host)),
    ];
    for (label, value) in rows {
        println!("{:<12} {}", label, value);
    }
}

async fn subnet(ctx: &AppContext, action: SubnetAction) -> Result<(), ConsoleError> {
    let mut page = SubnetsPage::new(ctx.service.clone());
    page.load().await;

    let result = match action {
        SubnetAction::Add(fields) => save_subnet(&mut page, None, fields).await,
        SubnetAction::Edit { id, fields } => save_subnet(&mut page, Some(&id), fields).await,
        SubnetAction::Rm { id } => {
            page.request_delete(&id)?;
            page.confirm_delete().await
        }
    };
    print_notices(page.notices());
    result.map(|_| ())
}

async fn save_subnet(page: &mut SubnetsPage, id: Option<&str>, fields: SubnetFields) -> Result<Subnet, ConsoleError> {
    let form = match id {
        Some(id) => page.open_edit(id)?,
        None => page.open_create(),
    };
    fields.apply(form);
    page.submit().await
}

fn tag_labels(host: &Host) -> String {
    host.tags.iter().map(|t| t.label.as_str()).collect::<Vec<_>>().join(",")
}

async fn subnets(ctx: &AppContext, search: &str) -> Result<(), ConsoleError> {
    let mut page = SubnetsPage::new(ctx.service.clone());
    page.load().await;
    page.set_search(search);

    for subnet in page.subnets() {
        println!(
            "{:<20} {:<18} {}/{} ({}%)",
            subnet.name,
            subnet.cidr,
            subnet.used_hosts,
            subnet.total_hosts,
            subnet.usage_percent()
        );
        for host in &subnet.hosts {
            println!("    {:<20} {:<16} {}", host.hostname, host.ip_address, host.status);
        }
    }
    Ok(())
}

async fn racks(ctx: &AppContext) -> Result<(), ConsoleError> {
    let all = HostFilter::default();
    let (racks, hosts) = futures::join!(ctx.service.racks(), ctx.service.hosts(&all));

    let mut problems = validate_parents(&hosts);
    for rack in &racks {
        let slots = SlotMap::new(rack, &hosts);
        println!(
            "{:<12} {:<20} {}/{}U ({}%)",
            rack.name,
            rack.location,
            slots.used(),
            rack.total_units,
            slots.usage_percent()
        );
        for host in hosts_in_rack(&hosts, &rack.id) {
            let first = host.rack_position.unwrap_or(1);
            let last = u16::from(first) + u16::from(host.rack_units()) - 1;
            println!("    U{:<2}-U{:<2} {}", first, last, host.hostname);
        }
        problems.extend(validate_rack(rack, &hosts));
    }

    for problem in &problems {
        warn!("{}", problem);
    }
    match problems.into_iter().next() {
        Some(first) => Err(first.into()),
        None => Ok(()),
    }
}

async fn export(ctx: &AppContext, args: ExportArgs) -> Result<(), ConsoleError> {
    let today = Utc::now().date_naive();
    let mut page = ReportsPage::new(ctx.service.clone(), today);
    page.set_report_type(args.report_type.into());
    page.set_include_details(!args.no_details);
    let range = page.filter().date_range;
    page.set_range(args.from.unwrap_or(range.from), args.to.unwrap_or(range.to))?;

    let artifact = page.export(args.format.into(), Utc::now()).await;
    let path = artifact.write_to(&args.out)?;
    print_notices(page.notices());
    println!("{} ({}, {} bytes)", path.display(), artifact.content_type, artifact.bytes.len());
    Ok(())
}

/// Load the hosts page and select `ids`; every id must exist
async fn select_hosts(ctx: &AppContext, ids: &[String]) -> Result<HostsPage, ConsoleError> {
    let mut page = HostsPage::new(ctx.service.clone(), ctx.config.page_size, ctx.config.ip_check_debounce);
    page.load().await;
    let known = page.rows();
    for id in ids {
        if !known.iter().any(|h| &h.id == id) {
            return Err(ConsoleError::NotFound(format!("host {}", id)));
        }
        if !page.selection().contains(id) {
            page.toggle_row(id);
        }
    }
    Ok(page)
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn context(dir: &std::path::Path) -> AppContext {
        AppContext::new(Config {
            // Nothing listens here; every read falls back to the bundled data
            api_url: "http://127.0.0.1:9".to_string(),
            api_timeout: std::time::Duration::from_millis(200),
            state_dir: dir.to_path_buf(),
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn page_commands_require_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let err = run(Command::Dashboard, &mut ctx).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotAuthenticated));
    }

    #[tokio::test]
    async fn login_rejects_short_password() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let err = login(&mut ctx, "ops@ipac.dev".into(), "short".into(), false).unwrap_err();
        let ConsoleError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("password").is_some());
        assert!(!ctx.session.is_authenticated());
    }

    #[tokio::test]
    async fn racks_from_bundled_data_are_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        login(&mut ctx, "ops@ipac.dev".into(), "correct horse".into(), false).unwrap();
        run(Command::Racks, &mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn theme_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        theme(&mut ctx, Some(ThemeArg::Toggle)).unwrap();
        assert_eq!(context(dir.path()).session.theme(), ipam_view::Theme::Dark);
    }

    #[tokio::test]
    async fn adding_a_host_with_a_taken_ip_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut page = HostsPage::new(ctx.service.clone(), 10, std::time::Duration::from_millis(10));
        page.load().await;

        let fields = HostFields {
            hostname: Some("web-gateway-02".to_string()),
            ip: Some("10.10.0.12".to_string()),
            mac: Some("00:1A:2B:3C:4D:99".to_string()),
            os: Some("Ubuntu 24.04".to_string()),
            ..HostFields::default()
        };
        let err = save_host(&mut page, None, fields).await.unwrap_err();
        let ConsoleError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("ipAddress").is_some());
        assert!(page.editor_mut().is_some());
    }

    #[tokio::test]
    async fn unknown_host_cannot_be_selected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let err = select_hosts(&ctx, &["host-404".to_string()]).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotFound(_)));
    }
}
