//! Host and subnet builders for unit tests

use ipam_client::{Host, HostStatus, HostType, ServiceType, Subnet};

/// Untyped online web host in subnet `default`
pub fn host(id: &str, ip: &str) -> Host {
    Host {
        id: id.to_string(),
        hostname: format!("{id}-host"),
        ip_address: ip.to_string(),
        mac_address: "00:11:22:33:44:55".to_string(),
        subnet_id: "default".to_string(),
        subnet_name: "Default".to_string(),
        status: HostStatus::Online,
        service_type: ServiceType::Web,
        os: "Debian 12".to_string(),
        last_seen_at: ipam_client::fallback::anchor(),
        description: None,
        tags: Vec::new(),
        host_type: None,
        parent_host_id: None,
        vm_count: None,
        rack_id: None,
        rack_position: None,
        rack_units: None,
    }
}

/// Physical host in `subnet`
pub fn physical(id: &str, subnet: &str) -> Host {
    let mut h = host(id, "10.0.0.1");
    h.subnet_id = subnet.to_string();
    h.host_type = Some(HostType::Physical);
    h
}

/// VM in `subnet`, optionally parented
pub fn vm(id: &str, subnet: &str, parent: Option<&str>) -> Host {
    let mut h = host(id, "10.0.0.2");
    h.subnet_id = subnet.to_string();
    h.host_type = Some(HostType::Vm);
    h.parent_host_id = parent.map(str::to_string);
    h
}

/// Subnet `id` named "Subnet <id>" owning `hosts`
pub fn subnet(id: &str, total: u32, hosts: Vec<Host>) -> Subnet {
    let hosts: Vec<Host> = hosts
        .into_iter()
        .map(|mut h| {
            h.subnet_id = id.to_string();
            h.subnet_name = format!("Subnet {id}");
            h
        })
        .collect();
    Subnet {
        id: id.to_string(),
        name: format!("Subnet {id}"),
        cidr: "10.0.0.0/24".to_string(),
        description: None,
        total_hosts: total,
        used_hosts: hosts.len() as u32,
        color: "#2563EB".to_string(),
        tags: Vec::new(),
        hosts,
    }
}
