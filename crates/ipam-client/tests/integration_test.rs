//! Integration tests for the IPAC client
//!
//! These tests require a running IPAC backend.
//! Set the IPAM_API_URL environment variable to run.

use ipam_client::{HostFilter, HostStatus, IpamClient, IpamClientTrait, IpamService};
use std::sync::Arc;

fn api_url() -> String {
    std::env::var("IPAM_API_URL").unwrap_or_else(|_| "http://localhost:8080/api".to_string())
}

#[tokio::test]
#[ignore] // Requires running IPAC backend
async fn test_dashboard_overview() {
    let client = IpamClient::new(api_url()).expect("Failed to create client");

    let overview = client
        .get_dashboard_overview()
        .await
        .expect("Failed to fetch dashboard overview");

    println!(
        "{} IPs, {} online, {} offline",
        overview.total_ips, overview.online_hosts, overview.offline_hosts
    );
}

#[tokio::test]
#[ignore]
async fn test_list_subnets() {
    let client = IpamClient::new(api_url()).expect("Failed to create client");

    let subnets = client.list_subnets().await.expect("Failed to list subnets");

    for subnet in &subnets {
        assert!(subnet.used_hosts <= subnet.total_hosts, "{} over capacity", subnet.cidr);
    }
    println!("Found {} subnets", subnets.len());
}

#[tokio::test]
#[ignore]
async fn test_list_hosts_with_status_filter() {
    let client = IpamClient::new(api_url()).expect("Failed to create client");
    let filter = HostFilter {
        statuses: vec![HostStatus::Online],
        ..Default::default()
    };

    let hosts = client.list_hosts(&filter).await.expect("Failed to list hosts");

    println!("Found {} online hosts", hosts.len());
}

#[tokio::test]
#[ignore]
async fn test_list_racks() {
    let client = IpamClient::new(api_url()).expect("Failed to create client");

    let racks = client.list_racks().await.expect("Failed to list racks");

    println!("Found {} racks", racks.len());
}

#[tokio::test]
async fn test_service_falls_back_when_backend_is_unreachable() {
    // Port 9 (discard) is never an HTTP server
    let client = IpamClient::with_timeout("http://127.0.0.1:9".to_string(), std::time::Duration::from_millis(300))
        .expect("Failed to create client");
    let service = IpamService::new(Arc::new(client));

    let subnets = service.subnets().await;

    assert_eq!(subnets, ipam_client::fallback::subnets());
}
