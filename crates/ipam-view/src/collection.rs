//! Client-side filtering, sorting and pagination of host lists.
//!
//! Everything here is a pure function of its inputs. Filter dimensions combine
//! with AND; values inside one dimension combine with OR, and an empty
//! dimension does not constrain the result.

use ipam_client::{Host, HostFilter, HostTag, Subnet};
use std::cmp::Ordering;
use std::collections::HashSet;

/// True when `host` passes every active dimension of `filter`
pub fn matches(host: &Host, filter: &HostFilter) -> bool {
    matches_search(host, &filter.search)
        && (filter.subnets.is_empty() || filter.subnets.contains(&host.subnet_id))
        && (filter.services.is_empty() || filter.services.contains(&host.service_type))
        && (filter.statuses.is_empty() || filter.statuses.contains(&host.status))
        && (filter.tags.is_empty() || filter.tags.iter().any(|tag| host.has_tag(tag)))
}

// Leading and trailing whitespace is ignored; a blank needle matches everything
fn matches_search(host: &Host, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    host.hostname.to_lowercase().contains(&needle) || host.ip_address.to_lowercase().contains(&needle)
}

/// Hosts passing `filter`, in input order
pub fn filter_hosts(hosts: &[Host], filter: &HostFilter) -> Vec<Host> {
    hosts.iter().filter(|h| matches(h, filter)).cloned().collect()
}

/// Subnets whose name or CIDR contains `search` (case-insensitive)
pub fn filter_subnets(subnets: &[Subnet], search: &str) -> Vec<Subnet> {
    let needle = search.trim().to_lowercase();
    subnets
        .iter()
        .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle) || s.cidr.contains(&needle))
        .cloned()
        .collect()
}

/// Column a host table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Case-insensitive hostname
    #[default]
    Hostname,
    /// IP address compared as its literal string
    IpAddress,
    /// Service type in declaration order
    ServiceType,
    /// Status in declaration order
    Status,
    /// Last seen timestamp
    LastSeenAt,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// The opposite direction
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort of a host table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortSpec {
    /// Column sorted on
    pub key: SortKey,
    /// Ascending or descending
    pub direction: SortDirection,
}

impl SortSpec {
    /// Sort by `key` ascending
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Sort by `key` descending
    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Header click: same key flips direction, another key starts ascending
    pub fn clicked(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            Self::ascending(key)
        }
    }
}

fn compare(a: &Host, b: &Host, key: SortKey) -> Ordering {
    match key {
        SortKey::Hostname => a.hostname.to_lowercase().cmp(&b.hostname.to_lowercase()),
        SortKey::IpAddress => a.ip_address.cmp(&b.ip_address),
        SortKey::ServiceType => a.service_type.as_str().cmp(b.service_type.as_str()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::LastSeenAt => a.last_seen_at.cmp(&b.last_seen_at),
    }
}

/// Stable in-place sort; equal keys keep their input order in both directions
pub fn sort_hosts(hosts: &mut [Host], spec: SortSpec) {
    match spec.direction {
        SortDirection::Ascending => hosts.sort_by(|a, b| compare(a, b, spec.key)),
        SortDirection::Descending => hosts.sort_by(|a, b| compare(a, b, spec.key).reverse()),
    }
}

/// Slice `[index*size, index*size+size)` clamped to `items`
pub fn paginate<T>(items: &[T], index: usize, size: usize) -> &[T] {
    let size = size.max(1);
    let start = index.saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// Zero-based page cursor over a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    index: usize,
    size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Pagination {
    /// Cursor at page 0; a zero size is treated as 1
    pub fn new(size: usize) -> Self {
        Self {
            index: 0,
            size: size.max(1),
        }
    }

    /// Current page index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current page size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Jump to `index`
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Change the page size; always returns to page 0
    pub fn set_size(&mut self, size: usize) {
        self.size = size.max(1);
        self.index = 0;
    }

    /// Return to page 0
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Number of pages needed for `total` items
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.size)
    }

    /// True when a page follows the current one
    pub fn has_next(&self, total: usize) -> bool {
        self.index + 1 < self.page_count(total)
    }

    /// True when a page precedes the current one
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Advance one page if possible
    pub fn next(&mut self, total: usize) {
        if self.has_next(total) {
            self.index += 1;
        }
    }

    /// Go back one page if possible
    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// The current page of `items`
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.index, self.size)
    }
}

/// Distinct tags across `hosts` by id, in first-seen order
pub fn filterable_tags(hosts: &[Host]) -> Vec<HostTag> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .flat_map(|h| h.tags.iter())
        .filter(|tag| seen.insert(tag.id.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::host;
    use ipam_client::{HostStatus, ServiceType};
    use proptest::prelude::*;

    fn tagged(mut h: Host, tags: &[&str]) -> Host {
        h.tags = tags
            .iter()
            .map(|id| HostTag {
                id: id.to_string(),
                label: id.to_uppercase(),
                color: "#000000".to_string(),
            })
            .collect();
        h
    }

    #[test]
    fn filter_sort_and_page_end_to_end() {
        let mut h1 = host("h1", "10.0.0.1");
        h1.status = HostStatus::Online;
        let mut h2 = host("h2", "10.0.0.2");
        h2.status = HostStatus::Offline;
        let hosts = vec![h1, h2];

        let online = filter_hosts(
            &hosts,
            &HostFilter {
                statuses: vec![HostStatus::Online],
                ..Default::default()
            },
        );
        assert_eq!(online.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), ["h1"]);

        let mut sorted = hosts.clone();
        sort_hosts(&mut sorted, SortSpec::descending(SortKey::IpAddress));
        assert_eq!(sorted.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), ["h2", "h1"]);

        let page = paginate(&hosts, 1, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "h2");
    }

    #[test]
    fn search_matches_hostname_or_ip_case_insensitively() {
        let mut h = host("h1", "192.168.7.20");
        h.hostname = "Web-Gateway".to_string();
        let by_name = HostFilter {
            search: "gATe".to_string(),
            ..Default::default()
        };
        let by_ip = HostFilter {
            search: "168.7".to_string(),
            ..Default::default()
        };
        let miss = HostFilter {
            search: "db".to_string(),
            ..Default::default()
        };
        assert!(matches(&h, &by_name));
        assert!(matches(&h, &by_ip));
        assert!(!matches(&h, &miss));
    }

    #[test]
    fn search_ignores_surrounding_whitespace() {
        let h = host("h1", "10.10.0.12");
        let padded = HostFilter {
            search: " 10.10.0.12\t".to_string(),
            ..Default::default()
        };
        let blank = HostFilter {
            search: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches(&h, &padded));
        assert!(matches(&h, &blank));
        let subnets = ipam_client::fallback::subnets();
        assert_eq!(filter_subnets(&subnets, "  iot ").len(), 1);
    }

    #[test]
    fn values_within_a_dimension_are_ored() {
        let web = host("a", "10.0.0.1");
        let mut db = host("b", "10.0.0.2");
        db.service_type = ServiceType::Database;
        let mut file = host("c", "10.0.0.3");
        file.service_type = ServiceType::File;

        let filter = HostFilter {
            services: vec![ServiceType::Web, ServiceType::Database],
            ..Default::default()
        };
        let ids: Vec<_> = filter_hosts(&[web, db, file], &filter).into_iter().map(|h| h.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn tag_dimension_matches_any_selected_tag() {
        let a = tagged(host("a", "10.0.0.1"), &["prod"]);
        let b = tagged(host("b", "10.0.0.2"), &["lab", "edge"]);
        let c = host("c", "10.0.0.3");
        let filter = HostFilter {
            tags: vec!["edge".to_string(), "prod".to_string()],
            ..Default::default()
        };
        let ids: Vec<_> = filter_hosts(&[a, b, c], &filter).into_iter().map(|h| h.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn filterable_tags_are_distinct_in_first_seen_order() {
        let a = tagged(host("a", "10.0.0.1"), &["prod", "edge"]);
        let b = tagged(host("b", "10.0.0.2"), &["lab", "prod"]);
        let ids: Vec<_> = filterable_tags(&[a, b]).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["prod", "edge", "lab"]);
    }

    #[test]
    fn header_click_toggles_or_restarts() {
        let spec = SortSpec::ascending(SortKey::Hostname);
        assert_eq!(spec.clicked(SortKey::Hostname), SortSpec::descending(SortKey::Hostname));
        assert_eq!(
            SortSpec::descending(SortKey::Hostname).clicked(SortKey::Status),
            SortSpec::ascending(SortKey::Status)
        );
    }

    #[test]
    fn subnet_search_matches_name_or_cidr() {
        let subnets = ipam_client::fallback::subnets();
        assert_eq!(filter_subnets(&subnets, "iot").len(), 1);
        assert_eq!(filter_subnets(&subnets, "10.20").len(), 1);
        assert_eq!(filter_subnets(&subnets, "").len(), subnets.len());
    }

    #[test]
    fn pagination_clamps_and_resets_on_size_change() {
        let items: Vec<u32> = (0..25).collect();
        let mut pages = Pagination::new(10);
        assert_eq!(pages.page_count(items.len()), 3);

        pages.set_index(2);
        assert_eq!(pages.page(&items), &[20, 21, 22, 23, 24]);
        assert!(!pages.has_next(items.len()));

        pages.set_index(7);
        assert!(pages.page(&items).is_empty());

        pages.set_index(2);
        pages.set_size(5);
        assert_eq!(pages.index(), 0);
        assert_eq!(pages.page(&items), &[0, 1, 2, 3, 4]);

        pages.next(items.len());
        pages.previous();
        pages.previous();
        assert_eq!(pages.index(), 0);
        assert_eq!(Pagination::new(0).size(), 1);
    }

    fn arb_host() -> impl Strategy<Value = Host> {
        (
            0usize..3,
            0usize..3,
            0usize..ServiceType::ALL.len(),
            0usize..3,
            proptest::collection::vec(0usize..3, 0..3),
            0i64..5,
        )
            .prop_map(|(name, status, service, subnet, tags, age)| {
                let names = ["alpha", "Beta", "gamma"];
                let subnets = ["s1", "s2", "s3"];
                let tag_ids = ["t1", "t2", "t3"];
                let mut h = tagged(host("x", &format!("10.0.0.{}", name + 1)), &[]);
                h.hostname = names[name].to_string();
                h.status = HostStatus::ALL[status];
                h.service_type = ServiceType::ALL[service];
                h.subnet_id = subnets[subnet].to_string();
                h = tagged(h, &tags.iter().map(|i| tag_ids[*i]).collect::<Vec<_>>());
                h.last_seen_at = ipam_client::fallback::anchor() - chrono::TimeDelta::hours(age);
                h
            })
    }

    fn arb_hosts() -> impl Strategy<Value = Vec<Host>> {
        proptest::collection::vec(arb_host(), 0..20).prop_map(|hosts| {
            hosts
                .into_iter()
                .enumerate()
                .map(|(i, mut h)| {
                    h.id = format!("h{i}");
                    h
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = HostFilter> {
        (
            prop_oneof![Just(String::new()), Just("a".to_string()), Just("10.0.0.2".to_string())],
            proptest::sample::subsequence(vec!["s1", "s2", "s3"], 0..=3),
            proptest::sample::subsequence(ServiceType::ALL.to_vec(), 0..=2),
            proptest::sample::subsequence(HostStatus::ALL.to_vec(), 0..=3),
            proptest::sample::subsequence(vec!["t1", "t2", "t3"], 0..=2),
        )
            .prop_map(|(search, subnets, services, statuses, tags)| HostFilter {
                search,
                subnets: subnets.into_iter().map(String::from).collect(),
                services,
                statuses,
                tags: tags.into_iter().map(String::from).collect(),
            })
    }

    fn ids(hosts: &[Host]) -> Vec<String> {
        hosts.iter().map(|h| h.id.clone()).collect()
    }

    fn arb_key() -> impl Strategy<Value = SortKey> {
        prop_oneof![
            Just(SortKey::Hostname),
            Just(SortKey::IpAddress),
            Just(SortKey::ServiceType),
            Just(SortKey::Status),
            Just(SortKey::LastSeenAt),
        ]
    }

    proptest! {
        #[test]
        fn filter_is_the_intersection_of_single_dimension_filters(hosts in arb_hosts(), filter in arb_filter()) {
            let singles = [
                HostFilter { search: filter.search.clone(), ..Default::default() },
                HostFilter { subnets: filter.subnets.clone(), ..Default::default() },
                HostFilter { services: filter.services.clone(), ..Default::default() },
                HostFilter { statuses: filter.statuses.clone(), ..Default::default() },
                HostFilter { tags: filter.tags.clone(), ..Default::default() },
            ];
            let mut chained = hosts.clone();
            for single in singles.iter().rev() {
                chained = filter_hosts(&chained, single);
            }
            prop_assert_eq!(ids(&filter_hosts(&hosts, &filter)), ids(&chained));
        }

        #[test]
        fn sort_is_stable(hosts in arb_hosts(), key in arb_key(), descending in any::<bool>()) {
            let spec = if descending { SortSpec::descending(key) } else { SortSpec::ascending(key) };
            let mut once = hosts.clone();
            sort_hosts(&mut once, spec);
            let mut twice = once.clone();
            sort_hosts(&mut twice, spec);
            prop_assert_eq!(ids(&once), ids(&twice));

            // equal keys keep input order: indices within each key group ascend
            for pair in once.windows(2) {
                if compare(&pair[0], &pair[1], key) == Ordering::Equal {
                    let a: usize = pair[0].id[1..].parse().unwrap();
                    let b: usize = pair[1].id[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }

        #[test]
        fn pages_reconstruct_the_list(items in proptest::collection::vec(any::<u16>(), 0..60), size in 1usize..12) {
            let pages = Pagination::new(size);
            let mut rebuilt = Vec::new();
            for index in 0..pages.page_count(items.len()) {
                rebuilt.extend_from_slice(paginate(&items, index, size));
            }
            prop_assert_eq!(rebuilt, items);
        }

        #[test]
        fn size_change_always_resets_index(index in 0usize..50, size in 0usize..50) {
            let mut pages = Pagination::new(10);
            pages.set_index(index);
            pages.set_size(size);
            prop_assert_eq!(pages.index(), 0);
        }
    }
}
