//! Rack slot bookkeeping.
//!
//! U slots are numbered from 1 at the bottom. A host at `rack_position` p
//! with height u occupies slots p..=p+u-1.

use crate::error::RackError;
use ipam_client::{Host, Rack};
use std::collections::HashMap;

/// Physical hosts mounted in `rack_id`, top slot first
pub fn hosts_in_rack<'a>(hosts: &'a [Host], rack_id: &str) -> Vec<&'a Host> {
    let mut mounted: Vec<&Host> = hosts
        .iter()
        .filter(|h| h.rack_id.as_deref() == Some(rack_id) && h.rack_position.is_some())
        .collect();
    mounted.sort_by(|a, b| b.rack_position.cmp(&a.rack_position));
    mounted
}

/// Units taken by hosts in `rack_id`
pub fn used_units(hosts: &[Host], rack_id: &str) -> u32 {
    hosts_in_rack(hosts, rack_id)
        .iter()
        .map(|h| u32::from(h.rack_units()))
        .sum()
}

/// Slot-by-slot view of one rack
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMap<'a> {
    slots: Vec<Option<&'a Host>>,
}

impl<'a> SlotMap<'a> {
    /// Build the map; slots outside the rack and later overlapping hosts are ignored
    pub fn new(rack: &Rack, hosts: &'a [Host]) -> Self {
        let mut slots = vec![None; usize::from(rack.total_units)];
        let mut mounted = hosts_in_rack(hosts, &rack.id);
        mounted.reverse();
        for host in mounted {
            for slot in occupied_slots(host) {
                let index = usize::from(slot) - 1;
                if let Some(cell) = slots.get_mut(index)
                    && cell.is_none()
                {
                    *cell = Some(host);
                }
            }
        }
        Self { slots }
    }

    /// Host in slot `unit` (1-based)
    pub fn get(&self, unit: u8) -> Option<&'a Host> {
        usize::from(unit)
            .checked_sub(1)
            .and_then(|i| self.slots.get(i).copied().flatten())
    }

    /// Number of occupied slots
    pub fn used(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Free slot numbers, bottom first
    pub fn free_units(&self) -> Vec<u8> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .filter_map(|(i, _)| u8::try_from(i + 1).ok())
            .collect()
    }

    /// Percentage of occupied slots
    pub fn usage_percent(&self) -> u32 {
        if self.slots.is_empty() {
            return 0;
        }
        ((self.used() as f64 / self.slots.len() as f64) * 100.0).round() as u32
    }
}

fn occupied_slots(host: &Host) -> impl Iterator<Item = u8> {
    let first = host.rack_position.unwrap_or(1).max(1);
    let units = host.rack_units();
    (0..units).filter_map(move |offset| first.checked_add(offset))
}

/// Check that every host in `rack` fits inside it and no two hosts share a slot
pub fn validate_rack(rack: &Rack, hosts: &[Host]) -> Vec<RackError> {
    let mut errors = Vec::new();
    let mut taken: HashMap<u8, &str> = HashMap::new();
    let mut mounted = hosts_in_rack(hosts, &rack.id);
    mounted.reverse();

    for host in mounted {
        let first = u16::from(host.rack_position.unwrap_or(0));
        let last = first + u16::from(host.rack_units()) - 1;
        if first < 1 || last > u16::from(rack.total_units) {
            errors.push(RackError::OutOfRange {
                rack: rack.id.clone(),
                host: host.id.clone(),
                first,
                last,
                total: rack.total_units,
            });
            continue;
        }
        for slot in occupied_slots(host) {
            if let Some(other) = taken.insert(slot, host.id.as_str()) {
                errors.push(RackError::Overlap {
                    rack: rack.id.clone(),
                    host: host.id.clone(),
                    other: other.to_string(),
                    slot,
                });
                break;
            }
        }
    }
    errors
}

/// Check that every parented VM points at an existing physical host
pub fn validate_parents(hosts: &[Host]) -> Vec<RackError> {
    hosts
        .iter()
        .filter(|h| h.is_vm())
        .filter_map(|vm| {
            let parent = vm.parent_host_id.as_deref().filter(|p| !p.is_empty())?;
            let valid = hosts.iter().any(|h| h.id == parent && h.is_physical());
            (!valid).then(|| RackError::InvalidParent {
                vm: vm.id.clone(),
                parent: parent.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{physical, vm};
    use ipam_client::fallback;

    fn mounted(id: &str, position: u8, units: u8) -> Host {
        let mut host = physical(id, "s1");
        host.rack_id = Some("r1".to_string());
        host.rack_position = Some(position);
        host.rack_units = Some(units);
        host
    }

    fn rack(total: u8) -> Rack {
        Rack {
            id: "r1".to_string(),
            name: "R1".to_string(),
            location: "Lab".to_string(),
            total_units: total,
            used_units: 0,
            power_capacity: 5000,
            description: None,
            color: None,
        }
    }

    #[test]
    fn hosts_are_listed_top_down() {
        let hosts = vec![mounted("low", 1, 1), mounted("high", 30, 2), mounted("mid", 10, 4)];
        let ids: Vec<_> = hosts_in_rack(&hosts, "r1").iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["high", "mid", "low"]);
        assert_eq!(used_units(&hosts, "r1"), 7);
    }

    #[test]
    fn slot_map_covers_multi_unit_hosts() {
        let hosts = vec![mounted("a", 1, 2), mounted("b", 5, 1)];
        let rack = rack(6);
        let map = SlotMap::new(&rack, &hosts);
        assert_eq!(map.get(2).map(|h| h.id.as_str()), Some("a"));
        assert!(map.get(3).is_none());
        assert!(map.get(0).is_none());
        assert_eq!(map.used(), 3);
        assert_eq!(map.free_units(), [3, 4, 6]);
        assert_eq!(map.usage_percent(), 50);
    }

    #[test]
    fn overlap_and_range_are_reported() {
        let hosts = vec![mounted("a", 10, 4), mounted("b", 12, 1), mounted("c", 42, 2)];
        let errors = validate_rack(&rack(42), &hosts);
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], RackError::Overlap { host, other, slot: 12, .. } if host == "b" && other == "a"));
        assert!(matches!(&errors[1], RackError::OutOfRange { first: 42, last: 43, total: 42, .. }));
    }

    #[test]
    fn bundled_racks_are_consistent() {
        let hosts = fallback::hosts();
        for rack in fallback::racks() {
            assert!(validate_rack(&rack, &hosts).is_empty());
            assert_eq!(u32::from(rack.used_units), used_units(&hosts, &rack.id));
        }
        assert!(validate_parents(&hosts).is_empty());
    }

    #[test]
    fn vm_parent_must_be_physical() {
        let hosts = vec![
            physical("p1", "s1"),
            vm("ok", "s1", Some("p1")),
            vm("dangling", "s1", Some("gone")),
            vm("nested", "s1", Some("ok")),
            vm("orphan", "s1", None),
        ];
        let bad: Vec<_> = validate_parents(&hosts)
            .into_iter()
            .map(|e| match e {
                RackError::InvalidParent { vm, .. } => vm,
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(bad, ["dangling", "nested"]);
    }
}
