//! Drag-and-drop reordering and cross-container moves.
//!
//! [`DragController`] tracks one pointer gesture. While dragging, the drop
//! target is the droppable whose center is nearest to the pointer. Releasing
//! resolves the gesture into a [`DropOutcome`]; applying it to the data is
//! left to [`array_move`] and [`reparent_host`].

use crate::geometry::{Point, Rect};
use ipam_client::{Host, Subnet};
use tracing::debug;

/// Something a dragged item can be dropped on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropId {
    /// A row inside a container, at `index` in display order
    Row {
        container: String,
        item: String,
        index: usize,
    },
    /// A container as a whole (e.g. a subnet card)
    Container(String),
}

impl DropId {
    fn container(&self) -> &str {
        match self {
            DropId::Row { container, .. } => container,
            DropId::Container(container) => container,
        }
    }
}

/// Registered drop zone
#[derive(Debug, Clone, PartialEq)]
pub struct Droppable {
    /// Container or item this zone represents
    pub id: DropId,
    /// Hit area in canvas units
    pub rect: Rect,
}

/// Item being dragged
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    /// Id of the dragged host
    pub item: String,
    /// Container the drag started in
    pub container: String,
    /// Position in that container
    pub index: usize,
    /// Zone currently under the pointer
    pub over: Option<DropId>,
}

/// Gesture state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress
    #[default]
    Idle,
    /// A host is being dragged
    Dragging(ActiveDrag),
}

/// What a release means for the data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Invalid target, drop on self, or drop back on the origin container
    None,
    /// Same container, different position
    Reorder { container: String, from: usize, to: usize },
    /// Different container; `index` is `None` when dropped on the container itself
    Move {
        item: String,
        from: String,
        to: String,
        index: Option<usize>,
    },
}

/// Pointer-drag state machine
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
    droppables: Vec<Droppable>,
}

impl DragController {
    /// Idle controller without drop zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered drop zones (called after every layout)
    pub fn set_droppables(&mut self, droppables: Vec<Droppable>) {
        self.droppables = droppables;
    }

    /// Current gesture state
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Item currently being dragged
    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(active) => Some(active),
            DragState::Idle => None,
        }
    }

    /// Start dragging `item` from `container`; ignored unless idle
    pub fn pointer_down(&mut self, item: &str, container: &str, index: usize) -> bool {
        if !matches!(self.state, DragState::Idle) {
            return false;
        }
        debug!("drag start: {} from {}[{}]", item, container, index);
        self.state = DragState::Dragging(ActiveDrag {
            item: item.to_string(),
            container: container.to_string(),
            index,
            over: None,
        });
        true
    }

    /// Recompute the drop target from the pointer position
    pub fn pointer_move(&mut self, pointer: Point) {
        let over = closest_center(&self.droppables, pointer).cloned();
        if let DragState::Dragging(active) = &mut self.state {
            active.over = over;
        }
    }

    /// End the gesture and resolve it
    pub fn release(&mut self) -> DropOutcome {
        let DragState::Dragging(active) = std::mem::take(&mut self.state) else {
            return DropOutcome::None;
        };
        let outcome = resolve(&active);
        debug!("drag end: {} -> {:?}", active.item, outcome);
        outcome
    }

    /// Abort the gesture without an outcome
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Droppable whose center is nearest to `pointer`; first registered wins ties
pub fn closest_center(droppables: &[Droppable], pointer: Point) -> Option<&DropId> {
    droppables
        .iter()
        .fold(None::<(&Droppable, f64)>, |best, candidate| {
            let distance = candidate.rect.center().distance_squared(pointer);
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((candidate, distance)),
            }
        })
        .map(|(d, _)| &d.id)
}

fn resolve(active: &ActiveDrag) -> DropOutcome {
    let Some(over) = &active.over else {
        return DropOutcome::None;
    };

    if over.container() != active.container {
        return DropOutcome::Move {
            item: active.item.clone(),
            from: active.container.clone(),
            to: over.container().to_string(),
            index: match over {
                DropId::Row { index, .. } => Some(*index),
                DropId::Container(_) => None,
            },
        };
    }

    match over {
        DropId::Row { item, index, .. } if *item != active.item && *index != active.index => DropOutcome::Reorder {
            container: active.container.clone(),
            from: active.index,
            to: *index,
        },
        _ => DropOutcome::None,
    }
}

/// Remove the element at `from` and insert it at `to`; out-of-range is a no-op
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Move `host_id` into `target` subnet, updating member lists and counters.
///
/// The host is inserted at `index` (clamped) or appended. Returns the host as
/// it should be persisted, or `None` when nothing changed: unknown host or
/// subnet, same subnet, or a destination already at capacity.
pub fn reparent_host(subnets: &mut [Subnet], host_id: &str, target: &str, index: Option<usize>) -> Option<Host> {
    let source_pos = subnets.iter().position(|s| s.hosts.iter().any(|h| h.id == host_id))?;
    let target_pos = subnets.iter().position(|s| s.id == target)?;
    if source_pos == target_pos {
        return None;
    }
    let destination = &subnets[target_pos];
    if destination.used_hosts >= destination.total_hosts {
        debug!("subnet {} is full, ignoring move of {}", target, host_id);
        return None;
    }
    let (target_id, target_name) = (destination.id.clone(), destination.name.clone());

    let source = &mut subnets[source_pos];
    let host_index = source.hosts.iter().position(|h| h.id == host_id)?;
    let mut host = source.hosts.remove(host_index);
    source.used_hosts = source.used_hosts.saturating_sub(1);

    host.subnet_id = target_id;
    host.subnet_name = target_name;

    let destination = &mut subnets[target_pos];
    let at = index.unwrap_or(destination.hosts.len()).min(destination.hosts.len());
    destination.hosts.insert(at, host.clone());
    destination.used_hosts += 1;
    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{host, subnet};
    use proptest::prelude::*;

    fn row(container: &str, item: &str, index: usize, y: f64) -> Droppable {
        Droppable {
            id: DropId::Row {
                container: container.to_string(),
                item: item.to_string(),
                index,
            },
            rect: Rect::new(0.0, y, 200.0, 40.0),
        }
    }

    fn rows() -> Vec<Droppable> {
        vec![
            row("a", "h1", 0, 0.0),
            row("a", "h2", 1, 40.0),
            row("a", "h3", 2, 80.0),
            Droppable {
                id: DropId::Container("b".to_string()),
                rect: Rect::new(300.0, 0.0, 200.0, 200.0),
            },
        ]
    }

    #[test]
    fn drop_on_another_row_reorders() {
        let mut dnd = DragController::new();
        dnd.set_droppables(rows());
        assert!(dnd.pointer_down("h1", "a", 0));
        assert!(!dnd.pointer_down("h2", "a", 1));

        dnd.pointer_move(Point::new(100.0, 95.0));
        assert_eq!(
            dnd.active().and_then(|a| a.over.clone()),
            Some(DropId::Row {
                container: "a".to_string(),
                item: "h3".to_string(),
                index: 2
            })
        );
        assert_eq!(
            dnd.release(),
            DropOutcome::Reorder {
                container: "a".to_string(),
                from: 0,
                to: 2
            }
        );
        assert_eq!(dnd.state(), &DragState::Idle);
    }

    #[test]
    fn drop_on_self_or_nowhere_is_a_noop() {
        let mut dnd = DragController::new();
        dnd.set_droppables(rows());
        dnd.pointer_down("h2", "a", 1);
        dnd.pointer_move(Point::new(100.0, 60.0));
        assert_eq!(dnd.release(), DropOutcome::None);

        let mut empty = DragController::new();
        empty.pointer_down("h2", "a", 1);
        empty.pointer_move(Point::new(100.0, 60.0));
        assert_eq!(empty.release(), DropOutcome::None);

        assert_eq!(DragController::new().release(), DropOutcome::None);
    }

    #[test]
    fn drop_on_other_container_moves() {
        let mut dnd = DragController::new();
        dnd.set_droppables(rows());
        dnd.pointer_down("h2", "a", 1);
        dnd.pointer_move(Point::new(420.0, 100.0));
        assert_eq!(
            dnd.release(),
            DropOutcome::Move {
                item: "h2".to_string(),
                from: "a".to_string(),
                to: "b".to_string(),
                index: None
            }
        );
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut dnd = DragController::new();
        dnd.pointer_down("h1", "a", 0);
        dnd.cancel();
        assert!(dnd.active().is_none());
    }

    #[test]
    fn reparent_updates_membership_and_counters() {
        let mut subnets = vec![
            subnet("a", 10, vec![host("h1", "10.0.0.1"), host("h2", "10.0.0.2")]),
            subnet("b", 10, vec![host("h3", "10.0.1.1")]),
        ];
        subnets[0].used_hosts = 2;
        subnets[1].used_hosts = 1;

        let moved = reparent_host(&mut subnets, "h1", "b", Some(0)).unwrap();

        assert_eq!(moved.subnet_id, "b");
        assert_eq!(moved.subnet_name, "Subnet b");
        assert_eq!(subnets[0].used_hosts, 1);
        assert_eq!(subnets[1].used_hosts, 2);
        assert_eq!(subnets[1].hosts[0].id, "h1");
        assert!(subnets[0].hosts.iter().all(|h| h.id != "h1"));
    }

    #[test]
    fn reparent_refuses_same_unknown_or_full_target() {
        let mut subnets = vec![
            subnet("a", 10, vec![host("h1", "10.0.0.1")]),
            subnet("b", 0, Vec::new()),
        ];
        let before = subnets.clone();
        assert!(reparent_host(&mut subnets, "h1", "a", None).is_none());
        assert!(reparent_host(&mut subnets, "h1", "zzz", None).is_none());
        assert!(reparent_host(&mut subnets, "nope", "b", None).is_none());
        assert!(reparent_host(&mut subnets, "h1", "b", None).is_none());
        assert_eq!(subnets, before);
    }

    proptest! {
        #[test]
        fn array_move_is_remove_then_insert(len in 1usize..12, i in 0usize..12, j in 0usize..12) {
            prop_assume!(i < len && j < len);
            let mut items: Vec<usize> = (0..len).collect();
            let mut expected = items.clone();
            let moved = expected.remove(i);
            expected.insert(j, moved);

            array_move(&mut items, i, j);
            prop_assert_eq!(items, expected);
        }

        #[test]
        fn cross_container_move_shifts_exactly_one(a_len in 1usize..6, b_len in 0usize..6, pick in 0usize..6) {
            prop_assume!(pick < a_len);
            let a_hosts: Vec<Host> = (0..a_len).map(|i| host(&format!("a{i}"), "10.0.0.1")).collect();
            let b_hosts: Vec<Host> = (0..b_len).map(|i| host(&format!("b{i}"), "10.0.1.1")).collect();
            let mut subnets = vec![subnet("a", 20, a_hosts), subnet("b", 20, b_hosts)];
            subnets[0].used_hosts = a_len as u32;
            subnets[1].used_hosts = b_len as u32;

            let id = format!("a{pick}");
            let moved = reparent_host(&mut subnets, &id, "b", None).unwrap();

            prop_assert_eq!(moved.subnet_id.as_str(), "b");
            prop_assert_eq!(subnets[0].used_hosts, a_len as u32 - 1);
            prop_assert_eq!(subnets[1].used_hosts, b_len as u32 + 1);
            prop_assert_eq!(subnets[0].hosts.len() + subnets[1].hosts.len(), a_len + b_len);
        }
    }
}
