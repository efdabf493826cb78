//! Subnets page: subnet cards, the member table of the selected subnet,
//! drag-and-drop reorder and cross-subnet moves, subnet dialogs and the
//! topology canvases.

use crate::error::ConsoleError;
use crate::pages::Notice;
use ipam_client::{Host, IpamService, Subnet};
use ipam_view::collection::filter_subnets;
use ipam_view::dnd::{DropId, Droppable, array_move, reparent_host};
use ipam_view::topology::LayoutKind;
use ipam_view::{DragController, DropOutcome, QueryCache, Rect, SubnetForm, TopologyState};
use tracing::{debug, info, warn};

const SUBNETS: &str = "subnets";

/// Card geometry used when registering drop zones
const CARD_WIDTH: f64 = 320.0;
const CARD_HEIGHT: f64 = 140.0;
const CARD_GAP: f64 = 20.0;
const TABLE_LEFT: f64 = CARD_WIDTH + 3.0 * CARD_GAP;
const ROW_WIDTH: f64 = 640.0;
const ROW_HEIGHT: f64 = 44.0;

/// Open dialog, if any
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubnetDialog {
    #[default]
    Closed,
    /// Create or edit form; `None` when creating
    Form(Option<Subnet>),
    ConfirmDelete(Subnet),
}

/// Subnets page state
#[derive(Debug)]
pub struct SubnetsPage {
    service: IpamService,
    cache: QueryCache<&'static str, Vec<Subnet>>,
    search: String,
    selected: Option<String>,
    drag: DragController,
    dialog: SubnetDialog,
    form: Option<SubnetForm>,
    topology: Option<TopologyState>,
    notices: Vec<Notice>,
}

impl SubnetsPage {
    /// Empty page; call [`SubnetsPage::load`] first
    pub fn new(service: IpamService) -> Self {
        Self {
            service,
            cache: QueryCache::new(),
            search: String::new(),
            selected: None,
            drag: DragController::new(),
            dialog: SubnetDialog::Closed,
            form: None,
            topology: None,
            notices: Vec::new(),
        }
    }

    /// Fetch subnets unless cached and fresh; keeps the selection when it still exists
    pub async fn load(&mut self) {
        if self.cache.needs_fetch(&SUBNETS) {
            let subnets = self.service.subnets().await;
            self.cache.insert(SUBNETS, subnets);
        }
        let all = self.all();
        let keep = self.selected.as_ref().is_some_and(|id| all.iter().any(|s| &s.id == id));
        if !keep {
            self.selected = all.first().map(|s| s.id.clone());
        }
        self.register_droppables();
    }

    fn all(&self) -> &[Subnet] {
        self.cache.get(&SUBNETS).map(Vec::as_slice).unwrap_or_default()
    }

    /// Subnet cards matching the search
    pub fn subnets(&self) -> Vec<Subnet> {
        filter_subnets(self.all(), &self.search)
    }

    /// Filter the cards by name or CIDR
    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    /// Subnet whose hosts are listed
    pub fn selected(&self) -> Option<&Subnet> {
        let id = self.selected.as_deref()?;
        self.all().iter().find(|s| s.id == id)
    }

    /// Select a subnet card
    pub fn select(&mut self, id: &str) -> Result<(), ConsoleError> {
        if !self.all().iter().any(|s| s.id == id) {
            return Err(ConsoleError::NotFound(format!("subnet {}", id)));
        }
        self.selected = Some(id.to_string());
        self.register_droppables();
        Ok(())
    }

    /// Notices produced so far, oldest first
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drop zones: one card per subnet in a column, then one row per host of
    /// the selected subnet beside it
    pub fn droppables(&self) -> Vec<Droppable> {
        let mut zones: Vec<Droppable> = self
            .all()
            .iter()
            .enumerate()
            .map(|(i, subnet)| Droppable {
                id: DropId::Container(subnet.id.clone()),
                rect: Rect::new(0.0, i as f64 * (CARD_HEIGHT + CARD_GAP), CARD_WIDTH, CARD_HEIGHT),
            })
            .collect();
        if let Some(subnet) = self.selected() {
            zones.extend(subnet.hosts.iter().enumerate().map(|(i, host)| Droppable {
                id: DropId::Row {
                    container: subnet.id.clone(),
                    item: host.id.clone(),
                    index: i,
                },
                rect: Rect::new(TABLE_LEFT, i as f64 * ROW_HEIGHT, ROW_WIDTH, ROW_HEIGHT),
            }));
        }
        zones
    }

    fn register_droppables(&mut self) {
        let zones = self.droppables();
        self.drag.set_droppables(zones);
    }

    /// Pointer-drag state machine over the registered drop zones
    pub fn drag(&mut self) -> &mut DragController {
        &mut self.drag
    }

    /// Start dragging row `index` of the selected subnet
    pub fn begin_drag(&mut self, index: usize) -> bool {
        let Some(subnet) = self.selected() else {
            return false;
        };
        let Some(host) = subnet.hosts.get(index) else {
            return false;
        };
        let (item, container) = (host.id.clone(), subnet.id.clone());
        self.drag.pointer_down(&item, &container, index)
    }

    /// Release the drag and apply its outcome
    pub async fn finish_drag(&mut self) -> Result<DropOutcome, ConsoleError> {
        let outcome = self.drag.release();
        match &outcome {
            DropOutcome::None => {}
            DropOutcome::Reorder { container, from, to } => self.reorder(container, *from, *to),
            DropOutcome::Move { item, to, index, .. } => {
                self.move_host(item, to, *index).await?;
            }
        }
        Ok(outcome)
    }

    /// Local display reorder inside one subnet; nothing is persisted
    pub fn reorder(&mut self, subnet_id: &str, from: usize, to: usize) {
        let patched = self.cache.update(&SUBNETS, |subnets| {
            if let Some(subnet) = subnets.iter_mut().find(|s| s.id == subnet_id) {
                array_move(&mut subnet.hosts, from, to);
            }
        });
        if patched {
            debug!("reordered {} rows {} -> {}", subnet_id, from, to);
            self.register_droppables();
        }
    }

    /// Move a host into another subnet.
    ///
    /// The cached subnets are patched first. On success the patch is kept and
    /// the cache refetches on the next load; on failure it is rolled back and
    /// the subnets are refetched right away. Returns `None` when the move
    /// changes nothing (same subnet, unknown ids, destination full).
    pub async fn move_host(
        &mut self,
        host_id: &str,
        target: &str,
        index: Option<usize>,
    ) -> Result<Option<Host>, ConsoleError> {
        let mut preview = self.all().to_vec();
        let Some(host) = reparent_host(&mut preview, host_id, target, index) else {
            self.notify(Notice::info("Host was not moved").with_detail(format!("{} -> {}", host_id, target)));
            return Ok(None);
        };

        let snapshot = self.cache.apply_optimistic(&[SUBNETS], |subnets| *subnets = preview.clone());
        self.register_droppables();

        match self.service.save_host(&host).await {
            Ok(()) => {
                self.cache.commit(snapshot);
                info!("moved host {} to subnet {}", host.id, target);
                self.notify(Notice::success("Host moved").with_detail(format!("{} -> {}", host.hostname, host.subnet_name)));
                Ok(Some(host))
            }
            Err(e) => {
                self.cache.rollback(snapshot);
                warn!("moving host {} failed, restoring subnets: {}", host.id, e);
                self.notify(Notice::error("Failed to move host", e.user_message()));
                self.load().await;
                Err(e.into())
            }
        }
    }

    /// Open dialog
    pub fn dialog(&self) -> &SubnetDialog {
        &self.dialog
    }

    /// Open the form for a new subnet
    pub fn open_create(&mut self) -> &mut SubnetForm {
        self.open_form(None)
    }

    /// Open the form prefilled from subnet `id`
    pub fn open_edit(&mut self, id: &str) -> Result<&mut SubnetForm, ConsoleError> {
        let subnet = self.find(id)?;
        Ok(self.open_form(Some(subnet)))
    }

    fn open_form(&mut self, existing: Option<Subnet>) -> &mut SubnetForm {
        let form = existing.as_ref().map(SubnetForm::from_subnet).unwrap_or_default();
        self.dialog = SubnetDialog::Form(existing);
        self.form.insert(form)
    }

    /// Form being edited
    pub fn form_mut(&mut self) -> Option<&mut SubnetForm> {
        self.form.as_mut()
    }

    fn find(&self, id: &str) -> Result<Subnet, ConsoleError> {
        self.all()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ConsoleError::NotFound(format!("subnet {}", id)))
    }

    /// Ask for confirmation before deleting subnet `id`
    pub fn request_delete(&mut self, id: &str) -> Result<(), ConsoleError> {
        let subnet = self.find(id)?;
        self.form = None;
        self.dialog = SubnetDialog::ConfirmDelete(subnet);
        Ok(())
    }

    /// Close whatever is open
    pub fn close_dialog(&mut self) {
        self.form = None;
        self.dialog = SubnetDialog::Closed;
    }

    /// Validate and save the open form. On failure the form stays open.
    pub async fn submit(&mut self) -> Result<Subnet, ConsoleError> {
        let (SubnetDialog::Form(existing), Some(form)) = (&self.dialog, &self.form) else {
            return Err(ConsoleError::NotFound("no subnet form is open".to_string()));
        };
        form.validate()?;
        let subnet = form.to_subnet(existing.as_ref());
        let creating = existing.is_none();

        match self.service.save_subnet(&subnet).await {
            Ok(()) => {
                let title = if creating { "Subnet created" } else { "Subnet updated" };
                self.notify(Notice::success(title).with_detail(subnet.name.clone()));
                self.cache.invalidate(&SUBNETS);
                self.close_dialog();
                Ok(subnet)
            }
            Err(e) => {
                self.notify(Notice::error("Failed to save subnet", e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Delete the subnet awaiting confirmation
    pub async fn confirm_delete(&mut self) -> Result<Subnet, ConsoleError> {
        let SubnetDialog::ConfirmDelete(subnet) = &self.dialog else {
            return Err(ConsoleError::NotFound("no subnet awaits deletion".to_string()));
        };
        let subnet = subnet.clone();
        match self.service.delete_subnet(&subnet.id).await {
            Ok(()) => {
                self.notify(Notice::success("Subnet deleted").with_detail(subnet.name.clone()));
                self.cache.invalidate(&SUBNETS);
                self.close_dialog();
                Ok(subnet)
            }
            Err(e) => {
                self.notify(Notice::error("Failed to delete subnet", e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Build a topology canvas over the cached subnets and their hosts
    pub fn open_topology(&mut self, kind: LayoutKind) -> &mut TopologyState {
        let subnets = self.all();
        let hosts: Vec<Host> = subnets.iter().flat_map(|s| s.hosts.iter().cloned()).collect();
        let state = match kind {
            LayoutKind::HostGraph => TopologyState::host_graph(&hosts),
            LayoutKind::SubnetAreas => TopologyState::subnet_areas(subnets, &hosts),
        };
        self.topology.insert(state)
    }

    /// Open topology canvas, if any
    pub fn topology(&self) -> Option<&TopologyState> {
        self.topology.as_ref()
    }

    /// Discard the canvas; positions are never persisted
    pub fn close_topology(&mut self) {
        self.topology = None;
    }
}
