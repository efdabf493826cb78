//! Hosts page: filtered, sorted and paginated host table with row selection,
//! bulk actions and the create/edit, detail and delete dialogs.

use crate::error::ConsoleError;
use crate::pages::Notice;
use futures::future::join_all;
use ipam_client::{Host, HostFilter, HostTag, IpamService, PingResult, Subnet};
use ipam_view::collection::{filter_hosts, filterable_tags, sort_hosts};
use ipam_view::validation::ConflictProbe;
use ipam_view::{ConflictStatus, HostForm, IpConflictChecker, Pagination, QueryCache, SortKey, SortSpec};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Open dialog, if any
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HostDialog {
    #[default]
    Closed,
    /// Create or edit form; `None` when creating
    Form(Option<Host>),
    Detail(Host),
    ConfirmDelete(Host),
}

/// Host form being edited, with its IP conflict check
#[derive(Debug)]
pub struct HostEditor {
    pub form: HostForm,
    existing: Option<Host>,
    checker: IpConflictChecker,
}

impl HostEditor {
    /// Replace the IP field and restart the debounced conflict check
    pub fn set_ip(&mut self, ip: &str) {
        self.form.ip_address = ip.trim().to_string();
        self.checker.input(&self.form.ip_address);
    }

    /// Current state of the conflict check
    pub fn conflict(&self) -> ConflictStatus {
        self.checker.status()
    }

    /// Wait for the conflict check to finish
    pub async fn settle(&self) -> ConflictStatus {
        self.checker.settled().await
    }

    /// Conflict status for the IP now in the form. An IP the checker has not
    /// seen, such as one written straight into `form`, is checked first.
    async fn conflict_for_submit(&mut self) -> ConflictStatus {
        if self.checker.last_input() == Some(self.form.ip_address.as_str()) {
            return self.checker.status();
        }
        self.checker.input(&self.form.ip_address);
        self.checker.settled().await
    }

    /// Host being edited, `None` when creating
    pub fn existing(&self) -> Option<&Host> {
        self.existing.as_ref()
    }
}

/// Per-host outcome of a bulk action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    /// Host id and reason
    pub failed: Vec<(String, String)>,
}

impl BulkReport {
    /// Summary line shown after the action
    pub fn summary(&self) -> String {
        format!("success {}, failure {}", self.succeeded.len(), self.failed.len())
    }
}

/// Hosts page state
#[derive(Debug)]
pub struct HostsPage {
    service: IpamService,
    cache: QueryCache<HostFilter, Vec<Host>>,
    subnets: Vec<Subnet>,
    filter: HostFilter,
    sort: SortSpec,
    pagination: Pagination,
    selection: BTreeSet<String>,
    dialog: HostDialog,
    editor: Option<HostEditor>,
    debounce: Duration,
    notices: Vec<Notice>,
}

impl HostsPage {
    /// Empty page; call [`HostsPage::load`] before reading rows
    pub fn new(service: IpamService, page_size: usize, debounce: Duration) -> Self {
        Self {
            service,
            cache: QueryCache::new(),
            subnets: Vec::new(),
            filter: HostFilter::default(),
            sort: SortSpec::default(),
            pagination: Pagination::new(page_size),
            selection: BTreeSet::new(),
            dialog: HostDialog::Closed,
            editor: None,
            debounce,
            notices: Vec::new(),
        }
    }

    /// Fetch hosts for the active filter and the subnet list, unless cached and fresh
    pub async fn load(&mut self) {
        if !self.cache.needs_fetch(&self.filter) && !self.subnets.is_empty() {
            debug!("hosts for {:?} served from cache", self.filter);
            return;
        }
        let (hosts, subnets) = futures::join!(self.service.hosts(&self.filter), self.service.subnets());
        self.cache.insert(self.filter.clone(), hosts);
        self.subnets = subnets;
    }

    /// Active filter
    pub fn filter(&self) -> &HostFilter {
        &self.filter
    }

    /// Replace the filter; a different filter goes back to the first page
    pub fn set_filter(&mut self, filter: HostFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.pagination.reset();
        }
    }

    /// Change only the free-text search
    pub fn set_search(&mut self, search: &str) {
        let filter = HostFilter {
            search: search.to_string(),
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    /// Active sort
    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Column header click
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort = self.sort.clicked(key);
    }

    /// Set the sort outright
    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    /// Pagination state
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Jump to a page, clamped to the last one
    pub fn set_page(&mut self, index: usize) {
        let last = self.pagination.page_count(self.total()).saturating_sub(1);
        self.pagination.set_index(index.min(last));
    }

    /// Change rows per page; returns to the first page
    pub fn set_page_size(&mut self, size: usize) {
        self.pagination.set_size(size);
    }

    /// Next page, if any
    pub fn next_page(&mut self) {
        let total = self.total();
        self.pagination.next(total);
    }

    /// Previous page, if any
    pub fn previous_page(&mut self) {
        self.pagination.previous();
    }

    fn fetched(&self) -> &[Host] {
        self.cache.get(&self.filter).map(Vec::as_slice).unwrap_or_default()
    }

    /// Filtered and sorted hosts across all pages.
    ///
    /// The filter is re-applied locally since fallback data is unfiltered.
    pub fn rows(&self) -> Vec<Host> {
        let mut rows = filter_hosts(self.fetched(), &self.filter);
        sort_hosts(&mut rows, self.sort);
        rows
    }

    /// Number of rows across all pages
    pub fn total(&self) -> usize {
        self.rows().len()
    }

    /// Rows of the current page
    pub fn page_rows(&self) -> Vec<Host> {
        self.pagination.page(&self.rows()).to_vec()
    }

    /// Subnets offered by the filter and the form
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// Distinct tags across the fetched hosts
    pub fn tags(&self) -> Vec<HostTag> {
        filterable_tags(self.fetched())
    }

    fn find(&self, id: &str) -> Result<Host, ConsoleError> {
        self.fetched()
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| ConsoleError::NotFound(format!("host {}", id)))
    }

    /// Selected host ids
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// Select or deselect one row
    pub fn toggle_row(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    /// Select every row of the current page
    pub fn select_page(&mut self) {
        let ids: Vec<String> = self.page_rows().into_iter().map(|h| h.id).collect();
        self.selection.extend(ids);
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Notices produced so far, oldest first
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    fn notify(&mut self, notice: Notice) -> Notice {
        self.notices.push(notice.clone());
        notice
    }

    /// Ping every selected host
    pub async fn bulk_ping(&mut self) -> (Notice, Vec<PingResult>) {
        if self.selection.is_empty() {
            return (self.notify(Notice::info("Select at least one host to ping")), Vec::new());
        }
        let ids: Vec<String> = self.selection.iter().cloned().collect();
        let results = self.service.bulk_ping(&ids).await;
        let report = BulkReport {
            succeeded: results.iter().filter(|r| r.success).map(|r| r.id.clone()).collect(),
            failed: results
                .iter()
                .filter(|r| !r.success)
                .map(|r| (r.id.clone(), "unreachable".to_string()))
                .collect(),
        };
        info!("bulk ping of {} hosts: {}", ids.len(), report.summary());
        let notice = self.notify(Notice::success("Ping finished").with_detail(report.summary()));
        (notice, results)
    }

    /// Add `tag` to every selected host. Each host is saved on its own and
    /// failures do not stop the others.
    pub async fn bulk_tag(&mut self, tag: HostTag) -> (Notice, BulkReport) {
        if self.selection.is_empty() {
            return (self.notify(Notice::info("Select at least one host to tag")), BulkReport::default());
        }

        let mut report = BulkReport::default();
        let mut pending = Vec::new();
        for id in &self.selection {
            match self.find(id) {
                Ok(host) if host.has_tag(&tag.id) => report.succeeded.push(host.id),
                Ok(mut host) => {
                    host.tags.push(tag.clone());
                    pending.push(host);
                }
                Err(e) => report.failed.push((id.clone(), e.user_message())),
            }
        }

        let service = &self.service;
        let outcomes = join_all(pending.iter().map(|host| service.save_host(host))).await;
        for (host, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.succeeded.push(host.id.clone()),
                Err(e) => report.failed.push((host.id.clone(), e.user_message())),
            }
        }

        if !pending.is_empty() {
            self.cache.invalidate_all();
        }
        let notice = if report.failed.is_empty() {
            Notice::success(format!("Tagged {} hosts with {}", report.succeeded.len(), tag.label))
        } else {
            Notice::error(format!("Tagging with {} partly failed", tag.label), report.summary())
        };
        (self.notify(notice), report)
    }

    /// Open dialog
    pub fn dialog(&self) -> &HostDialog {
        &self.dialog
    }

    /// Open the form for a new host
    pub fn open_create(&mut self) -> &mut HostEditor {
        self.open_form(None)
    }

    /// Open the form prefilled from host `id`
    pub fn open_edit(&mut self, id: &str) -> Result<&mut HostEditor, ConsoleError> {
        let host = self.find(id)?;
        Ok(self.open_form(Some(host)))
    }

    fn open_form(&mut self, existing: Option<Host>) -> &mut HostEditor {
        let form = match &existing {
            Some(host) => HostForm::from_host(host),
            None => HostForm::blank(&self.subnets),
        };
        let probe: Arc<dyn ConflictProbe> = Arc::new(self.service.clone());
        let checker = IpConflictChecker::new(probe, self.debounce, existing.as_ref().map(|h| h.id.clone()));
        self.dialog = HostDialog::Form(existing.clone());
        self.editor.insert(HostEditor {
            form,
            existing,
            checker,
        })
    }

    /// Form being edited
    pub fn editor_mut(&mut self) -> Option<&mut HostEditor> {
        self.editor.as_mut()
    }

    /// Show host `id` read-only
    pub fn open_detail(&mut self, id: &str) -> Result<Host, ConsoleError> {
        let host = self.find(id)?;
        self.editor = None;
        self.dialog = HostDialog::Detail(host.clone());
        Ok(host)
    }

    /// Ask for confirmation before deleting host `id`
    pub fn request_delete(&mut self, id: &str) -> Result<(), ConsoleError> {
        let host = self.find(id)?;
        self.editor = None;
        self.dialog = HostDialog::ConfirmDelete(host);
        Ok(())
    }

    /// Close whatever is open; a pending conflict check is cancelled
    pub fn close_dialog(&mut self) {
        self.editor = None;
        self.dialog = HostDialog::Closed;
    }

    /// Validate and save the open form. On failure the form stays open.
    pub async fn submit(&mut self) -> Result<Host, ConsoleError> {
        let tags = self.tags();
        let Some(editor) = self.editor.as_mut() else {
            return Err(ConsoleError::NotFound("no host form is open".to_string()));
        };
        let conflict = editor.conflict_for_submit().await;
        editor.form.validate_for_submit(conflict)?;

        let host = editor.form.to_host(editor.existing(), &self.subnets, &tags);
        let creating = editor.existing.is_none();
        match self.service.save_host(&host).await {
            Ok(()) => {
                let title = if creating { "Host created" } else { "Host updated" };
                self.notify(Notice::success(title).with_detail(host.hostname.clone()));
                self.cache.invalidate_all();
                self.close_dialog();
                Ok(host)
            }
            Err(e) => {
                self.notify(Notice::error("Failed to save host", e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Delete the host awaiting confirmation
    pub async fn confirm_delete(&mut self) -> Result<Host, ConsoleError> {
        let HostDialog::ConfirmDelete(host) = &self.dialog else {
            return Err(ConsoleError::NotFound("no host awaits deletion".to_string()));
        };
        let host = host.clone();
        match self.service.delete_host(&host.id).await {
            Ok(()) => {
                self.notify(Notice::success("Host deleted").with_detail(host.hostname.clone()));
                self.selection.remove(&host.id);
                self.cache.invalidate_all();
                self.close_dialog();
                Ok(host)
            }
            Err(e) => {
                self.notify(Notice::error("Failed to delete host", e.user_message()));
                Err(e.into())
            }
        }
    }
}
