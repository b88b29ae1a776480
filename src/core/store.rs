//! Paged collection store: the last fetched page of one resource plus the
//! parameters that produced it

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::core::envelope::ListPage;
use crate::core::filter::FilterState;
use crate::core::gateway::{ApiGateway, ListQuery};
use crate::core::pagination::{Pagination, RowsPerPage};
use crate::core::record::{Record, RecordId};

const LOAD_FAILED: &str = "Failed to load data";

/// What the table should render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No fetch attempted yet
    #[default]
    NotLoaded,
    Loading,
    /// Rows available
    Loaded,
    /// Fetch succeeded with zero rows ("no data")
    Empty,
    Failed(String),
}

/// Result of one `fetch()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded(usize),
    Empty,
    Failed(String),
    /// The response arrived after a newer fetch or an unmount and was dropped
    Stale,
}

pub struct PagedCollectionStore<T> {
    resource: String,
    id_field: String,
    gateway: Rc<dyn ApiGateway>,
    pagination: RefCell<Pagination>,
    filters: RefCell<FilterState>,
    items: RefCell<Vec<T>>,
    state: RefCell<LoadState>,
    last_query: RefCell<Option<ListQuery>>,
    generation: Cell<u64>,
    mounted: Cell<bool>,
}

impl<T: Record> PagedCollectionStore<T> {
    pub fn new(gateway: Rc<dyn ApiGateway>, resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id_field: "id".to_string(),
            gateway,
            pagination: RefCell::new(Pagination::default()),
            filters: RefCell::new(FilterState::default()),
            items: RefCell::new(Vec::new()),
            state: RefCell::new(LoadState::NotLoaded),
            last_query: RefCell::new(None),
            generation: Cell::new(0),
            mounted: Cell::new(true),
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    pub fn with_rows_per_page(self, rows: RowsPerPage) -> Self {
        self.pagination.replace(Pagination::new(rows));
        self
    }

    pub fn with_filters(self, filters: FilterState) -> Self {
        self.filters.replace(filters);
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination.borrow().clone()
    }

    pub fn filters(&self) -> FilterState {
        self.filters.borrow().clone()
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Ref<'_, Vec<T>> {
        self.items.borrow()
    }

    /// A row of the loaded page by id
    pub fn find(&self, id: &RecordId) -> Option<T> {
        self.items.borrow().iter().find(|r| r.id() == id).cloned()
    }

    /// Parameters of the most recent fetch
    pub fn last_query(&self) -> Option<ListQuery> {
        self.last_query.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn set_page(&self, page: u32) {
        self.pagination.borrow_mut().set_page(page);
    }

    /// Change page size; the next fetch starts at page 1
    pub fn set_rows_per_page(&self, rows: RowsPerPage) {
        self.pagination.borrow_mut().set_rows_per_page(rows);
    }

    /// Click on a column header
    pub fn set_sort(&self, key: &str) {
        self.pagination.borrow_mut().set_sort(key);
    }

    /// Change search text; back to page 1 when it differs
    pub fn set_search(&self, text: &str) {
        if self.filters.borrow_mut().set_search(text) {
            self.pagination.borrow_mut().set_page(1);
        }
    }

    /// Change a structural filter; returns the dependent filter keys that
    /// were cleared by the cascade (None when the value did not change)
    pub fn set_filter(&self, key: &str, value: &str) -> Option<Vec<String>> {
        let cleared = self.filters.borrow_mut().set(key, value)?;
        self.pagination.borrow_mut().set_page(1);
        Some(cleared)
    }

    /// Query built from the current parameters
    pub fn query(&self) -> ListQuery {
        let pagination = self.pagination.borrow();
        let filters = self.filters.borrow();
        ListQuery {
            page: pagination.page,
            rows: pagination.rows_per_page.get(),
            search: Some(filters.search().to_string()).filter(|s| !s.is_empty()),
            sort_by: pagination.sort_by.clone(),
            sort_direction: pagination.sort_direction,
            filters: filters.values().clone(),
        }
    }

    /// Fetch the page described by the current parameters
    ///
    /// When the server reports that the requested page lies past the end the
    /// page is clamped and the fetch is issued once more.
    pub async fn fetch(&self) -> FetchOutcome {
        let mut retry_after_clamp = true;
        loop {
            let (outcome, clamped) = self.fetch_once().await;
            if clamped && retry_after_clamp {
                retry_after_clamp = false;
                debug!(resource = %self.resource, page = self.pagination.borrow().page, "page clamped, refetching");
                continue;
            }
            return outcome;
        }
    }

    /// Re-issue the fetch with the current parameters (after a mutation)
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    /// Abandon in-flight fetches; late responses will not touch the store
    pub fn unmount(&self) {
        self.mounted.set(false);
        self.generation.set(self.generation.get() + 1);
    }

    async fn fetch_once(&self) -> (FetchOutcome, bool) {
        if !self.mounted.get() {
            return (FetchOutcome::Stale, false);
        }

        let query = self.query();
        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        self.last_query.replace(Some(query.clone()));
        self.state.replace(LoadState::Loading);
        debug!(resource = %self.resource, page = query.page, rows = query.rows, "fetching page");

        let result = self.gateway.list(&self.resource, &query).await;

        if ticket != self.generation.get() || !self.mounted.get() {
            debug!(resource = %self.resource, "dropping stale list response");
            return (FetchOutcome::Stale, false);
        }

        let page = match result {
            Ok(env) if env.status => env.data.unwrap_or_else(|| ListPage {
                items: Vec::new(),
                pagination: Default::default(),
            }),
            Ok(env) => {
                let message = env.message().unwrap_or(LOAD_FAILED).to_string();
                return (self.fail(message), false);
            }
            Err(e) => return (self.fail(e.to_string()), false),
        };

        let items = match page
            .items
            .into_iter()
            .map(|row| T::from_row(row, &self.id_field))
            .collect::<Result<Vec<T>, _>>()
        {
            Ok(items) => items,
            Err(e) => return (self.fail(format!("Unexpected row format: {}", e)), false),
        };

        let count = items.len();
        let clamped = self
            .pagination
            .borrow_mut()
            .apply(&page.pagination, count);
        self.items.replace(items);

        let outcome = if count == 0 {
            self.state.replace(LoadState::Empty);
            FetchOutcome::Empty
        } else {
            self.state.replace(LoadState::Loaded);
            FetchOutcome::Loaded(count)
        };
        (outcome, clamped && count == 0)
    }

    fn fail(&self, message: String) -> FetchOutcome {
        warn!(resource = %self.resource, %message, "list fetch failed");
        self.state.replace(LoadState::Failed(message.clone()));
        FetchOutcome::Failed(message)
    }
}
