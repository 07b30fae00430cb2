//! State controller for the browsable product list.
//!
//! # Design
//! The controller is an actor task: commands arrive on an mpsc channel, the
//! view-model is published through a watch channel, and the renderer never
//! touches controller internals. Three event sources feed one `select!` loop:
//! UI commands, the search debounce deadline, and completed list requests.
//!
//! Free-text search is debounced by a single cancellable one-shot — every
//! keystroke overwrites the pending value and pushes the deadline out; only
//! the value that survives a quiet window is committed.
//!
//! Overlapping list requests are tagged with a monotonically increasing
//! generation. A completed request whose generation is not the latest issued
//! is discarded, so a slow stale response can never overwrite the result of a
//! newer query. The query itself is replaced as a whole snapshot on every
//! change; a request built from one snapshot cannot be mutated after dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::Transport;
use crate::repository::ProductRepository;
use crate::types::{Product, ProductQuery, ProductsResponse, SortField, SortOrder};

/// Quiet interval a search keystroke must survive before it is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(700);

const LOAD_ERROR: &str = "Failed to load products";
const COMMAND_BUFFER: usize = 16;

/// Commands the renderer can send to the list controller.
#[derive(Debug, Clone)]
pub enum ListCommand {
    /// A free-text search keystroke. Debounced.
    SearchInput(String),
    /// Category filter change. Applied immediately, resets to page 1.
    SetCategory(Option<String>),
    /// Sort field change. Applied immediately, resets to page 1.
    SetSort(SortField),
    /// Sort direction change. Applied immediately, resets to page 1.
    SetOrder(SortOrder),
    NextPage,
    /// No-op when already on page 1.
    PrevPage,
}

/// Everything the renderer needs to draw the list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewModel {
    /// Snapshot of the query the newest issued request was built from.
    pub query: ProductQuery,
    pub products: Vec<Product>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
    /// Whether a subsequent page would hold at least one more item.
    pub has_next: bool,
}

impl Default for ListViewModel {
    fn default() -> Self {
        Self {
            query: ProductQuery::default(),
            products: Vec::new(),
            total_count: 0,
            loading: false,
            error: None,
            has_next: false,
        }
    }
}

impl ListViewModel {
    /// Total page count, never zero even for an empty result set.
    pub fn total_pages(&self) -> u64 {
        if self.total_count == 0 {
            return 1;
        }
        let limit = u64::from(self.query.limit.max(1));
        self.total_count.div_ceil(limit)
    }
}

/// Renderer-facing handle: sends commands, observes the view-model.
///
/// Commands sent after the controller task has shut down are dropped.
#[derive(Debug, Clone)]
pub struct ListHandle {
    commands: mpsc::Sender<ListCommand>,
    view: watch::Receiver<ListViewModel>,
}

impl ListHandle {
    pub fn view(&self) -> watch::Receiver<ListViewModel> {
        self.view.clone()
    }

    pub async fn search_input(&self, text: impl Into<String>) {
        self.send(ListCommand::SearchInput(text.into())).await;
    }

    pub async fn set_category(&self, category: Option<String>) {
        self.send(ListCommand::SetCategory(category)).await;
    }

    pub async fn set_sort(&self, field: SortField) {
        self.send(ListCommand::SetSort(field)).await;
    }

    pub async fn set_order(&self, order: SortOrder) {
        self.send(ListCommand::SetOrder(order)).await;
    }

    pub async fn next_page(&self) {
        self.send(ListCommand::NextPage).await;
    }

    pub async fn prev_page(&self) {
        self.send(ListCommand::PrevPage).await;
    }

    async fn send(&self, command: ListCommand) {
        let _ = self.commands.send(command).await;
    }
}

struct PendingSearch {
    value: String,
    deadline: Instant,
}

/// Actor owning the list view state. Construct with [`ListController::new`],
/// then drive it with `tokio::spawn(controller.run())`.
pub struct ListController<T: Transport> {
    repository: Arc<ProductRepository<T>>,
    commands: mpsc::Receiver<ListCommand>,
    view: watch::Sender<ListViewModel>,
    query: ProductQuery,
    pending_search: Option<PendingSearch>,
    generation: u64,
    in_flight: JoinSet<(u64, Result<ProductsResponse, ApiError>)>,
}

impl<T: Transport> ListController<T> {
    pub fn new(repository: Arc<ProductRepository<T>>) -> (Self, ListHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(ListViewModel::default());
        let controller = Self {
            repository,
            commands: command_rx,
            view: view_tx,
            query: ProductQuery::default(),
            pending_search: None,
            generation: 0,
            in_flight: JoinSet::new(),
        };
        let handle = ListHandle {
            commands: command_tx,
            view: view_rx,
        };
        (controller, handle)
    }

    /// Event loop. Loads the first page immediately, then reacts to commands,
    /// the debounce deadline, and completed requests until every handle is
    /// dropped.
    pub async fn run(mut self) {
        self.reload();
        loop {
            let debounce_deadline = self.pending_search.as_ref().map(|p| p.deadline);
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = sleep_until(debounce_deadline.unwrap_or_else(Instant::now)),
                    if debounce_deadline.is_some() =>
                {
                    self.commit_search();
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((generation, result)) => self.apply(generation, result),
                        // A panicked request task cannot be applied; the loop
                        // stays alive and `loading` stays set.
                        Err(error) => warn!(%error, "list request task failed"),
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: ListCommand) {
        match command {
            ListCommand::SearchInput(value) => {
                // Cancel-and-reschedule: the newest keystroke owns the timer.
                self.pending_search = Some(PendingSearch {
                    value,
                    deadline: Instant::now() + SEARCH_DEBOUNCE,
                });
            }
            ListCommand::SetCategory(category) => {
                self.query = ProductQuery {
                    category,
                    page: 1,
                    ..self.query.clone()
                };
                self.reload();
            }
            ListCommand::SetSort(field) => {
                self.query = ProductQuery {
                    sort_by: Some(field),
                    page: 1,
                    ..self.query.clone()
                };
                self.reload();
            }
            ListCommand::SetOrder(order) => {
                self.query = ProductQuery {
                    order: Some(order),
                    page: 1,
                    ..self.query.clone()
                };
                self.reload();
            }
            ListCommand::NextPage => {
                self.query = ProductQuery {
                    page: self.query.page + 1,
                    ..self.query.clone()
                };
                self.reload();
            }
            ListCommand::PrevPage => {
                if self.query.page > 1 {
                    self.query = ProductQuery {
                        page: self.query.page - 1,
                        ..self.query.clone()
                    };
                    self.reload();
                }
            }
        }
    }

    /// The debounce deadline elapsed: apply the pending search value.
    fn commit_search(&mut self) {
        let Some(pending) = self.pending_search.take() else {
            return;
        };
        let value = if pending.value.is_empty() {
            None
        } else {
            Some(pending.value)
        };
        if value == self.query.search {
            debug!("debounced search unchanged, skipping reload");
            return;
        }
        self.query = ProductQuery {
            search: value,
            page: 1,
            ..self.query.clone()
        };
        self.reload();
    }

    /// Issue a list request for the current query snapshot.
    fn reload(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let repository = Arc::clone(&self.repository);
        let query = self.query.clone();
        debug!(generation, page = query.page, "loading products");
        self.in_flight.spawn(async move {
            let result = repository.list(&query).await;
            (generation, result)
        });
        let snapshot = self.query.clone();
        self.view.send_modify(|vm| {
            vm.query = snapshot;
            vm.loading = true;
            vm.error = None;
        });
    }

    /// Apply a completed request, unless a newer one has been issued since.
    fn apply(&mut self, generation: u64, result: Result<ProductsResponse, ApiError>) {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "discarding stale response");
            return;
        }
        let page = u64::from(self.query.page);
        let limit = u64::from(self.query.limit);
        self.view.send_modify(|vm| {
            vm.loading = false;
            match result {
                Ok(response) => {
                    vm.total_count = response.total_count;
                    vm.has_next = page * limit < response.total_count;
                    vm.products = response.items;
                    vm.error = None;
                }
                Err(error) => {
                    warn!(%error, "product list load failed");
                    // Stale results stay visible; only the flag changes.
                    vm.error = Some(LOAD_ERROR.to_string());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse, TransportFailure};
    use crate::types::Currency;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that records every request and replays scripted outcomes,
    /// each after an optional delay. An empty script answers with an empty
    /// page.
    #[derive(Default)]
    struct FakeTransport {
        requests: Mutex<Vec<HttpRequest>>,
        script: Mutex<VecDeque<(Duration, Result<HttpResponse, TransportFailure>)>>,
    }

    impl FakeTransport {
        fn push(&self, delay: Duration, outcome: Result<HttpResponse, TransportFailure>) {
            self.script.lock().unwrap().push_back((delay, outcome));
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().unwrap().clone()
        }
    }

    impl Transport for Arc<FakeTransport> {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> Result<HttpResponse, TransportFailure> {
            self.requests.lock().unwrap().push(request);
            let scripted = self.script.lock().unwrap().pop_front();
            match scripted {
                Some((delay, outcome)) => {
                    tokio::time::sleep(delay).await;
                    outcome
                }
                None => Ok(list_response(Vec::new(), 0)),
            }
        }
    }

    fn product(id: u64, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            price: 10.0,
            currency: Currency::Usd,
            category: None,
            stock: 1,
            is_active: true,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    fn list_response(items: Vec<Product>, total: u64) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![("X-Total-Count".to_string(), total.to_string())],
            body: serde_json::to_string(&items).unwrap(),
        }
    }

    fn start() -> (Arc<FakeTransport>, ListHandle) {
        let transport = Arc::new(FakeTransport::default());
        let repository = Arc::new(ProductRepository::new(
            "http://localhost:3000",
            Arc::clone(&transport),
        ));
        let (controller, handle) = ListController::new(repository);
        tokio::spawn(controller.run());
        (transport, handle)
    }

    async fn wait_for(
        view: &mut watch::Receiver<ListViewModel>,
        mut pred: impl FnMut(&ListViewModel) -> bool,
    ) {
        loop {
            if pred(&view.borrow()) {
                return;
            }
            view.changed().await.unwrap();
        }
    }

    /// Observe one full load cycle: loading goes up, then back down.
    async fn settle_after_load(view: &mut watch::Receiver<ListViewModel>) {
        wait_for(view, |vm| vm.loading).await;
        wait_for(view, |vm| !vm.loading).await;
    }

    fn query_param(request: &HttpRequest, key: &str) -> Option<String> {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn loads_first_page_on_startup() {
        let (transport, handle) = start();
        let mut view = handle.view();

        settle_after_load(&mut view).await;
        assert_eq!(transport.request_count(), 1);
        let request = transport.last_request();
        assert_eq!(query_param(&request, "_start"), Some("0".to_string()));
        assert_eq!(query_param(&request, "_end"), Some("4".to_string()));
        assert_eq!(query_param(&request, "_sort"), Some("createdAt".to_string()));
        assert_eq!(query_param(&request, "_order"), Some("desc".to_string()));
        assert_eq!(query_param(&request, "q"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn has_next_follows_total_count() {
        let (transport, handle) = start();
        transport.push(
            Duration::ZERO,
            Ok(list_response(vec![product(1, "Mouse")], 42)),
        );
        let mut view = handle.view();

        wait_for(&mut view, |vm| !vm.loading && vm.total_count == 42).await;
        let vm = view.borrow().clone();
        // page 1 * limit 4 < 42
        assert!(vm.has_next);
        assert_eq!(vm.products.len(), 1);
        assert_eq!(vm.total_pages(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_keeps_only_the_last_keystroke() {
        let (transport, handle) = start();
        let mut view = handle.view();
        settle_after_load(&mut view).await;

        handle.search_input("m").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.search_input("mo").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.search_input("mouse").await;
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(100)).await;

        wait_for(&mut view, |vm| {
            !vm.loading && vm.query.search.as_deref() == Some("mouse")
        })
        .await;
        // Initial load plus exactly one debounced search reload.
        assert_eq!(transport.request_count(), 2);
        let request = transport.last_request();
        assert_eq!(query_param(&request, "q"), Some("mouse".to_string()));
        assert_eq!(query_param(&request, "_start"), Some("0".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_debounced_value_does_not_reload() {
        let (transport, handle) = start();
        let mut view = handle.view();
        settle_after_load(&mut view).await;

        handle.search_input("mouse").await;
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(100)).await;
        wait_for(&mut view, |vm| {
            !vm.loading && vm.query.search.as_deref() == Some("mouse")
        })
        .await;
        assert_eq!(transport.request_count(), 2);

        handle.search_input("mouse").await;
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn category_change_resets_to_page_one() {
        let (transport, handle) = start();
        let mut view = handle.view();
        settle_after_load(&mut view).await;

        handle.next_page().await;
        handle.next_page().await;
        wait_for(&mut view, |vm| !vm.loading && vm.query.page == 3).await;

        handle.set_category(Some("Audio".to_string())).await;
        wait_for(&mut view, |vm| {
            !vm.loading && vm.query.category.as_deref() == Some("Audio")
        })
        .await;

        let vm = view.borrow().clone();
        assert_eq!(vm.query.page, 1);
        // Initial load, two pagination loads, one category load.
        assert_eq!(transport.request_count(), 4);
        let request = transport.last_request();
        assert_eq!(query_param(&request, "category"), Some("Audio".to_string()));
        assert_eq!(query_param(&request, "_start"), Some("0".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn prev_page_is_a_no_op_on_page_one() {
        let (transport, handle) = start();
        let mut view = handle.view();
        settle_after_load(&mut view).await;
        assert_eq!(transport.request_count(), 1);

        handle.prev_page().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::task::yield_now().await;

        assert_eq!(transport.request_count(), 1);
        assert_eq!(view.borrow().query.page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prev_page_walks_back_from_page_two() {
        let (transport, handle) = start();
        let mut view = handle.view();
        settle_after_load(&mut view).await;

        handle.next_page().await;
        wait_for(&mut view, |vm| !vm.loading && vm.query.page == 2).await;
        handle.prev_page().await;
        wait_for(&mut view, |vm| !vm.loading && vm.query.page == 1).await;
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let (transport, handle) = start();
        // Page 1 answers slowly with stale data; page 2 answers fast.
        transport.push(
            Duration::from_millis(500),
            Ok(list_response(vec![product(1, "Stale")], 42)),
        );
        transport.push(
            Duration::from_millis(50),
            Ok(list_response(vec![product(2, "Fresh")], 40)),
        );
        let mut view = handle.view();

        handle.next_page().await;
        wait_for(&mut view, |vm| !vm.loading && !vm.products.is_empty()).await;
        assert_eq!(view.borrow().products[0].name, "Fresh");

        // Let the slow page-1 response arrive; it must not overwrite.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        let vm = view.borrow().clone();
        assert_eq!(vm.products[0].name, "Fresh");
        assert_eq!(vm.total_count, 40);
        assert!(!vm.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_stale_results_visible() {
        let (transport, handle) = start();
        transport.push(
            Duration::ZERO,
            Ok(list_response(vec![product(1, "Mouse")], 1)),
        );
        let mut view = handle.view();
        wait_for(&mut view, |vm| !vm.loading && vm.products.len() == 1).await;

        transport.push(
            Duration::ZERO,
            Err(TransportFailure::Unreachable {
                detail: "connection refused".to_string(),
            }),
        );
        handle.next_page().await;
        wait_for(&mut view, |vm| !vm.loading && vm.error.is_some()).await;

        let vm = view.borrow().clone();
        assert_eq!(vm.error.as_deref(), Some("Failed to load products"));
        assert_eq!(vm.products.len(), 1);
        assert_eq!(vm.total_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicked_request_task_does_not_kill_the_loop() {
        struct FaultyTransport;

        impl Transport for FaultyTransport {
            async fn execute(
                &self,
                _request: HttpRequest,
            ) -> Result<HttpResponse, TransportFailure> {
                panic!("request task blew up");
            }
        }

        let repository = Arc::new(ProductRepository::new(
            "http://localhost:3000",
            FaultyTransport,
        ));
        let (controller, handle) = ListController::new(repository);
        tokio::spawn(controller.run());
        let mut view = handle.view();

        wait_for(&mut view, |vm| vm.loading).await;
        // Let the startup request panic and be joined, then prove the loop
        // still processes commands.
        tokio::task::yield_now().await;
        handle.next_page().await;
        wait_for(&mut view, |vm| vm.query.page == 2).await;
        assert!(view.borrow().loading);
    }

    #[test]
    fn total_pages_never_reports_zero() {
        let mut vm = ListViewModel::default();
        assert_eq!(vm.total_pages(), 1);
        vm.total_count = 42;
        vm.query.limit = 4;
        assert_eq!(vm.total_pages(), 11);
        vm.total_count = 40;
        assert_eq!(vm.total_pages(), 10);
    }
}
