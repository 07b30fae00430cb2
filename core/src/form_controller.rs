//! State controller for the product create/edit form.
//!
//! # Design
//! Same actor shape as the list controller: commands in over mpsc, view-model
//! out over watch. The mode is fixed at construction — [`FormMode::Create`]
//! or [`FormMode::Edit`] — instead of a boolean flag, so each path carries
//! exactly the data it needs.
//!
//! In edit mode the form stays disabled until the entity loads; a failed load
//! keeps it disabled, and submission is refused until a load has succeeded.
//! Validation is local: an invalid form never reaches the network, it only
//! marks the fields as touched so the renderer can show messages.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::http::Transport;
use crate::repository::ProductRepository;
use crate::types::{Currency, NewProduct, Product};

const LOAD_ERROR: &str = "Failed to load product";
const SAVE_ERROR: &str = "Failed to save product";
const COMMAND_BUFFER: usize = 16;

/// Which entity the form is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(u64),
}

/// Raw field values as the renderer binds them. Numeric fields are optional
/// because an empty input has no value yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub category: String,
    pub stock: Option<u32>,
    pub is_active: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: Some(0.0),
            currency: Some(Currency::Usd),
            category: String::new(),
            stock: Some(0),
            is_active: true,
        }
    }
}

/// Field values that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub category: Option<String>,
    pub stock: u32,
    pub is_active: bool,
}

impl ProductForm {
    /// The validation gate: name of at least three characters, non-empty
    /// description, present non-negative price, present stock, a currency.
    pub fn values(&self) -> Option<FormValues> {
        let name = self.name.trim();
        if name.len() < 3 {
            return None;
        }
        let description = self.description.trim();
        if description.is_empty() {
            return None;
        }
        let price = self.price.filter(|p| *p >= 0.0)?;
        let stock = self.stock?;
        let currency = self.currency?;
        let category = match self.category.trim() {
            "" => None,
            category => Some(category.to_string()),
        };
        Some(FormValues {
            name: name.to_string(),
            description: description.to_string(),
            price,
            currency,
            category,
            stock,
            is_active: self.is_active,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.values().is_some()
    }

    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: Some(product.price),
            currency: Some(product.currency),
            category: product.category.clone().unwrap_or_default(),
            stock: Some(product.stock),
            is_active: product.is_active,
        }
    }
}

/// The outgoing entity, tagged by operation.
#[derive(Debug)]
enum SavePayload {
    Create(NewProduct),
    Update(Product),
}

#[derive(Debug, Clone)]
pub enum FormCommand {
    /// Replace the whole form snapshot with the renderer's current values.
    Input(ProductForm),
    Submit,
}

/// Everything the renderer needs to draw the form view.
#[derive(Debug, Clone, PartialEq)]
pub struct FormViewModel {
    pub form: ProductForm,
    pub loading: bool,
    pub error: Option<String>,
    /// The form cannot be edited or submitted (edit mode until load succeeds).
    pub disabled: bool,
    /// A rejected submission marks every field as interacted with so
    /// validation messages become visible.
    pub touched: bool,
    /// Set once a create/update succeeded; the renderer navigates back to
    /// the list when it flips.
    pub saved: bool,
    pub is_edit: bool,
}

impl FormViewModel {
    fn initial(mode: FormMode) -> Self {
        let is_edit = matches!(mode, FormMode::Edit(_));
        Self {
            form: ProductForm::default(),
            loading: false,
            error: None,
            // Edit mode starts disabled: nothing may be typed or submitted
            // before the entity has loaded.
            disabled: is_edit,
            touched: false,
            saved: false,
            is_edit,
        }
    }
}

/// Renderer-facing handle for the form controller.
///
/// Commands sent after the controller task has shut down are dropped.
#[derive(Debug, Clone)]
pub struct FormHandle {
    commands: mpsc::Sender<FormCommand>,
    view: watch::Receiver<FormViewModel>,
}

impl FormHandle {
    pub fn view(&self) -> watch::Receiver<FormViewModel> {
        self.view.clone()
    }

    pub async fn input(&self, form: ProductForm) {
        let _ = self.commands.send(FormCommand::Input(form)).await;
    }

    pub async fn submit(&self) {
        let _ = self.commands.send(FormCommand::Submit).await;
    }
}

/// Actor owning the form state. Construct with [`FormController::new`], then
/// drive it with `tokio::spawn(controller.run())`.
pub struct FormController<T: Transport> {
    repository: Arc<ProductRepository<T>>,
    mode: FormMode,
    commands: mpsc::Receiver<FormCommand>,
    view: watch::Sender<FormViewModel>,
    form: ProductForm,
    existing: Option<Product>,
}

impl<T: Transport> FormController<T> {
    pub fn new(repository: Arc<ProductRepository<T>>, mode: FormMode) -> (Self, FormHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(FormViewModel::initial(mode));
        let controller = Self {
            repository,
            mode,
            commands: command_rx,
            view: view_tx,
            form: ProductForm::default(),
            existing: None,
        };
        let handle = FormHandle {
            commands: command_tx,
            view: view_rx,
        };
        (controller, handle)
    }

    /// Event loop. In edit mode the entity is fetched before any command is
    /// processed; the loop then runs until every handle is dropped.
    pub async fn run(mut self) {
        if let FormMode::Edit(id) = self.mode {
            self.load_existing(id).await;
        }
        while let Some(command) = self.commands.recv().await {
            match command {
                FormCommand::Input(form) => {
                    self.form = form;
                    let snapshot = self.form.clone();
                    self.view.send_modify(|vm| vm.form = snapshot);
                }
                FormCommand::Submit => self.submit().await,
            }
        }
    }

    async fn load_existing(&mut self, id: u64) {
        // `disabled` is already true from the initial view-model.
        self.view.send_modify(|vm| vm.loading = true);
        match self.repository.get(id).await {
            Ok(product) => {
                self.form = ProductForm::from_product(&product);
                self.existing = Some(product);
                let snapshot = self.form.clone();
                self.view.send_modify(|vm| {
                    vm.form = snapshot;
                    vm.disabled = false;
                    vm.loading = false;
                });
            }
            Err(error) => {
                warn!(%error, id, "product load failed");
                // Form stays disabled: no editing against data that never
                // arrived.
                self.view.send_modify(|vm| {
                    vm.error = Some(LOAD_ERROR.to_string());
                    vm.loading = false;
                });
            }
        }
    }

    async fn submit(&mut self) {
        let Some(values) = self.form.values() else {
            self.view.send_modify(|vm| vm.touched = true);
            return;
        };

        let now = now_millis();
        let payload = match (self.mode, &self.existing) {
            // Guard: the entity never loaded, there is nothing to merge into.
            (FormMode::Edit(_), None) => return,
            (FormMode::Edit(_), Some(existing)) => SavePayload::Update(Product {
                id: existing.id,
                name: values.name,
                description: values.description,
                price: values.price,
                currency: values.currency,
                category: values.category,
                stock: values.stock,
                is_active: values.is_active,
                created_at: existing.created_at,
                updated_at: now,
            }),
            (FormMode::Create, _) => SavePayload::Create(NewProduct {
                name: values.name,
                description: values.description,
                price: values.price,
                currency: values.currency,
                category: values.category,
                stock: values.stock,
                is_active: values.is_active,
                created_at: now,
                updated_at: now,
            }),
        };

        self.view.send_modify(|vm| {
            vm.loading = true;
            vm.error = None;
        });
        let result = match &payload {
            SavePayload::Create(input) => self.repository.create(input).await.map(|_| ()),
            SavePayload::Update(input) => self.repository.update(input).await.map(|_| ()),
        };
        self.view.send_modify(|vm| {
            vm.loading = false;
            match result {
                Ok(()) => vm.saved = true,
                Err(error) => {
                    warn!(%error, "product save failed");
                    vm.error = Some(SAVE_ERROR.to_string());
                }
            }
        });
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
