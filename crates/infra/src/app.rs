//! Wiring of the three services over one shared store.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::event_store::KeyValueEventStore;
use crate::services::{CheckService, InvoiceService, LoanService};
use crate::store::KeyValueStore;

pub type SharedEventStore = Arc<KeyValueEventStore<Arc<dyn KeyValueStore>>>;

pub struct MoneyDesk {
    pub invoices: InvoiceService<SharedEventStore>,
    pub checks: CheckService<SharedEventStore>,
    pub loans: LoanService<SharedEventStore>,
}

impl MoneyDesk {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let store: SharedEventStore =
            Arc::new(KeyValueEventStore::new(kv, config.store_namespace.clone()));
        tracing::info!(
            namespace = %config.store_namespace,
            seeded = config.rng_seed.is_some(),
            "moneydesk services ready"
        );
        Self {
            invoices: InvoiceService::new(store.clone()),
            checks: CheckService::new(store.clone()),
            loans: LoanService::from_config(store, config),
        }
    }
}
