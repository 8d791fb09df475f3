//! Shared harness: one engine over a fresh store, catalog, and clock.

use std::sync::{Arc, Once};
use std::time::Duration;

use qotd_core::{
    Clock, Day, EngineConfig, ManualClock, MemoryCatalog, QotdEngine, QuoteId, QuoteRecord, UserId,
};
use qotd_store::{spawn_store, StoreHandle};

/// The day every test starts on.
pub const START_DAY: &str = "2026-08-07";

pub fn day(s: &str) -> Day {
    s.parse().unwrap()
}

pub fn user(s: &str) -> UserId {
    UserId::new(s)
}

/// A fully wired engine plus handles to its collaborators.
pub struct Rig {
    pub engine: QotdEngine,
    pub catalog: Arc<MemoryCatalog>,
    pub clock: Arc<ManualClock>,
    pub store: StoreHandle,
}

pub fn rig() -> Rig {
    init_tracing();

    let store = spawn_store(64);
    let catalog = Arc::new(MemoryCatalog::new());
    let clock = Arc::new(ManualClock::starting_at(day(START_DAY)));
    let config = EngineConfig {
        refill_retry_delay: Duration::from_millis(1),
        ..EngineConfig::default()
    };
    let engine = QotdEngine::new(store.clone(), catalog.clone(), clock.clone(), config);

    Rig {
        engine,
        catalog,
        clock,
        store,
    }
}

impl Rig {
    pub fn today(&self) -> Day {
        self.clock.today()
    }

    /// Registers a quote in the catalog without submitting it.
    pub fn register(&self, id: &str, author: &str, published: Day) -> QuoteId {
        let quote = QuoteId::new(id);
        self.catalog.add(QuoteRecord {
            id: quote.clone(),
            author: user(author),
            published,
        });
        quote
    }

    /// Registers a quote authored today and submits it through the engine.
    pub async fn submit(&self, id: &str, author: &str) -> QuoteId {
        let quote = self.register(id, author, self.today());
        self.engine
            .submit(self.today(), &user(author), &quote)
            .await
            .unwrap();
        quote
    }
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
