pub mod ledger;
pub mod store;

pub use ledger::{Ledger, LedgerError};
pub use store::{FeedbackStore, FileStore, MemoryStore, StoreError};
