pub mod pool;
pub mod store;

pub use pool::create_pool;
pub use store::{JournalSource, PgStore, SelectionStore};
