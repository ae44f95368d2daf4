mod error;
mod memory;
mod null;
mod postgres_store;
mod redb_store;
mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use null::NullStore;
pub use postgres_store::PostgresStore;
pub use redb_store::RedbStore;
pub use store::{open, MetadataStore};
