pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    parse_id, DeleteResult, DocumentStore, InsertOneResult, StoreError, Update, UpdateResult,
};
