pub mod types;
pub mod filter;
pub mod filter_where;
pub mod error;

pub use types::*;
pub use filter::{lookup, set_path, Filter};
pub use error::FilterError;
