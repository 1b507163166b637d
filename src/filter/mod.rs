pub mod builder;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use builder::SqlBuilder;
pub use filter::Filter;
pub use filter_where::tokenize;
pub use types::*;
