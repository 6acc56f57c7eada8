pub mod aliases;
pub mod types;

pub use aliases::{ColumnMap, Field, FieldAliases};
pub use types::{CanonicalRecord, CANONICAL_COLUMNS};
