pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod notify;
pub mod ops_log;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod view;

pub use error::IngestError;
