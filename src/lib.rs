pub mod bio;
pub mod cli;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

pub use crate::core::{
    database_manager::{DatabaseManager, DatabaseState},
    types::{DatabaseKind, GoEntry, SerializationFormat, TaxEntry},
    Config,
};
pub use error::{RefDbError, Result};
