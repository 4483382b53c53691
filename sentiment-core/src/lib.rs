pub mod config;
pub mod error;
pub mod error_utils;
pub mod outcome;
pub mod sheets;
pub mod types;
pub mod workbook;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use outcome::*;
pub use types::*;
