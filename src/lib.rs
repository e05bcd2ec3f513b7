pub mod domain;
pub mod error;
pub mod generator;
pub mod record;
pub mod schema;
pub mod writer;

pub use error::Error;
