mod error;
pub mod inspect;
pub mod server;

pub use error::Error;
