mod command;
mod error;
mod http_server;
mod listeners;
mod request_ext;
mod route;
mod router;
mod server_context;

pub use command::{Command, Options};
pub use error::Error;
pub use server_context::ServerContext;
