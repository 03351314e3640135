#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod command;
pub mod configuration;
pub mod metrics_provider;
pub mod policy;
