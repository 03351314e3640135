use std::sync::Arc;

use argh::FromArgs;
use tracing::info;

use super::listeners::insecure::InsecureListener;
use super::listeners::tls::TlsListener;
use super::ServerContext;
use crate::audit::AuditStore;
use crate::command::server::error::Error;
use crate::configuration::{self, Configuration};

pub enum ServiceListener {
    Insecure(InsecureListener),
    Secure(TlsListener),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "serve",
    description = "Run the audit and policy inspection listener"
)]
pub struct Options {}

pub struct Command {
    listener: ServiceListener,
    store: Arc<AuditStore>,
}

impl Command {
    pub fn new(config: &Configuration) -> Result<Command, Error> {
        let store = Arc::new(AuditStore::new());
        let context = ServerContext::new(&config.audit, Arc::clone(&store))?;

        let listener = match &config.server.tls {
            None => ServiceListener::Insecure(InsecureListener::new(&config.server, context)),
            Some(tls_config) => {
                let listener = TlsListener::new(&config.server, tls_config, context)
                    .map_err(|error| Error::Initialization(error.to_string()))?;
                ServiceListener::Secure(listener)
            }
        };

        Ok(Command { listener, store })
    }

    /// Applies a reloaded configuration. The audit store is carried over to the new context.
    pub fn notify_config_change(&self, config: &Configuration) -> Result<(), configuration::Error> {
        let context = ServerContext::new(&config.audit, Arc::clone(&self.store))
            .map_err(|error| configuration::Error::ConfigurationFileFormat(error.to_string()))?;

        match (&self.listener, &config.server.tls) {
            (ServiceListener::Insecure(listener), None) => {
                listener.notify_config_change(&config.server, context);
            }
            (ServiceListener::Insecure(_), Some(_)) => {
                return Err(configuration::Error::UnexpectedTLSSection(
                    "server.tls cannot be added while the plaintext listener is running"
                        .to_string(),
                ));
            }
            (ServiceListener::Secure(listener), Some(tls_config)) => {
                listener.notify_config_change(&config.server, tls_config, context)?;
            }
            (ServiceListener::Secure(_), None) => {
                return Err(configuration::Error::MissingExpectedTLSSection(
                    "server.tls cannot be removed while the TLS listener is running".to_string(),
                ));
            }
        }

        info!("Configuration reloaded");
        Ok(())
    }

    pub async fn run(&self) -> Result<(), Error> {
        match &self.listener {
            ServiceListener::Insecure(listener) => listener.serve().await?,
            ServiceListener::Secure(listener) => listener.serve().await?,
        }

        Ok(())
    }
}
