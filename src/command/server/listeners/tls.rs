use crate::command::server::error::Error;
use crate::command::server::http_server::serve_request;
use crate::command::server::listeners::{accept, build_listener, connection_timeouts};
use crate::command::server::ServerContext;
use crate::configuration::{self, ServerConfig, ServerTlsConfig};
use arc_swap::ArcSwap;
use hyper_util::rt::TokioIo;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};

pub struct TlsListener {
    binding_address: SocketAddr,
    tls_acceptor: ArcSwap<TlsAcceptor>,
    context: ArcSwap<ServerContext>,
    timeouts: ArcSwap<[Duration; 2]>,
}

impl TlsListener {
    pub fn new(
        config: &ServerConfig,
        tls_config: &ServerTlsConfig,
        context: ServerContext,
    ) -> Result<Self, configuration::Error> {
        let binding_address = SocketAddr::new(config.bind_address, config.port);
        let tls_acceptor = ArcSwap::from_pointee(Self::build_tls_acceptor(tls_config)?);

        Ok(Self {
            binding_address,
            tls_acceptor,
            context: ArcSwap::from_pointee(context),
            timeouts: ArcSwap::from_pointee(connection_timeouts(config)),
        })
    }

    #[cfg(test)]
    pub fn context(&self) -> Arc<ServerContext> {
        self.context.load_full()
    }

    pub fn notify_config_change(
        &self,
        config: &ServerConfig,
        tls_config: &ServerTlsConfig,
        context: ServerContext,
    ) -> Result<(), configuration::Error> {
        let acceptor = Arc::new(Self::build_tls_acceptor(tls_config)?);
        self.tls_acceptor.store(acceptor);

        self.timeouts.store(Arc::new(connection_timeouts(config)));
        self.context.store(Arc::new(context));

        Ok(())
    }

    fn build_tls_acceptor(
        tls_config: &ServerTlsConfig,
    ) -> Result<TlsAcceptor, configuration::Error> {
        debug!("Detected TLS configuration");
        let server_certs = CertificateDer::pem_file_iter(&tls_config.server_certificate_bundle)?
            .collect::<Result<_, _>>()?;
        let server_key = PrivateKeyDer::from_pem_file(&tls_config.server_private_key)?;

        let server_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(server_certs, server_key)?;

        Ok(TlsAcceptor::from(Arc::new(server_config)))
    }

    pub async fn serve(&self) -> Result<(), Error> {
        info!("Listening on {} (TLS)", self.binding_address);
        let listener = build_listener(self.binding_address).await?;

        loop {
            let (tcp, remote_address) = accept(&listener).await?;

            let tls_acceptor = self.tls_acceptor.load_full();
            let context = Arc::clone(&self.context.load());
            let timeouts = Arc::clone(&self.timeouts.load());

            tokio::spawn(async move {
                let tls = match tls_acceptor.accept(tcp).await {
                    Ok(tls) => tls,
                    Err(error) => {
                        debug!("TLS handshake with {remote_address} failed: {error}");
                        return;
                    }
                };

                let stream = TokioIo::new(tls);
                serve_request(stream, context, timeouts, remote_address).await;
            });
        }
    }
}
