use crate::command;
use crate::command::server;
use crate::configuration::{Configuration, ServerTlsConfig};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Reloads the configuration file, and the TLS material it points to, whenever they change.
pub struct ConfigWatcher {
    _handle: tokio::task::JoinHandle<()>,
}

impl ConfigWatcher {
    pub fn new(config_path: &str, server: Arc<server::Command>) -> Result<Self, command::Error> {
        info!("Setting up config watcher for: {config_path}");

        let config_file_path = std::fs::canonicalize(PathBuf::from(config_path))?;

        let handle = tokio::spawn(async move {
            if let Err(error) = watch_config_loop(config_file_path, server).await {
                error!("Config watcher failed: {error}");
            }
        });

        Ok(Self { _handle: handle })
    }
}

fn get_tls_paths(tls_config: Option<&ServerTlsConfig>, config_dir: &Path) -> HashSet<PathBuf> {
    let Some(tls_config) = tls_config else {
        return HashSet::new();
    };

    [
        &tls_config.server_certificate_bundle,
        &tls_config.server_private_key,
    ]
    .into_iter()
    .filter_map(|path_str| {
        let path = Path::new(path_str);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        };
        resolved.canonicalize().ok()
    })
    .collect()
}

async fn watch_config_loop(
    config_path: PathBuf,
    server: Arc<server::Command>,
) -> Result<(), command::Error> {
    let (tx, mut rx) = mpsc::channel::<Event>(100);
    let config_dir = config_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    loop {
        let tx_clone = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx_clone.blocking_send(event);
            }
        })?;

        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;

        let current_config = Configuration::load(&config_path)?;
        let watched_tls_paths = get_tls_paths(current_config.server.tls.as_ref(), &config_dir);
        for path in &watched_tls_paths {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
            info!("Watching TLS file: {path:?}");
        }

        let mut should_restart_watcher = false;

        while !should_restart_watcher {
            match rx.recv().await {
                Some(event)
                    if matches!(
                        event.kind,
                        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
                    ) =>
                {
                    let config_changed = event.paths.iter().any(|p| p == &config_path);
                    let tls_changed = event.paths.iter().any(|p| watched_tls_paths.contains(p));

                    if !config_changed && !tls_changed {
                        continue;
                    }

                    info!("Configuration changed, reloading");
                    let new_config = match Configuration::load(&config_path) {
                        Ok(config) => config,
                        Err(error) => {
                            error!("Failed to reload configuration: {error}");
                            continue;
                        }
                    };

                    let new_tls_paths = get_tls_paths(new_config.server.tls.as_ref(), &config_dir);
                    if new_tls_paths != watched_tls_paths {
                        info!("TLS file paths changed, recreating watchers");
                        should_restart_watcher = true;
                    }

                    if let Err(error) = server.notify_config_change(&new_config) {
                        error!("Failed to apply configuration change: {error}");
                    }
                }
                None => {
                    error!("Config watcher channel closed");
                    return Ok(());
                }
                _ => {}
            }
        }

        drop(watcher);
    }
}
