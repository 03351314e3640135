use std::sync::Arc;
use std::time::Duration;

use hyper::http::request::Parts;
use hyper::StatusCode;
use tracing::{debug, error};

use crate::audit::{AuditEntry, AuditFilter, AuditStore};
use crate::command::server::error::Error;
use crate::command::server::request_ext::HeaderExt;
use crate::command::server::route::Route;
use crate::configuration::AuditConfig;
use crate::metrics_provider::METRICS_PROVIDER;

const ANONYMOUS_USER: &str = "Anonymous";

pub struct ServerContext {
    pub store: Arc<AuditStore>,
    pub filter: AuditFilter,
    pub user_header: String,
    pub max_body_size: usize,
}

/// What is known about a request before it is dispatched.
#[derive(Debug)]
pub struct RequestSummary {
    method: String,
    path: String,
    query: Option<String>,
    controller: &'static str,
    user: Option<String>,
    ip_address: Option<String>,
}

impl ServerContext {
    pub fn new(config: &AuditConfig, store: Arc<AuditStore>) -> Result<Self, Error> {
        let filter = config.build_filter().map_err(|error| {
            let msg = format!("Failed to build audit filter: {error}");
            Error::Initialization(msg)
        })?;

        Ok(Self {
            store,
            filter,
            user_header: config.user_header.clone(),
            max_body_size: config.max_body_size,
        })
    }

    /// Captures the audited attributes of a request, or `None` when its path is not audited.
    pub fn summarize(&self, parts: &Parts, route: &Route<'_>) -> Option<RequestSummary> {
        let path = parts.uri.path();
        if !self.filter.should_audit(path) {
            debug!("Skipping audit for {path}");
            return None;
        }

        let user = parts
            .get_header(self.user_header.as_str())
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty());

        Some(RequestSummary {
            method: parts.method.to_string(),
            path: path.to_string(),
            query: parts.uri.query().map(ToString::to_string),
            controller: route.controller(),
            user,
            ip_address: parts.client_ip(),
        })
    }

    pub fn record(&self, summary: RequestSummary, status: StatusCode, elapsed: Duration) {
        let query_string = summary
            .query
            .map(|query| format!("?{query}"))
            .unwrap_or_default();

        let entry = AuditEntry::builder()
            .user_id(summary.user.clone())
            .user_name(Some(
                summary.user.unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            ))
            .action(summary.path.as_str())
            .controller(summary.controller)
            .method(summary.method)
            .path(summary.path)
            .status_code(status.as_u16())
            .ip_address(summary.ip_address)
            .additional_data("Duration", format!("{}ms", elapsed.as_millis()))
            .additional_data("QueryString", query_string)
            .build();

        match self.store.try_append(Some(entry)) {
            Ok(()) => METRICS_PROVIDER.metric_audit_entries_total.inc(),
            Err(error) => error!("Failed to record audit entry: {error}"),
        }
    }
}
