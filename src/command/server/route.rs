use std::borrow::Cow;

/// Route represents the parsed request path and action.
#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    Healthz,
    Metrics,
    ListAudit {
        from: Option<String>,
        to: Option<String>,
    },
    ListAuditByUser {
        user_id: Cow<'a, str>,
    },
    InspectPolicy,
    InvalidQuery {
        reason: String,
    },
    Unsupported,
    Unknown,
}

impl Route<'_> {
    pub fn action_name(&self) -> &'static str {
        match self {
            Route::Healthz => "healthz",
            Route::Metrics => "metrics",
            Route::ListAudit { .. } => "list-audit",
            Route::ListAuditByUser { .. } => "list-audit-by-user",
            Route::InspectPolicy => "inspect-policy",
            Route::InvalidQuery { .. } => "invalid-query",
            Route::Unsupported => "unsupported",
            Route::Unknown => "unknown",
        }
    }

    /// Name recorded as the controller of an audit entry.
    pub fn controller(&self) -> &'static str {
        match self {
            Route::Healthz => "health",
            Route::Metrics => "metrics",
            Route::ListAudit { .. }
            | Route::ListAuditByUser { .. }
            | Route::InvalidQuery { .. } => "audit",
            Route::InspectPolicy => "policies",
            Route::Unsupported | Route::Unknown => "Unknown",
        }
    }
}
