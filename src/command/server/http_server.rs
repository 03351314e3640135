use std::convert::Infallible;
use std::fmt::Debug;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use opentelemetry::trace::TraceContextExt;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::pin;
use tracing::{debug, error, info, instrument, warn, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::audit::AuditEntry;
use crate::command::server::error::Error;
use crate::command::server::request_ext::collect_body;
use crate::command::server::route::Route;
use crate::command::server::{router, ServerContext};
use crate::metrics_provider::{IN_FLIGHT_REQUESTS, METRICS_PROVIDER};
use crate::policy;

type ResponseBody = Full<Bytes>;

pub async fn serve_request<S>(
    stream: TokioIo<S>,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
    remote_address: std::net::SocketAddr,
) where
    S: Unpin + AsyncWrite + AsyncRead + Send + Debug + 'static,
{
    let conn = http1::Builder::new().serve_connection(
        stream,
        service_fn(move |mut request| {
            request.extensions_mut().insert(remote_address);
            handle_request(Arc::clone(&context), request)
        }),
    );
    pin!(conn);

    IN_FLIGHT_REQUESTS.fetch_add(1, Ordering::Relaxed);
    METRICS_PROVIDER.metric_http_request_in_flight.set(
        i64::try_from(IN_FLIGHT_REQUESTS.load(Ordering::Relaxed)).unwrap_or(i64::MAX),
    );

    for (iter, sleep_duration) in timeouts.iter().enumerate() {
        debug!("iter = {iter} sleep_duration = {sleep_duration:?}");
        tokio::select! {
            res = conn.as_mut() => {
                match res {
                    Ok(()) => debug!("after polling conn, no error"),
                    Err(error) =>  debug!("error serving connection: {error}"),
                }
                break;
            }
            () = tokio::time::sleep(*sleep_duration) => {
                debug!("iter = {iter} got timeout_interval, calling conn.graceful_shutdown");
                conn.as_mut().graceful_shutdown();
            }
        }
    }

    IN_FLIGHT_REQUESTS.fetch_sub(1, Ordering::Relaxed);
    METRICS_PROVIDER.metric_http_request_in_flight.set(
        i64::try_from(IN_FLIGHT_REQUESTS.load(Ordering::Relaxed)).unwrap_or(i64::MAX),
    );
}

#[instrument(skip(context, request))]
async fn handle_request(
    context: Arc<ServerContext>,
    request: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    let start_time = Instant::now();

    let trace_id = {
        let context = Span::current().context();
        let span = context.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            Some(span_context.trace_id().to_string())
        } else {
            None
        }
    };

    let (parts, incoming) = request.into_parts();
    let route = router::parse(&parts.method, &parts.uri);
    let route_action = route.action_name();
    let summary = context.summarize(&parts, &route);

    let response = match dispatch_route(&context, route, incoming).await {
        Ok(response) => response,
        Err(error) => error_to_response(&error, trace_id.as_ref()),
    };

    let status = response.status();
    let duration = start_time.elapsed();

    if let Some(summary) = summary {
        context.record(summary, status, duration);
    }

    #[allow(clippy::cast_precision_loss)]
    let elapsed = duration.as_millis() as f64;

    METRICS_PROVIDER
        .metric_http_request_total
        .with_label_values(&[parts.method.as_str(), route_action, status.as_str()])
        .inc();
    METRICS_PROVIDER
        .metric_http_request_duration
        .with_label_values(&[parts.method.as_str(), route_action])
        .observe(elapsed);

    let (method, path) = (&parts.method, parts.uri.path());
    let log = if let Some(trace_id) = trace_id {
        format!("{trace_id} {elapsed:?} - {status} {method} {path}")
    } else {
        format!("{elapsed:?} - {status} {method} {path}")
    };

    if status.is_server_error() {
        error!("{log}");
    } else {
        info!("{log}");
    }

    Ok(response)
}

#[instrument(skip(context, body))]
async fn dispatch_route<B>(
    context: &ServerContext,
    route: Route<'_>,
    body: B,
) -> Result<Response<ResponseBody>, Error>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match route {
        Route::Healthz => handle_healthz(),
        Route::Metrics => handle_metrics(),
        Route::ListAudit { from, to } => {
            handle_list_audit(context, from.as_deref(), to.as_deref())
        }
        Route::ListAuditByUser { user_id } => handle_list_audit_by_user(context, &user_id),
        Route::InspectPolicy => {
            let body = collect_body(body, context.max_body_size).await?;
            handle_inspect_policy(&body)
        }
        Route::InvalidQuery { reason } => Err(Error::InvalidArgument(reason)),
        Route::Unsupported => Err(Error::Unsupported(
            "method not allowed for this route".to_string(),
        )),
        Route::Unknown => Err(Error::NotFound("unknown route".to_string())),
    }
}

fn parse_instant(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, Error> {
    let Some(value) = value else {
        return Ok(None);
    };

    match DateTime::parse_from_rfc3339(value) {
        Ok(instant) => Ok(Some(instant.with_timezone(&Utc))),
        Err(error) => {
            let msg = format!("'{name}' is not an RFC 3339 timestamp: {error}");
            Err(Error::InvalidArgument(msg))
        }
    }
}

fn handle_list_audit(
    context: &ServerContext,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Response<ResponseBody>, Error> {
    let from = parse_instant("from", from)?;
    let to = parse_instant("to", to)?;

    let entries = if from.is_none() && to.is_none() {
        context.store.list_all()
    } else {
        context.store.list_by_time_range(
            from.unwrap_or(DateTime::<Utc>::MIN_UTC),
            to.unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    };

    let entries: Vec<&AuditEntry> = entries.iter().map(Arc::as_ref).collect();
    json_response(&entries)
}

fn handle_list_audit_by_user(
    context: &ServerContext,
    user_id: &str,
) -> Result<Response<ResponseBody>, Error> {
    let entries = context.store.list_by_user(Some(user_id))?;

    let entries: Vec<&AuditEntry> = entries.iter().map(Arc::as_ref).collect();
    json_response(&entries)
}

fn handle_inspect_policy(body: &[u8]) -> Result<Response<ResponseBody>, Error> {
    let Ok(document) = std::str::from_utf8(body) else {
        METRICS_PROVIDER.metric_policy_parse_failures_total.inc();
        return Err(Error::PolicyInvalid(
            "policy document is not valid UTF-8".to_string(),
        ));
    };

    let details = policy::parse_security_details(document).inspect_err(|error| {
        warn!("Rejected policy document: {error}");
        METRICS_PROVIDER.metric_policy_parse_failures_total.inc();
    })?;

    json_response(&details)
}

fn handle_healthz() -> Result<Response<ResponseBody>, Error> {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(r#"{"status":"ok"}"#)));

    match response {
        Ok(resp) => Ok(resp),
        Err(e) => {
            let msg = format!("Failed to build healthz response: {e}");
            Err(Error::Internal(msg))
        }
    }
}

fn handle_metrics() -> Result<Response<ResponseBody>, Error> {
    let (content_type, metrics) = METRICS_PROVIDER.gather()?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(metrics)));

    match response {
        Ok(resp) => Ok(resp),
        Err(e) => {
            let msg = format!("Failed to build metrics response: {e}");
            Err(Error::Internal(msg))
        }
    }
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> Result<Response<ResponseBody>, Error> {
    let body = serde_json::to_vec(value).map_err(|error| {
        let msg = format!("Failed to serialize response: {error}");
        Error::Internal(msg)
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .map_err(|error| Error::Internal(format!("Failed to build response: {error}")))
}

pub fn error_to_response(error: &Error, request_id: Option<&String>) -> Response<ResponseBody> {
    let body = Bytes::from(error.as_json(request_id).to_string());

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = error.status_code();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));
    response
}
