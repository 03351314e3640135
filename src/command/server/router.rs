use std::borrow::Cow;

use hyper::{Method, Uri};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::route::Route;

const AUDIT_USERS_PREFIX: &str = "/audit/users/";

fn parse_query<T: DeserializeOwned + Default>(params: Option<&str>) -> Result<T, String> {
    match params {
        Some(params) => serde_urlencoded::from_str(params)
            .map_err(|error| format!("invalid query string: {error}")),
        None => Ok(T::default()),
    }
}

#[derive(Deserialize, Default)]
struct TimeRangeQuery {
    from: Option<String>,
    to: Option<String>,
}

pub fn parse<'a>(method: &Method, uri: &'a Uri) -> Route<'a> {
    let path = uri.path();
    let params = uri.query();

    match path {
        "/healthz" => expect_method(method, &Method::GET, Route::Healthz),
        "/metrics" => expect_method(method, &Method::GET, Route::Metrics),
        "/audit" | "/audit/" => {
            let route = match parse_query::<TimeRangeQuery>(params) {
                Ok(query) => Route::ListAudit {
                    from: query.from,
                    to: query.to,
                },
                Err(reason) => Route::InvalidQuery { reason },
            };
            expect_method(method, &Method::GET, route)
        }
        "/policies/security-details" => expect_method(method, &Method::POST, Route::InspectPolicy),
        _ => try_parse_audit_user(method, path).unwrap_or(Route::Unknown),
    }
}

fn expect_method<'a>(method: &Method, expected: &Method, route: Route<'a>) -> Route<'a> {
    if method == expected {
        route
    } else {
        Route::Unsupported
    }
}

fn try_parse_audit_user<'a>(method: &Method, path: &'a str) -> Option<Route<'a>> {
    let segment = path.strip_prefix(AUDIT_USERS_PREFIX)?;
    if segment.contains('/') {
        return None;
    }

    let user_id = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    Some(expect_method(
        method,
        &Method::GET,
        Route::ListAuditByUser { user_id },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_for(method: Method, uri: &str) -> Route<'static> {
        let uri: &'static Uri = Box::leak(Box::new(uri.parse::<Uri>().unwrap()));
        parse(&method, uri)
    }

    #[test]
    fn test_parse_service_routes() {
        assert_eq!(route_for(Method::GET, "/healthz"), Route::Healthz);
        assert_eq!(route_for(Method::GET, "/metrics"), Route::Metrics);
        assert_eq!(
            route_for(Method::POST, "/policies/security-details"),
            Route::InspectPolicy
        );
    }

    #[test]
    fn test_parse_list_audit() {
        assert_eq!(
            route_for(Method::GET, "/audit"),
            Route::ListAudit {
                from: None,
                to: None
            }
        );

        assert_eq!(
            route_for(
                Method::GET,
                "/audit?from=2024-01-01T00:00:00Z&to=2024-01-02T00:00:00%2B01:00"
            ),
            Route::ListAudit {
                from: Some("2024-01-01T00:00:00Z".to_string()),
                to: Some("2024-01-02T00:00:00+01:00".to_string()),
            }
        );

        assert_eq!(
            route_for(Method::GET, "/audit?to=2024-01-02T00:00:00Z"),
            Route::ListAudit {
                from: None,
                to: Some("2024-01-02T00:00:00Z".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_list_audit_rejects_malformed_query() {
        let route = route_for(
            Method::GET,
            "/audit?from=2024-01-01T00:00:00Z&from=2025-01-01T00:00:00Z",
        );
        assert!(matches!(route, Route::InvalidQuery { .. }));
        assert_eq!(route.controller(), "audit");

        assert_eq!(
            route_for(Method::DELETE, "/audit?from=a&from=b"),
            Route::Unsupported
        );
    }

    #[test]
    fn test_parse_list_audit_by_user_decodes_segment() {
        let route = route_for(Method::GET, "/audit/users/jane%40contoso.com");

        assert_eq!(
            route,
            Route::ListAuditByUser {
                user_id: Cow::Borrowed("jane@contoso.com")
            }
        );
        assert_eq!(route.controller(), "audit");
    }

    #[test]
    fn test_parse_list_audit_by_empty_user() {
        assert_eq!(
            route_for(Method::GET, "/audit/users/"),
            Route::ListAuditByUser {
                user_id: Cow::Borrowed("")
            }
        );
    }

    #[test]
    fn test_parse_unsupported_methods() {
        assert_eq!(route_for(Method::DELETE, "/audit"), Route::Unsupported);
        assert_eq!(route_for(Method::POST, "/healthz"), Route::Unsupported);
        assert_eq!(
            route_for(Method::GET, "/policies/security-details"),
            Route::Unsupported
        );
        assert_eq!(
            route_for(Method::PUT, "/audit/users/alice"),
            Route::Unsupported
        );
    }

    #[test]
    fn test_parse_unknown_routes() {
        assert_eq!(route_for(Method::GET, "/"), Route::Unknown);
        assert_eq!(route_for(Method::GET, "/audit/users/a/b"), Route::Unknown);
        assert_eq!(route_for(Method::GET, "/css/site.css"), Route::Unknown);
        assert_eq!(route_for(Method::GET, "/unknown").controller(), "Unknown");
    }

    #[test]
    fn test_action_names() {
        assert_eq!(route_for(Method::GET, "/audit").action_name(), "list-audit");
        assert_eq!(
            route_for(Method::POST, "/policies/security-details").action_name(),
            "inspect-policy"
        );
        assert_eq!(route_for(Method::GET, "/nope").action_name(), "unknown");
    }
}
