use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// An immutable record of one request handled by the console.
///
/// Built through [`AuditEntry::builder`]; every entry gets a fresh identifier and, unless one
/// is supplied, the time of construction as its timestamp.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    id: String,
    timestamp: DateTime<Utc>,
    user_id: Option<String>,
    user_name: Option<String>,
    action: String,
    controller: String,
    method: String,
    path: String,
    status_code: u16,
    ip_address: Option<String>,
    additional_data: HashMap<String, String>,
}

impl Default for AuditEntry {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AuditEntry {
    pub fn builder() -> AuditEntryBuilder {
        AuditEntryBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn additional_data(&self) -> &HashMap<String, String> {
        &self.additional_data
    }
}

#[derive(Debug, Default)]
pub struct AuditEntryBuilder {
    timestamp: Option<DateTime<Utc>>,
    user_id: Option<String>,
    user_name: Option<String>,
    action: String,
    controller: String,
    method: String,
    path: String,
    status_code: u16,
    ip_address: Option<String>,
    additional_data: HashMap<String, String>,
}

impl AuditEntryBuilder {
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    #[must_use]
    pub fn user_name(mut self, user_name: Option<String>) -> Self {
        self.user_name = user_name;
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = controller.into();
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub fn ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    #[must_use]
    pub fn additional_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> AuditEntry {
        AuditEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            user_id: self.user_id,
            user_name: self.user_name,
            action: self.action,
            controller: self.controller,
            method: self.method,
            path: self.path,
            status_code: self.status_code,
            ip_address: self.ip_address,
            additional_data: self.additional_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_values() {
        let entry = AuditEntry::default();

        assert!(!entry.id().is_empty());
        assert!(entry.user_id().is_none());
        assert!(entry.user_name().is_none());
        assert!(entry.ip_address().is_none());
        assert_eq!(entry.action(), "");
        assert_eq!(entry.controller(), "");
        assert_eq!(entry.method(), "");
        assert_eq!(entry.path(), "");
        assert_eq!(entry.status_code(), 0);
        assert!(entry.additional_data().is_empty());
    }

    #[test]
    fn test_timestamp_defaults_to_now() {
        let before = Utc::now();
        let entry = AuditEntry::default();
        let after = Utc::now();

        assert!(entry.timestamp() >= before - Duration::seconds(1));
        assert!(entry.timestamp() <= after + Duration::seconds(1));
    }

    #[test]
    fn test_ids_are_unique() {
        let first = AuditEntry::default();
        let second = AuditEntry::default();

        assert_ne!(first.id(), second.id());
        assert!(Uuid::parse_str(first.id()).is_ok());
    }

    #[test]
    fn test_builder_sets_every_field() {
        let timestamp = Utc::now() - Duration::hours(2);

        let entry = AuditEntry::builder()
            .timestamp(timestamp)
            .user_id(Some("user123".to_string()))
            .user_name(Some("testuser".to_string()))
            .action("TestAction")
            .controller("TestController")
            .method("POST")
            .path("/test/path")
            .status_code(200)
            .ip_address(Some("127.0.0.1".to_string()))
            .additional_data("key", "value")
            .build();

        assert_eq!(entry.timestamp(), timestamp);
        assert_eq!(entry.user_id(), Some("user123"));
        assert_eq!(entry.user_name(), Some("testuser"));
        assert_eq!(entry.action(), "TestAction");
        assert_eq!(entry.controller(), "TestController");
        assert_eq!(entry.method(), "POST");
        assert_eq!(entry.path(), "/test/path");
        assert_eq!(entry.status_code(), 200);
        assert_eq!(entry.ip_address(), Some("127.0.0.1"));
        assert_eq!(
            entry.additional_data().get("key").map(String::as_str),
            Some("value")
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let entry = AuditEntry::builder()
            .user_id(Some("user1".to_string()))
            .status_code(404)
            .build();

        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["userId"], "user1");
        assert_eq!(json["statusCode"], 404);
        assert!(json["ipAddress"].is_null());
        assert!(json["additionalData"].as_object().unwrap().is_empty());
    }
}
