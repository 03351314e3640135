//! Extraction of Azure AD token-validation settings from API Management policy documents.
//!
//! Elements are matched by local name only: policy documents exported from API Management
//! do not declare namespaces consistently, so `<validate-azure-ad-token>` and
//! `<x:validate-azure-ad-token xmlns:x="...">` are treated the same.

use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;
use tracing::{debug, instrument, warn};

mod error;

pub use error::Error;

pub const DEFAULT_CLAIM_MATCH: &str = "all";

const VALIDATE_TOKEN: &str = "validate-azure-ad-token";
const CLIENT_APPLICATION_IDS: &str = "client-application-ids";
const APPLICATION_ID: &str = "application-id";
const AUDIENCES: &str = "audiences";
const AUDIENCE: &str = "audience";
const REQUIRED_CLAIMS: &str = "required-claims";
const CLAIM: &str = "claim";
const VALUE: &str = "value";

/// A claim assertion declared in a `<required-claims>` section.
///
/// `matching` is the declared match mode (`any` or `all`), it is not interpreted here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequiredClaim {
    pub name: String,
    #[serde(rename = "match")]
    pub matching: String,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySecurityDetails {
    pub application_ids: Vec<String>,
    pub audiences: Vec<String>,
    pub required_claims: Vec<RequiredClaim>,
}

impl PolicySecurityDetails {
    pub fn is_empty(&self) -> bool {
        self.application_ids.is_empty()
            && self.audiences.is_empty()
            && self.required_claims.is_empty()
    }
}

/// Parses a policy document and collects the settings of every `validate-azure-ad-token`
/// element, in document order.
///
/// Results from several validation elements are concatenated, never merged.
/// A blank document, or one without any validation element, yields empty details.
#[instrument(skip(policy_xml), fields(len = policy_xml.len()))]
pub fn parse_security_details(policy_xml: &str) -> Result<PolicySecurityDetails, Error> {
    let mut details = PolicySecurityDetails::default();

    if policy_xml.trim().is_empty() {
        debug!("Empty policy document");
        return Ok(details);
    }

    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(policy_xml, options)?;

    for validation in document
        .descendants()
        .filter(|node| is_named(node, VALIDATE_TOKEN))
    {
        debug!(
            "Found token validation section (tenant: {:?})",
            validation.attribute("tenant-id")
        );

        details.application_ids.extend(collect_values(
            validation,
            CLIENT_APPLICATION_IDS,
            APPLICATION_ID,
        ));
        details
            .audiences
            .extend(collect_values(validation, AUDIENCES, AUDIENCE));

        for claims in named_descendants(validation, REQUIRED_CLAIMS) {
            details
                .required_claims
                .extend(named_descendants(claims, CLAIM).filter_map(parse_claim));
        }
    }

    Ok(details)
}

/// Same as [`parse_security_details`], but a malformed document is logged and treated as
/// declaring no security settings.
pub fn parse_security_details_or_default(policy_xml: &str) -> PolicySecurityDetails {
    parse_security_details(policy_xml).unwrap_or_else(|error| {
        warn!("Unable to read security settings from policy: {error}");
        PolicySecurityDetails::default()
    })
}

fn parse_claim(claim: Node) -> Option<RequiredClaim> {
    let Some(name) = trimmed_attribute(claim, "name") else {
        debug!("Ignoring claim without a name");
        return None;
    };

    let matching = trimmed_attribute(claim, "match").unwrap_or(DEFAULT_CLAIM_MATCH);

    let values = named_descendants(claim, VALUE)
        .filter_map(trimmed_text)
        .collect();

    Some(RequiredClaim {
        name: name.to_string(),
        matching: matching.to_string(),
        values,
    })
}

fn collect_values<'a, 'input: 'a>(
    scope: Node<'a, 'input>,
    container: &'a str,
    item: &'a str,
) -> Vec<String> {
    named_descendants(scope, container)
        .flat_map(|container| named_descendants(container, item))
        .filter_map(trimmed_text)
        .collect()
}

fn named_descendants<'a, 'input: 'a>(
    scope: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    scope
        .descendants()
        .filter(move |node| node.id() != scope.id() && is_named(node, name))
}

fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn trimmed_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

// Concatenates every text node below the element, like a DOM `textContent`.
fn trimmed_text(node: Node) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|node| node.is_text())
        .filter_map(|text| text.text())
        .collect();

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
