//! Known DIA deployments and the endpoint URL set a connection resolves to.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::Error;

/// The set of absolute endpoint URLs one connection talks to.
///
/// `get`, `save`, and `delete` are required for every connection; the
/// dedicated `authenticate` endpoint only exists on some deployments.
#[derive(Clone, Debug)]
pub struct EndpointSet {
    /// Endpoint serving record queries, counts, and table descriptions.
    pub get: Url,
    /// Endpoint processing inserts and updates.
    pub save: Url,
    /// Endpoint deleting single records.
    pub delete: Url,
    /// Login endpoint, when the deployment has one.
    pub authenticate: Option<Url>,
}

/// Names one endpoint of an [`EndpointSet`], for the raw request API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Record queries, counts, and table descriptions.
    Get,
    /// Inserts and updates.
    Save,
    /// Single-record deletion.
    Delete,
    /// The dedicated login endpoint.
    Authenticate,
}

impl EndpointSet {
    pub(crate) fn resolve(&self, endpoint: Endpoint) -> Result<&Url, Error> {
        match endpoint {
            Endpoint::Get => Ok(&self.get),
            Endpoint::Save => Ok(&self.save),
            Endpoint::Delete => Ok(&self.delete),
            Endpoint::Authenticate => self
                .authenticate
                .as_ref()
                .ok_or(Error::UnknownEndpoint("authenticate")),
        }
    }

    /// Creates an endpoint set from already-parsed URLs, without an
    /// authenticate endpoint.
    pub fn new(get: Url, save: Url, delete: Url) -> Self {
        Self {
            get,
            save,
            delete,
            authenticate: None,
        }
    }

    /// Adds a login endpoint to the set.
    pub fn with_authenticate(mut self, authenticate: Url) -> Self {
        self.authenticate = Some(authenticate);
        self
    }

    /// Parses the three required endpoints from strings. Fails with
    /// [`Error::InvalidConnection`] if any of them is not a valid URL.
    pub fn parse(get: &str, save: &str, delete: &str) -> Result<Self, Error> {
        Ok(Self::new(
            parse_url("get", get)?,
            parse_url("save", save)?,
            parse_url("delete", delete)?,
        ))
    }
}

fn parse_url(kind: &str, raw: &str) -> Result<Url, Error> {
    Url::parse(raw)
        .map_err(|e| Error::InvalidConnection(format!("invalid {} url `{}`: {}", kind, raw, e)))
}

/// A named DIA deployment with a fixed, known endpoint set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    /// The vendor's sandbox environment.
    Sandbox,
    /// The main salsa.democracyinaction.org deployment.
    Salsa,
    /// The salsa.wiredforchange.com deployment.
    WiredForChange,
    /// The org2.democracyinaction.org deployment.
    Org2,
}

impl Node {
    /// Resolves this node to its endpoint URL set.
    pub fn endpoints(&self) -> Result<EndpointSet, Error> {
        let (get, save, delete, authenticate) = match self {
            Node::Sandbox => (
                "https://sandbox.democracyinaction.org/api/get",
                "https://sandbox.democracyinaction.org/api/save",
                "https://sandbox.democracyinaction.org/api/delete",
                Some("https://sandbox.democracyinaction.org/api/authenticate.sjs"),
            ),
            Node::Salsa => (
                "http://salsa.democracyinaction.org/dia/api/get.jsp",
                "http://salsa.democracyinaction.org/dia/api/process.jsp",
                "http://salsa.democracyinaction.org/dia/deleteEntry.jsp",
                Some("https://salsa.democracyinaction.org/api/authenticate.sjs"),
            ),
            Node::WiredForChange => (
                "http://salsa.wiredforchange.com/dia/api/get.jsp",
                "http://salsa.wiredforchange.com/dia/api/process.jsp",
                "http://salsa.wiredforchange.com/dia/deleteEntry.jsp",
                None,
            ),
            Node::Org2 => (
                "http://org2.democracyinaction.org/dia/api/get.jsp",
                "http://org2.democracyinaction.org/dia/api/process.jsp",
                "http://org2.democracyinaction.org/dia/api/delete.jsp",
                None,
            ),
        };
        let mut set = EndpointSet::parse(get, save, delete)?;
        if let Some(raw) = authenticate {
            set.authenticate = Some(parse_url("authenticate", raw)?);
        }
        Ok(set)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Node::Sandbox => "sandbox",
                Node::Salsa => "salsa",
                Node::WiredForChange => "wiredforchange",
                Node::Org2 => "org2",
            }
        )
    }
}

impl FromStr for Node {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(Node::Sandbox),
            "salsa" => Ok(Node::Salsa),
            "wiredforchange" => Ok(Node::WiredForChange),
            "org2" => Ok(Node::Org2),
            other => Err(Error::UnsupportedNode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_round_trips_through_str() {
        for node in [Node::Sandbox, Node::Salsa, Node::WiredForChange, Node::Org2] {
            assert_eq!(node.to_string().parse::<Node>().unwrap(), node);
        }
    }

    #[test]
    fn unknown_node_is_rejected() {
        let err = "groundspring".parse::<Node>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedNode(name) if name == "groundspring"));
    }

    #[test]
    fn every_node_resolves_to_a_full_endpoint_set() {
        for node in [Node::Sandbox, Node::Salsa, Node::WiredForChange, Node::Org2] {
            let set = node.endpoints().unwrap();
            assert!(!set.get.as_str().is_empty());
            assert!(!set.save.as_str().is_empty());
            assert!(!set.delete.as_str().is_empty());
        }
    }

    #[test]
    fn sandbox_has_an_authenticate_endpoint() {
        let set = Node::Sandbox.endpoints().unwrap();
        assert!(set.authenticate.is_some());
        assert!(Node::Org2.endpoints().unwrap().authenticate.is_none());
    }

    #[test]
    fn bad_custom_url_fails_construction() {
        let err = EndpointSet::parse("not a url", "http://x/save", "http://x/delete").unwrap_err();
        assert!(matches!(err, Error::InvalidConnection(_)));
    }
}
