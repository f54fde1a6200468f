//! Resource manager identifier parsing.
//!
//! Ids have the shape
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`
//! optionally followed by `/{childType}/{childName}` pairs (deployment
//! slots live under `/slots/{slot}`).

use std::fmt;

use crate::error::ClientError;

/// A parsed resource manager identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider_namespace: String,
    pub resource_type: String,
    pub name: String,
    /// Nested `(type, name)` pairs below the top-level resource.
    pub children: Vec<(String, String)>,
}

impl ResourceId {
    /// Parses an id, rejecting anything that is not a provider resource.
    pub fn parse(id: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = id.trim();
        if !trimmed.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let segments: Vec<&str> = trimmed.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("contains an empty segment"));
        }
        if segments.len() < 8 {
            return Err(invalid("too few segments"));
        }
        if !segments[0].eq_ignore_ascii_case("subscriptions") {
            return Err(invalid("expected 'subscriptions'"));
        }
        if !segments[2].eq_ignore_ascii_case("resourceGroups") {
            return Err(invalid("expected 'resourceGroups'"));
        }
        if !segments[4].eq_ignore_ascii_case("providers") {
            return Err(invalid("expected 'providers'"));
        }

        let rest = &segments[8..];
        if rest.len() % 2 != 0 {
            return Err(invalid("child segments must come in type/name pairs"));
        }
        let children = rest
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            provider_namespace: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
            children,
        })
    }

    /// Returns the name of the first child of the given type, if any.
    pub fn child(&self, child_type: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(child_type))
            .map(|(_, n)| n.as_str())
    }

    /// The id of the top-level resource (children stripped).
    pub fn root(&self) -> ResourceId {
        ResourceId {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.provider_namespace,
            self.resource_type,
            self.name
        )?;
        for (t, n) in &self.children {
            write!(f, "/{t}/{n}")?;
        }
        Ok(())
    }
}
