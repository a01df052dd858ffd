//! Saved filters and the incident query criteria they carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::FilterPk;
use crate::error::ValidationError;

/// A `key=value` tag, as attached to incidents and used in filter
/// predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    /// Tag key (left of the first `=`).
    pub key: String,
    /// Tag value (everything after the first `=`).
    pub value: String,
}

impl Tag {
    /// Creates a tag from its parts.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if the value is an absolute URL and can be rendered
    /// as a link.
    #[must_use]
    pub fn is_url(&self) -> bool {
        url::Url::parse(&self.value).is_ok()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for Tag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Self::new(key.trim(), value)),
            _ => Err(ValidationError::InvalidTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

/// Match criteria of a filter: the query shape sent to the incident list
/// endpoint.
///
/// `None` on a tri-state predicate means "both".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Match open (`Some(true)`) or closed (`Some(false)`) incidents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    /// Match acknowledged (`Some(true)`) or unacknowledged incidents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acked: Option<bool>,
    /// Restrict to these source systems. Empty matches every source.
    #[serde(default, rename = "sourceSystemIds")]
    pub source_system_ids: Vec<i64>,
    /// Incidents must carry all of these tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl FilterCriteria {
    /// Criteria matching only open incidents, the dashboard's default
    /// view.
    #[must_use]
    pub fn open_only() -> Self {
        Self {
            open: Some(true),
            ..Self::default()
        }
    }
}

/// A filter that has not been persisted yet and so has no `pk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDraft {
    /// Requested display name. The server may normalize it.
    pub name: String,
    /// Match criteria.
    pub criteria: FilterCriteria,
}

impl FilterDraft {
    /// Creates a draft with the given name and criteria.
    #[must_use]
    pub fn new(name: impl Into<String>, criteria: FilterCriteria) -> Self {
        Self {
            name: name.into(),
            criteria,
        }
    }

    /// Finalizes the draft with the identity assigned by the server.
    #[must_use]
    pub fn into_filter(self, pk: FilterPk, name: String) -> Filter {
        Filter {
            pk,
            name,
            criteria: self.criteria,
        }
    }
}

/// A persisted saved filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Server-assigned identity.
    pub pk: FilterPk,
    /// Display name.
    pub name: String,
    /// Match criteria.
    pub criteria: FilterCriteria,
}
