//! Access request, resource descriptor, and request-context types.
//!
//! An `AccessRequest` is the immutable input bundle for one authorization
//! decision. Its `context` map is the only mutable part: context enrichers
//! attach derived facts to it (notably the resource's tag list) before the
//! engine evaluates the request.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known context key under which tag enrichers attach the ordered list
/// of `ResourceTag`s for the requested resource (`ContextValue::Tags`).
///
/// Part of the ABI between the engine, enrichers, and evaluators.
pub const CONTEXT_TAGS: &str = "TAGS";

/// Well-known context key under which the engine attaches the single
/// `ResourceTag` being evaluated (`ContextValue::Tag`).
///
/// Set only on synthetic tag requests, so tag-policy evaluators can inspect
/// tag attributes beyond the tag's name.
pub const CONTEXT_TAG_OBJECT: &str = "TAG_OBJECT";

/// A tag attached to a resource at request time.
///
/// Tag names are the match key for tag policies; attributes carry whatever
/// extra metadata the tag source provides (e.g. `expiry`, `source`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ResourceTag {
    /// Construct a tag with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }
}

/// A value stored in a request's context map.
///
/// The two well-known keys carry typed tag data; everything else an enricher
/// attaches travels as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextValue {
    /// Ordered tag list, stored under [`CONTEXT_TAGS`].
    Tags(Vec<ResourceTag>),
    /// A single tag, stored under [`CONTEXT_TAG_OBJECT`] on tag requests.
    Tag(ResourceTag),
    /// Arbitrary enricher-attached fact.
    Json(serde_json::Value),
}

/// The request's mutable context map.
pub type RequestContext = HashMap<String, ContextValue>;

/// A context map shared by reference between a request and any synthetic
/// tag requests derived from it: a write through one handle is visible
/// through the other.
pub type SharedContext = Arc<RwLock<RequestContext>>;

/// The resource an access request targets, as a mapping from
/// component-defined dimension names (e.g. `"database"`, `"table"`) to
/// values.
///
/// Backed by a `BTreeMap` so iteration order — and therefore
/// [`fingerprint`](AccessResource::fingerprint) — is stable regardless of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResource {
    elements: BTreeMap<String, String>,
}

impl AccessResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style constructor helper.
    pub fn with_value(mut self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(dimension, value);
        self
    }

    /// Set the value for one resource dimension, replacing any existing value.
    pub fn set_value(&mut self, dimension: impl Into<String>, value: impl Into<String>) {
        self.elements.insert(dimension.into(), value.into());
    }

    /// The value for a dimension, if present.
    pub fn value(&self, dimension: &str) -> Option<&str> {
        self.elements.get(dimension).map(String::as_str)
    }

    /// All (dimension, value) pairs in canonical (sorted) order.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// A canonical fingerprint of this resource: sorted `dimension=value`
    /// pairs joined with `;`.
    ///
    /// Logically equal resources produce identical fingerprints, which is
    /// what keys the repository's audit cache.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (dimension, value) in &self.elements {
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(dimension);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

/// The immutable input bundle for one authorization decision.
///
/// All fields except `context` are fixed once the request is built. The
/// engine reads the context during evaluation; enrichers write to it during
/// `enrich_context`, and the caller must not race its own context use
/// against enrichment.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// What is being accessed.
    pub resource: AccessResource,
    /// Who is accessing it.
    pub user: String,
    /// Groups the user belongs to.
    pub user_groups: HashSet<String>,
    /// The caller-level operation (e.g. `"query"`); opaque to the engine.
    pub action: String,
    /// The component-level access type policies match on (e.g. `"select"`).
    pub access_type: String,
    /// When the access was attempted (UTC).
    pub access_time: DateTime<Utc>,
    /// The client application type, if known.
    pub client_type: Option<String>,
    /// The client's network address, if known.
    pub client_ip_address: Option<String>,
    /// The client session, if any.
    pub session_id: Option<String>,
    /// Opaque request payload for audit sinks (e.g. the query text).
    pub request_data: Option<String>,
    /// Mutable context map, shared by reference with derived tag requests.
    pub context: SharedContext,
}

impl AccessRequest {
    /// Build a request with the given resource, user, and access type.
    ///
    /// `action` defaults to the access type, `access_time` to now, the
    /// client fields to `None`, and the context to a fresh empty map.
    pub fn new(
        resource: AccessResource,
        user: impl Into<String>,
        access_type: impl Into<String>,
    ) -> Self {
        let access_type = access_type.into();
        Self {
            resource,
            user: user.into(),
            user_groups: HashSet::new(),
            action: access_type.clone(),
            access_type,
            access_time: Utc::now(),
            client_type: None,
            client_ip_address: None,
            session_id: None,
            request_data: None,
            context: Arc::new(RwLock::new(RequestContext::new())),
        }
    }

    /// Insert a value into the shared context map.
    pub fn set_context_value(&self, key: impl Into<String>, value: ContextValue) {
        self.context
            .write()
            .expect("request context lock poisoned")
            .insert(key.into(), value);
    }

    /// A clone of the context value stored under `key`, if any.
    pub fn context_value(&self, key: &str) -> Option<ContextValue> {
        self.context
            .read()
            .expect("request context lock poisoned")
            .get(key)
            .cloned()
    }

    /// The tag list attached under [`CONTEXT_TAGS`], if an enricher has
    /// provided one.
    pub fn tags(&self) -> Option<Vec<ResourceTag>> {
        match self.context_value(CONTEXT_TAGS) {
            Some(ContextValue::Tags(tags)) => Some(tags),
            _ => None,
        }
    }
}
