//! Synthetic requests for tag-policy evaluation.
//!
//! Tag policies match on tag names, not resource descriptors. To run them
//! through the same evaluator contract, the engine derives one synthetic
//! request per tag: a single-dimension `"tag"` resource, the original
//! request's identity fields, a component-prefixed access type, and the
//! original context map shared by reference.

use std::sync::Arc;

use warden_contracts::request::{
    AccessRequest, AccessResource, ContextValue, ResourceTag, CONTEXT_TAG_OBJECT,
};

/// The resource dimension name used by synthetic tag requests.
pub const TAG_RESOURCE_DIMENSION: &str = "tag";

/// Derive a synthetic access request for evaluating `tag`'s policies.
///
/// The access type is prefixed `"{component_name}:{access_type}"` to
/// namespace the action against the component that owns the underlying
/// resource. The tag itself is inserted into the shared context under
/// [`CONTEXT_TAG_OBJECT`], so evaluators can inspect tag attributes beyond
/// the name — and since the context map is shared by reference, the insert
/// is visible through the original request as well.
pub fn tag_access_request(
    tag: &ResourceTag,
    component_name: &str,
    original: &AccessRequest,
) -> AccessRequest {
    original.set_context_value(CONTEXT_TAG_OBJECT, ContextValue::Tag(tag.clone()));

    AccessRequest {
        resource: AccessResource::new().with_value(TAG_RESOURCE_DIMENSION, tag.name.clone()),
        user: original.user.clone(),
        user_groups: original.user_groups.clone(),
        action: original.action.clone(),
        access_type: format!("{}:{}", component_name, original.access_type),
        access_time: original.access_time,
        client_type: original.client_type.clone(),
        client_ip_address: original.client_ip_address.clone(),
        session_id: original.session_id.clone(),
        request_data: original.request_data.clone(),
        context: Arc::clone(&original.context),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
