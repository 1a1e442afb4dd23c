//! Flatten/expand helpers shared by all resources
//!
//! Expand converts Terraform-typed values into the shapes the API expects;
//! flatten converts API values back into state. Anything absent on either
//! side stays absent.

use tfplug::types::{AttributePath, Dynamic, DynamicValue};

/// Expand a list-of-strings attribute. Missing, null, and unknown values
/// all expand to `None` so they are omitted from the payload.
pub fn expand_string_list(value: &DynamicValue, path: &AttributePath) -> Option<Vec<String>> {
    let items = value.get_list(path).ok()?;
    let mut members = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Dynamic::String(s) => members.push(s),
            _ => return None,
        }
    }
    Some(members)
}

/// Flatten an API member list into a state value.
pub fn flatten_string_list(members: &[String]) -> Dynamic {
    Dynamic::List(
        members
            .iter()
            .map(|m| Dynamic::String(m.clone()))
            .collect(),
    )
}
