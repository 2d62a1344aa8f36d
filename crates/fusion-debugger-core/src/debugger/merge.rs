//! Deep merge of prototype definitions with Fusion override semantics.

use crate::tree::{Branch, Node, Scalar};

/// Merge `extender` onto `base`, key by key.
///
/// Scalars, keys new to `base` and mappings declaring `__objectType` replace the
/// base entry outright; other mappings merge recursively. Assigning a new
/// prototype to a property thus discards what the base configured for that slot.
pub fn merge_definitions(mut base: Branch, extender: &Branch) -> Branch {
    for (key, value) in extender.iter() {
        let slot = match base.get_mut(key) {
            Some(slot) if slot.is_mapping() && value.is_mapping() && !value.declares_object_type() => slot,
            _ => {
                base.insert(key, value.clone());
                continue;
            }
        };

        let current = std::mem::replace(slot, Node::Scalar(Scalar::Null)).into_branch();
        let extension = value.clone().into_branch();
        *slot = Node::from_branch(merge_definitions(current, &extension));
    }
    base
}
