//! Display flattening of resolved definitions and object trees.
//!
//! Value wrappers collapse into markers or plain values, typed branches move
//! their prototype name into the key, `__meta` entries become `@` siblings and
//! empty branches disappear. Every level is then ordered positionally with
//! meta keys first.

use crate::sorting::sort_by_position;
use crate::tree::{
    Branch, Node, ValueWrapper, META_KEY, PROTOTYPE_OBJECT_NAME_KEY, STOP_INHERITANCE_CHAIN_KEY,
    WRAPPER_KEYS,
};

/// Prefix of unpacked meta properties.
pub const META_PREFIX: char = '@';

/// Suffix marking a prototype name missing from the prototype table.
pub const UNKNOWN_MARKER: &str = " (?)";

/// Flattens trees for display against a prototype table.
pub struct Flattener<'a> {
    prototypes: &'a Branch,
}

impl<'a> Flattener<'a> {
    pub fn new(prototypes: &'a Branch) -> Self {
        Self { prototypes }
    }

    pub fn flatten(&self, definition: &Branch) -> Branch {
        let mut flattened = self.flatten_branch(definition);
        flattened.remove(PROTOTYPE_OBJECT_NAME_KEY);
        flattened.remove(STOP_INHERITANCE_CHAIN_KEY);
        flattened
    }

    fn flatten_branch(&self, branch: &Branch) -> Branch {
        let mut results = Branch::new();

        for (key, node) in branch.iter() {
            match node {
                Node::Scalar(_) => {
                    results.insert(key, node.clone());
                }
                Node::Wrapper(wrapper) => {
                    if let Some(collapsed) = self.collapse(wrapper) {
                        results.insert(key, collapsed);
                    } else {
                        push_branch(&mut results, key, self.flatten_branch(&wrapper.to_branch()));
                    }
                }
                Node::Branch(child) if key == META_KEY => {
                    for (meta_key, meta_node) in self.flatten_branch(child) {
                        let unpacked = format!("{META_PREFIX}{meta_key}");
                        match meta_node {
                            Node::Branch(b) => push_branch(&mut results, &unpacked, b),
                            other => {
                                results.insert(unpacked, other);
                            }
                        }
                    }
                }
                Node::Branch(child) => match child.object_type() {
                    Some(object_type) => {
                        let mut properties = child.clone();
                        properties.retain(|k, _| !WRAPPER_KEYS.contains(&k));
                        let typed_key = self.marked(format!("{key} [{object_type}]"), object_type);
                        push_branch(&mut results, &typed_key, self.flatten_branch(&properties));
                    }
                    None => push_branch(&mut results, key, self.flatten_branch(child)),
                },
            }
        }

        order_entries(results)
    }

    /// The display value of a value wrapper, if it has one.
    fn collapse(&self, wrapper: &ValueWrapper) -> Option<Node> {
        if let Some(object_type) = wrapper.object_type() {
            return Some(Node::string(self.marked(format!("prototype({object_type})"), object_type)));
        }
        if let Some(value) = wrapper.value() {
            return Some(Node::Scalar(value.clone()));
        }
        wrapper
            .eel_expression()
            .map(|expression| Node::string(format!("${{{expression}}}")))
    }

    fn marked(&self, mut label: String, object_type: &str) -> String {
        if !self.is_known(object_type) {
            label.push_str(UNKNOWN_MARKER);
        }
        label
    }

    fn is_known(&self, object_type: &str) -> bool {
        self.prototypes.contains_key(object_type)
    }
}

fn push_branch(results: &mut Branch, key: &str, branch: Branch) {
    if !branch.is_empty() {
        results.insert(key, Node::Branch(branch));
    }
}

/// Positional order first, then meta entries hoisted and sorted case-insensitively.
fn order_entries(branch: Branch) -> Branch {
    let (mut meta, rest): (Vec<_>, Vec<_>) = sort_by_position(branch.into_entries())
        .into_iter()
        .partition(|(key, _)| key.starts_with(META_PREFIX));
    meta.sort_by_cached_key(|(key, _)| key.to_lowercase());
    meta.into_iter().chain(rest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn branch(value: Value) -> Branch {
        Node::from_json(value).into_branch()
    }

    fn flatten_with(prototypes: Value, definition: Value) -> Value {
        let prototypes = branch(prototypes);
        Flattener::new(&prototypes)
            .flatten(&branch(definition))
            .to_json()
    }

    #[test]
    fn known_prototype_reference() {
        let flat = flatten_with(
            json!({"Vendor:Button": {}}),
            json!({"foo": {"__objectType": "Vendor:Button", "__eelExpression": null, "__value": null}}),
        );
        assert_eq!(flat, json!({"foo": "prototype(Vendor:Button)"}));
    }

    #[test]
    fn unknown_prototype_reference() {
        let flat = flatten_with(
            json!({}),
            json!({"foo": {"__objectType": "Vendor:Button", "__eelExpression": null, "__value": null}}),
        );
        assert_eq!(flat, json!({"foo": "prototype(Vendor:Button) (?)"}));
    }

    #[test]
    fn wrapper_value_and_expression() {
        let flat = flatten_with(
            json!({}),
            json!({
                "title": {"__objectType": null, "__eelExpression": null, "__value": "Hello"},
                "body": {"__objectType": null, "__eelExpression": "q(node).property('text')", "__value": null}
            }),
        );
        assert_eq!(
            flat,
            json!({"title": "Hello", "body": "${q(node).property('text')}"})
        );
    }

    #[test]
    fn typed_branch_moves_type_into_key() {
        let flat = flatten_with(
            json!({"Neos.Fusion:Tag": {}}),
            json!({"wrapper": {
                "__objectType": "Neos.Fusion:Tag",
                "__eelExpression": null,
                "__value": null,
                "tagName": "div"
            }}),
        );
        assert_eq!(flat, json!({"wrapper [Neos.Fusion:Tag]": {"tagName": "div"}}));
    }

    #[test]
    fn meta_becomes_hoisted_siblings() {
        let flat = flatten_with(
            json!({}),
            json!({
                "content": "x",
                "__meta": {"process": {"wrap": "${value}"}, "Cache": {"mode": "cached"}}
            }),
        );
        assert_eq!(
            flat,
            json!({
                "@Cache": {"mode": "cached"},
                "@process": {"wrap": "${value}"},
                "content": "x"
            })
        );
    }

    #[test]
    fn empty_branches_are_pruned() {
        let flat = flatten_with(
            json!({}),
            json!({"a": {"b": {}, "c": {"d": {}}}, "e": 1, "__prototypeObjectName": "Vendor:Page"}),
        );
        assert_eq!(flat, json!({"e": 1}));
    }

    #[test]
    fn unset_marker_is_hidden() {
        let flat = flatten_with(
            json!({}),
            json!({"__stopInheritanceChain": true, "tagName": "div"}),
        );
        assert_eq!(flat, json!({"tagName": "div"}));
    }

    #[test]
    fn entries_follow_positions() {
        let flat = flatten_with(
            json!({}),
            json!({
                "footer": {"__meta": {"position": "end"}, "tag": "footer"},
                "body": {"__meta": {"position": "20"}, "tag": "main"},
                "header": {"__meta": {"position": "10"}, "tag": "header"}
            }),
        );
        let keys: Vec<String> = flat.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["header", "body", "footer"]);
    }

    #[test]
    fn flatten_is_idempotent_on_its_output() {
        let prototypes = branch(json!({"Vendor:Card": {}}));
        let flattener = Flattener::new(&prototypes);
        let once = flattener.flatten(&branch(json!({
            "items": {
                "b": {"__meta": {"position": "after a"}, "x": 1},
                "a": {"__objectType": "Vendor:Card", "__eelExpression": null, "__value": null, "y": 2}
            },
            "__meta": {"class": "page"}
        })));
        assert_eq!(flattener.flatten(&once), once);
    }
}
