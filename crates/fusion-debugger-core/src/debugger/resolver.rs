//! Resolution of a prototype's inheritance chain into one merged definition.

use log::debug;

use super::merge::merge_definitions;
use crate::error::{DebuggerError, Result};
use crate::sorting::natural_cmp;
use crate::tree::{Branch, PROTOTYPE_CHAIN_KEY, STOP_INHERITANCE_CHAIN_KEY};

/// Resolves prototypes against a prototype table.
pub struct PrototypeResolver<'a> {
    prototypes: &'a Branch,
}

impl<'a> PrototypeResolver<'a> {
    pub fn new(prototypes: &'a Branch) -> Self {
        Self { prototypes }
    }

    /// The fully merged definition of `name`, inherited properties included.
    ///
    /// Ancestors merge root-first, the prototype's own declarations win last.
    /// Definitions without a chain come back unchanged.
    pub fn resolve(&self, name: &str) -> Result<Branch> {
        let mut resolving = Vec::new();
        self.resolve_chain(name, &mut resolving)
    }

    fn bare_definition(&self, name: &str) -> Result<Branch> {
        self.prototypes
            .get(name)
            .cloned()
            .map(|node| node.into_branch())
            .ok_or_else(|| DebuggerError::MissingPrototypeDefinition {
                name: name.to_string(),
            })
    }

    fn resolve_chain(&self, name: &str, resolving: &mut Vec<String>) -> Result<Branch> {
        let bare = self.bare_definition(name)?;
        let chain = match bare.prototype_chain() {
            Some(chain) if !chain.is_empty() => chain,
            _ => return Ok(bare),
        };

        if resolving.iter().any(|n| n == name) {
            return Err(DebuggerError::InvalidPrototypeDefinition {
                name: name.to_string(),
            });
        }
        resolving.push(name.to_string());
        debug!("Resolving {name} through {}", chain.join(" -> "));

        let root = chain[0].as_str();
        let mut definition = if root != name {
            self.resolve_chain(root, resolving)?
        } else {
            bare.clone()
        };
        for ancestor in &chain[1..] {
            let inherited = self.resolve_chain(ancestor, resolving)?;
            definition = merge_definitions(definition, &inherited);
        }
        if root != name {
            definition = merge_definitions(definition, &bare);
        }
        resolving.pop();

        definition.remove(PROTOTYPE_CHAIN_KEY);
        definition.remove(STOP_INHERITANCE_CHAIN_KEY);
        definition.sort_keys_recursive(natural_cmp);
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn table(value: Value) -> Branch {
        Node::from_json(value).into_branch()
    }

    #[test]
    fn definition_without_chain_is_unchanged() {
        let prototypes = table(json!({"Vendor:Plain": {"zeta": 1, "alpha": 2}}));
        let resolved = PrototypeResolver::new(&prototypes)
            .resolve("Vendor:Plain")
            .unwrap();
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn missing_prototype_is_an_error() {
        let prototypes = table(json!({}));
        let err = PrototypeResolver::new(&prototypes)
            .resolve("Vendor:Nope")
            .unwrap_err();
        assert!(matches!(
            err,
            DebuggerError::MissingPrototypeDefinition { name } if name == "Vendor:Nope"
        ));
    }

    #[test]
    fn nearest_ancestor_wins() {
        let prototypes = table(json!({
            "Root": {"color": "red", "size": "s"},
            "Mid": {"__prototypeChain": ["Root"], "color": "blue"},
            "Leaf": {"__prototypeChain": ["Root", "Mid"], "label": "leaf"}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("Leaf").unwrap();
        assert_eq!(resolved.get("color"), Some(&Node::string("blue")));
        assert_eq!(resolved.get("size"), Some(&Node::string("s")));
        assert!(!resolved.contains_key(PROTOTYPE_CHAIN_KEY));
    }

    #[test]
    fn local_override_wins() {
        let prototypes = table(json!({
            "A": {"x": "a"},
            "B": {"__prototypeChain": ["A"], "x": "b"},
            "P": {"__prototypeChain": ["A", "B"], "x": "local"}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("P").unwrap();
        assert_eq!(resolved.get("x"), Some(&Node::string("local")));
    }

    #[test]
    fn chained_result_is_naturally_sorted() {
        let prototypes = table(json!({
            "A": {"item10": 1, "item2": 2},
            "P": {"__prototypeChain": ["A"], "item1": 0}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("P").unwrap();
        assert_eq!(
            resolved.keys().collect::<Vec<_>>(),
            vec!["item1", "item2", "item10"]
        );
    }

    #[test]
    fn chained_wrappers_are_sorted_too() {
        let prototypes = table(json!({
            "A": {"title": {"__objectType": null, "__eelExpression": "props.title", "__value": null}},
            "P": {"__prototypeChain": ["A"]}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("P").unwrap();
        assert_eq!(
            resolved.to_json(),
            json!({"title": {"__eelExpression": "props.title", "__objectType": null, "__value": null}})
        );
        let keys: Vec<String> = resolved.to_json()["title"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["__eelExpression", "__objectType", "__value"]);
    }

    #[test]
    fn unset_marker_is_not_inherited() {
        let prototypes = table(json!({
            "A": {"__stopInheritanceChain": true, "x": "a"},
            "P": {"__prototypeChain": ["A"], "y": "p"}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("P").unwrap();
        assert_eq!(resolved.to_json(), json!({"x": "a", "y": "p"}));
    }

    #[test]
    fn self_rooted_chain_starts_from_bare_definition() {
        let prototypes = table(json!({
            "Mixin": {"y": "mixin"},
            "Self": {"__prototypeChain": ["Self", "Mixin"], "x": "own", "y": "own"}
        }));
        let resolved = PrototypeResolver::new(&prototypes).resolve("Self").unwrap();
        assert_eq!(resolved.get("x"), Some(&Node::string("own")));
        assert_eq!(resolved.get("y"), Some(&Node::string("mixin")));
    }

    #[test]
    fn unknown_ancestor_propagates() {
        let prototypes = table(json!({
            "P": {"__prototypeChain": ["Gone"], "x": 1}
        }));
        let err = PrototypeResolver::new(&prototypes).resolve("P").unwrap_err();
        assert!(matches!(
            err,
            DebuggerError::MissingPrototypeDefinition { name } if name == "Gone"
        ));
    }

    #[test]
    fn cyclic_chain_is_rejected() {
        let prototypes = table(json!({
            "A": {"__prototypeChain": ["B"]},
            "B": {"__prototypeChain": ["A"]}
        }));
        let err = PrototypeResolver::new(&prototypes).resolve("A").unwrap_err();
        assert!(matches!(err, DebuggerError::InvalidPrototypeDefinition { .. }));
    }
}
