//! Typed Fusion object tree: scalars, three-slot value wrappers and ordered branches.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Number, Value};

pub const EXPRESSION_KEY: &str = "__eelExpression";
pub const META_KEY: &str = "__meta";
pub const OBJECT_TYPE_KEY: &str = "__objectType";
pub const PROTOTYPE_CHAIN_KEY: &str = "__prototypeChain";
pub const PROTOTYPE_OBJECT_NAME_KEY: &str = "__prototypeObjectName";
pub const PROTOTYPES_KEY: &str = "__prototypes";
pub const STOP_INHERITANCE_CHAIN_KEY: &str = "__stopInheritanceChain";
pub const VALUE_KEY: &str = "__value";

/// Every reserved key the compiled object tree may contain.
pub const RESERVED_KEYS: &[&str] = &[
    EXPRESSION_KEY,
    META_KEY,
    OBJECT_TYPE_KEY,
    PROTOTYPE_CHAIN_KEY,
    PROTOTYPE_OBJECT_NAME_KEY,
    PROTOTYPES_KEY,
    STOP_INHERITANCE_CHAIN_KEY,
    VALUE_KEY,
];

/// The three keys making up a value wrapper.
pub const WRAPPER_KEYS: &[&str] = &[OBJECT_TYPE_KEY, EXPRESSION_KEY, VALUE_KEY];

static EMPTY_BRANCH: Branch = Branch::new();

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Loose emptiness: null, false, zero, `""` and `"0"`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::String(s) => s.is_empty() || s == "0",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of numbers and numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Value wrappers
// ---------------------------------------------------------------------------

/// The reserved `__objectType` / `__eelExpression` / `__value` node shape.
///
/// The wrapper remembers the order its keys were read in, so a key sort over
/// the surrounding tree reaches it as well.
#[derive(Debug, Clone)]
pub struct ValueWrapper {
    pub object_type: Option<String>,
    pub eel_expression: Option<String>,
    pub value: Scalar,
    key_order: [&'static str; 3],
}

impl PartialEq for ValueWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.object_type == other.object_type
            && self.eel_expression == other.eel_expression
            && self.value == other.value
    }
}

impl ValueWrapper {
    /// Recognise a wrapper: exactly the three reserved keys, string-or-null
    /// type and expression, scalar value.
    fn from_branch(branch: &Branch) -> Option<Self> {
        if branch.len() != WRAPPER_KEYS.len() {
            return None;
        }
        let object_type = optional_string(branch.get(OBJECT_TYPE_KEY)?)?;
        let eel_expression = optional_string(branch.get(EXPRESSION_KEY)?)?;
        let value = match branch.get(VALUE_KEY)? {
            Node::Scalar(s) => s.clone(),
            _ => return None,
        };
        let mut key_order = [OBJECT_TYPE_KEY, EXPRESSION_KEY, VALUE_KEY];
        for (slot, key) in key_order.iter_mut().zip(branch.keys()) {
            *slot = WRAPPER_KEYS.iter().find(|k| **k == key).copied()?;
        }
        Some(Self {
            object_type,
            eel_expression,
            value,
            key_order,
        })
    }

    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref().filter(|s| !s.is_empty())
    }

    pub fn eel_expression(&self) -> Option<&str> {
        self.eel_expression.as_deref().filter(|s| !s.is_empty())
    }

    pub fn value(&self) -> Option<&Scalar> {
        Some(&self.value).filter(|v| !v.is_empty())
    }

    /// The wrapper seen as a plain three-entry branch, keys in their current order.
    pub fn to_branch(&self) -> Branch {
        let slot = |s: &Option<String>| Node::Scalar(s.clone().map_or(Scalar::Null, Scalar::String));
        self.key_order
            .iter()
            .map(|&key| {
                let node = match key {
                    OBJECT_TYPE_KEY => slot(&self.object_type),
                    EXPRESSION_KEY => slot(&self.eel_expression),
                    _ => Node::Scalar(self.value.clone()),
                };
                (key.to_string(), node)
            })
            .collect()
    }

    pub fn sort_keys(&mut self, cmp: fn(&str, &str) -> Ordering) {
        self.key_order.sort_by(|a, b| cmp(a, b));
    }
}

fn optional_string(node: &Node) -> Option<Option<String>> {
    match node {
        Node::Scalar(Scalar::Null) => Some(None),
        Node::Scalar(Scalar::String(s)) => Some(Some(s.clone())),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A node of the object tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Wrapper(ValueWrapper),
    Branch(Branch),
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::string(value))
    }

    /// Classify a mapping once: wrapper shape or generic branch.
    pub fn from_branch(branch: Branch) -> Self {
        match ValueWrapper::from_branch(&branch) {
            Some(wrapper) => Self::Wrapper(wrapper),
            None => Self::Branch(branch),
        }
    }

    /// Build a node from JSON. Arrays become index-keyed branches.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            Value::String(s) => Self::Scalar(Scalar::String(s)),
            Value::Array(items) => Self::from_branch(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), Self::from_json(item)))
                    .collect(),
            ),
            Value::Object(map) => Self::from_branch(
                map.into_iter()
                    .map(|(key, item)| (key, Self::from_json(item)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(s) => s.to_json(),
            Self::Wrapper(w) => w.to_branch().to_json(),
            Self::Branch(b) => b.to_json(),
        }
    }

    pub fn is_mapping(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Self::Branch(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this node is a mapping carrying the `__objectType` key at all.
    pub fn declares_object_type(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Wrapper(_) => true,
            Self::Branch(b) => b.contains_key(OBJECT_TYPE_KEY),
        }
    }

    /// Mapping view of the node; scalars yield an empty branch.
    pub fn into_branch(self) -> Branch {
        match self {
            Self::Scalar(_) => Branch::new(),
            Self::Wrapper(w) => w.to_branch(),
            Self::Branch(b) => b,
        }
    }
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// Insertion-ordered mapping of path segments to nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    entries: Vec<(String, Node)>,
}

impl Branch {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, n)| n)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) -> Option<Node> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, node)),
            None => {
                self.entries.push((key, node));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Node) -> bool) {
        self.entries.retain(|(k, n)| keep(k, n));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn into_entries(self) -> Vec<(String, Node)> {
        self.entries
    }

    /// Non-empty `__objectType` entry of this branch.
    pub fn object_type(&self) -> Option<&str> {
        match self.get(OBJECT_TYPE_KEY) {
            Some(Node::Scalar(Scalar::String(s))) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// The `__prototypeChain` entry read back as an ordered list of names.
    pub fn prototype_chain(&self) -> Option<Vec<String>> {
        match self.get(PROTOTYPE_CHAIN_KEY)? {
            Node::Branch(chain) => Some(
                chain
                    .iter()
                    .filter_map(|(_, n)| n.as_scalar().and_then(Scalar::as_str))
                    .map(String::from)
                    .collect(),
            ),
            Node::Scalar(Scalar::String(single)) => Some(vec![single.clone()]),
            _ => Some(Vec::new()),
        }
    }

    /// Sort keys at every branch level with the given comparator.
    pub fn sort_keys_recursive(&mut self, cmp: fn(&str, &str) -> Ordering) {
        self.entries.sort_by(|(a, _), (b, _)| cmp(a, b));
        for (_, node) in &mut self.entries {
            match node {
                Node::Branch(child) => child.sort_keys_recursive(cmp),
                Node::Wrapper(wrapper) => wrapper.sort_keys(cmp),
                Node::Scalar(_) => {}
            }
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, n)| (k.clone(), n.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl FromIterator<(String, Node)> for Branch {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut branch = Branch::new();
        for (key, node) in iter {
            branch.insert(key, node);
        }
        branch
    }
}

impl IntoIterator for Branch {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Object tree
// ---------------------------------------------------------------------------

/// The merged object tree of all loaded Fusion files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTree {
    root: Branch,
}

impl ObjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_branch(root: Branch) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Branch {
        &self.root
    }

    pub fn into_root(self) -> Branch {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The prototype table; empty when no prototype was declared.
    pub fn prototypes(&self) -> &Branch {
        match self.root.get(PROTOTYPES_KEY) {
            Some(Node::Branch(prototypes)) => prototypes,
            _ => &EMPTY_BRANCH,
        }
    }

    pub fn prototype(&self, name: &str) -> Option<&Node> {
        self.prototypes().get(name)
    }

    /// Merge the declarations of another file into this tree.
    ///
    /// Later scalars win, mappings merge recursively, a later prototype chain
    /// replaces the earlier one.
    pub fn absorb(&mut self, declarations: Branch) {
        absorb_branch(&mut self.root, declarations);
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }
}

fn absorb_branch(base: &mut Branch, incoming: Branch) {
    for (key, node) in incoming {
        if key == PROTOTYPE_CHAIN_KEY || !node.is_mapping() {
            base.insert(key, node);
            continue;
        }
        match base.get_mut(&key) {
            Some(slot) if slot.is_mapping() => {
                let mut merged = std::mem::replace(slot, Node::Scalar(Scalar::Null)).into_branch();
                absorb_branch(&mut merged, node.into_branch());
                *slot = Node::from_branch(merged);
            }
            _ => {
                base.insert(key, node);
            }
        }
    }
}
