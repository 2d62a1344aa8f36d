//! Parser seam and the compiled object tree adapter.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::tree::{Node, ObjectTree, PROTOTYPES_KEY, PROTOTYPE_CHAIN_KEY, RESERVED_KEYS};

/// Turns Fusion source into declarations merged onto an accumulated object tree.
pub trait FusionParser {
    /// Parse `source` and merge its declarations into `accumulator`.
    ///
    /// `path_label` identifies the source in diagnostics.
    fn parse(
        &self,
        source: &str,
        path_label: &str,
        accumulator: ObjectTree,
    ) -> Result<ObjectTree, ParseError>;
}

static INCLUDE_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^include:").unwrap());

/// Comment out line-leading `include:` statements so that included files are
/// not parsed, and reported, twice.
pub fn normalize_includes(source: &str) -> String {
    INCLUDE_STATEMENT.replace_all(source, "#include:").into_owned()
}

/// Reads object trees compiled by the framework and exported as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeParser;

impl JsonTreeParser {
    pub fn new() -> Self {
        Self
    }
}

impl FusionParser for JsonTreeParser {
    fn parse(
        &self,
        source: &str,
        path_label: &str,
        mut accumulator: ObjectTree,
    ) -> Result<ObjectTree, ParseError> {
        let document: Value = serde_json::from_str(source).map_err(|e| {
            let message = e.to_string();
            let message = message
                .rsplit_once(" at line ")
                .map_or(message.as_str(), |(m, _)| m)
                .to_string();
            ParseError::Syntax {
                line: e.line(),
                column: e.column(),
                message,
            }
        })?;

        let Value::Object(declarations) = document else {
            return Err(ParseError::UnknownDeclaration {
                declaration: format!("{path_label} is not an object tree"),
            });
        };
        validate(&declarations, "")?;

        accumulator.absorb(Node::from_json(Value::Object(declarations)).into_branch());
        Ok(accumulator)
    }
}

fn validate(declarations: &Map<String, Value>, path: &str) -> Result<(), ParseError> {
    for (key, value) in declarations {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        if key.starts_with("__") && !RESERVED_KEYS.contains(&key.as_str()) {
            return Err(ParseError::UnknownDeclaration {
                declaration: child_path,
            });
        }

        if key == PROTOTYPES_KEY {
            validate_prototypes(value, &child_path)?;
        } else if let Value::Object(children) = value {
            validate(children, &child_path)?;
        }
    }
    Ok(())
}

fn validate_prototypes(table: &Value, path: &str) -> Result<(), ParseError> {
    let Value::Object(prototypes) = table else {
        return Err(ParseError::UnknownDeclaration {
            declaration: path.to_string(),
        });
    };

    for (name, definition) in prototypes {
        let Value::Object(definition) = definition else {
            return Err(ParseError::UnknownDeclaration {
                declaration: format!("prototype({name})"),
            });
        };
        if let Some(chain) = definition.get(PROTOTYPE_CHAIN_KEY) {
            let valid = chain
                .as_array()
                .is_some_and(|names| names.iter().all(Value::is_string));
            if !valid {
                return Err(ParseError::InvalidPrototypeChain {
                    prototype: name.clone(),
                });
            }
        }
        validate(definition, &format!("prototype({name})"))?;
    }
    Ok(())
}
