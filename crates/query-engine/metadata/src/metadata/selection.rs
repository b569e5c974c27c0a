//! The selection tree of a request, as handed over by the query language front end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::thunk::Arguments;

/// A request: the fields selected on the parent type, plus the named fragments they may spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub parent_type: String,
    /// Every occurrence of the requested field; their selections are merged.
    pub field_nodes: Vec<Field>,
    #[serde(default)]
    pub fragments: BTreeMap<String, Fragment>,
}

/// A selected field with its resolved arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            alias: None,
            arguments: Arguments::new(),
            selections: vec![],
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        if let serde_json::Value::Object(arguments) = arguments {
            self.arguments = arguments;
        }
        self
    }

    #[must_use]
    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }
}

/// A named fragment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub type_condition: String,
    pub selections: Vec<Selection>,
}

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread),
}

impl Selection {
    /// A field without arguments or sub-selections.
    pub fn field(name: impl Into<String>) -> Self {
        Selection::Field(Field::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFragment {
    /// Applies to the enclosing type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpread {
    pub name: String,
}
