//! The shape rows are nested into: which column of a flat row becomes which property.

use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use super::sql_ast::{SqlAstNode, TableNode};
use super::stringify::join_prefix;

/// One object of the result. Its first property identifies it among the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectShape {
    /// Whether the property holds a list of such objects.
    pub many: bool,
    pub properties: IndexMap<String, PropertyShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyShape {
    /// The alias of the column holding the value.
    Column(String),
    Object(ObjectShape),
}

/// A list is written as a list holding the shape of its items.
impl Serialize for ObjectShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.many {
            let mut seq = serializer.serialize_seq(Some(1))?;
            seq.serialize_element(&self.properties)?;
            seq.end()
        } else {
            self.properties.serialize(serializer)
        }
    }
}

impl ObjectShape {
    /// The same shape, as a list.
    #[must_use]
    pub fn as_many(mut self) -> ObjectShape {
        self.many = true;
        self
    }

    /// The column identifying each object.
    pub fn identity(&self) -> Option<&str> {
        self.properties.values().next().and_then(|property| match property {
            PropertyShape::Column(column) => Some(column.as_str()),
            PropertyShape::Object(_) => None,
        })
    }
}

/// The shape of the rows fetched for `root` by one statement. Tables fetched by a later
/// statement only leave behind the parent key they are matched on.
pub fn define_object_shape(root: &TableNode) -> ObjectShape {
    object_shape(root, &[])
}

fn object_shape(node: &TableNode, prefix: &[&str]) -> ObjectShape {
    let mut child_prefix = prefix.to_vec();
    child_prefix.push(&node.alias);
    let column_prefix = join_prefix(&child_prefix);

    let mut properties = IndexMap::new();
    add_properties(&mut properties, &node.children, "", &column_prefix, &child_prefix);
    for (type_name, children) in &node.typed_children {
        let suffix = format!("@{type_name}");
        add_properties(&mut properties, children, &suffix, &column_prefix, &child_prefix);
    }

    ObjectShape {
        many: node.grab_many,
        properties,
    }
}

fn add_properties(
    properties: &mut IndexMap<String, PropertyShape>,
    children: &[SqlAstNode],
    suffix: &str,
    column_prefix: &str,
    child_prefix: &[&str],
) {
    let column = |alias: &str| PropertyShape::Column(format!("{column_prefix}{alias}"));
    for child in children {
        match child {
            SqlAstNode::Column(node) => {
                properties.insert(format!("{}{suffix}", node.field_name), column(&node.alias));
            }
            SqlAstNode::Composite(node) => {
                properties.insert(format!("{}{suffix}", node.field_name), column(&node.alias));
            }
            SqlAstNode::Expression(node) => {
                properties.insert(format!("{}{suffix}", node.field_name), column(&node.alias));
            }
            SqlAstNode::ColumnDeps(node) => {
                for (name, alias) in &node.columns {
                    properties.insert(format!("{name}{suffix}"), column(alias));
                }
            }
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => {
                match table.batch_keys() {
                    Some((_, parent_key)) => {
                        properties.insert(
                            format!("{}{suffix}", parent_key.field_name),
                            column(&parent_key.alias),
                        );
                    }
                    None => {
                        properties.insert(
                            format!("{}{suffix}", table.field_name),
                            PropertyShape::Object(object_shape(table, child_prefix)),
                        );
                    }
                }
            }
            SqlAstNode::Noop => {}
        }
    }
}
