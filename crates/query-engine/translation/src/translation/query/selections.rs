//! Walk selection sets, fragments and connection wrappers.

use std::collections::BTreeMap;

use query_engine_metadata::metadata;

use super::Compiler;
use crate::translation::error::{ConfigurationError, Error};
use crate::translation::sql_ast::{SqlAstNode, TableNode};

/// The type whose selection set is being compiled.
pub(super) struct ParentScope<'s> {
    pub type_name: &'s str,
    pub type_definition: &'s metadata::TypeDefinition,
    /// The junction of the table being selected from, if any.
    pub junction: Option<&'s JunctionScope>,
}

pub(super) struct JunctionScope {
    pub alias: String,
    pub include: BTreeMap<String, metadata::FieldConfig>,
}

impl ParentScope<'_> {
    /// Whether a fragment on `type_condition` applies to this type.
    fn matches(&self, type_condition: Option<&str>) -> bool {
        type_condition.map_or(true, |condition| {
            condition == self.type_name
                || self
                    .type_definition
                    .interfaces
                    .iter()
                    .any(|interface| interface == condition)
        })
    }
}

/// The children of `node` selections go into: the shared ones or a concrete type's.
fn bucket<'n>(node: &'n mut TableNode, typed: Option<&str>) -> &'n mut Vec<SqlAstNode> {
    match typed {
        None => &mut node.children,
        Some(type_name) => node
            .typed_children
            .entry(type_name.to_string())
            .or_default(),
    }
}

impl<'a> Compiler<'a> {
    /// Selections on an object type.
    pub(super) fn handle_selections(
        &mut self,
        node: &mut TableNode,
        typed: Option<&str>,
        selections: &[metadata::Selection],
        scope: &ParentScope,
        depth: usize,
        deferred_from: Option<&str>,
    ) -> Result<(), Error> {
        for selection in selections {
            match selection {
                metadata::Selection::Field(field) => {
                    self.add_field(node, typed, field, scope, depth, deferred_from)?;
                }
                metadata::Selection::InlineFragment(fragment) => {
                    if scope.matches(fragment.type_condition.as_deref()) {
                        self.handle_selections(
                            node,
                            typed,
                            &fragment.selections,
                            scope,
                            depth,
                            deferred_from,
                        )?;
                    }
                }
                metadata::Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment(&spread.name)?;
                    if scope.matches(Some(fragment.type_condition.as_str())) {
                        self.handle_selections(
                            node,
                            typed,
                            &fragment.selections,
                            scope,
                            depth,
                            deferred_from,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Selections on a union or interface type. Fragments on a concrete type fill that
    /// type's own children; fields and fragments on abstract types are shared.
    pub(super) fn handle_union_selections(
        &mut self,
        node: &mut TableNode,
        typed: Option<&str>,
        selections: &[metadata::Selection],
        scope: &ParentScope,
        depth: usize,
    ) -> Result<(), Error> {
        for selection in selections {
            match selection {
                metadata::Selection::Field(field) => {
                    self.add_field(node, typed, field, scope, depth, None)?;
                }
                metadata::Selection::InlineFragment(fragment) => {
                    let type_condition = fragment
                        .type_condition
                        .as_deref()
                        .unwrap_or(scope.type_name);
                    self.handle_typed_fragment(
                        node,
                        typed,
                        type_condition,
                        &fragment.selections,
                        scope,
                        depth,
                    )?;
                }
                metadata::Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment(&spread.name)?;
                    self.handle_typed_fragment(
                        node,
                        typed,
                        &fragment.type_condition,
                        &fragment.selections,
                        scope,
                        depth,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn handle_typed_fragment(
        &mut self,
        node: &mut TableNode,
        typed: Option<&str>,
        type_condition: &str,
        selections: &[metadata::Selection],
        scope: &ParentScope,
        depth: usize,
    ) -> Result<(), Error> {
        let schema = self.schema;
        let (type_name, type_definition) = schema
            .types
            .get_key_value(type_condition)
            .ok_or_else(|| ConfigurationError::UnknownType(type_condition.to_string()))?;
        let fragment_scope = ParentScope {
            type_name,
            type_definition,
            junction: scope.junction,
        };
        if type_definition.kind == metadata::TypeKind::Object {
            self.handle_selections(
                node,
                Some(type_name.as_str()),
                selections,
                &fragment_scope,
                depth,
                Some(type_name.as_str()),
            )
        } else {
            self.handle_union_selections(node, typed, selections, &fragment_scope, depth)
        }
    }

    /// Compile a field into the right child list, adding to a table already selected
    /// under the same name.
    fn add_field(
        &mut self,
        node: &mut TableNode,
        typed: Option<&str>,
        field: &metadata::Field,
        scope: &ParentScope,
        depth: usize,
        deferred_from: Option<&str>,
    ) -> Result<(), Error> {
        let children = bucket(node, typed);
        let existing = children
            .iter()
            .position(|child| child.as_table().is_some_and(|table| table.field_name == field.name));
        match existing {
            Some(index) => {
                let previous = std::mem::replace(&mut children[index], SqlAstNode::Noop);
                let merged =
                    self.populate(field, scope, depth + 1, deferred_from, previous.into_table())?;
                bucket(node, typed)[index] = merged;
            }
            None => {
                let child = self.populate(field, scope, depth + 1, deferred_from, None)?;
                bucket(node, typed).push(child);
            }
        }
        Ok(())
    }

    fn fragment(&self, name: &str) -> Result<&'a metadata::Fragment, Error> {
        let fragments = self.fragments;
        fragments
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownFragment(name.to_string()).into())
    }

    /// Find the row type of a connection and the selections made on `edges { node }`.
    pub(super) fn unwrap_connection(
        &self,
        connection_type: &str,
        connection: &metadata::TypeDefinition,
        selections: &[metadata::Selection],
    ) -> Result<(String, Vec<metadata::Selection>), Error> {
        let schema = self.schema;
        let edges = connection.lookup_field("edges").ok_or_else(|| {
            ConfigurationError::UnknownField {
                field: "edges".to_string(),
                parent_type: connection_type.to_string(),
            }
        })?;
        let edge_type = edges.r#type.named_type();
        let node = schema
            .lookup_type(edge_type)
            .ok_or_else(|| ConfigurationError::UnknownType(edge_type.to_string()))?
            .lookup_field("node")
            .ok_or_else(|| ConfigurationError::UnknownField {
                field: "node".to_string(),
                parent_type: edge_type.to_string(),
            })?;

        let mut edge_fields = Vec::new();
        self.spread_fragments(selections, connection_type, &mut edge_fields)?;
        let mut node_fields = Vec::new();
        for edges in edge_fields.iter().filter(|field| field.name == "edges") {
            self.spread_fragments(&edges.selections, edge_type, &mut node_fields)?;
        }
        let node_selections = node_fields
            .into_iter()
            .filter(|field| field.name == "node")
            .flat_map(|field| field.selections)
            .collect();

        Ok((node.r#type.named_type().to_string(), node_selections))
    }

    /// The fields of a selection set on `type_name`, looking into its fragments.
    fn spread_fragments(
        &self,
        selections: &[metadata::Selection],
        type_name: &str,
        fields: &mut Vec<metadata::Field>,
    ) -> Result<(), Error> {
        for selection in selections {
            match selection {
                metadata::Selection::Field(field) => fields.push(field.clone()),
                metadata::Selection::InlineFragment(fragment) => {
                    if fragment
                        .type_condition
                        .as_deref()
                        .map_or(true, |condition| condition == type_name)
                    {
                        self.spread_fragments(&fragment.selections, type_name, fields)?;
                    }
                }
                metadata::Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment(&spread.name)?;
                    self.spread_fragments(&fragment.selections, type_name, fields)?;
                }
            }
        }
        Ok(())
    }
}
