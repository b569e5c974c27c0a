//! Compile a single field into a node.

use std::borrow::Cow;

use query_engine_metadata::metadata;

use super::selections::ParentScope;
use super::tables::TableField;
use super::Compiler;
use crate::translation::aliases::AliasKind;
use crate::translation::error::{ConfigurationError, Error};
use crate::translation::sql_ast::{
    ColumnDepsNode, ColumnNode, CompositeNode, ExpressionNode, SqlAstNode, TableNode,
};

impl Compiler<'_> {
    /// Compile `field`, selected on the `parent` type, into a node.
    ///
    /// When the field was already selected as a table, `existing` is that table and the
    /// new selections are added to it.
    pub(super) fn populate(
        &mut self,
        field: &metadata::Field,
        parent: &ParentScope,
        depth: usize,
        deferred_from: Option<&str>,
        existing: Option<TableNode>,
    ) -> Result<SqlAstNode, Error> {
        // introspection
        if field.name.starts_with("__") {
            return Ok(SqlAstNode::Noop);
        }

        let definition = parent.type_definition.lookup_field(&field.name).ok_or_else(|| {
            ConfigurationError::UnknownField {
                field: field.name.clone(),
                parent_type: parent.type_name.to_string(),
            }
        })?;

        // fields a junction table exposes on its target
        let included = parent.junction.and_then(|junction| {
            junction
                .include
                .get(&field.name)
                .map(|include| (junction.alias.clone(), include))
        });
        let (config, from_other_table) = match included {
            Some((alias, include)) => (Cow::Owned(definition.config.merged_with(include)), Some(alias)),
            None => (Cow::Borrowed(&definition.config), None),
        };

        if config.ignore_all {
            return Ok(SqlAstNode::Noop);
        }

        let schema = self.schema;
        let mut field_type = definition.r#type.nullable();
        let mut grab_many = false;
        if let metadata::TypeRef::List(item) = field_type {
            grab_many = true;
            field_type = item.nullable();
        }
        let mut type_name = field_type.named_type().to_string();
        let mut selections = Cow::Borrowed(field.selections.as_slice());
        let mut paginate = false;

        let connection = schema
            .lookup_type(&type_name)
            .filter(|definition| {
                definition.kind == metadata::TypeKind::Object && definition.is_connection()
            });
        if let Some(connection) = connection {
            grab_many = true;
            let (node_type, node_selections) =
                self.unwrap_connection(&type_name, connection, &field.selections)?;
            type_name = node_type;
            selections = Cow::Owned(node_selections);
            paginate = config.sql_paginate;
        } else if config.sql_paginate {
            return Err(ConfigurationError::PaginationOnNonConnection {
                field: field.name.clone(),
                type_name,
            }
            .into());
        }

        if let Some(type_definition) = schema.lookup_type(&type_name) {
            if let Some(table) = type_definition
                .table
                .as_ref()
                .filter(|_| type_definition.kind.is_composite() && !config.ignore_table)
            {
                if depth >= 1 {
                    check_relation(&config, &field.name, parent.type_name)?;
                }
                return self.handle_table(
                    &TableField {
                        field,
                        config: &config,
                        type_name,
                        type_definition,
                        table,
                        grab_many,
                        paginate,
                        selections: &selections,
                    },
                    existing,
                    depth,
                );
            }
        }

        let alias_from = match deferred_from {
            Some(type_name) => format!("{}@{type_name}", field.name),
            None => field.name.clone(),
        };

        if let Some(sql_expr) = &config.sql_expr {
            return Ok(SqlAstNode::Expression(ExpressionNode {
                sql_expr: sql_expr.clone(),
                field_name: field.name.clone(),
                alias: self.namespace.generate(AliasKind::Column, &alias_from),
                args: field.arguments.clone(),
                from_other_table,
            }));
        }

        if let Some(sql_deps) = &config.sql_deps {
            return Ok(SqlAstNode::ColumnDeps(ColumnDepsNode {
                columns: sql_deps
                    .iter()
                    .map(|name| {
                        (
                            name.clone(),
                            self.namespace.generate(AliasKind::Column, name),
                        )
                    })
                    .collect(),
                from_other_table,
            }));
        }

        if config.sql_column.is_some()
            || matches!(
                parent.type_definition.kind,
                metadata::TypeKind::Object | metadata::TypeKind::Interface
            )
        {
            return Ok(SqlAstNode::Column(ColumnNode {
                name: config.sql_column.clone().unwrap_or_else(|| field.name.clone()),
                field_name: field.name.clone(),
                alias: self.namespace.generate(AliasKind::Column, &alias_from),
                from_other_table,
            }));
        }

        Ok(SqlAstNode::Noop)
    }

    /// A column fetched under its own name.
    pub(super) fn column_child(&mut self, name: &str, from_other_table: Option<String>) -> ColumnNode {
        ColumnNode {
            name: name.to_string(),
            field_name: name.to_string(),
            alias: self.namespace.generate(AliasKind::Column, name),
            from_other_table,
        }
    }

    /// The node fetching a unique key: a column, or a composite of several.
    pub(super) fn key_child(
        &mut self,
        key: &metadata::UniqueKey,
        from_other_table: Option<String>,
    ) -> SqlAstNode {
        match key {
            metadata::SingleOrList::Single(name) => {
                SqlAstNode::Column(self.column_child(name, from_other_table))
            }
            metadata::SingleOrList::List(names) => {
                let field_name = names
                    .iter()
                    .map(|name| name.chars().take(3).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("#");
                SqlAstNode::Composite(CompositeNode {
                    names: names.clone(),
                    alias: self.namespace.generate(AliasKind::Column, &field_name),
                    field_name,
                    from_other_table,
                })
            }
        }
    }
}

/// A nested table needs exactly one way of being fetched from its parent.
fn check_relation(
    config: &metadata::FieldConfig,
    field_name: &str,
    parent_type: &str,
) -> Result<(), ConfigurationError> {
    let strategies = [
        config.sql_join.is_some(),
        config.sql_batch.is_some(),
        config.junction.is_some(),
    ]
    .into_iter()
    .filter(|declared| *declared)
    .count();
    match strategies {
        1 => Ok(()),
        0 => Err(ConfigurationError::MissingRelation {
            field: field_name.to_string(),
            parent_type: parent_type.to_string(),
        }),
        _ => Err(ConfigurationError::AmbiguousRelation {
            field: field_name.to_string(),
            parent_type: parent_type.to_string(),
        }),
    }
}
