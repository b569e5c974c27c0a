//! Set up table nodes: their relation to the parent, keys, ordering and pagination columns.

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::TOTAL_COLUMN;

use super::selections::{JunctionScope, ParentScope};
use super::sorting::{normalize_order_by, normalize_sort_key};
use super::Compiler;
use crate::translation::aliases::AliasKind;
use crate::translation::error::{ConfigurationError, Error};
use crate::translation::sql_ast::{
    BatchKeys, Junction, JunctionFetch, Ordering, Relation, SqlAstNode, TableNode,
};

/// A field resolving to a table, with its list and connection wrappers already removed.
pub(super) struct TableField<'f> {
    pub field: &'f metadata::Field,
    pub config: &'f metadata::FieldConfig,
    pub type_name: String,
    pub type_definition: &'f metadata::TypeDefinition,
    pub table: &'f metadata::TableConfig,
    pub grab_many: bool,
    pub paginate: bool,
    /// The selections on the row type.
    pub selections: &'f [metadata::Selection],
}

impl Compiler<'_> {
    pub(super) fn handle_table(
        &mut self,
        table_field: &TableField,
        existing: Option<TableNode>,
        depth: usize,
    ) -> Result<SqlAstNode, Error> {
        let is_new = existing.is_none();
        let mut node = match existing {
            Some(node) => node,
            None => self.table_node(table_field)?,
        };

        let junction_scope = node.junction().map(|junction| JunctionScope {
            alias: junction.alias.clone(),
            include: junction.include.clone(),
        });
        let scope = ParentScope {
            type_name: &table_field.type_name,
            type_definition: table_field.type_definition,
            junction: junction_scope.as_ref(),
        };

        let is_union = table_field.type_definition.kind.is_abstract();
        if is_union {
            self.handle_union_selections(&mut node, None, table_field.selections, &scope, depth)?;
        } else {
            self.handle_selections(&mut node, None, table_field.selections, &scope, depth, None)?;
        }

        // fetching this table on its own needs the key its rows are grouped on
        if is_new {
            if let Some((this_key, _)) = node.batch_keys() {
                let this_key = SqlAstNode::Column(this_key.clone());
                node.children.push(this_key);
            }
        }

        Ok(if is_union {
            SqlAstNode::Union(node)
        } else {
            SqlAstNode::Table(node)
        })
    }

    fn table_node(&mut self, table_field: &TableField) -> Result<TableNode, Error> {
        let TableField {
            field,
            config,
            table,
            ..
        } = table_field;
        let args = &field.arguments;
        let context = self.context;

        let name = table.sql_table.resolve(args, context);
        let alias = self.namespace.generate(AliasKind::Table, &field.name);
        let order_by = config
            .order_by
            .as_ref()
            .map(|order_by| normalize_order_by(&order_by.resolve(args, context)))
            .transpose()?;

        let mut children = Vec::new();
        let relation = self.relation(table_field, &mut children)?;
        let junction = match &relation {
            Some(Relation::Junction(junction)) => Some(junction),
            _ => None,
        };

        if order_by.is_some() && junction.is_some_and(|junction| junction.order_by.is_some()) {
            return Err(ConfigurationError::DuplicateOrdering {
                field: field.name.clone(),
                option: "orderBy",
            }
            .into());
        }

        let limit = config
            .limit
            .as_ref()
            .map(|limit| limit.resolve(args, context));
        if limit.is_some()
            && order_by.is_none()
            && !junction.is_some_and(|junction| junction.order_by.is_some())
        {
            return Err(ConfigurationError::LimitWithoutOrdering(field.name.clone()).into());
        }

        let sort_key = if table_field.paginate {
            let sort_key = config
                .sort_key
                .as_ref()
                .map(|sort_key| normalize_sort_key(&sort_key.resolve(args, context)))
                .transpose()?;
            let junction_sort_key = junction.and_then(|junction| junction.sort_key.as_ref());
            if sort_key.is_some() && junction_sort_key.is_some() {
                return Err(ConfigurationError::DuplicateOrdering {
                    field: field.name.clone(),
                    option: "sortKey",
                }
                .into());
            }
            if sort_key.is_none()
                && junction_sort_key.is_none()
                && order_by.is_none()
                && !junction.is_some_and(|junction| junction.order_by.is_some())
            {
                return Err(ConfigurationError::MissingSortKey(field.name.clone()).into());
            }
            sort_key
        } else {
            None
        };

        children.push(self.key_child(&table.unique_key, None));

        if let Some(always_fetch) = &table.always_fetch {
            for column in always_fetch.iter() {
                let name = column.build(&alias, args, context);
                children.push(SqlAstNode::Column(self.column_child(&name, None)));
            }
        }

        if table_field.paginate {
            let junction_alias = junction.map(|junction| junction.alias.clone());
            let junction_sort_key = junction.and_then(|junction| junction.sort_key.as_ref());
            let keyset: Option<(&Vec<Ordering>, Option<String>)> = match (&sort_key, junction_sort_key) {
                (Some(sort_key), _) => Some((sort_key, None)),
                (None, Some(sort_key)) => Some((sort_key, junction_alias.clone())),
                (None, None) => None,
            };
            match keyset {
                Some((orderings, from_other_table)) => {
                    let columns: Vec<String> =
                        orderings.iter().map(|o| o.column.clone()).collect();
                    for column in columns {
                        children.push(SqlAstNode::Column(
                            self.column_child(&column, from_other_table.clone()),
                        ));
                    }
                }
                None => {
                    children.push(SqlAstNode::Column(
                        self.column_child(TOTAL_COLUMN, junction_alias),
                    ));
                }
            }
        }

        Ok(TableNode {
            field_name: field.name.clone(),
            type_name: table_field.type_name.clone(),
            name,
            alias,
            args: args.clone(),
            grab_many: table_field.grab_many,
            paginate: table_field.paginate,
            order_by,
            sort_key,
            limit,
            where_: config.where_.clone(),
            relation,
            children,
            typed_children: indexmap::IndexMap::new(),
        })
    }

    /// How the table is fetched from its parent. Batched junctions also need their
    /// unique key among the node's children.
    fn relation(
        &mut self,
        table_field: &TableField,
        children: &mut Vec<SqlAstNode>,
    ) -> Result<Option<Relation>, Error> {
        let TableField {
            field,
            config,
            paginate,
            ..
        } = table_field;
        let args = &field.arguments;
        let context = self.context;

        if let Some(sql_join) = &config.sql_join {
            return Ok(Some(Relation::DirectJoin(sql_join.clone())));
        }

        if let Some(junction) = &config.junction {
            let sql_table = junction.sql_table.resolve(args, context);
            let alias = self.namespace.generate(AliasKind::Table, &sql_table);
            let order_by = junction
                .order_by
                .as_ref()
                .map(|order_by| normalize_order_by(&order_by.resolve(args, context)))
                .transpose()?;
            let sort_key = match &junction.sort_key {
                Some(sort_key) if *paginate => {
                    Some(normalize_sort_key(&sort_key.resolve(args, context))?)
                }
                _ => None,
            };

            let fetch = if let Some(sql_joins) = &junction.sql_joins {
                JunctionFetch::Joins(sql_joins.clone())
            } else if let Some(batch) = &junction.sql_batch {
                let unique_key = junction.unique_key.as_ref().ok_or_else(|| {
                    ConfigurationError::MissingJunctionUniqueKey(field.name.clone())
                })?;
                children.push(self.key_child(unique_key, Some(alias.clone())));
                JunctionFetch::Batch {
                    sql_join: batch.sql_join.clone(),
                    this_key: self.column_child(&batch.this_key, Some(alias.clone())),
                    parent_key: self.column_child(&batch.parent_key, None),
                }
            } else {
                return Err(ConfigurationError::JunctionWithoutFetch(field.name.clone()).into());
            };

            return Ok(Some(Relation::Junction(Junction {
                sql_table,
                alias,
                include: junction
                    .include
                    .as_ref()
                    .map(|include| include.resolve(args, context))
                    .unwrap_or_default(),
                where_: junction.where_.clone(),
                order_by,
                sort_key,
                fetch,
            })));
        }

        if let Some(batch) = &config.sql_batch {
            return Ok(Some(Relation::Batch(BatchKeys {
                this_key: self.column_child(&batch.this_key, None),
                parent_key: self.column_child(&batch.parent_key, None),
            })));
        }

        Ok(None)
    }
}
