//! The SQL AST: the selection tree annotated with everything needed to fetch it.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use query_engine_metadata::metadata;
use query_engine_sql::sql::ast::OrderByDirection;

/// A node of the SQL AST.
#[derive(Debug, Clone)]
pub enum SqlAstNode {
    Table(TableNode),
    /// A table behind a union or interface type.
    Union(TableNode),
    Column(ColumnNode),
    ColumnDeps(ColumnDepsNode),
    Composite(CompositeNode),
    Expression(ExpressionNode),
    Noop,
}

impl SqlAstNode {
    pub fn as_table(&self) -> Option<&TableNode> {
        match self {
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableNode> {
        match self {
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_table(self) -> Option<TableNode> {
        match self {
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => Some(table),
            _ => None,
        }
    }

    /// The field this node fetches, if it fetches one by itself.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => Some(&table.field_name),
            SqlAstNode::Column(column) => Some(&column.field_name),
            SqlAstNode::Composite(composite) => Some(&composite.field_name),
            SqlAstNode::Expression(expression) => Some(&expression.field_name),
            SqlAstNode::ColumnDeps(_) | SqlAstNode::Noop => None,
        }
    }
}

/// A table (or the table behind a union) and the fields selected from it.
#[derive(Debug, Clone)]
pub struct TableNode {
    pub field_name: String,
    /// The GraphQL type whose rows this table holds.
    pub type_name: String,
    /// The resolved table name, or any SQL yielding a relation.
    pub name: String,
    pub alias: String,
    pub args: metadata::Arguments,
    /// A list of rows rather than a single row.
    pub grab_many: bool,
    pub paginate: bool,
    pub order_by: Option<Vec<Ordering>>,
    /// Only set on paginated nodes.
    pub sort_key: Option<Vec<Ordering>>,
    pub limit: Option<u64>,
    pub where_: Option<metadata::WhereCondition>,
    /// How to fetch this table from its parent. None for the root.
    pub relation: Option<Relation>,
    pub children: Vec<SqlAstNode>,
    /// Children only selected for a concrete type of a union or interface.
    pub typed_children: IndexMap<String, Vec<SqlAstNode>>,
}

impl TableNode {
    /// Whether this table is fetched by a separate statement once its parent is fetched.
    pub fn is_batch_boundary(&self) -> bool {
        match &self.relation {
            Some(Relation::Batch(_)) => true,
            Some(Relation::Junction(junction)) => {
                matches!(junction.fetch, JunctionFetch::Batch { .. })
            }
            Some(Relation::DirectJoin(_)) | None => false,
        }
    }

    /// The key on this table's rows and the key on the parent's rows they match, when
    /// this table is fetched in batches.
    pub fn batch_keys(&self) -> Option<(&ColumnNode, &ColumnNode)> {
        match &self.relation {
            Some(Relation::Batch(keys)) => Some((&keys.this_key, &keys.parent_key)),
            Some(Relation::Junction(Junction {
                fetch:
                    JunctionFetch::Batch {
                        this_key,
                        parent_key,
                        ..
                    },
                ..
            })) => Some((this_key, parent_key)),
            _ => None,
        }
    }

    pub fn junction(&self) -> Option<&Junction> {
        match &self.relation {
            Some(Relation::Junction(junction)) => Some(junction),
            _ => None,
        }
    }

    /// The sort key of this node, or failing that of its junction.
    pub fn effective_sort_key(&self) -> Option<&[Ordering]> {
        self.sort_key
            .as_deref()
            .or_else(|| self.junction().and_then(|junction| junction.sort_key.as_deref()))
    }

    /// The ordering of this node, or failing that of its junction.
    pub fn effective_order_by(&self) -> Option<&[Ordering]> {
        self.order_by
            .as_deref()
            .or_else(|| self.junction().and_then(|junction| junction.order_by.as_deref()))
    }

    /// Every child list: the shared one first, then one per concrete type.
    pub fn child_lists(&self) -> impl Iterator<Item = &Vec<SqlAstNode>> {
        std::iter::once(&self.children).chain(self.typed_children.values())
    }

    /// The table children, shared and typed.
    pub fn table_children(&self) -> impl Iterator<Item = &TableNode> {
        self.child_lists()
            .flat_map(|children| children.iter())
            .filter_map(SqlAstNode::as_table)
    }
}

/// How a table is reached from its parent.
#[derive(Debug, Clone)]
pub enum Relation {
    /// Joined on a condition between the parent and this table.
    DirectJoin(metadata::JoinCondition),
    /// Through an intermediate table.
    Junction(Junction),
    /// Fetched separately for all parents at once.
    Batch(BatchKeys),
}

#[derive(Debug, Clone)]
pub struct BatchKeys {
    pub this_key: ColumnNode,
    pub parent_key: ColumnNode,
}

/// The intermediate table of a many-to-many relation.
#[derive(Debug, Clone)]
pub struct Junction {
    pub sql_table: String,
    pub alias: String,
    /// Fields of the junction table exposed on the target type.
    pub include: BTreeMap<String, metadata::FieldConfig>,
    pub where_: Option<metadata::WhereCondition>,
    pub order_by: Option<Vec<Ordering>>,
    pub sort_key: Option<Vec<Ordering>>,
    pub fetch: JunctionFetch,
}

#[derive(Debug, Clone)]
pub enum JunctionFetch {
    /// Parent to junction, then junction to target.
    Joins([metadata::JoinCondition; 2]),
    /// The junction is fetched in batches keyed on `this_key`, with the target joined to it.
    Batch {
        sql_join: metadata::JoinCondition,
        this_key: ColumnNode,
        parent_key: ColumnNode,
    },
}

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    pub name: String,
    pub field_name: String,
    pub alias: String,
    /// The alias of the table holding the column, when it is not the parent node's.
    pub from_other_table: Option<String>,
}

/// Columns needed by a field's resolver, keyed by column name with their aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDepsNode {
    pub columns: IndexMap<String, String>,
    pub from_other_table: Option<String>,
}

/// The concatenated columns of a composite unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeNode {
    pub names: Vec<String>,
    pub field_name: String,
    pub alias: String,
    pub from_other_table: Option<String>,
}

/// A field computed by a SQL expression over its table.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub sql_expr: metadata::SqlExpression,
    pub field_name: String,
    pub alias: String,
    pub args: metadata::Arguments,
    pub from_other_table: Option<String>,
}

/// A column and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub direction: OrderByDirection,
}
