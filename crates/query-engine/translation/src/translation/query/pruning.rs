//! Merge the column dependencies of sibling fields.

use indexmap::{IndexMap, IndexSet};

use crate::translation::aliases::{AliasKind, AliasNamespace};
use crate::translation::sql_ast::{ColumnDepsNode, SqlAstNode, TableNode};

/// Replace the `ColumnDeps` children of every table with one node per table they read
/// from, carrying the deduplicated columns under fresh aliases.
pub fn prune(node: &mut TableNode, namespace: &mut AliasNamespace) {
    prune_children(&mut node.children, namespace);
    for children in node.typed_children.values_mut() {
        prune_children(children, namespace);
    }
}

fn prune_children(children: &mut Vec<SqlAstNode>, namespace: &mut AliasNamespace) {
    // keyed on the alias of the table holding the columns, None for the node's own table
    let mut deps_by_table: IndexMap<Option<String>, IndexSet<String>> = IndexMap::new();

    for child in children.iter().rev() {
        if let SqlAstNode::ColumnDeps(deps) = child {
            deps_by_table
                .entry(deps.from_other_table.clone())
                .or_default()
                .extend(deps.columns.keys().cloned());
        }
    }

    children.retain(|child| !matches!(child, SqlAstNode::ColumnDeps(_)));

    for child in children.iter_mut() {
        if let Some(table) = child.as_table_mut() {
            prune(table, namespace);
        }
    }

    for (from_other_table, names) in deps_by_table {
        let columns = names
            .into_iter()
            .map(|name| {
                let alias = namespace.generate(AliasKind::Column, &name);
                (name, alias)
            })
            .collect();
        children.push(SqlAstNode::ColumnDeps(ColumnDepsNode {
            columns,
            from_other_table,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::sql_ast::ColumnNode;

    fn deps(columns: &[&str], from_other_table: Option<&str>) -> SqlAstNode {
        SqlAstNode::ColumnDeps(ColumnDepsNode {
            columns: columns
                .iter()
                .map(|c| ((*c).to_string(), (*c).to_string()))
                .collect(),
            from_other_table: from_other_table.map(str::to_string),
        })
    }

    fn column(name: &str) -> SqlAstNode {
        SqlAstNode::Column(ColumnNode {
            name: name.to_string(),
            field_name: name.to_string(),
            alias: name.to_string(),
            from_other_table: None,
        })
    }

    #[test]
    fn sibling_dependencies_on_one_table_merge() {
        let mut children = vec![
            column("id"),
            deps(&["first_name", "last_name"], None),
            deps(&["first_name", "email"], None),
            deps(&["tag"], Some("user_tags")),
        ];
        prune_children(&mut children, &mut AliasNamespace::new(false));

        assert_eq!(children.len(), 3);
        let SqlAstNode::ColumnDeps(own) = &children[2] else {
            panic!("expected merged dependencies, got {:?}", children[2]);
        };
        assert_eq!(own.from_other_table, None);
        assert_eq!(
            own.columns.keys().collect::<Vec<_>>(),
            vec!["first_name", "email", "last_name"]
        );
        let SqlAstNode::ColumnDeps(other) = &children[1] else {
            panic!("expected merged dependencies, got {:?}", children[1]);
        };
        assert_eq!(other.from_other_table.as_deref(), Some("user_tags"));
    }
}
