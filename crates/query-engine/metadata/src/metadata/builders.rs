//! SQL fragment builders attached to types and fields.
//!
//! A builder is either a template string, where `{parent}`, `{child}` and `{table}` are replaced
//! by the already quoted aliases of the tables involved, or a closure computing the fragment.

use std::fmt;
use std::sync::Arc;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::thunk::{Arguments, Context};

/// Builds a join condition from the (quoted) parent and child aliases.
pub type JoinFn = dyn Fn(&str, &str, &Arguments, &Context) -> String + Send + Sync;
/// Builds an optional predicate over the (quoted) table alias.
pub type WhereFn = dyn Fn(&str, &Arguments, &Context) -> Option<String> + Send + Sync;
/// Builds a SQL fragment over the (quoted) table alias.
pub type TableFn = dyn Fn(&str, &Arguments, &Context) -> String + Send + Sync;

/// A SQL fragment builder.
pub enum SqlTemplate<F: ?Sized> {
    Template(String),
    Computed(Arc<F>),
}

/// The condition joining a parent table to a child table.
pub type JoinCondition = SqlTemplate<JoinFn>;
/// A row predicate on a table.
pub type WhereCondition = SqlTemplate<WhereFn>;
/// A raw SQL expression selected in place of a column.
pub type SqlExpression = SqlTemplate<TableFn>;
/// A column name, possibly depending on the table alias.
pub type ColumnThunk = SqlTemplate<TableFn>;

fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        })
}

impl SqlTemplate<JoinFn> {
    pub fn computed(
        build: impl Fn(&str, &str, &Arguments, &Context) -> String + Send + Sync + 'static,
    ) -> Self {
        let build: Arc<JoinFn> = Arc::new(build);
        SqlTemplate::Computed(build)
    }

    /// Build the condition for the given quoted parent and child aliases.
    pub fn build(&self, parent: &str, child: &str, args: &Arguments, ctx: &Context) -> String {
        match self {
            SqlTemplate::Template(template) => {
                substitute(template, &[("{parent}", parent), ("{child}", child)])
            }
            SqlTemplate::Computed(build) => build(parent, child, args, ctx),
        }
    }
}

impl SqlTemplate<WhereFn> {
    pub fn computed(
        build: impl Fn(&str, &Arguments, &Context) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        let build: Arc<WhereFn> = Arc::new(build);
        SqlTemplate::Computed(build)
    }

    /// Build the predicate for the given quoted table alias. Blank predicates are dropped.
    pub fn build(&self, table: &str, args: &Arguments, ctx: &Context) -> Option<String> {
        let predicate = match self {
            SqlTemplate::Template(template) => Some(substitute(template, &[("{table}", table)])),
            SqlTemplate::Computed(build) => build(table, args, ctx),
        };
        predicate.filter(|p| !p.trim().is_empty())
    }
}

impl SqlTemplate<TableFn> {
    pub fn computed(
        build: impl Fn(&str, &Arguments, &Context) -> String + Send + Sync + 'static,
    ) -> Self {
        let build: Arc<TableFn> = Arc::new(build);
        SqlTemplate::Computed(build)
    }

    pub fn build(&self, table: &str, args: &Arguments, ctx: &Context) -> String {
        match self {
            SqlTemplate::Template(template) => substitute(template, &[("{table}", table)]),
            SqlTemplate::Computed(build) => build(table, args, ctx),
        }
    }
}

impl<F: ?Sized> From<&str> for SqlTemplate<F> {
    fn from(template: &str) -> Self {
        SqlTemplate::Template(template.to_string())
    }
}

impl<F: ?Sized> Clone for SqlTemplate<F> {
    fn clone(&self) -> Self {
        match self {
            SqlTemplate::Template(template) => SqlTemplate::Template(template.clone()),
            SqlTemplate::Computed(build) => SqlTemplate::Computed(build.clone()),
        }
    }
}

impl<F: ?Sized> fmt::Debug for SqlTemplate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlTemplate::Template(template) => f.debug_tuple("Template").field(template).finish(),
            SqlTemplate::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de, F: ?Sized> Deserialize<'de> for SqlTemplate<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SqlTemplate::Template)
    }
}

impl<F: ?Sized> Serialize for SqlTemplate<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlTemplate::Template(template) => serializer.serialize_str(template),
            SqlTemplate::Computed(_) => Err(serde::ser::Error::custom(
                "computed SQL builders cannot be serialized",
            )),
        }
    }
}

impl<F: ?Sized> JsonSchema for SqlTemplate<F> {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        "SqlTemplate".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        let mut schema = gen.subschema_for::<String>().into_object();
        schema.metadata().description = Some(
            "A SQL fragment. `{parent}`, `{child}` and `{table}` are replaced by quoted table aliases."
                .to_string(),
        );
        schema.into()
    }
}
