//! Errors for query translation.

use query_engine_sql::sql;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    RequestValidation(#[from] RequestValidationError),
    #[error(transparent)]
    Dialect(#[from] sql::dialect::Error),
}

/// The broad classes errors fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema metadata is wrong. Fixed by the developer, not the caller.
    Configuration,
    /// The request itself is wrong.
    RequestValidation,
    /// The executor failed.
    ExternalCall,
    /// The executor returned something other than rows.
    DataShape,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::Dialect(_) => ErrorKind::Configuration,
            Error::RequestValidation(_) => ErrorKind::RequestValidation,
        }
    }
}

/// Mistakes in the schema metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("The field \"{field}\" is not in the {parent_type} type.")]
    UnknownField { field: String, parent_type: String },
    #[error("The type \"{0}\" is not in the schema.")]
    UnknownType(String),
    #[error("The fragment \"{0}\" is not defined.")]
    UnknownFragment(String),
    #[error("The type \"{0}\" is not backed by a table.")]
    NotATable(String),
    #[error("If an Object type maps to a SQL table and has a child which is another Object type that also maps to a SQL table, you must define \"sqlJoin\", \"sqlBatch\", or \"junction\" on that field to tell the compiler how to fetch it. Or you can ignore it with \"ignoreTable\". Check the \"{field}\" field on the \"{parent_type}\" type.")]
    MissingRelation { field: String, parent_type: String },
    #[error("Only one of \"sqlJoin\", \"sqlBatch\" or \"junction\" may be defined on the \"{field}\" field of the \"{parent_type}\" type.")]
    AmbiguousRelation { field: String, parent_type: String },
    #[error("A junction on the \"{0}\" field needs either \"sqlJoins\" or \"sqlBatch\".")]
    JunctionWithoutFetch(String),
    #[error("The junction on the \"{0}\" field needs a \"uniqueKey\" to be batched.")]
    MissingJunctionUniqueKey(String),
    #[error("To paginate the {field} field, it needs to be a Connection type, not {type_name}.")]
    PaginationOnNonConnection { field: String, type_name: String },
    #[error("Cannot paginate the {0} field without a \"sortKey\" or \"orderBy\".")]
    MissingSortKey(String),
    #[error("\"orderBy\" is required for a \"limit\" on the {0} field.")]
    LimitWithoutOrdering(String),
    #[error("\"{option}\" must be defined on either the field or the junction of the {field} field, not both.")]
    DuplicateOrdering { field: String, option: &'static str },
    #[error("{0} is not a valid sorting direction")]
    InvalidDirection(String),
    #[error("The root field \"{0}\" cannot have a \"sqlJoin\".")]
    RootJoin(String),
    #[error("The statement fetching the \"{0}\" field would need more than one FROM clause.")]
    SecondFromClause(String),
    #[error("The unique key of {type_name} has {expected} columns, but the condition has {found} values.")]
    CompositeKeyMismatch {
        type_name: String,
        expected: usize,
        found: usize,
    },
}

/// Mistakes in the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestValidationError {
    #[error("The request selects no field.")]
    NoFields,
    #[error("Invalid cursor \"{0}\".")]
    MalformedCursor(String),
    #[error("Invalid cursor. The column \"{0}\" is not in the sort key.")]
    CursorKeyNotInSortKey(String),
    #[error("Invalid cursor. The column \"{0}\" is not in the cursor.")]
    CursorMissingKey(String),
    #[error("Using \"before\" with \"first\" is nonsensical.")]
    BeforeWithFirst,
    #[error("Using \"after\" with \"last\" is nonsensical.")]
    AfterWithLast,
    #[error("Backward pagination not supported with offsets. Consider using keyset pagination instead")]
    BackwardOffsetPagination,
    #[error("\"{argument}\" must be a non-negative integer, not {value}.")]
    InvalidPageSize { argument: String, value: String },
}
