//! Metadata information regarding the schema, the tables behind its types and the
//! selection tree of a request.

pub mod builders;
pub mod database;
pub mod selection;
pub mod thunk;
pub mod types;

// re-export without modules
pub use builders::*;
pub use database::*;
pub use selection::*;
pub use thunk::*;
pub use types::*;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The schema: every type reachable from a request, keyed by type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    #[serde(default)]
    pub types: BTreeMap<String, TypeDefinition>,
}

impl Schema {
    pub fn empty() -> Self {
        Schema {
            types: BTreeMap::new(),
        }
    }

    /// Lookup a type definition by name.
    pub fn lookup_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }
}
