//! Configuration values which are either given literally or computed per request.

use std::fmt;
use std::sync::Arc;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The resolved arguments of a selected field.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// The opaque request context handed to every computed value.
pub type Context = serde_json::Value;

type ComputeFn<T> = dyn Fn(&Arguments, &Context) -> T + Send + Sync;

/// A value which is either known up front or computed from the field arguments
/// and the request context when it is used.
pub enum Thunk<T> {
    Value(T),
    Computed(Arc<ComputeFn<T>>),
}

impl<T: Clone> Thunk<T> {
    pub fn computed(compute: impl Fn(&Arguments, &Context) -> T + Send + Sync + 'static) -> Self {
        let compute: Arc<ComputeFn<T>> = Arc::new(compute);
        Thunk::Computed(compute)
    }

    /// Evaluate the value for the given field arguments and context.
    pub fn resolve(&self, arguments: &Arguments, context: &Context) -> T {
        match self {
            Thunk::Value(value) => value.clone(),
            Thunk::Computed(compute) => compute(arguments, context),
        }
    }
}

impl<T> From<T> for Thunk<T> {
    fn from(value: T) -> Self {
        Thunk::Value(value)
    }
}

impl<T: Clone> Clone for Thunk<T> {
    fn clone(&self) -> Self {
        match self {
            Thunk::Value(value) => Thunk::Value(value.clone()),
            Thunk::Computed(compute) => Thunk::Computed(compute.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Thunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thunk::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Thunk::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Thunk<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Thunk::Value)
    }
}

impl<T: Serialize> Serialize for Thunk<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Thunk::Value(value) => value.serialize(serializer),
            Thunk::Computed(_) => Err(serde::ser::Error::custom(
                "computed values cannot be serialized",
            )),
        }
    }
}

impl<T: JsonSchema> JsonSchema for Thunk<T> {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        T::schema_name()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        gen.subschema_for::<T>()
    }
}
