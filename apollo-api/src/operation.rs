use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::CustomScalarAdapters;
use crate::Result;
use crate::adapter::Adapter;
use crate::json::JsonWriter;

/// The kind of a GraphQL operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A read.
    Query,
    /// A write followed by a read.
    Mutation,
    /// A stream of results.
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        })
    }
}

/// A GraphQL operation, as generated from an executable document.
///
/// Implementations carry the values of the operation variables and know how
/// to write them, while [`Operation::adapter`] knows how to read and write the
/// operation's `data`. Everything else is provided by
/// [`OperationExt`](crate::OperationExt).
pub trait Operation: Send + Sync {
    /// The typed result of the operation.
    type Data;

    /// The operation name, sent as `operationName`.
    fn name(&self) -> &str;

    /// The GraphQL document, sent as `query`.
    fn document(&self) -> &str;

    /// The kind of operation.
    fn operation_type(&self) -> OperationType;

    /// A stable identifier for the document, used by persisted queries.
    ///
    /// Defaults to the hex encoded SHA-256 of [`Operation::document`].
    fn id(&self) -> String {
        hex::encode(Sha256::digest(self.document().as_bytes()))
    }

    /// Write the variables as the members of an already opened JSON object.
    ///
    /// Variables set to [`Optional::Absent`](crate::Optional::Absent) must be
    /// left out. Boolean variables that are absent but have a default value
    /// are written with that value when
    /// [`AdapterContext::serialize_variables_with_default_boolean_values`](crate::AdapterContext::serialize_variables_with_default_boolean_values)
    /// is set.
    fn serialize_variables(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
    ) -> Result<()>;

    /// The adapter for [`Operation::Data`].
    fn adapter(&self) -> &dyn Adapter<Value = Self::Data>;
}
