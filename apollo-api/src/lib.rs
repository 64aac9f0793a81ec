//! Typed GraphQL operations over JSON.
//!
//! Composes the JSON body of a GraphQL request from an [`Operation`] and
//! parses the JSON body of the response back into an [`ApolloResponse`]
//! holding typed data, GraphQL errors and extensions.
//!
//! Transport is left to the caller: requests are written to any
//! [`json::JsonWriter`] and responses read from any [`json::JsonReader`].
//!
//! Types generated from a GraphQL document implement [`Operation`] and
//! [`adapter::Adapter`]; custom scalars are mapped to Rust types by adapters
//! registered in [`CustomScalarAdapters`].

#![warn(unreachable_pub)]

#[macro_use]
pub mod json_ext;

pub mod adapter;
mod boolean_expression;
mod custom_scalars;
pub mod error;
pub mod json;
mod operation;
mod operations;
pub mod response;
mod response_parser;

pub use adapter::Optional;
pub use boolean_expression::BooleanExpression;
pub use custom_scalars::AdapterContext;
pub use custom_scalars::BooleanVariables;
pub use custom_scalars::CustomScalarAdapters;
pub use custom_scalars::CustomScalarAdaptersBuilder;
pub use custom_scalars::CustomScalarType;
pub use error::ApolloError;
pub use error::ErrorKind;
pub use operation::Operation;
pub use operation::OperationType;
pub use operations::OperationExt;
pub use response::ApolloResponse;
pub use response::Error;
pub use response::Location;

/// Result type of the codec.
pub type Result<T, E = ApolloError> = std::result::Result<T, E>;
