use std::any::Any;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ApolloError;
use crate::BooleanExpression;
use crate::Result;
use crate::adapter::Adapter;

/// A custom scalar declared in the schema, such as `Date` or `URL`.
///
/// Generated code declares one constant per custom scalar and looks its
/// adapter up by name in [`CustomScalarAdapters`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CustomScalarType {
    name: &'static str,
}

impl CustomScalarType {
    /// Declare a custom scalar.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The GraphQL name of the scalar.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for CustomScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The values of the boolean variables of an operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BooleanVariables {
    values: HashMap<String, bool>,
}

impl BooleanVariables {
    /// The value of `name`, if the operation has a boolean variable by that name.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    /// Number of boolean variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no boolean variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for BooleanVariables {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// State handed to adapters on top of the registered custom scalars.
#[derive(Clone, Debug, Default)]
pub struct AdapterContext {
    variables: Option<Arc<BooleanVariables>>,
    serialize_variables_with_default_boolean_values: bool,
}

impl AdapterContext {
    /// The boolean variables of the operation being decoded, if known.
    pub fn variables(&self) -> Option<&BooleanVariables> {
        self.variables.as_deref()
    }

    /// A copy of this context bound to `variables`.
    pub fn with_variables(&self, variables: BooleanVariables) -> Self {
        Self {
            variables: Some(Arc::new(variables)),
            ..self.clone()
        }
    }

    /// Whether variable serializers should also write boolean variables left
    /// absent but declared with a default value.
    pub fn serialize_variables_with_default_boolean_values(&self) -> bool {
        self.serialize_variables_with_default_boolean_values
    }

    /// A copy of this context with the flag above set to `value`.
    pub fn with_default_boolean_values(&self, value: bool) -> Self {
        Self {
            serialize_variables_with_default_boolean_values: value,
            ..self.clone()
        }
    }

    /// Evaluate `expression` against the bound variables.
    ///
    /// Variables that are not bound evaluate to `true`: without a binding the
    /// parser cannot assume a field was skipped.
    pub fn evaluate(&self, expression: &BooleanExpression) -> bool {
        expression.evaluate(&|name| {
            self.variables()
                .and_then(|variables| variables.get(name))
                .unwrap_or(true)
        })
    }
}

#[derive(Clone)]
struct Registered {
    // always an `Arc<dyn Adapter<Value = T>>`, `T` being named by `type_name`
    adapter: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// The adapters registered for custom scalars, and the [`AdapterContext`].
///
/// Cheap to clone and safe to share between threads: the registry itself is
/// immutable once built. Use [`CustomScalarAdapters::builder`] to create one.
#[derive(Clone, Default)]
pub struct CustomScalarAdapters {
    adapters: Arc<HashMap<String, Registered>>,
    context: AdapterContext,
}

impl fmt::Debug for CustomScalarAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scalars: Vec<_> = self
            .adapters
            .iter()
            .map(|(name, registered)| (name.as_str(), registered.type_name))
            .collect();
        scalars.sort_unstable();
        f.debug_struct("CustomScalarAdapters")
            .field("scalars", &scalars)
            .field("context", &self.context)
            .finish()
    }
}

impl CustomScalarAdapters {
    /// Start an empty registry.
    pub fn builder() -> CustomScalarAdaptersBuilder {
        CustomScalarAdaptersBuilder::default()
    }

    /// Start a registry holding the same adapters and context as this one.
    pub fn to_builder(&self) -> CustomScalarAdaptersBuilder {
        CustomScalarAdaptersBuilder {
            adapters: self.adapters.as_ref().clone(),
            context: self.context.clone(),
        }
    }

    /// The adapter registered for `scalar`.
    ///
    /// Fails with [`ApolloError::UnregisteredScalar`] when nothing is
    /// registered under that name, and with [`ApolloError::ScalarTypeMismatch`]
    /// when the registered adapter does not produce `T`.
    pub fn adapter_for<T: 'static>(
        &self,
        scalar: &CustomScalarType,
    ) -> Result<Arc<dyn Adapter<Value = T>>> {
        let registered =
            self.adapters
                .get(scalar.name())
                .ok_or_else(|| ApolloError::UnregisteredScalar {
                    name: scalar.name().to_string(),
                })?;
        registered
            .adapter
            .downcast_ref::<Arc<dyn Adapter<Value = T>>>()
            .cloned()
            .ok_or_else(|| ApolloError::ScalarTypeMismatch {
                name: scalar.name().to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Whether an adapter is registered for `scalar`.
    pub fn contains(&self, scalar: &CustomScalarType) -> bool {
        self.adapters.contains_key(scalar.name())
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapter is registered.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The context handed to adapters.
    pub fn context(&self) -> &AdapterContext {
        &self.context
    }

    /// A registry sharing these adapters, with a different context.
    pub fn with_context(&self, context: AdapterContext) -> Self {
        Self {
            adapters: self.adapters.clone(),
            context,
        }
    }
}

/// Builder for [`CustomScalarAdapters`].
#[derive(Default)]
pub struct CustomScalarAdaptersBuilder {
    adapters: HashMap<String, Registered>,
    context: AdapterContext,
}

impl CustomScalarAdaptersBuilder {
    /// Register `adapter` for `scalar`, replacing any previous registration.
    pub fn add<A>(mut self, scalar: CustomScalarType, adapter: A) -> Self
    where
        A: Adapter + 'static,
        A::Value: 'static,
    {
        let adapter: Arc<dyn Adapter<Value = A::Value>> = Arc::new(adapter);
        if self
            .adapters
            .insert(
                scalar.name().to_string(),
                Registered {
                    adapter: Arc::new(adapter),
                    type_name: type_name::<A::Value>(),
                },
            )
            .is_some()
        {
            tracing::debug!(scalar = scalar.name(), "replacing custom scalar adapter");
        }
        self
    }

    /// Register every adapter of `other`, replacing those with the same name.
    pub fn add_all(mut self, other: &CustomScalarAdapters) -> Self {
        for (name, registered) in other.adapters.iter() {
            self.adapters.insert(name.clone(), registered.clone());
        }
        self
    }

    /// Set the context handed to adapters.
    pub fn adapter_context(mut self, context: AdapterContext) -> Self {
        self.context = context;
        self
    }

    /// Finish the registry.
    pub fn build(self) -> CustomScalarAdapters {
        CustomScalarAdapters {
            adapters: Arc::new(self.adapters),
            context: self.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json as bjson;
    use test_log::test;

    use super::*;
    use crate::ErrorKind;
    use crate::adapter::LongAdapter;
    use crate::adapter::StringAdapter;
    use crate::json::ValueJsonReader;

    const DATE: CustomScalarType = CustomScalarType::new("Date");
    const LONG: CustomScalarType = CustomScalarType::new("Long");

    #[test]
    fn looks_adapters_up_by_name() {
        let adapters = CustomScalarAdapters::builder()
            .add(DATE, StringAdapter)
            .add(LONG, LongAdapter)
            .build();
        assert_eq!(adapters.len(), 2);
        assert!(adapters.contains(&DATE));

        let adapter = adapters.adapter_for::<i64>(&LONG).unwrap();
        let mut reader = ValueJsonReader::from_value(bjson!(1234567890123_i64));
        assert_eq!(
            adapter.from_json(&mut reader, &adapters).unwrap(),
            1234567890123
        );
    }

    #[test]
    fn reports_missing_and_mismatched_adapters() {
        let adapters = CustomScalarAdapters::builder().add(DATE, StringAdapter).build();

        let error = adapters.adapter_for::<String>(&LONG).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(
            error.to_string(),
            "no adapter registered for custom scalar 'Long'"
        );

        let error = adapters.adapter_for::<i64>(&DATE).err().unwrap();
        assert!(matches!(error, ApolloError::ScalarTypeMismatch { .. }));
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn later_registrations_win() {
        let first = CustomScalarAdapters::builder().add(DATE, StringAdapter).build();
        let adapters = CustomScalarAdapters::builder()
            .add(DATE, LongAdapter)
            .add_all(&first)
            .add(LONG, LongAdapter)
            .build();
        assert!(adapters.adapter_for::<String>(&DATE).is_ok());
        assert_eq!(adapters.to_builder().build().len(), 2);
    }

    #[test]
    fn context_evaluates_expressions() {
        let adapters = CustomScalarAdapters::default();
        assert!(adapters.context().variables().is_none());
        // nothing bound, nothing skipped
        assert!(adapters.context().evaluate(&BooleanExpression::include("withFriends")));

        let variables: BooleanVariables = [("withFriends", false)].into_iter().collect();
        let adapters = adapters.with_context(adapters.context().with_variables(variables));
        assert_eq!(adapters.context().variables().unwrap().get("withFriends"), Some(false));
        assert!(!adapters.context().evaluate(&BooleanExpression::include("withFriends")));
        assert!(adapters.context().evaluate(&BooleanExpression::skip("withFriends")));
        assert!(adapters.context().evaluate(&BooleanExpression::include("unknown")));
    }
}
