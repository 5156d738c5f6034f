//! The caster registry.
//!
//! Casters are named coercions from raw request input (strings, mostly) to
//! typed JSON values. Two are built in: `Number` and `Boolean`. Hosts may
//! register more, or replace the built-ins, before any endpoint is
//! compiled; the registry is read-only afterwards.

use crate::binding::ParamBinding;
use hermes_core::{DispatchError, DispatchResult};
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

/// A named coercion.
pub trait Caster: Send + Sync + 'static {
    /// Returns the declared type name this caster handles.
    fn type_name(&self) -> &str;

    /// Returns true if `value` already has the target type.
    fn is_instance(&self, value: &Value) -> bool;

    /// Coerces `value`, failing with [`DispatchError::CannotCast`].
    fn cast(&self, value: &Value) -> DispatchResult<Value>;
}

fn cannot_cast(value: &Value, type_name: &str) -> DispatchError {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    DispatchError::cannot_cast(raw, type_name)
}

/// Coerces to a JSON number.
///
/// Strings are trimmed and parsed; integral results become integers and
/// everything else a float. Empty strings and non-finite results fail.
/// Booleans become `1` or `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCaster;

impl NumberCaster {
    fn parse(raw: &str) -> Option<Number> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Some(Number::from(int));
        }
        let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
        if float.fract() == 0.0 && float.abs() < 9.0e15 {
            return Some(Number::from(float as i64));
        }
        Number::from_f64(float)
    }
}

impl Caster for NumberCaster {
    fn type_name(&self) -> &str {
        "Number"
    }

    fn is_instance(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn cast(&self, value: &Value) -> DispatchResult<Value> {
        let number = match value {
            Value::String(s) => Self::parse(s),
            Value::Bool(b) => Some(Number::from(i64::from(*b))),
            _ => None,
        };
        number
            .map(Value::Number)
            .ok_or_else(|| cannot_cast(value, self.type_name()))
    }
}

/// Coerces to a JSON boolean.
///
/// Accepts, case-insensitively, `1`/`true`/`t` and `0`/`false`/`f`, given as
/// strings or numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCaster;

impl Caster for BooleanCaster {
    fn type_name(&self) -> &str {
        "Boolean"
    }

    fn is_instance(&self, value: &Value) -> bool {
        value.is_boolean()
    }

    fn cast(&self, value: &Value) -> DispatchResult<Value> {
        let parsed = match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" => Some(true),
                "0" | "false" | "f" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Some(true),
                Some(f) if f == 0.0 => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| cannot_cast(value, self.type_name()))
    }
}

/// Named coercions keyed by declared type name.
///
/// # Example
///
/// ```
/// use hermes_extract::{CasterRegistry, ParamBinding};
/// use serde_json::json;
///
/// let casters = CasterRegistry::with_defaults();
/// let binding = ParamBinding::query(0, "limit").cast_to("Number");
///
/// let value = casters.cast(&binding, Some(json!("42"))).unwrap();
/// assert_eq!(value, Some(json!(42)));
///
/// let err = casters.cast(&binding, Some(json!("abc"))).unwrap_err();
/// assert_eq!(err.error_code(), "INVALID_PARAM_TYPE");
/// ```
#[derive(Clone, Default)]
pub struct CasterRegistry {
    casters: IndexMap<String, Arc<dyn Caster>>,
}

impl CasterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `Number` and `Boolean` casters.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NumberCaster);
        registry.register(BooleanCaster);
        registry
    }

    /// Registers a caster under its type name, replacing any previous one.
    pub fn register(&mut self, caster: impl Caster) -> &mut Self {
        self.casters
            .insert(caster.type_name().to_string(), Arc::new(caster));
        self
    }

    /// Returns the caster for a type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn Caster>> {
        self.casters.get(type_name)
    }

    /// Returns the registered type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.casters.keys().map(String::as_str)
    }

    /// Applies the binding's declared cast to a raw value.
    ///
    /// The value passes through unchanged when casting is off, when no
    /// caster is registered for the declared type, when the value is unset
    /// or `null`, or when it already has the target type. A coercion
    /// failure is reported as [`DispatchError::InvalidParamType`] naming
    /// the parameter.
    pub fn cast(&self, binding: &ParamBinding, raw: Option<Value>) -> DispatchResult<Option<Value>> {
        if !binding.cast {
            return Ok(raw);
        }
        let Some(type_name) = binding.type_name.as_deref() else {
            return Ok(raw);
        };
        let Some(caster) = self.casters.get(type_name) else {
            return Ok(raw);
        };
        match raw {
            None | Some(Value::Null) => Ok(raw),
            Some(value) if caster.is_instance(&value) => Ok(Some(value)),
            Some(value) => match caster.cast(&value) {
                Ok(cast) => Ok(Some(cast)),
                Err(err) => {
                    tracing::debug!(
                        param = %binding.display_name(),
                        error = %err,
                        "cast rejected parameter value"
                    );
                    Err(DispatchError::invalid_param_type(
                        binding.display_name(),
                        type_name,
                    ))
                }
            },
        }
    }
}

impl fmt::Debug for CasterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasterRegistry")
            .field("types", &self.casters.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn number(name: &str) -> ParamBinding {
        ParamBinding::query(0, name).cast_to("Number")
    }

    fn boolean(name: &str) -> ParamBinding {
        ParamBinding::query(0, name).cast_to("Boolean")
    }

    #[test]
    fn test_cast_disabled_is_identity() {
        let casters = CasterRegistry::with_defaults();
        let binding = ParamBinding::query(0, "n").typed("Number");
        assert_eq!(casters.cast(&binding, Some(json!("5"))).unwrap(), Some(json!("5")));
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let casters = CasterRegistry::with_defaults();
        let binding = ParamBinding::query(0, "d").cast_to("Date");
        assert_eq!(
            casters.cast(&binding, Some(json!("2024-01-01"))).unwrap(),
            Some(json!("2024-01-01"))
        );
    }

    #[test]
    fn test_unset_and_null_pass_through() {
        let casters = CasterRegistry::with_defaults();
        assert_eq!(casters.cast(&number("n"), None).unwrap(), None);
        assert_eq!(casters.cast(&number("n"), Some(Value::Null)).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_number_cast() {
        let casters = CasterRegistry::with_defaults();
        assert_eq!(casters.cast(&number("n"), Some(json!("42"))).unwrap(), Some(json!(42)));
        assert_eq!(casters.cast(&number("n"), Some(json!(" 2.5 "))).unwrap(), Some(json!(2.5)));
        assert_eq!(casters.cast(&number("n"), Some(json!("3.0"))).unwrap(), Some(json!(3)));
        assert_eq!(casters.cast(&number("n"), Some(json!(7))).unwrap(), Some(json!(7)));
        assert_eq!(casters.cast(&number("n"), Some(json!(true))).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_number_cast_failures_name_the_parameter() {
        let casters = CasterRegistry::with_defaults();
        for raw in [json!("abc"), json!(""), json!("   "), json!("inf"), json!([1])] {
            let err = casters.cast(&number("limit"), Some(raw)).unwrap_err();
            match err {
                DispatchError::InvalidParamType { name, type_name } => {
                    assert_eq!(name, "limit");
                    assert_eq!(type_name, "Number");
                }
                other => panic!("expected InvalidParamType, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_boolean_cast() {
        let casters = CasterRegistry::with_defaults();
        for raw in [json!("true"), json!("1"), json!("t"), json!("TRUE"), json!(true), json!(1)] {
            assert_eq!(casters.cast(&boolean("b"), Some(raw)).unwrap(), Some(json!(true)));
        }
        for raw in [json!("false"), json!("0"), json!("f"), json!("F"), json!(false), json!(0)] {
            assert_eq!(casters.cast(&boolean("b"), Some(raw)).unwrap(), Some(json!(false)));
        }
        let err = casters.cast(&boolean("flag"), Some(json!("maybe"))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAM_TYPE");
    }

    #[test]
    fn test_raw_caster_reports_cannot_cast() {
        let err = NumberCaster.cast(&json!("x1")).unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_CAST");
    }

    #[test]
    fn test_host_casters_replace_defaults() {
        struct Upper;
        impl Caster for Upper {
            fn type_name(&self) -> &str {
                "Upper"
            }
            fn is_instance(&self, _value: &Value) -> bool {
                false
            }
            fn cast(&self, value: &Value) -> DispatchResult<Value> {
                value
                    .as_str()
                    .map(|s| Value::String(s.to_uppercase()))
                    .ok_or_else(|| DispatchError::cannot_cast(value.to_string(), "Upper"))
            }
        }

        let mut casters = CasterRegistry::with_defaults();
        casters.register(Upper);
        assert_eq!(casters.type_names().collect::<Vec<_>>(), vec!["Number", "Boolean", "Upper"]);
        let binding = ParamBinding::query(0, "s").cast_to("Upper");
        assert_eq!(casters.cast(&binding, Some(json!("abc"))).unwrap(), Some(json!("ABC")));
    }

    proptest! {
        #[test]
        fn prop_boolean_rejects_everything_outside_the_sets(raw in "[a-z]{2,8}") {
            prop_assume!(!matches!(raw.as_str(), "true" | "false"));
            let casters = CasterRegistry::with_defaults();
            prop_assert!(casters.cast(&boolean("b"), Some(json!(raw))).is_err());
        }

        #[test]
        fn prop_integers_round_trip_through_number(n in any::<i64>()) {
            let casters = CasterRegistry::with_defaults();
            prop_assert_eq!(
                casters.cast(&number("n"), Some(json!(n.to_string()))).unwrap(),
                Some(json!(n))
            );
        }
    }
}
