//! Model schemas: declared keys, defaults, and value constraints.
//!
//! A [`ModelSchema`] is the sole description needed to build a conforming
//! model. Node kinds return one from
//! [`NodeKind::model_schema`](crate::kind::NodeKind::model_schema).
//!
//! Constraints never reject a write. Each constraint registered for a key is
//! applied in registration order to clamp or normalize the incoming value.
//!
//! ```
//! use horizon_scene_core::schema::{Constraint, ModelSchema};
//! use horizon_scene_core::Value;
//!
//! let schema = ModelSchema::builder("sprite")
//!     .field("x", 0.0)
//!     .field("y", 0.0)
//!     .constrained("opacity", 1.0, [Constraint::range(0.0, 1.0)])
//!     .build();
//!
//! assert_eq!(schema.normalize("opacity", Value::Float(3.0)).unwrap(), Value::Float(1.0));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{SceneError, SceneResult};
use crate::value::{Value, Values};

/// A normalizing rule applied to a value before it is stored.
#[derive(Clone)]
pub enum Constraint {
    /// Clamp a numeric value into `[min, max]`. Reversed bounds are read
    /// in ascending order.
    Range {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Raise a numeric value to at least this bound.
    Min(f64),
    /// Lower a numeric value to at most this bound.
    Max(f64),
    /// Snap a numeric value to the nearest multiple of the step.
    Step(f64),
    /// Replace a value outside the allowed set with the first allowed value.
    OneOf(Vec<Value>),
    /// Arbitrary normalization.
    Custom(Arc<dyn Fn(Value) -> Value + Send + Sync>),
}

impl Constraint {
    /// Shorthand for [`Constraint::Range`], with the bounds put in order.
    pub fn range(min: f64, max: f64) -> Self {
        if min > max {
            Self::Range { min: max, max: min }
        } else {
            Self::Range { min, max }
        }
    }

    /// Shorthand for [`Constraint::Custom`].
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Apply the constraint to a value.
    pub fn apply(&self, value: Value) -> Value {
        match self {
            Self::Range { min, max } => match value.as_f64() {
                Some(v) => {
                    let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                    value.with_numeric(v.max(lo).min(hi))
                }
                None => value,
            },
            Self::Min(min) => match value.as_f64() {
                Some(v) if v < *min => value.with_numeric(*min),
                _ => value,
            },
            Self::Max(max) => match value.as_f64() {
                Some(v) if v > *max => value.with_numeric(*max),
                _ => value,
            },
            Self::Step(step) => match value.as_f64() {
                Some(v) if *step > 0.0 => value.with_numeric((v / step).round() * step),
                _ => value,
            },
            Self::OneOf(allowed) => {
                if allowed.is_empty() || allowed.contains(&value) {
                    value
                } else {
                    allowed[0].clone()
                }
            }
            Self::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { min, max } => write!(f, "Range({min}..={max})"),
            Self::Min(v) => write!(f, "Min({v})"),
            Self::Max(v) => write!(f, "Max({v})"),
            Self::Step(v) => write!(f, "Step({v})"),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A declared model key.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    key: String,
    default: Value,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// The key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Constraints in registration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Ordered set of declared keys with defaults and constraints.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl ModelSchema {
    /// Start building a schema.
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            schema: ModelSchema {
                name: name.into(),
                fields: Vec::new(),
                index: HashMap::new(),
            },
        }
    }

    /// The schema name, usually the kind tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declared keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if the key is declared.
    pub fn declares(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a field, failing fast on undeclared keys.
    pub fn field(&self, key: &str) -> SceneResult<&FieldSpec> {
        self.index
            .get(key)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SceneError::SchemaViolation {
                schema: self.name.clone(),
                key: key.to_string(),
            })
    }

    /// The default for a declared key.
    pub fn default_value(&self, key: &str) -> SceneResult<&Value> {
        self.field(key).map(FieldSpec::default_value)
    }

    /// Run every constraint registered for `key`, in order.
    pub fn normalize(&self, key: &str, value: Value) -> SceneResult<Value> {
        let field = self.field(key)?;
        Ok(field
            .constraints
            .iter()
            .fold(value, |acc, constraint| constraint.apply(acc)))
    }

    /// Snapshot of all defaults.
    pub fn defaults(&self) -> Values {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.default.clone()))
            .collect()
    }
}

/// Builder for [`ModelSchema`].
#[derive(Debug)]
pub struct ModelSchemaBuilder {
    schema: ModelSchema,
}

impl ModelSchemaBuilder {
    /// Declare a key with a default and no constraints.
    pub fn field(self, key: impl Into<String>, default: impl Into<Value>) -> Self {
        self.constrained(key, default, [])
    }

    /// Declare a key with constraints.
    ///
    /// Declaring a key twice replaces the earlier declaration in place.
    pub fn constrained(
        mut self,
        key: impl Into<String>,
        default: impl Into<Value>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let key = key.into();
        let constraints: Vec<Constraint> = constraints.into_iter().collect();
        let default = constraints
            .iter()
            .fold(default.into(), |acc, constraint| constraint.apply(acc));
        let spec = FieldSpec {
            key: key.clone(),
            default,
            constraints,
        };
        match self.schema.index.get(&key) {
            Some(&i) => self.schema.fields[i] = spec,
            None => {
                self.schema.index.insert(key, self.schema.fields.len());
                self.schema.fields.push(spec);
            }
        }
        self
    }

    /// Finish the schema.
    pub fn build(self) -> ModelSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ModelSchema {
        ModelSchema::builder("test")
            .field("x", 0.0)
            .field("label", "")
            .constrained("alpha", 1.0, [Constraint::range(0.0, 1.0)])
            .constrained("count", 0, [Constraint::Min(0.0), Constraint::Step(5.0)])
            .constrained(
                "mode",
                "fill",
                [Constraint::OneOf(vec!["fill".into(), "stroke".into()])],
            )
            .build()
    }

    #[test]
    fn test_keys_keep_declaration_order() {
        let keys: Vec<_> = schema().keys().map(str::to_string).collect();
        assert_eq!(keys, ["x", "label", "alpha", "count", "mode"]);
    }

    #[test]
    fn test_undeclared_key_fails_fast() {
        let err = schema().normalize("nope", Value::Int(1)).unwrap_err();
        assert!(matches!(err, SceneError::SchemaViolation { .. }));
    }

    #[test]
    fn test_range_clamps() {
        let s = schema();
        assert_eq!(s.normalize("alpha", 2.0.into()).unwrap(), Value::Float(1.0));
        assert_eq!(s.normalize("alpha", (-1.0).into()).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_reversed_range_bounds() {
        assert!(matches!(Constraint::range(1.0, 0.0), Constraint::Range { min, max } if min == 0.0 && max == 1.0));

        let schema = ModelSchema::builder("test")
            .constrained("alpha", 3.0, [Constraint::range(1.0, 0.0)])
            .build();
        assert_eq!(schema.default_value("alpha").unwrap(), &Value::Float(1.0));

        let raw = Constraint::Range { min: 10.0, max: -10.0 };
        assert_eq!(raw.apply(Value::Float(25.0)), Value::Float(10.0));
        assert_eq!(raw.apply(Value::Float(-25.0)), Value::Float(-10.0));
        assert_eq!(raw.apply(Value::Float(4.0)), Value::Float(4.0));
    }

    #[test]
    fn test_constraints_apply_in_order() {
        let s = schema();
        // Min first lifts -7 to 0, Step then keeps 0
        assert_eq!(s.normalize("count", (-7).into()).unwrap(), Value::Int(0));
        assert_eq!(s.normalize("count", 12.into()).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_one_of_falls_back() {
        let s = schema();
        assert_eq!(s.normalize("mode", "stroke".into()).unwrap(), Value::from("stroke"));
        assert_eq!(s.normalize("mode", "dotted".into()).unwrap(), Value::from("fill"));
    }

    #[test]
    fn test_custom_constraint() {
        let s = ModelSchema::builder("t")
            .constrained(
                "name",
                "",
                [Constraint::custom(|v| match v {
                    Value::Text(t) => Value::Text(t.trim().to_string()),
                    other => other,
                })],
            )
            .build();
        assert_eq!(s.normalize("name", "  hi ".into()).unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_redeclare_replaces() {
        let s = ModelSchema::builder("t").field("a", 1).field("a", 2).build();
        assert_eq!(s.len(), 1);
        assert_eq!(s.default_value("a").unwrap(), &Value::Int(2));
    }
}
