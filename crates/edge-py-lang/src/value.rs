use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::node::LambdaDef;
use crate::eval::builtin::Builtin;
use crate::eval::env::Env;

#[derive(Clone)]
pub struct Function {
    pub(crate) def: Arc<LambdaDef>,
    pub(crate) env: Arc<Env>,
}

impl Function {
    pub fn params(&self) -> &[SmolStr] {
        &self.def.params
    }

    fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && Arc::ptr_eq(&self.env, &other.env)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<lambda {}>", self.def.params.join(", "))
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered entries; keys are unique under `==`.
    Dict(Vec<(Value, Value)>),
    Function(Function),
    Builtin(Builtin),
    Method(Box<Value>, SmolStr),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Method(..) => "builtin_function_or_method",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::Method(..) => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_) | Value::Method(..))
    }

    /// Number of positional parameters, known only for lambdas.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::Function(f) => Some(f.def.params.len()),
            _ => None,
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            _ => None,
        }
    }

    pub(crate) fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.py_eq(b))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter()
                            .find(|(k, _)| k.py_eq(key))
                            .is_some_and(|(_, v)| v.py_eq(value))
                    })
            }
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Method(a, name_a), Value::Method(b, name_b)) => name_a == name_b && a.py_eq(b),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `min`, `max` and `sorted`; `None` when not comparable.
    pub fn py_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (a, b) in a.iter().zip(b) {
                    if !a.py_eq(b) {
                        return a.py_cmp(b);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => Some(a.cmp(&b)),
                (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()),
                _ => None,
            },
        }
    }

    /// Identity as observed through `is`.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => float_repr(*n),
            Value::String(s) => string_repr(s),
            Value::List(items) => format!("[{}]", items.iter().map(Value::repr).join(", ")),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", items.iter().map(Value::repr).join(", ")),
            Value::Dict(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .join(", ")
            ),
            Value::Function(_) => "<function <lambda>>".to_string(),
            Value::Builtin(builtin) => format!("<built-in function {}>", builtin.name()),
            Value::Method(receiver, name) => format!(
                "<built-in method {} of {} object>",
                name,
                receiver.type_name()
            ),
        }
    }
}

pub(crate) fn float_repr(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if n != 0.0 && (n.abs() >= 1e16 || n.abs() < 1e-4) {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or_default();
                format!("{}e{}{:02}", mantissa, if exp < 0 { '-' } else { '+' }, exp.abs())
            }
            None => formatted,
        }
    } else if n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut repr = String::with_capacity(s.len() + 2);
    repr.push(quote);
    for c in s.chars() {
        match c {
            '\\' => repr.push_str("\\\\"),
            '\n' => repr.push_str("\\n"),
            '\r' => repr.push_str("\\r"),
            '\t' => repr.push_str("\\t"),
            c if c == quote => {
                repr.push('\\');
                repr.push(c);
            }
            c => repr.push(c),
        }
    }
    repr.push(quote);
    repr
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.py_eq(other)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            value => write!(f, "{}", value.repr()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ConversionError {
    #[error("Object of type {0} is not JSON serializable")]
    Unsupported(&'static str),
    #[error("Out of range float value {0} is not JSON compliant")]
    NonFinite(String),
    #[error("keys must be str, int, float, bool or None, not {0}")]
    UnsupportedKey(&'static str),
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(entries) => Value::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v.into()))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = ConversionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::None => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::Int(n) => Ok(serde_json::Value::from(n)),
            Value::Float(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| ConversionError::NonFinite(float_repr(n))),
            Value::String(s) => Ok(serde_json::Value::String(s)),
            Value::List(items) | Value::Tuple(items) => items
                .into_iter()
                .map(serde_json::Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            Value::Dict(entries) => entries
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => s,
                        Value::Int(n) => n.to_string(),
                        Value::Float(n) => float_repr(n),
                        Value::Bool(b) => b.to_string(),
                        Value::None => "null".to_string(),
                        other => return Err(ConversionError::UnsupportedKey(other.type_name())),
                    };
                    Ok((key, serde_json::Value::try_from(v)?))
                })
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(serde_json::Value::Object),
            other => Err(ConversionError::Unsupported(other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::int(Value::Int(42), "42")]
    #[case::float(Value::Float(42.0), "42.0")]
    #[case::float_fraction(Value::Float(0.1), "0.1")]
    #[case::float_large(Value::Float(1e16), "1e+16")]
    #[case::float_small(Value::Float(1.5e-5), "1.5e-05")]
    #[case::float_inf(Value::Float(f64::INFINITY), "inf")]
    #[case::string(Value::String("it's".to_string()), "\"it's\"")]
    #[case::string_escape(Value::String("a\nb".to_string()), "'a\\nb'")]
    #[case::single_tuple(Value::Tuple(vec![Value::Int(1)]), "(1,)")]
    #[case::nested(Value::List(vec![Value::None, Value::Bool(true), Value::String("x".to_string())]), "[None, True, 'x']")]
    #[case::dict(Value::Dict(vec![(Value::String("a".to_string()), Value::Int(1))]), "{'a': 1}")]
    fn test_repr(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.repr(), expected);
    }

    #[test]
    fn test_display_string_is_raw() {
        assert_eq!(Value::String("a'b".to_string()).to_string(), "a'b");
    }

    #[rstest]
    #[case(Value::Int(1), Value::Float(1.0), true)]
    #[case(Value::Bool(true), Value::Int(1), true)]
    #[case(Value::String("1".to_string()), Value::Int(1), false)]
    #[case(Value::List(vec![Value::Int(1)]), Value::Tuple(vec![Value::Int(1)]), false)]
    #[case(
        Value::Dict(vec![(Value::String("a".to_string()), Value::Int(1)), (Value::String("b".to_string()), Value::Int(2))]),
        Value::Dict(vec![(Value::String("b".to_string()), Value::Int(2)), (Value::String("a".to_string()), Value::Int(1))]),
        true
    )]
    fn test_py_eq(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
        assert_eq!(a.py_eq(&b), expected);
    }

    #[test]
    fn test_py_cmp() {
        assert_eq!(Value::Int(1).py_cmp(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).py_cmp(&Value::List(vec![Value::Int(1)])),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::String("a".to_string()).py_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn test_from_json() {
        let value: Value = json!({"a": [1, 2.5, "x", null, true]}).into();
        assert_eq!(
            value,
            Value::Dict(vec![(
                Value::String("a".to_string()),
                Value::List(vec![
                    Value::Int(1),
                    Value::Float(2.5),
                    Value::String("x".to_string()),
                    Value::None,
                    Value::Bool(true),
                ])
            )])
        );
    }

    #[test]
    fn test_into_json() {
        let value = Value::Dict(vec![
            (Value::Int(1), Value::Tuple(vec![Value::Int(1), Value::Float(0.5)])),
            (Value::String("k".to_string()), Value::None),
        ]);
        assert_eq!(
            serde_json::Value::try_from(value),
            Ok(json!({"1": [1, 0.5], "k": null}))
        );
    }

    #[rstest]
    #[case::nan(Value::Float(f64::NAN), ConversionError::NonFinite("nan".to_string()))]
    #[case::builtin(Value::Builtin(Builtin::Len), ConversionError::Unsupported("builtin_function_or_method"))]
    #[case::tuple_key(
        Value::Dict(vec![(Value::Tuple(vec![]), Value::None)]),
        ConversionError::UnsupportedKey("tuple")
    )]
    fn test_into_json_error(#[case] value: Value, #[case] expected: ConversionError) {
        assert_eq!(serde_json::Value::try_from(value), Err(expected));
    }
}
