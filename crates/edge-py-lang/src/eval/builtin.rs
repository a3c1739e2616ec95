use std::sync::LazyLock;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use super::Evaluator;
use super::error::EvalError;
use super::{binary_op, compare_values, float_to_int, iterate};
use crate::ast::node::{BinaryOp, CompareOp};
use crate::range::Range;
use crate::value::Value;

/// Upper bound on the number of items `range()` will materialize.
const MAX_RANGE_LEN: i128 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    All,
    Any,
    Bool,
    Enumerate,
    Filter,
    Float,
    Int,
    Len,
    List,
    Map,
    Max,
    Min,
    Range,
    Repr,
    Reversed,
    Round,
    Sorted,
    Str,
    Sum,
    Tuple,
    Zip,
}

#[derive(Clone, Debug)]
pub enum ParamNum {
    Fixed(u8),
    Range(u8, u8),
    AtLeast(u8),
}

impl ParamNum {
    #[inline(always)]
    pub fn is_valid(&self, num_args: usize) -> bool {
        match self {
            ParamNum::Fixed(n) => num_args == *n as usize,
            ParamNum::Range(min, max) => num_args >= *min as usize && num_args <= *max as usize,
            ParamNum::AtLeast(min) => num_args >= *min as usize,
        }
    }

    fn error_message(&self, name: &str, num_args: usize) -> String {
        match self {
            ParamNum::Fixed(1) => format!("{}() takes exactly one argument ({} given)", name, num_args),
            ParamNum::Fixed(n) => format!("{}() takes exactly {} arguments ({} given)", name, n, num_args),
            ParamNum::Range(min, _) | ParamNum::AtLeast(min) if num_args < *min as usize => {
                format!("{}() expected at least {} arguments, got {}", name, min, num_args)
            }
            ParamNum::Range(_, max) => format!("{}() expected at most {} arguments, got {}", name, max, num_args),
            ParamNum::AtLeast(_) => format!("{}() got an unexpected number of arguments ({})", name, num_args),
        }
    }
}

pub static BUILTIN_FUNCTIONS: LazyLock<FxHashMap<&'static str, Builtin>> = LazyLock::new(|| {
    [
        Builtin::Abs,
        Builtin::All,
        Builtin::Any,
        Builtin::Bool,
        Builtin::Enumerate,
        Builtin::Filter,
        Builtin::Float,
        Builtin::Int,
        Builtin::Len,
        Builtin::List,
        Builtin::Map,
        Builtin::Max,
        Builtin::Min,
        Builtin::Range,
        Builtin::Repr,
        Builtin::Reversed,
        Builtin::Round,
        Builtin::Sorted,
        Builtin::Str,
        Builtin::Sum,
        Builtin::Tuple,
        Builtin::Zip,
    ]
    .into_iter()
    .map(|builtin| (builtin.name(), builtin))
    .collect()
});

const STR_METHODS: &[&str] = &[
    "count",
    "endswith",
    "find",
    "join",
    "lower",
    "lstrip",
    "replace",
    "rstrip",
    "split",
    "startswith",
    "strip",
    "upper",
];
const SEQUENCE_METHODS: &[&str] = &["count", "index"];
const DICT_METHODS: &[&str] = &["get", "items", "keys", "values"];

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::All => "all",
            Builtin::Any => "any",
            Builtin::Bool => "bool",
            Builtin::Enumerate => "enumerate",
            Builtin::Filter => "filter",
            Builtin::Float => "float",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::List => "list",
            Builtin::Map => "map",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::Range => "range",
            Builtin::Repr => "repr",
            Builtin::Reversed => "reversed",
            Builtin::Round => "round",
            Builtin::Sorted => "sorted",
            Builtin::Str => "str",
            Builtin::Sum => "sum",
            Builtin::Tuple => "tuple",
            Builtin::Zip => "zip",
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTIN_FUNCTIONS.get(name).copied()
    }

    pub fn num_params(&self) -> ParamNum {
        match self {
            Builtin::Abs
            | Builtin::All
            | Builtin::Any
            | Builtin::Len
            | Builtin::Repr
            | Builtin::Reversed
            | Builtin::Sorted => ParamNum::Fixed(1),
            Builtin::Bool | Builtin::Float | Builtin::Int | Builtin::List | Builtin::Str | Builtin::Tuple => {
                ParamNum::Range(0, 1)
            }
            Builtin::Enumerate | Builtin::Round | Builtin::Sum => ParamNum::Range(1, 2),
            Builtin::Filter => ParamNum::Fixed(2),
            Builtin::Map => ParamNum::AtLeast(2),
            Builtin::Max | Builtin::Min => ParamNum::AtLeast(1),
            Builtin::Range => ParamNum::Range(1, 3),
            Builtin::Zip => ParamNum::AtLeast(0),
        }
    }

    pub(crate) fn call(self, evaluator: &mut Evaluator, range: &Range, args: Vec<Value>) -> Result<Value, EvalError> {
        let num_params = self.num_params();
        if !num_params.is_valid(args.len()) {
            return Err(EvalError::TypeError(
                *range,
                num_params.error_message(self.name(), args.len()),
            ));
        }

        match (self, args.as_slice()) {
            (Builtin::Abs, [value]) => match value {
                Value::Bool(b) => Ok(Value::Int(*b as i64)),
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| overflow(range)),
                Value::Float(n) => Ok(Value::Float(n.abs())),
                other => Err(EvalError::TypeError(
                    *range,
                    format!("bad operand type for abs(): '{}'", other.type_name()),
                )),
            },
            (Builtin::All, [value]) => Ok(Value::Bool(iterate(value, range)?.iter().all(Value::is_truthy))),
            (Builtin::Any, [value]) => Ok(Value::Bool(iterate(value, range)?.iter().any(Value::is_truthy))),
            (Builtin::Bool, []) => Ok(Value::Bool(false)),
            (Builtin::Bool, [value]) => Ok(Value::Bool(value.is_truthy())),
            (Builtin::Enumerate, [iterable, rest @ ..]) => {
                let start = match rest.first() {
                    Some(start) => int_arg(start, range)?,
                    None => 0,
                };
                iterate(iterable, range)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        (i as i64)
                            .checked_add(start)
                            .map(|i| Value::Tuple(vec![Value::Int(i), item]))
                            .ok_or_else(|| overflow(range))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            (Builtin::Filter, [func, iterable]) => {
                let mut filtered = Vec::new();
                for item in iterate(iterable, range)? {
                    let keep = match func {
                        Value::None => item.is_truthy(),
                        func => evaluator.call_value(func, vec![item.clone()], range)?.is_truthy(),
                    };
                    if keep {
                        filtered.push(item);
                    }
                }
                Ok(Value::List(filtered))
            }
            (Builtin::Float, []) => Ok(Value::Float(0.0)),
            (Builtin::Float, [value]) => match value {
                Value::Bool(b) => Ok(Value::Float(*b as i64 as f64)),
                Value::Int(n) => Ok(Value::Float(*n as f64)),
                Value::Float(n) => Ok(Value::Float(*n)),
                Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    EvalError::ValueError(
                        *range,
                        format!("could not convert string to float: {}", value.repr()),
                    )
                }),
                other => Err(EvalError::TypeError(
                    *range,
                    format!(
                        "float() argument must be a string or a real number, not '{}'",
                        other.type_name()
                    ),
                )),
            },
            (Builtin::Int, []) => Ok(Value::Int(0)),
            (Builtin::Int, [value]) => match value {
                Value::Bool(b) => Ok(Value::Int(*b as i64)),
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::Float(n) => float_to_int(*n, range).map(Value::Int),
                Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    EvalError::ValueError(
                        *range,
                        format!("invalid literal for int() with base 10: {}", value.repr()),
                    )
                }),
                other => Err(EvalError::TypeError(
                    *range,
                    format!(
                        "int() argument must be a string or a real number, not '{}'",
                        other.type_name()
                    ),
                )),
            },
            (Builtin::Len, [value]) => match value {
                Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) | Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
                Value::Dict(entries) => Ok(Value::Int(entries.len() as i64)),
                other => Err(EvalError::TypeError(
                    *range,
                    format!("object of type '{}' has no len()", other.type_name()),
                )),
            },
            (Builtin::List, []) => Ok(Value::List(Vec::new())),
            (Builtin::List, [value]) => iterate(value, range).map(Value::List),
            (Builtin::Map, [func, iterables @ ..]) => {
                let columns = iterables
                    .iter()
                    .map(|iterable| iterate(iterable, range))
                    .collect::<Result<Vec<_>, _>>()?;
                let len = columns.iter().map(Vec::len).min().unwrap_or_default();
                (0..len)
                    .map(|i| {
                        let args = columns.iter().map(|column| column[i].clone()).collect();
                        evaluator.call_value(func, args, range)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            (Builtin::Max, args) => extremum(self.name(), args, CompareOp::Gt, range),
            (Builtin::Min, args) => extremum(self.name(), args, CompareOp::Lt, range),
            (Builtin::Range, args) => {
                let bounds = args.iter().map(|arg| int_arg(arg, range)).collect::<Result<Vec<_>, _>>()?;
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => unreachable!(),
                };
                make_range(start, stop, step, range)
            }
            (Builtin::Repr, [value]) => Ok(Value::String(value.repr())),
            (Builtin::Reversed, [value]) => match value {
                Value::List(_) | Value::Tuple(_) | Value::String(_) | Value::Dict(_) => {
                    let mut items = iterate(value, range)?;
                    items.reverse();
                    Ok(Value::List(items))
                }
                other => Err(EvalError::TypeError(
                    *range,
                    format!("'{}' object is not reversible", other.type_name()),
                )),
            },
            (Builtin::Round, [value, rest @ ..]) => round(value, rest.first(), range),
            (Builtin::Sorted, [value]) => sort(iterate(value, range)?, range).map(Value::List),
            (Builtin::Str, []) => Ok(Value::String(String::new())),
            (Builtin::Str, [value]) => Ok(Value::String(value.to_string())),
            (Builtin::Sum, [iterable, rest @ ..]) => {
                let start = rest.first().cloned().unwrap_or(Value::Int(0));
                if matches!(start, Value::String(_)) {
                    return Err(EvalError::TypeError(
                        *range,
                        "sum() can't sum strings [use ''.join(seq) instead]".to_string(),
                    ));
                }
                iterate(iterable, range)?
                    .iter()
                    .try_fold(start, |acc, item| binary_op(BinaryOp::Add, &acc, item, range))
            }
            (Builtin::Tuple, []) => Ok(Value::Tuple(Vec::new())),
            (Builtin::Tuple, [value]) => iterate(value, range).map(Value::Tuple),
            (Builtin::Zip, iterables) => {
                let columns = iterables
                    .iter()
                    .map(|iterable| iterate(iterable, range))
                    .collect::<Result<Vec<_>, _>>()?;
                let len = columns.iter().map(Vec::len).min().unwrap_or_default();
                Ok(Value::List(
                    (0..len)
                        .map(|i| Value::Tuple(columns.iter().map(|column| column[i].clone()).collect()))
                        .collect(),
                ))
            }
            _ => unreachable!(),
        }
    }
}

/// Whether `receiver` exposes a method called `name`.
pub fn has_method(receiver: &Value, name: &str) -> bool {
    match receiver {
        Value::String(_) => STR_METHODS.contains(&name),
        Value::List(_) | Value::Tuple(_) => SEQUENCE_METHODS.contains(&name),
        Value::Dict(_) => DICT_METHODS.contains(&name),
        _ => false,
    }
}

pub(crate) fn call_method(receiver: &Value, name: &str, range: &Range, args: Vec<Value>) -> Result<Value, EvalError> {
    match receiver {
        Value::String(s) => call_str_method(s, name, range, args),
        Value::List(items) | Value::Tuple(items) => call_sequence_method(receiver, items, name, range, args),
        Value::Dict(entries) => call_dict_method(entries, name, range, args),
        other => Err(EvalError::AttributeError(
            *range,
            format!("'{}' object has no attribute '{}'", other.type_name(), name),
        )),
    }
}

fn call_str_method(s: &str, name: &str, range: &Range, args: Vec<Value>) -> Result<Value, EvalError> {
    match (name, args.as_slice()) {
        ("upper", []) => Ok(Value::String(s.to_uppercase())),
        ("lower", []) => Ok(Value::String(s.to_lowercase())),
        ("strip" | "lstrip" | "rstrip", [] | [Value::None]) => Ok(Value::String(
            match name {
                "strip" => s.trim(),
                "lstrip" => s.trim_start(),
                _ => s.trim_end(),
            }
            .to_string(),
        )),
        ("strip" | "lstrip" | "rstrip", [Value::String(chars)]) => {
            let is_stripped = |c: char| chars.contains(c);
            Ok(Value::String(
                match name {
                    "strip" => s.trim_matches(is_stripped),
                    "lstrip" => s.trim_start_matches(is_stripped),
                    _ => s.trim_end_matches(is_stripped),
                }
                .to_string(),
            ))
        }
        ("split", args) if args.len() <= 2 => {
            let maxsplit = match args.get(1) {
                Some(value) => int_arg(value, range)?,
                None => -1,
            };
            match args.first() {
                None | Some(Value::None) => Ok(split_whitespace(s, maxsplit)),
                Some(Value::String(sep)) if sep.is_empty() => {
                    Err(EvalError::ValueError(*range, "empty separator".to_string()))
                }
                Some(Value::String(sep)) => {
                    let parts: Vec<&str> = if maxsplit < 0 {
                        s.split(sep.as_str()).collect()
                    } else {
                        s.splitn(maxsplit as usize + 1, sep.as_str()).collect()
                    };
                    Ok(Value::List(parts.into_iter().map(Value::from).collect()))
                }
                Some(other) => Err(must_be_str(other, range)),
            }
        }
        ("join", [iterable]) => {
            let items = iterate(iterable, range)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.as_str()),
                    other => Err(EvalError::TypeError(
                        *range,
                        format!("sequence item {}: expected str instance, {} found", i, other.type_name()),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| Value::String(parts.join(s)))
        }
        ("startswith" | "endswith", [affix]) => {
            let affixes = match affix {
                Value::String(affix) => vec![affix.as_str()],
                Value::Tuple(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(affix) => Ok(affix.as_str()),
                        other => Err(must_be_str(other, range)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                other => {
                    return Err(EvalError::TypeError(
                        *range,
                        format!(
                            "{} first arg must be str or a tuple of str, not {}",
                            name,
                            other.type_name()
                        ),
                    ));
                }
            };
            Ok(Value::Bool(affixes.iter().any(|affix| {
                if name == "startswith" {
                    s.starts_with(affix)
                } else {
                    s.ends_with(affix)
                }
            })))
        }
        ("replace", [Value::String(old), Value::String(new), rest @ ..]) if rest.len() <= 1 => {
            let count = match rest.first() {
                Some(value) => int_arg(value, range)?,
                None => -1,
            };
            Ok(Value::String(if count < 0 {
                s.replace(old.as_str(), new)
            } else {
                s.replacen(old.as_str(), new, count as usize)
            }))
        }
        ("find", [Value::String(sub)]) => Ok(Value::Int(
            s.find(sub.as_str())
                .map(|i| s[..i].chars().count() as i64)
                .unwrap_or(-1),
        )),
        ("count", [Value::String(sub)]) if sub.is_empty() => Ok(Value::Int(s.chars().count() as i64 + 1)),
        ("count", [Value::String(sub)]) => Ok(Value::Int(s.matches(sub.as_str()).count() as i64)),
        (_, args) if STR_METHODS.contains(&name) => Err(invalid_method_args("str", name, args, range)),
        _ => Err(no_attribute("str", name, range)),
    }
}

fn call_sequence_method(
    receiver: &Value,
    items: &[Value],
    name: &str,
    range: &Range,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    match (name, args.as_slice()) {
        ("index", [value]) => items
            .iter()
            .position(|item| item.py_eq(value))
            .map(|i| Value::Int(i as i64))
            .ok_or_else(|| {
                let message = match receiver {
                    Value::Tuple(_) => "tuple.index(x): x not in tuple".to_string(),
                    _ => format!("{} is not in list", value.repr()),
                };
                EvalError::ValueError(*range, message)
            }),
        ("count", [value]) => Ok(Value::Int(items.iter().filter(|item| item.py_eq(value)).count() as i64)),
        (_, args) if SEQUENCE_METHODS.contains(&name) => {
            Err(invalid_method_args(receiver.type_name(), name, args, range))
        }
        _ => Err(no_attribute(receiver.type_name(), name, range)),
    }
}

fn call_dict_method(entries: &[(Value, Value)], name: &str, range: &Range, args: Vec<Value>) -> Result<Value, EvalError> {
    match (name, args.as_slice()) {
        ("get", [key, rest @ ..]) if rest.len() <= 1 => Ok(entries
            .iter()
            .find(|(k, _)| k.py_eq(key))
            .map(|(_, v)| v.clone())
            .or_else(|| rest.first().cloned())
            .unwrap_or(Value::None)),
        ("keys", []) => Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect())),
        ("values", []) => Ok(Value::List(entries.iter().map(|(_, v)| v.clone()).collect())),
        ("items", []) => Ok(Value::List(
            entries
                .iter()
                .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                .collect(),
        )),
        (_, args) if DICT_METHODS.contains(&name) => Err(invalid_method_args("dict", name, args, range)),
        _ => Err(no_attribute("dict", name, range)),
    }
}

fn split_whitespace(s: &str, maxsplit: i64) -> Value {
    if maxsplit < 0 {
        return Value::List(s.split_whitespace().map(Value::from).collect());
    }

    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() && (parts.len() as i64) < maxsplit {
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(Value::from(&rest[..end]));
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(Value::from(rest));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        parts.push(Value::from(rest));
    }
    Value::List(parts)
}

fn extremum(name: &str, args: &[Value], op: CompareOp, range: &Range) -> Result<Value, EvalError> {
    let candidates = match args {
        [iterable] => iterate(iterable, range)?,
        args => args.to_vec(),
    };

    let mut candidates = candidates.into_iter();
    let mut best = candidates.next().ok_or_else(|| {
        EvalError::ValueError(*range, format!("{}() arg is an empty sequence", name))
    })?;
    for candidate in candidates {
        if compare_values(op, &candidate, &best, range)? {
            best = candidate;
        }
    }
    Ok(best)
}

fn make_range(start: i64, stop: i64, step: i64, range: &Range) -> Result<Value, EvalError> {
    if step == 0 {
        return Err(EvalError::ValueError(
            *range,
            "range() arg 3 must not be zero".to_string(),
        ));
    }

    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let len = if step > 0 {
        (stop - start + step - 1).div_euclid(step)
    } else {
        (start - stop - step - 1).div_euclid(-step)
    }
    .max(0);
    if len > MAX_RANGE_LEN {
        return Err(EvalError::OverflowError(*range, "range() result is too large".to_string()));
    }

    Ok(Value::List(
        (0..len).map(|i| Value::Int((start + i * step) as i64)).collect(),
    ))
}

fn round(value: &Value, ndigits: Option<&Value>, range: &Range) -> Result<Value, EvalError> {
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(value) => Some(int_arg(value, range)?),
    };

    match (value, ndigits) {
        (Value::Bool(b), _) => Ok(Value::Int(*b as i64)),
        (Value::Int(n), None) => Ok(Value::Int(*n)),
        (Value::Int(n), Some(digits)) if digits >= 0 => Ok(Value::Int(*n)),
        (Value::Int(n), Some(digits)) => {
            let scaled = round_float(*n as f64, digits);
            float_to_int(scaled, range).map(Value::Int)
        }
        (Value::Float(n), None) => float_to_int(n.round_ties_even(), range).map(Value::Int),
        (Value::Float(n), Some(digits)) => Ok(Value::Float(round_float(*n, digits))),
        (other, _) => Err(EvalError::TypeError(
            *range,
            format!("type {} doesn't define __round__ method", other.type_name()),
        )),
    }
}

fn round_float(n: f64, digits: i64) -> f64 {
    if !n.is_finite() {
        return n;
    }
    let digits = digits.clamp(-308, 308) as i32;
    let factor = 10f64.powi(digits.abs());
    if digits >= 0 {
        let scaled = n * factor;
        if scaled.is_finite() {
            scaled.round_ties_even() / factor
        } else {
            n
        }
    } else {
        (n / factor).round_ties_even() * factor
    }
}

/// Stable merge sort that surfaces comparison errors instead of panicking on them.
fn sort(items: Vec<Value>, range: &Range) -> Result<Vec<Value>, EvalError> {
    if items.len() <= 1 {
        return Ok(items);
    }

    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = sort(left, range)?;
    let right = sort(right, range)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare_values(CompareOp::Lt, r, l, range)? {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn int_arg(value: &Value, range: &Range) -> Result<i64, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b as i64),
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::TypeError(
            *range,
            format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ),
        )),
    }
}

fn overflow(range: &Range) -> EvalError {
    EvalError::OverflowError(*range, "int too large to be represented".to_string())
}

fn must_be_str(value: &Value, range: &Range) -> EvalError {
    EvalError::TypeError(
        *range,
        format!("must be str or None, not {}", value.type_name()),
    )
}

fn no_attribute(type_name: &str, name: &str, range: &Range) -> EvalError {
    EvalError::AttributeError(
        *range,
        format!("'{}' object has no attribute '{}'", type_name, name),
    )
}

fn invalid_method_args(type_name: &str, name: &str, args: &[Value], range: &Range) -> EvalError {
    EvalError::TypeError(
        *range,
        format!(
            "{}.{}() got unsupported arguments ({})",
            type_name,
            name,
            args.iter().map(Value::type_name).join(", ")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    fn call(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
        builtin.call(&mut Evaluator::default(), &Range::default(), args)
    }

    #[rstest]
    #[case::len_str(Builtin::Len, vec![s("héllo")], Value::Int(5))]
    #[case::len_dict(Builtin::Len, vec![Value::Dict(vec![(s("a"), Value::None)])], Value::Int(1))]
    #[case::abs_int(Builtin::Abs, vec![Value::Int(-3)], Value::Int(3))]
    #[case::abs_float(Builtin::Abs, vec![Value::Float(-1.5)], Value::Float(1.5))]
    #[case::int_from_float(Builtin::Int, vec![Value::Float(-2.7)], Value::Int(-2))]
    #[case::int_from_str(Builtin::Int, vec![s(" 42 ")], Value::Int(42))]
    #[case::float_from_str(Builtin::Float, vec![s("1e3")], Value::Float(1000.0))]
    #[case::str_of_list(Builtin::Str, vec![Value::List(vec![s("a")])], s("['a']"))]
    #[case::repr_str(Builtin::Repr, vec![s("a")], s("'a'"))]
    #[case::range_stop(Builtin::Range, vec![Value::Int(3)], Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2)]))]
    #[case::range_negative_step(Builtin::Range, vec![Value::Int(5), Value::Int(0), Value::Int(-2)], Value::List(vec![Value::Int(5), Value::Int(3), Value::Int(1)]))]
    #[case::range_empty(Builtin::Range, vec![Value::Int(3), Value::Int(1)], Value::List(vec![]))]
    #[case::round_half_even(Builtin::Round, vec![Value::Float(2.5)], Value::Int(2))]
    #[case::round_digits(Builtin::Round, vec![Value::Float(1.2345), Value::Int(2)], Value::Float(1.23))]
    #[case::round_negative_digits(Builtin::Round, vec![Value::Int(1250), Value::Int(-2)], Value::Int(1200))]
    #[case::sorted(Builtin::Sorted, vec![Value::List(vec![Value::Int(3), Value::Float(1.5), Value::Int(2)])], Value::List(vec![Value::Float(1.5), Value::Int(2), Value::Int(3)]))]
    #[case::sorted_str(Builtin::Sorted, vec![s("cab")], Value::List(vec![s("a"), s("b"), s("c")]))]
    #[case::max_args(Builtin::Max, vec![Value::Int(1), Value::Int(5), Value::Int(3)], Value::Int(5))]
    #[case::min_iterable(Builtin::Min, vec![Value::List(vec![s("b"), s("a")])], s("a"))]
    #[case::sum(Builtin::Sum, vec![Value::List(vec![Value::Int(1), Value::Float(0.5)])], Value::Float(1.5))]
    #[case::sum_start(Builtin::Sum, vec![Value::List(vec![Value::List(vec![Value::Int(1)])]), Value::List(vec![])], Value::List(vec![Value::Int(1)]))]
    #[case::zip(Builtin::Zip, vec![Value::List(vec![Value::Int(1), Value::Int(2)]), s("a")], Value::List(vec![Value::Tuple(vec![Value::Int(1), s("a")])]))]
    #[case::enumerate(Builtin::Enumerate, vec![s("ab"), Value::Int(1)], Value::List(vec![Value::Tuple(vec![Value::Int(1), s("a")]), Value::Tuple(vec![Value::Int(2), s("b")])]))]
    #[case::reversed(Builtin::Reversed, vec![Value::Tuple(vec![Value::Int(1), Value::Int(2)])], Value::List(vec![Value::Int(2), Value::Int(1)]))]
    #[case::filter_none(Builtin::Filter, vec![Value::None, Value::List(vec![Value::Int(0), Value::Int(1), s("")])], Value::List(vec![Value::Int(1)]))]
    #[case::all_empty(Builtin::All, vec![Value::List(vec![])], Value::Bool(true))]
    #[case::any(Builtin::Any, vec![Value::List(vec![Value::Int(0), Value::Bool(true)])], Value::Bool(true))]
    #[case::bool_empty(Builtin::Bool, vec![], Value::Bool(false))]
    #[case::tuple_of_dict(Builtin::Tuple, vec![Value::Dict(vec![(s("k"), Value::Int(1))])], Value::Tuple(vec![s("k")]))]
    fn test_call(#[case] builtin: Builtin, #[case] args: Vec<Value>, #[case] expected: Value) {
        assert_eq!(call(builtin, args), Ok(expected));
    }

    #[rstest]
    #[case::len_of_int(Builtin::Len, vec![Value::Int(1)], "TypeError: object of type 'int' has no len()")]
    #[case::len_arity(Builtin::Len, vec![], "TypeError: len() takes exactly one argument (0 given)")]
    #[case::max_empty(Builtin::Max, vec![Value::List(vec![])], "ValueError: max() arg is an empty sequence")]
    #[case::int_from_bad_str(Builtin::Int, vec![s("x")], "ValueError: invalid literal for int() with base 10: 'x'")]
    #[case::sorted_mixed(Builtin::Sorted, vec![Value::List(vec![Value::Int(1), s("a")])], "TypeError: '<' not supported between instances of 'str' and 'int'")]
    #[case::range_zero_step(Builtin::Range, vec![Value::Int(0), Value::Int(1), Value::Int(0)], "ValueError: range() arg 3 must not be zero")]
    #[case::range_too_large(Builtin::Range, vec![Value::Int(i64::MAX)], "OverflowError: range() result is too large")]
    #[case::sum_strings(Builtin::Sum, vec![Value::List(vec![]), s("")], "TypeError: sum() can't sum strings [use ''.join(seq) instead]")]
    #[case::abs_overflow(Builtin::Abs, vec![Value::Int(i64::MIN)], "OverflowError: int too large to be represented")]
    #[case::round_inf(Builtin::Round, vec![Value::Float(f64::INFINITY)], "OverflowError: cannot convert float infinity to integer")]
    fn test_call_error(#[case] builtin: Builtin, #[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(call(builtin, args).unwrap_err().to_string(), expected);
    }

    #[rstest]
    #[case::upper(s("abc"), "upper", vec![], s("ABC"))]
    #[case::strip(s("  a  "), "strip", vec![], s("a"))]
    #[case::strip_chars(s("xxaxx"), "lstrip", vec![s("x")], s("axx"))]
    #[case::split(s(" a  b "), "split", vec![], Value::List(vec![s("a"), s("b")]))]
    #[case::split_max(s("a b c"), "split", vec![Value::None, Value::Int(1)], Value::List(vec![s("a"), s("b c")]))]
    #[case::split_sep(s("a,b,,c"), "split", vec![s(",")], Value::List(vec![s("a"), s("b"), s(""), s("c")]))]
    #[case::join(s("-"), "join", vec![Value::List(vec![s("a"), s("b")])], s("a-b"))]
    #[case::startswith_tuple(s("hello"), "startswith", vec![Value::Tuple(vec![s("x"), s("he")])], Value::Bool(true))]
    #[case::endswith(s("hello"), "endswith", vec![s("lo")], Value::Bool(true))]
    #[case::replace(s("aaa"), "replace", vec![s("a"), s("b"), Value::Int(2)], s("bba"))]
    #[case::find(s("héllo"), "find", vec![s("l")], Value::Int(2))]
    #[case::find_missing(s("abc"), "find", vec![s("z")], Value::Int(-1))]
    #[case::count_str(s("banana"), "count", vec![s("an")], Value::Int(2))]
    #[case::list_index(Value::List(vec![Value::Int(5), Value::Int(6)]), "index", vec![Value::Int(6)], Value::Int(1))]
    #[case::tuple_count(Value::Tuple(vec![Value::Int(1), Value::Float(1.0)]), "count", vec![Value::Int(1)], Value::Int(2))]
    #[case::dict_get(Value::Dict(vec![(s("a"), Value::Int(1))]), "get", vec![s("a")], Value::Int(1))]
    #[case::dict_get_default(Value::Dict(vec![]), "get", vec![s("a"), Value::Int(0)], Value::Int(0))]
    #[case::dict_items(Value::Dict(vec![(s("a"), Value::Int(1))]), "items", vec![], Value::List(vec![Value::Tuple(vec![s("a"), Value::Int(1)])]))]
    fn test_call_method(#[case] receiver: Value, #[case] name: &str, #[case] args: Vec<Value>, #[case] expected: Value) {
        assert!(has_method(&receiver, name));
        assert_eq!(call_method(&receiver, name, &Range::default(), args), Ok(expected));
    }

    #[rstest]
    #[case::join_non_str(s(","), "join", vec![Value::List(vec![Value::Int(1)])], "TypeError: sequence item 0: expected str instance, int found")]
    #[case::index_missing(Value::List(vec![]), "index", vec![Value::Int(3)], "ValueError: 3 is not in list")]
    #[case::unknown(s("a"), "title", vec![], "AttributeError: 'str' object has no attribute 'title'")]
    #[case::empty_separator(s("a"), "split", vec![s("")], "ValueError: empty separator")]
    fn test_call_method_error(#[case] receiver: Value, #[case] name: &str, #[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(
            call_method(&receiver, name, &Range::default(), args).unwrap_err().to_string(),
            expected
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Builtin::lookup("len"), Some(Builtin::Len));
        assert_eq!(Builtin::lookup("print"), None);
        assert!(BUILTIN_FUNCTIONS.values().all(|b| Builtin::lookup(b.name()) == Some(*b)));
    }
}
