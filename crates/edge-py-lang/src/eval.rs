// Tree-walking evaluator for parsed lambda scripts.
// A program is a single expression; evaluating it yields one value, which the
// host may then call through `Evaluator::call_value`.
use std::cmp::Ordering;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::ast::node::{BinaryOp, BoolOp, CompareOp, Comprehension, Expr, Index, Literal, Node, UnaryOp};
use crate::range::Range;
use crate::value::{Function, Number, Value};

pub mod builtin;
pub mod env;
pub mod error;

use builtin::Builtin;
use env::Env;
use error::EvalError;

#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of nested lambda calls before a `RecursionError` is raised.
    pub max_call_depth: u32,
    /// Maximum number of expressions being evaluated at once, counted across calls.
    pub max_nesting_depth: u32,
}

#[cfg(debug_assertions)]
impl Default for Options {
    fn default() -> Self {
        // Unoptimized frames are large; keep recursion within a default thread stack.
        Self {
            max_call_depth: 64,
            max_nesting_depth: 200,
        }
    }
}

#[cfg(not(debug_assertions))]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_nesting_depth: 800,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    pub(crate) options: Options,
    call_depth: u32,
    nesting_depth: u32,
}

impl Evaluator {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            call_depth: 0,
            nesting_depth: 0,
        }
    }

    pub fn eval(&mut self, node: &Node, env: &Arc<Env>) -> Result<Value, EvalError> {
        if self.nesting_depth >= self.options.max_nesting_depth {
            return Err(EvalError::RecursionError(node.range, self.options.max_nesting_depth));
        }

        self.nesting_depth += 1;
        let result = self.eval_expr(node, env);
        self.nesting_depth -= 1;
        result
    }

    fn eval_expr(&mut self, node: &Node, env: &Arc<Env>) -> Result<Value, EvalError> {
        match &node.expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(n) => Value::Float(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Name(name) => env
                .resolve(name)
                .or_else(|| Builtin::lookup(name).map(Value::Builtin))
                .ok_or_else(|| EvalError::NameError(node.range, name.clone())),
            Expr::List(items) => self.eval_all(items, env).map(Value::List),
            Expr::Tuple(items) => self.eval_all(items, env).map(Value::Tuple),
            Expr::Dict(entries) => self.eval_dict(entries, env),
            Expr::ListComp(comprehension) => self.eval_comprehension(comprehension, env),
            Expr::Unary(op, operand) => {
                let operand = self.eval(operand, env)?;
                unary_op(*op, &operand, &node.range)
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, env)?;
                let rhs = self.eval(rhs, env)?;
                binary_op(*op, &lhs, &rhs, &node.range)
            }
            Expr::Bool(op, lhs, rhs) => {
                let lhs = self.eval(lhs, env)?;
                match (op, lhs.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(lhs),
                    _ => self.eval(rhs, env),
                }
            }
            Expr::Compare(first, rest) => {
                let mut lhs = self.eval(first, env)?;
                for (op, rhs) in rest {
                    let rhs_value = self.eval(rhs, env)?;
                    if !compare_values(*op, &lhs, &rhs_value, &rhs.range)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs_value;
                }
                Ok(Value::Bool(true))
            }
            Expr::IfElse { cond, then, otherwise } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Lambda(def) => Ok(Value::Function(Function {
                def: Arc::clone(def),
                env: Arc::clone(env),
            })),
            Expr::Call(callee, args) => {
                let callee = self.eval(callee, env)?;
                let args = self.eval_all(args, env)?;
                self.call_value(&callee, args, &node.range)
            }
            Expr::Attribute(receiver, name) => {
                let receiver = self.eval(receiver, env)?;
                if builtin::has_method(&receiver, name) {
                    Ok(Value::Method(Box::new(receiver), name.clone()))
                } else {
                    Err(EvalError::AttributeError(
                        node.range,
                        format!("'{}' object has no attribute '{}'", receiver.type_name(), name),
                    ))
                }
            }
            Expr::Subscript(target, index) => {
                let target = self.eval(target, env)?;
                match index {
                    Index::Single(key) => {
                        let key = self.eval(key, env)?;
                        subscript(&target, &key, &node.range)
                    }
                    Index::Slice { lower, upper, step } => {
                        let lower = self.eval_optional(lower.as_deref(), env)?;
                        let upper = self.eval_optional(upper.as_deref(), env)?;
                        let step = self.eval_optional(step.as_deref(), env)?;
                        slice(&target, &lower, &upper, &step, &node.range)
                    }
                }
            }
        }
    }

    /// Calls any callable value with positional arguments.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, range: &Range) -> Result<Value, EvalError> {
        match callee {
            Value::Function(function) => self.call_function(function, args, range),
            Value::Builtin(builtin) => builtin.call(self, range, args),
            Value::Method(receiver, name) => builtin::call_method(receiver, name, range, args),
            other => Err(EvalError::TypeError(
                *range,
                format!("'{}' object is not callable", other.type_name()),
            )),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>, range: &Range) -> Result<Value, EvalError> {
        let params = function.params();
        if params.len() != args.len() {
            return Err(EvalError::TypeError(*range, arity_message(params, args.len())));
        }

        if self.call_depth >= self.options.max_call_depth {
            return Err(EvalError::RecursionError(*range, self.options.max_call_depth));
        }

        let env = Env::with_parent(&function.env, params.iter().cloned().zip(args));
        self.call_depth += 1;
        let result = self.eval(&function.def.body, &env);
        self.call_depth -= 1;
        result
    }

    fn eval_all(&mut self, nodes: &[Node], env: &Arc<Env>) -> Result<Vec<Value>, EvalError> {
        nodes.iter().map(|node| self.eval(node, env)).collect()
    }

    fn eval_optional(&mut self, node: Option<&Node>, env: &Arc<Env>) -> Result<Value, EvalError> {
        match node {
            Some(node) => self.eval(node, env),
            None => Ok(Value::None),
        }
    }

    fn eval_dict(&mut self, entries: &[(Node, Node)], env: &Arc<Env>) -> Result<Value, EvalError> {
        let mut dict: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key_node, value_node) in entries {
            let key = self.eval(key_node, env)?;
            let value = self.eval(value_node, env)?;
            if !key.is_hashable() {
                return Err(unhashable(&key, &key_node.range));
            }
            match dict.iter_mut().find(|(k, _)| k.py_eq(&key)) {
                Some((_, existing)) => *existing = value,
                None => dict.push((key, value)),
            }
        }
        Ok(Value::Dict(dict))
    }

    fn eval_comprehension(&mut self, comprehension: &Comprehension, env: &Arc<Env>) -> Result<Value, EvalError> {
        let items = {
            let iterable = self.eval(&comprehension.iter, env)?;
            iterate(&iterable, &comprehension.iter.range)?
        };

        let mut results = Vec::with_capacity(items.len());
        'items: for item in items {
            let bindings = unpack(&comprehension.targets, item, &comprehension.iter.range)?;
            let scope = Env::with_parent(env, bindings);
            for condition in &comprehension.conditions {
                if !self.eval(condition, &scope)?.is_truthy() {
                    continue 'items;
                }
            }
            results.push(self.eval(&comprehension.element, &scope)?);
        }
        Ok(Value::List(results))
    }
}

fn arity_message(params: &[SmolStr], given: usize) -> String {
    if given > params.len() {
        format!(
            "<lambda>() takes {} positional argument{} but {} {} given",
            params.len(),
            if params.len() == 1 { "" } else { "s" },
            given,
            if given == 1 { "was" } else { "were" }
        )
    } else {
        let missing = params[given..].iter().map(|p| format!("'{}'", p)).collect::<Vec<_>>();
        let names = match missing.as_slice() {
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
            [] => String::new(),
        };
        format!(
            "<lambda>() missing {} required positional argument{}: {}",
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            names
        )
    }
}

fn unpack(targets: &[SmolStr], item: Value, range: &Range) -> Result<Vec<(SmolStr, Value)>, EvalError> {
    if let [target] = targets {
        return Ok(vec![(target.clone(), item)]);
    }

    let values = match item {
        Value::List(values) | Value::Tuple(values) => values,
        Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
        other => {
            return Err(EvalError::TypeError(
                *range,
                format!("cannot unpack non-iterable {} object", other.type_name()),
            ));
        }
    };

    match values.len().cmp(&targets.len()) {
        Ordering::Less => Err(EvalError::ValueError(
            *range,
            format!(
                "not enough values to unpack (expected {}, got {})",
                targets.len(),
                values.len()
            ),
        )),
        Ordering::Greater => Err(EvalError::ValueError(
            *range,
            format!("too many values to unpack (expected {})", targets.len()),
        )),
        Ordering::Equal => Ok(targets.iter().cloned().zip(values).collect()),
    }
}

/// Materializes the items produced by iterating `value` in a `for` clause or builtin.
pub(crate) fn iterate(value: &Value, range: &Range) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
        other => Err(EvalError::TypeError(
            *range,
            format!("'{}' object is not iterable", other.type_name()),
        )),
    }
}

fn unary_op(op: UnaryOp, operand: &Value, range: &Range) -> Result<Value, EvalError> {
    match (op, operand.as_number()) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Some(Number::Int(n))) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow(range)),
        (UnaryOp::Neg, Some(Number::Float(n))) => Ok(Value::Float(-n)),
        (UnaryOp::Pos, Some(Number::Int(n))) => Ok(Value::Int(n)),
        (UnaryOp::Pos, Some(Number::Float(n))) => Ok(Value::Float(n)),
        (op, None) => Err(EvalError::TypeError(
            *range,
            format!("bad operand type for {}: '{}'", op, operand.type_name()),
        )),
    }
}

pub(crate) fn binary_op(op: BinaryOp, lhs: &Value, rhs: &Value, range: &Range) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return numeric_op(op, a, b, range);
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(a.iter().chain(b).cloned().collect())),
        (BinaryOp::Add, Value::String(_), other) => Err(EvalError::TypeError(
            *range,
            format!("can only concatenate str (not \"{}\") to str", other.type_name()),
        )),
        (BinaryOp::Add, Value::List(_), other) => Err(EvalError::TypeError(
            *range,
            format!("can only concatenate list (not \"{}\") to list", other.type_name()),
        )),
        (BinaryOp::Mul, sequence, count) | (BinaryOp::Mul, count, sequence)
            if matches!(sequence, Value::String(_) | Value::List(_) | Value::Tuple(_))
                && matches!(count, Value::Int(_) | Value::Bool(_)) =>
        {
            repeat(sequence, count, range)
        }
        _ => Err(EvalError::TypeError(
            *range,
            format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op,
                lhs.type_name(),
                rhs.type_name()
            ),
        )),
    }
}

fn numeric_op(op: BinaryOp, lhs: Number, rhs: Number, range: &Range) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => int_op(op, a, b, range),
        (a, b) => float_op(op, a.as_f64(), b.as_f64(), range),
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64, range: &Range) -> Result<Value, EvalError> {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or_else(|| overflow(range));
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div if b == 0 => Err(EvalError::ZeroDivision(*range, "division by zero")),
        BinaryOp::Div => Ok(Value::Float(a as f64 / b as f64)),
        BinaryOp::FloorDiv if b == 0 => Err(EvalError::ZeroDivision(*range, "integer division or modulo by zero")),
        BinaryOp::FloorDiv => {
            let quotient = a.checked_div(b).ok_or_else(|| overflow(range))?;
            let adjust = (a % b != 0) && ((a < 0) != (b < 0));
            Ok(Value::Int(if adjust { quotient - 1 } else { quotient }))
        }
        BinaryOp::Mod if b == 0 => Err(EvalError::ZeroDivision(*range, "integer modulo by zero")),
        BinaryOp::Mod => {
            let remainder = a.checked_rem(b).unwrap_or(0);
            let adjust = remainder != 0 && ((remainder < 0) != (b < 0));
            Ok(Value::Int(if adjust { remainder + b } else { remainder }))
        }
        BinaryOp::Pow if b < 0 => float_op(op, a as f64, b as f64, range),
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exp) => checked(a.checked_pow(exp)),
            Err(_) if matches!(a, 0 | 1) => Ok(Value::Int(a)),
            Err(_) if a == -1 => Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
            Err(_) => Err(overflow(range)),
        },
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64, range: &Range) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(EvalError::ZeroDivision(*range, "float division by zero")),
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv if b == 0.0 => return Err(EvalError::ZeroDivision(*range, "float floor division by zero")),
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod if b == 0.0 => return Err(EvalError::ZeroDivision(*range, "float modulo")),
        BinaryOp::Mod => {
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Pow if a == 0.0 && b < 0.0 => {
            return Err(EvalError::ZeroDivision(
                *range,
                "0.0 cannot be raised to a negative power",
            ));
        }
        BinaryOp::Pow if a < 0.0 && b.fract() != 0.0 => {
            return Err(EvalError::ValueError(
                *range,
                "negative number cannot be raised to a fractional power".to_string(),
            ));
        }
        BinaryOp::Pow => a.powf(b),
    };

    if result.is_infinite() && a.is_finite() && b.is_finite() && op == BinaryOp::Pow {
        return Err(EvalError::OverflowError(*range, "(34, 'Numerical result out of range')".to_string()));
    }
    Ok(Value::Float(result))
}

fn repeat(sequence: &Value, count: &Value, range: &Range) -> Result<Value, EvalError> {
    let count = match count {
        Value::Int(n) => (*n).max(0) as usize,
        Value::Bool(b) => *b as usize,
        _ => 0,
    };
    let len = match sequence {
        Value::String(s) => s.len(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.checked_mul(count).is_none_or(|total| total > isize::MAX as usize / 16) {
        return Err(EvalError::OverflowError(*range, "repeated sequence is too long".to_string()));
    }

    let repeated =
        |items: &[Value]| -> Vec<Value> { std::iter::repeat_n(items, count).flatten().cloned().collect() };
    Ok(match sequence {
        Value::String(s) => Value::String(s.repeat(count)),
        Value::List(items) => Value::List(repeated(items)),
        Value::Tuple(items) => Value::Tuple(repeated(items)),
        other => other.clone(),
    })
}

/// Evaluates a single comparison such as `a < b` or `a in b`.
pub(crate) fn compare_values(op: CompareOp, lhs: &Value, rhs: &Value, range: &Range) -> Result<bool, EvalError> {
    let ordering = |expected: fn(Ordering) -> bool| match lhs.py_cmp(rhs) {
        Some(ordering) => Ok(expected(ordering)),
        // NaN compares false against every number.
        None if lhs.as_number().is_some() && rhs.as_number().is_some() => Ok(false),
        None => Err(EvalError::TypeError(
            *range,
            format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op,
                lhs.type_name(),
                rhs.type_name()
            ),
        )),
    };

    match op {
        CompareOp::Eq => Ok(lhs.py_eq(rhs)),
        CompareOp::NotEq => Ok(!lhs.py_eq(rhs)),
        CompareOp::Lt => ordering(Ordering::is_lt),
        CompareOp::Lte => ordering(Ordering::is_le),
        CompareOp::Gt => ordering(Ordering::is_gt),
        CompareOp::Gte => ordering(Ordering::is_ge),
        CompareOp::In => contains(rhs, lhs, range),
        CompareOp::NotIn => contains(rhs, lhs, range).map(|found| !found),
        CompareOp::Is => Ok(lhs.is_identical(rhs)),
        CompareOp::IsNot => Ok(!lhs.is_identical(rhs)),
    }
}

fn contains(container: &Value, item: &Value, range: &Range) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::String(_), other) => Err(EvalError::TypeError(
            *range,
            format!("'in <string>' requires string as left operand, not {}", other.type_name()),
        )),
        (Value::List(items) | Value::Tuple(items), item) => Ok(items.iter().any(|i| i.py_eq(item))),
        (Value::Dict(_), key) if !key.is_hashable() => Err(unhashable(key, range)),
        (Value::Dict(entries), key) => Ok(entries.iter().any(|(k, _)| k.py_eq(key))),
        (other, _) => Err(EvalError::TypeError(
            *range,
            format!("argument of type '{}' is not iterable", other.type_name()),
        )),
    }
}

fn subscript(target: &Value, key: &Value, range: &Range) -> Result<Value, EvalError> {
    match target {
        Value::List(items) | Value::Tuple(items) => {
            let index = sequence_index(target, key, items.len(), range)?;
            Ok(items[index].clone())
        }
        Value::String(s) => {
            let chars = s.chars().collect::<Vec<_>>();
            let index = sequence_index(target, key, chars.len(), range)?;
            Ok(Value::String(chars[index].to_string()))
        }
        Value::Dict(_) if !key.is_hashable() => Err(unhashable(key, range)),
        Value::Dict(entries) => entries
            .iter()
            .find(|(k, _)| k.py_eq(key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| EvalError::KeyError(*range, key.repr())),
        other => Err(EvalError::TypeError(
            *range,
            format!("'{}' object is not subscriptable", other.type_name()),
        )),
    }
}

fn sequence_index(target: &Value, key: &Value, len: usize, range: &Range) -> Result<usize, EvalError> {
    let type_name = match target {
        Value::String(_) => "string",
        other => other.type_name(),
    };
    let index = match key {
        Value::Int(n) => *n,
        Value::Bool(b) => *b as i64,
        other => {
            return Err(EvalError::TypeError(
                *range,
                format!(
                    "{} indices must be integers or slices, not {}",
                    target.type_name(),
                    other.type_name()
                ),
            ));
        }
    };

    let resolved = if index < 0 { index + len as i64 } else { index };
    if (0..len as i64).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(EvalError::IndexError(*range, format!("{} index out of range", type_name)))
    }
}

fn slice(target: &Value, lower: &Value, upper: &Value, step: &Value, range: &Range) -> Result<Value, EvalError> {
    let bound = |value: &Value| match value {
        Value::None => Ok(None),
        Value::Int(n) => Ok(Some(*n)),
        Value::Bool(b) => Ok(Some(*b as i64)),
        _ => Err(EvalError::TypeError(
            *range,
            "slice indices must be integers or None or have an __index__ method".to_string(),
        )),
    };
    let (lower, upper, step) = (bound(lower)?, bound(upper)?, bound(step)?.unwrap_or(1));
    if step == 0 {
        return Err(EvalError::ValueError(*range, "slice step cannot be zero".to_string()));
    }

    let pick = |len: usize| slice_indices(len as i64, lower, upper, step);
    match target {
        Value::List(items) => Ok(Value::List(pick(items.len()).map(|i| items[i].clone()).collect())),
        Value::Tuple(items) => Ok(Value::Tuple(pick(items.len()).map(|i| items[i].clone()).collect())),
        Value::String(s) => {
            let chars = s.chars().collect::<Vec<_>>();
            Ok(Value::String(pick(chars.len()).map(|i| chars[i]).collect()))
        }
        other => Err(EvalError::TypeError(
            *range,
            format!("'{}' object is not subscriptable", other.type_name()),
        )),
    }
}

/// Indices selected by `[lower:upper:step]` over a sequence of `len` items.
fn slice_indices(len: i64, lower: Option<i64>, upper: Option<i64>, step: i64) -> impl Iterator<Item = usize> {
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound.saturating_add(len) } else { bound };
        bound.clamp(low, high)
    };

    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |b| clamp(b, 0, len)),
            upper.map_or(len, |b| clamp(b, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |b| clamp(b, -1, len - 1)),
            upper.map_or(-1, |b| clamp(b, -1, len - 1)),
        )
    };

    let mut current = start;
    std::iter::from_fn(move || {
        let in_range = if step > 0 { current < stop } else { current > stop };
        if !in_range {
            return None;
        }
        let index = current as usize;
        current = current.saturating_add(step);
        Some(index)
    })
}

pub(crate) fn float_to_int(n: f64, range: &Range) -> Result<i64, EvalError> {
    if n.is_nan() {
        return Err(EvalError::ValueError(*range, "cannot convert float NaN to integer".to_string()));
    }
    if n.is_infinite() {
        return Err(EvalError::OverflowError(
            *range,
            "cannot convert float infinity to integer".to_string(),
        ));
    }

    let truncated = n.trunc();
    if (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&truncated) {
        Ok(truncated as i64)
    } else {
        Err(overflow(range))
    }
}

fn overflow(range: &Range) -> EvalError {
    EvalError::OverflowError(*range, "int too large to be represented".to_string())
}

fn unhashable(value: &Value, range: &Range) -> EvalError {
    EvalError::TypeError(*range, format!("unhashable type: '{}'", value.type_name()))
}
