#![no_main]

use arbitrary::Arbitrary;
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Expr {
    Lambda(Vec<String>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    BinOp(Box<Expr>, String, Box<Expr>),
    IfElse(Box<Expr>, Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Name(String),
    Int(i64),
    Raw(String),
}

impl Expr {
    fn to_script(&self) -> String {
        match self {
            Expr::Lambda(params, body) => format!("(lambda {}: {})", params.join(", "), body.to_script()),
            Expr::Call(func, args) => format!("{}({})", func.to_script(), args.iter().map(Expr::to_script).join(", ")),
            Expr::BinOp(lhs, op, rhs) => format!("({} {} {})", lhs.to_script(), op, rhs.to_script()),
            Expr::IfElse(then, cond, otherwise) => format!(
                "({} if {} else {})",
                then.to_script(),
                cond.to_script(),
                otherwise.to_script()
            ),
            Expr::List(items) => format!("[{}]", items.iter().map(Expr::to_script).join(", ")),
            Expr::Name(name) | Expr::Raw(name) => name.clone(),
            Expr::Int(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct Context {
    raw_script: Option<String>,
    generated_script: Option<Expr>,
    input: Option<String>,
}

fuzz_target!(|context: Context| {
    let script = match (&context.raw_script, &context.generated_script) {
        (Some(raw), _) => raw.clone(),
        (_, Some(generated)) => format!("lambda x: {}", generated.to_script()),
        _ => "".to_string(),
    };

    let mut engine = edge_py_lang::Engine::default();
    let Ok(func) = engine.eval(&script) else {
        return;
    };
    let input = context
        .input
        .as_deref()
        .and_then(|input| serde_json::from_str::<serde_json::Value>(input).ok())
        .unwrap_or(serde_json::Value::Null);
    if let Ok(output) = engine.call(&func, vec![input.into()]) {
        let _ = serde_json::Value::try_from(output);
    }
});
