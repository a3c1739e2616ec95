use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::Value;

/// Lexical scope. Lambdas capture the scope they were created in.
#[derive(Debug, Clone, Default)]
pub struct Env {
    context: FxHashMap<SmolStr, Value>,
    parent: Option<Arc<Env>>,
}

impl Env {
    pub fn with_parent(parent: &Arc<Env>, bindings: impl IntoIterator<Item = (SmolStr, Value)>) -> Arc<Env> {
        Arc::new(Env {
            context: bindings.into_iter().collect(),
            parent: Some(Arc::clone(parent)),
        })
    }

    pub fn define(&mut self, name: SmolStr, value: Value) {
        self.context.insert(name, value);
    }

    pub fn resolve(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.context.get(name) {
                return Some(value.clone());
            }
            env = env.parent.as_deref()?;
        }
    }
}
