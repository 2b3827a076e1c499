use std::collections::HashMap;
use std::fmt;

use num_bigint::Sign;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{ExecutionError, Result};
use crate::scalar::Value;

/// A builtin function callable from queries. Receives the environment and
/// the already-evaluated arguments.
pub type BuiltinFunction = Box<dyn Fn(&dyn Env, &[Value]) -> Result<Value> + Send + Sync>;

/// The runtime environment queries are evaluated against.
///
/// Evaluation borrows the environment for the duration of a single call
/// and never retains it.
pub trait Env {
    /// Resolve a dotted attribute path such as `["msg", "value"]`.
    fn lookup(&self, parts: &[String]) -> Result<Value>;

    /// Invoke a builtin by its lower-cased name.
    fn execute_function(&self, name: &str, args: &[Value]) -> Result<Value>;

    /// Decide `<value> IS <class>` membership. Class names arrive
    /// lower-cased; the set of understood classes is up to the
    /// implementation.
    fn is_member(&self, value: &Value, class: &str) -> Result<bool>;
}

/// Metrics collected about a single watched contract. Carried by the
/// environment for its own bookkeeping; evaluation never reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetrics {
    pub blocks_observed: u64,
    pub transactions_observed: u64,
}

/// An [`Env`] over fixed attribute bindings and a registered function
/// table.
#[derive(Default)]
pub struct StaticEnv {
    attributes: HashMap<String, Value>,
    functions: HashMap<String, BuiltinFunction>,
    metrics: HashMap<String, ContractMetrics>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a dotted attribute path to a value.
    pub fn bind(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(path.into(), value.into());
    }

    /// Register a builtin under a (case-insensitive) name.
    pub fn register_function(&mut self, name: impl Into<String>, function: BuiltinFunction) {
        self.functions
            .insert(name.into().to_ascii_lowercase(), function);
    }

    pub fn record_metrics(&mut self, contract: impl Into<String>, metrics: ContractMetrics) {
        self.metrics.insert(contract.into(), metrics);
    }

    pub fn metrics(&self, contract: &str) -> Option<&ContractMetrics> {
        self.metrics.get(contract)
    }
}

impl fmt::Debug for StaticEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticEnv")
            .field("attributes", &self.attributes)
            .field("functions", &self.functions.keys())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Env for StaticEnv {
    fn lookup(&self, parts: &[String]) -> Result<Value> {
        let path = parts.join(".");
        self.attributes
            .get(&path)
            .cloned()
            .ok_or(ExecutionError::UnknownAttribute(path))
    }

    fn execute_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        trace!(%name, args = args.len(), "dispatching builtin");
        let function = self
            .functions
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| ExecutionError::UnknownFunction(name.to_string()))?;
        function(self, args)
    }

    fn is_member(&self, value: &Value, class: &str) -> Result<bool> {
        match class {
            // A non-negative integer fitting 160 bits.
            "address" => Ok(match value {
                Value::Int(i) => i.sign() != Sign::Minus && i.bits() <= 160,
                _ => false,
            }),
            // The zero address or an empty string.
            "null" => Ok(match value {
                Value::Int(i) => i.sign() == Sign::NoSign,
                Value::Str(s) => s.is_empty(),
                Value::Bool(_) => false,
            }),
            other => Err(ExecutionError::UnknownClass(other.to_string())),
        }
    }
}
