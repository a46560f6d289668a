//! Runtime values and environments.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::BlockStmt;

/// A runtime value.
///
/// Heap payloads sit behind `Rc` so clones are cheap and `==`/`!=` can
/// compare non-integers by identity.  `Return` and `Error` are internal
/// control-flow markers: `Return` never escapes the evaluator, and `Error`
/// escapes only as the whole-program result.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(Rc<String>),
    Array(Rc<Vec<Value>>),
    Hash(Rc<HashMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    Builtin(Builtin),
    Return(Box<Value>),
    Error(String),
}

impl Value {
    /// Type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
        }
    }

    /// Only `false` and `null` are falsy; everything else, including `0`,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Derive the hash key for this value, or `None` for kinds that cannot
    /// be used as hash keys.
    pub fn hash_key(&self) -> Option<HashKey> {
        let digest = match self {
            Value::Integer(value) => *value as u64,
            Value::Boolean(true) => 1,
            Value::Boolean(false) => 0,
            Value::Str(value) => fnv1a(value.as_bytes()),
            _ => return None,
        };
        Some(HashKey {
            kind: self.type_name(),
            digest,
        })
    }
}

/// Equality used by the test suites and by hash pair comparison.  Functions
/// compare by identity; comparing the environments they capture would
/// recurse through closure cycles.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::Array(l), Value::Array(r)) => l == r,
            (Value::Hash(l), Value::Hash(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::Builtin(l), Value::Builtin(r)) => l == r,
            (Value::Return(l), Value::Return(r)) => l == r,
            (Value::Error(l), Value::Error(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Null => write!(f, "null"),
            Value::Str(value) => write!(f, "{}", value),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => write!(
                f,
                "fn({}) {{ {} }}",
                function.parameters.join(", "),
                function.body
            ),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::Return(inner) => write!(f, "{}", inner),
            Value::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

/// Key derived from a hashable value: the value's type tag plus a 64-bit
/// digest, so distinct types with equal byte patterns stay distinct.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct HashKey {
    kind: &'static str,
    digest: u64,
}

/// Stored hash entry.  The original key value is kept for reprinting.
#[derive(Debug, PartialEq, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut digest = FNV_OFFSET_BASIS;
    for byte in bytes {
        digest ^= u64::from(*byte);
        digest = digest.wrapping_mul(FNV_PRIME);
    }
    digest
}

/// A user-defined function together with the environment it closed over.
pub struct Function {
    pub(crate) parameters: Vec<String>,
    pub(crate) body: BlockStmt,
    pub(crate) env: Rc<Environment>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// A native function.  Application lives in the evaluator, which owns the
/// output handle `puts` writes to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
    Len,
    First,
    Last,
    Rest,
    Push,
    Puts,
}

impl Builtin {
    /// The fixed builtin table, consulted after environment lookup fails so
    /// user bindings may shadow these names.
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "len" => Some(Builtin::Len),
            "first" => Some(Builtin::First),
            "last" => Some(Builtin::Last),
            "rest" => Some(Builtin::Rest),
            "push" => Some(Builtin::Push),
            "puts" => Some(Builtin::Puts),
            _ => None,
        }
    }
}

/// Record stored for one bound name.
#[derive(Debug, PartialEq, Clone)]
pub struct Binding {
    pub value: Value,
    pub is_mutable: bool,
}

/// Nested name-to-value mapping.
///
/// Lookup walks the outer chain; definition always writes to the innermost
/// scope.  Environments are shared (`Rc`) because every closure keeps its
/// defining scope alive.
pub struct Environment {
    bindings: RefCell<HashMap<String, Binding>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    pub fn enclosed(outer: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    /// Resolve `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Bind `name` in this scope, shadowing any earlier binding of the same
    /// name here or in an enclosing scope.
    pub fn set(&self, name: &str, value: Value, is_mutable: bool) {
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { value, is_mutable });
    }

    /// Update `name` in place in the scope that owns it.  Returns `false`
    /// when the name is bound nowhere on the chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            binding.value = value;
            return true;
        }
        match &self.outer {
            Some(outer) => outer.assign(name, value),
            None => false,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.bindings.borrow().keys().collect::<Vec<_>>())
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_with_same_content_share_a_hash_key() {
        let a = Value::Str(Rc::new("Hello World".to_string()));
        let b = Value::Str(Rc::new("Hello World".to_string()));
        assert_eq!(a.hash_key(), b.hash_key());
    }

    #[test]
    fn strings_with_different_content_have_different_hash_keys() {
        let a = Value::Str(Rc::new("Hello World".to_string()));
        let b = Value::Str(Rc::new("My name is johnny".to_string()));
        assert_ne!(a.hash_key(), b.hash_key());
    }

    #[test]
    fn hash_keys_carry_the_type_tag() {
        // Integer 1 and boolean true share the digest but not the kind.
        assert_ne!(
            Value::Integer(1).hash_key(),
            Value::Boolean(true).hash_key()
        );
    }

    #[test]
    fn unhashable_kinds_have_no_hash_key() {
        assert_eq!(Value::Null.hash_key(), None);
        assert_eq!(Value::Array(Rc::new(vec![])).hash_key(), None);
    }

    #[test]
    fn truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Str(Rc::new(String::new())).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Integer(-5).to_string(), "-5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::Str(Rc::new("no quotes".to_string())).to_string(),
            "no quotes"
        );
        assert_eq!(
            Value::Array(Rc::new(vec![Value::Integer(1), Value::Integer(2)])).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Error("boom".to_string()).to_string(), "ERROR: boom");
    }

    #[test]
    fn define_and_resolve() {
        let env = Environment::new();
        env.set("foo", Value::Integer(42), false);
        assert_eq!(env.get("foo"), Some(Value::Integer(42)));
        assert_eq!(env.get("bar"), None);
    }

    #[test]
    fn lookup_walks_outward() {
        let outer = Environment::new();
        outer.set("foo", Value::Integer(42), false);
        let inner = Environment::enclosed(outer);
        assert_eq!(inner.get("foo"), Some(Value::Integer(42)));
    }

    #[test]
    fn set_shadows_in_the_innermost_scope() {
        let outer = Environment::new();
        outer.set("foo", Value::Integer(42), false);
        let inner = Environment::enclosed(outer.clone());
        inner.set("foo", Value::Integer(24), false);
        assert_eq!(inner.get("foo"), Some(Value::Integer(24)));
        assert_eq!(outer.get("foo"), Some(Value::Integer(42)));
    }

    #[test]
    fn assign_updates_the_owning_scope() {
        let outer = Environment::new();
        outer.set("foo", Value::Integer(42), true);
        let inner = Environment::enclosed(outer.clone());
        assert!(inner.assign("foo", Value::Integer(24)));
        assert_eq!(outer.get("foo"), Some(Value::Integer(24)));
        assert!(inner.bindings.borrow().is_empty());
    }

    #[test]
    fn assign_to_unbound_name_reports_failure() {
        let env = Environment::new();
        assert!(!env.assign("foo", Value::Integer(1)));
    }
}
