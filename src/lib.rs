//! A tree-walking interpreter for a small C-like, dynamically typed
//! scripting language with integers, booleans, strings, arrays, hash maps,
//! first-class closures, `let`/`var` bindings, `if`/`else`, `return`, and a
//! C-style `for` loop.
//!
//! Source text flows through three stages: a byte-oriented lexer, a Pratt
//! parser, and a recursive evaluator over lexically scoped environments.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - Identifiers are ASCII letters, underscores, and digits only.
//! - String literals have no escape sequences.
//! - Closures keep their defining scope alive; cyclic captures are never
//!   collected.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod interpreter;
pub mod object;

mod ast;
mod eval;
mod lexer;
mod parser;
mod token;
