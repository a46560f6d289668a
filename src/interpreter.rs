//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::io::prelude::*;

use crate::eval::Evaluator;
use crate::lexer::Lexer;
use crate::object::Value;
use crate::parser::Parser;

/// Tree-walk interpreter with a persistent global scope.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional
/// times to call this function:
///
/// ```
/// # use monkey::interpreter::Interpreter;
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = r#"
///     let max = fn(x, y) {
///         if (x > y) {
///             return x;
///         } else {
///             return y;
///         }
///     };
/// "#;
/// interp.eval(func_def).expect("interpreter error");
///
/// assert_eq!(interp.eval("max(10, 20)").unwrap().to_string(), "20");
/// assert_eq!(interp.eval("max(5, 4)").unwrap().to_string(), "5");
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    evaluator: Evaluator<'t, W>,
}

impl<'t, W: Write> Interpreter<'t, W> {
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter {
            evaluator: Evaluator::new(output),
        }
    }

    /// Tokenizes, parses, and evaluates `source` against the persistent
    /// global scope.
    ///
    /// Syntax errors abort before evaluation and come back as
    /// [`ParseFailure`].  Runtime failures are in-band: the returned value
    /// is a [`Value::Error`] whose canonical form is `ERROR: <message>`.
    pub fn eval(&mut self, source: &str) -> Result<Value, ParseFailure> {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(ParseFailure {
                errors: parser.errors().to_vec(),
            });
        }
        Ok(self.evaluator.eval_program(&program))
    }
}

/// One or more syntax errors collected during parsing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseFailure {
    errors: Vec<String>,
}

impl ParseFailure {
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parser errors:")?;
        for error in &self.errors {
            write!(f, "\n\t{}", error)?;
        }
        Ok(())
    }
}

impl Error for ParseFailure {}
