//! Recursive AST evaluator.

use std::collections::HashMap;
use std::io::prelude::*;
use std::rc::Rc;

use crate::ast::{BlockStmt, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::object::{Builtin, Environment, Function, HashPair, Value};

const TRUE: Value = Value::Boolean(true);
const FALSE: Value = Value::Boolean(false);
const NULL: Value = Value::Null;

/// Walks the AST and reduces a program to a single value.
///
/// Runtime failures and `return` travel in band as [`Value::Error`] and
/// [`Value::Return`]: every node that consumes a sub-result checks for an
/// error first and propagates it unchanged, and blocks hand `Return` up
/// untouched so the enclosing call (or the program itself) can unwrap it.
#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Environment>,
}

impl<'t, W: Write> Evaluator<'t, W> {
    /// Creates an evaluator whose `puts` builtin writes to `output`.
    pub fn new(output: &'t mut W) -> Evaluator<'t, W> {
        Evaluator {
            output,
            globals: Environment::new(),
        }
    }

    /// Evaluates a whole program in the persistent global scope.
    pub fn eval_program(&mut self, program: &Program) -> Value {
        let env = self.globals.clone();
        let mut result = NULL;
        for stmt in &program.statements {
            result = self.eval_stmt(stmt, &env);
            match result {
                Value::Return(inner) => return *inner,
                Value::Error(_) => return result,
                _ => {}
            }
        }
        result
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> Value {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, env),
            Stmt::Let(name, expr) => self.eval_binding(name, expr, false, env),
            Stmt::Var(name, expr) => self.eval_binding(name, expr, true, env),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, env),
                    None => NULL,
                };
                if value.is_error() {
                    return value;
                }
                Value::Return(Box::new(value))
            }
            // Statement blocks share the current scope; only `for` and
            // function calls introduce new ones.
            Stmt::Block(block) => self.eval_block(block, env),
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => self.eval_for(init.as_deref(), cond, post.as_deref(), body, env),
        }
    }

    fn eval_binding(
        &mut self,
        name: &str,
        expr: &Expr,
        is_mutable: bool,
        env: &Rc<Environment>,
    ) -> Value {
        let value = self.eval_expr(expr, env);
        if value.is_error() {
            return value;
        }
        env.set(name, value, is_mutable);
        NULL
    }

    /// Like program evaluation, but `Return` passes through unopened so the
    /// enclosing function call sees it.
    fn eval_block(&mut self, block: &BlockStmt, env: &Rc<Environment>) -> Value {
        let mut result = NULL;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, env);
            if matches!(result, Value::Return(_) | Value::Error(_)) {
                return result;
            }
        }
        result
    }

    fn eval_for(
        &mut self,
        init: Option<&Stmt>,
        cond: &Expr,
        post: Option<&Stmt>,
        body: &BlockStmt,
        env: &Rc<Environment>,
    ) -> Value {
        // The header gets its own scope; loop variables do not leak out.
        let loop_env = Environment::enclosed(env.clone());
        if let Some(init) = init {
            let result = self.eval_stmt(init, &loop_env);
            if matches!(result, Value::Return(_) | Value::Error(_)) {
                return result;
            }
        }
        loop {
            let guard = self.eval_expr(cond, &loop_env);
            if guard.is_error() {
                return guard;
            }
            if !guard.is_truthy() {
                break;
            }
            let body_env = Environment::enclosed(loop_env.clone());
            let result = self.eval_block(body, &body_env);
            if matches!(result, Value::Return(_) | Value::Error(_)) {
                return result;
            }
            if let Some(post) = post {
                let result = self.eval_stmt(post, &loop_env);
                if matches!(result, Value::Return(_) | Value::Error(_)) {
                    return result;
                }
            }
        }
        NULL
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Value {
        match expr {
            Expr::Int(value) => Value::Integer(*value),
            Expr::Bool(value) => boolean(*value),
            Expr::Str(value) => Value::Str(Rc::new(value.clone())),
            Expr::Ident(name) => self.eval_identifier(name, env),
            Expr::Prefix(op, right) => {
                let right = self.eval_expr(right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix(*op, right)
            }
            Expr::Infix(op, left, right) => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expr(right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix(*op, left, right)
            }
            Expr::Assign(name, expr) => {
                let value = self.eval_expr(expr, env);
                if value.is_error() {
                    return value;
                }
                if env.assign(name, value.clone()) {
                    value
                } else {
                    Value::Error(format!("identifier not found: {}", name))
                }
            }
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                let guard = self.eval_expr(cond, env);
                if guard.is_error() {
                    return guard;
                }
                if guard.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    NULL
                }
            }
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.eval_expr(element, env);
                    if value.is_error() {
                        return value;
                    }
                    values.push(value);
                }
                Value::Array(Rc::new(values))
            }
            Expr::Hash(pairs) => self.eval_hash_literal(pairs, env),
            Expr::Index(left, index) => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let index = self.eval_expr(index, env);
                if index.is_error() {
                    return index;
                }
                eval_index(left, index)
            }
            Expr::Function { params, body } => Value::Function(Rc::new(Function {
                parameters: params.clone(),
                body: body.clone(),
                env: env.clone(),
            })),
            Expr::Call { func, args } => {
                let callee = self.eval_expr(func, env);
                if callee.is_error() {
                    return callee;
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let value = self.eval_expr(arg, env);
                    if value.is_error() {
                        return value;
                    }
                    values.push(value);
                }
                self.apply_function(callee, values)
            }
        }
    }

    fn eval_identifier(&mut self, name: &str, env: &Rc<Environment>) -> Value {
        if let Some(value) = env.get(name) {
            return value;
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Value::Builtin(builtin);
        }
        Value::Error(format!("identifier not found: {}", name))
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expr, Expr)], env: &Rc<Environment>) -> Value {
        let mut map = HashMap::new();
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr, env);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => {
                    return Value::Error(format!("unusable as hash key: {}", key.type_name()))
                }
            };
            let value = self.eval_expr(value_expr, env);
            if value.is_error() {
                return value;
            }
            map.insert(hash_key, HashPair { key, value });
        }
        Value::Hash(Rc::new(map))
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Function(function) => {
                if args.len() != function.parameters.len() {
                    return Value::Error(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        function.parameters.len()
                    ));
                }
                let call_env = Environment::enclosed(function.env.clone());
                for (param, arg) in function.parameters.iter().zip(args) {
                    call_env.set(param, arg, false);
                }
                match self.eval_block(&function.body, &call_env) {
                    Value::Return(inner) => *inner,
                    other => other,
                }
            }
            Value::Builtin(builtin) => self.apply_builtin(builtin, &args),
            other => Value::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn apply_builtin(&mut self, builtin: Builtin, args: &[Value]) -> Value {
        match builtin {
            Builtin::Puts => {
                for arg in args {
                    let _ = writeln!(self.output, "{}", arg);
                }
                NULL
            }
            Builtin::Len => builtin_len(args),
            Builtin::First => builtin_first(args),
            Builtin::Last => builtin_last(args),
            Builtin::Rest => builtin_rest(args),
            Builtin::Push => builtin_push(args),
        }
    }
}

fn boolean(value: bool) -> Value {
    if value {
        TRUE
    } else {
        FALSE
    }
}

fn eval_prefix(op: PrefixOp, right: Value) -> Value {
    match op {
        PrefixOp::Bang => boolean(!right.is_truthy()),
        PrefixOp::Minus => match right {
            Value::Integer(value) => Value::Integer(value.wrapping_neg()),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(op: InfixOp, left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Value::Str(l), Value::Str(r)) => match op {
            InfixOp::Plus => Value::Str(Rc::new(format!("{}{}", l, r))),
            _ => Value::Error(format!("unknown operator: STRING {} STRING", op)),
        },
        _ => match op {
            InfixOp::Eq => boolean(values_identical(&left, &right)),
            InfixOp::NotEq => boolean(!values_identical(&left, &right)),
            _ if left.type_name() != right.type_name() => Value::Error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                op,
                right.type_name()
            )),
            _ => Value::Error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                op,
                right.type_name()
            )),
        },
    }
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Value {
    match op {
        InfixOp::Plus => Value::Integer(left.wrapping_add(right)),
        InfixOp::Minus => Value::Integer(left.wrapping_sub(right)),
        InfixOp::Asterisk => Value::Integer(left.wrapping_mul(right)),
        InfixOp::Slash => {
            if right == 0 {
                Value::Error("division by zero".to_string())
            } else {
                Value::Integer(left.wrapping_div(right))
            }
        }
        InfixOp::Lt => boolean(left < right),
        InfixOp::Gt => boolean(left > right),
        InfixOp::Eq => boolean(left == right),
        InfixOp::NotEq => boolean(left != right),
    }
}

/// Identity comparison used by `==`/`!=` on non-integers.  Booleans and
/// null are singletons; heap values compare by shared reference.
fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
        (Value::Array(l), Value::Array(r)) => Rc::ptr_eq(l, r),
        (Value::Hash(l), Value::Hash(r)) => Rc::ptr_eq(l, r),
        (Value::Builtin(l), Value::Builtin(r)) => l == r,
        _ => false,
    }
}

fn eval_index(left: Value, index: Value) -> Value {
    match (&left, &index) {
        (Value::Array(elements), Value::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                NULL
            } else {
                elements[*i as usize].clone()
            }
        }
        (Value::Hash(pairs), _) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(NULL),
            None => Value::Error(format!("unusable as hash key: {}", index.type_name())),
        },
        _ => Value::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

fn check_arity(args: &[Value], want: usize) -> Option<Value> {
    if args.len() == want {
        None
    } else {
        Some(Value::Error(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        )))
    }
}

fn builtin_len(args: &[Value]) -> Value {
    if let Some(err) = check_arity(args, 1) {
        return err;
    }
    match &args[0] {
        Value::Str(value) => Value::Integer(value.len() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        other => Value::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_first(args: &[Value]) -> Value {
    if let Some(err) = check_arity(args, 1) {
        return err;
    }
    match &args[0] {
        Value::Array(elements) => elements.first().cloned().unwrap_or(NULL),
        other => Value::Error(format!(
            "argument to `first` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_last(args: &[Value]) -> Value {
    if let Some(err) = check_arity(args, 1) {
        return err;
    }
    match &args[0] {
        Value::Array(elements) => elements.last().cloned().unwrap_or(NULL),
        other => Value::Error(format!(
            "argument to `last` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_rest(args: &[Value]) -> Value {
    if let Some(err) = check_arity(args, 1) {
        return err;
    }
    match &args[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                NULL
            } else {
                Value::Array(Rc::new(elements[1..].to_vec()))
            }
        }
        other => Value::Error(format!(
            "argument to `rest` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_push(args: &[Value]) -> Value {
    if let Some(err) = check_arity(args, 2) {
        return err;
    }
    match &args[0] {
        Value::Array(elements) => {
            let mut pushed = elements.as_ref().clone();
            pushed.push(args[1].clone());
            Value::Array(Rc::new(pushed))
        }
        other => Value::Error(format!(
            "argument to `push` not supported, got {}",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(input: &str) -> Value {
        run_with_output(input).0
    }

    fn run_with_output(input: &str) -> (Value, String) {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        let value = evaluator.eval_program(&program);
        (
            value,
            String::from_utf8(out).expect("output is not valid UTF-8"),
        )
    }

    fn assert_integer(input: &str, expected: i64) {
        match run(input) {
            Value::Integer(value) => assert_eq!(value, expected, "input: {}", input),
            other => panic!("unexpected output for {:?}: {:?}", input, other),
        }
    }

    fn assert_boolean(input: &str, expected: bool) {
        match run(input) {
            Value::Boolean(value) => assert_eq!(value, expected, "input: {}", input),
            other => panic!("unexpected output for {:?}: {:?}", input, other),
        }
    }

    fn assert_null(input: &str) {
        match run(input) {
            Value::Null => {}
            other => panic!("unexpected output for {:?}: {:?}", input, other),
        }
    }

    fn assert_error(input: &str, expected: &str) {
        match run(input) {
            Value::Error(message) => assert_eq!(message, expected, "input: {}", input),
            other => panic!("unexpected output for {:?}: {:?}", input, other),
        }
    }

    fn assert_string(input: &str, expected: &str) {
        match run(input) {
            Value::Str(value) => assert_eq!(*value, expected, "input: {}", input),
            other => panic!("unexpected output for {:?}: {:?}", input, other),
        }
    }

    #[test]
    fn integer_expressions() {
        let tests = [
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5", 10),
            ("5 - 5", 0),
            ("5 * 5", 25),
            ("5 / 5", 1),
            ("5 + 5 * 5", 30),
            ("5 / 5 * 5", 5),
            ("5 - 5 * 5", -20),
            ("-7 / 2", -3),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
    }

    #[test]
    fn boolean_expressions() {
        let tests = [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 == 1", true),
            ("1 == 2", false),
            ("1 != 1", false),
            ("1 != 2", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 < 2) == false", false),
        ];
        for (input, expected) in tests.iter() {
            assert_boolean(input, *expected);
        }
    }

    #[test]
    fn bang_operator() {
        let tests = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!!false", false),
            ("!!true", true),
            ("!!5", true),
        ];
        for (input, expected) in tests.iter() {
            assert_boolean(input, *expected);
        }
    }

    #[test]
    fn mixed_equality_is_false_not_an_error() {
        assert_boolean("5 == true", false);
        assert_boolean("5 != true", true);
        assert_boolean("[1] == 1", false);
    }

    #[test]
    fn if_else_expressions() {
        assert_integer("if (true) {10}", 10);
        assert_null("if (false) {10}");
        assert_integer("if (1) {10}", 10);
        assert_integer("if (0) {10}", 10); // zero is truthy
        assert_integer("if (1 < 2) {10}", 10);
        assert_null("if (1 > 2) {10}");
        assert_integer("if (1 < 2) {10} else {20}", 10);
        assert_integer("if (1 > 2) {10} else {20}", 20);
    }

    #[test]
    fn return_statements() {
        let tests = [
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
    }

    #[test]
    fn inner_return_escapes_outer_block() {
        let input = "
            if (10 > 1) {
                if (10 > 1) {
                    return 10;
                }
                return 1;
            }";
        assert_integer(input, 10);
    }

    #[test]
    fn bare_return_yields_null() {
        assert_null("return;");
    }

    #[test]
    fn error_handling() {
        let tests = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
            (
                r#"{"name": "Monkey"}[fn(x) { x }];"#,
                "unusable as hash key: FUNCTION",
            ),
            ("5[0]", "index operator not supported: INTEGER"),
            ("[1, 2, 3][true]", "index operator not supported: ARRAY"),
            ("true(1)", "not a function: BOOLEAN"),
            ("5 / 0", "division by zero"),
        ];
        for (input, expected) in tests.iter() {
            assert_error(input, expected);
        }
    }

    #[test]
    fn errors_short_circuit_the_rest_of_the_block() {
        // Code after the failure point never runs.
        let (value, output) = run_with_output(r#"puts("before"); 1 + true; puts("after");"#);
        assert_eq!(
            value,
            Value::Error("type mismatch: INTEGER + BOOLEAN".to_string())
        );
        assert_eq!(output, "before\n");
    }

    #[test]
    fn let_statements() {
        let tests = [
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
    }

    #[test]
    fn let_statement_yields_null() {
        assert_null("let a = 5;");
    }

    #[test]
    fn rebinding_shadows_in_the_same_scope() {
        assert_integer("let a = 5; let a = a + 1; a;", 6);
    }

    #[test]
    fn var_statements() {
        assert_integer("var a = 5; a;", 5);
        assert_integer("var a = 5; a = a + 1; a;", 6);
    }

    #[test]
    fn assign_expressions() {
        let tests = [
            ("let x = 5; x = x + 1; x;", 6),
            ("let x = 5; x = x + 1; x = x + 1; x;", 7),
            ("let x = 5; let y = x = 7; y;", 7),
            ("let x = 1; let y = 2; let z = x = y = 3; z;", 3),
            ("let x = 1; let y = 2; let z = x = y = 3; x;", 3),
            ("let x = 1; let y = 2; let z = x = y = 3; y;", 3),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
        assert_string(r#"let x = "hoge"; x = x + "fuga";"#, "hogefuga");
    }

    #[test]
    fn assign_to_unbound_name_is_an_error() {
        assert_error("x = 5;", "identifier not found: x");
    }

    #[test]
    fn assign_updates_enclosing_scopes() {
        let input = "
            var n = 0;
            let bump = fn() { n = n + 1; };
            bump();
            bump();
            n;";
        assert_integer(input, 2);
    }

    #[test]
    fn function_object_display() {
        match run("fn(x) { x + 2; };") {
            Value::Function(function) => {
                assert_eq!(function.parameters, vec!["x".to_string()]);
                assert_eq!(function.body.to_string(), "(x + 2)");
            }
            other => panic!("unexpected output: {:?}", other),
        }
        assert_eq!(run("fn(x) { x + 2; };").to_string(), "fn(x) { (x + 2) }");
    }

    #[test]
    fn function_application() {
        let tests = [
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { return x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { return x + y; }; add(5, 5);", 10),
            (
                "let add = fn(x, y) { return x + y; }; add(5 + 5, add(5, 5));",
                20,
            ),
            ("fn(x) { x; }(5)", 5),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
    }

    #[test]
    fn implicit_return_value_is_the_last_expression() {
        assert_integer("let f = fn() { 1; 2; 3 }; f();", 3);
    }

    #[test]
    fn function_without_tail_expression_returns_null() {
        assert_null("let f = fn() { let a = 1; }; f();");
    }

    #[test]
    fn wrong_number_of_call_arguments_is_an_error() {
        assert_error(
            "let add = fn(x, y) { x + y; }; add(1);",
            "wrong number of arguments. got=1, want=2",
        );
        assert_error(
            "fn() { 1; }(2)",
            "wrong number of arguments. got=1, want=0",
        );
    }

    #[test]
    fn closures() {
        let input = "
            let newAdder = fn(x) {
                fn(y) { x + y };
            };
            let addTwo = newAdder(2);
            addTwo(2);";
        assert_integer(input, 4);
    }

    #[test]
    fn closures_capture_the_defining_scope() {
        let input = "
            let counter = fn() {
                var n = 0;
                fn() { n = n + 1; n }
            }();
            counter();
            counter();
            counter();";
        assert_integer(input, 3);
    }

    #[test]
    fn string_literal() {
        assert_string(r#""Hello World!""#, "Hello World!");
    }

    #[test]
    fn string_concatenation() {
        assert_string(r#""Hello" + " " + "World!""#, "Hello World!");
    }

    #[test]
    fn string_comparison_is_not_supported() {
        assert_error(r#""a" == "a""#, "unknown operator: STRING == STRING");
    }

    #[test]
    fn builtin_len_function() {
        let tests: [(&str, i64); 5] = [
            (r#"len("")"#, 0),
            (r#"len("four")"#, 4),
            (r#"len("hello world")"#, 11),
            ("len([1, 2, 3])", 3),
            ("len([])", 0),
        ];
        for (input, expected) in tests.iter() {
            assert_integer(input, *expected);
        }
        assert_error("len(1)", "argument to `len` not supported, got INTEGER");
        assert_error(
            r#"len("one", "two")"#,
            "wrong number of arguments. got=2, want=1",
        );
    }

    #[test]
    fn builtin_array_functions() {
        assert_integer("first([1, 2, 3])", 1);
        assert_null("first([])");
        assert_integer("last([1, 2, 3])", 3);
        assert_null("last([])");
        assert_eq!(
            run("rest([1, 2, 3])"),
            Value::Array(Rc::new(vec![Value::Integer(2), Value::Integer(3)]))
        );
        assert_null("rest([])");
        assert_eq!(
            run("push([1], 2)"),
            Value::Array(Rc::new(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_error(
            "first(1)",
            "argument to `first` not supported, got INTEGER",
        );
        assert_error("push(1, 1)", "argument to `push` not supported, got INTEGER");
        assert_error("push([1])", "wrong number of arguments. got=1, want=2");
    }

    #[test]
    fn push_does_not_mutate_its_argument() {
        assert_integer("let a = [1]; push(a, 2); len(a);", 1);
    }

    #[test]
    fn builtins_can_be_shadowed() {
        assert_integer("let len = 5; len;", 5);
    }

    #[test]
    fn puts_prints_canonical_forms_one_per_line() {
        let (value, output) = run_with_output(r#"puts("hello", 1 + 2, true, [1, "x"])"#);
        assert_eq!(value, NULL);
        assert_eq!(output, "hello\n3\ntrue\n[1, x]\n");
    }

    #[test]
    fn array_literals() {
        assert_eq!(
            run("[1, 2 * 2, 3 + 3]"),
            Value::Array(Rc::new(vec![
                Value::Integer(1),
                Value::Integer(4),
                Value::Integer(6),
            ]))
        );
    }

    #[test]
    fn array_index_expressions() {
        let tests = [
            ("[1, 2, 3][0]", Some(1)),
            ("[1, 2, 3][1]", Some(2)),
            ("[1, 2, 3][2]", Some(3)),
            ("[1, 2, 3][3]", None),
            ("[1, 2, 3][-1]", None),
            ("[1, 2, 3][1 + 1]", Some(3)),
            ("let i = 0; [1][i];", Some(1)),
            ("let a = [1, 2, 3]; a[2];", Some(3)),
        ];
        for (input, expected) in tests.iter() {
            match expected {
                Some(value) => assert_integer(input, *value),
                None => assert_null(input),
            }
        }
    }

    #[test]
    fn hash_literals() {
        let input = r#"
            let two = "two";
            {
                "one": 10 - 9,
                two: 1 + 1,
                "thr" + "ee": 6 / 2,
                4: 4,
                true: 5,
                false: 6,
            }"#;
        let pairs = match run(input) {
            Value::Hash(pairs) => pairs,
            other => panic!("unexpected output: {:?}", other),
        };
        let expected: [(Value, i64); 6] = [
            (Value::Str(Rc::new("one".to_string())), 1),
            (Value::Str(Rc::new("two".to_string())), 2),
            (Value::Str(Rc::new("three".to_string())), 3),
            (Value::Integer(4), 4),
            (Value::Boolean(true), 5),
            (Value::Boolean(false), 6),
        ];
        assert_eq!(pairs.len(), expected.len());
        for (key, value) in expected.iter() {
            let hash_key = key.hash_key().expect("key is not hashable");
            let pair = pairs.get(&hash_key).expect("missing pair");
            assert_eq!(pair.value, Value::Integer(*value));
        }
    }

    #[test]
    fn hash_index_expressions() {
        let tests = [
            (r#"{"foo": 5}["foo"]"#, Some(5)),
            (r#"{"foo": 5}["bar"]"#, None),
            (r#"let key = "foo"; {"foo": 5}[key]"#, Some(5)),
            (r#"{}["foo"]"#, None),
            ("{5: 5}[5]", Some(5)),
            ("{true: 5}[true]", Some(5)),
            ("{false: 5}[false]", Some(5)),
        ];
        for (input, expected) in tests.iter() {
            match expected {
                Some(value) => assert_integer(input, *value),
                None => assert_null(input),
            }
        }
    }

    #[test]
    fn for_loop_sums() {
        let input = "
            var sum = 0;
            for (var i = 0; i < 5; i = i + 1) {
                sum = sum + i;
            }
            sum;";
        assert_integer(input, 10);
    }

    #[test]
    fn for_loop_yields_null() {
        assert_null("for (var i = 0; i < 1; i = i + 1) { i; }");
    }

    #[test]
    fn for_loop_variable_does_not_leak() {
        assert_error(
            "for (var i = 0; i < 1; i = i + 1) { } i;",
            "identifier not found: i",
        );
    }

    #[test]
    fn for_loop_with_empty_init_and_post() {
        let input = "
            var i = 0;
            for (; i < 3;) {
                i = i + 1;
            }
            i;";
        assert_integer(input, 3);
    }

    #[test]
    fn for_loop_body_scope_is_fresh_each_iteration() {
        let input = "
            var sum = 0;
            for (var i = 0; i < 3; i = i + 1) {
                let x = i * 10;
                sum = sum + x;
            }
            sum;";
        assert_integer(input, 30);
    }

    #[test]
    fn return_escapes_a_for_loop() {
        let input = "
            let find = fn(limit) {
                for (var i = 0; i < limit; i = i + 1) {
                    if (i == 3) {
                        return i;
                    }
                }
                return -1;
            };
            find(10);";
        assert_integer(input, 3);
    }

    #[test]
    fn error_in_for_condition_propagates() {
        assert_error(
            "for (var i = 0; i + true; i = i + 1) { }",
            "type mismatch: INTEGER + BOOLEAN",
        );
    }

    #[test]
    fn error_in_for_body_propagates() {
        assert_error(
            "for (var i = 0; i < 5; i = i + 1) { -true; }",
            "unknown operator: -BOOLEAN",
        );
    }

    #[test]
    fn nested_for_loops() {
        let input = "
            var total = 0;
            for (var i = 0; i < 3; i = i + 1) {
                for (var j = 0; j < 3; j = j + 1) {
                    total = total + 1;
                }
            }
            total;";
        assert_integer(input, 9);
    }
}
