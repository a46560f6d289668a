use std::fmt;

/// A complete parse: the top-level statement sequence.
///
/// The `Display` form of every node is its canonical string: operator
/// nesting is fully parenthesized so precedence is visible, e.g. `-a * b`
/// prints as `((-a) * b)`.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A brace-delimited statement sequence.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let(String, Expr),
    Var(String, Expr),
    Return(Option<Expr>),
    Expr(Expr),
    Block(BlockStmt),
    For {
        init: Option<Box<Stmt>>,
        cond: Expr,
        post: Option<Box<Stmt>>,
        body: BlockStmt,
    },
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(name, value) => write!(f, "let {} = {};", name, value),
            Stmt::Var(name, value) => write!(f, "var {} = {};", name, value),
            Stmt::Return(Some(value)) => write!(f, "return {};", value),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Expr(expr) => write!(f, "{}", expr),
            Stmt::Block(block) => write!(f, "{}", block),
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                write!(f, "for (")?;
                if let Some(init) = init {
                    write!(f, "{}", init)?;
                }
                write!(f, "; {};", cond)?;
                if let Some(post) = post {
                    write!(f, " {}", post)?;
                }
                write!(f, ") {}", body)
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOp {
    /// `!`
    Bang,
    /// `-`
    Minus,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Bang => write!(f, "!"),
            PrefixOp::Minus => write!(f, "-"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Plus => write!(f, "+"),
            InfixOp::Minus => write!(f, "-"),
            InfixOp::Asterisk => write!(f, "*"),
            InfixOp::Slash => write!(f, "/"),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Gt => write!(f, ">"),
            InfixOp::Eq => write!(f, "=="),
            InfixOp::NotEq => write!(f, "!="),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Ident(String),
    Int(i64),
    Bool(bool),
    Str(String),
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Prefix(PrefixOp, Box<Expr>),
    Infix(InfixOp, Box<Expr>, Box<Expr>),
    Assign(String, Box<Expr>),
    If {
        cond: Box<Expr>,
        consequence: BlockStmt,
        alternative: Option<BlockStmt>,
    },
    Function {
        params: Vec<String>,
        body: BlockStmt,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Index(Box<Expr>, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Int(value) => write!(f, "{}", value),
            Expr::Bool(value) => write!(f, "{}", value),
            Expr::Str(value) => write!(f, "{}", value),
            Expr::Array(elements) => {
                write!(f, "[")?;
                write_comma_separated(f, elements)?;
                write!(f, "]")
            }
            Expr::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Prefix(op, right) => write!(f, "({}{})", op, right),
            Expr::Infix(op, left, right) => write!(f, "({} {} {})", left, op, right),
            Expr::Assign(name, value) => write!(f, "({} = {})", name, value),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if{} {}", cond, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, "else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function { params, body } => write!(f, "fn({}) {}", params.join(", "), body),
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                write_comma_separated(f, args)?;
                write!(f, ")")
            }
            Expr::Index(left, index) => write!(f, "({}[{}])", left, index),
        }
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}
