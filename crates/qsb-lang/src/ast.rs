//! Abstract Syntax Tree for Q# programs.

use serde::{Deserialize, Serialize};

/// A complete Q# program: the callables of every namespace, flattened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Callable declarations in source order.
    pub callables: Vec<CallableDecl>,
    /// Namespaces opened or imported (kept for diagnostics only).
    pub opens: Vec<String>,
}

/// Whether a callable may touch qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallableKind {
    /// `operation`: may apply quantum instructions.
    Operation,
    /// `function`: purely classical.
    Function,
}

/// How the adjoint specialization of a user callable is provided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdjointSpec {
    /// Generated by inverting the body (`adjoint auto`, `adjoint invert` or `is Adj`).
    Auto,
    /// The body is its own adjoint (`adjoint self`).
    SelfAdjoint,
    /// An explicit `adjoint (...) { ... }` block.
    Explicit(Block),
}

/// An `operation` or `function` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableDecl {
    /// Simple name.
    pub name: String,
    /// Enclosing namespace, if any.
    pub namespace: Option<String>,
    /// Operation or function.
    pub kind: CallableKind,
    /// Attribute names, e.g. `EntryPoint`.
    pub attributes: Vec<String>,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Declared return type.
    pub return_type: TypeExpr,
    /// Functor support declared with `is Adj + Ctl`.
    pub characteristics: Vec<String>,
    /// Adjoint specialization, if declared explicitly or via `is Adj`.
    pub adjoint: Option<AdjointSpec>,
    /// The body.
    pub body: Block,
}

impl CallableDecl {
    /// Whether the callable carries the given attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

/// A callable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub ty: TypeExpr,
}

/// A type as written in source. Kept for diagnostics, not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A named type such as `Int` or `Qubit`.
    Named(String),
    /// An array type `T[]`.
    Array(Box<TypeExpr>),
    /// A tuple type `(T, U)`; the empty tuple is `Unit`.
    Tuple(Vec<TypeExpr>),
    /// A callable type `(T => U)` or `(T -> U)`.
    Callable(Box<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    /// The unit type.
    pub fn unit() -> Self {
        TypeExpr::Named("Unit".into())
    }
}

/// A brace-delimited block with an optional value-producing tail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Statements.
    pub stmts: Vec<Stmt>,
    /// Trailing expression without a semicolon.
    pub tail: Option<Box<Expr>>,
}

/// A binding pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// A name.
    Bind(String),
    /// `_`.
    Discard,
    /// `(a, b, ...)`.
    Tuple(Vec<Pattern>),
}

/// Qubit initializer in `use` and `borrow` statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QubitInit {
    /// `Qubit()`.
    Single,
    /// `Qubit[n]`.
    Array(Box<Expr>),
    /// `(Qubit(), Qubit[n], ...)`.
    Tuple(Vec<QubitInit>),
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `let p = e;`
    Let { pattern: Pattern, value: Expr },
    /// `mutable p = e;`
    Mutable { pattern: Pattern, value: Expr },
    /// `set x = e;` or `set x op= e;`
    Set {
        target: String,
        op: Option<BinOp>,
        value: Expr,
    },
    /// `set arr w/= i <- e;`
    SetUpdate {
        target: String,
        index: Expr,
        value: Expr,
    },
    /// `use p = init;`, `borrow p = init;`, optionally scoped to a block.
    Use {
        pattern: Pattern,
        init: QubitInit,
        body: Option<Block>,
    },
    /// `for p in e { ... }`
    For {
        pattern: Pattern,
        iterable: Expr,
        body: Block,
    },
    /// `while c { ... }`
    While { condition: Expr, body: Block },
    /// `repeat { ... } until c fixup { ... }`
    Repeat {
        body: Block,
        until: Expr,
        fixup: Option<Block>,
    },
    /// `within { ... } apply { ... }`
    Within { within: Block, apply: Block },
    /// `return e;`
    Return(Expr),
    /// `fail e;`
    Fail(Expr),
    /// Expression statement.
    Expr(Expr),
    /// Local callable declaration.
    Callable(Box<CallableDecl>),
}

/// Functor applied to a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Functor {
    /// `Adjoint`.
    Adjoint,
    /// `Controlled`.
    Controlled,
}

/// Pauli literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

/// A piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpPart {
    /// Literal text.
    Text(String),
    /// `{expr}`.
    Expr(Expr),
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `()`.
    Unit,
    /// Integer literal.
    Int(i64),
    /// Double literal.
    Double(f64),
    /// Boolean literal.
    Bool(bool),
    /// String literal.
    String(String),
    /// Interpolated string `$"..."`.
    Interpolated(Vec<InterpPart>),
    /// `Zero` (false) or `One` (true).
    Result(bool),
    /// Pauli literal.
    Pauli(Pauli),
    /// A possibly qualified name; segments joined with `.`.
    Path(String),
    /// Tuple `(a, b)`.
    Tuple(Vec<Expr>),
    /// Array literal `[a, b]`.
    Array(Vec<Expr>),
    /// Sized array `[value, size = n]`.
    ArrayRepeat { value: Box<Expr>, size: Box<Expr> },
    /// Range `start..step..end`; open ends are `None`.
    Range {
        start: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    /// `target[index]`.
    Index { target: Box<Expr>, index: Box<Expr> },
    /// Copy-and-update `target w/ index <- value`.
    Update {
        target: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    /// Call `callee(args)`.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Functor application `Adjoint f`.
    Functor { functor: Functor, target: Box<Expr> },
    /// Unary operator.
    Unary { op: UnOp, operand: Box<Expr> },
    /// Binary operator.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Conditional `c ? a | b`.
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `if` / `elif` / `else` chain.
    If {
        branches: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    /// A block used as an expression.
    Block(Block),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// `-`.
    Neg,
    /// `not` or `!`.
    Not,
    /// `~~~`.
    BitNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::BitAnd => "&&&",
            BinOp::BitOr => "|||",
            BinOp::BitXor => "^^^",
            BinOp::Shl => "<<<",
            BinOp::Shr => ">>>",
        };
        write!(f, "{s}")
    }
}
