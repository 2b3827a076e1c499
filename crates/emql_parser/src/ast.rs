use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::errors::{ParseError, Result};

/// Returns true if the string is a valid EMQL identifier:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Binary arithmetic operator over integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOperator {
    /// '+'
    Add,
    /// '-'
    Sub,
    /// '*'
    Mul,
    /// '/'
    Div,
    /// '%'
    Mod,
}

impl ArithOperator {
    pub fn try_from_symbol(s: &str) -> Result<Self> {
        Ok(match s {
            "+" => ArithOperator::Add,
            "-" => ArithOperator::Sub,
            "*" => ArithOperator::Mul,
            "/" => ArithOperator::Div,
            "%" => ArithOperator::Mod,
            other => return Err(ParseError::unexpected("arithmetic operator", other)),
        })
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            ArithOperator::Add => "+",
            ArithOperator::Sub => "-",
            ArithOperator::Mul => "*",
            ArithOperator::Div => "/",
            ArithOperator::Mod => "%",
        }
    }
}

impl fmt::Display for ArithOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// Binary comparison operator over integers, producing a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    /// '>'
    Gt,
    /// '>='
    GtEq,
    /// '<'
    Lt,
    /// '<='
    LtEq,
    /// '='
    Eq,
    /// '<>'
    Neq,
}

impl CompareOperator {
    pub fn try_from_symbol(s: &str) -> Result<Self> {
        Ok(match s {
            ">" => CompareOperator::Gt,
            ">=" => CompareOperator::GtEq,
            "<" => CompareOperator::Lt,
            "<=" => CompareOperator::LtEq,
            "=" => CompareOperator::Eq,
            "<>" => CompareOperator::Neq,
            other => return Err(ParseError::unexpected("comparison operator", other)),
        })
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            CompareOperator::Gt => ">",
            CompareOperator::GtEq => ">=",
            CompareOperator::Lt => "<",
            CompareOperator::LtEq => "<=",
            CompareOperator::Eq => "=",
            CompareOperator::Neq => "<>",
        }
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// Binary boolean operator over predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn try_from_symbol(s: &str) -> Result<Self> {
        Ok(match s {
            "and" => LogicalOperator::And,
            "or" => LogicalOperator::Or,
            other => return Err(ParseError::unexpected("boolean operator", other)),
        })
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// Unary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Plus, e.g. `+9`
    Plus,
    /// Minus, e.g. `-9`
    Minus,
}

impl UnaryOperator {
    pub fn try_from_symbol(s: &str) -> Result<Self> {
        Ok(match s {
            "+" => UnaryOperator::Plus,
            "-" => UnaryOperator::Minus,
            other => return Err(ParseError::unexpected("unary operator", other)),
        })
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// A literal value appearing in a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    /// Arbitrary-precision integer literal, decimal or hex.
    Int(BigInt),
    /// String literal, unescaped.
    Str(String),
    /// Boolean literal.
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Str(s) => write!(f, "\"{s}\""),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A dotted attribute path such as `msg.value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub parts: Vec<String>,
}

impl Attribute {
    /// Create an attribute, validating that there is at least one part and
    /// that every part is a valid identifier.
    pub fn try_new<I, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(ParseError::InvalidIdentifier(String::new()));
        }
        for part in &parts {
            if !is_valid_identifier(part) {
                return Err(ParseError::InvalidIdentifier(part.clone()));
            }
        }
        Ok(Attribute { parts })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

/// A call to a builtin function.
///
/// The name is stored lower-cased, making equality case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        FunctionCall {
            name: name.into().to_ascii_lowercase(),
            args,
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, ")")
    }
}

/// An expression node. Evaluates to a value of any type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Attribute(Attribute),
    Function(FunctionCall),
    /// Unary expression, e.g. `-msg.value`.
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    /// Binary arithmetic expression, e.g. `a + b`.
    Binary {
        left: Box<Expr>,
        op: ArithOperator,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: impl Into<BigInt>) -> Expr {
        Expr::Literal(Literal::Int(value.into()))
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Str(value.into()))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal(Literal::Bool(value))
    }

    /// Create an attribute expression, validating the parts.
    pub fn attribute<I, S>(parts: I) -> Result<Expr>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Expr::Attribute(Attribute::try_new(parts)?))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Function(FunctionCall::new(name, args))
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Expr {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn binary(left: Expr, op: ArithOperator, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Attribute(attr) => write!(f, "{attr}"),
            Expr::Function(call) => write!(f, "{call}"),
            Expr::Unary { op, expr } => write!(f, "({op} {expr})"),
            Expr::Binary { left, op, right } => write!(f, "({op} {left} {right})"),
        }
    }
}

/// A predicate node. Evaluates to a boolean.
///
/// Comparison predicates sit over expression children, logical predicates
/// over predicate children; the split makes ill-typed trees
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    Literal(bool),
    /// Integer comparison, e.g. `msg.value > 10`.
    Compare {
        left: Expr,
        op: CompareOperator,
        right: Expr,
    },
    /// `and`/`or` over two predicates.
    Logical {
        left: Box<Predicate>,
        op: LogicalOperator,
        right: Box<Predicate>,
    },
    /// `not` over a predicate.
    Not(Box<Predicate>),
    /// Set membership, e.g. `msg.sender in (0x123, 0x432)`. The list is
    /// never empty.
    In {
        needle: Expr,
        haystack: Vec<Expr>,
    },
    /// Class membership, e.g. `msg.sender is address`. The meaning of the
    /// class is up to the environment.
    Is {
        expr: Expr,
        class: String,
    },
}

impl Predicate {
    pub fn compare(left: Expr, op: CompareOperator, right: Expr) -> Predicate {
        Predicate::Compare { left, op, right }
    }

    pub fn logical(left: Predicate, op: LogicalOperator, right: Predicate) -> Predicate {
        Predicate::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn negate(pred: Predicate) -> Predicate {
        Predicate::Not(Box::new(pred))
    }

    /// Create a set-membership predicate. An empty haystack is an error.
    pub fn in_list(needle: Expr, haystack: Vec<Expr>) -> Result<Predicate> {
        if haystack.is_empty() {
            return Err(ParseError::EmptyExpressionList);
        }
        Ok(Predicate::In { needle, haystack })
    }

    /// Create a class-membership predicate. The class name is normalized to
    /// lower case.
    pub fn is(expr: Expr, class: impl Into<String>) -> Predicate {
        Predicate::Is {
            expr,
            class: class.into().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(b) => write!(f, "{b}"),
            Predicate::Compare { left, op, right } => write!(f, "({op} {left} {right})"),
            Predicate::Logical { left, op, right } => write!(f, "({op} {left} {right})"),
            Predicate::Not(pred) => write!(f, "(not {pred})"),
            Predicate::In { needle, haystack } => {
                write!(f, "(in {needle}")?;
                for elem in haystack {
                    write!(f, " {elem}")?;
                }
                write!(f, ")")
            }
            Predicate::Is { expr, class } => write!(f, "(is {class} {expr})"),
        }
    }
}
