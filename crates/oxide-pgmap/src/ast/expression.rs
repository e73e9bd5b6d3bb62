//! Expression AST types.

use super::Query;
use crate::schema::EntityDescriptor;
use crate::value::{SqlArray, SqlValue};

/// A reference to an entity's table, optionally aliased.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub entity: &'static EntityDescriptor,
    pub alias: Option<String>,
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.entity.type_name == other.entity.type_name && self.alias == other.alias
    }
}

/// A reference to one property of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: TableRef,
    /// Rust property name; the column name is resolved at generation time.
    pub property: &'static str,
}

/// Numeric operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    Pow,
}

impl ArithmeticOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
        }
    }
}

/// Interval arithmetic on timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    PlusInterval,
    MinusInterval,
}

impl DateOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlusInterval => "+",
            Self::MinusInterval => "-",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Array containment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    Contains,
    ContainedBy,
    Overlaps,
}

impl ArrayOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "@>",
            Self::ContainedBy => "<@",
            Self::Overlaps => "&&",
        }
    }
}

/// JSONB field access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOp {
    Get,
    GetAsText,
}

impl JsonOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "->",
            Self::GetAsText => "->>",
        }
    }
}

/// Pattern matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOp {
    Like,
    ILike,
    /// POSIX regular expression match.
    Similar,
}

impl PatternOp {
    #[must_use]
    pub const fn as_str(&self, negated: bool) -> &'static str {
        match (self, negated) {
            (Self::Like, false) => "LIKE",
            (Self::Like, true) => "NOT LIKE",
            (Self::ILike, false) => "ILIKE",
            (Self::ILike, true) => "NOT ILIKE",
            (Self::Similar, false) => "~",
            (Self::Similar, true) => "!~",
        }
    }
}

/// Right-hand side of `IS` / `IS NOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsValue {
    Null,
    True,
    False,
}

impl IsValue {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
        }
    }
}

/// One `WHEN condition THEN result` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenThen {
    pub condition: Expr,
    pub result: Expr,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"t".*`, or `*` without a table.
    All(Option<TableRef>),
    Column(ColumnRef),
    /// `DISTINCT "column"`, used inside aggregates.
    Distinct(ColumnRef),
    /// A bound value.
    Value(SqlValue),
    /// A bound array carrying its element type.
    Array(SqlArray),
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    DateArithmetic {
        op: DateOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    ArrayComparison {
        op: ArrayOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    JsonAccess {
        op: JsonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Interval multiplied by an integer.
    ScaleInterval {
        interval: Box<Expr>,
        scale: Box<Expr>,
    },
    /// Comparison against the empty array literal.
    Empty {
        expr: Box<Expr>,
        negated: bool,
    },
    Is {
        expr: Box<Expr>,
        value: IsValue,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        candidates: Vec<Expr>,
        negated: bool,
    },
    Pattern {
        op: PatternOp,
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    /// A function call; arity is fixed by the builder that produced it.
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// A typed literal such as `interval '5 minutes'`; never bound.
    Constructor {
        type_name: String,
        value: String,
    },
    Cast {
        expr: Box<Expr>,
        type_name: String,
    },
    Exists {
        query: Box<Query>,
        alias: Option<String>,
        negated: bool,
    },
    AtTimeZone {
        time: Box<Expr>,
        zone: Box<Expr>,
    },
    ConcatJsonb {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BuildJsonb(Vec<(String, Expr)>),
    Case {
        branches: Vec<WhenThen>,
        fallback: Option<Box<Expr>>,
    },
    /// A quoted identifier naming an alias.
    AliasLiteral(String),
    /// A quoted identifier naming a table.
    TableLiteral(TableRef),
    /// Presents a nullable expression as non-nullable. Renders the child.
    NotNull(Box<Expr>),
    /// Presents a non-nullable expression as nullable. Renders the child.
    Nullable(Box<Expr>),
}

impl Expr {
    pub(crate) fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Wraps a bound value, turning arrays into [`Expr::Array`].
    #[must_use]
    pub fn value(value: SqlValue) -> Self {
        match value {
            SqlValue::Array(array) => Self::Array(array),
            other => Self::Value(other),
        }
    }

    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function {
            name: name.into(),
            args,
        }
    }
}
