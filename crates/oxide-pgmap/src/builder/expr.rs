//! Typed expressions and the operators defined on them.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Not, Sub};

use super::operand::{
    IntoOperand, JsonDocument, Numeric, Spatial, SqlCollection, SqlComparable, Temporal, Textual,
};
use crate::ast::{
    Aggregate, AggregateFunction, ArithmeticOp, ArrayOp, ComparisonOp, DateOp, Expr, IsValue,
    JsonOp, NullsOrder, Order, PatternOp, Projection, WhenThen,
};
use crate::schema::{Entity, TypedColumn};
use crate::value::{Interval, Jsonb, SqlValue, ToSqlValue};

/// An expression whose SQL type corresponds to the Rust type `R`.
///
/// `R` exists only at compile time; the wrapped [`Expr`] is what the
/// generator sees.
pub struct TypedExpr<R> {
    expr: Expr,
    _type: PhantomData<fn() -> R>,
}

impl<R> TypedExpr<R> {
    /// Wraps an untyped expression. The caller vouches for `R`.
    #[must_use]
    pub const fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _type: PhantomData,
        }
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

impl<R> Clone for TypedExpr<R> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<R> fmt::Debug for TypedExpr<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedExpr").field(&self.expr).finish()
    }
}

impl<R> From<TypedExpr<R>> for Expr {
    fn from(typed: TypedExpr<R>) -> Self {
        typed.expr
    }
}

/// A `WHEN condition THEN result` branch producing `R`.
pub struct TypedWhen<R> {
    pub(crate) branch: WhenThen,
    _type: PhantomData<fn() -> R>,
}

impl<R> TypedWhen<R> {
    #[must_use]
    pub fn into_branch(self) -> WhenThen {
        self.branch
    }
}

impl<R> Clone for TypedWhen<R> {
    fn clone(&self) -> Self {
        Self {
            branch: self.branch.clone(),
            _type: PhantomData,
        }
    }
}

impl<R> fmt::Debug for TypedWhen<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedWhen").field(&self.branch).finish()
    }
}

/// Strips one level of `Option`.
pub trait NullableType {
    type Inner;
}

impl<T> NullableType for Option<T> {
    type Inner = T;
}

fn typed<R>(expr: Expr) -> TypedExpr<R> {
    TypedExpr::from_expr(expr)
}

fn function<R>(name: &str, args: Vec<Expr>) -> TypedExpr<R> {
    typed(Expr::function(name, args))
}

fn aggregate(name: &str, expression: Expr, arguments: Vec<SqlValue>) -> Aggregate {
    Aggregate {
        function: AggregateFunction {
            name: name.to_string(),
            expression,
            arguments,
        },
        alias: None,
        unnested: false,
    }
}

/// Operators shared by typed expressions and typed columns.
pub trait ExprOps<R>: Sized {
    fn into_typed(self) -> TypedExpr<R>;

    // ---- comparison ----

    #[must_use]
    fn eq<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Eq, self, other)
    }

    #[must_use]
    fn ne<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Ne, self, other)
    }

    #[must_use]
    fn gt<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Gt, self, other)
    }

    #[must_use]
    fn gte<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Gte, self, other)
    }

    #[must_use]
    fn lt<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Lt, self, other)
    }

    #[must_use]
    fn lte<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlComparable,
    {
        compare(ComparisonOp::Lte, self, other)
    }

    // ---- arrays ----

    /// `left @> right`
    #[must_use]
    fn contains<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlCollection,
    {
        array_compare(ArrayOp::Contains, self, other)
    }

    /// `left <@ right`
    #[must_use]
    fn contained_by<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlCollection,
    {
        array_compare(ArrayOp::ContainedBy, self, other)
    }

    /// `left && right`
    #[must_use]
    fn overlaps<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: SqlCollection,
    {
        array_compare(ArrayOp::Overlaps, self, other)
    }

    #[must_use]
    fn is_empty(self) -> TypedExpr<bool>
    where
        R: SqlCollection,
    {
        typed(Expr::Empty {
            expr: self.into_typed().into_expr().boxed(),
            negated: false,
        })
    }

    #[must_use]
    fn is_not_empty(self) -> TypedExpr<bool>
    where
        R: SqlCollection,
    {
        typed(Expr::Empty {
            expr: self.into_typed().into_expr().boxed(),
            negated: true,
        })
    }

    // ---- IS tests ----

    #[must_use]
    fn is_null(self) -> TypedExpr<bool> {
        is(self, IsValue::Null, false)
    }

    #[must_use]
    fn is_not_null(self) -> TypedExpr<bool> {
        is(self, IsValue::Null, true)
    }

    #[must_use]
    fn is_true(self) -> TypedExpr<bool> {
        is(self, IsValue::True, false)
    }

    #[must_use]
    fn is_not_true(self) -> TypedExpr<bool> {
        is(self, IsValue::True, true)
    }

    #[must_use]
    fn is_false(self) -> TypedExpr<bool> {
        is(self, IsValue::False, false)
    }

    #[must_use]
    fn is_not_false(self) -> TypedExpr<bool> {
        is(self, IsValue::False, true)
    }

    // ---- membership ----

    #[must_use]
    fn is_in<I, O>(self, candidates: I) -> TypedExpr<bool>
    where
        I: IntoIterator<Item = O>,
        O: IntoOperand<R>,
    {
        membership(self, candidates, false)
    }

    #[must_use]
    fn is_not_in<I, O>(self, candidates: I) -> TypedExpr<bool>
    where
        I: IntoIterator<Item = O>,
        O: IntoOperand<R>,
    {
        membership(self, candidates, true)
    }

    // ---- patterns ----

    #[must_use]
    fn like<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::Like, self, pattern, false)
    }

    #[must_use]
    fn not_like<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::Like, self, pattern, true)
    }

    #[must_use]
    fn ilike<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::ILike, self, pattern, false)
    }

    #[must_use]
    fn not_ilike<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::ILike, self, pattern, true)
    }

    /// POSIX regular expression match, `~`.
    #[must_use]
    fn matches<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::Similar, self, pattern, false)
    }

    #[must_use]
    fn not_matches<O: IntoOperand<R>>(self, pattern: O) -> TypedExpr<bool>
    where
        R: Textual,
    {
        pattern_match(PatternOp::Similar, self, pattern, true)
    }

    #[must_use]
    fn lower(self) -> TypedExpr<R>
    where
        R: Textual,
    {
        function("lower", vec![self.into_typed().into_expr()])
    }

    #[must_use]
    fn upper(self) -> TypedExpr<R>
    where
        R: Textual,
    {
        function("upper", vec![self.into_typed().into_expr()])
    }

    #[must_use]
    fn char_length(self) -> TypedExpr<i32>
    where
        R: Textual,
    {
        function("char_length", vec![self.into_typed().into_expr()])
    }

    /// Renders the value as text, e.g. a UUID.
    #[must_use]
    fn text(self) -> TypedExpr<String> {
        function("text", vec![self.into_typed().into_expr()])
    }

    // ---- arithmetic ----

    #[must_use]
    fn modulo<O: IntoOperand<R>>(self, other: O) -> TypedExpr<R>
    where
        R: Numeric,
    {
        arithmetic(ArithmeticOp::Mod, self, other)
    }

    #[must_use]
    fn pow<O: IntoOperand<R>>(self, other: O) -> TypedExpr<R>
    where
        R: Numeric,
    {
        arithmetic(ArithmeticOp::Pow, self, other)
    }

    #[must_use]
    fn plus_interval<O: IntoOperand<Interval>>(self, interval: O) -> TypedExpr<R>
    where
        R: Temporal,
    {
        typed(Expr::DateArithmetic {
            op: DateOp::PlusInterval,
            left: self.into_typed().into_expr().boxed(),
            right: interval.into_operand().boxed(),
        })
    }

    #[must_use]
    fn minus_interval<O: IntoOperand<Interval>>(self, interval: O) -> TypedExpr<R>
    where
        R: Temporal,
    {
        typed(Expr::DateArithmetic {
            op: DateOp::MinusInterval,
            left: self.into_typed().into_expr().boxed(),
            right: interval.into_operand().boxed(),
        })
    }

    /// `date_trunc('precision', self)`
    #[must_use]
    fn date_trunc(self, precision: &str) -> TypedExpr<R>
    where
        R: Temporal,
    {
        function(
            "date_trunc",
            vec![
                Expr::Value(precision.to_sql_value()),
                self.into_typed().into_expr(),
            ],
        )
    }

    /// `date_trunc(interval, self)`
    #[must_use]
    fn date_trunc_to<O: IntoOperand<Interval>>(self, interval: O) -> TypedExpr<R>
    where
        R: Temporal,
    {
        function(
            "date_trunc",
            vec![interval.into_operand(), self.into_typed().into_expr()],
        )
    }

    /// `(self AT TIME ZONE zone)`. A literal zone is validated at generation
    /// time.
    #[must_use]
    fn at_time_zone<O: IntoOperand<Option<String>>>(self, zone: O) -> TypedExpr<R>
    where
        R: Temporal,
    {
        typed(Expr::AtTimeZone {
            time: self.into_typed().into_expr().boxed(),
            zone: zone.into_operand().boxed(),
        })
    }

    // ---- casts and adapters ----

    /// `(self)::type_name`
    #[must_use]
    fn cast<C>(self, type_name: &str) -> TypedExpr<C> {
        typed(Expr::Cast {
            expr: self.into_typed().into_expr().boxed(),
            type_name: type_name.to_string(),
        })
    }

    #[must_use]
    fn cast_int(self) -> TypedExpr<Option<i32>> {
        self.cast("INT")
    }

    /// Presents this expression as nullable.
    #[must_use]
    fn nullable(self) -> TypedExpr<Option<R>> {
        typed(Expr::Nullable(self.into_typed().into_expr().boxed()))
    }

    /// Presents a nullable expression as non-nullable.
    #[must_use]
    fn not_null(self) -> TypedExpr<R::Inner>
    where
        R: NullableType,
    {
        typed(Expr::NotNull(self.into_typed().into_expr().boxed()))
    }

    // ---- JSONB ----

    /// `self -> key`
    #[must_use]
    fn json_get<K: ToSqlValue>(self, key: K) -> TypedExpr<Option<Jsonb>>
    where
        R: JsonDocument,
    {
        json_access(JsonOp::Get, self, key)
    }

    /// `self ->> key`
    #[must_use]
    fn json_get_text<K: ToSqlValue>(self, key: K) -> TypedExpr<Option<String>>
    where
        R: JsonDocument,
    {
        json_access(JsonOp::GetAsText, self, key)
    }

    /// `self || other`
    #[must_use]
    fn concat<O: IntoOperand<Jsonb>>(self, other: O) -> TypedExpr<Jsonb>
    where
        R: JsonDocument,
    {
        typed(Expr::ConcatJsonb {
            left: self.into_typed().into_expr().boxed(),
            right: other.into_operand().boxed(),
        })
    }

    /// `self || jsonb_build_object(...)` over the entries of `map`.
    #[must_use]
    fn concat_map(self, map: serde_json::Map<String, serde_json::Value>) -> TypedExpr<Jsonb>
    where
        R: JsonDocument,
    {
        typed(Expr::ConcatJsonb {
            left: self.into_typed().into_expr().boxed(),
            right: super::json::build_from_map(map).boxed(),
        })
    }

    /// `(self)::jsonb`
    #[must_use]
    fn jsonb(self) -> TypedExpr<Jsonb>
    where
        R: JsonDocument,
    {
        self.cast("jsonb")
    }

    // ---- PostGIS ----

    /// `st_distance(self, other)`
    #[must_use]
    fn distance_from<O: IntoOperand<R>>(self, other: O) -> TypedExpr<Option<f64>>
    where
        R: Spatial,
    {
        function(
            "st_distance",
            vec![self.into_typed().into_expr(), other.into_operand()],
        )
    }

    /// `st_dwithin(self, other, distance)`
    #[must_use]
    fn within_distance<O, D>(self, other: O, distance: D) -> TypedExpr<bool>
    where
        R: Spatial,
        O: IntoOperand<R>,
        D: IntoOperand<f64>,
    {
        function(
            "st_dwithin",
            vec![
                self.into_typed().into_expr(),
                other.into_operand(),
                distance.into_operand(),
            ],
        )
    }

    /// `st_within(self, other)`
    #[must_use]
    fn within<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: Spatial,
    {
        function(
            "st_within",
            vec![self.into_typed().into_expr(), other.into_operand()],
        )
    }

    /// `st_overlaps(self, other)`
    #[must_use]
    fn overlaps_geometry<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: Spatial,
    {
        function(
            "st_overlaps",
            vec![self.into_typed().into_expr(), other.into_operand()],
        )
    }

    /// `st_intersects(self, other)`
    #[must_use]
    fn intersects<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: Spatial,
    {
        function(
            "st_intersects",
            vec![self.into_typed().into_expr(), other.into_operand()],
        )
    }

    /// `st_contains(self, other)`
    #[must_use]
    fn contains_geometry<O: IntoOperand<R>>(self, other: O) -> TypedExpr<bool>
    where
        R: Spatial,
    {
        function(
            "st_contains",
            vec![self.into_typed().into_expr(), other.into_operand()],
        )
    }

    /// `st_buffer(self, radius)`
    #[must_use]
    fn buffer<D: IntoOperand<f64>>(self, radius: D) -> TypedExpr<R>
    where
        R: Spatial,
    {
        function(
            "st_buffer",
            vec![self.into_typed().into_expr(), radius.into_operand()],
        )
    }

    /// `st_area(self)`
    #[must_use]
    fn area(self) -> TypedExpr<Option<f64>>
    where
        R: Spatial,
    {
        function("st_area", vec![self.into_typed().into_expr()])
    }

    /// `st_clusterwithin(self, radius)`, usually combined with
    /// [`Aggregate::unnest`].
    #[must_use]
    fn cluster_within(self, radius: f64) -> Aggregate
    where
        R: Spatial,
    {
        aggregate(
            "st_clusterwithin",
            self.into_typed().into_expr(),
            vec![SqlValue::Float(radius)],
        )
    }

    // ---- ordering and projection ----

    #[must_use]
    fn asc(self) -> Order {
        Order::Expression {
            expression: self.into_typed().into_expr(),
            descending: false,
            nulls: None,
        }
    }

    #[must_use]
    fn desc(self) -> Order {
        Order::Expression {
            expression: self.into_typed().into_expr(),
            descending: true,
            nulls: None,
        }
    }

    #[must_use]
    fn project(self) -> Projection {
        Projection::new(self.into_typed().into_expr())
    }

    #[must_use]
    fn project_as(self, alias: impl Into<String>) -> Projection {
        Projection {
            expression: self.into_typed().into_expr(),
            alias: Some(alias.into()),
        }
    }

    // ---- aggregates ----

    #[must_use]
    fn count(self) -> Aggregate {
        aggregate("count", self.into_typed().into_expr(), vec![])
    }

    #[must_use]
    fn first(self) -> Aggregate {
        aggregate("first", self.into_typed().into_expr(), vec![])
    }

    #[must_use]
    fn avg(self) -> Aggregate
    where
        R: Numeric,
    {
        aggregate("avg", self.into_typed().into_expr(), vec![])
    }

    #[must_use]
    fn sum(self) -> Aggregate {
        aggregate("sum", self.into_typed().into_expr(), vec![])
    }

    #[must_use]
    fn min(self) -> Aggregate
    where
        R: SqlComparable,
    {
        aggregate("min", self.into_typed().into_expr(), vec![])
    }

    #[must_use]
    fn max(self) -> Aggregate
    where
        R: SqlComparable,
    {
        aggregate("max", self.into_typed().into_expr(), vec![])
    }
}

impl<R> ExprOps<R> for TypedExpr<R> {
    fn into_typed(self) -> TypedExpr<R> {
        self
    }
}

impl<E: Entity, R> ExprOps<R> for TypedColumn<E, R> {
    fn into_typed(self) -> TypedExpr<R> {
        typed(Expr::Column(self.column_ref()))
    }
}

fn compare<R, L: ExprOps<R>, O: IntoOperand<R>>(
    op: ComparisonOp,
    left: L,
    right: O,
) -> TypedExpr<bool> {
    typed(Expr::Comparison {
        op,
        left: left.into_typed().into_expr().boxed(),
        right: right.into_operand().boxed(),
    })
}

fn array_compare<R, L: ExprOps<R>, O: IntoOperand<R>>(
    op: ArrayOp,
    left: L,
    right: O,
) -> TypedExpr<bool> {
    typed(Expr::ArrayComparison {
        op,
        left: left.into_typed().into_expr().boxed(),
        right: right.into_operand().boxed(),
    })
}

fn arithmetic<R, L: ExprOps<R>, O: IntoOperand<R>>(
    op: ArithmeticOp,
    left: L,
    right: O,
) -> TypedExpr<R> {
    typed(Expr::Arithmetic {
        op,
        left: left.into_typed().into_expr().boxed(),
        right: right.into_operand().boxed(),
    })
}

fn is<R, L: ExprOps<R>>(expr: L, value: IsValue, negated: bool) -> TypedExpr<bool> {
    typed(Expr::Is {
        expr: expr.into_typed().into_expr().boxed(),
        value,
        negated,
    })
}

fn membership<R, L, I, O>(expr: L, candidates: I, negated: bool) -> TypedExpr<bool>
where
    L: ExprOps<R>,
    I: IntoIterator<Item = O>,
    O: IntoOperand<R>,
{
    typed(Expr::In {
        expr: expr.into_typed().into_expr().boxed(),
        candidates: candidates
            .into_iter()
            .map(IntoOperand::into_operand)
            .collect(),
        negated,
    })
}

fn pattern_match<R, L: ExprOps<R>, O: IntoOperand<R>>(
    op: PatternOp,
    expr: L,
    pattern: O,
    negated: bool,
) -> TypedExpr<bool> {
    typed(Expr::Pattern {
        op,
        expr: expr.into_typed().into_expr().boxed(),
        pattern: pattern.into_operand().boxed(),
        negated,
    })
}

fn json_access<R, T, L: ExprOps<R>, K: ToSqlValue>(op: JsonOp, left: L, key: K) -> TypedExpr<T> {
    typed(Expr::JsonAccess {
        op,
        left: left.into_typed().into_expr().boxed(),
        right: Expr::Value(key.to_sql_value()).boxed(),
    })
}

impl TypedExpr<bool> {
    /// `(self AND other)`
    #[must_use]
    pub fn and<O: IntoOperand<bool>>(self, other: O) -> Self {
        typed(Expr::And(vec![self.expr, other.into_operand()]))
    }

    /// `(self OR other)`
    #[must_use]
    pub fn or<O: IntoOperand<bool>>(self, other: O) -> Self {
        typed(Expr::Or(vec![self.expr, other.into_operand()]))
    }

    /// `(NOT self)`
    #[must_use]
    pub fn inverse(self) -> Self {
        typed(Expr::Not(self.expr.boxed()))
    }

    /// Pairs this condition with a result for a CASE expression.
    #[must_use]
    pub fn then<R, O: IntoOperand<R>>(self, result: O) -> TypedWhen<R> {
        TypedWhen {
            branch: WhenThen {
                condition: self.expr,
                result: result.into_operand(),
            },
            _type: PhantomData,
        }
    }
}

impl TypedExpr<Interval> {
    /// `(self * factor)`
    #[must_use]
    pub fn scale<O: IntoOperand<i32>>(self, factor: O) -> Self {
        typed(Expr::ScaleInterval {
            interval: self.expr.boxed(),
            scale: factor.into_operand().boxed(),
        })
    }
}

impl Order {
    #[must_use]
    pub fn nulls_first(self) -> Self {
        self.with_nulls(NullsOrder::First)
    }

    #[must_use]
    pub fn nulls_last(self) -> Self {
        self.with_nulls(NullsOrder::Last)
    }

    fn with_nulls(self, order: NullsOrder) -> Self {
        match self {
            Self::Expression {
                expression,
                descending,
                ..
            } => Self::Expression {
                expression,
                descending,
                nulls: Some(order),
            },
            case @ Self::Case(_) => case,
        }
    }
}

impl Aggregate {
    #[must_use]
    pub fn project_as(self, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self
        }
    }

    /// Wraps the aggregate as `unnest(...)`.
    #[must_use]
    pub fn unnest(self) -> Self {
        Self {
            unnested: true,
            ..self
        }
    }
}

impl Not for TypedExpr<bool> {
    type Output = Self;

    fn not(self) -> Self {
        self.inverse()
    }
}

impl BitAnd for TypedExpr<bool> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for TypedExpr<bool> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

macro_rules! arithmetic_ops {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {$(
        impl<R: Numeric, O: IntoOperand<R>> $trait<O> for TypedExpr<R> {
            type Output = Self;

            fn $method(self, rhs: O) -> Self {
                arithmetic(ArithmeticOp::$op, self, rhs)
            }
        }

        impl<E: Entity, R: Numeric, O: IntoOperand<R>> $trait<O> for TypedColumn<E, R> {
            type Output = TypedExpr<R>;

            fn $method(self, rhs: O) -> TypedExpr<R> {
                arithmetic(ArithmeticOp::$op, self, rhs)
            }
        }
    )*};
}

arithmetic_ops!(
    Add::add => Plus,
    Sub::sub => Minus,
    Mul::mul => Times,
    Div::div => Div,
);
