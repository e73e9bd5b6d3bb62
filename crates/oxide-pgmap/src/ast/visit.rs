//! Bottom-up expression rewriting.

use super::{ColumnRef, Expr, WhenThen};
use crate::value::SqlValue;

/// Rebuilds an expression tree, giving hooks a chance to replace leaves.
///
/// Override [`rewrite_column`](Self::rewrite_column) or
/// [`rewrite_value`](Self::rewrite_value) to substitute leaves; override
/// [`rewrite`](Self::rewrite) to intercept whole subtrees and call [`walk`]
/// for the default descent. Subqueries inside `EXISTS` are not entered.
pub trait ExprRewriter {
    fn rewrite(&mut self, expr: Expr) -> Expr {
        walk(self, expr)
    }

    fn rewrite_column(&mut self, column: ColumnRef) -> Expr {
        Expr::Column(column)
    }

    fn rewrite_value(&mut self, value: SqlValue) -> Expr {
        Expr::Value(value)
    }
}

fn child<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: Box<Expr>) -> Box<Expr> {
    Box::new(rewriter.rewrite(*expr))
}

fn children<R: ExprRewriter + ?Sized>(rewriter: &mut R, exprs: Vec<Expr>) -> Vec<Expr> {
    exprs.into_iter().map(|e| rewriter.rewrite(e)).collect()
}

/// Rebuilds `expr` with every child passed through `rewriter`.
pub fn walk<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: Expr) -> Expr {
    match expr {
        Expr::Column(column) => rewriter.rewrite_column(column),
        Expr::Value(value) => rewriter.rewrite_value(value),
        Expr::All(_)
        | Expr::Distinct(_)
        | Expr::Array(_)
        | Expr::Constructor { .. }
        | Expr::Exists { .. }
        | Expr::AliasLiteral(_)
        | Expr::TableLiteral(_) => expr,
        Expr::Arithmetic { op, left, right } => Expr::Arithmetic {
            op,
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::DateArithmetic { op, left, right } => Expr::DateArithmetic {
            op,
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::Comparison { op, left, right } => Expr::Comparison {
            op,
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::ArrayComparison { op, left, right } => Expr::ArrayComparison {
            op,
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::JsonAccess { op, left, right } => Expr::JsonAccess {
            op,
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::And(items) => Expr::And(children(rewriter, items)),
        Expr::Or(items) => Expr::Or(children(rewriter, items)),
        Expr::Not(inner) => Expr::Not(child(rewriter, inner)),
        Expr::ScaleInterval { interval, scale } => Expr::ScaleInterval {
            interval: child(rewriter, interval),
            scale: child(rewriter, scale),
        },
        Expr::Empty { expr, negated } => Expr::Empty {
            expr: child(rewriter, expr),
            negated,
        },
        Expr::Is {
            expr,
            value,
            negated,
        } => Expr::Is {
            expr: child(rewriter, expr),
            value,
            negated,
        },
        Expr::In {
            expr,
            candidates,
            negated,
        } => Expr::In {
            expr: child(rewriter, expr),
            candidates: children(rewriter, candidates),
            negated,
        },
        Expr::Pattern {
            op,
            expr,
            pattern,
            negated,
        } => Expr::Pattern {
            op,
            expr: child(rewriter, expr),
            pattern: child(rewriter, pattern),
            negated,
        },
        Expr::Function { name, args } => Expr::Function {
            name,
            args: children(rewriter, args),
        },
        Expr::Cast { expr, type_name } => Expr::Cast {
            expr: child(rewriter, expr),
            type_name,
        },
        Expr::AtTimeZone { time, zone } => Expr::AtTimeZone {
            time: child(rewriter, time),
            zone: child(rewriter, zone),
        },
        Expr::ConcatJsonb { left, right } => Expr::ConcatJsonb {
            left: child(rewriter, left),
            right: child(rewriter, right),
        },
        Expr::BuildJsonb(pairs) => Expr::BuildJsonb(
            pairs
                .into_iter()
                .map(|(key, value)| (key, rewriter.rewrite(value)))
                .collect(),
        ),
        Expr::Case { branches, fallback } => Expr::Case {
            branches: branches
                .into_iter()
                .map(|branch| WhenThen {
                    condition: rewriter.rewrite(branch.condition),
                    result: rewriter.rewrite(branch.result),
                })
                .collect(),
            fallback: fallback.map(|f| child(rewriter, f)),
        },
        Expr::NotNull(inner) => Expr::NotNull(child(rewriter, inner)),
        Expr::Nullable(inner) => Expr::Nullable(child(rewriter, inner)),
    }
}
