//! PostgreSQL generator.

use std::sync::Arc;

use chrono_tz::Tz;
use tracing::debug;

use super::{DeleteStatement, Dialect, Fragment, InsertStatement, SelectStatement, UpdateStatement};
use crate::ast::{
    Aggregate, ColumnRef, Delete, Expr, From, Insert, IntoField, Join, NullsOrder, Order,
    Projection, Query, SubQuery, TableRef, Update, UpdateFrom, WhenThen,
};
use crate::error::{Error, Result};
use crate::naming::NameResolver;
use crate::value::{quote_literal, SqlValue};

/// Alias given to an UPDATE ... FROM subquery correlated through WHERE only.
const IGNORED_ALIAS: &str = "autogenerated_alias";

/// PostgreSQL dialect.
///
/// Holds the name resolver it shares with the row mapper so that sentinel
/// labels agree on both sides.
#[derive(Debug, Clone, Default)]
pub struct Postgres {
    names: Arc<NameResolver>,
}

impl Postgres {
    /// Creates a generator with its own name resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator over a shared name resolver.
    #[must_use]
    pub const fn with_names(names: Arc<NameResolver>) -> Self {
        Self { names }
    }

    #[must_use]
    pub const fn names(&self) -> &Arc<NameResolver> {
        &self.names
    }

    // ---- names ----

    fn table_name(&self, table: &TableRef) -> Result<String> {
        self.names.table_name(table.entity)
    }

    /// `"alias"`, or `"name"` when unaliased.
    fn table_adjective(&self, table: &TableRef) -> Result<String> {
        match &table.alias {
            Some(alias) => Ok(self.quote_identifier(alias)),
            None => Ok(self.quote_identifier(&self.table_name(table)?)),
        }
    }

    /// `"name"`, or `"name" "alias"` when aliased.
    pub(super) fn table_noun(&self, table: &TableRef) -> Result<String> {
        let name = self.quote_identifier(&self.table_name(table)?);
        Ok(match &table.alias {
            Some(alias) => format!("{name} {}", self.quote_identifier(alias)),
            None => name,
        })
    }

    /// The bare quoted column name, without its table.
    pub(super) fn column_name(&self, column: &ColumnRef) -> String {
        self.quote_identifier(&self.names.column_name(column))
    }

    fn sentinels(&self, into: &IntoField) -> (Fragment, Fragment) {
        (
            Fragment::literal(format!(
                "NULL AS {}",
                self.quote_identifier(&self.names.join_start(into))
            )),
            Fragment::literal(format!(
                "NULL AS {}",
                self.quote_identifier(&self.names.join_end(into))
            )),
        )
    }

    // ---- expressions ----

    fn expr(&self, expr: &Expr) -> Result<Fragment> {
        match expr {
            Expr::All(Some(table)) => Ok(Fragment::literal(format!(
                "{}.*",
                self.table_adjective(table)?
            ))),
            Expr::All(None) => Ok(Fragment::literal("*")),
            Expr::Column(column) => Ok(Fragment::literal(format!(
                "{}.{}",
                self.table_adjective(&column.table)?,
                self.column_name(column)
            ))),
            Expr::Distinct(column) => Ok(Fragment::literal(format!(
                "DISTINCT {}",
                self.column_name(column)
            ))),
            Expr::Value(SqlValue::Null) => Ok(Fragment::literal("NULL")),
            Expr::Value(value) => Ok(self.bound(value.clone())),
            Expr::Array(array) => Ok(self.bound(SqlValue::Array(array.clone()))),
            Expr::Arithmetic { op, left, right } => self.binary(op.as_str(), left, right),
            Expr::DateArithmetic { op, left, right } => self.binary(op.as_str(), left, right),
            Expr::Comparison { op, left, right } => self.binary(op.as_str(), left, right),
            Expr::ArrayComparison { op, left, right } => self.binary(op.as_str(), left, right),
            Expr::JsonAccess { op, left, right } => {
                let mut fragment = self.expr(left)?;
                fragment.sql.push_str(&format!(" {} ", op.as_str()));
                fragment.push(self.expr(right)?);
                Ok(fragment)
            }
            Expr::And(items) if items.is_empty() => Ok(Fragment::literal("TRUE")),
            Expr::Or(items) if items.is_empty() => Ok(Fragment::literal("FALSE")),
            Expr::And(items) => self.infix("AND", items),
            Expr::Or(items) => self.infix("OR", items),
            Expr::Not(inner) => self.wrap("(NOT ", inner, ")"),
            Expr::ScaleInterval { interval, scale } => self.binary("*", interval, scale),
            Expr::Empty { expr, negated } => {
                let operator = if *negated { "!=" } else { "=" };
                self.wrap("(", expr, &format!(" {operator} '{{}}')"))
            }
            Expr::Is {
                expr,
                value,
                negated,
            } => {
                let operator = if *negated { "IS NOT" } else { "IS" };
                self.wrap("(", expr, &format!(" {operator} {})", value.as_str()))
            }
            Expr::In {
                expr,
                candidates,
                negated,
            } => self.membership(expr, candidates, *negated),
            Expr::Pattern {
                op,
                expr,
                pattern,
                negated,
            } => {
                let mut fragment = self.wrap("(", expr, &format!(" {} ", op.as_str(*negated)))?;
                fragment.push(self.wrap("", pattern, ")")?);
                Ok(fragment)
            }
            Expr::Function { name, args } => {
                let args = self.list(args.iter().map(|arg| self.expr(arg)), ", ")?;
                Ok(Fragment::new(format!("{name}({})", args.sql), args.values))
            }
            Expr::Constructor { type_name, value } => Ok(Fragment::literal(format!(
                "{type_name} {}",
                quote_literal(value)
            ))),
            Expr::Cast { expr, type_name } => self.wrap("(", expr, &format!(")::{type_name}")),
            Expr::Exists {
                query,
                alias,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let mut fragment = self.query(query)?;
                fragment.sql = match alias {
                    Some(alias) => format!("{not}EXISTS ({}) {alias}", fragment.sql),
                    None => format!("{not}EXISTS ({})", fragment.sql),
                };
                Ok(fragment)
            }
            Expr::AtTimeZone { time, zone } => {
                if let Expr::Value(SqlValue::Text(name)) = unadapted(zone) {
                    if name.parse::<Tz>().is_err() {
                        return Err(Error::Validation(format!(
                            "'{name}' is not a valid time zone"
                        )));
                    }
                }
                let mut fragment = self.wrap("(", time, " AT TIME ZONE ")?;
                fragment.push(self.wrap("", zone, ")")?);
                Ok(fragment)
            }
            Expr::ConcatJsonb { left, right } => {
                let mut fragment = self.expr(left)?;
                fragment.sql.push_str(" || ");
                fragment.push(self.expr(right)?);
                Ok(fragment)
            }
            Expr::BuildJsonb(pairs) => {
                let pairs = self.list(
                    pairs.iter().map(|(key, value)| {
                        let value = self.expr(value)?;
                        Ok(Fragment::new(
                            format!("{}, {}", quote_literal(key), value.sql),
                            value.values,
                        ))
                    }),
                    ", ",
                )?;
                Ok(Fragment::new(
                    format!("jsonb_build_object({})", pairs.sql),
                    pairs.values,
                ))
            }
            Expr::Case { branches, fallback } => {
                if branches.is_empty() {
                    return Err(Error::construction(
                        "There must be at least one WHEN THEN statement in a CASE block",
                    ));
                }
                let mut fragment = self.branches(branches)?;
                fragment.sql.insert_str(0, "CASE ");
                if let Some(fallback) = fallback {
                    fragment.push(self.wrap(" ELSE ", fallback, "")?);
                }
                fragment.sql.push_str(" END");
                Ok(fragment)
            }
            Expr::AliasLiteral(alias) => Ok(Fragment::literal(self.quote_identifier(alias))),
            Expr::TableLiteral(table) => Ok(Fragment::literal(
                self.quote_identifier(&self.table_name(table)?),
            )),
            Expr::NotNull(inner) | Expr::Nullable(inner) => self.expr(inner),
        }
    }

    fn bound(&self, value: SqlValue) -> Fragment {
        Fragment::new(self.parameter_placeholder(), vec![value])
    }

    /// `before` + child + `after`, keeping the child's values.
    fn wrap(&self, before: &str, inner: &Expr, after: &str) -> Result<Fragment> {
        let inner = self.expr(inner)?;
        Ok(Fragment::new(
            format!("{before}{}{after}", inner.sql),
            inner.values,
        ))
    }

    /// `(a op b op c)`
    fn infix<'a, I>(&self, operator: &str, operands: I) -> Result<Fragment>
    where
        I: IntoIterator<Item = &'a Expr>,
    {
        let joined = self.list(
            operands.into_iter().map(|operand| self.expr(operand)),
            &format!(" {operator} "),
        )?;
        Ok(Fragment::new(format!("({})", joined.sql), joined.values))
    }

    fn binary(&self, operator: &str, left: &Expr, right: &Expr) -> Result<Fragment> {
        self.infix(operator, [left, right])
    }

    fn list<I>(&self, fragments: I, separator: &str) -> Result<Fragment>
    where
        I: IntoIterator<Item = Result<Fragment>>,
    {
        Ok(Fragment::join(
            fragments.into_iter().collect::<Result<Vec<_>>>()?,
            separator,
        ))
    }

    fn membership(&self, expr: &Expr, candidates: &[Expr], negated: bool) -> Result<Fragment> {
        let expr = self.expr(expr)?;
        if candidates.is_empty() {
            // `IN ()` is not valid SQL. Comparing with NULL keeps the column
            // reference, and with it any join the column depends on.
            let comparison = if negated { "IS" } else { "IS NOT" };
            return Ok(Fragment::new(
                format!("((({}) = NULL) {comparison} NULL)", expr.sql),
                expr.values,
            ));
        }
        let operator = if negated { "NOT IN" } else { "IN" };
        let candidates = self.list(candidates.iter().map(|c| self.expr(c)), ", ")?;
        let mut values = expr.values;
        values.extend(candidates.values);
        Ok(Fragment::new(
            format!("({} {operator} ({}))", expr.sql, candidates.sql),
            values,
        ))
    }

    /// `WHEN c THEN r WHEN ...`
    fn branches(&self, branches: &[WhenThen]) -> Result<Fragment> {
        self.list(
            branches.iter().map(|branch| {
                let mut fragment = self.wrap("WHEN ", &branch.condition, " THEN ")?;
                fragment.push(self.expr(&branch.result)?);
                Ok(fragment)
            }),
            " ",
        )
    }

    // ---- query parts ----

    pub(super) fn projection(&self, projection: &Projection) -> Result<Fragment> {
        let mut fragment = self.expr(&projection.expression)?;
        if let Some(alias) = &projection.alias {
            fragment.sql.push_str(&format!(" AS {alias}"));
        }
        Ok(fragment)
    }

    fn aggregate(&self, aggregate: &Aggregate) -> Result<Fragment> {
        let function = &aggregate.function;
        let mut args = vec![self.expr(&function.expression)?];
        for argument in &function.arguments {
            args.push(self.expr(&Expr::value(argument.clone()))?);
        }
        let args = Fragment::join(args, ", ");
        let call = format!("{}({})", function.name, args.sql);
        let mut sql = if aggregate.unnested {
            format!("unnest({call})")
        } else {
            call
        };
        if let Some(alias) = &aggregate.alias {
            sql.push_str(&format!(" AS {alias}"));
        }
        Ok(Fragment::new(sql, args.values))
    }

    fn order(&self, order: &Order) -> Result<Fragment> {
        match order {
            Order::Expression {
                expression,
                descending,
                nulls,
            } => {
                let mut fragment = self.expr(expression)?;
                fragment.sql.push_str(if *descending { " DESC" } else { " ASC" });
                match nulls {
                    Some(NullsOrder::First) => fragment.sql.push_str(" NULLS FIRST"),
                    Some(NullsOrder::Last) => fragment.sql.push_str(" NULLS LAST"),
                    None => {}
                }
                Ok(fragment)
            }
            Order::Case(branches) => {
                if branches.is_empty() {
                    return Err(Error::construction(
                        "There must be at least one WHEN THEN statement in an ORDER BY CASE block",
                    ));
                }
                let branches = self.branches(branches)?;
                Ok(Fragment::new(
                    format!("CASE {} END", branches.sql),
                    branches.values,
                ))
            }
        }
    }

    fn from_item(&self, from: &From) -> Result<Fragment> {
        match from {
            From::Table(table) => Ok(Fragment::literal(self.table_noun(table)?)),
            From::Join(join) => self.join(join),
            From::SubQuery(sub_query) => self.sub_query(sub_query),
        }
    }

    fn sub_query(&self, sub_query: &SubQuery) -> Result<Fragment> {
        let mut fragment = self.query(&sub_query.query)?;
        fragment.sql = match &sub_query.alias {
            Some(alias) => format!("({}) {alias}", fragment.sql),
            None => format!("({})", fragment.sql),
        };
        Ok(fragment)
    }

    fn join(&self, join: &Join) -> Result<Fragment> {
        let mut fragment = match (&join.alias, join.query.from.as_slice()) {
            (Some(alias), _) => {
                let inner = self.query(&join.query)?;
                Fragment::new(
                    format!("({}) {}", inner.sql, self.quote_identifier(alias)),
                    inner.values,
                )
            }
            (None, [From::Table(table)]) => Fragment::literal(self.table_noun(table)?),
            (None, _) => {
                return Err(Error::construction(
                    "join must specify alias or exactly one table",
                ))
            }
        };
        fragment.sql.insert_str(0, &format!("{} ", join.kind.as_str()));
        if let Some(on) = &join.on {
            fragment.push(self.wrap(" ON ", on, "")?);
        } else if let Some(using) = &join.using {
            let columns: Vec<String> = using.iter().map(|c| self.column_name(c)).collect();
            fragment.sql.push_str(&format!(" USING {}", columns.join(", ")));
        } else {
            return Err(Error::construction("using or on required for join"));
        }
        Ok(fragment)
    }

    /// Lowers a query without logging; shared by nested queries.
    pub(super) fn query(&self, query: &Query) -> Result<Fragment> {
        let mut head = Fragment::literal("SELECT ");
        if query.distinct {
            head.sql.push_str("DISTINCT ");
        } else if let Some(distinct_on) = &query.distinct_on {
            let on = self.list(distinct_on.iter().map(|p| self.projection(p)), ", ")?;
            head.push(Fragment::new(format!("DISTINCT ON ({}) ", on.sql), on.values));
        }

        let mut columns = Vec::new();
        for aggregate in &query.aggregates {
            columns.push(self.aggregate(aggregate)?);
        }
        for projection in &query.projections {
            columns.push(self.projection(projection)?);
        }
        for from in &query.from {
            if let From::Join(join) = from {
                let sentinels = join.into_field.as_ref().map(|into| self.sentinels(into));
                let (start, end) = sentinels.unzip();
                columns.extend(start);
                for projection in &join.query.projections {
                    columns.push(self.projection(projection)?);
                }
                columns.extend(end);
            }
        }
        head.push(Fragment::join(columns, ", "));

        let from = self.list(query.from.iter().map(|f| self.from_item(f)), " ")?;
        head.push(Fragment::new(format!(" FROM {}", from.sql), from.values));

        if let Some(where_clause) = &query.where_clause {
            head.push(self.wrap(" WHERE ", where_clause, "")?);
        }
        if query.grouped {
            let keys = self.list(
                query.projections.iter().map(|projection| match &projection.alias {
                    Some(alias) => Ok(Fragment::literal(alias.clone())),
                    None => self.expr(&projection.expression),
                }),
                ", ",
            )?;
            head.push(Fragment::new(format!(" GROUP BY {}", keys.sql), keys.values));
        }
        if query.random {
            head.sql.push_str(" ORDER BY RANDOM()");
        } else if let Some(order) = &query.order {
            let order = self.list(order.iter().map(|o| self.order(o)), ", ")?;
            head.push(Fragment::new(format!(" ORDER BY {}", order.sql), order.values));
        }
        if let Some(limit) = query.limit {
            head.sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset {
            head.sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(head)
    }

    fn update_from(&self, from: &UpdateFrom) -> Result<Option<Fragment>> {
        let fragment = match from {
            UpdateFrom::None => return Ok(None),
            UpdateFrom::Tables(tables) => {
                let names = tables
                    .iter()
                    .map(|table| Ok(self.quote_identifier(&self.table_name(table)?)))
                    .collect::<Result<Vec<_>>>()?;
                Fragment::literal(names.join(", "))
            }
            UpdateFrom::AliasedTables(tables) => {
                let nouns = tables
                    .iter()
                    .map(|table| self.table_noun(table))
                    .collect::<Result<Vec<_>>>()?;
                Fragment::literal(nouns.join(", "))
            }
            UpdateFrom::SubQuery { query, alias } => {
                let inner = self.query(query)?;
                Fragment::new(
                    format!("({}) {}", inner.sql, self.quote_identifier(alias)),
                    inner.values,
                )
            }
            UpdateFrom::SubQueryIgnoredAlias(query) => {
                let inner = self.query(query)?;
                Fragment::new(
                    format!("({}) {}", inner.sql, self.quote_identifier(IGNORED_ALIAS)),
                    inner.values,
                )
            }
        };
        Ok(Some(fragment))
    }
}

/// Strips the nullability adapters, which never change the generated SQL.
fn unadapted(mut expr: &Expr) -> &Expr {
    while let Expr::NotNull(inner) | Expr::Nullable(inner) = expr {
        expr = inner.as_ref();
    }
    expr
}

impl Dialect for Postgres {
    fn expression(&self, expr: &Expr) -> Result<Fragment> {
        self.expr(expr)
    }

    fn select(&self, query: &Query) -> Result<SelectStatement> {
        let fragment = self.query(query)?;
        debug!(sql = %fragment.sql, values = fragment.values.len(), "Generated SELECT");
        Ok(SelectStatement {
            sql: fragment.sql,
            values: fragment.values,
            query: query.clone(),
        })
    }

    fn update(&self, update: &Update) -> Result<UpdateStatement> {
        if update.fields.is_empty() {
            return Err(Error::construction("cannot update without fields"));
        }
        let assignments = self.list(
            update.fields.iter().map(|field| {
                let value = self.expr(&field.expression)?;
                Ok(Fragment::new(
                    format!("{} = {}", self.column_name(&field.column), value.sql),
                    value.values,
                ))
            }),
            ", ",
        )?;

        let table = self.table_noun(&update.table)?;
        let mut fragment = Fragment::literal(format!("UPDATE {table} SET "));
        fragment.push(assignments);
        if let Some(from) = self.update_from(&update.from)? {
            fragment.sql.push_str(" FROM ");
            fragment.push(from);
        }
        if let Some(where_clause) = &update.where_clause {
            fragment.push(self.wrap(" WHERE ", where_clause, "")?);
        }
        if let Some(projections) = &update.projections {
            let mut returning = projections
                .iter()
                .map(|p| self.projection(p))
                .collect::<Result<Vec<_>>>()?;
            for into in &update.into_fields {
                let (start, end) = self.sentinels(into);
                let target = TableRef {
                    entity: into.target,
                    alias: None,
                };
                returning.push(start);
                returning.push(self.expr(&Expr::All(Some(target)))?);
                returning.push(end);
            }
            fragment.sql.push_str(" RETURNING ");
            fragment.push(Fragment::join(returning, ", "));
        }

        debug!(sql = %fragment.sql, values = fragment.values.len(), "Generated UPDATE");
        Ok(UpdateStatement {
            sql: fragment.sql,
            values: fragment.values,
            update: update.clone(),
        })
    }

    fn delete(&self, delete: &Delete) -> Result<DeleteStatement> {
        let mut fragment =
            Fragment::literal(format!("DELETE FROM {}", self.table_noun(&delete.table)?));
        if let Some(where_clause) = &delete.where_clause {
            fragment.push(self.wrap(" WHERE ", where_clause, "")?);
        }
        debug!(sql = %fragment.sql, values = fragment.values.len(), "Generated DELETE");
        Ok(DeleteStatement {
            sql: fragment.sql,
            values: fragment.values,
        })
    }

    fn insert<T: Clone>(&self, insert: &Insert<T>) -> Result<InsertStatement<T>> {
        let statement = self.insert_statement(insert)?;
        debug!(
            sql = %statement.sql,
            rows = statement.rows.len(),
            values = statement.values.len(),
            "Generated INSERT"
        );
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArithmeticOp, ComparisonOp, IsValue, JoinKind};
    use crate::schema::Entity;
    use crate::testing::{Vehicle, Zone};

    fn column(property: &'static str) -> Expr {
        Expr::Column(ColumnRef {
            table: Vehicle::table().table_ref(),
            property,
        })
    }

    fn int(n: i64) -> Expr {
        Expr::Value(SqlValue::Int(n))
    }

    fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Expr {
        Expr::Comparison {
            op,
            left: left.boxed(),
            right: right.boxed(),
        }
    }

    fn generate(expr: &Expr) -> Fragment {
        Postgres::new().expression(expr).unwrap()
    }

    #[test]
    fn test_nested_arithmetic() {
        let sum = Expr::Arithmetic {
            op: ArithmeticOp::Plus,
            left: Expr::Arithmetic {
                op: ArithmeticOp::Plus,
                left: column("distance").boxed(),
                right: int(100).boxed(),
            }
            .boxed(),
            right: int(300).boxed(),
        };
        let fragment = generate(&compare(ComparisonOp::Lte, sum, int(100)));
        assert_eq!(
            fragment.sql,
            r#"((("vehicle"."distance" + ?) + ?) <= ?)"#
        );
        assert_eq!(
            fragment.values,
            vec![SqlValue::Int(100), SqlValue::Int(300), SqlValue::Int(100)]
        );
    }

    #[test]
    fn test_empty_in_keeps_column_reference() {
        let fragment = generate(&Expr::In {
            expr: column("id").boxed(),
            candidates: vec![],
            negated: false,
        });
        assert_eq!(fragment.sql, r#"((("vehicle"."id") = NULL) IS NOT NULL)"#);
        assert!(fragment.values.is_empty());

        let fragment = generate(&Expr::In {
            expr: column("id").boxed(),
            candidates: vec![],
            negated: true,
        });
        assert_eq!(fragment.sql, r#"((("vehicle"."id") = NULL) IS NULL)"#);
    }

    #[test]
    fn test_in_binds_candidates_in_order() {
        let fragment = generate(&Expr::In {
            expr: column("distance").boxed(),
            candidates: vec![int(1), int(2)],
            negated: true,
        });
        assert_eq!(fragment.sql, r#"("vehicle"."distance" NOT IN (?, ?))"#);
        assert_eq!(fragment.values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_null_value_is_inlined() {
        let fragment = generate(&compare(
            ComparisonOp::Eq,
            column("distance"),
            Expr::Value(SqlValue::Null),
        ));
        assert_eq!(fragment.sql, r#"("vehicle"."distance" = NULL)"#);
        assert!(fragment.values.is_empty());
    }

    #[test]
    fn test_is_and_empty() {
        let fragment = generate(&Expr::Is {
            expr: column("distance").boxed(),
            value: IsValue::Null,
            negated: true,
        });
        assert_eq!(fragment.sql, r#"("vehicle"."distance" IS NOT NULL)"#);

        let fragment = generate(&Expr::Empty {
            expr: column("id").boxed(),
            negated: false,
        });
        assert_eq!(fragment.sql, r#"("vehicle"."id" = '{}')"#);
    }

    #[test]
    fn test_constructor_doubles_quotes() {
        let fragment = generate(&Expr::Constructor {
            type_name: String::from("interval"),
            value: String::from("it's"),
        });
        assert_eq!(fragment.sql, "interval 'it''s'");
        assert!(fragment.values.is_empty());
    }

    #[test]
    fn test_empty_conjunction_is_true() {
        assert_eq!(generate(&Expr::And(vec![])).sql, "TRUE");
        assert_eq!(generate(&Expr::Or(vec![])).sql, "FALSE");
    }

    #[test]
    fn test_case_without_branches_fails() {
        let err = Postgres::new()
            .expression(&Expr::Case {
                branches: vec![],
                fallback: None,
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "There must be at least one WHEN THEN statement in a CASE block"
        );
    }

    #[test]
    fn test_time_zone_literal_is_validated() {
        let at = |zone: &str| Expr::AtTimeZone {
            time: column("id").boxed(),
            zone: Expr::Value(SqlValue::Text(zone.to_string())).boxed(),
        };
        let fragment = generate(&at("Europe/Paris"));
        assert_eq!(fragment.sql, r#"("vehicle"."id" AT TIME ZONE ?)"#);

        let err = Postgres::new().expression(&at("Mars/Olympus")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "'Mars/Olympus' is not a valid time zone");
    }

    #[test]
    fn test_adapted_time_zone_literal_is_validated() {
        let adapted = Expr::AtTimeZone {
            time: column("id").boxed(),
            zone: Expr::NotNull(
                Expr::Nullable(Expr::Value(SqlValue::Text(String::from("Mars/Olympus"))).boxed())
                    .boxed(),
            )
            .boxed(),
        };
        let err = Postgres::new().expression(&adapted).unwrap_err();
        assert_eq!(err.to_string(), "'Mars/Olympus' is not a valid time zone");
    }

    #[test]
    fn test_join_requires_on_or_using() {
        let zones = Query {
            from: vec![From::Table(Zone::table().table_ref())],
            ..Query::default()
        };
        let query = Query {
            from: vec![
                From::Table(Vehicle::table().table_ref()),
                From::Join(Join {
                    query: Box::new(zones),
                    kind: JoinKind::Left,
                    into_field: None,
                    on: None,
                    using: None,
                    alias: None,
                }),
            ],
            projections: vec![Projection::new(Expr::All(None))],
            ..Query::default()
        };
        let err = Postgres::new().select(&query).unwrap_err();
        assert_eq!(err.to_string(), "using or on required for join");
    }

    #[test]
    fn test_random_suppresses_order() {
        let query = Query {
            projections: vec![Projection::new(column("id"))],
            from: vec![From::Table(Vehicle::table().table_ref())],
            order: Some(vec![Order::Expression {
                expression: int(3),
                descending: false,
                nulls: None,
            }]),
            random: true,
            ..Query::default()
        };
        let statement = Postgres::new().select(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT "vehicle"."id" FROM "vehicle" ORDER BY RANDOM()"#
        );
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let expr = compare(ComparisonOp::Gt, column("distance"), int(5));
        assert_eq!(generate(&expr), generate(&expr));
    }
}
