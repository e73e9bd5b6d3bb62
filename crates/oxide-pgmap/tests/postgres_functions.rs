//! Operator and function rendering.
//!
//! Expressions are lowered on their own through `Dialect::expression`, except
//! aggregates, which only exist inside a SELECT.

mod common;

use common::*;
use oxide_pgmap::prelude::*;
use oxide_pgmap::value::SqlArray;
use serde_json::json;

fn render<R>(expr: TypedExpr<R>) -> Fragment {
    init_tracing();
    Postgres::new().expression(&expr.into_expr()).unwrap()
}

fn int(n: i64) -> SqlValue {
    SqlValue::Int(n)
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn text_array(items: &[&str]) -> SqlValue {
    SqlValue::Array(SqlArray {
        element_type: "text",
        items: items.iter().copied().map(text).collect(),
    })
}

// =============================================================================
// Text
// =============================================================================

#[test]
fn test_pattern_operators() {
    let ilike = render(Zone::name().ilike("north%"));
    assert_eq!(ilike.sql, r#"("zones"."name" ILIKE ?)"#);
    assert_eq!(ilike.values, vec![text("north%")]);

    assert_eq!(
        render(Zone::name().not_like("x%")).sql,
        r#"("zones"."name" NOT LIKE ?)"#
    );
    assert_eq!(
        render(Zone::name().matches("^[a-z]+$")).sql,
        r#"("zones"."name" ~ ?)"#
    );
    assert_eq!(
        render(Zone::name().not_matches("^x")).sql,
        r#"("zones"."name" !~ ?)"#
    );
}

#[test]
fn test_text_functions() {
    let lowered = render(Zone::name().lower().like("n%"));
    assert_eq!(lowered.sql, r#"(lower("zones"."name") LIKE ?)"#);
    assert_eq!(lowered.values, vec![text("n%")]);

    assert_eq!(render(Zone::name().upper()).sql, r#"upper("zones"."name")"#);
    assert_eq!(
        render(Zone::name().char_length().gt(3)).sql,
        r#"(char_length("zones"."name") > ?)"#
    );
    assert_eq!(render(Task::id().text()).sql, r#"text("task"."id")"#);
}

#[test]
fn test_casts() {
    assert_eq!(
        render(Zone::name().cast_int()).sql,
        r#"("zones"."name")::INT"#
    );
    assert_eq!(
        render(Zone::name().cast::<String>("varchar(8)")).sql,
        r#"("zones"."name")::varchar(8)"#
    );
}

// =============================================================================
// Arrays
// =============================================================================

#[test]
fn test_array_operators_bind_typed_arrays() {
    let contains = render(Board::tags().contains(vec![String::from("urgent")]));
    assert_eq!(contains.sql, r#"("board"."tags" @> ?)"#);
    assert_eq!(contains.values, vec![text_array(&["urgent"])]);

    let overlaps = render(Board::tags().overlaps(array(vec![
        String::from("a"),
        String::from("b"),
    ])));
    assert_eq!(overlaps.sql, r#"("board"."tags" && ?)"#);
    assert_eq!(overlaps.values, vec![text_array(&["a", "b"])]);

    assert_eq!(
        render(Board::tags().contained_by(Vec::<String>::new())).sql,
        r#"("board"."tags" <@ ?)"#
    );
}

// =============================================================================
// Arithmetic and dates
// =============================================================================

#[test]
fn test_arithmetic_operators() {
    assert_eq!(
        render(Vehicle::distance().modulo(7)).sql,
        r#"("vehicle"."distance" % ?)"#
    );
    assert_eq!(
        render(Vehicle::distance().pow(2)).sql,
        r#"("vehicle"."distance" ^ ?)"#
    );

    let mixed = render(Vehicle::distance() * 2 - Vehicle::range());
    assert_eq!(
        mixed.sql,
        r#"(("vehicle"."distance" * ?) - "vehicle"."range")"#
    );
    assert_eq!(mixed.values, vec![int(2)]);
}

#[test]
fn test_date_truncation() {
    let by_name = render(Vehicle::created_at().date_trunc("hour"));
    assert_eq!(by_name.sql, r#"date_trunc(?, "vehicle"."created_at")"#);
    assert_eq!(by_name.values, vec![text("hour")]);

    let by_interval = render(Vehicle::created_at().date_trunc_to(interval("15 minutes")));
    assert_eq!(
        by_interval.sql,
        r#"date_trunc(interval '15 minutes', "vehicle"."created_at")"#
    );
    assert!(by_interval.values.is_empty());
}

#[test]
fn test_scaled_interval() {
    let shifted = render(Vehicle::created_at().plus_interval(interval("1 hour").scale(3)));
    assert_eq!(
        shifted.sql,
        r#"("vehicle"."created_at" + (interval '1 hour' * ?))"#
    );
    assert_eq!(shifted.values, vec![int(3)]);
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn test_variadic_functions() {
    let fallback = render(coalesce([
        Vehicle::zone_id().into_typed(),
        literal(0_i64).nullable(),
    ]));
    assert_eq!(fallback.sql, r#"coalesce("vehicle"."zone_id", ?)"#);
    assert_eq!(fallback.values, vec![int(0)]);

    assert_eq!(
        render(least([
            Vehicle::distance().into_typed(),
            Vehicle::range().into_typed(),
        ]))
        .sql,
        r#"least("vehicle"."distance", "vehicle"."range")"#
    );
    assert_eq!(
        render(greatest([Vehicle::range().into_typed(), literal(10)])).sql,
        r#"greatest("vehicle"."range", ?)"#
    );
}

#[test]
fn test_null_adapters_render_transparently() {
    let fragment = render(Vehicle::zone_id().not_null().eq(3_i64));
    assert_eq!(fragment.sql, r#"("vehicle"."zone_id" = ?)"#);
    assert_eq!(fragment.values, vec![int(3)]);
}

#[test]
fn test_case_expressions() {
    let labelled = render(case_or::<String, _, _>(
        [Vehicle::locked().is_true().then("locked")],
        "free",
    ));
    assert_eq!(
        labelled.sql,
        r#"CASE WHEN ("vehicle"."locked" IS TRUE) THEN ? ELSE ? END"#
    );
    assert_eq!(labelled.values, vec![text("locked"), text("free")]);

    let open = render(case::<i32, _>([Vehicle::distance().gt(100).then(1)], None));
    assert_eq!(open.sql, r#"CASE WHEN ("vehicle"."distance" > ?) THEN ? END"#);
    assert_eq!(open.values, vec![int(100), int(1)]);
}

#[test]
fn test_case_without_branches_fails() {
    let expr = case::<i32, _>(Vec::new(), None).into_expr();
    let err = Postgres::new().expression(&expr).unwrap_err();
    assert!(matches!(err, Error::Construction(_)));
    assert_eq!(
        err.to_string(),
        "There must be at least one WHEN THEN statement in a CASE block"
    );
}

// =============================================================================
// JSON
// =============================================================================

#[test]
fn test_json_access() {
    let raw = render(VehicleTrack::payload().json_get("speed"));
    assert_eq!(raw.sql, r#""vehicle_track"."payload" -> ?"#);
    assert_eq!(raw.values, vec![text("speed")]);

    let compared = render(VehicleTrack::payload().json_get_text("mode").eq("fast"));
    assert_eq!(
        compared.sql,
        r#"("vehicle_track"."payload" ->> ? = ?)"#
    );
    assert_eq!(compared.values, vec![text("mode"), text("fast")]);
}

#[test]
fn test_json_concatenation() {
    let built = render(VehicleTrack::payload().concat(jsonb_build_object([(
        "source",
        literal("gps").into_expr(),
    )])));
    assert_eq!(
        built.sql,
        r#""vehicle_track"."payload" || jsonb_build_object('source', ?)"#
    );
    assert_eq!(built.values, vec![text("gps")]);

    let map = json!({"speed": 12}).as_object().cloned().unwrap();
    let merged = render(VehicleTrack::payload().concat_map(map));
    assert_eq!(
        merged.sql,
        r#""vehicle_track"."payload" || jsonb_build_object('speed', ?)"#
    );
    assert_eq!(merged.values, vec![int(12)]);
}

#[test]
fn test_row_to_json() {
    assert_eq!(
        render(row_to_json_table::<Zone>()).sql,
        r#"row_to_json("zones")"#
    );
    assert_eq!(
        render(row_to_json(&Zone::aliased("z"))).sql,
        r#"row_to_json("z")"#
    );
    assert_eq!(
        render(VehicleTrack::payload().json_get("trip").jsonb()).sql,
        r#"("vehicle_track"."payload" -> ?)::jsonb"#
    );
}

// =============================================================================
// PostGIS
// =============================================================================

#[test]
fn test_spatial_predicates() {
    let point = Geometry::point(2.35, 48.85);

    let contains = render(Corral::boundary().contains_geometry(point.clone()));
    assert_eq!(contains.sql, r#"st_contains("corral"."geom", ?)"#);
    assert_eq!(contains.values, vec![text("SRID=4326;POINT(2.35 48.85)")]);

    let near = render(Corral::boundary().within_distance(point, 50.0));
    assert_eq!(near.sql, r#"st_dwithin("corral"."geom", ?, ?)"#);
    assert_eq!(near.values[1], SqlValue::Float(50.0));
}

#[test]
fn test_spatial_measures() {
    let area = render(Corral::boundary().buffer(10.0).area());
    assert_eq!(area.sql, r#"st_area(st_buffer("corral"."geom", ?))"#);
    assert_eq!(area.values, vec![SqlValue::Float(10.0)]);

    assert_eq!(
        render(as_geo_json(Corral::boundary())).sql,
        r#"ST_AsGeoJson("corral"."geom")"#
    );
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn test_unnested_cluster_aggregate() {
    init_tracing();
    let query = Corral::table().select_aggregates([Corral::boundary()
        .cluster_within(25.0)
        .unnest()
        .project_as("cluster")]);
    let statement = Postgres::new().select(&query).unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT unnest(st_clusterwithin("corral"."geom", ?)) AS cluster FROM "corral""#
    );
    assert_eq!(statement.values, vec![SqlValue::Float(25.0)]);
}

#[test]
fn test_numeric_aggregates() {
    init_tracing();
    let query = Vehicle::table().select_aggregates([
        Vehicle::distance().avg(),
        Vehicle::range().max().project_as("widest"),
    ]);
    let statement = Postgres::new().select(&query).unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT avg("vehicle"."distance"), max("vehicle"."range") AS widest FROM "vehicle""#
    );
    assert!(statement.values.is_empty());
}
