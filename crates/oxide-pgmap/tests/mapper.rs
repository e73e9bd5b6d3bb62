//! Row mapping against in-memory result tables.

mod common;

use std::sync::Arc;

use common::*;
use oxide_pgmap::mapper::{ColumnCodec, ResultRow};
use oxide_pgmap::prelude::*;
use oxide_pgmap::{MapperConfig, MatcherKind};
use serde_json::json;

fn names() -> Arc<NameResolver> {
    Arc::new(NameResolver::new())
}

fn mappers() -> Mappers {
    init_tracing();
    Mappers::new(MappingContext::new(names()))
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn zone_join() -> TypedExpr<bool> {
    Zone::id().nullable().eq(Vehicle::zone_id())
}

fn vehicles_with_zones() -> oxide_pgmap::dialect::SelectStatement {
    let zones = Zone::table()
        .select_all()
        .into_field(Vehicle::zone())
        .on(zone_join());
    Postgres::new()
        .select(&Vehicle::table().select_all().left_join(zones))
        .unwrap()
}

fn joined_columns() -> Vec<&'static str> {
    let mut columns = vehicle_columns().to_vec();
    columns.extend(["start:zone", "id", "name", "end:zone"]);
    columns
}

// =============================================================================
// Plain records
// =============================================================================

#[test]
fn test_map_rows() {
    let expected = vec![vehicle(1), Vehicle { locked: true, ..vehicle(2) }];
    let vehicles: Vec<Vehicle> = mappers().map_rows(&vehicle_table(&expected)).unwrap();
    assert_eq!(vehicles, expected);
}

#[test]
fn test_labels_match_ignoring_case_and_underscores() {
    let table = ResultTable::new(["ID", "Distance", "RANGE", "locked", "createdAt", "ZONE_ID"])
        .with_row(vehicle_row(&vehicle(4)));
    let vehicles: Vec<Vehicle> = mappers().map_rows(&table).unwrap();
    assert_eq!(vehicles, vec![vehicle(4)]);
}

#[test]
fn test_missing_nullable_column_reads_as_none() {
    let table = ResultTable::new(["id", "distance", "range", "locked", "created_at"]).with_row(
        vec![
            SqlValue::Int(9),
            SqlValue::Int(120),
            SqlValue::Int(40),
            SqlValue::Bool(false),
            SqlValue::Timestamp(at(8)),
        ],
    );
    let vehicles: Vec<Vehicle> = mappers().map_rows(&table).unwrap();
    assert_eq!(vehicles, vec![vehicle(9)]);
}

#[test]
fn test_missing_required_column_names_entity() {
    let table = ResultTable::new(["id"]).with_row(vec![SqlValue::Int(1)]);
    let err = mappers().map_rows::<Zone>(&table).unwrap_err();
    assert!(matches!(err, Error::Mapping { ref entity, .. } if entity == "Zone"));
    assert_eq!(
        err.to_string(),
        "Error constructing Zone: missing value for parameter name"
    );
}

#[test]
fn test_undecodable_cell_is_mapping_error() {
    let table = ResultTable::new(["id", "name"]).with_row(vec![text("seven"), text("Harbour")]);
    let err = mappers().map_rows::<Zone>(&table).unwrap_err();
    assert!(matches!(err, Error::Mapping { ref entity, .. } if entity == "Zone"));
}

#[test]
fn test_mutable_property_is_assigned_after_construction() {
    let table = ResultTable::new(["id", "title", "tags", "archived"]).with_row(vec![
        SqlValue::Int(1),
        text("Spring fleet"),
        vec![String::from("north"), String::from("ebike")].to_sql_value(),
        SqlValue::Bool(true),
    ]);
    let boards: Vec<Board> = mappers().map_rows(&table).unwrap();
    assert_eq!(
        boards,
        vec![Board {
            id: 1,
            title: String::from("Spring fleet"),
            tags: vec![String::from("north"), String::from("ebike")],
            archived: true,
        }]
    );
}

#[test]
fn test_unassigned_mutable_property_keeps_default() {
    let table = ResultTable::new(["id", "title", "tags"]).with_row(vec![
        SqlValue::Int(2),
        text("Archive"),
        Vec::<String>::new().to_sql_value(),
    ]);
    let boards: Vec<Board> = mappers().map_rows(&table).unwrap();
    assert!(!boards[0].archived);
    assert!(boards[0].tags.is_empty());
}

#[test]
fn test_column_name_override() {
    let table = ResultTable::new(["id", "geom"])
        .with_row(vec![SqlValue::Int(3), Geometry::point(2.35, 48.85).to_sql_value()]);
    let corrals: Vec<Corral> = mappers().map_rows(&table).unwrap();
    assert_eq!(corrals[0].boundary, Geometry::point(2.35, 48.85));
}

#[test]
fn test_default_parameter_may_be_absent() {
    let table = ResultTable::new(["id", "name", "status"])
        .with_row(vec![SqlValue::Int(1), text("Ada"), text("Active")]);
    let users: Vec<User> = mappers().map_rows(&table).unwrap();
    assert_eq!(
        users,
        vec![User {
            id: 1,
            name: String::from("Ada"),
            nickname: None,
            status: UserStatus::Active,
        }]
    );

    let table = ResultTable::new(["id", "name", "nickname", "status"]).with_row(vec![
        SqlValue::Int(2),
        text("Grace"),
        text("amazing"),
        text("Suspended"),
    ]);
    let users: Vec<User> = mappers().map_rows(&table).unwrap();
    assert_eq!(users[0].nickname.as_deref(), Some("amazing"));
    assert_eq!(users[0].status, UserStatus::Suspended);
}

// =============================================================================
// Enumerations and codecs
// =============================================================================

#[test]
fn test_enumeration_rows() {
    let table = ResultTable::new(["status"])
        .with_row(vec![text("Active")])
        .with_row(vec![text("Suspended")]);
    let statuses: Vec<UserStatus> = mappers().map_rows(&table).unwrap();
    assert_eq!(statuses, vec![UserStatus::Active, UserStatus::Suspended]);
}

#[test]
fn test_unknown_variant() {
    let table = ResultTable::new(["status"]).with_row(vec![text("Dormant")]);
    let err = mappers().map_rows::<UserStatus>(&table).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error constructing UserStatus: unknown variant Dormant"
    );

    let table = ResultTable::new(["status"]).with_row(vec![SqlValue::Int(1)]);
    let err = mappers().map_rows::<UserStatus>(&table).unwrap_err();
    assert!(matches!(err, Error::Mapping { ref entity, .. } if entity == "UserStatus"));
}

#[test]
fn test_json_text_is_parsed() {
    let table = ResultTable::new(["id", "vehicle_id", "payload"]).with_row(vec![
        SqlValue::Int(1),
        SqlValue::Int(7),
        text(r#"{"lat": 48.85, "lon": 2.35}"#),
    ]);
    let tracks: Vec<VehicleTrack> = mappers().map_rows(&table).unwrap();
    assert_eq!(tracks[0].payload, Jsonb(json!({"lat": 48.85, "lon": 2.35})));
}

#[derive(Debug)]
struct Shouting;

impl ColumnCodec for Shouting {
    fn decode(&self, row: &dyn ResultRow, position: usize) -> Result<SqlValue> {
        Ok(match row.get(position) {
            Some(SqlValue::Text(text)) => SqlValue::Text(text.to_uppercase()),
            other => other.cloned().unwrap_or(SqlValue::Null),
        })
    }
}

#[test]
fn test_registered_codec_applies_to_rust_type() {
    let context = MappingContext::new(names()).with_codec("String", Arc::new(Shouting));
    let table = ResultTable::new(["id", "name"]).with_row(vec![SqlValue::Int(1), text("harbour")]);
    let zones: Vec<Zone> = Mappers::new(context).map_rows(&table).unwrap();
    assert_eq!(zones[0].name, "HARBOUR");
    assert_eq!(zones[0].id, 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_exact_matching_from_config() {
    let config = MapperConfig::from_json(r#"{"column_name_matchers": ["exact"]}"#).unwrap();
    assert_eq!(config.column_name_matchers, vec![MatcherKind::Exact]);
    let mappers = Mappers::new(config.context(names()));

    let upper = ResultTable::new(["ID", "name"]).with_row(vec![SqlValue::Int(1), text("Harbour")]);
    let err = mappers.map_rows::<Zone>(&upper).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error constructing Zone: missing value for parameter id"
    );

    let exact = ResultTable::new(["id", "name"]).with_row(vec![SqlValue::Int(1), text("Harbour")]);
    assert_eq!(mappers.map_rows::<Zone>(&exact).unwrap().len(), 1);
}

// =============================================================================
// Joins
// =============================================================================

#[test]
fn test_left_join_without_match_is_none() {
    let statement = vehicles_with_zones();
    let mut row = vehicle_row(&vehicle(1));
    row.extend([SqlValue::Null, SqlValue::Null, SqlValue::Null, SqlValue::Null]);
    let table = ResultTable::new(joined_columns()).with_row(row);

    let vehicles: Vec<Vehicle> = mappers().map_query(&statement, &table).unwrap();
    assert_eq!(vehicles, vec![vehicle(1)]);
}

#[test]
fn test_left_join_with_match_is_populated() {
    let statement = vehicles_with_zones();
    let parked = Vehicle {
        zone_id: Some(30),
        ..vehicle(2)
    };
    let mut row = vehicle_row(&parked);
    row.extend([SqlValue::Null, SqlValue::Int(30), text("Harbour"), SqlValue::Null]);
    let table = ResultTable::new(joined_columns()).with_row(row);

    let vehicles: Vec<Vehicle> = mappers().map_query(&statement, &table).unwrap();
    assert_eq!(
        vehicles[0].zone,
        Some(Zone {
            id: 30,
            name: String::from("Harbour"),
        })
    );
    // The joined `id` never leaks into the outer entity.
    assert_eq!(vehicles[0].id, 2);
}

#[test]
fn test_missing_sentinels_fail() {
    let statement = vehicles_with_zones();
    let table = vehicle_table(&[vehicle(1)]);
    let err = mappers().map_query::<Vehicle>(&statement, &table).unwrap_err();
    assert!(matches!(err, Error::Mapping { ref entity, .. } if entity == "Vehicle"));
}

#[test]
fn test_join_mappers_are_not_cached() {
    let mappers = mappers();
    let statement = vehicles_with_zones();
    let first = mappers.resolve_for_query(Vehicle::descriptor(), Some(&statement.query));
    let second = mappers.resolve_for_query(Vehicle::descriptor(), Some(&statement.query));
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_update_returning_into() {
    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_tables([Zone::table().table_ref()])
        .where_clause(zone_join())
        .returning([Vehicle::table().project_all()])
        .returning_into(Vehicle::zone());
    let statement = Postgres::new().update(&update).unwrap();

    let locked = Vehicle {
        locked: true,
        zone_id: Some(5),
        ..vehicle(3)
    };
    let mut row = vehicle_row(&locked);
    row.extend([SqlValue::Null, SqlValue::Int(5), text("Depot"), SqlValue::Null]);
    let table = ResultTable::new(joined_columns()).with_row(row);

    let vehicles: Vec<Vehicle> = mappers().map_update(&statement, &table).unwrap();
    assert_eq!(
        vehicles,
        vec![Vehicle {
            zone: Some(Zone {
                id: 5,
                name: String::from("Depot"),
            }),
            ..locked
        }]
    );
}

#[test]
fn test_plain_update_returning() {
    let update = Zone::table()
        .update()
        .set(Zone::name(), "Depot")
        .where_clause(Zone::id().eq(5_i64))
        .returning_all();
    let statement = Postgres::new().update(&update).unwrap();
    let table = ResultTable::new(["id", "name"]).with_row(vec![SqlValue::Int(5), text("Depot")]);
    let zones: Vec<Zone> = mappers().map_update(&statement, &table).unwrap();
    assert_eq!(zones[0].name, "Depot");
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_shared_mappers_across_threads() {
    let mappers = mappers();
    let expected: Vec<Vehicle> = (1..=20).map(vehicle).collect();
    let table = vehicle_table(&expected);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| mappers.map_rows::<Vehicle>(&table).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
