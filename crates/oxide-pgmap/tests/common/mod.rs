#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oxide_pgmap::mapper::ResultTable;
use oxide_pgmap::value::{Geometry, Jsonb, SqlValue};
use oxide_pgmap_derive::Entity;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Vehicle {
    pub id: i64,
    pub distance: i32,
    pub range: i32,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub zone_id: Option<i64>,
    #[column(transient)]
    pub zone: Option<Zone>,
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
#[table(name = "zones")]
pub struct Zone {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Board {
    pub id: i64,
    pub title: String,
    pub tags: Vec<String>,
    #[column(mutable)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Corral {
    pub id: i64,
    #[column(name = "geom")]
    pub boundary: Geometry,
}

#[derive(Debug, Clone, PartialEq, Entity)]
#[table(name = "invitations")]
pub struct Invite {
    pub id: i64,
    pub code: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Ride {
    pub id: i64,
    pub vehicle_id: i64,
    pub started_at: DateTime<Utc>,
    #[column(transient)]
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Entity)]
pub enum UserStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Entity)]
#[table(name = "users")]
pub struct User {
    pub id: i64,
    pub name: String,
    #[column(default)]
    pub nickname: Option<String>,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct VehicleTrack {
    pub id: i64,
    pub vehicle_id: i64,
    pub payload: Jsonb,
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn vehicle(id: i64) -> Vehicle {
    Vehicle {
        id,
        distance: 120,
        range: 40,
        locked: false,
        created_at: at(8),
        zone_id: None,
        zone: None,
    }
}

pub fn vehicle_columns() -> [&'static str; 6] {
    ["id", "distance", "range", "locked", "created_at", "zone_id"]
}

pub fn vehicle_row(vehicle: &Vehicle) -> Vec<SqlValue> {
    vec![
        SqlValue::Int(vehicle.id),
        SqlValue::Int(i64::from(vehicle.distance)),
        SqlValue::Int(i64::from(vehicle.range)),
        SqlValue::Bool(vehicle.locked),
        SqlValue::Timestamp(vehicle.created_at),
        vehicle.zone_id.map_or(SqlValue::Null, SqlValue::Int),
    ]
}

pub fn vehicle_table(vehicles: &[Vehicle]) -> ResultTable {
    vehicles
        .iter()
        .fold(ResultTable::new(vehicle_columns()), |table, vehicle| {
            table.with_row(vehicle_row(vehicle))
        })
}

/// Installs a debug-level subscriber writing through the test harness.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
