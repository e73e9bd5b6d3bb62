//! UPDATE, INSERT and DELETE generation through the typed builder.

mod common;

use common::*;
use oxide_pgmap::ast::{ColumnRef, Update, UpdateFrom};
use oxide_pgmap::prelude::*;

fn postgres() -> Postgres {
    init_tracing();
    Postgres::new()
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn invite(id: i64, code: &str) -> Invite {
    Invite {
        id,
        code: code.to_string(),
        email: format!("{code}@example.com"),
    }
}

// =============================================================================
// UPDATE
// =============================================================================

#[test]
fn test_update_assignments_in_order() {
    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .set(Vehicle::range(), 50)
        .where_clause(Vehicle::id().eq(7_i64));
    let statement = postgres().update(&update).unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "vehicle" SET "locked" = ?, "range" = ? WHERE ("vehicle"."id" = ?)"#
    );
    assert_eq!(
        statement.values,
        vec![SqlValue::Bool(true), SqlValue::Int(50), SqlValue::Int(7)]
    );
}

#[test]
fn test_update_none_renders_null_and_set_if_some_skips() {
    let postgres = postgres();
    let cleared = Vehicle::table()
        .update()
        .set(Vehicle::zone_id(), None::<i64>)
        .all();
    let statement = postgres.update(&cleared).unwrap();
    assert_eq!(statement.sql, r#"UPDATE "vehicle" SET "zone_id" = NULL"#);
    assert!(statement.values.is_empty());

    let partial = Vehicle::table()
        .update()
        .set(Vehicle::locked(), false)
        .set_if_some(Vehicle::range(), None::<i32>)
        .set_if_some(Vehicle::distance(), Some(80))
        .all();
    let statement = postgres.update(&partial).unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "vehicle" SET "locked" = ?, "distance" = ?"#
    );
    assert_eq!(statement.values, vec![SqlValue::Bool(false), SqlValue::Int(80)]);
}

#[test]
fn test_update_from_tables_uses_names_only() {
    let z = Zone::aliased("z");
    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_tables([z.table_ref()])
        .where_clause(Zone::id().nullable().eq(Vehicle::zone_id()));
    assert_eq!(
        postgres().update(&update).unwrap().sql,
        r#"UPDATE "vehicle" SET "locked" = ? FROM "zones" WHERE ("zones"."id" = "vehicle"."zone_id")"#
    );
}

#[test]
fn test_update_from_aliased_tables() {
    let z = Zone::aliased("z");
    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_aliased([z.table_ref()])
        .where_clause(
            z.col(Zone::id())
                .nullable()
                .eq(Vehicle::zone_id())
                .and(z.col(Zone::name()).eq("Harbour")),
        );
    let statement = postgres().update(&update).unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "vehicle" SET "locked" = ? FROM "zones" "z" WHERE (("z"."id" = "vehicle"."zone_id") AND ("z"."name" = ?))"#
    );
    assert_eq!(statement.values, vec![SqlValue::Bool(true), text("Harbour")]);
}

#[test]
fn test_update_from_sub_query_binds_set_from_where() {
    let postgres = postgres();
    let recent = Ride::table()
        .select_all()
        .where_clause(Ride::started_at().gt(at(6)));

    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_query(recent.clone(), "recent")
        .where_clause(Vehicle::distance().gt(10));
    let statement = postgres.update(&update).unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "vehicle" SET "locked" = ? FROM (SELECT "ride".* FROM "ride" WHERE ("ride"."started_at" > ?)) "recent" WHERE ("vehicle"."distance" > ?)"#
    );
    assert_eq!(
        statement.values,
        vec![
            SqlValue::Bool(true),
            SqlValue::Timestamp(at(6)),
            SqlValue::Int(10)
        ]
    );

    let ignored = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_query_ignored_alias(recent)
        .all();
    assert_eq!(
        postgres.update(&ignored).unwrap().sql,
        r#"UPDATE "vehicle" SET "locked" = ? FROM (SELECT "ride".* FROM "ride" WHERE ("ride"."started_at" > ?)) "autogenerated_alias""#
    );
}

#[test]
fn test_update_returning_into_adds_sentinels() {
    let update = Vehicle::table()
        .update()
        .set(Vehicle::locked(), true)
        .from_tables([Zone::table().table_ref()])
        .where_clause(Zone::id().nullable().eq(Vehicle::zone_id()))
        .returning([Vehicle::table().project_all()])
        .returning_into(Vehicle::zone());
    let statement = postgres().update(&update).unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "vehicle" SET "locked" = ? FROM "zones" WHERE ("zones"."id" = "vehicle"."zone_id") RETURNING "vehicle".*, NULL AS "start:zone", "zones".*, NULL AS "end:zone""#
    );
    assert_eq!(statement.update, update);
}

#[test]
fn test_update_returning_all() {
    let update = Vehicle::table()
        .update()
        .set(Vehicle::range(), 10)
        .all()
        .returning_all();
    assert_eq!(
        postgres().update(&update).unwrap().sql,
        r#"UPDATE "vehicle" SET "range" = ? RETURNING *"#
    );
}

#[test]
fn test_update_without_fields_fails() {
    // The builder cannot produce this; only a hand-built statement can.
    let update = Update {
        table: Vehicle::table().table_ref(),
        fields: vec![],
        where_clause: None,
        from: UpdateFrom::None,
        into_fields: vec![],
        projections: None,
    };
    let err = postgres().update(&update).unwrap_err();
    assert!(matches!(err, Error::Construction(_)));
    assert_eq!(err.to_string(), "cannot update without fields");
}

// =============================================================================
// INSERT
// =============================================================================

#[test]
fn test_insert_values_bind_per_row() {
    let insert = Invite::table()
        .insert()
        .all_columns()
        .values([invite(1, "alpha"), invite(2, "beta")]);
    let statement = postgres().insert(&insert).unwrap();
    assert_eq!(
        statement.sql,
        r#"INSERT INTO "invitations" ("id", "code", "email") VALUES (#invitations0.id, #invitations0.code, #invitations0.email), (#invitations1.id, #invitations1.code, #invitations1.email)"#
    );
    assert_eq!(statement.prefix, "invitations");

    let bound = statement.bind().unwrap();
    assert_eq!(
        bound.sql,
        r#"INSERT INTO "invitations" ("id", "code", "email") VALUES (?, ?, ?), (?, ?, ?)"#
    );
    assert_eq!(
        bound.values,
        vec![
            SqlValue::Int(1),
            text("alpha"),
            text("alpha@example.com"),
            SqlValue::Int(2),
            text("beta"),
            text("beta@example.com"),
        ]
    );
}

#[test]
fn test_insert_skips_transient_columns() {
    let insert = Vehicle::table().insert().all_columns().values([vehicle(1)]);
    let statement = postgres().insert(&insert).unwrap();
    assert!(statement.sql.starts_with(
        r#"INSERT INTO "vehicle" ("id", "distance", "range", "locked", "created_at", "zone_id") VALUES "#
    ));
    let bound = statement.bind().unwrap();
    assert_eq!(bound.values, vehicle_row(&vehicle(1)));
}

#[test]
fn test_insert_conflict_precedes_returning() {
    let insert = Invite::table()
        .insert()
        .column(Invite::id())
        .column(Invite::code())
        .values([invite(1, "alpha")])
        .returning([Invite::id().project()])
        .on_conflict([Invite::id().column_ref()])
        .do_update([Invite::code().column_ref()]);
    let bound = postgres().insert(&insert).unwrap().bind().unwrap();
    assert_eq!(
        bound.sql,
        r#"INSERT INTO "invitations" ("id", "code") VALUES (?, ?) ON CONFLICT ("id") DO UPDATE SET "code" = EXCLUDED."code" RETURNING "invitations"."id""#
    );
    assert_eq!(bound.values, vec![SqlValue::Int(1), text("alpha")]);
}

#[test]
fn test_insert_conflict_keeps_declared_order() {
    let insert = Invite::table()
        .insert()
        .all_columns()
        .values([invite(1, "alpha")])
        .on_conflict([Invite::email().column_ref(), Invite::id().column_ref()])
        .do_update([Invite::email().column_ref(), Invite::code().column_ref()]);
    let bound = postgres().insert(&insert).unwrap().bind().unwrap();
    assert_eq!(
        bound.sql,
        r#"INSERT INTO "invitations" ("id", "code", "email") VALUES (?, ?, ?) ON CONFLICT ("email", "id") DO UPDATE SET "email" = EXCLUDED."email", "code" = EXCLUDED."code""#
    );
    assert_eq!(
        bound.values,
        vec![
            SqlValue::Int(1),
            text("alpha"),
            text("alpha@example.com")
        ]
    );
}

#[test]
fn test_insert_conflict_do_nothing_without_targets() {
    let insert = Invite::table()
        .insert()
        .column(Invite::code())
        .values([invite(1, "alpha")])
        .on_conflict(Vec::<ColumnRef>::new())
        .do_nothing();
    assert_eq!(
        postgres().insert(&insert).unwrap().bind().unwrap().sql,
        r#"INSERT INTO "invitations" ("code") VALUES (?) ON CONFLICT DO NOTHING"#
    );
}

#[test]
fn test_insert_from_query() {
    let source = Invite::table()
        .select([Invite::id().project(), Invite::code().project()])
        .where_clause(Invite::email().like("%@example.com"));
    let insert = Zone::table()
        .insert()
        .column(Zone::id())
        .column(Zone::name())
        .from_query(source);
    let statement = postgres().insert(&insert).unwrap();
    assert_eq!(
        statement.sql,
        r#"INSERT INTO "zones" ("id", "name") (SELECT "invitations"."id", "invitations"."code" FROM "invitations" WHERE ("invitations"."email" LIKE ?))"#
    );
    assert!(statement.rows.is_empty());

    let bound = statement.bind().unwrap();
    assert_eq!(bound.sql, statement.sql);
    assert_eq!(bound.values, vec![text("%@example.com")]);
}

#[test]
fn test_insert_without_rows_fails() {
    let insert = Invite::table()
        .insert()
        .all_columns()
        .values(Vec::<Invite>::new());
    let err = postgres().insert(&insert).unwrap_err();
    assert!(matches!(err, Error::Construction(_)));
}

// =============================================================================
// DELETE
// =============================================================================

#[test]
fn test_delete() {
    let postgres = postgres();
    let locked = Vehicle::table()
        .delete()
        .where_clause(Vehicle::locked().is_true().and(Vehicle::range().lt(5)));
    let statement = postgres.delete(&locked).unwrap();
    assert_eq!(
        statement.sql,
        r#"DELETE FROM "vehicle" WHERE (("vehicle"."locked" IS TRUE) AND ("vehicle"."range" < ?))"#
    );
    assert_eq!(statement.values, vec![SqlValue::Int(5)]);

    let everything = postgres.delete(&Vehicle::table().delete().all()).unwrap();
    assert_eq!(everything.sql, r#"DELETE FROM "vehicle""#);
    assert!(everything.values.is_empty());
}

#[test]
fn test_delete_aliased_table() {
    let z = Zone::aliased("z");
    let statement = postgres()
        .delete(&z.delete().where_clause(z.col(Zone::name()).eq("Old town")))
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"DELETE FROM "zones" "z" WHERE ("z"."name" = ?)"#
    );
}
