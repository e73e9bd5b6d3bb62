//! Hand-written entities for unit tests.

use crate::error::Result;
use crate::schema::{
    Argument, Arguments, Entity, EntityDescriptor, EntityVTable, ParameterDescriptor,
    PropertyDescriptor, Shape,
};
use crate::value::{SqlValue, ToSqlValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub distance: i32,
}

const fn parameter(name: &'static str, rust_type: &'static str) -> ParameterDescriptor {
    ParameterDescriptor {
        name,
        column: None,
        nullable: false,
        optional: false,
        transient: false,
        rust_type,
    }
}

const fn property(name: &'static str, rust_type: &'static str) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        column: None,
        mutable: false,
        transient: false,
        rust_type,
    }
}

static VEHICLE: EntityDescriptor = EntityDescriptor {
    type_name: "oxide_pgmap::testing::Vehicle",
    simple_name: "Vehicle",
    table_name: None,
    shape: Shape::Record,
    parameters: &[parameter("id", "i64"), parameter("distance", "i32")],
    properties: &[property("id", "i64"), property("distance", "i32")],
    vtable: EntityVTable::of::<Vehicle>(),
};

impl Entity for Vehicle {
    fn descriptor() -> &'static EntityDescriptor {
        &VEHICLE
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            id: args.take("id")?,
            distance: args.take("distance")?,
        })
    }

    fn property_value(&self, property: &str) -> Option<SqlValue> {
        match property {
            "id" => Some(self.id.to_sql_value()),
            "distance" => Some(self.distance.to_sql_value()),
            _ => None,
        }
    }
}

/// A zone with a mutable label assigned after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Zone {
    pub id: i64,
    pub label: Option<String>,
}

static ZONE: EntityDescriptor = EntityDescriptor {
    type_name: "oxide_pgmap::testing::Zone",
    simple_name: "Zone",
    table_name: Some("zones"),
    shape: Shape::Record,
    parameters: &[parameter("id", "i64")],
    properties: &[
        property("id", "i64"),
        PropertyDescriptor {
            mutable: true,
            ..property("label", "Option<String>")
        },
    ],
    vtable: EntityVTable::of::<Zone>(),
};

impl Entity for Zone {
    fn descriptor() -> &'static EntityDescriptor {
        &ZONE
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            id: args.take("id")?,
            label: None,
        })
    }

    fn assign(&mut self, property: &str, value: Argument) -> Result<()> {
        match property {
            "label" => {
                self.label = value.decode()?;
                Ok(())
            }
            other => Err(crate::Error::mapping(
                "Zone",
                format!("no mutable property {other}"),
            )),
        }
    }
}
