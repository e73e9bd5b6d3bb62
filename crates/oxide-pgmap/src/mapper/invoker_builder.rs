//! Plans an [`Invoker`] from column labels, following join sentinels.
//!
//! Join columns are cut out of the outer column list first, between their
//! `start:<field>` and `end:<field>` sentinels, so that a joined table's `id`
//! can never be mistaken for the outer entity's `id`.

use tracing::debug;

use super::context::MappingContext;
use super::invoker::{Invoker, ValueProvider};
use super::row::ColumnLabel;
use crate::ast::{IntoField, Query, Update};
use crate::error::{Error, Result};
use crate::schema::{EntityDescriptor, ParameterDescriptor, PropertyDescriptor};

/// A field a column can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotRef {
    Parameter(&'static ParameterDescriptor),
    Property(&'static PropertyDescriptor),
}

impl SlotRef {
    const fn name(self) -> &'static str {
        match self {
            Self::Parameter(p) => p.name,
            Self::Property(p) => p.name,
        }
    }

    fn slot_name(self) -> &'static str {
        match self {
            Self::Parameter(p) => p.slot_name(),
            Self::Property(p) => p.slot_name(),
        }
    }

    const fn rust_type(self) -> &'static str {
        match self {
            Self::Parameter(p) => p.rust_type,
            Self::Property(p) => p.rust_type,
        }
    }
}

/// A nested plan waiting to be attached to the outer entity.
struct JoinPlan<'a> {
    into: &'a IntoField,
    invoker: Invoker,
    columns: Vec<usize>,
}

/// Plans `descriptor` over `columns`, descending into every join of `query`
/// that carries an into-field.
///
/// # Errors
///
/// Fails if a join's sentinel columns are missing from the result.
pub fn for_query(
    context: &MappingContext,
    descriptor: &'static EntityDescriptor,
    query: Option<&Query>,
    columns: &[ColumnLabel],
) -> Result<Invoker> {
    let mut columns = columns.to_vec();
    let mut joins = Vec::new();
    if let Some(query) = query {
        for (join, into) in query.into_joins() {
            let slice = take_join_columns(context, descriptor, &mut columns, into)?;
            let invoker = for_query(context, into.target, Some(join.query.as_ref()), &slice)?;
            joins.push(JoinPlan {
                into,
                invoker,
                columns: slice.iter().map(|c| c.position).collect(),
            });
        }
    }
    Ok(assemble(context, descriptor, &columns, joins))
}

/// Plans `descriptor` over the RETURNING columns of `update`.
///
/// # Errors
///
/// Fails if a returned join's sentinel columns are missing from the result.
pub fn for_update(
    context: &MappingContext,
    descriptor: &'static EntityDescriptor,
    update: Option<&Update>,
    columns: &[ColumnLabel],
) -> Result<Invoker> {
    let mut columns = columns.to_vec();
    let mut joins = Vec::new();
    for into in update.map(|u| u.into_fields.as_slice()).unwrap_or_default() {
        let slice = take_join_columns(context, descriptor, &mut columns, into)?;
        let invoker = for_query(context, into.target, None, &slice)?;
        joins.push(JoinPlan {
            into,
            invoker,
            columns: slice.iter().map(|c| c.position).collect(),
        });
    }
    Ok(assemble(context, descriptor, &columns, joins))
}

/// Removes the sentinels of `into` and everything between them from
/// `columns`, returning the columns strictly inside.
fn take_join_columns(
    context: &MappingContext,
    descriptor: &EntityDescriptor,
    columns: &mut Vec<ColumnLabel>,
    into: &IntoField,
) -> Result<Vec<ColumnLabel>> {
    let start = context.names().join_start(into);
    let end = context.names().join_end(into);
    let start_index = columns.iter().position(|c| c.label == start);
    let end_index = columns.iter().position(|c| c.label == end);
    match (start_index, end_index) {
        (Some(first), Some(last)) if first < last => {
            let mut slice: Vec<ColumnLabel> = columns.drain(first..=last).collect();
            slice.pop();
            slice.remove(0);
            Ok(slice)
        }
        _ => Err(Error::mapping(
            descriptor.simple_name,
            format!("join columns between {start} and {end} not found"),
        )),
    }
}

/// Routes columns to slots, then attaches joins and null defaults.
fn assemble(
    context: &MappingContext,
    descriptor: &'static EntityDescriptor,
    columns: &[ColumnLabel],
    joins: Vec<JoinPlan<'_>>,
) -> Invoker {
    // A parameter replaces a mutable property claiming the same name.
    let mut slots: Vec<SlotRef> = descriptor
        .properties
        .iter()
        .filter(|p| p.mutable && !p.transient)
        .map(SlotRef::Property)
        .collect();
    for parameter in descriptor.parameters.iter().filter(|p| !p.transient) {
        let slot = SlotRef::Parameter(parameter);
        match slots.iter_mut().find(|s| s.slot_name() == parameter.slot_name()) {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
    }

    let mut parameters = Vec::new();
    let mut properties = Vec::new();
    for slot in slots {
        let Some(column) = columns
            .iter()
            .find(|c| context.matches(&c.label, slot.slot_name()))
        else {
            continue;
        };
        let provider = ValueProvider::Column {
            position: column.position,
            codec: context.codec(slot.rust_type()),
        };
        match slot {
            SlotRef::Parameter(_) => set(&mut parameters, slot.name(), provider),
            SlotRef::Property(_) => set(&mut properties, slot.name(), provider),
        }
    }

    let join_count = joins.len();
    for join in joins {
        let field = join.into.column.property;
        let provider = ValueProvider::Join {
            invoker: Box::new(join.invoker),
            columns: join.columns,
        };
        if let Some(parameter) = descriptor
            .parameters
            .iter()
            .find(|p| context.matches(field, p.name))
        {
            set(&mut parameters, parameter.name, provider);
        } else if let Some(property) = descriptor
            .properties
            .iter()
            .find(|p| p.mutable && context.matches(field, p.name))
        {
            set(&mut properties, property.name, provider);
        }
    }

    fill_nullable(descriptor, &mut parameters);

    debug!(
        entity = descriptor.simple_name,
        parameters = parameters.len(),
        properties = properties.len(),
        joins = join_count,
        "built invoker"
    );
    Invoker::new(descriptor, parameters, properties)
}

/// Inserts or replaces the provider for `name`.
pub(crate) fn set(
    providers: &mut Vec<(&'static str, ValueProvider)>,
    name: &'static str,
    provider: ValueProvider,
) {
    match providers.iter_mut().find(|(n, _)| *n == name) {
        Some(entry) => entry.1 = provider,
        None => providers.push((name, provider)),
    }
}

/// Required nullable parameters with no provider read as `NULL`.
pub(crate) fn fill_nullable(
    descriptor: &EntityDescriptor,
    parameters: &mut Vec<(&'static str, ValueProvider)>,
) {
    for parameter in descriptor
        .parameters
        .iter()
        .filter(|p| !p.optional && p.nullable)
    {
        if !parameters.iter().any(|(name, _)| *name == parameter.name) {
            parameters.push((parameter.name, ValueProvider::Null));
        }
    }
}
