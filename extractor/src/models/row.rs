//! Schema-shaped output rows.
//!
//! A [`RowBuffer`] is filled column by column for one line and then frozen
//! into an immutable [`Row`]. The buffer is reset and reused for the next
//! line; only frozen rows leave the pipeline.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

use super::FieldValue;
use crate::schema::Schema;

/// Mutable, reusable row buffer.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    schema: Arc<Schema>,
    slots: Vec<Option<FieldValue>>,
}

impl RowBuffer {
    pub fn new(schema: Arc<Schema>) -> Self {
        let slots = vec![None; schema.len()];
        Self { schema, slots }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Set the column at `index`. Out-of-range indexes are ignored.
    pub fn set(&mut self, index: usize, value: FieldValue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Set a column by name. Returns false if the schema has no such column.
    pub fn set_by_name(&mut self, name: &str, value: FieldValue) -> bool {
        match self.schema.index_of(name) {
            Some(index) => {
                self.set(index, value);
                true
            }
            None => false,
        }
    }

    /// True once every column has been set since the last reset.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Clear every column for the next line.
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Snapshot the buffer into an immutable row.
    pub fn freeze(&self) -> Row {
        debug_assert!(self.is_complete(), "row frozen with unset columns");
        Row {
            schema: Arc::clone(&self.schema),
            values: self
                .slots
                .iter()
                .map(|slot| slot.clone().unwrap_or(FieldValue::Null))
                .collect(),
        }
    }
}

/// Immutable row, one value per schema column in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl Row {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the first column with this name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }

    /// `(column name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.schema
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
