use std::sync::Arc;

use super::column::{Column, Row};
use super::error::{FieldError, GridError};
use super::value::CellValue;

/// In-progress row for the add-row form. Holds one text field per editable
/// column except the identifier, which is assigned on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    fields: Vec<(String, String)>,
}

impl Draft {
    pub fn for_columns<T: Row>(columns: &[Column<T>]) -> Self {
        let fields = columns
            .iter()
            .filter(|c| c.key() != T::ID_KEY && c.is_editable())
            .map(|c| (c.key().to_string(), String::new()))
            .collect();
        Self { fields }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns `false` when the draft has no such field.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Keys whose value is empty after trimming.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn reset(&mut self) {
        for (_, value) in &mut self.fields {
            value.clear();
        }
    }

    /// Fill `row` from the draft without touching the draft itself.
    ///
    /// `row` is the starting point, normally `T::template` of the rows
    /// already in the grid.
    pub(crate) fn build<T: Row>(&self, mut row: T, id: i64) -> Result<T, GridError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(GridError::Validation {
                missing,
                reason: None,
            });
        }

        for (key, value) in &self.fields {
            row.set(key, CellValue::text(value.trim()))
                .map_err(rejected)?;
        }
        row.set_id(id).map_err(rejected)?;
        Ok(row)
    }
}

fn rejected(err: FieldError) -> GridError {
    GridError::Validation {
        missing: vec![],
        reason: Some(err.to_string()),
    }
}

/// Next identifier: one past the largest existing id, or 1 for an empty set.
pub fn next_id<T: Row>(rows: &[Arc<T>]) -> Result<i64, GridError> {
    let largest = rows.iter().filter_map(|r| r.id()).fold(0, i64::max);
    largest.checked_add(1).ok_or_else(|| GridError::Validation {
        missing: vec![],
        reason: Some(format!("no identifier left after {}", largest)),
    })
}
