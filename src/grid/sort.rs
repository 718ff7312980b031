use std::sync::Arc;

use super::column::Row;
use super::value::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

/// Single active sort key. `None` keeps rows in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<Sort>,
}

impl SortState {
    pub fn active(&self) -> Option<&Sort> {
        self.active.as_ref()
    }

    pub fn direction_for(&self, key: &str) -> Option<SortDirection> {
        self.active
            .as_ref()
            .filter(|s| s.key == key)
            .map(|s| s.direction)
    }

    /// Advance the sort control of `key`.
    ///
    /// The same key cycles ascending, descending, unsorted. A different key
    /// starts over at ascending and drops the previous one.
    pub fn cycle(&mut self, key: &str) {
        self.active = match self.active.take() {
            Some(Sort {
                key: current,
                direction: SortDirection::Ascending,
            }) if current == key => Some(Sort {
                key: current,
                direction: SortDirection::Descending,
            }),
            Some(Sort {
                key: current,
                direction: SortDirection::Descending,
            }) if current == key => None,
            _ => Some(Sort {
                key: key.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
    }

    pub fn set(&mut self, key: &str, direction: SortDirection) {
        self.active = Some(Sort {
            key: key.to_string(),
            direction,
        });
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Reorder `indices` (positions into `rows`) by the active key.
    ///
    /// Ascending order is stable. Descending is the exact reverse of the
    /// ascending sequence.
    pub fn apply<T: Row>(&self, rows: &[Arc<T>], indices: &mut Vec<usize>) {
        let Some(sort) = &self.active else { return };

        let mut keyed: Vec<(CellValue, usize)> = indices
            .iter()
            .map(|&i| (rows[i].get(&sort.key).unwrap_or_default(), i))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        indices.clear();
        indices.extend(keyed.into_iter().map(|(_, i)| i));
        if sort.direction == SortDirection::Descending {
            indices.reverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::error::FieldError;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Car {
        id: i64,
        year: i64,
    }

    impl Row for Car {
        fn get(&self, key: &str) -> Option<CellValue> {
            match key {
                "id" => Some(self.id.into()),
                "year" => Some(self.year.into()),
                _ => None,
            }
        }

        fn set(&mut self, key: &str, _value: CellValue) -> Result<(), FieldError> {
            Err(FieldError::unknown(key))
        }
    }

    fn rows(years: &[i64]) -> Vec<Arc<Car>> {
        years
            .iter()
            .enumerate()
            .map(|(i, &year)| {
                Arc::new(Car {
                    id: i as i64 + 1,
                    year,
                })
            })
            .collect()
    }

    fn sorted(state: &SortState, rows: &[Arc<Car>]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        state.apply(rows, &mut indices);
        indices
    }

    #[test]
    fn cycle_same_key() {
        let mut state = SortState::default();
        state.cycle("year");
        assert_eq!(state.direction_for("year"), Some(SortDirection::Ascending));
        state.cycle("year");
        assert_eq!(state.direction_for("year"), Some(SortDirection::Descending));
        state.cycle("year");
        assert!(state.active().is_none());
    }

    #[test]
    fn cycle_other_key_resets_to_ascending() {
        let mut state = SortState::default();
        state.cycle("year");
        state.cycle("year");
        state.cycle("make");
        assert_eq!(state.direction_for("make"), Some(SortDirection::Ascending));
        assert_eq!(state.direction_for("year"), None);
    }

    #[test]
    fn unsorted_keeps_original_order() {
        let rows = rows(&[2022, 2020, 2021]);
        assert_eq!(sorted(&SortState::default(), &rows), vec![0, 1, 2]);
    }

    #[test]
    fn ascending_is_stable() {
        let rows = rows(&[2021, 2020, 2021, 2020]);
        let mut state = SortState::default();
        state.set("year", SortDirection::Ascending);
        assert_eq!(sorted(&state, &rows), vec![1, 3, 0, 2]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let rows = rows(&[2021, 2020, 2021, 2019]);
        let mut state = SortState::default();
        state.set("year", SortDirection::Ascending);
        let once = sorted(&state, &rows);
        let mut twice = once.clone();
        state.apply(&rows, &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn descending_is_exact_reverse() {
        let rows = rows(&[2021, 2020, 2021, 2019, 2020]);
        let mut state = SortState::default();
        state.set("year", SortDirection::Ascending);
        let mut asc = sorted(&state, &rows);
        state.set("year", SortDirection::Descending);
        let desc = sorted(&state, &rows);
        asc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn missing_field_sorts_as_null() {
        let rows = rows(&[2021, 2020]);
        let mut state = SortState::default();
        state.set("color", SortDirection::Ascending);
        assert_eq!(sorted(&state, &rows), vec![0, 1]);
    }
}
