use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::column::{Column, Row};
use super::error::GridError;
use super::value::CellValue;

/// Predicate applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    Equals(CellValue),
    NotEquals(CellValue),
    Range {
        lower: Bound<CellValue>,
        upper: Bound<CellValue>,
    },
    OneOf(Vec<CellValue>),
}

impl ColumnFilter {
    pub fn at_least(value: impl Into<CellValue>) -> Self {
        ColumnFilter::Range {
            lower: Bound::Included(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn between(min: impl Into<CellValue>, max: impl Into<CellValue>) -> Self {
        ColumnFilter::Range {
            lower: Bound::Included(min.into()),
            upper: Bound::Included(max.into()),
        }
    }

    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            ColumnFilter::Equals(expected) => value.filter_eq(expected),
            ColumnFilter::NotEquals(expected) => !value.filter_eq(expected),
            ColumnFilter::OneOf(choices) => choices.iter().any(|c| value.filter_eq(c)),
            ColumnFilter::Range { lower, upper } => {
                if value.is_blank() {
                    return false;
                }
                let above = match lower {
                    Bound::Included(min) => value.filter_cmp(min).is_ge(),
                    Bound::Excluded(min) => value.filter_cmp(min).is_gt(),
                    Bound::Unbounded => true,
                };
                let below = match upper {
                    Bound::Included(max) => value.filter_cmp(max).is_le(),
                    Bound::Excluded(max) => value.filter_cmp(max).is_lt(),
                    Bound::Unbounded => true,
                };
                above && below
            }
        }
    }

    /// Both filters at once. Two ranges intersect into the tighter range
    /// (`year >= 2019 AND year < 2022`); any other pair has no single-filter
    /// form and yields `None`.
    fn intersect(self, next: ColumnFilter) -> Option<ColumnFilter> {
        match (self, next) {
            (
                ColumnFilter::Range { lower, upper },
                ColumnFilter::Range {
                    lower: next_lower,
                    upper: next_upper,
                },
            ) => Some(ColumnFilter::Range {
                lower: tighter(lower, next_lower, Ordering::Greater),
                upper: tighter(upper, next_upper, Ordering::Less),
            }),
            _ => None,
        }
    }
}

/// Pick the stricter of two bounds on the same side of a range. `keep` is
/// the ordering of `a` against `b` for which `a` wins.
fn tighter(a: Bound<CellValue>, b: Bound<CellValue>, keep: Ordering) -> Bound<CellValue> {
    let order = bound_value(&a)
        .zip(bound_value(&b))
        .map(|(x, y)| x.filter_cmp(y));
    match order {
        None if matches!(a, Bound::Unbounded) => b,
        None => a,
        Some(o) if o == keep => a,
        Some(Ordering::Equal) if matches!(b, Bound::Excluded(_)) => b,
        Some(Ordering::Equal) => a,
        Some(_) => b,
    }
}

fn bound_value(bound: &Bound<CellValue>) -> Option<&CellValue> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// Per-column filters plus the global search string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    columns: BTreeMap<String, ColumnFilter>,
    global: String,
}

impl FilterState {
    pub fn global(&self) -> &str {
        &self.global
    }

    pub fn set_global(&mut self, text: impl Into<String>) {
        self.global = text.into();
    }

    pub fn column_filters(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.columns.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn column_filter(&self, key: &str) -> Option<&ColumnFilter> {
        self.columns.get(key)
    }

    /// Install `filter` for `key`, replacing whatever was there.
    pub fn set_column(&mut self, key: &str, filter: ColumnFilter) {
        self.columns.insert(key.to_string(), filter);
    }

    /// AND `filter` with the one already on `key`.
    ///
    /// Ranges narrow to their intersection; a second non-range condition on
    /// the same column is rejected.
    pub fn narrow_column(&mut self, key: &str, filter: ColumnFilter) -> Result<(), GridError> {
        let combined = match self.columns.remove(key) {
            Some(existing) => {
                let kept = existing.clone();
                match existing.intersect(filter) {
                    Some(combined) => combined,
                    None => {
                        self.columns.insert(key.to_string(), kept);
                        return Err(GridError::FilterSyntax(format!(
                            "column '{}' has more than one non-range condition",
                            key
                        )));
                    }
                }
            }
            None => filter,
        };
        self.columns.insert(key.to_string(), combined);
        Ok(())
    }

    pub fn remove_column(&mut self, key: &str) -> Option<ColumnFilter> {
        self.columns.remove(key)
    }

    pub fn clear_columns(&mut self) {
        self.columns.clear();
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.global.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.global.trim().is_empty()
    }

    /// Whether `row` passes. Each part can be switched off by the grid's
    /// feature toggles.
    pub fn matches<T: Row>(
        &self,
        row: &T,
        columns: &[Column<T>],
        apply_global: bool,
        apply_columns: bool,
    ) -> bool {
        if apply_columns {
            let all = self.columns.iter().all(|(key, filter)| {
                let value = row.get(key).unwrap_or_default();
                filter.matches(&value)
            });
            if !all {
                return false;
            }
        }
        !apply_global || global_match(row, columns, &self.global)
    }
}

/// Case-insensitive substring test against every column of `row`.
///
/// Hidden columns are searched too, so results do not depend on the view.
pub fn global_match<T: Row>(row: &T, columns: &[Column<T>], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    columns
        .iter()
        .any(|col| col.value(row).to_string().to_lowercase().contains(&needle))
}

/// Parse a filter expression into per-column filters.
///
/// Supported syntax:
/// - `column = value`, `column != value`
/// - `column > value`, `column >= value`, `column < value`, `column <= value`
/// - `column IN ('a', 'b', 'c')`
/// - Clauses joined with `AND`
///
/// Values without quotes are parsed as numbers or booleans when they look
/// like one; quoted values are always text.
pub fn parse_filter(input: &str) -> Result<Vec<(String, ColumnFilter)>, GridError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GridError::FilterSyntax("empty filter expression".into()));
    }

    let mut clauses = Vec::new();
    let mut rest = input;
    while let Some((left, right)) = split_combinator(rest, " AND ") {
        clauses.push(parse_clause(left)?);
        rest = right;
    }
    clauses.push(parse_clause(rest)?);
    Ok(clauses)
}

/// Split on first occurrence of combinator, respecting quoted strings.
fn split_combinator<'a>(input: &'a str, combinator: &str) -> Option<(&'a str, &'a str)> {
    let upper = input.to_ascii_uppercase();
    let mut in_quote = false;

    for (i, c) in input.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        }
        if !in_quote && upper[i..].starts_with(combinator) {
            let left = &input[..i];
            let right = &input[i + combinator.len()..];
            return Some((left.trim(), right.trim()));
        }
    }
    None
}

fn parse_clause(input: &str) -> Result<(String, ColumnFilter), GridError> {
    let input = input.trim();
    let upper = input.to_ascii_uppercase();

    if let Some(in_pos) = find_keyword_pos(&upper, " IN ") {
        let col = column_name(&input[..in_pos], input)?;
        let list_part = input[in_pos + 4..].trim();
        if list_part.starts_with('(') && list_part.ends_with(')') {
            let inner = &list_part[1..list_part.len() - 1];
            let values = parse_list_values(inner)
                .iter()
                .map(|v| CellValue::parse_literal(v))
                .collect();
            return Ok((col, ColumnFilter::OneOf(values)));
        }
        return Err(GridError::FilterSyntax(format!("invalid IN list: {}", input)));
    }

    let operators = [">=", "<=", "!=", ">", "<", "="];
    for op in &operators {
        let Some(pos) = find_keyword_pos(input, op) else {
            continue;
        };

        let col = column_name(&input[..pos], input)?;
        let val_str = input[pos + op.len()..].trim();
        if val_str.is_empty() {
            return Err(GridError::FilterSyntax(format!("missing value: {}", input)));
        }
        let value = CellValue::parse_literal(val_str);

        let filter = match *op {
            ">=" => ColumnFilter::Range {
                lower: Bound::Included(value),
                upper: Bound::Unbounded,
            },
            "<=" => ColumnFilter::Range {
                lower: Bound::Unbounded,
                upper: Bound::Included(value),
            },
            ">" => ColumnFilter::Range {
                lower: Bound::Excluded(value),
                upper: Bound::Unbounded,
            },
            "<" => ColumnFilter::Range {
                lower: Bound::Unbounded,
                upper: Bound::Excluded(value),
            },
            "!=" => ColumnFilter::NotEquals(value),
            _ => ColumnFilter::Equals(value),
        };
        return Ok((col, filter));
    }

    Err(GridError::FilterSyntax(format!(
        "cannot parse filter expression: {}",
        input
    )))
}

fn column_name(raw: &str, clause: &str) -> Result<String, GridError> {
    let name = raw.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(GridError::FilterSyntax(format!(
            "expected a column name in: {}",
            clause
        )));
    }
    Ok(name.to_string())
}

fn find_keyword_pos(haystack: &str, keyword: &str) -> Option<usize> {
    let mut in_quote = false;
    for (i, c) in haystack.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        }
        if !in_quote && haystack[i..].starts_with(keyword) {
            return Some(i);
        }
    }
    None
}

/// Split a comma-separated list, keeping quotes so literals stay typed.
fn parse_list_values(input: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for c in input.chars() {
        match c {
            '\'' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ',' if !in_quote => {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    values.push(trimmed);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        values.push(trimmed);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::error::FieldError;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Car {
        make: String,
        year: i64,
        color: String,
    }

    impl Row for Car {
        fn get(&self, key: &str) -> Option<CellValue> {
            match key {
                "make" => Some(self.make.clone().into()),
                "year" => Some(self.year.into()),
                "color" => Some(self.color.clone().into()),
                _ => None,
            }
        }

        fn set(&mut self, key: &str, _value: CellValue) -> Result<(), FieldError> {
            Err(FieldError::unknown(key))
        }
    }

    fn car(make: &str, year: i64, color: &str) -> Car {
        Car {
            make: make.into(),
            year,
            color: color.into(),
        }
    }

    fn columns() -> Vec<Column<Car>> {
        vec![
            Column::new("make", "Make"),
            Column::new("year", "Year"),
            Column::new("color", "Color"),
        ]
    }

    #[test]
    fn global_match_is_case_insensitive_substring() {
        let cols = columns();
        assert!(global_match(&car("Honda", 2021, "Red"), &cols, "hond"));
        assert!(global_match(&car("Honda", 2021, "Red"), &cols, "  RED "));
        assert!(global_match(&car("Honda", 2021, "Red"), &cols, "202"));
        assert!(!global_match(&car("Toyota", 2020, "Blue"), &cols, "hond"));
    }

    #[test]
    fn empty_global_matches_everything() {
        assert!(global_match(&car("Ford", 2022, "Black"), &columns(), "   "));
    }

    #[test]
    fn column_filters_are_and_combined() {
        let cols = columns();
        let mut state = FilterState::default();
        state.set_column("make", ColumnFilter::Equals("Honda".into()));
        state.set_column("year", ColumnFilter::at_least(2021));
        assert!(state.matches(&car("Honda", 2021, "Red"), &cols, true, true));
        assert!(!state.matches(&car("Honda", 2019, "Red"), &cols, true, true));
        assert!(!state.matches(&car("Ford", 2022, "Red"), &cols, true, true));
    }

    #[test]
    fn disabled_parts_are_skipped() {
        let cols = columns();
        let mut state = FilterState::default();
        state.set_column("make", ColumnFilter::Equals("Honda".into()));
        state.set_global("blue");
        let row = car("Ford", 2022, "Red");
        assert!(!state.matches(&row, &cols, true, true));
        assert!(state.matches(&row, &cols, false, false));
    }

    #[test]
    fn ranges_narrow_on_same_column() {
        let mut state = FilterState::default();
        state
            .narrow_column(
                "year",
                ColumnFilter::Range {
                    lower: Bound::Included(CellValue::Int(2019)),
                    upper: Bound::Unbounded,
                },
            )
            .unwrap();
        state
            .narrow_column(
                "year",
                ColumnFilter::Range {
                    lower: Bound::Unbounded,
                    upper: Bound::Excluded(CellValue::Int(2022)),
                },
            )
            .unwrap();
        let filter = state.column_filter("year").unwrap();
        assert!(filter.matches(&CellValue::Int(2019)));
        assert!(filter.matches(&CellValue::Int(2021)));
        assert!(!filter.matches(&CellValue::Int(2022)));
        assert!(!filter.matches(&CellValue::Int(2018)));
    }

    #[test]
    fn narrowing_keeps_the_stricter_bound() {
        let mut state = FilterState::default();
        state.narrow_column("year", ColumnFilter::at_least(2015)).unwrap();
        state.narrow_column("year", ColumnFilter::at_least(2000)).unwrap();
        state
            .narrow_column(
                "year",
                ColumnFilter::Range {
                    lower: Bound::Excluded(CellValue::Int(2015)),
                    upper: Bound::Unbounded,
                },
            )
            .unwrap();
        assert_eq!(
            state.column_filter("year"),
            Some(&ColumnFilter::Range {
                lower: Bound::Excluded(CellValue::Int(2015)),
                upper: Bound::Unbounded,
            })
        );
    }

    #[test]
    fn narrowing_two_equalities_is_rejected() {
        let mut state = FilterState::default();
        state
            .narrow_column("make", ColumnFilter::Equals("Honda".into()))
            .unwrap();
        let err = state
            .narrow_column("make", ColumnFilter::Equals("Ford".into()))
            .unwrap_err();
        assert!(matches!(err, GridError::FilterSyntax(_)));
        assert_eq!(
            state.column_filter("make"),
            Some(&ColumnFilter::Equals("Honda".into()))
        );
    }

    #[test]
    fn set_column_replaces_existing_filter() {
        let mut state = FilterState::default();
        state.set_column("year", ColumnFilter::between(2000, 2010));
        state.set_column("year", ColumnFilter::at_least(2015));
        let filter = state.column_filter("year").unwrap();
        assert_eq!(filter, &ColumnFilter::at_least(2015));
        assert!(filter.matches(&CellValue::Int(2016)));
        assert!(!filter.matches(&CellValue::Int(2005)));
    }

    #[test]
    fn one_of_filter() {
        let filter = ColumnFilter::OneOf(vec!["sold".into(), "reserved".into()]);
        assert!(filter.matches(&"sold".into()));
        assert!(!filter.matches(&"available".into()));
    }

    #[test]
    fn range_rejects_blank_values() {
        assert!(!ColumnFilter::between(1, 5).matches(&CellValue::Null));
    }

    #[test]
    fn clear_restores_unfiltered() {
        let mut state = FilterState::default();
        state.set_column("make", ColumnFilter::Equals("Honda".into()));
        state.set_global("x");
        assert!(!state.is_empty());
        state.clear();
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn parse_simple_comparisons() {
        let parsed = parse_filter("year >= 2020").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "year");
        assert_eq!(parsed[0].1, ColumnFilter::at_least(2020));

        let parsed = parse_filter("make = 'Honda'").unwrap();
        assert_eq!(parsed[0].1, ColumnFilter::Equals(CellValue::text("Honda")));

        let parsed = parse_filter("make != Ford").unwrap();
        assert_eq!(parsed[0].1, ColumnFilter::NotEquals(CellValue::text("Ford")));
    }

    #[test]
    fn parse_and_combinator() {
        let parsed = parse_filter("year > 2019 and color = 'Dark Red'").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].0, "color");
        assert_eq!(parsed[1].1, ColumnFilter::Equals(CellValue::text("Dark Red")));
    }

    #[test]
    fn parse_and_inside_quotes_is_literal() {
        let parsed = parse_filter("model = 'Range AND Rover'").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].1,
            ColumnFilter::Equals(CellValue::text("Range AND Rover"))
        );
    }

    #[test]
    fn parse_in_list() {
        let parsed = parse_filter("status IN ('sold', 'reserved', 3)").unwrap();
        assert_eq!(
            parsed[0].1,
            ColumnFilter::OneOf(vec!["sold".into(), "reserved".into(), CellValue::Int(3)])
        );
    }

    #[test]
    fn parse_operator_inside_quotes_is_literal() {
        let parsed = parse_filter("make = 'a<b'").unwrap();
        assert_eq!(parsed[0].0, "make");
        assert_eq!(parsed[0].1, ColumnFilter::Equals(CellValue::text("a<b")));

        let parsed = parse_filter("note != '>=5'").unwrap();
        assert_eq!(parsed[0].0, "note");
        assert_eq!(parsed[0].1, ColumnFilter::NotEquals(CellValue::text(">=5")));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_filter("").is_err());
        assert!(parse_filter("   ").is_err());
        assert!(parse_filter("nonsense gibberish").is_err());
        assert!(parse_filter("year >=").is_err());
        assert!(parse_filter("= 3").is_err());
        assert!(parse_filter("status IN 'a'").is_err());
    }
}
