use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::error::FieldError;
use super::value::CellValue;

/// Typed access to a row's fields by column key.
///
/// The grid never looks inside a row except through this trait.
pub trait Row: Clone + PartialEq + Default {
    /// Key of the field holding the row identifier.
    const ID_KEY: &'static str = "id";

    /// Field keys of a fixed-shape row type. Columns are checked against this
    /// list even when there are no rows yet. `None` for open-ended rows.
    fn fields() -> Option<&'static [&'static str]> {
        None
    }

    /// Read a field. `None` when the key does not exist on this row.
    fn get(&self, key: &str) -> Option<CellValue>;

    /// Write a field, coercing the value into the field's own type.
    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError>;

    fn id(&self) -> Option<i64> {
        self.get(Self::ID_KEY).and_then(|v| v.as_i64())
    }

    fn set_id(&mut self, id: i64) -> Result<(), FieldError> {
        self.set(Self::ID_KEY, CellValue::Int(id))
    }

    /// Blank row that a new insertion is filled into. Open-ended rows can
    /// borrow the field types of the `existing` rows.
    fn template(_existing: &[Arc<Self>]) -> Self {
        Self::default()
    }
}

type RenderFn = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// Declarative definition of one column over rows of type `T`.
pub struct Column<T> {
    key: String,
    label: String,
    options: Option<Vec<CellValue>>,
    render: Option<RenderFn>,
    editable: bool,
    _row: PhantomData<fn() -> T>,
}

impl<T> Column<T> {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            options: None,
            render: None,
            editable: true,
            _row: PhantomData,
        }
    }

    /// Restrict editing to a fixed choice set.
    pub fn options<V: Into<CellValue>>(mut self, options: impl IntoIterator<Item = V>) -> Self {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Custom display for the column's values.
    pub fn render(mut self, render: impl Fn(&CellValue) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn choices(&self) -> Option<&[CellValue]> {
        self.options.as_deref()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn display(&self, value: &CellValue) -> String {
        match &self.render {
            Some(render) => render(value),
            None => value.to_string(),
        }
    }
}

impl<T: Row> Column<T> {
    /// Value of this column on `row`, `Null` when the row lacks the field.
    pub fn value(&self, row: &T) -> CellValue {
        row.get(&self.key).unwrap_or_default()
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            options: self.options.clone(),
            render: self.render.clone(),
            editable: self.editable,
            _row: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("options", &self.options)
            .field("custom_render", &self.render.is_some())
            .field("editable", &self.editable)
            .finish()
    }
}

/// Per-column visibility. Columns not mentioned are visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnVisibility {
    visible: HashMap<String, bool>,
}

impl ColumnVisibility {
    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.get(key).map_or(true, |visible| *visible)
    }

    pub fn set(&mut self, key: &str, visible: bool) {
        self.visible.insert(key.to_string(), visible);
    }

    pub fn toggle(&mut self, key: &str) {
        let visible = self.is_visible(key);
        self.set(key, !visible);
    }

    pub fn reset(&mut self) {
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pair {
        id: i64,
        name: String,
    }

    impl Row for Pair {
        fn get(&self, key: &str) -> Option<CellValue> {
            match key {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.clone().into()),
                _ => None,
            }
        }

        fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
            match key {
                "id" => self.id = value.as_i64().unwrap_or_default(),
                "name" => self.name = value.to_string(),
                _ => return Err(FieldError::unknown(key)),
            }
            Ok(())
        }
    }

    #[test]
    fn default_id_accessors_use_id_key() {
        let mut row = Pair::default();
        row.set_id(7).unwrap();
        assert_eq!(row.id(), Some(7));
    }

    #[test]
    fn column_value_falls_back_to_null() {
        let row = Pair {
            id: 1,
            name: "Corolla".into(),
        };
        assert_eq!(Column::<Pair>::new("name", "Name").value(&row), CellValue::text("Corolla"));
        assert_eq!(Column::<Pair>::new("trim", "Trim").value(&row), CellValue::Null);
    }

    #[test]
    fn custom_render_is_used_for_display() {
        let col = Column::<Pair>::new("id", "Id").render(|v| format!("#{}", v));
        assert_eq!(col.display(&CellValue::Int(3)), "#3");
        assert_eq!(Column::<Pair>::new("id", "Id").display(&CellValue::Int(3)), "3");
    }

    #[test]
    fn options_and_read_only() {
        let col = Column::<Pair>::new("name", "Name").options(["a", "b"]).read_only();
        assert_eq!(col.choices(), Some(&[CellValue::text("a"), CellValue::text("b")][..]));
        assert!(!col.is_editable());
    }

    #[test]
    fn visibility_defaults_to_visible() {
        let mut vis = ColumnVisibility::default();
        assert!(vis.is_visible("make"));
        vis.toggle("make");
        assert!(!vis.is_visible("make"));
        vis.reset();
        assert!(vis.is_visible("make"));
    }
}
