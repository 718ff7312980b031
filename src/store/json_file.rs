use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::grid::{on_save, Column, OnSave, Row};
use crate::model::json_row::JsonRow;

/// Read a JSON array of rows from `path`.
pub async fn load_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows: Vec<R> = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a JSON array of rows", path.display()))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "rows loaded");
    Ok(rows)
}

/// Write `rows` to `path` as a pretty-printed JSON array.
///
/// The data goes to a sibling temp file first and is renamed over `path`, so a
/// failed write leaves the previous file intact.
pub async fn write_rows<R: Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    let json = serde_json::to_vec_pretty(rows).context("failed to serialize rows")?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &json)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "rows written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save handler that writes the whole row set back to `path`.
pub fn file_saver<R>(path: PathBuf) -> OnSave<R>
where
    R: Row + Serialize + Send + Sync + 'static,
{
    on_save(move |rows: Vec<R>| {
        let path = path.clone();
        async move { write_rows(&path, &rows).await }
    })
}

/// Column set for JSON rows.
///
/// With `keys` the columns are exactly those, in that order. Otherwise they
/// are the keys of the first row, with the identifier first. The identifier
/// column is read-only.
pub fn infer_columns(rows: &[JsonRow], keys: Option<&[String]>) -> Result<Vec<Column<JsonRow>>> {
    let keys: Vec<String> = match keys {
        Some(keys) => keys.to_vec(),
        None => {
            let Some(first) = rows.first() else {
                bail!("cannot infer columns from an empty file; pass --columns");
            };
            let mut keys: Vec<String> = first.0.keys().cloned().collect();
            if let Some(pos) = keys.iter().position(|k| k == JsonRow::ID_KEY) {
                let id = keys.remove(pos);
                keys.insert(0, id);
            }
            keys
        }
    };

    if keys.is_empty() {
        bail!("no columns to show");
    }

    Ok(keys
        .into_iter()
        .map(|key| {
            let column = Column::new(key.clone(), label_for(&key));
            if key == JsonRow::ID_KEY {
                column.read_only()
            } else {
                column
            }
        })
        .collect())
}

/// `sale_date` -> `Sale Date`, `id` -> `ID`.
fn label_for(key: &str) -> String {
    if key.eq_ignore_ascii_case("id") {
        return "ID".to_string();
    }
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Features, Grid};
    use crate::model::dealership::{sample_cars, Car};
    use serde_json::json;

    #[tokio::test]
    async fn write_then_load_typed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cars.json");
        let cars = sample_cars();
        write_rows(&path, &cars).await.unwrap();
        let loaded: Vec<Car> = load_rows(&path).await.unwrap();
        assert_eq!(loaded, cars);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not an array").unwrap();
        let err = load_rows::<JsonRow>(&path).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not a JSON array"));

        let missing = dir.path().join("missing.json");
        assert!(load_rows::<JsonRow>(&missing).await.is_err());
    }

    #[tokio::test]
    async fn grid_save_writes_file_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(
            &path,
            json!([
                {"id": 1, "make": "Toyota", "year": 2020},
                {"id": 2, "make": "Honda", "year": 2021}
            ])
            .to_string(),
        )
        .unwrap();

        let rows: Vec<JsonRow> = load_rows(&path).await.unwrap();
        let columns = infer_columns(&rows, None).unwrap();
        let mut grid = Grid::new(columns, rows, Features::default())
            .unwrap()
            .with_on_save(file_saver(path.clone()));

        grid.update_cell(0, "make", "Lexus".into()).unwrap();
        assert!(grid.save().await.unwrap());
        assert!(!grid.has_changes());

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved[0]["make"], "Lexus");
        assert_eq!(saved[1]["year"], 2021);
    }

    #[tokio::test]
    async fn unwritable_target_surfaces_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("cars.json");
        let mut grid = Grid::new(
            crate::model::dealership::car_columns(),
            sample_cars(),
            Features::default(),
        )
        .unwrap()
        .with_on_save(file_saver(path));

        grid.update_cell(0, "color", "Teal".into()).unwrap();
        assert!(grid.save().await.is_err());
        assert!(grid.has_changes());
        assert_eq!(grid.row(0).unwrap().color, "Teal");
    }

    #[tokio::test]
    async fn inserted_rows_keep_text_fields_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        std::fs::write(
            &path,
            json!([{"id": 1, "model": "Mustang", "zip": "02134", "year": 1967}]).to_string(),
        )
        .unwrap();

        let rows: Vec<JsonRow> = load_rows(&path).await.unwrap();
        let columns = infer_columns(&rows, None).unwrap();
        let mut grid = Grid::new(columns, rows, Features::default())
            .unwrap()
            .with_on_save(file_saver(path.clone()));

        let mut draft = grid.new_draft();
        draft.set("model", "500");
        draft.set("zip", "02139");
        draft.set("year", "2012");
        assert_eq!(grid.insert_row(&mut draft).unwrap(), 2);
        assert!(grid.save().await.unwrap());

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved[1]["model"], json!("500"));
        assert_eq!(saved[1]["zip"], json!("02139"));
        assert_eq!(saved[1]["year"], json!(2012));
        assert_eq!(saved[1]["id"], json!(2));
    }

    #[test]
    fn inferred_columns_put_id_first() {
        let rows: Vec<JsonRow> =
            serde_json::from_value(json!([{"make": "Kia", "id": 4, "sale_date": "2024-01-01"}]))
                .unwrap();
        let columns = infer_columns(&rows, None).unwrap();
        let keys: Vec<&str> = columns.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["id", "make", "sale_date"]);
        assert_eq!(columns[2].label(), "Sale Date");
        assert!(!columns[0].is_editable());
    }

    #[test]
    fn explicit_columns_win() {
        let keys = vec!["make".to_string()];
        let columns = infer_columns(&[], Some(keys.as_slice())).unwrap();
        assert_eq!(columns.len(), 1);
        assert!(infer_columns(&[], None).is_err());
    }
}
