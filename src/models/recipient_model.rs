//! models/recipient_model.rs
//! Fila de destinatario tal como llega de la hoja de cálculo ya parseada.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Una fila: columna -> valor, en el orden de columnas original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientRow {
    cells: Vec<(String, String)>,
}

impl RecipientRow {
    /// Columna repetida: gana el último valor, conserva la posición original.
    fn insert(&mut self, column: String, value: String) {
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.iter().any(|(c, _)| c == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for RecipientRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(cells: I) -> Self {
        let mut row = RecipientRow::default();
        for (k, v) in cells {
            row.insert(k.into(), v.into());
        }
        row
    }
}

impl Serialize for RecipientRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.cells.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for RecipientRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RowVisitor)
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = RecipientRow;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping column names to cell values")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = RecipientRow::default();
        while let Some((column, value)) = map.next_entry::<String, Value>()? {
            row.insert(column, cell_to_string(value));
        }
        Ok(row)
    }
}

// Las celdas numéricas de Excel llegan como números; null = celda vacía
fn cell_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
