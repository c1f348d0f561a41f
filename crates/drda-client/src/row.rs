//! Rows and result sets.
//!
//! Query replies are fully decoded by the response parser before they reach
//! the caller, so a [`ResultSet`] owns every row of the query and hands them
//! out in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use drda_protocol::ColumnDescriptor;
use drda_types::{FromSql, SqlValue, TypeError, TypeInfo};

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column label, when the server sends one.
    pub label: Option<String>,
    /// Column index (0-based).
    pub index: usize,
    /// SQL type name.
    pub type_name: &'static str,
    /// SQLTYPE code.
    pub sql_type: i16,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Declared length.
    pub length: i64,
    /// Decimal precision.
    pub precision: i16,
    /// Decimal scale.
    pub scale: i16,
    /// Schema of the base table.
    pub schema: Option<String>,
    /// Base table name.
    pub base_table: Option<String>,
}

impl Column {
    /// Create column metadata from an SQLDARD descriptor.
    #[must_use]
    pub fn from_descriptor(index: usize, desc: &ColumnDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            label: Some(desc.label.clone()).filter(|l| !l.is_empty() && *l != desc.name),
            index,
            type_name: desc.type_name(),
            sql_type: desc.sql_type,
            nullable: desc.is_nullable(),
            length: desc.length,
            precision: desc.precision,
            scale: desc.scale,
            schema: desc.schema.clone(),
            base_table: desc.base_table.clone(),
        }
    }

    /// Placeholder metadata for a column known only from its data layout.
    #[must_use]
    pub fn from_layout(index: usize, info: &TypeInfo) -> Self {
        Self {
            name: format!("COL{}", index + 1),
            label: None,
            index,
            type_name: info.drda_type.name(),
            sql_type: 0,
            nullable: info.nullable,
            length: i64::from(info.length),
            precision: i16::from(info.precision),
            scale: i16::from(info.scale),
            schema: None,
            base_table: None,
        }
    }
}

/// A row from a query result.
///
/// Rows share the column metadata of their result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create a row from decoded values.
    #[must_use]
    pub fn new(columns: Arc<[Column]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column index.
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T, TypeError> {
        self.values
            .get(index)
            .ok_or_else(|| TypeError::TypeMismatch {
                expected: "valid column index",
                actual: format!("index {index} out of bounds (row has {} columns)", self.values.len()),
            })
            .and_then(T::from_sql)
    }

    /// Get a value by column name (case-insensitive).
    pub fn get_by_name<T: FromSql>(&self, name: &str) -> Result<T, TypeError> {
        let index = self.column_index(name).ok_or_else(|| TypeError::TypeMismatch {
            expected: "valid column name",
            actual: format!("column '{name}' not found"),
        })?;
        self.get(index)
    }

    /// Get a value by index, `None` when the index is out of range or the
    /// conversion fails.
    #[must_use]
    pub fn try_get<T: FromSql>(&self, index: usize) -> Option<T> {
        self.values
            .get(index)
            .and_then(|v| T::from_sql_nullable(v).ok().flatten())
    }

    /// Get a value by name, `None` when the column is missing or the
    /// conversion fails.
    #[must_use]
    pub fn try_get_by_name<T: FromSql>(&self, name: &str) -> Option<T> {
        self.column_index(name).and_then(|i| self.try_get(i))
    }

    /// Raw value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Whether the value at `index` is NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(SqlValue::is_null)
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Consume the row and return its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    /// Column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        find_column(&self.columns, name)
    }
}

fn find_column(columns: &[Column], name: &str) -> Option<usize> {
    columns.iter().position(|c| c.name.eq_ignore_ascii_case(name))
}

/// The rows returned by one query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Arc<[Column]>,
    rows: VecDeque<Row>,
}

impl ResultSet {
    /// Build a result set from column metadata and decoded rows.
    #[must_use]
    pub fn new(columns: Vec<Column>, rows: impl IntoIterator<Item = Vec<SqlValue>>) -> Self {
        let columns: Arc<[Column]> = columns.into();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self { columns, rows }
    }

    /// Column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Index of the column called `name` (case-insensitive).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        find_column(&self.columns, name)
    }

    /// Rows not yet taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether every row has been taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take the next row.
    pub fn next_row(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Take all remaining rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows.into()
    }
}

impl Iterator for ResultSet {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

impl ExactSizeIterator for ResultSet {}
