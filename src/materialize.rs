//! Turning a backend row cursor into [`GenericRecord`]s.

use crate::error::PlanResult;
use crate::record::{Field, GenericRecord};
use crate::value::{Value, ValueType};

/// A forward-only cursor over the rows of one execution.
///
/// The cursor owns whatever backend resource carries the result set;
/// dropping it releases that resource.
pub trait RowCursor {
    /// Move to the next row. Returns `false` once the rows are exhausted.
    fn advance(&mut self) -> PlanResult<bool>;

    /// Number of visible columns of the current row.
    fn field_count(&self) -> usize;

    fn field_name(&self, index: usize) -> &str;

    /// Declared type of a column.
    fn field_type(&self, index: usize) -> ValueType;

    /// Value of a column in the current row; [`Value::Null`] for SQL `NULL`.
    fn value(&self, index: usize) -> PlanResult<Value>;
}

/// Read the current row of `cursor` into a record, in column order.
pub fn read_record(cursor: &dyn RowCursor) -> PlanResult<GenericRecord> {
    let fields = (0..cursor.field_count())
        .map(|i| {
            Ok(Field::new(
                cursor.field_name(i),
                cursor.field_type(i),
                cursor.value(i)?,
            ))
        })
        .collect::<PlanResult<Vec<_>>>()?;
    Ok(GenericRecord::new(fields))
}

/// A lazy, single-pass sequence of records.
///
/// Rows are pulled from the cursor as the sequence is iterated. It cannot be
/// restarted: reading the rows again means executing the query again. The
/// sequence ends after the last row or after the first error.
pub struct Records<'c> {
    cursor: Option<Box<dyn RowCursor + 'c>>,
    read: usize,
}

impl<'c> Records<'c> {
    pub fn new(cursor: Box<dyn RowCursor + 'c>) -> Self {
        Self {
            cursor: Some(cursor),
            read: 0,
        }
    }

    /// Drain the remaining rows into a list.
    pub fn into_list(self) -> PlanResult<Vec<GenericRecord>> {
        self.collect()
    }

    /// Read the first remaining row, if any, and release the cursor.
    pub fn first(mut self) -> PlanResult<Option<GenericRecord>> {
        let first = self.next().transpose();
        self.close();
        first
    }

    fn close(&mut self) {
        if self.cursor.take().is_some() {
            tracing::trace!(rows = self.read, "cursor released");
        }
    }
}

impl Iterator for Records<'_> {
    type Item = PlanResult<GenericRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let row = match cursor.advance() {
            Ok(true) => read_record(&**cursor),
            Ok(false) => {
                self.close();
                return None;
            }
            Err(e) => Err(e),
        };
        match row {
            Ok(record) => {
                self.read += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Records<'_> {}

impl std::fmt::Debug for Records<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("open", &self.cursor.is_some())
            .field("read", &self.read)
            .finish()
    }
}

/// An in-memory cursor over prepared rows, for backends that hand back a
/// whole result set at once.
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    columns: Vec<(String, ValueType)>,
    rows: std::collections::VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl VecCursor {
    pub fn new(columns: Vec<(String, ValueType)>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            current: None,
        }
    }
}

impl RowCursor for VecCursor {
    fn advance(&mut self) -> PlanResult<bool> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> &str {
        &self.columns[index].0
    }

    fn field_type(&self, index: usize) -> ValueType {
        self.columns[index].1
    }

    fn value(&self, index: usize) -> PlanResult<Value> {
        Ok(self
            .current
            .as_ref()
            .and_then(|row| row.get(index))
            .cloned()
            .unwrap_or(Value::Null))
    }
}
