//! Vectorized batch wrapper around Arrow `RecordBatch`.

use arrow::array::ArrayRef;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, VexprError};
use crate::types::EvalType;

use super::column::Column;

/// Default batch size for vectorized execution (rows per batch).
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Read-only input of one evaluation call: an Arrow `RecordBatch` with an
/// optional selection vector.
///
/// The logical row count `n` is the selection length when a selection is
/// present; every operand column produced for this batch has exactly `n` rows.
#[derive(Debug, Clone)]
pub struct VectorizedBatch {
    /// The underlying Arrow RecordBatch.
    batch: RecordBatch,
    /// Optional selection vector for filtered rows.
    selection: Option<SelectionVector>,
}

impl VectorizedBatch {
    /// Creates a new vectorized batch from a RecordBatch.
    pub fn new(batch: RecordBatch) -> Self {
        VectorizedBatch {
            batch,
            selection: None,
        }
    }

    /// Creates a new vectorized batch with a selection vector.
    pub fn with_selection(batch: RecordBatch, selection: SelectionVector) -> Self {
        VectorizedBatch {
            batch,
            selection: Some(selection),
        }
    }

    /// Creates a batch with `num_rows` rows and no columns.
    ///
    /// Useful for evaluating constant-only expression trees.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the empty batch cannot be built.
    pub fn empty_with_rows(num_rows: usize) -> Result<Self> {
        let schema = std::sync::Arc::new(arrow::datatypes::Schema::empty());
        let options = arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch = RecordBatch::try_new_with_options(schema, vec![], &options)?;
        Ok(VectorizedBatch::new(batch))
    }

    /// Returns the underlying RecordBatch.
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Returns the selection vector, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionVector> {
        self.selection.as_ref()
    }

    /// Returns the schema of this batch.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Returns the number of rows in this batch.
    ///
    /// If there's a selection vector, returns the number of selected rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.selection
            .as_ref()
            .map_or_else(|| self.batch.num_rows(), SelectionVector::len)
    }

    /// Returns the number of columns in this batch.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns a column by index.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ArrayRef> {
        (index < self.batch.num_columns()).then(|| self.batch.column(index))
    }

    /// Maps a logical row to its position in the underlying arrays.
    #[must_use]
    pub fn physical_row(&self, row: usize) -> usize {
        match &self.selection {
            Some(selection) => selection.indices[row] as usize,
            None => row,
        }
    }

    /// Narrows this batch to the rows where `predicate` holds.
    ///
    /// `predicate` is an `Int` column with one slot per logical row, as
    /// produced by a relational signature: rows whose value is non-zero and
    /// not NULL are kept.
    ///
    /// # Errors
    ///
    /// Returns a type error if `predicate` is not an `Int` column, or an
    /// invalid-argument error if its length differs from the batch.
    pub fn filter(&self, predicate: &Column) -> Result<Self> {
        if predicate.eval_type() != EvalType::Int {
            return Err(VexprError::TypeError {
                expected: EvalType::Int.name().into(),
                actual: predicate.eval_type().name().into(),
            });
        }
        if predicate.len() != self.num_rows() {
            return Err(VexprError::InvalidArgument(format!(
                "Predicate has {} rows, batch has {}",
                predicate.len(),
                self.num_rows()
            )));
        }

        let indices = predicate
            .i64s()
            .iter()
            .enumerate()
            .filter(|&(row, &v)| v != 0 && !predicate.is_null(row))
            .map(|(row, _)| self.physical_row(row) as u32)
            .collect();

        Ok(VectorizedBatch::with_selection(
            self.batch.clone(),
            SelectionVector::new(indices),
        ))
    }
}

/// Selection vector for filtered batches.
///
/// Instead of materializing filtered results immediately,
/// we keep track of which rows are selected for lazy evaluation.
#[derive(Debug, Clone)]
pub struct SelectionVector {
    /// Indices of selected rows.
    pub indices: Vec<u32>,
}

impl SelectionVector {
    /// Creates a new selection vector with the given indices.
    pub fn new(indices: Vec<u32>) -> Self {
        SelectionVector { indices }
    }

    /// Returns the number of selected rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no rows are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the index at the given position.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<u32> {
        self.indices.get(pos).copied()
    }
}
