use crate::error::BenchError;
use std::ops::Range;
use std::sync::Arc;

/// A contiguous, read-only view into the shared input.
///
/// Cloning a group clones an `Arc`, not the values, so groups can be moved
/// into `'static` threads and tasks.
#[derive(Debug, Clone)]
pub struct Group {
    pub index: usize,
    data: Arc<[i64]>,
    range: Range<usize>,
}

impl Group {
    pub fn values(&self) -> &[i64] {
        &self.data[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Splits `data` into groups of `group_size` consecutive elements.
///
/// Yields `ceil(len / group_size)` groups; only the last one may be short.
pub fn chunk(data: Arc<[i64]>, group_size: usize) -> Result<Vec<Group>, BenchError> {
    if group_size == 0 {
        return Err(BenchError::invalid_configuration("group_size", 0));
    }

    let groups = (0..data.len())
        .step_by(group_size)
        .enumerate()
        .map(|(index, start)| Group {
            index,
            data: Arc::clone(&data),
            range: start..(start + group_size).min(data.len()),
        })
        .collect();

    Ok(groups)
}

/// The dataset every strategy runs against: `0..size`.
pub fn dataset(size: usize) -> Arc<[i64]> {
    (0..size as i64).collect()
}
