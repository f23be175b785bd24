//! Time alignment: trimming every time-indexed field to a common length
//!
//! Rounding at the signal boundary can leave different binners one bin
//! apart. Alignment finds the shortest time axis, truncates every
//! time-indexed field to it, then drops the axis fields themselves, since
//! after truncation every row index maps to the same bin start time.
//! Trigger fields convert to sparse index lists only after truncation, so
//! their indices are valid in the trimmed coordinate system.

use ntd_core::{NtdError, NtdResult, TrialData, TrialField, TIME_AXIS_SUFFIX};
use tracing::debug;

/// Truncate all time-indexed fields to the shortest time axis and remove
/// the `*_t` fields. Returns the common row count, or `None` when the
/// trial holds no time-indexed field at all.
pub fn align(trial: &mut TrialData) -> NtdResult<Option<usize>> {
    let axis_names = trial.time_axis_names();
    if axis_names.is_empty() {
        return Ok(None);
    }

    let mut t_min = usize::MAX;
    for name in &axis_names {
        let rows = trial
            .get(name)
            .and_then(TrialField::row_count)
            .ok_or_else(|| NtdError::InvalidSignalData {
                reason: format!("Time axis '{}' is not a column vector", name),
            })?;
        t_min = t_min.min(rows);
    }

    for (name, field) in trial.iter_mut() {
        if let TrialField::Matrix(matrix) = field {
            if matrix.rows() > t_min {
                debug!(field = name, from = matrix.rows(), to = t_min, "truncating");
                matrix.truncate_rows(t_min);
            }
        }
    }

    for name in axis_names {
        trial.remove(&name);
    }

    Ok(Some(t_min))
}

/// Replace each dense trigger-count field with a sparse `idx_{name}` list
/// of the bins where an edge landed. Runs after [`align`], so the indices
/// are in post-truncation bin coordinates.
pub fn resolve_triggers(trial: &mut TrialData, trigger_names: &[String]) -> NtdResult<()> {
    for name in trigger_names {
        let counts = match trial.remove(name) {
            Some(TrialField::Matrix(m)) => m,
            Some(other) => {
                trial.insert(name, other);
                return Err(NtdError::InvalidSignalData {
                    reason: format!("Trigger '{}' is not a dense count field", name),
                });
            }
            None => continue,
        };

        let column = counts.column(0)?;
        let indices: Vec<usize> = column
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0.0)
            .map(|(bin, _)| bin)
            .collect();

        trial.insert(&format!("idx_{}", name), TrialField::Indices(indices));
    }
    Ok(())
}
