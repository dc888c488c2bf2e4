//! Unified diff of the master list a run would write, for `roster diff`.
//!
//! Passwords are masked on both sides; a backfilled password shows up as an
//! empty cell turning into `********`.

use similar::TextDiff;

use roster_core::{master_list, StoreError, StudentRecord};

use crate::secret::SECRET_MASK;

/// Unified diff between two master lists, or `None` when they render identically.
pub fn master_list_diff(
    previous: &[StudentRecord],
    next: &[StudentRecord],
    label: &str,
) -> Result<Option<String>, StoreError> {
    let old = masked_csv(previous)?;
    let new = masked_csv(next)?;
    if old == new {
        return Ok(None);
    }
    let old_header = format!("a/{label}");
    let new_header = format!("b/{label}");
    let unified = TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(1)
        .to_string();
    Ok(Some(unified))
}

fn masked_csv(records: &[StudentRecord]) -> Result<String, StoreError> {
    let masked: Vec<StudentRecord> = master_list::normalize(records)
        .into_iter()
        .map(|mut r| {
            if r.secret.is_some() {
                r.secret = Some(SECRET_MASK.to_string());
            }
            r
        })
        .collect();
    master_list::to_csv_string(&masked)
}
