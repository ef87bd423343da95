//! Name and capacity validation, and bulk group naming.

use std::collections::HashSet;

use crate::ValidationError;

/// Trim a display name and reject it if nothing is left.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Normalize a requested capacity: `0` and absent mean unlimited.
pub fn normalize_capacity(requested: Option<i64>) -> Result<Option<u32>, ValidationError> {
    match requested {
        None | Some(0) => Ok(None),
        Some(n) if n < 0 => Err(ValidationError::NegativeCapacity(n)),
        Some(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| ValidationError::CapacityTooLarge(n)),
    }
}

/// Check a bulk-creation request without looking at existing groups.
///
/// Returns the trimmed base name.
pub fn validate_bulk(base: &str, count: i64, max_count: u32) -> Result<String, ValidationError> {
    let base = validate_name(base)?;
    if count < 1 {
        return Err(ValidationError::InvalidCount(count));
    }
    if count > i64::from(max_count) {
        return Err(ValidationError::TooManyGroups {
            requested: count,
            max: max_count,
        });
    }
    Ok(base)
}

/// Produce `count` unique names of the form `"<base> <n>"`.
///
/// Numbering starts at 1 and skips any name already in `existing`, so a second
/// batch with the same base continues where the first stopped.
pub fn plan_group_names<'a, I>(
    base: &str,
    count: i64,
    existing: I,
    max_count: u32,
) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let base = validate_bulk(base, count, max_count)?;

    let taken: HashSet<&str> = existing.into_iter().collect();
    let mut names = Vec::with_capacity(count as usize);
    let mut n: u64 = 1;
    while names.len() < count as usize {
        let candidate = format!("{base} {n}");
        if !taken.contains(candidate.as_str()) {
            names.push(candidate);
        }
        n += 1;
    }
    Ok(names)
}
