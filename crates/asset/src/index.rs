//! Resolution of 1-based, possibly negative OBJ element references.

use crate::error::ReferenceError;

/// Resolve a signed 1-based `reference` against a pool holding `len` elements.
///
/// Positive references count from the start (`1` is the first element),
/// negative ones count back from the most recently declared element (`-1`
/// is the last). The result is a 0-based index in `0..len`.
pub fn resolve_index(reference: i64, len: usize) -> Result<usize, ReferenceError> {
    if reference == 0 {
        return Err(ReferenceError::Zero);
    }

    let pool = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if reference > 0 {
        reference - 1
    } else {
        pool + reference
    };

    if resolved < 0 || resolved >= pool {
        return Err(ReferenceError::OutOfRange { reference, len });
    }

    Ok(resolved as usize)
}

/// Parse a reference token and resolve it with [`resolve_index`].
pub fn parse_reference(token: &str, len: usize) -> Result<usize, ReferenceError> {
    let reference = token
        .parse::<i64>()
        .map_err(|_| ReferenceError::NotANumber(token.to_string()))?;
    resolve_index(reference, len)
}
