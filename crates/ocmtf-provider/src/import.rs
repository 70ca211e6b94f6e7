//! Import identifiers.
//!
//! Identifiers are comma-separated and positional, e.g.
//! `<cluster_id>,<machine_pool_id>`.

use crate::error::ProviderError;

/// Split `id` into exactly `N` non-blank parts.
///
/// `subject` and `shape` only feed the error message: "`subject` to import
/// should be specified as `shape`".
pub fn parse_id<'a, const N: usize>(
    id: &'a str,
    subject: &str,
    shape: &str,
) -> Result<[&'a str; N], ProviderError> {
    let invalid = || {
        ProviderError::invalid(
            "Invalid import identifier",
            format!("{subject} to import should be specified as {shape}"),
        )
    };

    let parts: Vec<&str> = id.split(',').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    parts.try_into().map_err(|_| invalid())
}
