//! Request bodies shared by several route groups.

pub mod approval;

pub use approval::{ApprovalConfigRequest, approval_pipeline};

use serde::{Deserialize, Deserializer};

/// Tells an explicit `null` apart from an absent field.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
