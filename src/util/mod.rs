pub mod slug;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field so that an explicit `null` is told apart
/// from an absent key: absent is `None` (via `#[serde(default)]`), `null`
/// is `Some(None)`.
pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
