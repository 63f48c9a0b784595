//! Entity records mirroring Asana API resources.
//!
//! Entities are flat and immutable once decoded: constructed from a page of
//! a paginated listing, serialized to one JSON file each, then discarded.
//! The `gid` is Asana's opaque stable identifier and is used verbatim in
//! persisted filenames.

use serde::{Deserialize, Deserializer, Serialize};

/// A workspace member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub gid: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
}

/// A workspace project.
///
/// `completed_by` and `completed_at` are empty strings until the project is
/// completed; the remote sends null or omits them before that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub gid: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub completed_by: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub completed_at: String,
}

/// One page of a paginated listing response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub data: Vec<T>,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

/// Cursor to the next page; absent or null on the last page.
#[derive(Debug, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub offset: String,
}

// Explicit null decodes to the field's default, mirroring the remote's
// habit of sending null for unset attributes.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
