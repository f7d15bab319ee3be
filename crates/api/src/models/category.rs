//! Category domain type.

use serde::Serialize;

use pitchside_core::CategoryId;

/// A product category.
///
/// Products reference categories by name rather than id, so renaming a
/// category does not cascade to its products.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image: String,
}
