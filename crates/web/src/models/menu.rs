//! Navigation menu types.
//!
//! The menu is a small JSON document on disk, not a table.

use serde::{Deserialize, Serialize};

/// A top-level navigation entry.
///
/// Missing `title` or `href` deserialize as empty so validation can report
/// them per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub href: String,
    #[serde(default, alias = "subMenu", skip_serializing_if = "Vec::is_empty")]
    pub submenu: Vec<SubMenuItem>,
}

/// A nested navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMenuItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub href: String,
}
