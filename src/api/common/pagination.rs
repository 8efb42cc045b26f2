//
//  pampu
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! List Envelope for Bamboo Collections
//!
//! Bamboo wraps every collection in an object carrying paging counters and a
//! singular-named array:
//!
//! ```json
//! {"projects": {"size": 2, "start-index": 0, "max-result": 2,
//!               "project": [{"key": "PROJ", "name": "Project"}]}}
//! ```
//!
//! [`ListPage`] models the inner object for any item type. The array key
//! differs per resource (`project`, `plan`, `branch`, `result`, ...) so the
//! field accepts each of them.
//!
//! # Notes
//!
//! - Only a single page is ever requested; callers pass a `max-result` large
//!   enough for their listing instead of following `start-index`
//! - A missing array deserializes as empty

use serde::{Deserialize, Serialize};

/// One page of a Bamboo collection.
///
/// # Type Parameters
///
/// - `T` - The type of items contained in the page
///
/// # Example
///
/// ```rust
/// use pampu::api::common::ListPage;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Item { key: String }
///
/// let json = r#"{"size": 1, "start-index": 0, "max-result": 1, "plan": [{"key": "PROJ-PLAN"}]}"#;
/// let page: ListPage<Item> = serde_json::from_str(json).unwrap();
/// assert_eq!(page.items[0].key, "PROJ-PLAN");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    /// Total number of items Bamboo reports for the collection
    #[serde(default)]
    pub size: Option<u32>,

    /// Index of the first item in this page
    #[serde(rename = "start-index", default)]
    pub start_index: Option<u32>,

    /// Page size Bamboo applied
    #[serde(rename = "max-result", default)]
    pub max_result: Option<u32>,

    /// Items in this page
    #[serde(
        alias = "project",
        alias = "plan",
        alias = "branch",
        alias = "result",
        alias = "stage",
        alias = "logEntry",
        default = "Vec::new"
    )]
    pub items: Vec<T>,
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            size: None,
            start_index: None,
            max_result: None,
            items: Vec::new(),
        }
    }
}

impl<T> ListPage<T> {
    /// Returns `true` if the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the page and returns its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
