use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Direction carried on the committed list parameters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[strum(serialize = "asc")]
    Asc,
    #[strum(serialize = "desc")]
    Desc,
}

/// The committed query parameters that drive the external data fetch.
///
/// A `ListParams` value is never edited in place by the controller: every
/// change builds a new snapshot with the struct-update syntax, so observers
/// only ever see a complete set of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ListParams {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    pub fn new(page_size: u32) -> Self {
        ListParams {
            search: None,
            status: None,
            page: 1,
            page_size,
            sort_by: None,
            sort_order: None,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        ListParams {
            page,
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: u32) -> Self {
        ListParams {
            page_size,
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: &str) -> Self {
        ListParams {
            search: Some(search.to_owned()),
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_status(&self, status: &str) -> Self {
        ListParams {
            status: Some(status.to_owned()),
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort_by: Option<&str>, sort_order: Option<SortOrder>) -> Self {
        ListParams {
            sort_by: sort_by.map(str::to_owned),
            sort_order,
            page: 1,
            ..self.clone()
        }
    }

    /// Basic search and status reset to empty strings, back to the first page.
    /// Page size and sort survive.
    pub fn cleared(&self) -> Self {
        ListParams {
            search: Some(String::new()),
            status: Some(String::new()),
            page: 1,
            ..self.clone()
        }
    }

    pub fn search_str(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }

    pub fn status_str(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}
