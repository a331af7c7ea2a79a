//! Page requests and paged responses.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CmsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => Ok(SortOrder::Asc),
            "DESC" | "DESCENDING" => Ok(SortOrder::Desc),
            other => Err(CmsError::bad_request(format!(
                "Invalid sort order '{other}', expected ASC or DESC"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page,
            page_size: page_size.max(1),
            sort: Sort::new("id", SortOrder::Asc),
        }
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Sort::new(field, order);
        self
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }
}

/// Defaults and limits applied to client supplied paging parameters.
#[derive(Debug, Clone)]
pub struct PagingDefaults {
    pub default_size: u64,
    pub max_size: u64,
    pub default_sort: String,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 100,
            default_sort: "id".to_string(),
        }
    }
}

impl PagingDefaults {
    pub fn request(
        &self,
        page: Option<u64>,
        page_size: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> PageRequest {
        let size = page_size
            .unwrap_or(self.default_size)
            .clamp(1, self.max_size.max(1));
        let sort_by = sort_by
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_sort);

        PageRequest::new(page.unwrap_or(0), size).with_sort(sort_by, sort_order.unwrap_or_default())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub number: u64,
    pub number_of_elements: u64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total_elements.div_ceil(page_size);
        let number = request.page;
        let number_of_elements = content.len() as u64;

        Self {
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages,
            page_size,
            number,
            number_of_elements,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page_size: self.page_size,
            number: self.number,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
