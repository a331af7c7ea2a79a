use cms_core::{CmsError, PageRequest, PagingDefaults, SortOrder};
use serde::Deserialize;

/// Paging query string: `?page=0&pageSize=10&sortBy=name&sortOrder=DESC`.
///
/// `size` is accepted as an alias of `pageSize`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u64>,
    #[serde(alias = "size")]
    pub page_size: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageParams {
    pub fn to_request(&self, defaults: &PagingDefaults) -> Result<PageRequest, CmsError> {
        let order = self
            .sort_order
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<SortOrder>)
            .transpose()?;
        Ok(defaults.request(self.page, self.page_size, self.sort_by.as_deref(), order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_values() {
        let req = PageParams::default().to_request(&PagingDefaults::default()).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.page_size, 10);
        assert_eq!(req.sort.field, "id");
    }

    #[test]
    fn bad_sort_order_is_a_bad_request() {
        let params = PageParams {
            sort_order: Some("up".into()),
            ..PageParams::default()
        };
        let err = params.to_request(&PagingDefaults::default()).unwrap_err();
        assert_eq!(err.code(), 400);
    }
}
