use serde::Deserialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw, lenient pagination input. Values that fail to parse fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = parse_page(self.page.as_deref());
        let per_page = parse_per_page(self.per_page.as_deref());
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn parse_per_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Descending only on an explicit match; everything else is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Sortable product columns. Unknown input falls back to the name column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortBy {
    Name,
    Price,
    Stock,
    CreatedAt,
}

impl ProductSortBy {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price") => ProductSortBy::Price,
            Some("stock") => ProductSortBy::Stock,
            Some("created_at") => ProductSortBy::CreatedAt,
            _ => ProductSortBy::Name,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShopQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub q: Option<String>,
}

/// Validated, bounded product listing description.
#[derive(Debug)]
pub struct ProductListing {
    pub sort_by: ProductSortBy,
    pub sort_order: SortOrder,
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub search: Option<String>,
}

impl ShopQuery {
    pub fn normalize(&self) -> ProductListing {
        let (page, per_page, offset) = self.pagination.normalize();
        ProductListing {
            sort_by: ProductSortBy::parse(self.sort_by.as_deref()),
            sort_order: SortOrder::parse(self.sort_order.as_deref()),
            page,
            per_page,
            offset,
            search: normalize_search(self.q.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
}

/// Validated, bounded user listing description. Always sorted by username.
#[derive(Debug)]
pub struct UserListing {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub search: Option<String>,
}

impl UserListQuery {
    pub fn normalize(&self) -> UserListing {
        let (page, per_page, offset) = self.pagination.normalize();
        UserListing {
            page,
            per_page,
            offset,
            search: normalize_search(self.q.as_deref()),
        }
    }
}

fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(page: Option<&str>, per_page: Option<&str>) -> Pagination {
        Pagination {
            page: page.map(String::from),
            per_page: per_page.map(String::from),
        }
    }

    #[test]
    fn missing_values_use_defaults() {
        let (page, per_page, offset) = pagination(None, None).normalize();
        assert_eq!((page, per_page, offset), (1, DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let (page, per_page, _) = pagination(Some("abc"), Some("lots")).normalize();
        assert_eq!((page, per_page), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn out_of_range_values_are_bounded() {
        let (page, per_page, _) = pagination(Some("0"), Some("10000")).normalize();
        assert_eq!((page, per_page), (1, MAX_PAGE_SIZE));
        let (page, _, _) = pagination(Some("-3"), None).normalize();
        assert_eq!(page, 1);
    }

    #[test]
    fn offset_follows_page() {
        let (_, _, offset) = pagination(Some("3"), Some("20")).normalize();
        assert_eq!(offset, 40);
    }

    #[test]
    fn unknown_sort_column_falls_back_to_name() {
        assert_eq!(ProductSortBy::parse(Some("price")), ProductSortBy::Price);
        assert_eq!(
            ProductSortBy::parse(Some("password_hash")),
            ProductSortBy::Name
        );
        assert_eq!(ProductSortBy::parse(None), ProductSortBy::Name);
    }

    #[test]
    fn direction_is_desc_only_on_match() {
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(None), SortOrder::Asc);
    }

    #[test]
    fn search_terms_are_trimmed() {
        let query = ShopQuery {
            q: Some("  hoodie ".into()),
            ..Default::default()
        };
        assert_eq!(query.normalize().search, Some("hoodie".into()));

        let blank = ShopQuery {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.normalize().search, None);
    }
}
