//! Catalog query state: search text, filters, and sort order.

/// Sort order for the book list.
///
/// Maps to the API's `ordering` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Title,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SortKey {
    /// The `ordering` query parameter value for this sort key.
    #[must_use]
    pub const fn ordering_param(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::Newest => "-created_at",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ordering_param())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "price" | "price-asc" => Ok(Self::PriceAsc),
            "-price" | "price-desc" => Ok(Self::PriceDesc),
            "-created_at" | "newest" => Ok(Self::Newest),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// Active catalog filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookFilters {
    /// Author substring match; empty means no author filter.
    pub author: String,
    /// Restrict results to books with stock > 0.
    pub in_stock_only: bool,
}

/// A partial filter update. `None` fields leave the current value alone,
/// so filter changes compose with each other and with the search text.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub author: Option<String>,
    pub in_stock_only: Option<bool>,
}

impl BookFilters {
    /// Merge a partial update into the current filters.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(in_stock_only) = patch.in_stock_only {
            self.in_stock_only = in_stock_only;
        }
    }
}

/// The full catalog query: free-text search, filters, and sort order.
///
/// Each mutation touches one slice; the whole merged query is sent on every
/// book-list request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookQuery {
    pub search: String,
    pub filters: BookFilters,
    pub sort: SortKey,
}

impl BookQuery {
    /// Render the query as URL parameters for the book-list endpoint.
    ///
    /// Empty slices are omitted; `ordering` is always present.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if !self.filters.author.is_empty() {
            params.push(("author", self.filters.author.clone()));
        }
        if self.filters.in_stock_only {
            params.push(("in_stock", "true".to_string()));
        }
        params.push(("ordering", self.sort.ordering_param().to_string()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_params() {
        assert_eq!(SortKey::Title.ordering_param(), "title");
        assert_eq!(SortKey::PriceAsc.ordering_param(), "price");
        assert_eq!(SortKey::PriceDesc.ordering_param(), "-price");
        assert_eq!(SortKey::Newest.ordering_param(), "-created_at");
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("title".parse::<SortKey>(), Ok(SortKey::Title));
        assert_eq!("price".parse::<SortKey>(), Ok(SortKey::PriceAsc));
        assert_eq!("price-desc".parse::<SortKey>(), Ok(SortKey::PriceDesc));
        assert_eq!("newest".parse::<SortKey>(), Ok(SortKey::Newest));
        assert!("backwards".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_default_query_params() {
        let params = BookQuery::default().to_params();
        assert_eq!(params, vec![("ordering", "title".to_string())]);
    }

    #[test]
    fn test_filter_patch_preserves_search() {
        let mut query = BookQuery {
            search: "dune".to_string(),
            ..BookQuery::default()
        };
        query.filters.merge(FilterPatch {
            author: Some("Herbert".to_string()),
            in_stock_only: None,
        });

        let params = query.to_params();
        assert!(params.contains(&("search", "dune".to_string())));
        assert!(params.contains(&("author", "Herbert".to_string())));
    }

    #[test]
    fn test_filter_patch_merges_one_slice() {
        let mut filters = BookFilters {
            author: "Le Guin".to_string(),
            in_stock_only: false,
        };
        filters.merge(FilterPatch {
            author: None,
            in_stock_only: Some(true),
        });

        assert_eq!(filters.author, "Le Guin");
        assert!(filters.in_stock_only);
    }

    #[test]
    fn test_full_query_params() {
        let query = BookQuery {
            search: "sea".to_string(),
            filters: BookFilters {
                author: "Le Guin".to_string(),
                in_stock_only: true,
            },
            sort: SortKey::PriceDesc,
        };

        assert_eq!(
            query.to_params(),
            vec![
                ("search", "sea".to_string()),
                ("author", "Le Guin".to_string()),
                ("in_stock", "true".to_string()),
                ("ordering", "-price".to_string()),
            ]
        );
    }
}
