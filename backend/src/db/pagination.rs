//! Page/limit pagination shared by the list queries

/// A zero-based page of `limit` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Rows to skip: `page * limit`
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.limit)
    }

    /// Number of pages needed to hold `total` rows
    pub fn total_pages(&self, total: i64) -> i64 {
        if self.limit <= 0 || total <= 0 {
            return 0;
        }
        (total + self.limit - 1) / self.limit
    }

    /// Whether rows remain after this page
    pub fn has_next_page(&self, total: i64) -> bool {
        self.offset().saturating_add(self.limit) < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_zero_based() {
        assert_eq!(Pagination::new(0, 10).offset(), 0);
        assert_eq!(Pagination::new(1, 1).offset(), 1);
        assert_eq!(Pagination::new(3, 25).offset(), 75);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
    }

    #[test]
    fn test_has_next_page() {
        assert!(Pagination::new(0, 2).has_next_page(3));
        assert!(!Pagination::new(1, 2).has_next_page(3));
        assert!(!Pagination::new(0, 5).has_next_page(5));
    }
}
