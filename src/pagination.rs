//! Pagination helpers for the book list.

/// Books shown per page when the config does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Page numbers `1..=ceil(total_count / page_size)` used to build the
/// pagination links. An empty catalog (or a zero page size) has no pages.
///
/// ```
/// use shelf::pagination::page_numbers;
///
/// assert_eq!(page_numbers(12, 5), vec![1, 2, 3]);
/// assert_eq!(page_numbers(10, 5), vec![1, 2]);
/// assert!(page_numbers(0, 5).is_empty());
/// ```
pub fn page_numbers(total_count: u64, page_size: u32) -> Vec<u64> {
    if page_size == 0 {
        return vec![];
    }
    (1..=total_count.div_ceil(page_size as u64)).collect()
}

/// Row offset of a 1-based page number. Page 0 is treated as page 1.
pub fn offset_for(page: u32, page_size: u32) -> u64 {
    page.saturating_sub(1) as u64 * page_size as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_numbers_partial_last_page() {
        assert_eq!(page_numbers(12, 5), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_numbers_exact_boundary() {
        assert_eq!(page_numbers(10, 5), vec![1, 2]);
    }

    #[test]
    fn test_page_numbers_empty() {
        assert!(page_numbers(0, 5).is_empty());
        assert!(page_numbers(7, 0).is_empty());
    }

    #[test]
    fn test_page_numbers_count_matches_ceiling() {
        for total in 0..=40u64 {
            for size in 1..=7u32 {
                let pages = page_numbers(total, size);
                let expected = (total + size as u64 - 1) / size as u64;
                assert_eq!(pages.len() as u64, expected, "total={total} size={size}");
                assert!(pages.iter().copied().eq(1..=expected));
            }
        }
    }

    #[test]
    fn test_offset_for() {
        assert_eq!(offset_for(1, 5), 0);
        assert_eq!(offset_for(3, 5), 10);
        assert_eq!(offset_for(0, 5), 0);
    }
}
