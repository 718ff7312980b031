use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Fixed-size page window over the filtered and sorted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_index: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages for `total` rows. An empty result still has one page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Page index pulled into range for `total` rows, without mutating.
    pub fn clamped_index(&self, total: usize) -> usize {
        self.page_index.min(self.page_count(total) - 1)
    }

    pub fn clamp(&mut self, total: usize) {
        self.page_index = self.clamped_index(total);
    }

    /// Row positions of the current page.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.clamped_index(total) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn can_next(&self, total: usize) -> bool {
        self.clamped_index(total) + 1 < self.page_count(total)
    }

    /// No-op on the last page.
    pub fn next_page(&mut self, total: usize) {
        if self.can_next(total) {
            self.page_index = self.clamped_index(total) + 1;
        }
    }

    /// No-op on the first page.
    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn go_to(&mut self, page_index: usize, total: usize) {
        self.page_index = page_index;
        self.clamp(total);
    }

    /// Change the page size, keeping the first row of the current page on
    /// screen where possible.
    pub fn set_page_size(&mut self, page_size: usize, total: usize) {
        let first_row = self.range(total).start;
        self.page_size = page_size.max(1);
        self.page_index = first_row / self.page_size;
        self.clamp(total);
    }

    pub fn reset(&mut self) {
        self.page_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_raised_to_one() {
        assert_eq!(Pagination::new(0).page_size(), 1);
    }

    #[test]
    fn page_count_and_ranges() {
        let p = Pagination::new(10);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.page_count(10), 1);
        assert_eq!(p.page_count(11), 2);
        assert_eq!(p.range(25), 0..10);
        assert_eq!(p.range(0), 0..0);
    }

    #[test]
    fn next_and_previous_stop_at_boundaries() {
        let mut p = Pagination::new(10);
        p.previous_page();
        assert_eq!(p.page_index(), 0);

        p.next_page(25);
        p.next_page(25);
        assert_eq!(p.page_index(), 2);
        assert_eq!(p.range(25), 20..25);
        p.next_page(25);
        assert_eq!(p.page_index(), 2);

        p.previous_page();
        assert_eq!(p.page_index(), 1);
    }

    #[test]
    fn shrinking_total_pulls_page_back() {
        let mut p = Pagination::new(10);
        p.go_to(4, 50);
        assert_eq!(p.page_index(), 4);
        p.clamp(12);
        assert_eq!(p.page_index(), 1);
        p.clamp(0);
        assert_eq!(p.page_index(), 0);
    }

    #[test]
    fn page_size_change_keeps_first_row_visible() {
        let mut p = Pagination::new(10);
        p.go_to(3, 100); // rows 30..40
        p.set_page_size(25, 100);
        assert_eq!(p.page_index(), 1); // rows 25..50
        assert!(p.range(100).contains(&30));

        p.set_page_size(5, 100);
        assert_eq!(p.page_index(), 5);
        assert_eq!(p.range(100).start, 25);
    }

    #[test]
    fn page_size_change_clamps_when_unreachable() {
        let mut p = Pagination::new(2);
        p.go_to(4, 10); // rows 8..10
        p.set_page_size(20, 10);
        assert_eq!(p.page_index(), 0);
    }

    #[test]
    fn index_stays_in_bounds_for_many_sizes() {
        for total in 0..40 {
            for size in 1..12 {
                let mut p = Pagination::new(size);
                p.go_to(usize::MAX, total);
                let last = total.div_ceil(size).max(1) - 1;
                assert_eq!(p.page_index(), last);
                p.next_page(total);
                assert!(p.page_index() <= last);
            }
        }
    }
}
