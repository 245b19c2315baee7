//! Offset/limit pagination arithmetic shared by every list page.

pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Position within a server-side listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub offset: u64,
  pub limit: u64,
  pub total: u64,
}

impl Pagination {
  /// First page with the given page size. A zero limit is treated as one.
  pub fn new(limit: u64) -> Self {
    Self {
      offset: 0,
      limit: limit.max(1),
      total: 0,
    }
  }

  /// From the API's 1-based `page` / `per_page` pair.
  pub fn from_page(page: u64, per_page: u64) -> Self {
    let limit = per_page.max(1);
    Self {
      offset: page.saturating_sub(1).saturating_mul(limit),
      limit,
      total: 0,
    }
  }

  pub fn with_total(mut self, total: u64) -> Self {
    self.total = total;
    self
  }

  /// 1-based page number for the API.
  pub fn page(&self) -> u64 {
    (self.offset / self.limit).saturating_add(1)
  }

  pub fn per_page(&self) -> u64 {
    self.limit
  }

  pub fn has_previous(&self) -> bool {
    self.offset > 0
  }

  pub fn has_next(&self) -> bool {
    self.offset.saturating_add(self.limit) < self.total
  }

  /// Advance one page. Returns false (and stays put) at the end.
  pub fn next(&mut self) -> bool {
    if !self.has_next() {
      return false;
    }
    self.offset += self.limit;
    true
  }

  /// Go back one page. Returns false (and stays put) at the start.
  pub fn previous(&mut self) -> bool {
    if !self.has_previous() {
      return false;
    }
    self.offset = self.offset.saturating_sub(self.limit);
    true
  }

  /// Pull the offset back onto the last page when the total shrank.
  pub fn clamp(&mut self) {
    if self.total == 0 {
      self.offset = 0;
    } else if self.offset >= self.total {
      self.offset = (self.total - 1) / self.limit * self.limit;
    }
  }

  /// "Showing X to Y of Z" without the "Showing".
  pub fn range_label(&self) -> String {
    if self.total == 0 {
      return "0 of 0".to_string();
    }
    let first = self.offset.saturating_add(1).min(self.total);
    let last = self.offset.saturating_add(self.limit).min(self.total);
    format!("{} to {} of {}", first, last, self.total)
  }
}

impl Default for Pagination {
  fn default() -> Self {
    Self::new(DEFAULT_PAGE_SIZE)
  }
}
