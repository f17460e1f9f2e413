use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

// 分页响应信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationInfo {
    /// 规整查询参数：页码从 1 开始，每页条数限制在 1..=MAX_PAGE_SIZE
    pub fn clamp(page: Option<u64>, size: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }

    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_defaults_and_bounds() {
        assert_eq!(PaginationInfo::clamp(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(PaginationInfo::clamp(Some(0), Some(0)), (1, 1));
        assert_eq!(PaginationInfo::clamp(Some(3), Some(10_000)), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 20, 20).total_pages, 1);
        assert_eq!(PaginationInfo::new(2, 20, 21).total_pages, 2);
    }
}
