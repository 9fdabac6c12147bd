use crate::errors::{Result, TfpHubError};
use serde_json::Value;
use std::future::Future;

/// 数据源在响应里报告的总量口径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTotal {
    /// 总页数
    Pages(u32),
    /// 总记录数
    Records(u64),
}

/// 单次抓取内的翻页状态，每次 fetch_range 调用新建一个，返回时丢弃
#[derive(Debug)]
pub struct PageCursor {
    page_no: u32,
    page_size: u32,
    total: Option<PageTotal>,
    fetched: u64,
    requested: u64,
}

impl PageCursor {
    /// 总量以页数口径报告的数据源，从第一页响应学到总页数
    pub fn by_pages(page_size: u32) -> Self {
        Self {
            page_no: 1,
            page_size,
            total: None,
            fetched: 0,
            requested: 0,
        }
    }

    /// 总量以记录数口径报告、且探测请求已经得到总数的数据源；
    /// 每页按剩余量收缩请求大小
    pub fn by_records(page_size: u32, total: u64) -> Self {
        Self {
            page_no: 1,
            page_size,
            total: Some(PageTotal::Records(total)),
            fetched: 0,
            requested: 0,
        }
    }

    /// 当前要请求的页号，从1开始
    pub fn page_no(&self) -> u32 {
        self.page_no
    }

    /// 当前这一页应请求的大小
    pub fn next_page_size(&self) -> u32 {
        match self.total {
            Some(PageTotal::Records(total)) => {
                let remaining = total.saturating_sub(self.requested);
                remaining.min(self.page_size as u64) as u32
            }
            _ => self.page_size,
        }
    }

    /// 记录一页的结果并推进游标，返回是否还有下一页。
    /// 数据源声称还有数据却返回空页时报 StalledPagination，避免死循环。
    fn advance(&mut self, rows: usize, requested_size: u32, reported: PageTotal) -> Result<bool> {
        if self.total.is_none() {
            self.total = Some(reported);
        }

        self.fetched += rows as u64;
        self.requested += requested_size as u64;

        let (more, claimed_more) = match self.total {
            Some(PageTotal::Pages(pages)) => (self.page_no < pages, self.page_no < pages),
            Some(PageTotal::Records(total)) => (self.requested < total, self.fetched < total),
            None => (false, false),
        };

        if rows == 0 && claimed_more {
            return Err(TfpHubError::StalledPagination(format!(
                "page {} returned no rows but source still reports {:?}",
                self.page_no, self.total
            )));
        }

        self.page_no += 1;
        Ok(more)
    }
}

/// 通用翻页驱动：反复调用单页请求闭包直到数据源报告没有更多页，
/// 把各页记录按响应顺序拼接返回。闭包收到 (页号, 页大小)，
/// 返回该页的记录和数据源报告的总量。
pub async fn fetch_paged<F, Fut>(mut cursor: PageCursor, mut fetch: F) -> Result<Vec<Value>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<(Vec<Value>, PageTotal)>>,
{
    let mut rows = Vec::new();

    loop {
        let page_no = cursor.page_no();
        let page_size = cursor.next_page_size();

        let (page_rows, reported) = fetch(page_no, page_size).await?;
        let row_count = page_rows.len();
        rows.extend(page_rows);

        if !cursor.advance(row_count, page_size, reported)? {
            break;
        }
    }

    Ok(rows)
}
