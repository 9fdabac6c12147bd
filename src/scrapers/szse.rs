use crate::errors::{Result, TfpHubError};
use crate::models::suspension::Market;
use crate::scrapers::base::{RangeSupport, SuspensionScraper};
use crate::scrapers::paging::{fetch_paged, PageCursor, PageTotal};
use crate::util;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use std::time::Instant;

// 用于限制请求频率的全局变量
static LAST_REQUEST: Mutex<Option<Instant>> = Mutex::const_new(None);

const SCRAP_PAGE_SIZE: u32 = 30;

pub struct SZSEScraper {
    client: Client,
    request_interval: Duration,
}

impl SZSEScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TfpHubError::RequestError(e))?;

        Ok(Self {
            client,
            request_interval: Duration::from_millis(500),
        })
    }

    // 添加请求限速机制
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let mut last = LAST_REQUEST.lock().await;

        if let Some(time) = *last {
            let elapsed = time.elapsed();
            if elapsed < self.request_interval {
                tokio::time::sleep(self.request_interval - elapsed).await;
            }
        }

        *last = Some(now);
    }

    /// 请求一页数据，返回该页记录和总页数。
    /// 响应是数组包装，第一个元素带数据和分页元信息。
    async fn fetch_page(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
        page_no: u32,
    ) -> Result<(Vec<Value>, PageTotal)> {
        // 限制请求频率
        self.wait_for_rate_limit().await;

        let begin_str = begin.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        let page_no_str = page_no.to_string();
        // 每页都带新生成的防缓存参数
        let random = util::anti_cache_token();

        let response = self
            .client
            .get("https://www.szse.cn/api/report/ShowReport/data")
            .query(&[
                ("SHOWTYPE", "JSON"),
                ("CATALOGID", "1798"),
                ("TABKEY", "tab1"),
                ("txtBeginDate", begin_str.as_str()),
                ("txtEndDate", end_str.as_str()),
                ("PAGENO", page_no_str.as_str()),
                ("random", random.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TfpHubError::RequestError(e))?;

        let json: Value = response.json().await?;

        let report = json.get(0).cloned().unwrap_or_default();

        let pages = report
            .get("metadata")
            .and_then(|m| m.get("pagecount"))
            .and_then(|p| p.as_u64())
            .unwrap_or_default() as u32;

        let rows = report
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();

        Ok((rows, PageTotal::Pages(pages)))
    }
}

#[async_trait]
impl SuspensionScraper for SZSEScraper {
    fn source_code(&self) -> &'static str {
        "SZSE"
    }

    fn market(&self) -> Market {
        Market::Shenzhen
    }

    fn range_support(&self) -> RangeSupport {
        RangeSupport::Native
    }

    async fn fetch_range(
        &self,
        date_begin: &NaiveDate,
        date_end: &NaiveDate,
    ) -> Result<Vec<Value>> {
        let begin = *date_begin;
        let end = *date_end;
        info!("开始获取深交所停复牌数据，日期: {} 至 {}", begin, end);

        let this = self;
        let rows = fetch_paged(
            PageCursor::by_pages(SCRAP_PAGE_SIZE),
            move |page_no, _page_size| async move { this.fetch_page(begin, end, page_no).await },
        )
        .await?;

        info!("成功获取深交所 {} 条停复牌记录", rows.len());
        Ok(rows)
    }
}
