use crate::errors::{Result, TfpHubError};
use crate::models::suspension::Market;
use crate::scrapers::base::{RangeSupport, SuspensionScraper};
use crate::scrapers::paging::{fetch_paged, PageCursor, PageTotal};
use crate::util;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const SCRAP_PAGE_SIZE: u32 = 25;

/// 上海证券交易所停复牌数据抓取器
pub struct SSEScraper {
    client: Client,
    last_request: Mutex<Option<Instant>>,
}

impl SSEScraper {
    /// 创建新的上交所数据抓取器
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TfpHubError::RequestError(e))?;

        Ok(Self {
            client,
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        const MIN_INTERVAL: Duration = Duration::from_millis(500);

        let now = Instant::now();
        let should_wait = {
            let mut last = self.last_request.lock().unwrap();
            let should_wait = if let Some(instant) = *last {
                let elapsed = instant.elapsed();
                if elapsed < MIN_INTERVAL {
                    Some(MIN_INTERVAL - elapsed)
                } else {
                    None
                }
            } else {
                None
            };
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("等待 {:?} 以遵守频率限制", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// 请求一页数据。单页的传输或解析错误都包装成页级失败，
    /// 供服务层的逐日循环按日跳过。
    async fn query_page(&self, date: NaiveDate, page_no: u32, page_size: u32) -> Result<Value> {
        // 限制请求频率
        self.wait_for_rate_limit().await;

        let date_str = date.format("%Y-%m-%d").to_string();
        let page_no_str = page_no.to_string();
        let page_size_str = page_size.to_string();
        let timestamp = util::timestamp_millis().to_string();

        let response = self
            .client
            .get("https://query.sse.com.cn/sseQuery/commonQuery.do")
            .query(&[
                ("isPagination", "true"),
                ("sqlId", "COMMON_SSE_XXPL_JYTS_TFPXX_L"),
                ("SEARCH_DATE", date_str.as_str()),
                ("pageHelp.pageSize", page_size_str.as_str()),
                ("pageHelp.pageNo", page_no_str.as_str()),
                ("pageHelp.beginPage", page_no_str.as_str()),
                ("pageHelp.cacheSize", "1"),
                ("pageHelp.endPage", page_no_str.as_str()),
                ("_", timestamp.as_str()),
            ])
            .header("Referer", "https://www.sse.com.cn/assortment/stock/list/share/")
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .header("Pragma", "no-cache")
            .send()
            .await
            .map_err(|e| TfpHubError::page_failure(page_no, TfpHubError::RequestError(e)))?;

        let text = response
            .text()
            .await
            .map_err(|e| TfpHubError::page_failure(page_no, TfpHubError::RequestError(e)))?;

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| TfpHubError::page_failure(page_no, TfpHubError::JsonError(e)))?;

        Ok(json)
    }
}

#[async_trait]
impl SuspensionScraper for SSEScraper {
    fn source_code(&self) -> &'static str {
        "SSE"
    }

    fn market(&self) -> Market {
        Market::Shanghai
    }

    fn range_support(&self) -> RangeSupport {
        RangeSupport::DayByDay
    }

    async fn fetch_range(
        &self,
        date_begin: &NaiveDate,
        date_end: &NaiveDate,
    ) -> Result<Vec<Value>> {
        // 上交所接口只按单日查询，跨日窗口由服务层逐日展开
        if date_begin != date_end {
            return Err(TfpHubError::UnsupportedRange {
                market: self.source_code().to_string(),
                begin: *date_begin,
                end: *date_end,
            });
        }

        let date = *date_begin;
        info!("获取上交所{}的停复牌数据", date);

        // 先用最小分页探测当日总记录数
        let probe = self.query_page(date, 1, 1).await?;
        let total = probe
            .get("pageHelp")
            .and_then(|p| p.get("total"))
            .and_then(|t| t.as_u64())
            .unwrap_or_default();

        if total == 0 {
            debug!("上交所{}没有停复牌记录", date);
            return Ok(Vec::new());
        }

        let this = self;
        let rows = fetch_paged(
            PageCursor::by_records(SCRAP_PAGE_SIZE, total),
            move |page_no, page_size| async move {
                let json = this.query_page(date, page_no, page_size).await?;
                let rows = json
                    .get("pageHelp")
                    .and_then(|p| p.get("data"))
                    .and_then(|d| d.as_array())
                    .cloned()
                    .unwrap_or_default();
                Ok((rows, PageTotal::Records(total)))
            },
        )
        .await?;

        info!("上交所{}返回 {} 条停复牌记录", date, rows.len());
        Ok(rows)
    }
}
