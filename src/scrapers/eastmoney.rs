use crate::errors::{Result, TfpHubError};
use crate::models::suspension::Market;
use crate::scrapers::base::{RangeSupport, SuspensionScraper};
use crate::scrapers::paging::{fetch_paged, PageCursor, PageTotal};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;

const SCRAP_PAGE_SIZE: u32 = 500;

/// 上游前九列按出现顺序重命名成的中间列名，剩余尾列直接丢弃
const COLUMNS: [&str; 9] = [
    "code",
    "name",
    "suspend_start_raw",
    "suspend_end_raw",
    "suspend_period",
    "suspend_reason",
    "market",
    "suspend_begin_date",
    "expected_resume_raw",
];

/// 东方财富数据中心停复牌数据抓取器
pub struct EastMoneyScraper {
    client: Client,
}

impl EastMoneyScraper {
    /// 创建新的东方财富数据抓取器
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TfpHubError::RequestError(e))?;

        Ok(Self { client })
    }

    /// 拼接单日全市场的过滤表达式
    fn filter_expr(date: &NaiveDate) -> String {
        format!("(MARKET=\"全部\")(DATETIME='{}')", date.format("%Y-%m-%d"))
    }

    /// 请求一页数据，返回该页记录和总页数。
    /// result为null表示当天没有停复牌记录。
    async fn fetch_page(
        &self,
        date: NaiveDate,
        page_no: u32,
        page_size: u32,
    ) -> Result<(Vec<Value>, PageTotal)> {
        let filter = Self::filter_expr(&date);
        let page_no_str = page_no.to_string();
        let page_size_str = page_size.to_string();

        let response = self
            .client
            .get("https://datacenter-web.eastmoney.com/api/data/v1/get")
            .query(&[
                ("sortColumns", "SUSPEND_START_DATE"),
                ("sortTypes", "-1"),
                ("pageSize", page_size_str.as_str()),
                ("pageNumber", page_no_str.as_str()),
                ("reportName", "RPT_CUSTOM_SUSPEND_DATA_INTERFACE"),
                ("columns", "ALL"),
                ("source", "WEB"),
                ("client", "WEB"),
                ("filter", filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TfpHubError::RequestError(e))?;

        let json: Value = response.json().await?;

        let pages = json
            .get("result")
            .and_then(|r| r.get("pages"))
            .and_then(|p| p.as_u64())
            .unwrap_or_default() as u32;

        let rows = json
            .get("result")
            .and_then(|r| r.get("data"))
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();

        Ok((rows, PageTotal::Pages(pages)))
    }

    /// 上游列是按位置排列的，改写成中间列名并注入序号列
    fn rename_columns(seq: u64, row: &Value) -> Value {
        let mut renamed = Map::new();
        renamed.insert("seq".to_string(), Value::from(seq));

        if let Some(fields) = row.as_object() {
            for (i, name) in COLUMNS.iter().enumerate() {
                let value = fields.values().nth(i).cloned().unwrap_or(Value::Null);
                renamed.insert((*name).to_string(), value);
            }
        }

        Value::Object(renamed)
    }
}

#[async_trait]
impl SuspensionScraper for EastMoneyScraper {
    fn source_code(&self) -> &'static str {
        "EM"
    }

    fn market(&self) -> Market {
        Market::All
    }

    fn range_support(&self) -> RangeSupport {
        RangeSupport::SingleDayOnly
    }

    async fn fetch_range(
        &self,
        date_begin: &NaiveDate,
        date_end: &NaiveDate,
    ) -> Result<Vec<Value>> {
        // 数据中心接口只按单日过滤
        if date_begin != date_end {
            return Err(TfpHubError::UnsupportedRange {
                market: self.source_code().to_string(),
                begin: *date_begin,
                end: *date_end,
            });
        }

        let date = *date_begin;
        info!("获取东方财富{}的全市场停复牌数据", date);

        let this = self;
        let raw = fetch_paged(
            PageCursor::by_pages(SCRAP_PAGE_SIZE),
            move |page_no, page_size| async move {
                this.fetch_page(date, page_no, page_size).await
            },
        )
        .await?;

        debug!("东方财富返回 {} 条原始记录", raw.len());

        let rows = raw
            .iter()
            .enumerate()
            .map(|(i, row)| Self::rename_columns(i as u64 + 1, row))
            .collect();

        Ok(rows)
    }
}
