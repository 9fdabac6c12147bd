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

const SCRAP_PAGE_SIZE: u32 = 10;

/// 把JSONP文本 `cb(<json>)` 改写成 `{"cb":<json>}` 再解析。
/// 任何形态不符都报 MalformedJsonp，与普通的JSON解析错误区分开。
pub fn unwrap_jsonp(callback: &str, body: &str) -> Result<Value> {
    let trimmed = body.trim();

    let open = trimmed
        .find('(')
        .ok_or_else(|| TfpHubError::MalformedJsonp("missing opening parenthesis".to_string()))?;

    if &trimmed[..open] != callback {
        return Err(TfpHubError::MalformedJsonp(format!(
            "callback name mismatch: expected {}, got {}",
            callback,
            &trimmed[..open]
        )));
    }

    let inner = trimmed
        .strip_suffix(')')
        .ok_or_else(|| TfpHubError::MalformedJsonp("missing closing parenthesis".to_string()))?;
    let payload = &inner[open + 1..];

    // 上游偶尔用单引号，统一换成双引号再解析
    let rebuilt = format!("{{\"{}\":{}}}", callback, payload.replace('\'', "\""));

    serde_json::from_str(&rebuilt)
        .map_err(|e| TfpHubError::MalformedJsonp(format!("invalid JSON payload: {}", e)))
}

/// 从解包后的对象里取出记录列表和总页数，缺少嵌套字段同样按形态错误处理
fn read_envelope(callback: &str, json: &Value) -> Result<(Vec<Value>, PageTotal)> {
    let envelope = json.get(callback).ok_or_else(|| {
        TfpHubError::MalformedJsonp(format!("missing callback key: {}", callback))
    })?;

    let pages = envelope
        .get("total")
        .and_then(|t| t.as_u64())
        .ok_or_else(|| TfpHubError::MalformedJsonp("missing total field".to_string()))?
        as u32;

    let rows = envelope
        .get("data")
        .and_then(|d| d.as_array())
        .cloned()
        .ok_or_else(|| TfpHubError::MalformedJsonp("missing data field".to_string()))?;

    Ok((rows, PageTotal::Pages(pages)))
}

/// 北京证券交易所停复牌数据抓取器
pub struct BSEScraper {
    client: Client,
}

impl BSEScraper {
    /// 创建新的北交所数据抓取器
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TfpHubError::RequestError(e))?;

        Ok(Self { client })
    }

    /// 合成浏览器风格的jQuery回调名
    fn callback_name() -> String {
        format!("jQuery331_{}", util::timestamp_millis())
    }

    /// POST一页数据，回调名放查询串、页码放表单体
    async fn fetch_page(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
        callback: &str,
        page_no: u32,
    ) -> Result<(Vec<Value>, PageTotal)> {
        let begin_str = begin.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        // 北交所页码从0开始
        let page_str = (page_no - 1).to_string();

        let response = self
            .client
            .post("https://www.bse.cn/TPFPController/getTpfpT.do")
            .query(&[("callback", callback)])
            .form(&[
                ("page", page_str.as_str()),
                ("startTime", begin_str.as_str()),
                ("endTime", end_str.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TfpHubError::RequestError(e))?;

        let text = response.text().await?;
        let json = unwrap_jsonp(callback, &text)?;

        read_envelope(callback, &json)
    }
}

#[async_trait]
impl SuspensionScraper for BSEScraper {
    fn source_code(&self) -> &'static str {
        "BSE"
    }

    fn market(&self) -> Market {
        Market::Beijing
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
        info!("获取北交所{}至{}的停复牌数据", begin, end);

        // 整个翻页过程沿用同一个回调名
        let callback = Self::callback_name();

        let this = self;
        let callback_ref = callback.as_str();
        let rows = fetch_paged(
            PageCursor::by_pages(SCRAP_PAGE_SIZE),
            move |page_no, _page_size| async move {
                this.fetch_page(begin, end, callback_ref, page_no).await
            },
        )
        .await?;

        info!("北交所返回 {} 条停复牌记录", rows.len());
        Ok(rows)
    }
}
