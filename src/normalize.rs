use crate::models::suspension::{Market, SuspensionEvent};
use crate::util;
use chrono::NaiveDate;
use serde_json::Value;

/// 按数据源口径把原始记录映射到规范的停复牌事件。
/// 序号先置0，聚合服务在合并结果上统一重新编号。
pub fn normalize_row(market: Market, row: &Value) -> SuspensionEvent {
    match market {
        Market::All => from_eastmoney(row),
        Market::Shanghai => from_sse(row),
        Market::Shenzhen => from_szse(row),
        Market::Beijing => from_bse(row),
    }
}

/// 取文本字段，数字也转成文本，缺失时给空串
fn text_field(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// 取日期字段，解析不了一律当作缺失
fn date_field(row: &Value, key: &str) -> Option<NaiveDate> {
    match row.get(key) {
        Some(Value::String(s)) => util::parse_date_lenient(s),
        _ => None,
    }
}

// 东方财富行已经在抓取器里换成了中间列名
fn from_eastmoney(row: &Value) -> SuspensionEvent {
    SuspensionEvent {
        seq: 0,
        code: text_field(row, "code"),
        name: text_field(row, "name"),
        suspend_start: date_field(row, "suspend_start_raw"),
        suspend_end: date_field(row, "suspend_end_raw"),
        suspend_period: text_field(row, "suspend_period"),
        suspend_reason: text_field(row, "suspend_reason"),
        market: Market::All,
        expected_resume: date_field(row, "expected_resume_raw"),
    }
}

fn from_sse(row: &Value) -> SuspensionEvent {
    SuspensionEvent {
        seq: 0,
        code: text_field(row, "PRODUCT_CODE"),
        name: text_field(row, "PRODUCT_NAME"),
        suspend_start: date_field(row, "SUSPEND_START_DATE"),
        suspend_end: date_field(row, "SUSPEND_END_DATE"),
        suspend_period: text_field(row, "SUSPEND_TIME"),
        suspend_reason: text_field(row, "SUSPEND_REASON"),
        market: Market::Shanghai,
        expected_resume: date_field(row, "RESUME_DATE"),
    }
}

// 深交所行用拼音缩写列名
fn from_szse(row: &Value) -> SuspensionEvent {
    SuspensionEvent {
        seq: 0,
        code: text_field(row, "zqdm"),
        name: text_field(row, "zqjc"),
        suspend_start: date_field(row, "tpkssj"),
        suspend_end: date_field(row, "tpjssj"),
        suspend_period: text_field(row, "tpqx"),
        suspend_reason: text_field(row, "tpyy"),
        market: Market::Shenzhen,
        expected_resume: date_field(row, "yjfpsj"),
    }
}

fn from_bse(row: &Value) -> SuspensionEvent {
    SuspensionEvent {
        seq: 0,
        code: text_field(row, "stockCode"),
        name: text_field(row, "stockName"),
        suspend_start: date_field(row, "suspendStartDate"),
        suspend_end: date_field(row, "suspendEndDate"),
        suspend_period: text_field(row, "suspendPeriod"),
        suspend_reason: text_field(row, "suspendReason"),
        market: Market::Beijing,
        expected_resume: date_field(row, "expectResumeDate"),
    }
}
