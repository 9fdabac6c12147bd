use crate::errors::{Result, TfpHubError};
use chrono::NaiveDate;
use std::time::{SystemTime, UNIX_EPOCH};

// 日期解析工具

/// 解析查询日期，支持 YYYYMMDD 和 YYYY-MM-DD 两种格式
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    let format = if trimmed.contains('-') {
        "%Y-%m-%d"
    } else {
        "%Y%m%d"
    };

    NaiveDate::parse_from_str(trimmed, format)
        .map_err(|_| TfpHubError::InvalidDateFormat(date_str.to_string()))
}

/// 宽松解析记录里的日期字段，识别不了就返回None而不是报错
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    // 带时间部分的只取日期前缀，例如 "2024-03-25 00:00:00"
    let head = trimmed.get(..10).unwrap_or(trimmed);
    if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        return Some(date);
    }

    let head = trimmed.get(..8).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y%m%d").ok()
}

/// 展开闭区间日期窗口为逐日列表
pub fn days_in_window(begin: &NaiveDate, end: &NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = *begin;
    while current <= *end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

// 请求参数辅助

/// 当前毫秒时间戳，上交所接口的 "_" 参数和北交所回调名都用它
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// 生成形如 "0.123456789" 的防缓存串，对应深交所的 random 参数
pub fn anti_cache_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("0.{:09}", nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_both_formats() {
        let plain = parse_date("20240325").unwrap();
        let dashed = parse_date("2024-03-25").unwrap();
        assert_eq!(plain, dashed);
        assert_eq!(plain, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
    }

    #[test]
    fn parse_date_rejects_malformed_input() {
        let bad_inputs = [
            "",
            "2024/03/25",
            "2024-13-01",
            "20241332",
            "sometime",
            "2024-03-25 10:00:00",
        ];
        for bad in bad_inputs {
            assert!(
                matches!(parse_date(bad), Err(TfpHubError::InvalidDateFormat(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn parse_date_lenient_tolerates_noise() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 25);
        assert_eq!(parse_date_lenient("2024-03-25"), expected);
        assert_eq!(parse_date_lenient("2024-03-25 00:00:00"), expected);
        assert_eq!(parse_date_lenient("20240325"), expected);
        assert_eq!(parse_date_lenient(" 2024-03-25 "), expected);
        assert_eq!(parse_date_lenient("-"), None);
        assert_eq!(parse_date_lenient(""), None);
        assert_eq!(parse_date_lenient("待定"), None);
    }

    #[test]
    fn days_in_window_is_inclusive() {
        let begin = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = days_in_window(&begin, &end);
        assert_eq!(days.len(), 3);
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(days_in_window(&begin, &begin), vec![begin]);
    }

    #[test]
    fn anti_cache_token_shape() {
        let token = anti_cache_token();
        assert!(token.starts_with("0."));
        assert_eq!(token.len(), 11);
    }
}
