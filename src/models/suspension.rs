use crate::errors::TfpHubError;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 记录所属的查询口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// 东方财富数据中心的全市场口径，不区分上市地
    All,
    /// 上海证券交易所
    Shanghai,
    /// 深圳证券交易所
    Shenzhen,
    /// 北京证券交易所
    Beijing,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Market::All => "all",
            Market::Shanghai => "shanghai",
            Market::Shenzhen => "shenzhen",
            Market::Beijing => "beijing",
        };
        write!(f, "{}", name)
    }
}

/// 查询范围选择器，决定派发到哪些数据源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScope {
    /// 只查东方财富数据中心（全市场单日接口）
    National,
    Shanghai,
    Shenzhen,
    Beijing,
    /// 按注册顺序依次查询全部四个数据源
    All,
}

impl FromStr for MarketScope {
    type Err = TfpHubError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "em" | "eastmoney" | "national" => Ok(MarketScope::National),
            "sse" | "sh" | "shanghai" => Ok(MarketScope::Shanghai),
            "szse" | "sz" | "shenzhen" => Ok(MarketScope::Shenzhen),
            "bse" | "bj" | "beijing" => Ok(MarketScope::Beijing),
            "all" => Ok(MarketScope::All),
            _ => Err(TfpHubError::DataError(format!("Unknown market: {}", s))),
        }
    }
}

/// 单条停复牌记录
#[derive(Debug, Clone, Serialize)]
pub struct SuspensionEvent {
    /// 合并结果中的序号，从1开始
    pub seq: u32,
    /// 证券代码
    pub code: String,
    /// 证券简称
    pub name: String,
    /// 停牌开始日期
    pub suspend_start: Option<NaiveDate>,
    /// 停牌截止日期
    pub suspend_end: Option<NaiveDate>,
    /// 停牌期限描述，各数据源口径不同，原样保留
    pub suspend_period: String,
    /// 停牌原因
    pub suspend_reason: String,
    /// 所属市场
    pub market: Market,
    /// 预计复牌时间
    pub expected_resume: Option<NaiveDate>,
}

/// 聚合后的停复牌结果表
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuspensionTable {
    /// 按数据源注册顺序合并的记录
    pub events: Vec<SuspensionEvent>,
    /// 因单页瞬时错误被跳过的日期，只有逐日查询的数据源会出现
    pub skipped_days: Vec<NaiveDate>,
}
