use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfpHubError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Date range {begin}..{end} not supported by {market}")]
    UnsupportedRange {
        market: String,
        begin: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Pagination stalled: {0}")]
    StalledPagination(String),

    #[error("Malformed JSONP envelope: {0}")]
    MalformedJsonp(String),

    #[error("Page {page} request failed: {source}")]
    PageFailure {
        page: u32,
        #[source]
        source: Box<TfpHubError>,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, TfpHubError>;

impl TfpHubError {
    /// 将单页请求错误包装为可识别的页级失败
    pub fn page_failure(page: u32, source: TfpHubError) -> Self {
        TfpHubError::PageFailure {
            page,
            source: Box::new(source),
        }
    }

    /// 页级瞬时失败可在逐日循环中跳过，其余错误一律向上传播
    pub fn is_transient_page_failure(&self) -> bool {
        matches!(self, TfpHubError::PageFailure { .. })
    }
}

// 用于从字符串创建错误
impl From<String> for TfpHubError {
    fn from(s: String) -> Self {
        TfpHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for TfpHubError {
    fn from(s: &str) -> Self {
        TfpHubError::Unknown(s.to_string())
    }
}
