use crate::config::Config;
use crate::errors::{Result, TfpHubError};
use crate::models::suspension::{Market, MarketScope, SuspensionTable};
use crate::normalize;
use crate::scrapers::base::{RangeSupport, SuspensionScraper};
use crate::scrapers::bse::BSEScraper;
use crate::scrapers::eastmoney::EastMoneyScraper;
use crate::scrapers::sse::SSEScraper;
use crate::scrapers::szse::SZSEScraper;
use crate::util;
use chrono::NaiveDate;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;

/// 停复牌数据服务，处理数据源选择、窗口展开和结果合并
pub struct SuspensionService {
    config: Config,
    scrapers: Vec<Arc<dyn SuspensionScraper + Send + Sync>>,
}

impl SuspensionService {
    /// 创建新的数据服务实例
    pub fn new(config: Config, scrapers: Vec<Arc<dyn SuspensionScraper + Send + Sync>>) -> Self {
        Self { config, scrapers }
    }

    /// 按固定顺序注册全部四个数据源
    pub fn with_default_scrapers(config: Config) -> Result<Self> {
        let scrapers: Vec<Arc<dyn SuspensionScraper + Send + Sync>> = vec![
            Arc::new(EastMoneyScraper::new()?),
            Arc::new(SSEScraper::new()?),
            Arc::new(SZSEScraper::new()?),
            Arc::new(BSEScraper::new()?),
        ];
        Ok(Self::new(config, scrapers))
    }

    /// 选出本次查询要用的数据源，保持注册顺序
    fn select_scrapers(&self, scope: MarketScope) -> Vec<Arc<dyn SuspensionScraper + Send + Sync>> {
        self.scrapers
            .iter()
            .filter(|s| match scope {
                MarketScope::All => true,
                MarketScope::National => s.market() == Market::All,
                MarketScope::Shanghai => s.market() == Market::Shanghai,
                MarketScope::Shenzhen => s.market() == Market::Shenzhen,
                MarketScope::Beijing => s.market() == Market::Beijing,
            })
            .cloned()
            .collect()
    }

    /// 查询指定窗口内的停复牌记录并合并成一张表
    pub async fn get_suspensions(
        &self,
        scope: MarketScope,
        date_begin: &NaiveDate,
        date_end: &NaiveDate,
    ) -> Result<SuspensionTable> {
        if date_begin > date_end {
            return Err(TfpHubError::DataError(format!(
                "Invalid date window: {} > {}",
                date_begin, date_end
            )));
        }

        let selected = self.select_scrapers(scope);
        if selected.is_empty() {
            return Err(TfpHubError::DataError(format!(
                "No scraper registered for market scope {:?}",
                scope
            )));
        }

        // 单日接口不支持跨日窗口，发起任何请求之前就拒绝
        if date_begin != date_end {
            if let Some(scraper) = selected
                .iter()
                .find(|s| s.range_support() == RangeSupport::SingleDayOnly)
            {
                return Err(TfpHubError::UnsupportedRange {
                    market: scraper.source_code().to_string(),
                    begin: *date_begin,
                    end: *date_end,
                });
            }
        }

        let mut table = SuspensionTable::default();

        for scraper in &selected {
            info!("Scraping suspensions from {}", scraper.source_code());

            let mut raw = match scraper.range_support() {
                RangeSupport::DayByDay => {
                    self.fetch_day_by_day(
                        scraper.as_ref(),
                        date_begin,
                        date_end,
                        &mut table.skipped_days,
                    )
                    .await?
                }
                _ => scraper.fetch_range(date_begin, date_end).await?,
            };

            // 调试模式：每个数据源只保留前N条
            if self.config.debug_mode {
                let original_count = raw.len();
                raw.truncate(self.config.debug_row_limit);
                info!(
                    "DEBUG MODE: Keeping only {} out of {} rows from {}",
                    raw.len(),
                    original_count,
                    scraper.source_code()
                );
            }

            info!(
                "Found {} suspension rows in {}",
                raw.len(),
                scraper.source_code()
            );

            let market = scraper.market();
            table
                .events
                .extend(raw.iter().map(|row| normalize::normalize_row(market, row)));
        }

        // 合并后统一编号
        for (i, event) in table.events.iter_mut().enumerate() {
            event.seq = i as u32 + 1;
        }

        if table.events.is_empty() {
            warn!(
                "No suspension records found for {}..{}",
                date_begin, date_end
            );
        }

        Ok(table)
    }

    /// 按日展开窗口逐日查询。页级瞬时失败跳过当日并记入结果表，
    /// 其余错误直接中止整个调用。
    async fn fetch_day_by_day(
        &self,
        scraper: &dyn SuspensionScraper,
        date_begin: &NaiveDate,
        date_end: &NaiveDate,
        skipped_days: &mut Vec<NaiveDate>,
    ) -> Result<Vec<Value>> {
        let mut rows = Vec::new();

        for day in util::days_in_window(date_begin, date_end) {
            match scraper.fetch_range(&day, &day).await {
                Ok(day_rows) => rows.extend(day_rows),
                Err(e) if e.is_transient_page_failure() => {
                    warn!("Skipping {} for {}: {}", day, scraper.source_code(), e);
                    skipped_days.push(day);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::paging::{fetch_paged, PageCursor, PageTotal};
    use async_trait::async_trait;
    use chrono::Datelike;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// 通过真实翻页驱动返回两页各三条记录的全市场数据源
    struct PagedFake;

    #[async_trait]
    impl SuspensionScraper for PagedFake {
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
            assert_eq!(date_begin, date_end);
            fetch_paged(PageCursor::by_pages(3), |page_no, _page_size| async move {
                let base = (page_no - 1) * 3;
                let rows = (1..=3)
                    .map(|i| json!({ "code": format!("{:06}", base + i), "name": "测试" }))
                    .collect();
                Ok((rows, PageTotal::Pages(2)))
            })
            .await
        }
    }

    /// 固定返回一条记录的数据源
    struct SingleFake {
        source: &'static str,
        market: Market,
        support: RangeSupport,
        row: Value,
    }

    #[async_trait]
    impl SuspensionScraper for SingleFake {
        fn source_code(&self) -> &'static str {
            self.source
        }

        fn market(&self) -> Market {
            self.market
        }

        fn range_support(&self) -> RangeSupport {
            self.support
        }

        async fn fetch_range(
            &self,
            _date_begin: &NaiveDate,
            _date_end: &NaiveDate,
        ) -> Result<Vec<Value>> {
            Ok(vec![self.row.clone()])
        }
    }

    /// 在指定日期必定报页级失败的逐日数据源
    struct FlakyDayFake {
        bad_day: NaiveDate,
        fatal: bool,
    }

    #[async_trait]
    impl SuspensionScraper for FlakyDayFake {
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
            _date_end: &NaiveDate,
        ) -> Result<Vec<Value>> {
            if *date_begin == self.bad_day {
                if self.fatal {
                    return Err(TfpHubError::DataError("schema changed".to_string()));
                }
                return Err(TfpHubError::page_failure(
                    1,
                    TfpHubError::DataError("connection timeout".to_string()),
                ));
            }
            Ok(vec![
                json!({ "PRODUCT_CODE": format!("6000{:02}", date_begin.day()) }),
            ])
        }
    }

    /// 统计 fetch_range 调用次数的数据源
    struct CountingFake {
        source: &'static str,
        market: Market,
        support: RangeSupport,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SuspensionScraper for CountingFake {
        fn source_code(&self) -> &'static str {
            self.source
        }

        fn market(&self) -> Market {
            self.market
        }

        fn range_support(&self) -> RangeSupport {
            self.support
        }

        async fn fetch_range(
            &self,
            _date_begin: &NaiveDate,
            _date_end: &NaiveDate,
        ) -> Result<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn national_single_day_merges_pages_in_response_order() {
        let service = SuspensionService::new(
            Config::new(),
            vec![Arc::new(PagedFake) as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let table = service
            .get_suspensions(MarketScope::National, &day(25), &day(25))
            .await
            .unwrap();

        assert_eq!(table.events.len(), 6);
        for (i, event) in table.events.iter().enumerate() {
            assert_eq!(event.seq, i as u32 + 1);
            assert_eq!(event.code, format!("{:06}", i + 1));
            assert_eq!(event.market, Market::All);
        }
        assert!(table.skipped_days.is_empty());
    }

    #[tokio::test]
    async fn all_scope_appends_sources_in_registration_order() {
        let scrapers: Vec<Arc<dyn SuspensionScraper + Send + Sync>> = vec![
            Arc::new(SingleFake {
                source: "EM",
                market: Market::All,
                support: RangeSupport::SingleDayOnly,
                row: json!({ "code": "000001" }),
            }),
            Arc::new(SingleFake {
                source: "SSE",
                market: Market::Shanghai,
                support: RangeSupport::DayByDay,
                row: json!({ "PRODUCT_CODE": "600000" }),
            }),
            Arc::new(SingleFake {
                source: "SZSE",
                market: Market::Shenzhen,
                support: RangeSupport::Native,
                row: json!({ "zqdm": "000002" }),
            }),
            Arc::new(SingleFake {
                source: "BSE",
                market: Market::Beijing,
                support: RangeSupport::Native,
                row: json!({ "stockCode": "830799" }),
            }),
        ];
        let service = SuspensionService::new(Config::new(), scrapers);

        let table = service
            .get_suspensions(MarketScope::All, &day(25), &day(25))
            .await
            .unwrap();

        assert_eq!(table.events.len(), 4);
        let markets: Vec<Market> = table.events.iter().map(|e| e.market).collect();
        assert_eq!(
            markets,
            vec![
                Market::All,
                Market::Shanghai,
                Market::Shenzhen,
                Market::Beijing
            ]
        );
        let codes: Vec<&str> = table.events.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["000001", "600000", "000002", "830799"]);
        let seqs: Vec<u32> = table.events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn day_by_day_skips_failing_day_observably() {
        let service = SuspensionService::new(
            Config::new(),
            vec![Arc::new(FlakyDayFake {
                bad_day: day(26),
                fatal: false,
            }) as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let table = service
            .get_suspensions(MarketScope::Shanghai, &day(25), &day(27))
            .await
            .unwrap();

        assert_eq!(table.events.len(), 2);
        assert_eq!(table.events[0].code, "600025");
        assert_eq!(table.events[1].code, "600027");
        assert_eq!(table.skipped_days, vec![day(26)]);
    }

    #[tokio::test]
    async fn day_by_day_aborts_on_non_transient_errors() {
        let service = SuspensionService::new(
            Config::new(),
            vec![Arc::new(FlakyDayFake {
                bad_day: day(26),
                fatal: true,
            }) as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let result = service
            .get_suspensions(MarketScope::Shanghai, &day(25), &day(27))
            .await;

        assert!(matches!(result, Err(TfpHubError::DataError(_))));
    }

    #[tokio::test]
    async fn multi_day_window_with_single_day_source_fails_before_any_fetch() {
        let fake = Arc::new(CountingFake {
            source: "EM",
            market: Market::All,
            support: RangeSupport::SingleDayOnly,
            calls: AtomicU32::new(0),
        });
        let service = SuspensionService::new(
            Config::new(),
            vec![fake.clone() as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let result = service
            .get_suspensions(MarketScope::National, &day(25), &day(27))
            .await;

        assert!(matches!(result, Err(TfpHubError::UnsupportedRange { .. })));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);

        // 单日窗口正常放行
        let table = service
            .get_suspensions(MarketScope::National, &day(25), &day(25))
            .await
            .unwrap();
        assert!(table.events.is_empty());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_scope_multi_day_window_fails_before_any_fetch() {
        let fakes = vec![
            Arc::new(CountingFake {
                source: "EM",
                market: Market::All,
                support: RangeSupport::SingleDayOnly,
                calls: AtomicU32::new(0),
            }),
            Arc::new(CountingFake {
                source: "SSE",
                market: Market::Shanghai,
                support: RangeSupport::DayByDay,
                calls: AtomicU32::new(0),
            }),
            Arc::new(CountingFake {
                source: "SZSE",
                market: Market::Shenzhen,
                support: RangeSupport::Native,
                calls: AtomicU32::new(0),
            }),
            Arc::new(CountingFake {
                source: "BSE",
                market: Market::Beijing,
                support: RangeSupport::Native,
                calls: AtomicU32::new(0),
            }),
        ];
        let service = SuspensionService::new(
            Config::new(),
            fakes
                .iter()
                .map(|f| f.clone() as Arc<dyn SuspensionScraper + Send + Sync>)
                .collect(),
        );

        let result = service
            .get_suspensions(MarketScope::All, &day(25), &day(27))
            .await;

        assert!(matches!(result, Err(TfpHubError::UnsupportedRange { .. })));
        for fake in &fakes {
            assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let service = SuspensionService::new(
            Config::new(),
            vec![Arc::new(PagedFake) as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let result = service
            .get_suspensions(MarketScope::National, &day(27), &day(25))
            .await;

        assert!(matches!(result, Err(TfpHubError::DataError(_))));
    }

    #[tokio::test]
    async fn empty_scraper_set_is_rejected() {
        let service = SuspensionService::new(Config::new(), Vec::new());

        let result = service
            .get_suspensions(MarketScope::All, &day(25), &day(25))
            .await;

        assert!(matches!(result, Err(TfpHubError::DataError(_))));
    }

    #[tokio::test]
    async fn debug_mode_truncates_rows_per_source() {
        let config = Config::new().with_debug_mode(true).with_debug_row_limit(4);
        let service = SuspensionService::new(
            config,
            vec![Arc::new(PagedFake) as Arc<dyn SuspensionScraper + Send + Sync>],
        );

        let table = service
            .get_suspensions(MarketScope::National, &day(25), &day(25))
            .await
            .unwrap();

        assert_eq!(table.events.len(), 4);
    }
}
