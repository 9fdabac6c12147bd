use tfp_datahub::config::Config;
use tfp_datahub::models::suspension::MarketScope;
use tfp_datahub::services::suspension_service::SuspensionService;
use tfp_datahub::util;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{App, Arg, SubCommand};
use log::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    // 创建基本的命令行应用
    let app = App::new("TfpDataHub")
        .version("1.0.0")
        .author("DataHub Team")
        .about("Trading suspension data retrieval system");

    // 在开发模式下添加调试参数
    #[cfg(debug_assertions)]
    let app = app
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Enable debug mode")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("debug-limit")
                .long("debug-limit")
                .help("Limit the number of rows to keep per source in debug mode")
                .takes_value(true)
                .default_value("10"),
        );

    // 添加子命令
    let app = app.subcommand(
        SubCommand::with_name("fetch")
            .about("Fetch suspension records from exchange data sources")
            .arg(
                Arg::with_name("market")
                    .short('m')
                    .long("market")
                    .value_name("MARKET")
                    .help("Market to query (em, sse, szse, bse, all)")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("begin")
                    .short('b')
                    .long("begin")
                    .value_name("DATE")
                    .help("Begin date (YYYYMMDD or YYYY-MM-DD)")
                    .takes_value(true)
                    .default_value(&today),
            )
            .arg(
                Arg::with_name("end")
                    .short('e')
                    .long("end")
                    .value_name("DATE")
                    .help("End date, defaults to the begin date")
                    .takes_value(true),
            ),
    );

    let matches = app.get_matches();

    // 获取调试模式设置
    #[cfg(debug_assertions)]
    let debug_mode = matches.is_present("debug");
    #[cfg(not(debug_assertions))]
    let debug_mode = false;

    #[cfg(debug_assertions)]
    let debug_row_limit = matches
        .value_of("debug-limit")
        .unwrap_or("10")
        .parse::<usize>()
        .unwrap_or(10);
    #[cfg(not(debug_assertions))]
    let debug_row_limit = usize::MAX;

    if let Some(matches) = matches.subcommand_matches("fetch") {
        let market = matches.value_of("market").unwrap();
        let begin_str = matches.value_of("begin").unwrap();
        let end_str = matches.value_of("end").unwrap_or(begin_str);

        let scope = match market.parse::<MarketScope>() {
            Ok(scope) => scope,
            Err(e) => {
                error!("Unknown market: {}", market);
                return Err(e.into());
            }
        };

        let begin = util::parse_date(begin_str).context("invalid begin date")?;
        let end = util::parse_date(end_str).context("invalid end date")?;

        // 创建配置
        let config = Config::new()
            .with_debug_mode(debug_mode)
            .with_debug_row_limit(debug_row_limit);

        // 创建数据服务
        let service = SuspensionService::with_default_scrapers(config)?;
        let table = service.get_suspensions(scope, &begin, &end).await?;

        info!("Fetched {} suspension records", table.events.len());

        // 表格形式输出结果
        info!("{:-<100}", "");
        info!(
            "{:<5} {:<8} {:<10} {:<12} {:<12} {:<10} {:<12} {}",
            "Seq", "Code", "Name", "Start", "End", "Market", "Resume", "Reason"
        );
        info!("{:-<100}", "");

        for event in &table.events {
            info!(
                "{:<5} {:<8} {:<10} {:<12} {:<12} {:<10} {:<12} {}",
                event.seq,
                event.code,
                event.name,
                format_date(event.suspend_start),
                format_date(event.suspend_end),
                event.market.to_string(),
                format_date(event.expected_resume),
                event.suspend_reason,
            );
        }

        if !table.skipped_days.is_empty() {
            let days: Vec<String> = table.skipped_days.iter().map(|d| d.to_string()).collect();
            warn!(
                "Skipped {} day(s) due to page failures: {}",
                days.len(),
                days.join(", ")
            );
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}

// Format optional dates as YYYY-MM-DD, "-" when absent
fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
