use tfp_datahub::config::Config;
use tfp_datahub::{MarketScope, SuspensionService};

use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // 查询当天的全市场停复牌记录
    let today = chrono::Local::now().naive_local().date();
    println!("正在获取 {} 的停复牌数据...", today);

    let service = SuspensionService::with_default_scrapers(Config::new())?;
    let table = service
        .get_suspensions(MarketScope::National, &today, &today)
        .await?;

    println!("共获取 {} 条停复牌记录", table.events.len());

    // 打印前十条
    for event in table.events.iter().take(10) {
        println!(
            "{}. {} ({}) 停牌原因: {}",
            event.seq, event.name, event.code, event.suspend_reason
        );
    }

    if table.events.len() > 10 {
        println!("... 其余 {} 条省略", table.events.len() - 10);
    }

    Ok(())
}
