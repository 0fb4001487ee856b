use chrono::Local;
use checkmate_core::storage::session_log;
use checkmate_core::{FocusInsights, SqliteStore};

use super::CliResult;

pub fn run(json: bool) -> CliResult {
    let store = SqliteStore::open()?;
    let records = session_log::load(&store)?;
    let insights = FocusInsights::compute(&records, &Local::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }
    println!("Today          {} min", insights.today);
    println!("This week      {} min", insights.week);
    println!("This month     {} min", insights.month);
    println!("Daily (week)   {} min", insights.week_average.round());
    println!("Daily (month)  {} min", insights.month_average.round());
    Ok(())
}
