pub mod report;
pub mod summary;

pub use report::MonthlyReport;
pub use summary::{ChartPoint, MonthlySummary, daily_series};
