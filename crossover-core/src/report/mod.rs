// =================================================================
// report/mod.rs - Summary Table, HTML Chart and Chart Server
// =================================================================

pub mod chart;
pub mod errors;
pub mod server;
pub mod summary;

pub use chart::{render_chart, write_chart, ChartData};
pub use errors::ReportError;
pub use server::serve_chart;
pub use summary::{format_summary, format_trades};
