pub mod error;
pub mod filter;
pub mod metrics;
pub mod options;
pub mod session;

pub use error::{PipelineError, Result};
pub use filter::{
    apply_filters, filter_table, ChannelSelection, DateRange, FilterCriteria, FilterOutcome,
};
pub use metrics::{
    compute_kpis, grouped_revenue, highlights, top_n, Aggregate, GroupKey, GroupRow,
    GroupedRevenue, Highlights, Kpis, SortOrder, DEFAULT_TOP_N,
};
pub use options::{filter_options, FilterOptions};
pub use session::{preview, Dashboard, DashboardSettings, DashboardView, PreviewRow, Session};
