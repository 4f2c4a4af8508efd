//! Aggregations, headline indicators and insight rankings over a
//! [`FilteredView`](crate::filter::FilteredView).
//!
//! Every function here is a pure transformation: it reads the view and
//! returns freshly built rows, leaving the view and its table untouched.

pub mod aggregate;
pub mod drilldown;
pub mod insights;
pub mod kpi;
pub mod types;
pub mod utility;

pub use aggregate::{category_by_year, sex_shares_by_year, totals_by_year};
pub use drilldown::program_drilldown;
pub use insights::compute_insights;
pub use kpi::compute_kpis;
