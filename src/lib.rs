//! # Farm Report Builder
//!
//! The aggregation and reporting engine behind a farm-management dashboard.
//! It takes the raw collections a user has recorded (properties, crop
//! production cycles, financial transactions) and derives filtered views,
//! KPIs and chart-ready series.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: one complete load of [`DashboardData`], replaced wholesale on reload
//! - **Filter Criteria**: search term, crop filter, date window and property scope
//! - **Summary**: scalar KPIs (areas, yields, revenue, expense, net result)
//! - **Report**: a [`ReportSeries`] for one of the [`ReportType`] modes, with
//!   labels, aligned series and formatting metadata for the chart renderer
//! - **Sentinels**: unknown property references resolve to "Property not found",
//!   missing ones to "General"; ratios with a zero denominator are 0
//!
//! ## Example
//!
//! ```rust,ignore
//! use farm_report_builder::*;
//! use chrono::NaiveDate;
//!
//! let data = DashboardData::new(
//!     vec![Property {
//!         id: "p1".to_string(),
//!         name: "Fazenda Boa Vista".to_string(),
//!         location: "Rio Verde, GO".to_string(),
//!         area_ha: 30.0,
//!         owner_id: "u1".to_string(),
//!     }],
//!     vec![ProductionRecord {
//!         id: 1,
//!         property_id: "p1".to_string(),
//!         crop: "Soy".to_string(),
//!         season: "2023/2024".to_string(),
//!         yield_quantity: 300.0,
//!         cultivated_area: 30.0,
//!         date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
//!     }],
//!     vec![],
//! );
//!
//! let mut dashboard = Dashboard::new(DashboardConfig::default());
//! dashboard.replace_data(data)?;
//! dashboard.select_report_type(ReportType::Productivity);
//!
//! let report = dashboard.report();
//! assert_eq!(report.labels, vec!["Soy"]);
//! assert_eq!(report.value_for("Soy"), Some(10.0));
//! ```

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod report;
pub mod schema;
pub mod store;
pub mod utils;

#[cfg(feature = "http")]
pub mod http;

pub use aggregate::*;
pub use config::{DashboardConfig, EndpointConfig};
pub use dashboard::{Dashboard, DashboardView, SubscriptionId};
pub use error::{FarmReportError, Result};
pub use export::ExportMetadata;
pub use filter::*;
pub use format::*;
pub use report::*;
pub use schema::*;
pub use store::{DataSource, EntityStore, InMemorySource, ReloadOutcome, ReloadTicket};
pub use utils::{parse_flexible_date, safe_ratio};

#[cfg(feature = "http")]
pub use http::HttpDataSource;

use chrono::NaiveDate;

/// Filters a snapshot and computes its KPIs in one call.
pub fn summarize(
    data: &DashboardData,
    criteria: &FilterCriteria,
    reference: NaiveDate,
) -> DashboardSummary {
    let view = FilteredView::apply(data, criteria, reference);
    DashboardSummary::from_view(&view)
}
