use crate::aggregate::{group_by_crop, net_result, total_by_kind};
use crate::error::{FarmReportError, Result};
use crate::filter::{CropFilter, DateWindow, FilterCriteria, FilteredView};
use crate::format::{axis_x_title, axis_y_title, report_title, NumberLocale};
use crate::schema::{DashboardData, TransactionKind};
use chrono::NaiveDate;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const REVENUE_LABEL: &str = "Revenue";
pub const EXPENSE_LABEL: &str = "Expense";
pub const NET_RESULT_LABEL: &str = "Net Result";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Productivity,
    Financial,
    CropProduction,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [
        ReportType::Productivity,
        ReportType::Financial,
        ReportType::CropProduction,
    ];

    /// Wire tag, also used in export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Productivity => "productivity",
            Self::Financial => "financial",
            Self::CropProduction => "crop_production",
        }
    }

    pub fn title(&self) -> &'static str {
        report_title(self.as_str())
    }

    pub fn value_format(&self) -> ValueFormat {
        match self {
            Self::Financial => ValueFormat::Currency,
            Self::Productivity | Self::CropProduction => ValueFormat::Quantity,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = FarmReportError;

    fn from_str(s: &str) -> Result<Self> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| FarmReportError::UnknownReportType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Currency,
    Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart-ready output: labels with one or more aligned series plus display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSeries {
    pub report_type: ReportType,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<NamedSeries>,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub format: ValueFormat,
    pub unit: Option<String>,
}

impl ReportSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Formats a value according to this series' format flag and unit.
    pub fn format_value(&self, value: f64, locale: &NumberLocale) -> String {
        match self.format {
            ValueFormat::Currency => locale.format_currency(value),
            ValueFormat::Quantity => match &self.unit {
                Some(unit) => format!("{} {}", locale.format_quantity(value), unit),
                None => locale.format_quantity(value),
            },
        }
    }

    /// Value of the first series at `label`.
    pub fn value_for(&self, label: &str) -> Option<f64> {
        let idx = self.labels.iter().position(|l| l == label)?;
        self.series.first().and_then(|s| s.values.get(idx)).copied()
    }
}

/// What the report page asks for: a mode plus the criteria it runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRequest {
    #[serde(default)]
    pub report_type: ReportType,
    #[serde(default)]
    pub criteria: FilterCriteria,
}

impl ReportRequest {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            criteria: FilterCriteria::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Switches mode and clears the criteria the new mode cannot use:
    /// the financial report drops the crop filter, the others drop the date window.
    pub fn select_report_type(&mut self, report_type: ReportType) {
        self.report_type = report_type;
        match report_type {
            ReportType::Financial => self.criteria.crop = CropFilter::All,
            ReportType::Productivity | ReportType::CropProduction => {
                self.criteria.window = DateWindow::AllTime
            }
        }
    }
}

/// Builds the requested report from an already filtered view.
pub fn build_from_view(report_type: ReportType, view: &FilteredView<'_>) -> ReportSeries {
    let (labels, series, unit) = match report_type {
        ReportType::Productivity => {
            let groups = group_by_crop(view.productions.iter().copied());
            let labels: Vec<String> = groups.keys().cloned().collect();
            let values = groups.values().map(|g| g.productivity(&view.index)).collect();
            (
                labels,
                vec![NamedSeries {
                    name: "Productivity (yield/area)".to_string(),
                    values,
                }],
                Some("kg/ha"),
            )
        }
        ReportType::Financial => {
            let transactions = || view.transactions.iter().copied();
            let revenue = total_by_kind(transactions(), TransactionKind::Revenue);
            let expense = total_by_kind(transactions(), TransactionKind::Expense);
            (
                vec![
                    REVENUE_LABEL.to_string(),
                    EXPENSE_LABEL.to_string(),
                    NET_RESULT_LABEL.to_string(),
                ],
                vec![NamedSeries {
                    name: "Value".to_string(),
                    values: vec![revenue, expense, net_result(transactions())],
                }],
                None,
            )
        }
        ReportType::CropProduction => {
            let groups = group_by_crop(view.productions.iter().copied());
            let labels: Vec<String> = groups.keys().cloned().collect();
            let values = groups.values().map(|g| g.total_yield).collect();
            (
                labels,
                vec![NamedSeries {
                    name: "Production (kg)".to_string(),
                    values,
                }],
                Some("kg"),
            )
        }
    };

    debug!(
        "Built {} report with {} labels",
        report_type,
        labels.len()
    );

    ReportSeries {
        report_type,
        title: report_type.title().to_string(),
        labels,
        series,
        x_axis_title: axis_x_title(report_type.as_str()).to_string(),
        y_axis_title: axis_y_title(report_type.as_str()).to_string(),
        format: report_type.value_format(),
        unit: unit.map(str::to_string),
    }
}

/// Filters `data` with the request's criteria and builds the report.
pub fn build_report(
    data: &DashboardData,
    request: &ReportRequest,
    reference: NaiveDate,
) -> ReportSeries {
    let view = FilteredView::apply(data, &request.criteria, reference);
    build_from_view(request.report_type, &view)
}
