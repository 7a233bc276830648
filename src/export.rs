use crate::error::Result;
use crate::format::NumberLocale;
use crate::report::{ReportSeries, ReportType};
use crate::utils::date_stamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILE_PREFIX: &str = "Farm_Report";

/// Naming data the external PDF exporter cannot derive on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub report_tag: String,
    pub date_stamp: String,
    pub title: String,
    pub file_name: String,
}

impl ExportMetadata {
    pub fn new(report_type: ReportType, generated_on: NaiveDate, file_prefix: &str) -> Self {
        let report_tag = report_type.as_str().to_string();
        let date_stamp = date_stamp(generated_on);
        let prefix = if file_prefix.trim().is_empty() {
            DEFAULT_FILE_PREFIX
        } else {
            file_prefix.trim()
        };
        let file_name = format!("{}_{}_{}.pdf", prefix, report_tag, date_stamp);

        Self {
            report_tag,
            date_stamp,
            title: report_type.title().to_string(),
            file_name,
        }
    }

    /// The same name with another extension, for CSV or JSON exports.
    pub fn file_name_with_extension(&self, extension: &str) -> String {
        let stem = self.file_name.trim_end_matches(".pdf");
        format!("{}.{}", stem, extension.trim_start_matches('.'))
    }
}

impl ReportSeries {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One row per label, one column per series, raw numbers.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![self.x_axis_title.clone()];
        if header[0].is_empty() {
            header[0] = "Label".to_string();
        }
        header.extend(self.series.iter().map(|s| s.name.clone()));
        writer.write_record(&header)?;

        for (idx, label) in self.labels.iter().enumerate() {
            let mut row = vec![label.clone()];
            row.extend(self.series.iter().map(|s| {
                s.values
                    .get(idx)
                    .map(|v| format!("{:.2}", v))
                    .unwrap_or_default()
            }));
            writer.write_record(&row)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn to_markdown(&self, locale: &NumberLocale) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));

        if self.labels.is_empty() {
            output.push_str("_No data for the selected filters._\n");
            return output;
        }

        let first_column = if self.x_axis_title.is_empty() {
            "Label"
        } else {
            self.x_axis_title.as_str()
        };
        output.push_str(&format!("| {} |", first_column));
        for series in &self.series {
            output.push_str(&format!(" {} |", series.name));
        }
        output.push('\n');

        output.push_str("|---|");
        for _ in &self.series {
            output.push_str("---:|");
        }
        output.push('\n');

        for (idx, label) in self.labels.iter().enumerate() {
            output.push_str(&format!("| {} |", label));
            for series in &self.series {
                let cell = series
                    .values
                    .get(idx)
                    .map(|v| self.format_value(*v, locale))
                    .unwrap_or_default();
                output.push_str(&format!(" {} |", cell));
            }
            output.push('\n');
        }

        output
    }
}
