use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number conventions for display. Defaults to Brazilian Portuguese: `R$ 1.234,56`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NumberLocale {
    pub currency_symbol: String,
    /// Inserted between the symbol and the digits.
    #[serde(default)]
    pub symbol_separator: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub currency_decimals: usize,
    /// Upper bound for quantities; trailing zeros are trimmed.
    pub max_quantity_decimals: usize,
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::pt_br()
    }
}

impl NumberLocale {
    pub fn pt_br() -> Self {
        Self {
            currency_symbol: "R$".to_string(),
            symbol_separator: " ".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
            currency_decimals: 2,
            max_quantity_decimals: 3,
        }
    }

    pub fn en_us() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            symbol_separator: String::new(),
            thousands_separator: ',',
            decimal_separator: '.',
            currency_decimals: 2,
            max_quantity_decimals: 3,
        }
    }

    pub fn format_currency(&self, value: f64) -> String {
        let value = finite_or_zero(value);
        let digits = self.group(value.abs(), self.currency_decimals, false);
        let sign = if value < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        format!(
            "{}{}{}{}",
            sign, self.currency_symbol, self.symbol_separator, digits
        )
    }

    pub fn format_quantity(&self, value: f64) -> String {
        let value = finite_or_zero(value);
        let digits = self.group(value.abs(), self.max_quantity_decimals, true);
        if value < 0.0 && digits != "0" {
            format!("-{}", digits)
        } else {
            digits
        }
    }

    fn group(&self, abs: f64, decimals: usize, trim_fraction: bool) -> String {
        let fixed = format!("{:.*}", decimals, abs);
        let (int_part, dec_part) = match fixed.split_once('.') {
            Some((i, d)) => (i, d),
            None => (fixed.as_str(), ""),
        };

        let mut with_separators = String::new();
        for (i, c) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                with_separators.push(self.thousands_separator);
            }
            with_separators.push(c);
        }
        let mut out: String = with_separators.chars().rev().collect();

        let dec_part = if trim_fraction {
            dec_part.trim_end_matches('0')
        } else {
            dec_part
        };
        if !dec_part.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(dec_part);
        }
        out
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn format_currency(value: f64) -> String {
    NumberLocale::default().format_currency(value)
}

pub fn format_quantity(value: f64) -> String {
    NumberLocale::default().format_quantity(value)
}

/// Y axis title for a report type key; unknown keys fall back to "Value".
pub fn axis_y_title(report_type: &str) -> &'static str {
    match report_type {
        "productivity" => "Productivity (kg/ha)",
        "financial" => "Value (R$)",
        "crop_production" => "Production (kg)",
        _ => "Value",
    }
}

/// X axis title for a report type key; unknown keys fall back to an empty title.
pub fn axis_x_title(report_type: &str) -> &'static str {
    match report_type {
        "productivity" | "crop_production" => "Crops",
        "financial" => "Categories",
        _ => "",
    }
}

/// Chart title for a report type key; unknown keys fall back to "Report".
pub fn report_title(report_type: &str) -> &'static str {
    match report_type {
        "productivity" => "Productivity by Crop (kg/ha)",
        "financial" => "Financial Result",
        "crop_production" => "Total Production by Crop (kg)",
        _ => "Report",
    }
}
