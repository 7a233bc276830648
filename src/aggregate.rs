use crate::filter::{FilteredView, PropertyIndex};
use crate::schema::{FinancialTransaction, ProductionRecord, Property, TransactionKind};
use crate::utils::safe_ratio;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Category label for transactions without one.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

// Folds from +0.0; `Iterator::sum` over an empty f64 iterator yields -0.0.
fn sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

pub fn total_area<'a, I>(properties: I) -> f64
where
    I: IntoIterator<Item = &'a Property>,
{
    sum(properties.into_iter().map(|p| p.area_ha))
}

pub fn active_crop_count<'a, I>(productions: I) -> usize
where
    I: IntoIterator<Item = &'a ProductionRecord>,
{
    productions
        .into_iter()
        .map(|r| r.crop.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn total_yield<'a, I>(productions: I) -> f64
where
    I: IntoIterator<Item = &'a ProductionRecord>,
{
    sum(productions.into_iter().map(|r| r.yield_quantity))
}

/// Area of the properties referenced by at least one production record,
/// resolved through the full property index. Each property counts once;
/// dangling references contribute nothing.
pub fn planted_area<'a, R>(productions: R, index: &PropertyIndex<'_>) -> f64
where
    R: IntoIterator<Item = &'a ProductionRecord>,
{
    let referenced: BTreeSet<&str> = productions
        .into_iter()
        .map(|r| r.property_id.as_str())
        .collect();

    sum(referenced.into_iter().map(|id| index.area_of(id)))
}

pub fn average_yield_per_area<'a, R>(productions: R, index: &PropertyIndex<'_>) -> f64
where
    R: IntoIterator<Item = &'a ProductionRecord> + Clone,
{
    let total = total_yield(productions.clone());
    let area = planted_area(productions, index);
    safe_ratio(total, area)
}

pub fn total_by_kind<'a, I>(transactions: I, kind: TransactionKind) -> f64
where
    I: IntoIterator<Item = &'a FinancialTransaction>,
{
    let amounts = transactions
        .into_iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount);
    sum(amounts)
}

pub fn net_result<'a, I>(transactions: I) -> f64
where
    I: IntoIterator<Item = &'a FinancialTransaction>,
{
    sum(transactions.into_iter().map(|t| t.signed_amount()))
}

/// Net result as a share of revenue. 0 when there is no revenue.
pub fn net_margin<'a, I>(transactions: I) -> f64
where
    I: IntoIterator<Item = &'a FinancialTransaction> + Clone,
{
    let revenue = total_by_kind(transactions.clone(), TransactionKind::Revenue);
    safe_ratio(net_result(transactions), revenue)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropAggregate {
    pub total_yield: f64,
    pub record_count: usize,
    pub property_ids: BTreeSet<String>,
}

impl CropAggregate {
    /// Yield over the summed area of the distinct properties growing this crop.
    /// Unresolvable properties add no area; no area at all yields 0.
    pub fn productivity(&self, index: &PropertyIndex<'_>) -> f64 {
        let area = sum(self.property_ids.iter().map(|id| index.area_of(id)));
        safe_ratio(self.total_yield, area)
    }
}

/// Per-crop totals keyed (and therefore ordered) by crop name.
pub fn group_by_crop<'a, I>(productions: I) -> BTreeMap<String, CropAggregate>
where
    I: IntoIterator<Item = &'a ProductionRecord>,
{
    let mut groups: BTreeMap<String, CropAggregate> = BTreeMap::new();

    for record in productions {
        let entry = groups.entry(record.crop.clone()).or_default();
        entry.total_yield += record.yield_quantity;
        entry.record_count += 1;
        entry.property_ids.insert(record.property_id.clone());
    }

    groups
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub revenue: f64,
    pub expense: f64,
}

impl CategoryTotals {
    pub fn net(&self) -> f64 {
        self.revenue - self.expense
    }
}

pub fn totals_by_category<'a, I>(transactions: I) -> BTreeMap<String, CategoryTotals>
where
    I: IntoIterator<Item = &'a FinancialTransaction>,
{
    let mut totals: BTreeMap<String, CategoryTotals> = BTreeMap::new();

    for transaction in transactions {
        let category = transaction
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED_LABEL);

        let entry = totals.entry(category.to_string()).or_default();
        match transaction.kind {
            TransactionKind::Revenue => entry.revenue += transaction.amount,
            TransactionKind::Expense => entry.expense += transaction.amount,
        }
    }

    totals
}

/// Sorted distinct crop names, the options of a crop selector.
pub fn distinct_crops<'a, I>(productions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ProductionRecord>,
{
    productions
        .into_iter()
        .map(|r| r.crop.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted distinct, non-empty season labels.
pub fn distinct_seasons<'a, I>(productions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ProductionRecord>,
{
    productions
        .into_iter()
        .filter(|r| !r.season.trim().is_empty())
        .map(|r| r.season.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Scalar KPIs of a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub property_count: usize,
    pub production_count: usize,
    pub transaction_count: usize,
    pub total_area: f64,
    pub planted_area: f64,
    pub active_crop_count: usize,
    pub total_yield: f64,
    pub average_yield_per_area: f64,
    pub total_revenue: f64,
    pub total_expense: f64,
    pub net_result: f64,
    pub net_margin: f64,
}

impl DashboardSummary {
    pub fn from_view(view: &FilteredView<'_>) -> Self {
        let properties = || view.properties.iter().copied();
        let index = &view.index;
        let productions = || view.productions.iter().copied();
        let transactions = || view.transactions.iter().copied();

        Self {
            property_count: view.properties.len(),
            production_count: view.productions.len(),
            transaction_count: view.transactions.len(),
            total_area: total_area(properties()),
            planted_area: planted_area(productions(), index),
            active_crop_count: active_crop_count(productions()),
            total_yield: total_yield(productions()),
            average_yield_per_area: average_yield_per_area(productions(), index),
            total_revenue: total_by_kind(transactions(), TransactionKind::Revenue),
            total_expense: total_by_kind(transactions(), TransactionKind::Expense),
            net_result: net_result(transactions()),
            net_margin: net_margin(transactions()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn property(id: &str, area_ha: f64) -> Property {
        Property {
            id: id.to_string(),
            name: format!("Farm {}", id),
            location: String::new(),
            area_ha,
            owner_id: "u1".to_string(),
        }
    }

    fn production(id: i64, property_id: &str, crop: &str, yield_quantity: f64) -> ProductionRecord {
        ProductionRecord {
            id,
            property_id: property_id.to_string(),
            crop: crop.to_string(),
            season: "2024".to_string(),
            yield_quantity,
            cultivated_area: 0.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn transaction(
        id: i64,
        kind: TransactionKind,
        amount: f64,
        category: Option<&str>,
    ) -> FinancialTransaction {
        FinancialTransaction {
            id,
            property_id: None,
            kind,
            description: String::new(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_inputs_yield_zero() {
        let properties: Vec<Property> = vec![];
        let productions: Vec<ProductionRecord> = vec![];
        let transactions: Vec<FinancialTransaction> = vec![];
        let index = PropertyIndex::new(&properties);

        assert_eq!(total_area(&properties), 0.0);
        assert_eq!(active_crop_count(&productions), 0);
        assert_eq!(average_yield_per_area(&productions, &index), 0.0);
        assert_eq!(net_result(&transactions), 0.0);
        assert_eq!(net_margin(&transactions), 0.0);
    }

    #[test]
    fn test_empty_sums_are_positive_zero() {
        let properties: Vec<Property> = vec![];
        let productions: Vec<ProductionRecord> = vec![];
        let transactions: Vec<FinancialTransaction> = vec![];
        let index = PropertyIndex::new(&properties);

        for value in [
            total_area(&properties),
            total_yield(&productions),
            planted_area(&productions, &index),
            total_by_kind(&transactions, TransactionKind::Revenue),
            net_result(&transactions),
        ] {
            assert!(value.is_sign_positive());
        }
    }

    #[test]
    fn test_planted_area_counts_each_property_once() {
        let properties = vec![property("a", 10.0), property("b", 20.0), property("c", 5.0)];
        let productions = vec![
            production(1, "a", "Soy", 100.0),
            production(2, "a", "Corn", 40.0),
            production(3, "b", "Soy", 200.0),
        ];

        let index = PropertyIndex::new(&properties);

        assert_eq!(planted_area(&productions, &index), 30.0);
        assert_eq!(total_area(&properties), 35.0);
        assert!((average_yield_per_area(&productions, &index) - 340.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_dangling_reference_counts_yield_but_not_area() {
        let properties: Vec<Property> = vec![];
        let productions = vec![production(1, "missing", "Soy", 75.0)];

        let index = PropertyIndex::new(&properties);

        assert_eq!(total_yield(&productions), 75.0);
        assert_eq!(planted_area(&productions, &index), 0.0);
        assert_eq!(average_yield_per_area(&productions, &index), 0.0);
    }

    #[test]
    fn test_crop_productivity() {
        let properties = vec![property("a", 10.0), property("b", 20.0)];
        let productions = vec![
            production(1, "a", "Soy", 100.0),
            production(2, "b", "Soy", 200.0),
        ];
        let index = PropertyIndex::new(&properties);

        let groups = group_by_crop(&productions);
        let soy = groups.get("Soy").unwrap();
        assert_eq!(soy.record_count, 2);
        assert_eq!(soy.productivity(&index), 10.0);
    }

    #[test]
    fn test_crop_without_resolvable_area_is_zero() {
        let properties = vec![property("a", 0.0)];
        let productions = vec![
            production(1, "a", "Beans", 30.0),
            production(2, "x", "Beans", 5.0),
        ];
        let index = PropertyIndex::new(&properties);

        let groups = group_by_crop(&productions);
        let beans = groups.get("Beans").unwrap();
        assert_eq!(beans.total_yield, 35.0);
        assert_eq!(beans.productivity(&index), 0.0);
    }

    #[test]
    fn test_summary_area_survives_crop_search() {
        let data = crate::schema::DashboardData::new(
            vec![property("a", 10.0), property("b", 20.0)],
            vec![
                production(1, "a", "Soy", 100.0),
                production(2, "b", "Soy", 200.0),
            ],
            vec![],
        );
        let criteria = crate::filter::FilterCriteria::default().with_search("soy");
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let view = FilteredView::apply(&data, &criteria, today);

        let summary = DashboardSummary::from_view(&view);
        assert!(view.properties.is_empty());
        assert_eq!(summary.total_yield, 300.0);
        assert_eq!(summary.planted_area, 30.0);
        assert_eq!(summary.average_yield_per_area, 10.0);
    }

    #[test]
    fn test_financial_totals() {
        let transactions = vec![
            transaction(1, TransactionKind::Revenue, 1000.0, Some("Sales")),
            transaction(2, TransactionKind::Expense, 400.0, Some("Fuel")),
            transaction(3, TransactionKind::Expense, 100.0, None),
        ];

        assert_eq!(total_by_kind(&transactions, TransactionKind::Revenue), 1000.0);
        assert_eq!(total_by_kind(&transactions, TransactionKind::Expense), 500.0);
        assert_eq!(net_result(&transactions), 500.0);
        assert_eq!(net_margin(&transactions), 0.5);

        let by_category = totals_by_category(&transactions);
        let labels: Vec<&str> = by_category.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Fuel", "Sales", UNCATEGORIZED_LABEL]);
        assert_eq!(by_category["Fuel"].net(), -400.0);
        assert_eq!(by_category["Sales"].revenue, 1000.0);
    }

    #[test]
    fn test_distinct_crops_and_seasons() {
        let mut productions = vec![
            production(1, "a", "Soy", 1.0),
            production(2, "a", "Corn", 1.0),
            production(3, "b", "Soy", 1.0),
        ];
        productions[1].season = String::new();

        assert_eq!(distinct_crops(&productions), vec!["Corn", "Soy"]);
        assert_eq!(distinct_seasons(&productions), vec!["2024"]);
        assert_eq!(active_crop_count(&productions), 2);
    }
}
