use crate::schema::{
    DashboardData, FinancialTransaction, ProductionRecord, Property, GENERAL_LABEL,
    PROPERTY_NOT_FOUND_LABEL,
};
use crate::utils::{contains_folded, window_start};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum CropFilter {
    #[default]
    All,
    Crop(String),
}

impl CropFilter {
    pub fn matches(&self, crop: &str) -> bool {
        match self {
            Self::All => true,
            Self::Crop(selected) => selected == crop,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DateWindow {
    #[default]
    AllTime,
    /// Transactions dated on or after `reference - days`.
    LastDays { days: u32 },
    /// Inclusive bounds; either side may be open.
    Between {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate, reference: NaiveDate) -> bool {
        match self {
            Self::AllTime => true,
            Self::LastDays { days } => date >= window_start(reference, *days),
            Self::Between { start, end } => {
                start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum PropertyScope {
    #[default]
    All,
    Property(String),
}

impl PropertyScope {
    pub fn matches(&self, property_id: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Property(selected) => property_id == Some(selected.as_str()),
        }
    }
}

/// User selections, rebuilt per interaction and passed by value into the pure filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub crop: CropFilter,
    #[serde(default)]
    pub window: DateWindow,
    #[serde(default)]
    pub scope: PropertyScope,
}

impl FilterCriteria {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = CropFilter::Crop(crop.into());
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_property(mut self, property_id: impl Into<String>) -> Self {
        self.scope = PropertyScope::Property(property_id.into());
        self
    }

    /// Lowercased search term, or `None` when the term is blank.
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

/// Id → property lookup used to resolve names and areas.
#[derive(Debug, Clone)]
pub struct PropertyIndex<'a> {
    by_id: HashMap<&'a str, &'a Property>,
}

impl<'a> PropertyIndex<'a> {
    pub fn new<I>(properties: I) -> Self
    where
        I: IntoIterator<Item = &'a Property>,
    {
        Self {
            by_id: properties.into_iter().map(|p| (p.id.as_str(), p)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Property> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Display name for a property reference. No reference resolves to
    /// [`GENERAL_LABEL`], an unknown one to [`PROPERTY_NOT_FOUND_LABEL`].
    pub fn name_of(&self, id: Option<&str>) -> &'a str {
        match id.filter(|id| !id.is_empty()) {
            None => GENERAL_LABEL,
            Some(id) => self
                .get(id)
                .map(|p| p.name.as_str())
                .unwrap_or(PROPERTY_NOT_FOUND_LABEL),
        }
    }

    /// Area of a referenced property, 0 when it cannot be resolved.
    pub fn area_of(&self, id: &str) -> f64 {
        self.get(id).map(|p| p.area_ha).unwrap_or(0.0)
    }
}

pub fn filter_properties<'a>(
    properties: &'a [Property],
    criteria: &FilterCriteria,
) -> Vec<&'a Property> {
    let needle = criteria.search_needle();

    properties
        .iter()
        .filter(|p| criteria.scope.matches(Some(p.id.as_str())))
        .filter(|p| match &needle {
            None => true,
            Some(term) => contains_folded(&p.name, term) || contains_folded(&p.location, term),
        })
        .collect()
}

pub fn filter_productions<'a>(
    productions: &'a [ProductionRecord],
    index: &PropertyIndex<'_>,
    criteria: &FilterCriteria,
) -> Vec<&'a ProductionRecord> {
    let needle = criteria.search_needle();

    productions
        .iter()
        .filter(|r| criteria.scope.matches(Some(r.property_id.as_str())))
        .filter(|r| criteria.crop.matches(&r.crop))
        .filter(|r| match &needle {
            None => true,
            Some(term) => {
                contains_folded(index.name_of(Some(r.property_id.as_str())), term)
                    || contains_folded(&r.crop, term)
                    || contains_folded(&r.season, term)
            }
        })
        .collect()
}

pub fn filter_transactions<'a>(
    transactions: &'a [FinancialTransaction],
    index: &PropertyIndex<'_>,
    criteria: &FilterCriteria,
    reference: NaiveDate,
) -> Vec<&'a FinancialTransaction> {
    let needle = criteria.search_needle();

    transactions
        .iter()
        .filter(|t| criteria.scope.matches(t.property_ref()))
        .filter(|t| criteria.window.contains(t.date, reference))
        .filter(|t| match &needle {
            None => true,
            Some(term) => {
                contains_folded(&t.description, term)
                    || t.property_ref()
                        .is_some_and(|id| contains_folded(index.name_of(Some(id)), term))
            }
        })
        .collect()
}

/// Filtered subsets of one snapshot, borrowed from it.
///
/// `index` covers every property of the snapshot, so names and areas of
/// filtered records resolve even when their property was filtered out.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub properties: Vec<&'a Property>,
    pub productions: Vec<&'a ProductionRecord>,
    pub transactions: Vec<&'a FinancialTransaction>,
    pub index: PropertyIndex<'a>,
}

impl<'a> FilteredView<'a> {
    pub fn apply(
        data: &'a DashboardData,
        criteria: &FilterCriteria,
        reference: NaiveDate,
    ) -> Self {
        let index = PropertyIndex::new(&data.properties);

        Self {
            properties: filter_properties(&data.properties, criteria),
            productions: filter_productions(&data.productions, &index, criteria),
            transactions: filter_transactions(&data.transactions, &index, criteria, reference),
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TransactionKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> DashboardData {
        DashboardData::new(
            vec![
                Property {
                    id: "p1".to_string(),
                    name: "Fazenda Boa Vista".to_string(),
                    location: "Rio Verde, GO".to_string(),
                    area_ha: 10.0,
                    owner_id: "u1".to_string(),
                },
                Property {
                    id: "p2".to_string(),
                    name: "Sítio Esperança".to_string(),
                    location: "Londrina, PR".to_string(),
                    area_ha: 20.0,
                    owner_id: "u1".to_string(),
                },
            ],
            vec![
                ProductionRecord {
                    id: 1,
                    property_id: "p1".to_string(),
                    crop: "Soy".to_string(),
                    season: "2023/2024".to_string(),
                    yield_quantity: 100.0,
                    cultivated_area: 8.0,
                    date: date(2024, 2, 1),
                },
                ProductionRecord {
                    id: 2,
                    property_id: "p2".to_string(),
                    crop: "Corn".to_string(),
                    season: "2024 safrinha".to_string(),
                    yield_quantity: 50.0,
                    cultivated_area: 5.0,
                    date: date(2024, 6, 1),
                },
                ProductionRecord {
                    id: 3,
                    property_id: "missing".to_string(),
                    crop: "Soy".to_string(),
                    season: "2023/2024".to_string(),
                    yield_quantity: 10.0,
                    cultivated_area: 1.0,
                    date: date(2024, 2, 3),
                },
            ],
            vec![
                FinancialTransaction {
                    id: 1,
                    property_id: Some("p1".to_string()),
                    kind: TransactionKind::Revenue,
                    description: "Soy sale".to_string(),
                    amount: 1000.0,
                    date: date(2024, 3, 20),
                    category: Some("Sales".to_string()),
                },
                FinancialTransaction {
                    id: 2,
                    property_id: None,
                    kind: TransactionKind::Expense,
                    description: "Accountant".to_string(),
                    amount: 100.0,
                    date: date(2024, 1, 5),
                    category: None,
                },
            ],
        )
    }

    #[test]
    fn test_property_search_matches_name_or_location() {
        let data = sample();
        let by_name =
            filter_properties(&data.properties, &FilterCriteria::default().with_search("BOA"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "p1");

        let londrina = FilterCriteria::default().with_search("londrina");
        let by_location = filter_properties(&data.properties, &londrina);
        assert_eq!(by_location.len(), 1);
        assert_eq!(by_location[0].id, "p2");

        let blank =
            filter_properties(&data.properties, &FilterCriteria::default().with_search("  "));
        assert_eq!(blank.len(), 2);
    }

    #[test]
    fn test_production_crop_and_search_filters() {
        let data = sample();
        let index = PropertyIndex::new(&data.properties);

        let soy = filter_productions(
            &data.productions,
            &index,
            &FilterCriteria::default().with_crop("Soy"),
        );
        assert_eq!(soy.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

        let by_property_name = filter_productions(
            &data.productions,
            &index,
            &FilterCriteria::default().with_search("esperança"),
        );
        assert_eq!(by_property_name.len(), 1);
        assert_eq!(by_property_name[0].id, 2);

        let by_season = filter_productions(
            &data.productions,
            &index,
            &FilterCriteria::default().with_search("safrinha"),
        );
        assert_eq!(by_season[0].id, 2);

        let dangling = filter_productions(
            &data.productions,
            &index,
            &FilterCriteria::default().with_search("not found"),
        );
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].id, 3);
    }

    #[test]
    fn test_transaction_window_and_search() {
        let data = sample();
        let index = PropertyIndex::new(&data.properties);
        let today = date(2024, 3, 31);

        let recent = filter_transactions(
            &data.transactions,
            &index,
            &FilterCriteria::default().with_window(DateWindow::LastDays { days: 30 }),
            today,
        );
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, 1);

        let by_property = filter_transactions(
            &data.transactions,
            &index,
            &FilterCriteria::default().with_search("boa vista"),
            today,
        );
        assert_eq!(by_property.len(), 1);

        // General entries are not searchable by the "General" label
        let general = filter_transactions(
            &data.transactions,
            &index,
            &FilterCriteria::default().with_search("general"),
            today,
        );
        assert!(general.is_empty());
    }

    #[test]
    fn test_between_window_is_inclusive() {
        let window = DateWindow::Between {
            start: Some(date(2024, 1, 5)),
            end: Some(date(2024, 3, 20)),
        };
        let today = date(2024, 12, 31);
        assert!(window.contains(date(2024, 1, 5), today));
        assert!(window.contains(date(2024, 3, 20), today));
        assert!(!window.contains(date(2024, 3, 21), today));

        let open_end = DateWindow::Between {
            start: Some(date(2024, 2, 1)),
            end: None,
        };
        assert!(open_end.contains(date(2030, 1, 1), today));
        assert!(!open_end.contains(date(2024, 1, 31), today));
    }

    #[test]
    fn test_property_scope_applies_to_every_collection() {
        let data = sample();
        let view = FilteredView::apply(
            &data,
            &FilterCriteria::default().with_property("p1"),
            date(2024, 12, 31),
        );
        assert_eq!(view.properties.len(), 1);
        assert_eq!(view.productions.len(), 1);
        assert_eq!(view.transactions.len(), 1);
        assert_eq!(view.transactions[0].id, 1);
    }

    #[test]
    fn test_name_resolution_sentinels() {
        let data = sample();
        let index = PropertyIndex::new(&data.properties);
        assert_eq!(index.name_of(Some("p1")), "Fazenda Boa Vista");
        assert_eq!(index.name_of(Some("missing")), PROPERTY_NOT_FOUND_LABEL);
        assert_eq!(index.name_of(None), GENERAL_LABEL);
        assert_eq!(index.name_of(Some("")), GENERAL_LABEL);
        assert_eq!(index.area_of("missing"), 0.0);
    }

    #[test]
    fn test_filters_preserve_order_and_return_subsets() {
        let data = sample();
        let criteria = FilterCriteria::default().with_search("o");
        let view = FilteredView::apply(&data, &criteria, date(2024, 12, 31));

        assert!(view.productions.len() <= data.productions.len());
        for record in &view.productions {
            assert!(data.productions.iter().any(|r| std::ptr::eq(r, *record)));
        }
        let ids: Vec<i64> = view.productions.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
