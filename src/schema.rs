use crate::error::{FarmReportError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Label used for transactions that are not tied to any property.
pub const GENERAL_LABEL: &str = "General";

/// Label used when a record points at a property id absent from the snapshot.
pub const PROPERTY_NOT_FOUND_LABEL: &str = "Property not found";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Property {
    #[schemars(description = "Unique identifier of the property")]
    pub id: String,

    #[serde(alias = "nomepropriedade")]
    #[schemars(description = "Display name of the property (e.g., 'Fazenda Boa Vista')")]
    pub name: String,

    #[serde(default, alias = "localizacao")]
    #[schemars(description = "Free-text location (city, state or coordinates)")]
    pub location: String,

    #[serde(default)]
    #[schemars(description = "Total area of the property in hectares. Must be non-negative.")]
    pub area_ha: f64,

    #[serde(default, alias = "usuarioId")]
    #[schemars(description = "Identifier of the user that owns the property")]
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ProductionRecord {
    pub id: i64,

    #[serde(alias = "propriedadeId")]
    #[schemars(description = "Identifier of the property this crop cycle belongs to")]
    pub property_id: String,

    #[serde(alias = "cultura")]
    #[schemars(description = "Crop name (e.g., 'Soy', 'Corn')")]
    pub crop: String,

    #[serde(default, alias = "safra")]
    #[schemars(description = "Season or harvest label (e.g., '2023/2024')")]
    pub season: String,

    #[serde(default, alias = "produtividade")]
    #[schemars(description = "Harvested quantity in kg. Treated as 0 when absent.")]
    pub yield_quantity: f64,

    #[serde(default, alias = "areaproducao")]
    #[schemars(description = "Cultivated area in hectares. Treated as 0 when absent.")]
    pub cultivated_area: f64,

    #[serde(alias = "data", deserialize_with = "crate::utils::deserialize_date")]
    #[schemars(with = "NaiveDate")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[serde(alias = "receita")]
    #[schemars(description = "Money coming in (sales, subsidies)")]
    Revenue,

    #[serde(alias = "despesa")]
    #[schemars(description = "Money going out (inputs, labor, machinery)")]
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FinancialTransaction {
    pub id: i64,

    #[serde(default, alias = "propriedadeId")]
    #[schemars(
        description = "Property this entry belongs to. Absent or empty means a general entry not tied to any property."
    )]
    pub property_id: Option<String>,

    #[serde(alias = "tipo")]
    pub kind: TransactionKind,

    #[serde(default, alias = "descricao")]
    pub description: String,

    #[serde(alias = "valor")]
    #[schemars(
        description = "Non-negative amount. The direction is given by `kind`, never by the sign."
    )]
    pub amount: f64,

    #[serde(alias = "data", deserialize_with = "crate::utils::deserialize_date")]
    #[schemars(with = "NaiveDate")]
    pub date: NaiveDate,

    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
}

impl FinancialTransaction {
    /// The referenced property id, with an empty string treated as no reference.
    pub fn property_ref(&self) -> Option<&str> {
        self.property_id.as_deref().filter(|id| !id.is_empty())
    }

    /// The amount signed by kind: revenue positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Revenue => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// One complete load from the external data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DashboardData {
    #[serde(default, alias = "propriedades")]
    pub properties: Vec<Property>,

    #[serde(default, alias = "producoes")]
    pub productions: Vec<ProductionRecord>,

    #[serde(default, alias = "movimentacoes")]
    pub transactions: Vec<FinancialTransaction>,
}

impl DashboardData {
    pub fn new(
        properties: Vec<Property>,
        productions: Vec<ProductionRecord>,
        transactions: Vec<FinancialTransaction>,
    ) -> Self {
        Self {
            properties,
            productions,
            transactions,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.productions.is_empty() && self.transactions.is_empty()
    }

    /// Rejects snapshots that would corrupt aggregates: duplicate property ids,
    /// negative or non-finite areas, yields and amounts.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.id.as_str()) {
                return Err(invalid("property", &property.id, "duplicate property id"));
            }
            check_non_negative("property", &property.id, "area_ha", property.area_ha)?;
        }

        for record in &self.productions {
            let id = record.id.to_string();
            check_non_negative("production", &id, "yield_quantity", record.yield_quantity)?;
            check_non_negative("production", &id, "cultivated_area", record.cultivated_area)?;
        }

        for transaction in &self.transactions {
            check_non_negative(
                "transaction",
                &transaction.id.to_string(),
                "amount",
                transaction.amount,
            )?;
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardData)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

fn check_non_negative(entity: &'static str, id: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(invalid(entity, id, &format!("{} is not a finite number", field)));
    }
    if value < 0.0 {
        return Err(invalid(
            entity,
            id,
            &format!("{} must be non-negative, got {}", field, value),
        ));
    }
    Ok(())
}

fn invalid(entity: &'static str, id: &str, details: &str) -> FarmReportError {
    FarmReportError::InvalidRecord {
        entity,
        id: id.to_string(),
        details: details.to_string(),
    }
}
