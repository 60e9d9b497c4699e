use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text form of the cell, `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A data row as produced by a sheet decoder, one cell per column.
pub type RawRow = Vec<Cell>;

/// A decoded sheet: its header row and the data rows below it.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub source: String,
    pub header: Vec<Cell>,
    pub rows: Vec<RawRow>,
}

/// The four semantic column meanings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Description,
    Quantity,
    Sales,
    Cost,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Description, Role::Quantity, Role::Sales, Role::Cost];
    pub const REQUIRED: [Role; 3] = [Role::Description, Role::Quantity, Role::Sales];

    pub fn is_required(self) -> bool {
        !matches!(self, Role::Cost)
    }

    /// Label used when asking for a manual mapping.
    pub fn label(self) -> &'static str {
        match self {
            Role::Description => "Product Description",
            Role::Quantity => "Quantity",
            Role::Sales => "Total Sales",
            Role::Cost => "Cost (if available)",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Description => "description",
            Role::Quantity => "quantity",
            Role::Sales => "sales",
            Role::Cost => "cost",
        };
        f.write_str(name)
    }
}

/// Role to column assignment; any role may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRoleMap {
    pub description: Option<usize>,
    pub quantity: Option<usize>,
    pub sales: Option<usize>,
    pub cost: Option<usize>,
}

impl ColumnRoleMap {
    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Description => self.description,
            Role::Quantity => self.quantity,
            Role::Sales => self.sales,
            Role::Cost => self.cost,
        }
    }

    pub fn set(&mut self, role: Role, column: Option<usize>) {
        match role {
            Role::Description => self.description = column,
            Role::Quantity => self.quantity = column,
            Role::Sales => self.sales = column,
            Role::Cost => self.cost = column,
        }
    }

    /// Mandatory roles that have no column yet.
    pub fn missing_required(&self) -> Vec<Role> {
        Role::REQUIRED
            .into_iter()
            .filter(|r| self.get(*r).is_none())
            .collect()
    }

    /// Validated mapping, or `None` while a mandatory role is unset.
    pub fn to_mapping(&self) -> Option<ColumnMapping> {
        Some(ColumnMapping {
            description: self.description?,
            quantity: self.quantity?,
            sales: self.sales?,
            cost: self.cost,
        })
    }
}

/// A complete mapping: every mandatory role has a column, cost is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub description: usize,
    pub quantity: usize,
    pub sales: usize,
    pub cost: Option<usize>,
}

/// One product after fuzzy deduplication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub description: String,
    pub quantity: f64,
    pub sales: f64,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
    pub unit_price: f64,
}

/// Aggregation output in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub products: Vec<ProductRecord>,
    /// Whether the cost role was mapped when the rows were folded.
    pub cost_mapped: bool,
}

/// Display row for the console preview; all values pre-formatted.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReportRow {
    #[serde(rename = "Product")]
    #[tabled(rename = "Product")]
    pub product: String,
    #[serde(rename = "Quantity")]
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Total Sales")]
    #[tabled(rename = "Total Sales")]
    pub sales: String,
    #[serde(rename = "Unit Price")]
    #[tabled(rename = "Unit Price")]
    pub unit_price: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub analysis: String,
    pub label: String,
    pub generated_on: String,
    pub total_products: usize,
    pub total_quantity: f64,
    pub total_sales: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_profit: Option<f64>,
}
