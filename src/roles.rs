//! Header role detection.
//!
//! Each role has a fixed list of synonym phrases. Every header is scored
//! against every synonym and the role goes to the header with the single
//! highest score, provided it clears [`HEADER_MATCH_THRESHOLD`].

use crate::error::AnalysisError;
use crate::similarity::{normalize, similarity};
use crate::types::{Cell, ColumnMapping, ColumnRoleMap, Role};
use crate::util::parse_index;
use serde::Serialize;
use tracing::debug;

/// A header must score strictly above this to claim a role.
pub const HEADER_MATCH_THRESHOLD: f64 = 0.6;

/// Canonical header phrases per role, already normalized.
pub fn synonyms(role: Role) -> &'static [&'static str] {
    match role {
        Role::Description => &[
            "description",
            "item",
            "product",
            "name",
            "product description",
        ],
        Role::Quantity => &["quantity", "qty", "number sold", "units sold", "count"],
        Role::Sales => &[
            "sales",
            "total sales",
            "revenue",
            "net sales",
            "total revenue",
            "amount",
        ],
        Role::Cost => &[
            "cost",
            "unit cost",
            "cost price",
            "cost per unit",
            "purchase price",
        ],
    }
}

/// The winning header for one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleMatch {
    pub role: Role,
    pub column: usize,
    pub header: String,
    pub synonym: &'static str,
    pub score: f64,
}

/// Outcome of automatic header resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleResolution {
    pub roles: ColumnRoleMap,
    /// Every role (mandatory or not) that found no header.
    pub unresolved: Vec<Role>,
    pub matches: Vec<RoleMatch>,
}

impl RoleResolution {
    /// True when a mandatory role is unresolved and the user must map columns.
    pub fn mapping_required(&self) -> bool {
        self.unresolved.iter().any(|r| r.is_required())
    }

    pub fn into_mapping(self) -> Result<ColumnMapping, AnalysisError> {
        self.roles
            .to_mapping()
            .ok_or_else(|| AnalysisError::UnresolvedMapping {
                missing: self.roles.missing_required(),
            })
    }
}

/// Normalized header strings; empty cells become `""`.
pub fn normalize_headers(header_row: &[Cell]) -> Vec<String> {
    header_row
        .iter()
        .map(|c| c.as_text().map(|s| normalize(&s)).unwrap_or_default())
        .collect()
}

/// Assign columns to roles from a header row.
///
/// Ties keep the first header scanned. Two roles may end up on the same
/// column; nothing here enforces a one-to-one assignment.
pub fn resolve_roles(header_row: &[Cell]) -> RoleResolution {
    let headers = normalize_headers(header_row);
    let mut resolution = RoleResolution::default();

    for role in Role::ALL {
        let mut best: Option<RoleMatch> = None;
        for (column, header) in headers.iter().enumerate() {
            for &synonym in synonyms(role) {
                let score = similarity(header, synonym);
                let current = best.as_ref().map_or(0.0, |m| m.score);
                if score > current && score > HEADER_MATCH_THRESHOLD {
                    best = Some(RoleMatch {
                        role,
                        column,
                        header: header.clone(),
                        synonym,
                        score,
                    });
                }
            }
        }

        match best {
            Some(m) => {
                debug!(
                    role = %role,
                    column = m.column,
                    header = %m.header,
                    synonym = m.synonym,
                    score = m.score,
                    "resolved column role"
                );
                resolution.roles.set(role, Some(m.column));
                resolution.matches.push(m);
            }
            None => {
                debug!(role = %role, "no header matched role");
                resolution.unresolved.push(role);
            }
        }
    }
    resolution
}

/// Column choices typed by a user when detection fails.
///
/// Blank or non-numeric text leaves a role unselected; for cost that means
/// "no cost data".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualMapping {
    pub description: Option<usize>,
    pub quantity: Option<usize>,
    pub sales: Option<usize>,
    pub cost: Option<usize>,
}

impl ManualMapping {
    pub fn from_inputs(description: &str, quantity: &str, sales: &str, cost: &str) -> Self {
        Self {
            description: parse_index(description),
            quantity: parse_index(quantity),
            sales: parse_index(sales),
            cost: parse_index(cost),
        }
    }

    fn role_map(&self) -> ColumnRoleMap {
        ColumnRoleMap {
            description: self.description,
            quantity: self.quantity,
            sales: self.sales,
            cost: self.cost,
        }
    }

    /// Validate against a header of `columns` cells.
    pub fn into_mapping(self, columns: usize) -> Result<ColumnMapping, AnalysisError> {
        let roles = self.role_map();
        let missing = roles.missing_required();
        if !missing.is_empty() {
            return Err(AnalysisError::IncompleteManualMapping { missing });
        }
        for role in Role::ALL {
            if let Some(index) = roles.get(role) {
                if index >= columns {
                    return Err(AnalysisError::ColumnOutOfRange {
                        role,
                        index,
                        columns,
                    });
                }
            }
        }
        roles
            .to_mapping()
            .ok_or_else(|| AnalysisError::IncompleteManualMapping {
                missing: roles.missing_required(),
            })
    }
}
