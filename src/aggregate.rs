use crate::similarity::{normalize, similarity};
use crate::types::{Aggregate, ColumnMapping, ProductRecord, RawRow};
use crate::util::cell_f64;
use tracing::{info, trace};

/// Two descriptions must score strictly above this to be the same product.
pub const PRODUCT_MATCH_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub merged_rows: usize,
}

fn unit_price(sales: f64, quantity: f64) -> f64 {
    if quantity > 0.0 {
        sales / quantity
    } else {
        0.0
    }
}

impl ProductRecord {
    fn new(description: String, quantity: f64, sales: f64, cost: Option<f64>) -> Self {
        Self {
            description,
            quantity,
            sales,
            cost,
            profit: cost.map(|c| sales - c),
            unit_price: unit_price(sales, quantity),
        }
    }

    /// Fold another row's values in. Cost only accumulates when this record
    /// was created with cost data.
    fn absorb(&mut self, quantity: f64, sales: f64, cost: Option<f64>) {
        self.quantity += quantity;
        self.sales += sales;
        if let (Some(total), Some(c)) = (self.cost.as_mut(), cost) {
            *total += c;
        }
        self.profit = self.cost.map(|c| self.sales - c);
        self.unit_price = unit_price(self.sales, self.quantity);
    }
}

/// Fold raw rows into one record per distinct product, in first-seen order.
pub fn aggregate(rows: &[RawRow], mapping: &ColumnMapping) -> Aggregate {
    aggregate_with_report(rows, mapping).0
}

/// Like [`aggregate`], also returning row counts for diagnostics.
///
/// Each description is matched against the existing keys in insertion order
/// and joins the first one scoring above [`PRODUCT_MATCH_THRESHOLD`]. This
/// is first-match, not best-match, so the outcome depends on row order.
pub fn aggregate_with_report(
    rows: &[RawRow],
    mapping: &ColumnMapping,
) -> (Aggregate, AggregateReport) {
    let mut products: Vec<ProductRecord> = Vec::new();
    // Normalized form of each product's canonical key, parallel to `products`.
    let mut keys: Vec<String> = Vec::new();
    let mut report = AggregateReport::default();

    for row in rows {
        report.total_rows += 1;
        if row.is_empty() {
            report.skipped_rows += 1;
            continue;
        }
        let description = row
            .get(mapping.description)
            .and_then(|c| c.as_text())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if description.is_empty() {
            report.skipped_rows += 1;
            continue;
        }

        let quantity = cell_f64(row.get(mapping.quantity)).unwrap_or(0.0);
        let sales = cell_f64(row.get(mapping.sales)).unwrap_or(0.0);
        // Mapped cost that fails to parse counts as 0; unmapped cost is absent.
        let cost = mapping
            .cost
            .map(|idx| cell_f64(row.get(idx)).unwrap_or(0.0));

        let needle = normalize(&description);
        match keys
            .iter()
            .position(|k| similarity(&needle, k) > PRODUCT_MATCH_THRESHOLD)
        {
            Some(idx) => {
                let record = &mut products[idx];
                trace!(row = %description, product = %record.description, "merged row");
                record.absorb(quantity, sales, cost);
                report.merged_rows += 1;
            }
            None => {
                trace!(product = %description, "new product");
                keys.push(needle);
                products.push(ProductRecord::new(description, quantity, sales, cost));
            }
        }
    }

    info!(
        rows = report.total_rows,
        skipped = report.skipped_rows,
        merged = report.merged_rows,
        products = products.len(),
        cost_mapped = mapping.cost.is_some(),
        "aggregated rows"
    );

    let aggregate = Aggregate {
        products,
        cost_mapped: mapping.cost.is_some(),
    };
    (aggregate, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn row(cells: &[Cell]) -> RawRow {
        cells.to_vec()
    }

    fn text(s: &str) -> Cell {
        Cell::from(s)
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    const NO_COST: ColumnMapping = ColumnMapping {
        description: 0,
        quantity: 1,
        sales: 2,
        cost: None,
    };

    const WITH_COST: ColumnMapping = ColumnMapping {
        description: 0,
        quantity: 1,
        sales: 2,
        cost: Some(3),
    };

    #[test]
    fn merges_case_variants() {
        let rows = vec![
            row(&[text("Widget A"), num(10.0), num(100.0)]),
            row(&[text("widget a"), num(5.0), num(50.0)]),
        ];
        let agg = aggregate(&rows, &NO_COST);
        assert_eq!(agg.products.len(), 1);
        let p = &agg.products[0];
        assert_eq!(p.description, "Widget A");
        assert_eq!(p.quantity, 15.0);
        assert_eq!(p.sales, 150.0);
        assert_eq!(p.unit_price, 10.0);
        assert_eq!(p.cost, None);
        assert_eq!(p.profit, None);
        assert!(!agg.cost_mapped);
    }

    #[test]
    fn keeps_distinct_products_apart() {
        let rows = vec![
            row(&[text("Widget A"), num(1.0), num(10.0)]),
            row(&[text("Gadget Z"), num(2.0), num(20.0)]),
        ];
        let agg = aggregate(&rows, &NO_COST);
        let names: Vec<&str> = agg.products.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(names, vec!["Widget A", "Gadget Z"]);
    }

    #[test]
    fn zero_quantity_has_zero_unit_price() {
        let rows = vec![row(&[text("Freebie"), num(0.0), num(0.0)])];
        let agg = aggregate(&rows, &NO_COST);
        assert_eq!(agg.products[0].unit_price, 0.0);
        assert!(agg.products[0].unit_price.is_finite());
    }

    #[test]
    fn merged_zero_quantity_stays_finite() {
        let rows = vec![
            row(&[text("Sample"), num(0.0), num(5.0), num(1.0)]),
            row(&[text("Sample"), num(0.0), num(5.0), num(1.0)]),
        ];
        let agg = aggregate(&rows, &WITH_COST);
        let p = &agg.products[0];
        assert_eq!(p.unit_price, 0.0);
        assert_eq!(p.profit, Some(8.0));
    }

    #[test]
    fn skips_empty_rows_and_descriptions() {
        let rows = vec![
            Vec::new(),
            row(&[text("   "), num(3.0), num(30.0)]),
            row(&[Cell::Empty, num(3.0), num(30.0)]),
            row(&[text("Bolt"), num(3.0), num(30.0)]),
        ];
        let (agg, report) = aggregate_with_report(&rows, &NO_COST);
        assert_eq!(agg.products.len(), 1);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.skipped_rows, 3);
        assert_eq!(report.merged_rows, 0);
    }

    #[test]
    fn trims_descriptions() {
        let rows = vec![row(&[text("  Bolt  "), num(1.0), num(2.0)])];
        let agg = aggregate(&rows, &NO_COST);
        assert_eq!(agg.products[0].description, "Bolt");
    }

    #[test]
    fn numeric_descriptions_are_text() {
        let rows = vec![row(&[num(1001.0), num(1.0), num(2.0)])];
        let agg = aggregate(&rows, &NO_COST);
        assert_eq!(agg.products[0].description, "1001");
    }

    #[test]
    fn unparsable_numbers_default_to_zero() {
        let rows = vec![row(&[text("Nut"), text("lots"), text(""), text("??")])];
        let agg = aggregate(&rows, &WITH_COST);
        let p = &agg.products[0];
        assert_eq!(p.quantity, 0.0);
        assert_eq!(p.sales, 0.0);
        // Mapped cost that fails to parse is zero, not absent.
        assert_eq!(p.cost, Some(0.0));
        assert_eq!(p.profit, Some(0.0));
    }

    #[test]
    fn short_rows_default_missing_cells() {
        let rows = vec![row(&[text("Washer"), num(4.0)])];
        let agg = aggregate(&rows, &WITH_COST);
        let p = &agg.products[0];
        assert_eq!(p.sales, 0.0);
        assert_eq!(p.cost, Some(0.0));
    }

    #[test]
    fn accumulates_cost_and_profit() {
        let rows = vec![
            row(&[text("Hammer"), num(2.0), num(40.0), num(25.0)]),
            row(&[text("Hammer"), num(1.0), num(20.0), text("12.5")]),
        ];
        let agg = aggregate(&rows, &WITH_COST);
        let p = &agg.products[0];
        assert_eq!(p.quantity, 3.0);
        assert_eq!(p.sales, 60.0);
        assert_eq!(p.cost, Some(37.5));
        assert_eq!(p.profit, Some(22.5));
        assert_eq!(p.unit_price, 20.0);
        assert!(agg.cost_mapped);
    }

    #[test]
    fn first_matching_key_wins() {
        // The third row is closer to the second key (0.92) than the first
        // (0.83) but joins the first because it is scanned first.
        let rows = vec![
            row(&[text("abcdefghijkl"), num(1.0), num(1.0)]),
            row(&[text("abcdefghixyz"), num(1.0), num(1.0)]),
            row(&[text("abcdefghijyz"), num(1.0), num(1.0)]),
        ];
        let agg = aggregate(&rows, &NO_COST);
        assert_eq!(agg.products.len(), 2);
        assert_eq!(agg.products[0].quantity, 2.0);
        assert_eq!(agg.products[1].quantity, 1.0);
    }

    #[test]
    fn late_cost_is_dropped_when_record_has_none() {
        let mut record = ProductRecord::new("Saw".to_string(), 1.0, 10.0, None);
        record.absorb(1.0, 10.0, Some(4.0));
        assert_eq!(record.cost, None);
        assert_eq!(record.profit, None);
        assert_eq!(record.sales, 20.0);
        assert_eq!(record.unit_price, 10.0);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let rows = vec![
            row(&[text("Widget A"), num(10.0), num(100.0)]),
            row(&[text("Gadget Z"), num(1.0), num(9.0)]),
            row(&[text("widget a"), num(5.0), num(50.0)]),
        ];
        assert_eq!(aggregate(&rows, &NO_COST), aggregate(&rows, &NO_COST));
    }
}
