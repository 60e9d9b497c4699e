use sales_report::loader::{load_file, load_files, read_delimited};
use sales_report::roles::ManualMapping;
use sales_report::types::{Cell, Role};
use sales_report::{output, AnalysisError, AnalysisMode, Session};

const JANUARY: &str = "\
Product Description,Units Sold,Net Sales,Unit Cost
Widget A,10,100,60
Gadget Z,2,300,120
Sprocket,50,\"1,000\",400
";

const FEBRUARY: &str = "\
Product Description,Units Sold,Net Sales,Unit Cost
widget a,5,50,30
Gizmo,0,0,n/a
";

fn sheets() -> Vec<sales_report::types::Sheet> {
    vec![
        read_delimited(JANUARY.as_bytes(), b',', "january.csv").unwrap(),
        read_delimited(FEBRUARY.as_bytes(), b',', "february.csv").unwrap(),
    ]
}

#[test]
fn detects_columns_and_merges_across_files() {
    let mut session = Session::new();
    let agg = session.ingest(sheets()).unwrap();
    let names: Vec<&str> = agg.products.iter().map(|p| p.description.as_str()).collect();
    assert_eq!(names, vec!["Widget A", "Gadget Z", "Sprocket", "Gizmo"]);

    let widget = &agg.products[0];
    assert_eq!(widget.quantity, 15.0);
    assert_eq!(widget.sales, 150.0);
    assert_eq!(widget.cost, Some(90.0));
    assert_eq!(widget.unit_price, 10.0);

    let gizmo = &agg.products[3];
    assert_eq!(gizmo.unit_price, 0.0);
    assert_eq!(gizmo.cost, Some(0.0));
}

#[test]
fn runs_every_analysis_mode() {
    let mut session = Session::new();
    session.ingest(sheets()).unwrap();

    let fast = session.analyze(AnalysisMode::fast_moving(2)).unwrap();
    let top: Vec<f64> = fast.entries.iter().map(|e| e.product.quantity).collect();
    assert_eq!(top, vec![50.0, 15.0]);

    let slow = session.analyze(AnalysisMode::slow_moving(1)).unwrap();
    assert_eq!(slow.entries[0].product.description, "Gizmo");

    let contribution = session.analyze(AnalysisMode::Contribution).unwrap();
    let total: f64 = contribution.entries.iter().filter_map(|e| e.contribution).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(contribution.entries[0].product.description, "Sprocket");

    let profit = session.analyze(AnalysisMode::Profitability).unwrap();
    assert_eq!(profit.entries[0].product.description, "Sprocket");
    assert_eq!(profit.entries[0].product.profit, Some(600.0));
    assert_eq!(profit.entries[0].profit_margin, Some(60.0));

    // Analyses never write their fields back into the aggregate.
    assert_eq!(session.products()[0].profit, Some(60.0));
}

#[test]
fn unknown_headers_fall_back_to_manual_mapping() {
    let data = "Col1,Col2,Col3\nBolt,3,9\nbolt ,1,3\n";
    let mut session = Session::new();
    let err = session
        .ingest(vec![read_delimited(data.as_bytes(), b',', "odd.csv").unwrap()])
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnresolvedMapping { .. }));

    let err = session
        .apply_manual_mapping(ManualMapping::from_inputs("0", "", "2", ""))
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::IncompleteManualMapping {
            missing: vec![Role::Quantity]
        }
    );

    let agg = session
        .apply_manual_mapping(ManualMapping::from_inputs("0", "1", "2", ""))
        .unwrap();
    assert_eq!(agg.products.len(), 1);
    assert_eq!(agg.products[0].quantity, 4.0);

    assert_eq!(
        session.analyze(AnalysisMode::Profitability).unwrap_err(),
        AnalysisError::MissingCostData
    );
    assert!(session.last_result().is_none());
}

#[test]
fn loads_exports_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("january.csv");
    let second = dir.path().join("february.csv");
    std::fs::write(&first, JANUARY).unwrap();
    std::fs::write(&second, FEBRUARY).unwrap();

    let (sheets, report) = load_files(&[first, second]).unwrap();
    assert_eq!(report.total_rows, 5);

    let mut session = Session::new();
    session.ingest(sheets).unwrap();
    session.analyze(AnalysisMode::Contribution).unwrap();

    let out = dir.path().join("out");
    let files = output::export(&out, session.last_result(), true).unwrap();
    let csv_text = std::fs::read_to_string(&files.csv).unwrap();
    assert!(csv_text
        .starts_with("Product,Quantity,Total Sales,Unit Price,Profit,Contribution (%)"));
    assert_eq!(csv_text.lines().count(), 5);

    let workbook = load_file(&files.xlsx).unwrap();
    assert_eq!(workbook.header.len(), 6);
    assert_eq!(workbook.rows.len(), 4);
    assert_eq!(workbook.rows[0][0], Cell::Text("Sprocket".to_string()));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.json).unwrap()).unwrap();
    assert_eq!(json["total_products"], 4);
    assert_eq!(json["total_sales"], 1450.0);
}
