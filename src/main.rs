// Entry point and high-level CLI flow.
//
// - Files are loaded and columns detected once per session.
// - If detection fails and no `--*-col` flags were given, the user is asked
//   to pick columns by index.
// - With `--analysis` one report is printed (and exported with `--export`);
//   otherwise a menu lets the user run analyses, export, or start over.
use clap::Parser;
use sales_report::cli::Cli;
use sales_report::error::{AnalysisError, LoadError};
use sales_report::logging::{init_logging, LogConfig};
use sales_report::roles::ManualMapping;
use sales_report::types::{Role, Sheet};
use sales_report::{loader, output, util, AnalysisMode, Session};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask for a column per role until the mapping validates.
fn prompt_manual_mapping(session: &mut Session) -> Result<(), AnalysisError> {
    println!("\nCould not detect all required columns. Available columns:");
    for (index, header) in session.header_labels().iter().enumerate() {
        if !header.is_empty() {
            println!("  [{}] {}", index, header);
        }
    }
    loop {
        let mut inputs: Vec<String> = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let hint = if role.is_required() { "index" } else { "index, blank if not available" };
            let Some(answer) = prompt(&format!("{} ({}): ", role.label(), hint)) else {
                return Err(AnalysisError::IncompleteManualMapping {
                    missing: Role::REQUIRED.to_vec(),
                });
            };
            inputs.push(answer);
        }
        let manual = ManualMapping::from_inputs(&inputs[0], &inputs[1], &inputs[2], &inputs[3]);
        match session.apply_manual_mapping(manual) {
            Ok(_) => return Ok(()),
            Err(e) => println!("{}\n", e),
        }
    }
}

/// Load the data into a fresh session, detecting or asking for columns.
fn handle_load(cli: &Cli, sheets: Vec<Sheet>) -> Result<Session, AnalysisError> {
    let mut session = Session::new();
    let result = match cli.manual_mapping() {
        Some(manual) => session.ingest_with_mapping(sheets, manual).map(|_| ()),
        None => session.ingest(sheets).map(|_| ()),
    };
    match result {
        Ok(()) => {}
        Err(AnalysisError::UnresolvedMapping { .. }) if io::stdin().is_terminal() => {
            prompt_manual_mapping(&mut session)?;
        }
        Err(e) => return Err(e),
    }
    let report = session.aggregate_report().unwrap_or_default();
    println!(
        "Data processed successfully: {} rows ({} skipped, {} merged), {} distinct products.\n",
        util::format_int(report.total_rows),
        util::format_int(report.skipped_rows),
        util::format_int(report.merged_rows),
        util::format_int(session.products().len())
    );
    Ok(session)
}

fn handle_analysis(session: &mut Session, mode: AnalysisMode, preview_rows: usize) {
    match session.analyze(mode) {
        Ok(result) => output::preview_result(result, preview_rows),
        Err(e) => println!("Error: {}\n", e),
    }
}

fn handle_export(session: &Session, cli: &Cli) {
    let cost_mapped = session.aggregate().is_some_and(|a| a.cost_mapped);
    match output::export(&cli.output_dir, session.last_result(), cost_mapped) {
        Ok(files) => {
            print_exported(&files);
            println!();
        }
        Err(e) => println!("Error: {}\n", e),
    }
}

fn print_exported(files: &output::ExportedFiles) {
    println!(
        "Exported to {}, {} and {}",
        files.csv.display(),
        files.xlsx.display(),
        files.json.display()
    );
}

/// Read every input file from disk and report what was found.
fn load_sheets(cli: &Cli) -> Result<Vec<Sheet>, LoadError> {
    let (sheets, load_report) = loader::load_files(&cli.files)?;
    println!(
        "Processing {} file(s)... ({} data rows)",
        util::format_int(load_report.files),
        util::format_int(load_report.total_rows)
    );
    if load_report.mismatched_headers > 0 {
        println!(
            "Note: {} file(s) have a different header; the first file's columns are used.",
            util::format_int(load_report.mismatched_headers)
        );
    }
    Ok(sheets)
}

fn run_menu(cli: &Cli, mut session: Session) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        println!("Select Analysis:");
        println!("[1] Fast Moving Products");
        println!("[2] Slow Moving Products");
        println!("[3] Sales Contribution");
        println!("[4] Profitability");
        println!("[5] Export last result");
        println!("[6] Reset (reload files)");
        println!("[7] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            return Ok(());
        };
        match choice.as_str() {
            "1" | "2" => {
                let count = prompt(&format!("Number of items [{}]: ", cli.count))
                    .and_then(|s| util::parse_index(&s))
                    .unwrap_or(cli.count);
                let mode = if choice == "1" {
                    AnalysisMode::fast_moving(count)
                } else {
                    AnalysisMode::slow_moving(count)
                };
                handle_analysis(&mut session, mode, cli.preview_rows);
            }
            "3" => handle_analysis(&mut session, AnalysisMode::Contribution, cli.preview_rows),
            "4" => handle_analysis(&mut session, AnalysisMode::Profitability, cli.preview_rows),
            "5" => handle_export(&session, cli),
            "6" => match load_sheets(cli) {
                Ok(sheets) => {
                    session.reset();
                    println!("Application has been reset.\n");
                    session = handle_load(cli, sheets)?;
                }
                Err(e) => println!("Error: {}\n", e),
            },
            "7" => {
                println!("Exiting the program.");
                return Ok(());
            }
            _ => println!("Invalid choice. Please enter 1 to 7.\n"),
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let sheets = load_sheets(cli)?;
    let mut session = handle_load(cli, sheets)?;

    let Some(name) = cli.analysis.as_deref() else {
        return run_menu(cli, session);
    };
    let mode = AnalysisMode::parse_with_count(name, cli.count)?;
    let result = session.analyze(mode)?;
    output::preview_result(result, cli.preview_rows);
    if cli.export {
        let cost_mapped = session.aggregate().is_some_and(|a| a.cost_mapped);
        let files = output::export(&cli.output_dir, session.last_result(), cost_mapped)?;
        print_exported(&files);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(cli.log_format.into())
        .with_ansi(io::stderr().is_terminal());
    init_logging(&log_config);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
