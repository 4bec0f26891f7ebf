// Entry point and high-level CLI flow.
//
// - Option [1] loads the three sheet exports, printing diagnostics.
// - Option [2] walks through the filter dimensions, offering only choices
//   that exist for the upstream selection.
// - Option [3] recomputes the dashboard, previews every table, and exports
//   CSV files plus a JSON dump.
use clap::Parser;
use field_sales_report::types::{FilterOptions, PerformanceCategory, ALL};
use field_sales_report::{generate_dashboard, loader, options, output, util, Dashboard, FilterSelection, Snapshot};
use once_cell::sync::Lazy;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Field-sales productivity and performance reports")]
struct Args {
    /// Directory holding Productivity_Data.csv, Performance_Data.csv and
    /// Category_Billed_Outlets.csv.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the report files are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value = ALL)]
    month: String,
    #[arg(long, default_value = ALL)]
    week: String,
    #[arg(long, default_value = ALL)]
    team: String,
    #[arg(long, default_value = ALL)]
    route: String,
    #[arg(long, default_value = ALL)]
    salesman: String,
    /// TOTAL, FLOUR, OIL, FOCUS or RICE.
    #[arg(long, default_value = "TOTAL")]
    category: PerformanceCategory,

    /// Load, generate the reports once, and exit.
    #[arg(long)]
    batch: bool,
}

impl Args {
    fn selection(&self) -> FilterSelection {
        FilterSelection {
            month: FilterSelection::choice(&self.month),
            week: FilterSelection::choice(&self.week),
            team: FilterSelection::choice(&self.team),
            route_no: FilterSelection::choice(&self.route),
            salesman: FilterSelection::choice(&self.salesman),
            category: self.category,
        }
    }
}

// The loaded snapshot and current filters live here so data is read once
// but reports can be regenerated for many selections in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    data: Option<Snapshot>,
    selection: FilterSelection,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the main menu after generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(data_dir: &Path) -> bool {
    match loader::load_snapshot(data_dir) {
        Ok((data, report)) => {
            println!(
                "Loaded {} productivity, {} performance and {} category rows.",
                util::format_int(report.productivity_rows),
                util::format_int(report.performance_rows),
                util::format_int(report.category_billed_rows)
            );
            if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
                println!("Dates covered: {} to {}", first, last);
            }
            if report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    util::format_int(report.parse_errors)
                );
            }
            if report.coerced_fields > 0 {
                println!(
                    "Note: {} non-numeric values were read as 0.",
                    util::format_int(report.coerced_fields)
                );
            }
            if report.unrecognized_categories > 0 {
                println!(
                    "Note: {} performance rows have an unrecognized category.",
                    util::format_int(report.unrecognized_categories)
                );
            }
            println!();
            state().data = Some(data);
            true
        }
        Err(e) => {
            error!(dir = %data_dir.display(), "load failed: {}", e);
            eprintln!("Failed to load data from {}: {}\n", data_dir.display(), e);
            false
        }
    }
}

/// Ask for one dimension. Blank keeps `current`; anything outside `choices`
/// is rejected and keeps `current` too.
fn prompt_dimension(label: &str, current: Option<String>, choices: &[String]) -> Option<String> {
    let shown = current.as_deref().unwrap_or(ALL);
    println!("{} [{}]: {}", label, shown, choices.join(", "));
    let input = prompt("> ");
    if input.is_empty() {
        return current;
    }
    match FilterSelection::choice(&input) {
        None => None,
        Some(v) if choices.contains(&v) => Some(v),
        Some(v) => {
            println!("'{}' is not a valid {}; keeping {}.", v, label.to_lowercase(), shown);
            current
        }
    }
}

fn handle_set_filters() {
    let data = state().data.clone();
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };
    let mut sel = state().selection.clone();
    let opts = |sel: &FilterSelection| -> FilterOptions { options::derive_options(&data.productivity, sel) };

    let o = opts(&sel);
    sel.month = prompt_dimension("Month", sel.month.take(), &o.months);
    sel.week = prompt_dimension("Week", sel.week.take(), &o.weeks);
    sel.team = prompt_dimension("Team", sel.team.take(), &o.teams);

    // Routes and salesmen narrow to the upstream choices; drop stale picks.
    let o = opts(&sel);
    if sel.route_no.as_ref().map_or(false, |r| !o.routes.contains(r)) {
        sel.route_no = None;
    }
    sel.route_no = prompt_dimension("Route", sel.route_no.take(), &o.routes);

    let o = opts(&sel);
    if sel.salesman.as_ref().map_or(false, |s| !o.salesmen.contains(s)) {
        sel.salesman = None;
    }
    sel.salesman = prompt_dimension("Salesman", sel.salesman.take(), &o.salesmen);

    println!("Category [{}]: {}", sel.category, o.categories.join(", "));
    let input = prompt("> ");
    if !input.is_empty() {
        match input.parse::<PerformanceCategory>() {
            Ok(c) => sel.category = c,
            Err(e) => println!("{}; keeping {}.", e, sel.category),
        }
    }
    println!();
    state().selection = sel;
}

fn export<T: serde::Serialize>(out_dir: &Path, file: &str, rows: &[T]) {
    if let Err(e) = output::write_csv(&out_dir.join(file), rows) {
        error!(file, "write failed: {}", e);
        eprintln!("Write error: {}", e);
    }
}

fn print_dashboard(dash: &Dashboard) {
    let sel = &dash.selection;
    let note = format!(
        "Month: {}, Week: {}, Team: {}, Route: {}, Salesman: {}, Category: {}",
        sel.month.as_deref().unwrap_or(ALL),
        sel.week.as_deref().unwrap_or(ALL),
        sel.team.as_deref().unwrap_or(ALL),
        sel.route_no.as_deref().unwrap_or(ALL),
        sel.salesman.as_deref().unwrap_or(ALL),
        sel.category
    );
    output::preview_table("Key Metrics", Some(&note), &output::metric_rows(&dash.metrics), usize::MAX);
    output::preview_table(
        "Weekly Trends",
        Some("Current vs previous month, all teams"),
        &dash.weekly_trends,
        4,
    );
    let total = format!("Total billed outlets: {}", util::format_number(dash.distribution.total, 0));
    output::preview_table("Category Distribution", Some(&total), &dash.distribution.slices, 5);
    output::preview_table("Top Performers", None, &dash.performers.top, 5);
    output::preview_table("Needs Attention", Some("Lowest score first"), &dash.performers.bottom, 5);
    let routes = format!("Total routes: {}", dash.routes.len());
    output::preview_table("Route-wise Performance Summary", Some(&routes), &dash.routes, 10);
    println!("Insight inputs:\n{}\n", dash.insight);
}

fn handle_generate_reports(out_dir: &Path) {
    let (data, selection) = {
        let s = state();
        (s.data.clone(), s.selection.clone())
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };

    let dash = generate_dashboard(&data, &selection);
    info!(routes = dash.routes.len(), "dashboard generated");
    print_dashboard(&dash);

    export(out_dir, "metrics.csv", &output::metric_rows(&dash.metrics));
    export(out_dir, "weekly_trends.csv", &dash.weekly_trends);
    export(out_dir, "category_distribution.csv", &dash.distribution.slices);
    export(out_dir, "top_performers.csv", &dash.performers.top);
    export(out_dir, "bottom_performers.csv", &dash.performers.bottom);
    export(out_dir, "route_summary.csv", &dash.routes);
    if let Err(e) = output::write_json(&out_dir.join("dashboard.json"), &dash) {
        error!("write failed: {}", e);
        eprintln!("Write error: {}", e);
    }
    println!("(Reports exported to {})\n", out_dir.display());
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    state().selection = args.selection();
    std::fs::create_dir_all(&args.out_dir)?;

    if args.batch {
        if !handle_load(&args.data_dir) {
            return Err(format!("could not load data from {}", args.data_dir.display()).into());
        }
        handle_generate_reports(&args.out_dir);
        return Ok(());
    }

    loop {
        println!("Field Sales Reports:");
        println!("[1] Load data");
        println!("[2] Set filters");
        println!("[3] Generate reports\n");
        match prompt("Enter choice: ").as_str() {
            "1" => {
                handle_load(&args.data_dir);
            }
            "2" => handle_set_filters(),
            "3" => {
                println!();
                handle_generate_reports(&args.out_dir);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
    Ok(())
}
