use crate::types::{
    CategoryBilledRecord, Dimensions, PerformanceCategory, PerformanceRecord, ProductivityRecord,
    RawCategoryBilledRow, RawPerformanceRow, RawProductivityRow, Snapshot,
};
use crate::util::{coerce_f64, parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, warn};

pub const PRODUCTIVITY_FILE: &str = "Productivity_Data.csv";
pub const PERFORMANCE_FILE: &str = "Performance_Data.csv";
pub const CATEGORY_BILLED_FILE: &str = "Category_Billed_Outlets.csv";

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub productivity_rows: usize,
    pub performance_rows: usize,
    pub category_billed_rows: usize,
    pub parse_errors: usize,
    /// Non-empty numeric cells that could not be parsed and were read as 0.
    pub coerced_fields: usize,
    pub unrecognized_categories: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Load all three sheet exports from `dir`.
pub fn load_snapshot(dir: &Path) -> Result<(Snapshot, LoadReport), Box<dyn Error>> {
    let mut report = LoadReport::default();

    let productivity: Vec<ProductivityRecord> =
        read_rows::<RawProductivityRow>(&dir.join(PRODUCTIVITY_FILE), &mut report)?
            .into_iter()
            .map(|row| clean_productivity(row, &mut report))
            .collect();
    let performance: Vec<PerformanceRecord> =
        read_rows::<RawPerformanceRow>(&dir.join(PERFORMANCE_FILE), &mut report)?
            .into_iter()
            .map(|row| clean_performance(row, &mut report))
            .collect();
    let category_billed: Vec<CategoryBilledRecord> =
        read_rows::<RawCategoryBilledRow>(&dir.join(CATEGORY_BILLED_FILE), &mut report)?
            .into_iter()
            .map(|row| clean_category_billed(row, &mut report))
            .collect();

    report.productivity_rows = productivity.len();
    report.performance_rows = performance.len();
    report.category_billed_rows = category_billed.len();
    report.first_date = productivity.iter().filter_map(|r| r.dims.date).min();
    report.last_date = productivity.iter().filter_map(|r| r.dims.date).max();

    if report.coerced_fields > 0 {
        warn!(fields = report.coerced_fields, "non-numeric values read as 0");
    }
    Ok((
        Snapshot {
            productivity,
            performance,
            category_billed,
        },
        report,
    ))
}

fn read_rows<T: DeserializeOwned>(path: &Path, report: &mut LoadReport) -> Result<Vec<T>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    // Sheet headers carry spaces ("Outlets Assigned"); columns are keyed without them.
    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .collect();
    rdr.set_headers(headers);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                debug!(file = %path.display(), row = idx + 1, error = %e, "skipping row");
                report.parse_errors += 1;
            }
        }
    }
    info!(file = %path.display(), rows = rows.len(), "loaded");
    Ok(rows)
}

fn text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn number(s: Option<&str>, report: &mut LoadReport) -> f64 {
    let present = s.map_or(false, |v| !v.trim().is_empty());
    if present && parse_f64_safe(s).is_none() {
        report.coerced_fields += 1;
    }
    coerce_f64(s)
}

fn clean_dimensions(
    date: Option<String>,
    month: Option<String>,
    week: Option<String>,
    team: Option<String>,
    route_no: Option<String>,
    salesman_name: Option<String>,
) -> Dimensions {
    Dimensions {
        date: parse_date_safe(date.as_deref()),
        month: text(month),
        week: text(week),
        team: text(team),
        route_no: text(route_no),
        salesman_name: text(salesman_name),
    }
}

fn clean_productivity(row: RawProductivityRow, report: &mut LoadReport) -> ProductivityRecord {
    ProductivityRecord {
        outlets_assigned: number(row.outlets_assigned.as_deref(), report),
        outlets_billed: number(row.outlets_billed.as_deref(), report),
        pjp_planned: number(row.pjp_planned.as_deref(), report),
        pjp_followed: number(row.pjp_followed.as_deref(), report),
        line_productivity: number(row.line_productivity.as_deref(), report),
        call_productivity: number(row.call_productivity.as_deref(), report),
        average_bill_value: number(row.average_bill_value.as_deref(), report),
        average_daily_sales: number(row.average_daily_sales.as_deref(), report),
        dims: clean_dimensions(row.date, row.month, row.week, row.team, row.route_no, row.salesman_name),
    }
}

fn clean_performance(row: RawPerformanceRow, report: &mut LoadReport) -> PerformanceRecord {
    let raw_category = text(row.category);
    let category = raw_category.parse::<PerformanceCategory>().ok();
    if category.is_none() {
        report.unrecognized_categories += 1;
        debug!(category = %raw_category, "unrecognized performance category");
    }
    PerformanceRecord {
        category,
        sales_value: number(row.sales_value.as_deref(), report),
        monthly_target: number(row.monthly_target.as_deref(), report),
        dims: clean_dimensions(row.date, row.month, row.week, row.team, row.route_no, row.salesman_name),
    }
}

fn clean_category_billed(row: RawCategoryBilledRow, report: &mut LoadReport) -> CategoryBilledRecord {
    CategoryBilledRecord {
        category: text(row.category),
        outlets_billed: number(row.outlets_billed.as_deref(), report),
        dims: clean_dimensions(row.date, row.month, row.week, row.team, row.route_no, row.salesman_name),
    }
}
