use crate::types::{Metrics, MetricRow};
use crate::util::format_number;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// KPI cards as a two-column table.
pub fn metric_rows(m: &Metrics) -> Vec<MetricRow> {
    let row = |metric: &str, value: String| MetricRow {
        metric: metric.to_string(),
        value,
    };
    vec![
        row("Sales Achievement %", format_number(m.sales_achievement_pct, 1)),
        row("Actual Sales (QAR)", format_number(m.actual_sales, 2)),
        row("Target Sales (QAR)", format_number(m.target_sales, 2)),
        row("Assigned Outlets", format_number(m.total_assigned, 0)),
        row("Billed Outlets", format_number(m.total_billed, 0)),
        row("Billed Outlets %", format_number(m.billed_pct, 1)),
        row("Pending Outlets", format_number(m.pending_outlets, 0)),
        row("PJP Planned", format_number(m.pjp_planned, 0)),
        row("PJP Followed", format_number(m.pjp_followed, 0)),
        row("PJP Adherence %", format_number(m.pjp_pct, 1)),
        row("Call Productivity", format_number(m.avg_call_prod, 2)),
        row("Line Productivity", format_number(m.avg_line_prod, 2)),
        row("Avg Bill Value (QAR)", format_number(m.avg_bill_val, 2)),
        row("Avg Daily Sales (QAR)", format_number(m.avg_daily_sales, 2)),
    ]
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategorySlice;
    use tempfile::tempdir;

    #[test]
    fn metric_rows_format_kpis() {
        let m = Metrics {
            total_assigned: 1500.0,
            billed_pct: 86.666,
            ..Default::default()
        };
        let rows = metric_rows(&m);
        let assigned = rows.iter().find(|r| r.metric == "Assigned Outlets").unwrap();
        assert_eq!(assigned.value, "1,500");
        let billed = rows.iter().find(|r| r.metric == "Billed Outlets %").unwrap();
        assert_eq!(billed.value, "86.7");
    }

    #[test]
    fn write_csv_uses_renamed_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dist.csv");
        let rows = vec![CategorySlice { name: "Flour".into(), value: 5.0 }];
        write_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Category,OutletsBilled\nFlour,5.0\n");
    }
}
