use crate::filter::filter_snapshot;
use crate::options::derive_options;
use crate::types::{
    CategoryBilledRecord, CategoryDistribution, CategorySlice, Dashboard, FilterSelection,
    InsightInputs, Metrics, PerformanceCategory, PerformanceRecord, PerformerScore, Performers,
    ProductivityRecord, RouteSummary, Snapshot, WeeklyTrend,
};
use crate::util::ratio_pct;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Display taxonomy for the billed-outlet distribution.
pub const DISTRIBUTION_CATEGORIES: [&str; 5] =
    ["Flour", "Edible Oil", "Chakki Atta", "Pulses", "Rice"];

pub const TREND_WEEKS: u32 = 4;
const COHORT_SIZE: usize = 5;

/// Running sums over productivity rows. Ratios are sum-over-sum, never the
/// mean of per-row ratios.
#[derive(Default)]
struct ProductivityAcc {
    rows: usize,
    assigned: f64,
    billed: f64,
    pjp_planned: f64,
    pjp_followed: f64,
    call_prod: f64,
    line_prod: f64,
    bill_value: f64,
    daily_sales: f64,
}

impl ProductivityAcc {
    fn add(&mut self, r: &ProductivityRecord) {
        self.rows += 1;
        self.assigned += r.outlets_assigned;
        self.billed += r.outlets_billed;
        self.pjp_planned += r.pjp_planned;
        self.pjp_followed += r.pjp_followed;
        self.call_prod += r.call_productivity;
        self.line_prod += r.line_productivity;
        self.bill_value += r.average_bill_value;
        self.daily_sales += r.average_daily_sales;
    }

    fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductivityRecord>,
    {
        let mut acc = ProductivityAcc::default();
        for r in rows {
            acc.add(r);
        }
        acc
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            sum / self.rows as f64
        }
    }

    fn billed_pct(&self) -> f64 {
        ratio_pct(self.billed, self.assigned)
    }

    fn pjp_pct(&self) -> f64 {
        ratio_pct(self.pjp_followed, self.pjp_planned)
    }
}

/// Sales and target sums for one performance category.
fn sales_vs_target<'a, I>(rows: I, category: PerformanceCategory) -> (f64, f64)
where
    I: IntoIterator<Item = &'a PerformanceRecord>,
{
    rows.into_iter()
        .filter(|r| r.category == Some(category))
        .fold((0.0, 0.0), |(sales, target), r| {
            (sales + r.sales_value, target + r.monthly_target)
        })
}

pub fn generate_metrics(
    productivity: &[ProductivityRecord],
    performance: &[PerformanceRecord],
    category: PerformanceCategory,
) -> Metrics {
    let acc = ProductivityAcc::from_rows(productivity);
    let (actual_sales, target_sales) = sales_vs_target(performance, category);
    Metrics {
        total_assigned: acc.assigned,
        total_billed: acc.billed,
        billed_pct: acc.billed_pct(),
        pjp_planned: acc.pjp_planned,
        pjp_followed: acc.pjp_followed,
        pjp_pct: acc.pjp_pct(),
        avg_call_prod: acc.mean(acc.call_prod),
        avg_line_prod: acc.mean(acc.line_prod),
        avg_bill_val: acc.mean(acc.bill_value),
        avg_daily_sales: acc.mean(acc.daily_sales),
        actual_sales,
        target_sales,
        sales_achievement_pct: ratio_pct(actual_sales, target_sales),
        pending_outlets: acc.assigned - acc.billed,
    }
}

/// Week number of a plain numeric week cell (`"2"`, `"2.0"`). Labelled
/// cells such as `"Week 2"` have no number and never join a trend week.
fn week_number(cell: &str) -> Option<u32> {
    let n: f64 = cell.trim().parse().ok()?;
    if n.fract() == 0.0 && n >= 0.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

/// Four-week comparison of the current month against the month before it.
///
/// Runs over the *unfiltered* productivity rows; only the month selection
/// participates. `months` is the sorted month list from the option deriver.
pub fn generate_weekly_trends(
    productivity: &[ProductivityRecord],
    months: &[String],
    selected_month: Option<&str>,
) -> Vec<WeeklyTrend> {
    let current = selected_month.or_else(|| months.last().map(String::as_str));
    let previous = current
        .and_then(|m| months.iter().position(|x| x == m))
        .and_then(|idx| idx.checked_sub(1))
        .map(|idx| months[idx].as_str());

    let mut current_weeks: HashMap<u32, ProductivityAcc> = HashMap::new();
    let mut previous_weeks: HashMap<u32, ProductivityAcc> = HashMap::new();
    for r in productivity {
        let Some(week) = week_number(&r.dims.week).filter(|w| (1..=TREND_WEEKS).contains(w)) else {
            continue;
        };
        let month = Some(r.dims.month.as_str());
        if month == current {
            current_weeks.entry(week).or_default().add(r);
        } else if month == previous {
            previous_weeks.entry(week).or_default().add(r);
        }
    }

    let empty = ProductivityAcc::default();
    (1..=TREND_WEEKS)
        .map(|week| {
            let curr = current_weeks.get(&week).unwrap_or(&empty);
            let prev = previous_weeks.get(&week).unwrap_or(&empty);
            WeeklyTrend {
                name: format!("Week {}", week),
                curr_sales: curr.mean(curr.daily_sales),
                prev_sales: prev.mean(prev.daily_sales),
                curr_pjp: curr.pjp_pct(),
                prev_pjp: prev.pjp_pct(),
                curr_billed: curr.billed_pct(),
                prev_billed: prev.billed_pct(),
            }
        })
        .collect()
}

pub fn generate_category_distribution(records: &[CategoryBilledRecord]) -> CategoryDistribution {
    let mut sums: HashMap<String, f64> = HashMap::new();
    for r in records {
        *sums.entry(r.category.to_lowercase()).or_insert(0.0) += r.outlets_billed;
    }
    let slices: Vec<CategorySlice> = DISTRIBUTION_CATEGORIES
        .iter()
        .map(|name| CategorySlice {
            name: name.to_string(),
            value: sums.get(&name.to_lowercase()).copied().unwrap_or(0.0),
        })
        .filter(|s| s.value != 0.0)
        .collect();
    let total = slices.iter().map(|s| s.value).sum();
    CategoryDistribution { slices, total }
}

/// Score every salesman and return the five best and the five worst, the
/// worst first. Cohorts overlap when fewer than ten salesmen are present.
pub fn rank_performers(productivity: &[ProductivityRecord]) -> Performers {
    // First-seen order keeps ties stable.
    let mut order: Vec<&str> = Vec::new();
    let mut map: HashMap<&str, ProductivityAcc> = HashMap::new();
    for r in productivity {
        let name = r.dims.salesman_name.as_str();
        map.entry(name)
            .or_insert_with(|| {
                order.push(name);
                ProductivityAcc::default()
            })
            .add(r);
    }

    let mut scores: Vec<PerformerScore> = order
        .into_iter()
        .map(|name| {
            let acc = &map[name];
            let pjp_pct = acc.pjp_pct();
            let billed_pct = acc.billed_pct();
            let sales = acc.mean(acc.daily_sales);
            PerformerScore {
                name: name.to_string(),
                pjp_pct,
                billed_pct,
                sales,
                score: pjp_pct + billed_pct + sales / 1000.0,
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let top = scores.iter().take(COHORT_SIZE).cloned().collect();
    let bottom = scores.iter().rev().take(COHORT_SIZE).cloned().collect();
    Performers { top, bottom }
}

pub fn summarize_routes(
    productivity: &[ProductivityRecord],
    performance: &[PerformanceRecord],
) -> Vec<RouteSummary> {
    #[derive(Default)]
    struct Acc<'a> {
        first: Option<&'a ProductivityRecord>,
        prod: ProductivityAcc,
    }

    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in productivity {
        let e = map.entry(r.dims.route_no.as_str()).or_default();
        e.first.get_or_insert(r);
        e.prod.add(r);
    }

    map.into_iter()
        .map(|(route, acc)| {
            let (sales_value, target_value) = sales_vs_target(
                performance.iter().filter(|p| p.dims.route_no == route),
                PerformanceCategory::Total,
            );
            let or_dash = |s: Option<&str>| match s {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => "-".to_string(),
            };
            let p = &acc.prod;
            RouteSummary {
                route_no: route.to_string(),
                team: or_dash(acc.first.map(|f| f.dims.team.as_str())),
                salesman: or_dash(acc.first.map(|f| f.dims.salesman_name.as_str())),
                assigned: p.assigned,
                billed: p.billed,
                billed_pct: p.billed_pct(),
                pjp_planned: p.pjp_planned,
                pjp_followed: p.pjp_followed,
                pjp_pct: p.pjp_pct(),
                call_prod: p.mean(p.call_prod),
                line_prod: p.mean(p.line_prod),
                avg_bill: p.mean(p.bill_value),
                sales_value,
                target_value,
                achievement: ratio_pct(sales_value, target_value),
            }
        })
        .collect()
}

/// Recompute every derived view for one snapshot and selection.
pub fn generate_dashboard(snapshot: &Snapshot, selection: &FilterSelection) -> Dashboard {
    let options = derive_options(&snapshot.productivity, selection);
    let filtered = filter_snapshot(snapshot, selection);
    debug!(
        productivity = filtered.productivity.len(),
        performance = filtered.performance.len(),
        category_billed = filtered.category_billed.len(),
        "filtered snapshot"
    );

    let metrics = generate_metrics(&filtered.productivity, &filtered.performance, selection.category);
    let weekly_trends =
        generate_weekly_trends(&snapshot.productivity, &options.months, selection.month.as_deref());
    let distribution = generate_category_distribution(&filtered.category_billed);
    let performers = rank_performers(&filtered.productivity);
    let routes = summarize_routes(&filtered.productivity, &filtered.performance);
    let insight = InsightInputs::from(&metrics);

    Dashboard {
        selection: selection.clone(),
        options,
        filtered,
        metrics,
        weekly_trends,
        distribution,
        performers,
        routes,
        insight,
    }
}
