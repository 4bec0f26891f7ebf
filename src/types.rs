use crate::util::format_number;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Sentinel used by every filter dimension to mean "no constraint".
pub const ALL: &str = "All";

#[derive(Debug, Deserialize)]
pub struct RawProductivityRow {
    #[serde(rename = "DATE")]
    pub date: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Week")]
    pub week: Option<String>,
    #[serde(rename = "Team")]
    pub team: Option<String>,
    #[serde(rename = "RouteNo")]
    pub route_no: Option<String>,
    #[serde(rename = "SalesmanName")]
    pub salesman_name: Option<String>,
    #[serde(rename = "OutletsAssigned")]
    pub outlets_assigned: Option<String>,
    #[serde(rename = "OutletsBilled")]
    pub outlets_billed: Option<String>,
    #[serde(rename = "PJPPlanned")]
    pub pjp_planned: Option<String>,
    #[serde(rename = "PJPFollowed")]
    pub pjp_followed: Option<String>,
    #[serde(rename = "LineProductivity")]
    pub line_productivity: Option<String>,
    #[serde(rename = "CallProductivity")]
    pub call_productivity: Option<String>,
    #[serde(rename = "AverageBillValue")]
    pub average_bill_value: Option<String>,
    #[serde(rename = "AverageDailySales")]
    pub average_daily_sales: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPerformanceRow {
    #[serde(rename = "DATE")]
    pub date: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Week")]
    pub week: Option<String>,
    #[serde(rename = "Team")]
    pub team: Option<String>,
    #[serde(rename = "RouteNo")]
    pub route_no: Option<String>,
    #[serde(rename = "SalesmanName")]
    pub salesman_name: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "SalesValue")]
    pub sales_value: Option<String>,
    #[serde(rename = "MonthlyTarget")]
    pub monthly_target: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCategoryBilledRow {
    #[serde(rename = "DATE")]
    pub date: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Week")]
    pub week: Option<String>,
    #[serde(rename = "Team")]
    pub team: Option<String>,
    #[serde(rename = "RouteNo")]
    pub route_no: Option<String>,
    #[serde(rename = "SalesmanName")]
    pub salesman_name: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "OutletsBilled")]
    pub outlets_billed: Option<String>,
}

/// Fields shared by all three datasets. Text is trimmed; a missing value is
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dimensions {
    pub date: Option<NaiveDate>,
    pub month: String,
    pub week: String,
    pub team: String,
    pub route_no: String,
    pub salesman_name: String,
}

/// Anything that can be matched against a [`FilterSelection`].
pub trait Dimensional {
    fn dimensions(&self) -> &Dimensions;
}

// Counts are kept as f64: the source coerces every numeric cell the same way
// and fractional or negative values must survive aggregation untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductivityRecord {
    #[serde(flatten)]
    pub dims: Dimensions,
    pub outlets_assigned: f64,
    pub outlets_billed: f64,
    pub pjp_planned: f64,
    pub pjp_followed: f64,
    pub line_productivity: f64,
    pub call_productivity: f64,
    pub average_bill_value: f64,
    pub average_daily_sales: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    #[serde(flatten)]
    pub dims: Dimensions,
    /// `None` when the sheet holds a category outside the known set.
    pub category: Option<PerformanceCategory>,
    pub sales_value: f64,
    pub monthly_target: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBilledRecord {
    #[serde(flatten)]
    pub dims: Dimensions,
    pub category: String,
    pub outlets_billed: f64,
}

impl Dimensional for ProductivityRecord {
    fn dimensions(&self) -> &Dimensions {
        &self.dims
    }
}

impl Dimensional for PerformanceRecord {
    fn dimensions(&self) -> &Dimensions {
        &self.dims
    }
}

impl Dimensional for CategoryBilledRecord {
    fn dimensions(&self) -> &Dimensions {
        &self.dims
    }
}

/// The three datasets as loaded at one point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub productivity: Vec<ProductivityRecord>,
    pub performance: Vec<PerformanceRecord>,
    pub category_billed: Vec<CategoryBilledRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PerformanceCategory {
    #[default]
    Total,
    Flour,
    Oil,
    Focus,
    Rice,
}

impl PerformanceCategory {
    /// Dropdown order.
    pub const ALL: [PerformanceCategory; 5] = [
        PerformanceCategory::Total,
        PerformanceCategory::Flour,
        PerformanceCategory::Oil,
        PerformanceCategory::Focus,
        PerformanceCategory::Rice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCategory::Total => "TOTAL",
            PerformanceCategory::Flour => "FLOUR",
            PerformanceCategory::Oil => "OIL",
            PerformanceCategory::Focus => "FOCUS",
            PerformanceCategory::Rice => "RICE",
        }
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown performance category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for PerformanceCategory {
    type Err = UnknownCategory;

    // Case-sensitive: the sheet uses upper-case codes and `Total` is not `TOTAL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PerformanceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// User-selected filters. `None` on a dimension means "All".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSelection {
    pub month: Option<String>,
    pub week: Option<String>,
    pub team: Option<String>,
    pub route_no: Option<String>,
    pub salesman: Option<String>,
    pub category: PerformanceCategory,
}

impl FilterSelection {
    /// Map a dropdown value to a dimension constraint; `"All"` and blank
    /// input both mean no constraint.
    pub fn choice(value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value == ALL {
            None
        } else {
            Some(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub months: Vec<String>,
    pub weeks: Vec<String>,
    pub teams: Vec<String>,
    pub routes: Vec<String>,
    pub salesmen: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_assigned: f64,
    pub total_billed: f64,
    pub billed_pct: f64,
    pub pjp_planned: f64,
    pub pjp_followed: f64,
    pub pjp_pct: f64,
    pub avg_call_prod: f64,
    pub avg_line_prod: f64,
    pub avg_bill_val: f64,
    pub avg_daily_sales: f64,
    pub actual_sales: f64,
    pub target_sales: f64,
    pub sales_achievement_pct: f64,
    pub pending_outlets: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct WeeklyTrend {
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub name: String,
    #[serde(rename = "CurrSales")]
    #[tabled(rename = "CurrSales", display_with = "display_2dp")]
    pub curr_sales: f64,
    #[serde(rename = "PrevSales")]
    #[tabled(rename = "PrevSales", display_with = "display_2dp")]
    pub prev_sales: f64,
    #[serde(rename = "CurrPJP")]
    #[tabled(rename = "CurrPJP%", display_with = "display_1dp")]
    pub curr_pjp: f64,
    #[serde(rename = "PrevPJP")]
    #[tabled(rename = "PrevPJP%", display_with = "display_1dp")]
    pub prev_pjp: f64,
    #[serde(rename = "CurrBilled")]
    #[tabled(rename = "CurrBilled%", display_with = "display_1dp")]
    pub curr_billed: f64,
    #[serde(rename = "PrevBilled")]
    #[tabled(rename = "PrevBilled%", display_with = "display_1dp")]
    pub prev_billed: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategorySlice {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub name: String,
    #[serde(rename = "OutletsBilled")]
    #[tabled(rename = "OutletsBilled", display_with = "display_0dp")]
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDistribution {
    pub slices: Vec<CategorySlice>,
    pub total: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PerformerScore {
    #[serde(rename = "Salesman")]
    #[tabled(rename = "Salesman")]
    pub name: String,
    #[serde(rename = "PJPPct")]
    #[tabled(rename = "PJP%", display_with = "display_1dp")]
    pub pjp_pct: f64,
    #[serde(rename = "BilledPct")]
    #[tabled(rename = "Billed%", display_with = "display_1dp")]
    pub billed_pct: f64,
    #[serde(rename = "AvgDailySales")]
    #[tabled(rename = "AvgDailySales", display_with = "display_2dp")]
    pub sales: f64,
    #[serde(rename = "Score")]
    #[tabled(rename = "Score", display_with = "display_2dp")]
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Performers {
    pub top: Vec<PerformerScore>,
    pub bottom: Vec<PerformerScore>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RouteSummary {
    #[serde(rename = "RouteNo")]
    #[tabled(rename = "RouteNo")]
    pub route_no: String,
    #[serde(rename = "Team")]
    #[tabled(rename = "Team")]
    pub team: String,
    #[serde(rename = "Salesman")]
    #[tabled(rename = "Salesman")]
    pub salesman: String,
    #[serde(rename = "Assigned")]
    #[tabled(rename = "Assigned", display_with = "display_0dp")]
    pub assigned: f64,
    #[serde(rename = "Billed")]
    #[tabled(skip)]
    pub billed: f64,
    #[serde(rename = "BilledPct")]
    #[tabled(rename = "Billed%", display_with = "display_1dp")]
    pub billed_pct: f64,
    #[serde(rename = "PJPPlanned")]
    #[tabled(skip)]
    pub pjp_planned: f64,
    #[serde(rename = "PJPFollowed")]
    #[tabled(skip)]
    pub pjp_followed: f64,
    #[serde(rename = "PJPPct")]
    #[tabled(rename = "PJP%", display_with = "display_1dp")]
    pub pjp_pct: f64,
    #[serde(rename = "CallProd")]
    #[tabled(rename = "CallProd", display_with = "display_2dp")]
    pub call_prod: f64,
    #[serde(rename = "LineProd")]
    #[tabled(rename = "LineProd", display_with = "display_2dp")]
    pub line_prod: f64,
    #[serde(rename = "AvgBill")]
    #[tabled(rename = "AvgBill", display_with = "display_2dp")]
    pub avg_bill: f64,
    #[serde(rename = "SalesValue")]
    #[tabled(skip)]
    pub sales_value: f64,
    #[serde(rename = "TargetValue")]
    #[tabled(skip)]
    pub target_value: f64,
    #[serde(rename = "Achievement")]
    #[tabled(rename = "Achievement%", display_with = "display_1dp")]
    pub achievement: f64,
}

/// The numeric inputs handed to the insight text generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightInputs {
    pub achievement_pct: f64,
    pub pjp_pct: f64,
    pub billed_pct: f64,
    pub pending_outlets: f64,
    pub avg_daily_sales: f64,
}

impl From<&Metrics> for InsightInputs {
    fn from(m: &Metrics) -> Self {
        InsightInputs {
            achievement_pct: m.sales_achievement_pct,
            pjp_pct: m.pjp_pct,
            billed_pct: m.billed_pct,
            pending_outlets: m.pending_outlets,
            avg_daily_sales: m.avg_daily_sales,
        }
    }
}

impl fmt::Display for InsightInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sales Achievement: {:.1}%", self.achievement_pct)?;
        writeln!(f, "PJP Adherence: {:.1}%", self.pjp_pct)?;
        writeln!(f, "Billed Outlets: {:.1}%", self.billed_pct)?;
        writeln!(f, "Pending Outlets: {:.0}", self.pending_outlets)?;
        write!(f, "Avg Daily Sales: QAR {:.0}", self.avg_daily_sales)
    }
}

/// Everything the rendering layer needs for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub selection: FilterSelection,
    pub options: FilterOptions,
    pub filtered: Snapshot,
    pub metrics: Metrics,
    pub weekly_trends: Vec<WeeklyTrend>,
    pub distribution: CategoryDistribution,
    pub performers: Performers,
    pub routes: Vec<RouteSummary>,
    pub insight: InsightInputs,
}

fn display_0dp(v: &f64) -> String {
    format_number(*v, 0)
}

fn display_1dp(v: &f64) -> String {
    format_number(*v, 1)
}

fn display_2dp(v: &f64) -> String {
    format_number(*v, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_is_case_sensitive() {
        assert_eq!("OIL".parse::<PerformanceCategory>(), Ok(PerformanceCategory::Oil));
        assert!("Oil".parse::<PerformanceCategory>().is_err());
        assert!("".parse::<PerformanceCategory>().is_err());
    }

    #[test]
    fn choice_treats_all_and_blank_as_unconstrained() {
        assert_eq!(FilterSelection::choice("All"), None);
        assert_eq!(FilterSelection::choice("   "), None);
        assert_eq!(FilterSelection::choice(" Team A "), Some("Team A".to_string()));
        // Only the exact sentinel clears a dimension.
        assert_eq!(FilterSelection::choice("all"), Some("all".to_string()));
    }

    #[test]
    fn default_selection_uses_total_category() {
        let sel = FilterSelection::default();
        assert_eq!(sel.category, PerformanceCategory::Total);
        assert!(sel.month.is_none() && sel.team.is_none());
    }

    #[test]
    fn insight_summary_has_fixed_format() {
        let inputs = InsightInputs {
            achievement_pct: 92.34,
            pjp_pct: 80.0,
            billed_pct: 66.66,
            pending_outlets: 12.0,
            avg_daily_sales: 1534.6,
        };
        let text = inputs.to_string();
        assert_eq!(
            text,
            "Sales Achievement: 92.3%\nPJP Adherence: 80.0%\nBilled Outlets: 66.7%\nPending Outlets: 12\nAvg Daily Sales: QAR 1535"
        );
    }
}
