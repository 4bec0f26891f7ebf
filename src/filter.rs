use crate::types::{Dimensional, FilterSelection, Snapshot};

fn allows(constraint: &Option<String>, value: &str) -> bool {
    constraint.as_deref().map_or(true, |wanted| wanted == value)
}

impl FilterSelection {
    /// True when every constrained dimension equals the record's field
    /// exactly. Category is left to the consumers that care about it.
    pub fn matches<R: Dimensional>(&self, record: &R) -> bool {
        let d = record.dimensions();
        allows(&self.month, &d.month)
            && allows(&self.week, &d.week)
            && allows(&self.team, &d.team)
            && allows(&self.route_no, &d.route_no)
            && allows(&self.salesman, &d.salesman_name)
    }
}

pub fn apply<R: Dimensional + Clone>(records: &[R], selection: &FilterSelection) -> Vec<R> {
    records
        .iter()
        .filter(|r| selection.matches(*r))
        .cloned()
        .collect()
}

/// Apply the selection to each dataset independently.
pub fn filter_snapshot(snapshot: &Snapshot, selection: &FilterSelection) -> Snapshot {
    Snapshot {
        productivity: apply(&snapshot.productivity, selection),
        performance: apply(&snapshot.performance, selection),
        category_billed: apply(&snapshot.category_billed, selection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryBilledRecord, Dimensions, PerformanceCategory, PerformanceRecord, ProductivityRecord};

    fn dims(month: &str, week: &str, team: &str, route: &str, salesman: &str) -> Dimensions {
        Dimensions {
            date: None,
            month: month.to_string(),
            week: week.to_string(),
            team: team.to_string(),
            route_no: route.to_string(),
            salesman_name: salesman.to_string(),
        }
    }

    #[test]
    fn default_selection_matches_everything() {
        let rec = ProductivityRecord { dims: dims("2024-01", "1", "A", "R1", "Ali"), ..Default::default() };
        assert!(FilterSelection::default().matches(&rec));
    }

    #[test]
    fn dimensions_are_and_conjunctions() {
        let rec = ProductivityRecord { dims: dims("2024-01", "1", "A", "R1", "Ali"), ..Default::default() };
        let sel = FilterSelection {
            team: Some("A".into()),
            route_no: Some("R1".into()),
            ..Default::default()
        };
        assert!(sel.matches(&rec));

        let sel = FilterSelection { route_no: Some("R2".into()), ..sel };
        assert!(!sel.matches(&rec));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let rec = ProductivityRecord { dims: dims("2024-01", "1", "A", "R1", "Ali"), ..Default::default() };
        let sel = FilterSelection { salesman: Some("ali".into()), ..Default::default() };
        assert!(!sel.matches(&rec));
    }

    #[test]
    fn category_does_not_participate_in_predicate() {
        let rec = PerformanceRecord {
            dims: dims("2024-01", "1", "A", "R1", "Ali"),
            category: Some(PerformanceCategory::Oil),
            ..Default::default()
        };
        let sel = FilterSelection { category: PerformanceCategory::Rice, ..Default::default() };
        assert!(sel.matches(&rec));
    }

    #[test]
    fn filter_snapshot_leaves_source_untouched() {
        let snapshot = Snapshot {
            productivity: vec![
                ProductivityRecord { dims: dims("2024-01", "1", "A", "R1", "Ali"), ..Default::default() },
                ProductivityRecord { dims: dims("2024-01", "1", "B", "R9", "Sam"), ..Default::default() },
            ],
            performance: vec![PerformanceRecord { dims: dims("2024-01", "1", "B", "R9", "Sam"), ..Default::default() }],
            category_billed: vec![CategoryBilledRecord { dims: dims("2024-01", "1", "A", "R1", "Ali"), ..Default::default() }],
        };
        let sel = FilterSelection { team: Some("A".into()), ..Default::default() };
        let filtered = filter_snapshot(&snapshot, &sel);

        assert_eq!(filtered.productivity.len(), 1);
        assert!(filtered.performance.is_empty());
        assert_eq!(filtered.category_billed.len(), 1);
        assert_eq!(snapshot.productivity.len(), 2);
    }
}
