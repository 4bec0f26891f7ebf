// Dropdown choices for the filter bar.
//
// Months, weeks and teams always come from the full dataset. Routes narrow
// to the selected team, salesmen narrow to the selected team and route, so
// the host can never offer a combination that does not exist.
use crate::types::{FilterOptions, FilterSelection, PerformanceCategory, ProductivityRecord};
use crate::util::sorted_distinct;

/// Only `team` and `route_no` of the selection are consulted.
pub fn derive_options(records: &[ProductivityRecord], selection: &FilterSelection) -> FilterOptions {
    let team = selection.team.as_deref();
    let route = selection.route_no.as_deref();

    let in_team = |r: &&ProductivityRecord| team.map_or(true, |t| r.dims.team == t);
    let in_route = |r: &&ProductivityRecord| route.map_or(true, |n| r.dims.route_no == n);

    FilterOptions {
        months: sorted_distinct(records.iter().map(|r| r.dims.month.as_str())),
        weeks: sorted_distinct(records.iter().map(|r| r.dims.week.as_str())),
        teams: sorted_distinct(records.iter().map(|r| r.dims.team.as_str())),
        routes: sorted_distinct(records.iter().filter(in_team).map(|r| r.dims.route_no.as_str())),
        salesmen: sorted_distinct(
            records
                .iter()
                .filter(in_team)
                .filter(in_route)
                .map(|r| r.dims.salesman_name.as_str()),
        ),
        categories: PerformanceCategory::ALL
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    fn rec(month: &str, team: &str, route: &str, salesman: &str) -> ProductivityRecord {
        ProductivityRecord {
            dims: Dimensions {
                month: month.into(),
                week: "1".into(),
                team: team.into(),
                route_no: route.into(),
                salesman_name: salesman.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sample() -> Vec<ProductivityRecord> {
        vec![
            rec("2024-02", "B", "R3", "Zed"),
            rec("2024-01", "A", "R1", "Ali"),
            rec("2024-01", "A", "R2", "Bea"),
            rec("2024-02", "A", "R1", "Ali"),
            rec("", "", "", ""),
        ]
    }

    #[test]
    fn unconstrained_lists_are_sorted_and_deduplicated() {
        let opts = derive_options(&sample(), &FilterSelection::default());
        assert_eq!(opts.months, vec!["2024-01", "2024-02"]);
        assert_eq!(opts.teams, vec!["A", "B"]);
        assert_eq!(opts.routes, vec!["R1", "R2", "R3"]);
        assert_eq!(opts.salesmen, vec!["Ali", "Bea", "Zed"]);
        assert_eq!(opts.categories, vec!["TOTAL", "FLOUR", "OIL", "FOCUS", "RICE"]);
    }

    #[test]
    fn routes_and_salesmen_cascade_from_team_and_route() {
        let data = sample();
        let all = derive_options(&data, &FilterSelection::default());

        let sel = FilterSelection { team: Some("A".into()), ..Default::default() };
        let by_team = derive_options(&data, &sel);
        assert_eq!(by_team.routes, vec!["R1", "R2"]);
        assert!(by_team.routes.iter().all(|r| all.routes.contains(r)));
        // Teams and months never narrow.
        assert_eq!(by_team.teams, all.teams);
        assert_eq!(by_team.months, all.months);

        let sel = FilterSelection { route_no: Some("R1".into()), ..sel };
        assert_eq!(derive_options(&data, &sel).salesmen, vec!["Ali"]);
    }

    #[test]
    fn month_selection_does_not_narrow_anything() {
        let data = sample();
        let sel = FilterSelection { month: Some("2024-01".into()), ..Default::default() };
        assert_eq!(derive_options(&data, &sel), derive_options(&data, &FilterSelection::default()));
    }

    #[test]
    fn unknown_team_yields_empty_route_list() {
        let sel = FilterSelection { team: Some("Nope".into()), ..Default::default() };
        let opts = derive_options(&sample(), &sel);
        assert!(opts.routes.is_empty());
        assert!(opts.salesmen.is_empty());
    }
}
