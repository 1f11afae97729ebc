use crate::ingest::useragent;
use crate::storage::visits::VisitRow;
use serde::Serialize;
use std::collections::HashMap;

/// One row of a frequency table: a label and how many visits share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub count: u64,
}

/// The five ranked frequency tables derived from the full visit log.
///
/// Ephemeral: recomputed from scratch on every request, never persisted.
#[derive(Debug, Default, Serialize)]
pub struct VisitSummary {
    pub pages: Vec<TableRow>,
    pub referers: Vec<TableRow>,
    pub ips: Vec<TableRow>,
    pub browsers: Vec<TableRow>,
    pub oses: Vec<TableRow>,
    pub total_visits: u64,
}

/// Aggregate the visit log into five frequency tables in a single scan.
///
/// Each user agent is classified into browser/OS labels; classification is
/// total, so a malformed agent degrades to the default labels for that one
/// visit and never aborts the computation.
pub fn compute_summary(visits: &[VisitRow]) -> VisitSummary {
    let mut pages: HashMap<String, u64> = HashMap::new();
    let mut referers: HashMap<String, u64> = HashMap::new();
    let mut ips: HashMap<String, u64> = HashMap::new();
    let mut browsers: HashMap<String, u64> = HashMap::new();
    let mut oses: HashMap<String, u64> = HashMap::new();

    for visit in visits {
        *pages.entry(visit.page_url.clone()).or_default() += 1;
        *referers.entry(visit.referer_url.clone()).or_default() += 1;
        *ips.entry(visit.ip_address.clone()).or_default() += 1;

        let classified = useragent::classify(&visit.user_agent);
        *browsers.entry(classified.browser).or_default() += 1;
        *oses.entry(classified.os).or_default() += 1;
    }

    VisitSummary {
        pages: into_table(pages),
        referers: into_table(referers),
        ips: into_table(ips),
        browsers: into_table(browsers),
        oses: into_table(oses),
        total_visits: visits.len() as u64,
    }
}

/// Turn a label→count map into a table sorted descending by count.
/// Ties order ascending by label so results are deterministic across runs.
fn into_table(counts: HashMap<String, u64>) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = counts
        .into_iter()
        .map(|(label, count)| TableRow { label, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_visit(page: &str, referer: &str, ua: &str, ip: &str) -> VisitRow {
        VisitRow {
            id: 1,
            visited_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            page_url: page.to_string(),
            referer_url: referer.to_string(),
            user_agent: ua.to_string(),
            ip_address: ip.to_string(),
        }
    }

    #[test]
    fn test_empty_log_yields_empty_tables() {
        let summary = compute_summary(&[]);
        assert!(summary.pages.is_empty());
        assert!(summary.referers.is_empty());
        assert!(summary.ips.is_empty());
        assert!(summary.browsers.is_empty());
        assert!(summary.oses.is_empty());
        assert_eq!(summary.total_visits, 0);
    }

    #[test]
    fn test_pages_ranked_by_count() {
        let visits = vec![
            make_visit("/home", "", "", "1.1.1.1"),
            make_visit("/home", "", "", "2.2.2.2"),
            make_visit("/about", "", "", "1.1.1.1"),
        ];
        let summary = compute_summary(&visits);
        assert_eq!(
            summary.pages,
            vec![
                TableRow {
                    label: "/home".to_string(),
                    count: 2
                },
                TableRow {
                    label: "/about".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(summary.total_visits, 3);
    }

    #[test]
    fn test_known_agent_classified_once() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.130 Safari/537.36";
        let summary = compute_summary(&[make_visit("/", "", ua, "1.1.1.1")]);
        assert_eq!(summary.browsers[0].label, "Chrome");
        assert_eq!(summary.browsers[0].count, 1);
        assert_eq!(summary.oses[0].label, "Windows");
        assert_eq!(summary.oses[0].count, 1);
    }

    #[test]
    fn test_malformed_agents_fall_back_to_defaults() {
        let visits = vec![
            make_visit("/", "", "", "1.1.1.1"),
            make_visit("/", "", "totally-not-a-browser", "1.1.1.1"),
        ];
        let summary = compute_summary(&visits);
        assert_eq!(summary.browsers.len(), 1);
        assert_eq!(summary.browsers[0].label, useragent::OTHER_BROWSER);
        assert_eq!(summary.browsers[0].count, 2);
        assert_eq!(summary.oses[0].label, useragent::UNKNOWN_OS);
    }

    #[test]
    fn test_ties_break_by_label() {
        let visits = vec![
            make_visit("/zebra", "", "", ""),
            make_visit("/alpha", "", "", ""),
        ];
        let summary = compute_summary(&visits);
        assert_eq!(summary.pages[0].label, "/alpha");
        assert_eq!(summary.pages[1].label, "/zebra");
    }

    #[test]
    fn test_referers_and_ips_counted() {
        let visits = vec![
            make_visit("/", "https://example.com/", "", "1.1.1.1"),
            make_visit("/", "https://example.com/", "", "1.1.1.1"),
            make_visit("/", "", "", "2.2.2.2"),
        ];
        let summary = compute_summary(&visits);
        assert_eq!(summary.referers[0].label, "https://example.com/");
        assert_eq!(summary.referers[0].count, 2);
        assert_eq!(summary.ips[0].label, "1.1.1.1");
        assert_eq!(summary.ips[0].count, 2);
    }

    fn table_sum(rows: &[TableRow]) -> u64 {
        rows.iter().map(|r| r.count).sum()
    }

    fn is_non_increasing(rows: &[TableRow]) -> bool {
        rows.windows(2).all(|w| w[0].count >= w[1].count)
    }

    proptest! {
        #[test]
        fn prop_counts_sum_to_total(
            entries in prop::collection::vec(("[a-z/]{0,8}", "[a-z.]{0,8}", ".{0,40}", "[0-9.]{0,15}"), 0..50)
        ) {
            let visits: Vec<VisitRow> = entries
                .iter()
                .map(|(p, r, ua, ip)| make_visit(p, r, ua, ip))
                .collect();
            let n = visits.len() as u64;
            let summary = compute_summary(&visits);

            prop_assert_eq!(summary.total_visits, n);
            prop_assert_eq!(table_sum(&summary.pages), n);
            prop_assert_eq!(table_sum(&summary.referers), n);
            prop_assert_eq!(table_sum(&summary.ips), n);
            prop_assert_eq!(table_sum(&summary.browsers), n);
            prop_assert_eq!(table_sum(&summary.oses), n);

            prop_assert!(is_non_increasing(&summary.pages));
            prop_assert!(is_non_increasing(&summary.referers));
            prop_assert!(is_non_increasing(&summary.ips));
            prop_assert!(is_non_increasing(&summary.browsers));
            prop_assert!(is_non_increasing(&summary.oses));
        }
    }
}
