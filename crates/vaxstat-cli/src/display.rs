//! Terminal rendering for derived tables and summaries.
//!
//! Date-indexed series go through Arrow's pretty printer. Single-period
//! summaries render as vertical cards with one `label value` line per entry.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::print_batches;
use chrono::NaiveDate;
use vaxstat_analytics::booster::{ComboMatrix, ComboRate, Eligibility};
use vaxstat_analytics::status::StatusSummary;
use vaxstat_core::{Brand, Metric};

// ── Tables ──

pub fn print_batch(batch: &RecordBatch) -> anyhow::Result<()> {
    if batch.num_rows() == 0 {
        println!("(no rows)");
        return Ok(());
    }
    print_batches(std::slice::from_ref(batch))?;
    println!();
    Ok(())
}

// ── Cards ──

pub fn print_status_summary(summary: &StatusSummary) {
    print_lines(&status_summary_lines(summary));
}

pub fn print_booster_summary(metric: Metric, start: NaiveDate, end: NaiveDate, rates: &[ComboRate]) {
    print_lines(&booster_summary_lines(metric, start, end, rates));
}

pub fn print_eligibility(eligibility: &Eligibility) {
    print_lines(&eligibility_lines(eligibility));
}

pub fn print_combo_matrix(matrix: &ComboMatrix) {
    print_lines(&combo_matrix_lines(matrix));
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
    println!();
}

fn status_summary_lines(summary: &StatusSummary) -> Vec<String> {
    let mut lines = vec![
        format!("=== Deaths {} to {} ===", summary.start, summary.end),
        format!("  {:<26} {}", "total", summary.total_events),
        String::new(),
        format!("  {:<26} {:>12} {:>12} {:>8}", "status", "population", "deaths", "n"),
    ];
    for share in &summary.shares {
        lines.push(format!(
            "  {:<26} {:>12} {:>12} {:>8}",
            share.label,
            percent(share.population_pct),
            percent(share.event_pct),
            share.events
        ));
    }
    lines
}

fn booster_summary_lines(
    metric: Metric,
    start: NaiveDate,
    end: NaiveDate,
    rates: &[ComboRate],
) -> Vec<String> {
    let mut lines = vec![
        format!("=== {metric} by combination, {start} to {end} ==="),
        format!(
            "  {:<26} {:>8} {:>16} {:>12}",
            "combination", "events", "mean population", "per 100k"
        ),
    ];
    for rate in rates {
        lines.push(format!(
            "  {:<26} {:>8} {:>16} {:>12}",
            rate.combo.code(),
            rate.events,
            fixed(rate.mean_denominator, 0),
            fixed(rate.rate, 2)
        ));
    }
    lines
}

fn eligibility_lines(e: &Eligibility) -> Vec<String> {
    let mut lines = vec![format!("=== Booster eligibility on {} ===", e.date)];
    for (brand, count) in &e.eligible {
        lines.push(format!("  {:<26} {}", format!("{} eligible", brand.label()), count));
    }
    lines.push(format!("  {:<26} {}", "total eligible", e.total_eligible));
    lines.push(format!("  {:<26} {}", "boosted", e.boosted));
    lines.push(format!(
        "  {:<26} {}",
        "share boosted",
        percent(e.share_boosted.map(|s| s * 100.0))
    ));
    lines
}

fn combo_matrix_lines(matrix: &ComboMatrix) -> Vec<String> {
    let mut header = format!("  {:<20}", "primary");
    for booster in Brand::TRACKED {
        header.push_str(&format!(" {:>20}", booster.label()));
    }

    let mut lines = vec![
        format!(
            "=== Booster doses by primary course on {} (total {}) ===",
            matrix.date, matrix.total
        ),
        header,
    ];
    for primary in Brand::TRACKED {
        let mut row = format!("  {:<20}", primary.label());
        for booster in Brand::TRACKED {
            let share = matrix.get(primary, booster).and_then(|c| c.share);
            row.push_str(&format!(" {:>20}", percent(share.map(|s| s * 100.0))));
        }
        lines.push(row);
    }
    lines
}

// ── Helpers ──

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}%"))
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaxstat_analytics::booster::MatrixCell;
    use vaxstat_analytics::status::StatusShare;
    use vaxstat_core::Combo;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn missing_values_render_as_dash() {
        assert_eq!(percent(None), "-");
        assert_eq!(percent(Some(12.345)), "12.3%");
        assert_eq!(fixed(Some(2.0 / 3.0), 2), "0.67");
        assert_eq!(fixed(None, 0), "-");
    }

    #[test]
    fn status_card_lists_every_share() {
        let summary = StatusSummary {
            start: d("2021-09-01"),
            end: d("2021-09-14"),
            total_events: 10,
            shares: vec![
                StatusShare {
                    label: "Unvaccinated".into(),
                    population_pct: Some(40.0),
                    event_pct: Some(70.0),
                    events: 7,
                },
                StatusShare {
                    label: "Partially vaccinated / others".into(),
                    population_pct: None,
                    event_pct: Some(30.0),
                    events: 3,
                },
            ],
        };
        let lines = status_summary_lines(&summary);
        assert_eq!(lines[0], "=== Deaths 2021-09-01 to 2021-09-14 ===");
        assert_eq!(lines.len(), 6);
        assert!(lines[4].contains("40.0%") && lines[4].contains("70.0%"));
        assert!(lines[5].contains(" - "));
    }

    #[test]
    fn booster_card_rows_follow_input_order() {
        let rates = vec![
            ComboRate {
                combo: Combo::parse("ppp").unwrap(),
                events: 0,
                mean_denominator: Some(1_000.0),
                rate: Some(0.0),
            },
            ComboRate {
                combo: Combo::parse("sss").unwrap(),
                events: 4,
                mean_denominator: None,
                rate: None,
            },
        ];
        let lines = booster_summary_lines(Metric::Deaths, d("2022-01-01"), d("2022-01-31"), &rates);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].trim_start().starts_with("ppp"));
        assert!(lines[2].ends_with("0.00"));
        assert!(lines[3].trim_start().starts_with("sss"));
        assert!(lines[3].ends_with('-'));
    }

    #[test]
    fn matrix_has_a_row_per_primary_brand() {
        let matrix = ComboMatrix {
            date: d("2022-01-31"),
            total: 4,
            cells: vec![MatrixCell {
                primary: Brand::Sinovac,
                booster: Brand::Pfizer,
                count: 4,
                share: Some(1.0),
            }],
        };
        let lines = combo_matrix_lines(&matrix);
        assert_eq!(lines.len(), 2 + Brand::TRACKED.len());
        let sinovac = lines
            .iter()
            .find(|l| l.trim_start().starts_with(Brand::Sinovac.label()))
            .unwrap();
        assert!(sinovac.contains("100.0%"));
    }

    #[test]
    fn eligibility_card_shows_share_as_percent() {
        let e = Eligibility {
            date: d("2022-01-01"),
            eligible: vec![(Brand::Pfizer, 300), (Brand::Sinovac, 100)],
            total_eligible: 400,
            boosted: 100,
            share_boosted: Some(0.25),
        };
        let lines = eligibility_lines(&e);
        assert_eq!(lines.len(), 6);
        assert!(lines.last().unwrap().ends_with("25.0%"));
    }
}
