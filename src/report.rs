// 🖨️ Console report - what each pass considered, what it rewrote, what's left

use crate::pipeline::PipelineReport;
use crate::table::Table;
use crate::VERSION;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Pass-by-pass summary plus counts
pub fn render_report(report: &PipelineReport) -> String {
    let mut lines = vec![
        format!("🧹 country-cleaner v{} | run {}", VERSION, report.run_id),
        RULE.to_string(),
        format!(
            "Scorer: {} | threshold: {} | reference date: {}",
            report.scorer,
            report.threshold,
            report.reference_date.format(&report.date_format)
        ),
    ];

    if !report.alias_rewrites.is_empty() {
        lines.push("\n🔁 Alias rewrites".to_string());
        lines.extend(report.alias_rewrites.iter().map(|rewrite| {
            format!(
                "   {:?} → {:?} ({} rows)",
                rewrite.alias, rewrite.canonical, rewrite.rows
            )
        }));
    }

    for pass in &report.passes {
        lines.push(format!("\n🎯 Fuzzy pass: {:?}", pass.label));

        let considered: Vec<String> = pass
            .considered
            .iter()
            .map(|m| format!("({:?}, {})", m.candidate, m.score))
            .collect();
        lines.push(format!("   considered: [{}]", considered.join(", ")));

        if pass.accepted.is_empty() {
            lines.push(format!("   no matches at or above {}", report.threshold));
        } else {
            lines.extend(pass.accepted.iter().map(|m| {
                format!("   ✓ {:?} → {:?} (score {})", m.candidate, pass.label, m.score)
            }));
            lines.push("   Matches converted!".to_string());
        }
    }

    lines.push(format!("\n{}", RULE));
    lines.push(format!("Rows in: {} | rows out: {}", report.rows_in, report.rows_out));
    if report.dropped_empty > 0 {
        lines.push(format!("Dropped (empty country): {}", report.dropped_empty));
    }
    if !report.date_errors.is_empty() {
        lines.push(format!("Skipped (bad date): {}", report.date_errors.len()));
        lines.extend(report.date_errors.iter().map(|err| format!("   {}", err)));
    }
    if !report.unresolved.is_empty() {
        lines.push(format!("Unresolved: {:?}", report.unresolved));
    }
    lines.push(format!("Count of unique country entries: {}", report.distinct_countries));

    lines.join("\n") + "\n"
}

/// `country` / `days_ago` columns, one line per row. `limit` keeps the head only.
pub fn render_table(table: &Table, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(table.len()).min(table.len());

    let width = table
        .records
        .iter()
        .take(shown)
        .filter_map(|r| r.country.as_deref())
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .max("country".len());
    let iw = table.len().to_string().len().max(4);

    let mut lines = vec![format!("{:>iw$}  {:<width$}  {:>8}", "line", "country", "days_ago")];

    lines.extend(table.records.iter().take(shown).map(|record| {
        format!(
            "{:>iw$}  {:<width$}  {:>8}",
            record.line_number,
            record.country.as_deref().unwrap_or(""),
            record.days_ago.map(|d| d.to_string()).unwrap_or_default()
        )
    }));

    if shown < table.len() {
        lines.push(format!("... {} more rows", table.len() - shown));
    }
    lines.push(format!("[{} rows x 2 columns]", table.len()));

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use crate::pipeline::Pipeline;
    use crate::table::Record;
    use chrono::NaiveDate;

    fn run(countries: &[&str]) -> crate::pipeline::PipelineOutput {
        let pipeline = Pipeline::new(CleaningConfig::default()).unwrap();
        let table = Table::from_records(
            countries
                .iter()
                .enumerate()
                .map(|(i, c)| Record::new(i + 1, Some(*c), "01-01-2020"))
                .collect(),
        );
        pipeline
            .run(&table, NaiveDate::from_ymd_opt(2020, 1, 11).unwrap())
            .unwrap()
    }

    #[test]
    fn test_report_lists_passes_and_counts() {
        let out = run(&["uk", "kingdom united", "Narnia", " "]);
        let text = render_report(&out.report);

        assert!(text.contains("Fuzzy pass: \"united kingdom\""));
        assert!(text.contains("\"kingdom united\" → \"united kingdom\" (score 100)"));
        assert!(text.contains("\"uk\" → \"united kingdom\" (1 rows)"));
        assert!(text.contains("Dropped (empty country): 1"));
        assert!(text.contains("Unresolved: [\"narnia\"]"));
        assert!(text.contains("Count of unique country entries: 2"));
    }

    #[test]
    fn test_report_header_carries_version() {
        let out = run(&["uk"]);
        let text = render_report(&out.report);

        assert!(text.starts_with(&format!("🧹 country-cleaner v{}", VERSION)));
        assert!(text.contains("reference date: 11-01-2020"));
    }

    #[test]
    fn test_report_uses_configured_date_layout() {
        let config = CleaningConfig {
            date_format: "%Y/%m/%d".to_string(),
            ..CleaningConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        let table = Table::from_records(vec![Record::new(1, Some("uk"), "2020/01/01")]);

        let out = pipeline
            .run(&table, NaiveDate::from_ymd_opt(2020, 1, 11).unwrap())
            .unwrap();
        let text = render_report(&out.report);

        assert!(text.contains("reference date: 2020/01/11"));
        assert_eq!(out.table.records[0].days_ago, Some(10));
    }

    #[test]
    fn test_report_noop_pass() {
        let out = run(&["uk"]);
        let text = render_report(&out.report);

        assert!(text.contains("no matches at or above 90"));
        assert!(!text.contains("Unresolved"));
    }

    #[test]
    fn test_render_table() {
        let out = run(&["uk", "sa"]);
        let text = render_table(&out.table, None);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("country"));
        assert!(lines[0].contains("days_ago"));
        assert!(lines[1].contains("united kingdom"));
        assert!(lines[1].trim_end().ends_with("10"));
        assert_eq!(lines.last(), Some(&"[2 rows x 2 columns]"));
    }

    #[test]
    fn test_render_table_limit() {
        let out = run(&["uk", "sa", "america"]);
        let text = render_table(&out.table, Some(1));

        assert!(text.contains("... 2 more rows"));
        assert!(!text.contains("south africa"));
    }
}
