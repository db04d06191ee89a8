//! Terminal rendering: one horizontal bar chart per aggregation

use crate::summary::{Bucket, InventoryReport};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// Width of the longest bar in characters
pub const BAR_WIDTH: usize = 40;

pub fn render_text(report: &InventoryReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Host inventory: {} hosts (generated {})",
        report.total_hosts,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out.push('\n');

    section(&mut out, "Distribution of Hosts by OS", &report.os);

    let age = [
        Bucket {
            label: "Old hosts".to_string(),
            count: report.age.old,
        },
        Bucket {
            label: "New hosts".to_string(),
            count: report.age.new,
        },
    ];
    section(
        &mut out,
        &format!(
            "Old vs. New Hosts (cutoff {})",
            report.age.cutoff.format("%Y-%m-%d")
        ),
        &age,
    );

    section(&mut out, "Distribution of Open Ports", &report.open_ports);

    out
}

fn section(out: &mut String, title: &str, buckets: &[Bucket]) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));

    if buckets.is_empty() {
        let _ = writeln!(out, "  (no data)");
    } else {
        out.push_str(&bar_chart(buckets));
    }
    out.push('\n');
}

/// Bars scaled so the largest count spans `BAR_WIDTH`; labels padded to terminal columns
pub fn bar_chart(buckets: &[Bucket]) -> String {
    let label_width = buckets
        .iter()
        .map(|b| UnicodeWidthStr::width(b.label.as_str()))
        .max()
        .unwrap_or(0);
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);

    let mut out = String::new();
    for bucket in buckets {
        let len = if max == 0 {
            0
        } else {
            // Non-zero counts always get at least one cell
            (bucket.count * BAR_WIDTH).div_ceil(max)
        };
        let pad = label_width - UnicodeWidthStr::width(bucket.label.as_str());
        let _ = writeln!(
            out,
            "  {}{}  {} {}",
            bucket.label,
            " ".repeat(pad),
            "#".repeat(len),
            bucket.count
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::build_report;
    use chrono::{TimeZone, Utc};

    fn bucket(label: &str, count: usize) -> Bucket {
        Bucket {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn test_largest_bar_is_full_width() {
        let chart = bar_chart(&[bucket("Linux", 10), bucket("Windows", 1)]);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('#').count(), 4);
        assert!(lines[0].starts_with("  Linux    "));
        assert!(lines[1].ends_with(" 1"));
    }

    #[test]
    fn test_wide_labels_align_by_display_width() {
        let chart = bar_chart(&[bucket("中文系统", 2), bucket("Linux", 2), bucket("Ωmega", 2)]);

        // Bars start at the same terminal column on every line
        let columns: Vec<usize> = chart
            .lines()
            .map(|line| UnicodeWidthStr::width(&line[..line.find('#').unwrap()]))
            .collect();
        assert_eq!(columns, vec![12, 12, 12]);
    }

    #[test]
    fn test_zero_counts_draw_no_bar() {
        let chart = bar_chart(&[bucket("Old hosts", 0), bucket("New hosts", 0)]);
        assert_eq!(chart.matches('#').count(), 0);
    }

    #[test]
    fn test_empty_report_renders_placeholders() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let text = render_text(&build_report(&[], now, 30).unwrap());

        assert!(text.starts_with("Host inventory: 0 hosts"));
        assert!(text.contains("Old vs. New Hosts (cutoff 2024-02-09)"));
        assert_eq!(text.matches("(no data)").count(), 2);
    }
}
