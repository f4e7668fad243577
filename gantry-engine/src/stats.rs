// Run statistics
// One record per completed step, appended in completion order, rendered as
// an aligned text table at the end of a run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Timing record for one completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRecord {
    pub step: String,
    pub dependencies: Vec<String>,
    pub duration: Duration,
}

/// The outcome of one run: per-step records in completion order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pipeline: String,
    pub records: Vec<StatsRecord>,
    pub total: Duration,
    /// Where tracked experiment values were committed, if any
    pub experiment: Option<PathBuf>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Completed step names, in completion order.
    pub fn completed(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.step.as_str()).collect()
    }

    /// Render the report as an aligned text table.
    pub fn render(&self) -> String {
        let header = ["Step", "Dependencies", "Duration"];
        let rows: Vec<[String; 3]> = self
            .records
            .iter()
            .map(|record| {
                [
                    record.step.clone(),
                    record.dependencies.join(", "),
                    format!("{:.3?}", record.duration),
                ]
            })
            .collect();

        let mut widths = [header[0].len(), header[1].len(), header[2].len()];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let write_row = |out: &mut String, cells: [&str; 3]| {
            out.push_str(&format!(
                "{:<w0$}  {:<w1$}  {:<w2$}\n",
                cells[0],
                cells[1],
                cells[2],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            ));
        };

        write_row(&mut out, header);
        out.push_str(&format!(
            "{}  {}  {}\n",
            "-".repeat(widths[0]),
            "-".repeat(widths[1]),
            "-".repeat(widths[2]),
        ));
        for row in &rows {
            write_row(&mut out, [row[0].as_str(), row[1].as_str(), row[2].as_str()]);
        }
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_aligns_columns() {
        let report = RunReport {
            pipeline: "default".to_string(),
            records: vec![
                StatsRecord {
                    step: "load".to_string(),
                    dependencies: vec![],
                    duration: Duration::from_millis(12),
                },
                StatsRecord {
                    step: "clean".to_string(),
                    dependencies: vec!["load".to_string()],
                    duration: Duration::from_millis(3),
                },
            ],
            total: Duration::from_millis(15),
            experiment: None,
        };

        let rendered = report.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Step"));
        assert!(lines[2].starts_with("load"));
        assert!(lines[3].contains("load"));
        assert_eq!(report.completed(), vec!["load", "clean"]);
    }
}
