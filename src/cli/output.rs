use abmerge::progress::Progress;
use std::io::{self, IsTerminal, Write};

pub struct OutputConfig {
    pub json: bool,
    pub verbose: bool,
    pub quiet: bool,
    /// Column-aligned tables; tab-separated when piped or colour is off.
    aligned: bool,
}

impl OutputConfig {
    pub fn from_global(json: bool, verbose: bool, quiet: bool, no_color: bool) -> Self {
        let aligned =
            !no_color && std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self {
            json,
            verbose,
            quiet,
            aligned,
        }
    }

    /// The run summary, on stdout unless `--quiet`.
    pub fn status(&self, msg: &str) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    /// Per-file progress and the final tag list, on stderr with `--verbose`.
    /// Stdout only ever carries the summary or the JSON report.
    pub fn detail(&self, msg: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{msg}");
        }
    }

    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value)?;
        writeln!(stdout)?;
        Ok(())
    }

    pub fn print_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        for line in self.table_lines(headers, rows) {
            println!("{line}");
        }
    }

    fn table_lines(&self, headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
        if rows.is_empty() {
            return Vec::new();
        }

        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: Vec<&str>| -> String {
            if self.aligned {
                let padded: Vec<String> = cells
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{c:<w$}"))
                    .collect();
                padded.join("  ").trim_end().to_string()
            } else {
                cells.join("\t")
            }
        };

        let mut lines = vec![render(headers.to_vec())];
        if self.aligned {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            lines.push(rule.join("  "));
        }
        lines.extend(rows.iter().map(|row| render(row.iter().map(String::as_str).collect())));
        lines
    }

    /// Per-file progress reporter for probing and encoding.
    pub fn progress(&self) -> StatusProgress<'_> {
        StatusProgress {
            output: self,
            total: 0,
            done: 0,
        }
    }
}

/// Prints one line per processed file in verbose mode, JSON or not.
pub struct StatusProgress<'a> {
    output: &'a OutputConfig,
    total: usize,
    done: usize,
}

impl Progress for StatusProgress<'_> {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn step(&mut self, label: &str) {
        self.done += 1;
        self.output
            .detail(&format!("{label} [{}/{}]", self.done, self.total));
    }
}

/// Format milliseconds as `H:MM:SS.mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let (secs, millis) = (ms / 1000, ms % 1000);
    format!(
        "{}:{:02}:{:02}.{millis:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(aligned: bool) -> OutputConfig {
        OutputConfig {
            json: false,
            verbose: false,
            quiet: false,
            aligned,
        }
    }

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["0".into(), "0:00:00.000".into(), "Opening".into()],
            vec!["1".into(), "0:00:35.500".into(), "Café".into()],
        ]
    }

    #[test]
    fn test_aligned_table_pads_columns() {
        let lines = config(true).table_lines(&["#", "START", "TITLE"], &rows());
        assert_eq!(
            lines,
            vec![
                "#  START        TITLE",
                "-  -----------  -------",
                "0  0:00:00.000  Opening",
                "1  0:00:35.500  Café",
            ]
        );
    }

    #[test]
    fn test_piped_table_is_tab_separated() {
        let lines = config(false).table_lines(&["#", "START", "TITLE"], &rows());
        assert_eq!(lines[0], "#\tSTART\tTITLE");
        assert_eq!(lines[2], "1\t0:00:35.500\tCafé");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_table_prints_nothing() {
        assert!(config(true).table_lines(&["#"], &[]).is_empty());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "0:00:00.000");
        assert_eq!(format_timestamp(35_500), "0:00:35.500");
        assert_eq!(format_timestamp(3_723_004), "1:02:03.004");
    }
}
