use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SolverError};
use crate::solver::SolveReport;

pub const DEFAULT_RESULTS_FILE: &str = "results.csv";
pub const HEADER: &str = "Matrix Size,Threads,Iterations,Time (s),Absolute Error,Relative Error";

/// 結果ファイル1行分
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRecord {
    pub matrix_size: usize,
    pub threads: usize,
    pub iterations: usize,
    pub seconds: f64,
    pub absolute_error: f64,
    pub relative_error: f64,
}

impl From<&SolveReport> for ResultRecord {
    fn from(report: &SolveReport) -> Self {
        ResultRecord {
            matrix_size: report.size,
            threads: report.threads,
            iterations: report.iterations,
            seconds: report.elapsed.as_secs_f64(),
            absolute_error: report.absolute_error,
            relative_error: report.relative_error,
        }
    }
}

impl ResultRecord {
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{:.4},{:.4},{:.4}",
            self.matrix_size,
            self.threads,
            self.iterations,
            self.seconds,
            self.absolute_error,
            self.relative_error
        )
    }
}

/// 追記モードで開き、空ファイルのときだけヘッダを書く
pub fn append_record(path: &Path, record: &ResultRecord) -> Result<()> {
    let io_err = |source: std::io::Error| SolverError::Io { path: path.to_path_buf(), source };

    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let is_empty = file.metadata().map_err(io_err)?.len() == 0;

    let mut out = BufWriter::new(file);
    if is_empty {
        writeln!(out, "{HEADER}").map_err(io_err)?;
    }
    writeln!(out, "{}", record.to_row()).map_err(io_err)?;
    out.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_uses_fixed_precision() {
        let record = ResultRecord {
            matrix_size: 100,
            threads: 4,
            iterations: 11398,
            seconds: 0.123456,
            absolute_error: 0.00049,
            relative_error: 0.00049,
        };
        assert_eq!(record.to_row(), "100,4,11398,0.1235,0.0005,0.0005");
    }
}
