use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

/// 実行を終了させるエラー。リトライはしない
#[derive(Debug, Error)]
pub enum SolverError {
    /// サイズ・スレッド数などのパラメータ不正（確保前に検出）
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// 反復回数の上限を超えた、または残差が有限でなくなった
    #[error("エラー: {iterations} 回反復しても収束しませんでした (上限 {max_iterations}, 残差 {residual:e}, 閾値 {epsilon:e})")]
    ConvergenceFailure {
        iterations: usize,
        max_iterations: usize,
        residual: f64,
        epsilon: f64,
    },

    /// 結果ファイルを書き込み用に開けない
    #[error("エラー: 結果ファイル {path} に書き込めません: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SolverError {
    pub const EXIT_CONFIGURATION: i32 = 2;
    pub const EXIT_CONVERGENCE: i32 = 13;
    pub const EXIT_IO: i32 = 74;

    pub fn configuration(msg: impl Into<String>) -> Self {
        SolverError::Configuration(msg.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SolverError::Configuration(_) => Self::EXIT_CONFIGURATION,
            SolverError::ConvergenceFailure { .. } => Self::EXIT_CONVERGENCE,
            SolverError::Io { .. } => Self::EXIT_IO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SolverError::configuration("x").exit_code(),
            SolverError::ConvergenceFailure {
                iterations: 1,
                max_iterations: 1,
                residual: 1.0,
                epsilon: 0.1,
            }
            .exit_code(),
            SolverError::Io {
                path: PathBuf::from("results.csv"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }
            .exit_code(),
        ];
        assert!(codes.iter().all(|&c| c != 0 && c != 1));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }
}
