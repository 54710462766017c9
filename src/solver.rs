use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SolverError};
use crate::implementations::barrier::barrier_parallel;
use crate::implementations::rayon::rayon_parallel;
use crate::implementations::single::single;
use crate::partition::partition;
use crate::system::{
    memory_bytes, memory_mib, LinearSystem, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS, DEFAULT_SIZE,
    DEFAULT_STEP, DEFAULT_THREADS,
};

/// 並列化の方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// 演算ごとに fork-join する (rayon)
    PerPhase,
    /// ワーカーを一度だけ起動し、バリアで同期し続ける
    Persistent,
    /// 1スレッドで全区間を処理する基準実装
    Serial,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::PerPhase => "per-phase",
            Strategy::Persistent => "persistent",
            Strategy::Serial => "serial",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    pub size: usize,
    pub threads: usize,
    pub strategy: Strategy,
    pub epsilon: f64,
    pub step: f64,
    pub max_iterations: usize,
    pub record_residuals: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            size: DEFAULT_SIZE,
            threads: DEFAULT_THREADS,
            strategy: Strategy::Persistent,
            epsilon: DEFAULT_EPSILON,
            step: DEFAULT_STEP,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            record_residuals: false,
        }
    }
}

impl SolverConfig {
    pub fn new(size: usize, threads: usize, strategy: Strategy) -> Self {
        SolverConfig { size, threads, strategy, ..Default::default() }
    }

    /// 確保の前に呼ぶ。不正な値はすべて設定エラー
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(SolverError::configuration("行列サイズは1以上である必要があります"));
        }
        // A (n×n) と3本のベクトルが確保できる大きさか
        match memory_bytes(self.size) {
            Some(bytes) if bytes <= isize::MAX as usize => {}
            _ => {
                return Err(SolverError::configuration(format!(
                    "行列サイズ ({}) が大きすぎて確保できません",
                    self.size
                )));
            }
        }
        if self.threads == 0 {
            return Err(SolverError::configuration("スレッド数は1以上である必要があります"));
        }
        if self.strategy == Strategy::Serial && self.threads != 1 {
            return Err(SolverError::configuration(format!(
                "serial は1スレッドで実行します (指定: {})",
                self.threads
            )));
        }
        if self.threads > self.size {
            return Err(SolverError::configuration(format!(
                "スレッド数 ({}) が行列サイズ ({}) を超えています",
                self.threads, self.size
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SolverError::configuration(format!(
                "収束判定値は正の有限値である必要があります: {}",
                self.epsilon
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SolverError::configuration(format!(
                "刻み幅は正の有限値である必要があります: {}",
                self.step
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::configuration("最大反復回数は1以上である必要があります"));
        }
        Ok(())
    }
}

/// 1ラウンドの判定。集約担当の1ワーカーだけが計算して全員に配る
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundVerdict {
    #[default]
    Continue,
    Converged,
    Exhausted,
}

pub fn judge(residual: f64, epsilon: f64, iteration: usize, max_iterations: usize) -> RoundVerdict {
    if residual < epsilon {
        RoundVerdict::Converged
    } else if iteration >= max_iterations || !residual.is_finite() {
        RoundVerdict::Exhausted
    } else {
        RoundVerdict::Continue
    }
}

/// ε = base × ‖b‖₂  (引数は平方和)
pub fn threshold(base_epsilon: f64, rhs_norm_sq: f64) -> f64 {
    base_epsilon * rhs_norm_sq.sqrt()
}

/// 各実装が返す収束ループの結果
#[derive(Clone, Debug)]
pub struct Convergence {
    pub x: Vec<f64>,
    pub iterations: usize,
    pub epsilon: f64,
    pub final_residual: f64,
    pub elapsed: Duration,
    pub absolute_error: f64,
    pub relative_error: f64,
    pub residual_history: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct SolveReport {
    pub strategy: Strategy,
    pub size: usize,
    pub threads: usize,
    pub iterations: usize,
    pub elapsed: Duration,
    pub epsilon: f64,
    pub final_residual: f64,
    pub absolute_error: f64,
    pub relative_error: f64,
    pub solution: Vec<f64>,
    pub residual_history: Vec<f64>,
}

impl SolveReport {
    /// |x[i] - 1| の最大値
    pub fn max_deviation(&self) -> f64 {
        self.solution.iter().map(|v| (v - 1.0).abs()).fold(0.0, f64::max)
    }
}

pub fn solve(config: &SolverConfig) -> Result<SolveReport> {
    config.validate()?;
    let ranges = partition(config.size, config.threads)?;
    debug!(?ranges, "partition table");

    info!(
        size = config.size,
        threads = config.threads,
        strategy = %config.strategy,
        memory_mib = memory_mib(config.size),
        "CLAY : A[n][n] * x[n] = b[n]"
    );

    let system = LinearSystem::new(config.size);

    let convergence = match config.strategy {
        Strategy::Serial => single(&system, config)?,
        Strategy::PerPhase => rayon_parallel(&system, &ranges, config)?,
        Strategy::Persistent => barrier_parallel(&system, &ranges, config)?,
    };

    info!(
        iterations = convergence.iterations,
        seconds = convergence.elapsed.as_secs_f64(),
        residual = convergence.final_residual,
        absolute_error = convergence.absolute_error,
        "converged"
    );

    Ok(SolveReport {
        strategy: config.strategy,
        size: config.size,
        threads: config.threads,
        iterations: convergence.iterations,
        elapsed: convergence.elapsed,
        epsilon: convergence.epsilon,
        final_residual: convergence.final_residual,
        absolute_error: convergence.absolute_error,
        relative_error: convergence.relative_error,
        solution: convergence.x,
        residual_history: convergence.residual_history,
    })
}

pub(crate) fn convergence_failure(
    iterations: usize,
    config: &SolverConfig,
    residual: f64,
    epsilon: f64,
) -> SolverError {
    SolverError::ConvergenceFailure {
        iterations,
        max_iterations: config.max_iterations,
        residual,
        epsilon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judge_prefers_convergence_over_ceiling() {
        assert_eq!(judge(0.5, 1.0, 10, 10), RoundVerdict::Converged);
        assert_eq!(judge(2.0, 1.0, 10, 10), RoundVerdict::Exhausted);
        assert_eq!(judge(2.0, 1.0, 9, 10), RoundVerdict::Continue);
    }

    #[test]
    fn non_finite_residual_stops() {
        assert_eq!(judge(f64::NAN, 1.0, 1, 10), RoundVerdict::Exhausted);
        assert_eq!(judge(f64::INFINITY, 1.0, 1, 10), RoundVerdict::Exhausted);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let ok = SolverConfig::new(10, 2, Strategy::Persistent);
        assert!(ok.validate().is_ok());

        let bad = [
            SolverConfig { size: 0, ..ok.clone() },
            SolverConfig { threads: 0, ..ok.clone() },
            SolverConfig { threads: 11, ..ok.clone() },
            SolverConfig { epsilon: 0.0, ..ok.clone() },
            SolverConfig { step: f64::NAN, ..ok.clone() },
            SolverConfig { max_iterations: 0, ..ok.clone() },
            SolverConfig { size: 1 << 33, threads: 1, ..ok.clone() },
            SolverConfig { size: 1 << 30, threads: 1, ..ok.clone() },
            SolverConfig { strategy: Strategy::Serial, ..ok.clone() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(SolverError::Configuration(_))));
        }

        let serial = SolverConfig::new(10, 1, Strategy::Serial);
        assert!(serial.validate().is_ok());
    }

    #[test]
    fn threshold_scales_with_rhs() {
        assert!((threshold(1e-5, 25.0) - 5e-5).abs() < 1e-18);
        assert_eq!(threshold(2.0, 16.0), 8.0);
    }
}
