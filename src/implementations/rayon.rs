use std::ops::Range;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{Result, SolverError};
use crate::kernels::{error_sums_partial, l2_norm_partial, mat_vec_product, scale, subtract};
use crate::partition::split_by_ranges;
use crate::solver::{convergence_failure, judge, threshold, Convergence, RoundVerdict, SolverConfig};
use crate::system::LinearSystem;

/*
  演算ごとの fork-join 版

  1反復につき 4つの演算 (A·x, -b, ×τ, x-r) とノルム計算をそれぞれ並列化する。
  各演算は分割表の区間ごとにタスクを作り、書き込み先のスライスを完全に分離するので
  ロックは不要。par_iter が戻った時点で全タスクが完了している (暗黙のバリア)。

  スレッド数を固定するため、グローバルプールではなく専用プールで install する。
*/
pub fn rayon_parallel(
    system: &LinearSystem,
    ranges: &[Range<usize>],
    config: &SolverConfig,
) -> Result<Convergence> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ranges.len())
        .thread_name(|i| format!("richardson-{i}"))
        .build()
        .map_err(|e| SolverError::configuration(format!("スレッドプールを作成できません: {e}")))?;

    pool.install(|| iterate(system, ranges, config))
}

fn iterate(system: &LinearSystem, ranges: &[Range<usize>], config: &SolverConfig) -> Result<Convergence> {
    let n = system.size();
    let b = system.rhs();

    let mut x = vec![0.0; n];
    let mut r = vec![0.0; n];
    let mut history = Vec::new();

    let epsilon = threshold(config.epsilon, norm_sq(b, ranges));
    debug!(epsilon, "threshold");

    let mut iterations = 0;
    let start = Instant::now();

    let final_residual = loop {
        iterations += 1;

        // r = A·x (x は全体を読むだけ、r は区間ごとに書く)
        split_by_ranges(&mut r, ranges)
            .into_par_iter()
            .zip(ranges.par_iter())
            .for_each(|(chunk, range)| mat_vec_product(system, x.as_slice(), chunk, range.clone()));

        // r = r - b
        split_by_ranges(&mut r, ranges)
            .into_par_iter()
            .zip(ranges.par_iter())
            .for_each(|(chunk, range)| subtract(chunk, &b[range.clone()]));

        let residual = norm_sq(&r, ranges).sqrt();
        trace!(iterations, residual);
        if config.record_residuals {
            history.push(residual);
        }

        match judge(residual, epsilon, iterations, config.max_iterations) {
            RoundVerdict::Converged => break residual,
            RoundVerdict::Exhausted => {
                return Err(convergence_failure(iterations, config, residual, epsilon));
            }
            RoundVerdict::Continue => {}
        }

        // r = τ·r
        split_by_ranges(&mut r, ranges)
            .into_par_iter()
            .for_each(|chunk| scale(chunk, config.step));

        // x = x - r
        split_by_ranges(&mut x, ranges)
            .into_par_iter()
            .zip(ranges.par_iter())
            .for_each(|(chunk, range)| subtract(chunk, &r[range.clone()]));
    };

    let elapsed = start.elapsed();

    let (absolute_error, relative_error) = ranges
        .par_iter()
        .map(|range| error_sums_partial(&x[range.clone()]))
        .collect::<Vec<_>>()
        .into_iter()
        .fold((0.0, 0.0), |(abs_sum, rel_sum), (abs, rel)| (abs_sum + abs, rel_sum + rel));

    Ok(Convergence {
        x,
        iterations,
        epsilon,
        final_residual,
        elapsed,
        absolute_error,
        relative_error,
        residual_history: history,
    })
}

// 部分和は区間の順に合算する (実行順に依存しない)
fn norm_sq(v: &[f64], ranges: &[Range<usize>]) -> f64 {
    ranges
        .par_iter()
        .map(|range| l2_norm_partial(&v[range.clone()]))
        .collect::<Vec<_>>()
        .into_iter()
        .sum()
}
