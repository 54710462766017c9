use std::time::Instant;

use tracing::{debug, trace};

use crate::error::Result;
use crate::kernels::{error_sums_partial, l2_norm_partial, mat_vec_product, scale, subtract};
use crate::solver::{convergence_failure, judge, threshold, Convergence, RoundVerdict, SolverConfig};
use crate::system::LinearSystem;

// 1スレッド版: 全区間 [0, n) をそのまま処理する。スピードアップの基準
pub fn single(system: &LinearSystem, config: &SolverConfig) -> Result<Convergence> {
    let n = system.size();
    let b = system.rhs();

    let mut x = vec![0.0; n];
    let mut r = vec![0.0; n];
    let mut history = Vec::new();

    let epsilon = threshold(config.epsilon, l2_norm_partial(b));
    debug!(epsilon, "threshold");

    let mut iterations = 0;
    let start = Instant::now();

    let final_residual = loop {
        iterations += 1;

        // r = A·x - b
        mat_vec_product(system, x.as_slice(), &mut r, 0..n);
        subtract(&mut r, b);

        let residual = l2_norm_partial(&r).sqrt();
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

        // x = x - τ·r
        scale(&mut r, config.step);
        subtract(&mut x, &r);
    };

    let elapsed = start.elapsed();
    let (absolute_error, relative_error) = error_sums_partial(&x);

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
