use std::ops::Range;
use std::sync::{Arc, Barrier, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use tracing::{debug, trace};

use crate::error::Result;
use crate::implementations::rendezvous::Rendezvous;
use crate::implementations::shared::SharedVector;
use crate::kernels::{error_sums_partial, l2_norm_partial, mat_vec_product, scale, subtract};
use crate::partition::split_by_ranges;
use crate::solver::{convergence_failure, judge, threshold, Convergence, RoundVerdict, SolverConfig};
use crate::system::LinearSystem;

/*
  常駐ワーカー版

  区間の割り当ては最初に一度だけ行い、同じワーカーが収束ループ全体を担当する。
  r と x は split_at_mut で各ワーカー専用のスライスに分け、
  行列ベクトル積で全体を読む必要がある x だけを SharedVector で公開する。

  同期ポイント（各反復）：
  - A·x - b を計算し、部分ノルムを持って Rendezvous に到着
  - 最後に到着したワーカーが合算して判定 (Continue / Converged / Exhausted)
  - 判定を全員が受け取り、Continue なら x を更新して公開
  - Barrier: 全員の公開が終わるまで次の A·x を始めない
*/

#[derive(Clone, Copy, Debug, Default)]
struct RoundResult {
    residual: f64,
    verdict: RoundVerdict,
}

struct WorkerOutcome {
    iterations: usize,
    epsilon: f64,
    last: RoundResult,
    errors: (f64, f64),
}

pub fn barrier_parallel(
    system: &LinearSystem,
    ranges: &[Range<usize>],
    config: &SolverConfig,
) -> Result<Convergence> {
    let n = system.size();
    let workers = ranges.len();

    let mut x = vec![0.0; n];
    let mut r = vec![0.0; n];
    let published = SharedVector::zeros(n);

    let barrier = Arc::new(Barrier::new(workers));
    let threshold_round: Rendezvous<f64> = Rendezvous::new(workers);
    let residual_round: Rendezvous<RoundResult> = Rendezvous::new(workers);
    let history = Mutex::new(Vec::new());

    let start = Instant::now();

    let outcomes: Vec<WorkerOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = split_by_ranges(&mut x, ranges)
            .into_iter()
            .zip(split_by_ranges(&mut r, ranges))
            .zip(ranges.iter().cloned())
            .enumerate()
            .map(|(worker, ((x_local, r_local), range))| {
                let barrier = barrier.clone();
                let threshold_round = &threshold_round;
                let residual_round = &residual_round;
                let published = &published;
                let history = &history;

                scope.spawn(move || {
                    let b_local = &system.rhs()[range.clone()];

                    // ε = base × ‖b‖ を1ワーカーだけが確定させる
                    let epsilon = threshold_round.arrive(worker, l2_norm_partial(b_local), |total| {
                        let epsilon = threshold(config.epsilon, total);
                        debug!(epsilon, "threshold");
                        epsilon
                    });

                    let mut iterations = 0;
                    let last = loop {
                        iterations += 1;

                        // r = A·x - b (自分の区間のみ)
                        mat_vec_product(system, published, r_local, range.clone());
                        subtract(r_local, b_local);

                        let round = residual_round.arrive(worker, l2_norm_partial(r_local), |total| {
                            let residual = total.sqrt();
                            trace!(iterations, residual);
                            if config.record_residuals {
                                history
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .push(residual);
                            }
                            RoundResult {
                                residual,
                                verdict: judge(residual, epsilon, iterations, config.max_iterations),
                            }
                        });

                        if round.verdict != RoundVerdict::Continue {
                            break round;
                        }

                        // x = x - τ·r を自分の区間だけ更新して公開
                        scale(r_local, config.step);
                        subtract(x_local, r_local);
                        published.publish(range.start, x_local);

                        // バリア: 全員の x が公開されるまで次の A·x を始めない
                        barrier.wait();
                    };

                    WorkerOutcome {
                        iterations,
                        epsilon,
                        last,
                        errors: error_sums_partial(x_local),
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let elapsed = start.elapsed();

    // 判定は全ワーカーで同一なので先頭を代表として使う
    let lead = &outcomes[0];
    if lead.last.verdict == RoundVerdict::Exhausted {
        return Err(convergence_failure(lead.iterations, config, lead.last.residual, lead.epsilon));
    }

    let (absolute_error, relative_error) = outcomes
        .iter()
        .fold((0.0, 0.0), |(abs_sum, rel_sum), o| (abs_sum + o.errors.0, rel_sum + o.errors.1));

    Ok(Convergence {
        x,
        iterations: lead.iterations,
        epsilon: lead.epsilon,
        final_residual: lead.last.residual,
        elapsed,
        absolute_error,
        relative_error,
        residual_history: history.into_inner().unwrap_or_else(PoisonError::into_inner),
    })
}
