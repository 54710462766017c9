use richardson_rust::telemetry::init_tracing;
use richardson_rust::{solve, SolverConfig, Strategy};

// 各方式の残差の減り方を並べて表示するデバッグ用
fn main() {
    init_tracing();

    let size = 64;
    let threads = 4;

    for strategy in [Strategy::Serial, Strategy::PerPhase, Strategy::Persistent] {
        let config = SolverConfig {
            step: 1e-3,
            record_residuals: true,
            ..SolverConfig::new(size, if strategy == Strategy::Serial { 1 } else { threads }, strategy)
        };

        let report = match solve(&config) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{strategy}: {e}");
                std::process::exit(e.exit_code());
            }
        };

        println!("=== {} (n={}, p={}) ===", strategy, size, threads);
        println!("ε = {:.6e}, 反復 {} 回", report.epsilon, report.iterations);

        let stride = (report.residual_history.len() / 10).max(1);
        for (i, residual) in report.residual_history.iter().enumerate().step_by(stride) {
            println!("  {:6}: {:.6e}", i + 1, residual);
        }
        println!("  最終残差: {:.6e}", report.final_residual);
        println!("  max |x - 1| = {:.3e}\n", report.max_deviation());
    }
}
