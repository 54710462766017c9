use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use richardson_rust::results::{append_record, ResultRecord, DEFAULT_RESULTS_FILE};
use richardson_rust::system::{
    DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS, DEFAULT_SIZE, DEFAULT_STEP, DEFAULT_THREADS,
};
use richardson_rust::telemetry::init_tracing;
use richardson_rust::{solve, Result, SolveReport, SolverConfig, SolverError, Strategy};

/// 単純反復法 (Richardson) による連立一次方程式の並列ベンチマーク
#[derive(Parser)]
#[command(name = "richardson")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 1回解いて結果ファイルに1行追記する
    Solve {
        #[command(flatten)]
        params: SolverArgs,

        /// スレッド数 (省略時は serial なら1、それ以外は既定値)
        #[arg(long, short = 't')]
        threads: Option<usize>,

        /// 反復ごとの残差を記録し、最初と最後を表示する
        #[arg(long)]
        record_residuals: bool,
    },

    /// スレッド数を変えて計測し、スピードアップを表示する
    Sweep {
        #[command(flatten)]
        params: SolverArgs,

        /// 計測するスレッド数 (先頭が基準)
        #[arg(long, short = 't', value_delimiter = ',', default_value = "1,2,4,8")]
        threads: Vec<usize>,

        /// 本番計測の回数 (中央値を採用)
        #[arg(long, default_value_t = 3)]
        repeats: usize,

        /// ウォームアップ回数 (結果ファイルには書かない)
        #[arg(long, default_value_t = 1)]
        warmup: usize,
    },
}

#[derive(Args)]
struct SolverArgs {
    /// 行列サイズ n
    #[arg(long, short = 'n', default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// 並列化の方式
    #[arg(long, value_enum, default_value_t = Strategy::Persistent)]
    strategy: Strategy,

    /// 収束判定の基準値 (‖b‖ 倍して使う)
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    /// 反復の刻み幅 τ
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: f64,

    /// 反復回数の上限
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// 結果を追記するCSVファイル
    #[arg(long, short = 'o', default_value = DEFAULT_RESULTS_FILE)]
    output: PathBuf,
}

impl SolverArgs {
    fn config(&self, threads: usize) -> SolverConfig {
        SolverConfig {
            size: self.size,
            threads,
            strategy: self.strategy,
            epsilon: self.epsilon,
            step: self.step,
            max_iterations: self.max_iterations,
            record_residuals: false,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Solve { params, threads, record_residuals } => {
            let threads = threads.unwrap_or(match params.strategy {
                Strategy::Serial => 1,
                _ => DEFAULT_THREADS,
            });
            let config = SolverConfig { record_residuals, ..params.config(threads) };
            run_solve(&config, &params.output)
        }
        Commands::Sweep { params, threads, repeats, warmup } => {
            run_sweep(&params, &threads, repeats, warmup)
        }
    }
}

fn run_solve(config: &SolverConfig, output: &Path) -> Result<()> {
    println!("Program using Simple Iteration method for solving linear systems (CLAY)");
    println!("CLAY : A[{n}][{n}] * x[{n}] = b[{n}]", n = config.size);
    println!("スレッド数: {}, 方式: {}", config.threads, config.strategy);

    let report = solve(config)?;
    append_record(output, &ResultRecord::from(&report))?;

    println!("反復回数: {}", report.iterations);
    println!("計算時間: {:.4} 秒", report.elapsed.as_secs_f64());
    println!("絶対誤差の和: {:.6e}, 相対誤差の和: {:.6e}", report.absolute_error, report.relative_error);
    if let (Some(first), Some(last)) = (report.residual_history.first(), report.residual_history.last()) {
        println!("残差: {first:.6e} -> {last:.6e} ({} 点)", report.residual_history.len());
    }
    Ok(())
}

fn run_sweep(params: &SolverArgs, threads: &[usize], repeats: usize, warmup: usize) -> Result<()> {
    if threads.is_empty() {
        return Err(SolverError::configuration("スレッド数のリストが空です"));
    }
    if repeats == 0 {
        return Err(SolverError::configuration("計測回数は1以上である必要があります"));
    }
    // 計算を始める前に全スレッド数を検証する
    for &t in threads {
        params.config(t).validate()?;
    }
    if threads[0] != 1 {
        warn!(baseline = threads[0], "基準が1スレッドではありません");
    }

    println!("=== 単純反復法 スピードアップ計測 ===");
    println!("n: {}, 方式: {}, 測定回数: {}\n", params.size, params.strategy, repeats);

    let mut baseline: Option<Duration> = None;
    let mut rows = Vec::with_capacity(threads.len());

    for &t in threads {
        let config = params.config(t);
        let median = run_benchmark(&config, repeats, warmup, &params.output)?;
        let base = *baseline.get_or_insert(median);
        let speedup = base.as_secs_f64() / median.as_secs_f64();
        rows.push((t, median, speedup));
    }

    println!("  Threads | Median (s) | SpeedUp");
    println!("  --------|------------|--------");
    for (t, median, speedup) in rows {
        println!("  {:7} | {:10.4} | {:7.2}", t, median.as_secs_f64(), speedup);
    }
    Ok(())
}

fn run_benchmark(config: &SolverConfig, repeats: usize, warmup: usize, output: &Path) -> Result<Duration> {
    println!("{} スレッド:", config.threads);

    // ウォームアップ
    for _ in 0..warmup {
        solve(config)?;
    }

    // 本番計測
    let mut times = Vec::with_capacity(repeats);
    for i in 0..repeats {
        let report: SolveReport = solve(config)?;
        append_record(output, &ResultRecord::from(&report))?;
        println!("  試行 {:2}: {:?} ({} 回反復)", i + 1, report.elapsed, report.iterations);
        times.push(report.elapsed);
    }

    times.sort();
    let median = times[repeats / 2];
    println!("  中央値: {:?}\n", median);
    Ok(median)
}
