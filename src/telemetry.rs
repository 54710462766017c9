use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// tracing の購読者を一度だけ設定する。RUST_LOG で上書き可能 (既定は info)
pub fn init_tracing() {
    INIT_GUARD.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);

        // テストなどで既に設定済みなら何もしない
        let _ = Registry::default().with(filter).with(fmt_layer).try_init();
    });
}
