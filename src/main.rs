//! エントリポイント: ログ初期化、端末のセットアップ、TUIループの起動。

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

mod app;
mod client;
mod config;
mod events;
mod form;
mod input;
mod layout;
mod shortcuts;
mod ui;
mod view;
mod worker;

/// ファイルへのログ出力を初期化する。戻り値のguardは終了まで保持すること。
fn init_logging() -> Result<WorkerGuard> {
    let log_file = "similarity_tui.log";
    // 標準出力はTUIが使うため、ログはファイルへ書き出す。
    let file_appender = tracing_appender::rolling::never(".", log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {}", log_file);
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. ログを初期化する。
    let _log_guard = init_logging()?;
    tracing::info!("app starting");

    // 2. 端末をrawモード＋代替スクリーンに切り替える。
    let mut terminal = ui::init_terminal()?;
    // 3. メインループを実行する。
    let res = app::run_app(&mut terminal).await;
    // 4. ループが失敗しても端末は必ず元に戻す。
    ui::restore_terminal()?;

    if let Err(ref e) = res {
        tracing::error!("app error: {e}");
    }
    tracing::info!("app exiting");
    res
}
