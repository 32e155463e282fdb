//! TUIのイベントループ、状態管理、リクエスト送出。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    client::ApiClient,
    config::Config,
    events::UiState,
    form::{FormState, UPLOAD_DONE_MSG},
    input::InputBoxState,
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 設定ファイルと環境変数を合成した設定。
    pub cfg: Config,
    /// 2つのフォームと直近の類似度チェック結果。
    pub form: FormState,
    /// ステータス・ログ・通知などUI固有の状態。
    pub ui: UiState,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    /// 空のフォームでアプリ状態を作る。
    pub fn new(
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        Self {
            cfg,
            form: FormState::default(),
            ui: UiState::new(),
            worker_tx,
            worker_rx,
            input_box: None,
            shortcuts,
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込み（初回はデフォルトを生成）、環境変数で上書きする。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?.with_env_overrides();
    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;
    tracing::info!("service base url: {}", cfg.base_url());

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // 接続先を渡してWorkerを起動する。
    tokio::spawn(worker::run(rx_cmd, tx_ev, ApiClient::new(cfg.base_url())));

    // アプリ状態を初期化する。
    let mut app = App::new(cfg, shortcuts, tx_cmd, rx_ev);
    app.ui.push_log(format!("service: {}", app.cfg.base_url()));

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // どの状態でもCtrl+Cで終了できるようにする。
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::CheckFinished { id, outcome } => {
            // 結果かエラーを反映し、ローディングを解除する。
            let ok = outcome.is_ok();
            app.form.finish_check(outcome);
            tracing::debug!("check {id} applied");
            if ok {
                app.ui.status = "Check finished".into();
                app.ui.push_log("check finished");
            } else {
                app.ui.status = "Check failed".into();
                app.ui.push_log("check failed");
            }
        }
        WorkerEvent::UploadFinished { id, outcome } => {
            tracing::debug!("upload {id} applied");
            if app.form.finish_upload(outcome) {
                // 成功1件につき通知を1つ積む。
                app.ui.push_notice(UPLOAD_DONE_MSG);
                app.ui.status = "Upload finished".into();
                app.ui.push_log("upload finished");
            } else {
                app.ui.status = "Upload failed".into();
                app.ui.push_log("upload failed");
            }
        }
        WorkerEvent::Log(s) => {
            // ログを追加する。
            app.ui.push_log(s);
        }
    }
}

/// 類似度フォームを検証し、Workerへリクエストを渡す。
pub async fn submit_check(app: &mut App) -> Result<()> {
    // チェック中は送信ボタンを無効扱いにする。
    if app.form.loading {
        app.ui.status = "Checking... (already in progress)".into();
        return Ok(());
    }
    // 必須項目が欠けていればエラーを表示して終わる。
    let Some(req) = app.form.begin_check() else {
        tracing::warn!("check rejected: required fields missing");
        return Ok(());
    };
    tracing::info!("check requested: {}", req.id);
    app.ui.status = "Checking...".into();
    if let Err(e) = app.worker_tx.send(WorkerCmd::CheckSimilarity(req)).await {
        // Workerが居なくてもローディングを残さず、アプリは継続する。
        tracing::error!("worker unavailable: {e}");
        app.form.finish_check(Err(format!("worker unavailable: {e}")));
        app.ui.status = "Check failed".into();
    }
    Ok(())
}

/// アップロードフォームを検証し、Workerへリクエストを渡す。
pub async fn submit_upload(app: &mut App) -> Result<()> {
    // 必須項目が欠けていればエラーを表示して終わる。
    let Some(req) = app.form.begin_upload() else {
        tracing::warn!("upload rejected: required fields missing");
        return Ok(());
    };
    tracing::info!("upload requested: {}", req.id);
    app.ui.status = "Uploading...".into();
    if let Err(e) = app.worker_tx.send(WorkerCmd::UploadImage(req)).await {
        // 送信できなくてもアプリは継続する。
        tracing::error!("worker unavailable: {e}");
        app.form.finish_upload(Err(format!("worker unavailable: {e}")));
        app.ui.status = "Upload failed".into();
    }
    Ok(())
}
