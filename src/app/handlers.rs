//! フォーム・入力ボックス・通知ポップアップのキー処理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    input::{InputBoxState, InputTarget},
    shortcuts,
};

use super::{App, submit_check, submit_upload};

/// キー入力を1件処理する。終了すべきときはtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 1. 通知が残っている間は閉じるキー以外をすべて無視する。
    if app.ui.current_notice().is_some() {
        if shortcuts::matches_shortcut(&k, &app.shortcuts.notice.dismiss) {
            app.ui.dismiss_notice();
        }
        return Ok(false);
    }

    // 2. 入力ボックス表示中は入力ボックスへ渡す。
    if app.input_box.is_some() {
        handle_input_box_key(app, k);
        return Ok(false);
    }

    // 3. それ以外はフォームのショートカット。
    handle_form_key(app, k).await
}

/// Ctrl+Cはどこからでも終了できる。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

async fn handle_form_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.form;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.product_code) {
        // 品番の入力ボックスを開く（現在値を初期値にする）。
        app.input_box = Some(InputBoxState::new(
            "Product code:",
            app.form.product_code.clone(),
            InputTarget::ProductCode,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.check_image) {
        // チェック用画像のパス入力。
        app.input_box = Some(InputBoxState::new(
            "X-ray image path (empty clears):",
            path_text(&app.form.check_image),
            InputTarget::CheckImage,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.model) {
        // モデルを順番に切り替える。
        app.form.cycle_model();
        app.ui.status = format!("Model: {}", app.form.model.label());
    } else if shortcuts::matches_shortcut(&k, &sc.check) {
        // チェック中かどうかの判定はsubmit_check側で行う。
        submit_check(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.upload_image) {
        // アップロード用ファイルのパス入力。
        app.input_box = Some(InputBoxState::new(
            "Upload file path (empty clears):",
            path_text(&app.form.upload_image),
            InputTarget::UploadImage,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.upload) {
        // アップロードはチェック中でも送信できる。
        submit_upload(app).await?;
    }

    Ok(false)
}

fn handle_input_box_key(app: &mut App, k: KeyEvent) {
    let Some(state) = &mut app.input_box else {
        return;
    };
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 確定: 値を取り出して入力ボックスを閉じ、対象フィールドへ反映する。
        let value = state.value.clone();
        let target = state.target;
        app.input_box = None;
        apply_input(app, target, value);
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // キャンセル: 値は反映しない。
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        // 通常の文字入力。
        state.insert_char(c);
    }
}

/// 確定した入力値をフォームの該当フィールドへ書き込む。
fn apply_input(app: &mut App, target: InputTarget, value: String) {
    match target {
        InputTarget::ProductCode => {
            app.form.set_product_code(value);
        }
        InputTarget::CheckImage => match resolve_file(&value) {
            Ok(path) => {
                app.ui.status = selection_status("Image", &path);
                app.form.set_check_image(path);
            }
            Err(msg) => app.ui.status = msg,
        },
        InputTarget::UploadImage => match resolve_file(&value) {
            Ok(path) => {
                app.ui.status = selection_status("Upload file", &path);
                app.form.set_upload_image(path);
            }
            Err(msg) => app.ui.status = msg,
        },
    }
}

/// 入力文字列をファイル選択に変換する。
/// 空なら選択解除、それ以外は既存ファイルのみ受け付ける（失敗時は前の選択を残す）。
fn resolve_file(value: &str) -> Result<Option<PathBuf>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(Some(path))
    } else {
        tracing::warn!("file selection rejected: {value}");
        Err(format!("File not found: {value}"))
    }
}

fn selection_status(what: &str, path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("{what} selected: {}", p.display()),
        None => format!("{what} cleared"),
    }
}

fn path_text(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
