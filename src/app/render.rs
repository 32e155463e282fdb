//! フォーム画面の描画処理。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::path::PathBuf;

use crate::{
    input, layout,
    shortcuts::{Shortcuts, format_keys},
    view::ResultView,
};

use super::App;

/// 画面全体を描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // 全体を本体・ヘルプ・ステータスに分割し、本体をさらに左右に分ける。
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    // 左パネル: 類似度チェックとアップロードの2フォーム。
    let form = Paragraph::new(form_lines(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Image Similarity Checker"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(form, body_layout.form_panel);

    // 右パネル: エラー・結果・ログ。
    let result = Paragraph::new(result_lines(app))
        .block(Block::default().borders(Borders::ALL).title("RESULT"))
        .wrap(Wrap { trim: false });
    f.render_widget(result, body_layout.result_panel);

    // ヘルプバー: 現在のショートカット一覧。
    let help = Paragraph::new(help_text(&app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help, main_layout.help_bar);

    // ステータスバー。
    let status = Paragraph::new(app.ui.status.clone())
        .block(Block::default().borders(Borders::ALL).title("STATUS"));
    f.render_widget(status, main_layout.status_bar);

    // ポップアップは最後に重ねる（入力ボックス → 通知の順）。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
    if let Some(notice) = app.ui.current_notice() {
        draw_notice(f, notice, &app.shortcuts);
    }
}

/// 2つのフォームの行（類似度チェックが先）。
fn form_lines(app: &App) -> Vec<Line<'static>> {
    let form = &app.form;
    let heading = Style::default().add_modifier(Modifier::BOLD);

    // チェック中はボタン表示を切り替えて無効に見せる。
    let (button, button_style) = if form.loading {
        ("[ Checking... ]", Style::default().fg(Color::DarkGray))
    } else {
        ("[ Check Similarity ]", Style::default().fg(Color::Yellow))
    };

    vec![
        Line::styled("Check Similarity", heading),
        field("Product Code", &form.product_code),
        field("X-ray Image", &path_label(&form.check_image)),
        field(
            "Model",
            &format!("[{}] {}", form.model.index(), form.model.label()),
        ),
        Line::styled(button, button_style),
        Line::default(),
        Line::styled("Upload File to Database", heading),
        field("Product Code", &form.product_code),
        field("File", &path_label(&form.upload_image)),
        Line::styled("[ Upload File ]", Style::default().fg(Color::Yellow)),
    ]
}

fn field(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<13}"), Style::default().fg(Color::Cyan)),
        Span::raw(value.to_string()),
    ])
}

fn path_label(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".into())
}

/// エラー、結果、直近のログの順に並べる。
fn result_lines(app: &App) -> Vec<Line<'static>> {
    // 状態から表示用の値を組み立てる。
    let view = ResultView::from_state(&app.form);
    let mut lines = vec![];

    // どちらも無いときはプレースホルダを出す。
    if view.is_empty() {
        lines.push(Line::styled(
            "No result yet",
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::default());
    }

    // エラーブロック。
    if let Some(err) = view.error {
        let red = Style::default().fg(Color::Red);
        lines.push(Line::styled("Error", red.add_modifier(Modifier::BOLD)));
        lines.push(Line::styled(err, red));
        lines.push(Line::default());
    }
    // 結果ブロック。
    if let Some(result) = view.result {
        let green = Style::default().fg(Color::Green);
        lines.push(Line::styled("Result", green.add_modifier(Modifier::BOLD)));
        lines.extend(result.into_iter().map(Line::raw));
        lines.push(Line::default());
    }

    // 最新8行のログ。
    lines.push(Line::styled(
        "Log",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let start = app.ui.log.len().saturating_sub(8);
    lines.extend(app.ui.log[start..].iter().cloned().map(Line::raw));
    lines
}

/// 確認用の通知ポップアップ。
fn draw_notice(f: &mut Frame, notice: &str, shortcuts: &Shortcuts) {
    // 中央に領域を確保し、背景をクリアする。
    let area = layout::centered_popup(f.area(), 50, 5);
    f.render_widget(Clear, area);
    let text = format!(
        "{notice}\n\n{}: OK",
        format_keys(&shortcuts.notice.dismiss)
    );
    let popup = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Notice"))
        .alignment(Alignment::Center);
    f.render_widget(popup, area);
}

fn help_text(shortcuts: &Shortcuts) -> String {
    let sc = &shortcuts.form;
    format!(
        "{}: product code | {}: image | {}: model | {}: check | {}: upload file | {}: upload | {}: quit",
        format_keys(&sc.product_code),
        format_keys(&sc.check_image),
        format_keys(&sc.model),
        format_keys(&sc.check),
        format_keys(&sc.upload_image),
        format_keys(&sc.upload),
        format_keys(&sc.quit),
    )
}
