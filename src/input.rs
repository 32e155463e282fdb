//! 品番やファイルパスの入力に使う1行入力ポップアップ。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::layout::centered_popup;

/// 確定時に値を受け取るフォームのフィールド。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputTarget {
    ProductCode,
    CheckImage,
    UploadImage,
}

/// 入力ポップアップの編集状態。
#[derive(Clone, Debug)]
pub struct InputBoxState {
    pub prompt: String,
    pub value: String,
    /// 文字単位のカーソル位置（`0..=value.chars().count()`）。
    pub cursor: usize,
    pub target: InputTarget,
}

impl InputBoxState {
    /// カーソルを`value`の末尾に置いて開く。
    pub fn new(prompt: impl Into<String>, value: impl Into<String>, target: InputTarget) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self {
            prompt: prompt.into(),
            value,
            cursor,
            target,
        }
    }

    /// 文字位置をバイトオフセットに変換する。
    fn byte_at(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// カーソル直前の1文字を削除する。
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.value.remove(at);
    }

    /// カーソル位置の1文字を削除する。
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// `|`カーソル付きの表示部分。カーソルが`width`列に収まるようスクロールする。
    pub fn visible_text(&self, width: usize) -> String {
        let offset = self.cursor.saturating_sub(width.saturating_sub(2));
        let chars: Vec<char> = self.value.chars().skip(offset).take(width).collect();
        let at = (self.cursor - offset).min(chars.len());
        let before: String = chars[..at].iter().collect();
        let after: String = chars[at..].iter().collect();
        format!("{before}|{after}")
    }
}

/// 現在のフレームに入力ポップアップを重ねて描画する。
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // プロンプト、入力値、空行、ヘルプ
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let prompt = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt, rows[0]);

    let value = Paragraph::new(state.visible_text(rows[1].width as usize))
        .style(Style::default().fg(Color::Green));
    f.render_widget(value, rows[1]);

    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, rows[3]);
}
