//! メイン画面とポップアップのレイアウト計算。

use ratatui::prelude::*;

/// 画面全体の縦分割。
pub struct MainLayout {
    /// フォームと結果パネル。
    pub body: Rect,
    /// ヘルプバー。
    pub help_bar: Rect,
    /// ステータスバー。
    pub status_bar: Rect,
}

/// 本体の左右分割。
pub struct BodyLayout {
    pub form_panel: Rect,
    pub result_panel: Rect,
}

/// 本体・ヘルプ(3行)・ステータス(3行)に縦分割する。
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

pub fn create_body_layout(area: Rect) -> BodyLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    BodyLayout {
        form_panel: chunks[0],
        result_panel: chunks[1],
    }
}

/// 幅`width_percent`%、高さ`height`行の中央寄せ矩形。
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // 縦方向に中央の帯を切り出し、その中で横方向に中央を取る。
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(rows[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_layout_reserves_bars() {
        let l = create_main_layout(Rect::new(0, 0, 100, 40));
        assert_eq!(l.help_bar.height, 3);
        assert_eq!(l.status_bar.height, 3);
        assert_eq!(l.body.height, 34);
    }

    #[test]
    fn test_centered_popup_fits() {
        let area = Rect::new(0, 0, 100, 40);
        let p = centered_popup(area, 60, 7);
        assert_eq!(p.height, 7);
        assert!(p.x > 0 && p.right() < area.right());
    }
}
