//! フォーム以外のUI状態（ステータス・ログ・通知）。

use std::collections::VecDeque;

/// 結果パネル用に保持するログ行数の上限。
const LOG_CAPACITY: usize = 200;

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 画面下部のステータス文言。
    pub status: String,
    /// 時刻付きのアクティビティログ。
    pub log: Vec<String>,
    /// 確認待ちの通知（アップロード成功1件につき1つ）。空でない間は閉じるキー以外を受け付けない。
    pub notices: VecDeque<String>,
}

impl UiState {
    /// 初期状態を作成する。
    pub fn new() -> Self {
        Self {
            status: "Ready".into(),
            log: vec![],
            notices: VecDeque::new(),
        }
    }

    /// ローカル時刻を付けてログへ1行追加する。
    pub fn push_log(&mut self, msg: impl AsRef<str>) {
        // 時刻のプレフィックスを作る。
        let ts = chrono::Local::now().format("%H:%M:%S");
        self.log.push(format!("[{ts}] {}", msg.as_ref()));
        // 上限を超えた古い行を捨てる。
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }

    /// 通知を末尾に積む。
    pub fn push_notice(&mut self, msg: impl Into<String>) {
        self.notices.push_back(msg.into());
    }

    /// 現在表示中の通知。
    pub fn current_notice(&self) -> Option<&str> {
        self.notices.front().map(String::as_str)
    }

    /// 表示中の通知を閉じて次へ進む。
    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_log_is_bounded() {
        // 上限を超えて追加し、古い行が捨てられることを検証する。
        let mut ui = UiState::new();
        for i in 0..(LOG_CAPACITY + 5) {
            ui.push_log(format!("line {i}"));
        }
        assert_eq!(ui.log.len(), LOG_CAPACITY);
        assert!(ui.log[0].ends_with("line 5"));
    }

    #[test]
    fn test_notices_are_shown_in_order() {
        // 積んだ順に1件ずつ表示されることを検証する。
        let mut ui = UiState::new();
        ui.push_notice("first");
        ui.push_notice("second");
        assert_eq!(ui.current_notice(), Some("first"));
        ui.dismiss_notice();
        assert_eq!(ui.current_notice(), Some("second"));
        ui.dismiss_notice();
        assert_eq!(ui.current_notice(), None);
        // 空のときに閉じても何も起きない。
        ui.dismiss_notice();
        assert!(ui.notices.is_empty());
    }
}
