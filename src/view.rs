//! フォームの結果を表示行へ変換する（読み取り専用）。

use serde_json::Value;

use crate::form::FormState;

/// フォーム状態から決まる結果パネルの表示内容。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultView {
    /// エラーブロックの文言。
    pub error: Option<String>,
    /// 結果ブロックの行。Noneならブロック自体を出さない。
    pub result: Option<Vec<String>>,
}

impl ResultView {
    /// 状態から表示内容を作る。状態は変更しない。
    pub fn from_state(state: &FormState) -> Self {
        Self {
            error: state.error.clone().filter(|e| !e.is_empty()),
            result: state.result.as_ref().and_then(result_lines),
        }
    }

    /// 表示するものが無ければtrue。
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.result.is_none()
    }
}

/// レスポンス本文の表示行。本文がnullならNone。
///
/// 本文はあるが`status.status`が使えない場合は空のブロックになる。
fn result_lines(body: &Value) -> Option<Vec<String>> {
    if body.is_null() {
        return None;
    }
    let mut lines = vec![];
    let Some(status) = body.get("status").filter(|s| truthy(s)) else {
        return Some(lines);
    };
    let Some(verdict) = status.get("status").filter(|v| truthy(v)) else {
        return Some(lines);
    };

    lines.push(format!("Status: {}", scalar_text(verdict)));
    if let Some(v) = status.get("similarity").and_then(Value::as_f64) {
        lines.push(format!("Similarity: {}", percent(v)));
    }
    if let Some(v) = status.get("highest_similarity").and_then(Value::as_f64) {
        lines.push(format!("Highest Similarity: {}", percent(v)));
    }
    if let Some(p) = status
        .get("file_path")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
    {
        lines.push(format!("File Path: {p}"));
    }
    Some(lines)
}

/// 割合を小数2桁のパーセント表記にする。
pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Webクライアントと同じ基準でJSON値の真偽を判定する。
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 文字列は引用符なし、それ以外はコンパクトなJSONで表示する。
fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
