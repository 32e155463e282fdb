//! キー割り当て（`shortcut.toml`で上書き可能）。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// すべてのキー割り当て。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub form: FormShortcuts,
    pub notice: NoticeShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// フォーム画面のキー割り当て。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormShortcuts {
    pub quit: Vec<String>,
    pub product_code: Vec<String>,
    pub check_image: Vec<String>,
    pub model: Vec<String>,
    pub check: Vec<String>,
    pub upload_image: Vec<String>,
    pub upload: Vec<String>,
}

/// アップロード完了通知の表示中のキー割り当て。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeShortcuts {
    pub dismiss: Vec<String>,
}

/// 入力ポップアップ内のキー割り当て。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込む。ファイルが無ければデフォルトを使う。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            form: FormShortcuts {
                quit: keys(&["q"]),
                product_code: keys(&["p"]),
                check_image: keys(&["i"]),
                model: keys(&["m"]),
                check: keys(&["Enter", "c"]),
                upload_image: keys(&["f"]),
                upload: keys(&["u"]),
            },
            notice: NoticeShortcuts {
                dismiss: keys(&["Enter", "Esc"]),
            },
            input_box: InputBoxShortcuts {
                confirm: keys(&["Enter"]),
                cancel: keys(&["Esc"]),
                backspace: keys(&["Backspace"]),
                delete: keys(&["Delete"]),
                left: keys(&["Left"]),
                right: keys(&["Right"]),
                home: keys(&["Home"]),
                end: keys(&["End"]),
                clear_line: keys(&["Ctrl+u"]),
            },
        }
    }
}

/// いずれかの割り当て文字列にキーが一致すればtrue。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts
        .iter()
        .any(|s| parse_shortcut(s).is_some_and(|(code, mods)| key.code == code && key.modifiers == mods))
}

/// `"q"`、`"Enter"`、`"Ctrl+u"`のような割り当てを解析する。
fn parse_shortcut(s: &str) -> Option<(KeyCode, KeyModifiers)> {
    let mut parts: Vec<&str> = s.split('+').collect();
    let key = parts.pop()?;

    let mut mods = KeyModifiers::empty();
    for m in parts {
        mods |= match m.to_ascii_lowercase().as_str() {
            "ctrl" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return None,
        };
    }

    let code = match key.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some((code, mods))
}

/// 割り当て一覧の表示用文字列（例: `Enter/c`）。
pub fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
