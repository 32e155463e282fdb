//! 類似度チェックとアップロードの2フォームの状態と遷移。

use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

/// 類似度フォームが未入力のまま送信されたときのエラー。
pub const CHECK_REQUIRED_MSG: &str = "Both product code and image are required.";
/// アップロードフォームが未入力のまま送信されたときのエラー。
pub const UPLOAD_REQUIRED_MSG: &str = "Both product code and image are required for upload.";
/// チェック失敗にメッセージが無いときの代替文言。
pub const CHECK_UNKNOWN_MSG: &str = "An unknown error occurred";
/// アップロード失敗にメッセージが無いときの代替文言。
pub const UPLOAD_UNKNOWN_MSG: &str = "An error occurred while uploading the file.";
/// アップロード成功後に表示する確認メッセージ。
pub const UPLOAD_DONE_MSG: &str = "File uploaded successfully!";

/// 画像比較モデル。サービスへはインデックスで送る。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelChoice {
    #[default]
    MobileNet,
    Vgg16,
    DenseNet121,
}

impl ModelChoice {
    /// インデックス順の全候補。
    pub const ALL: [ModelChoice; 3] = [
        ModelChoice::MobileNet,
        ModelChoice::Vgg16,
        ModelChoice::DenseNet121,
    ];

    /// サービス側のインデックス。
    pub fn index(self) -> u8 {
        match self {
            ModelChoice::MobileNet => 0,
            ModelChoice::Vgg16 => 1,
            ModelChoice::DenseNet121 => 2,
        }
    }

    /// インデックスに対応するモデル（未知ならNone）。
    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.index() == i)
    }

    /// 表示名。
    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::MobileNet => "MobileNet",
            ModelChoice::Vgg16 => "VGG16",
            ModelChoice::DenseNet121 => "DenseNet121",
        }
    }

    /// 次の候補（末尾の次は先頭）。
    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len() as u8).unwrap_or_default()
    }
}

/// 類似度チェック1回分の送信内容。
#[derive(Clone, Debug)]
pub struct CheckRequest {
    /// ログ上で送信と完了を対応付けるID。
    pub id: Uuid,
    pub product_code: String,
    pub image: PathBuf,
    pub model: ModelChoice,
}

/// 画像アップロード1回分の送信内容。
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub id: Uuid,
    pub product_code: String,
    pub image: PathBuf,
}

/// フォームの入力値と、直近の類似度チェックの結果。
#[derive(Clone, Debug, Default)]
pub struct FormState {
    /// 両フォームで共有する品番。
    pub product_code: String,
    /// 類似度フォームで選択したファイル。
    pub check_image: Option<PathBuf>,
    /// アップロードフォームで選択したファイル。
    pub upload_image: Option<PathBuf>,
    /// 選択中のモデル。
    pub model: ModelChoice,
    /// 直近の類似度レスポンス本文（そのまま保持）。
    pub result: Option<Value>,
    /// 類似度リクエストの応答待ちの間だけtrue。
    pub loading: bool,
    /// 直近のユーザー向けエラー。
    pub error: Option<String>,
}

impl FormState {
    pub fn set_product_code(&mut self, code: impl Into<String>) {
        self.product_code = code.into();
    }

    pub fn set_check_image(&mut self, path: Option<PathBuf>) {
        self.check_image = path;
    }

    pub fn set_upload_image(&mut self, path: Option<PathBuf>) {
        self.upload_image = path;
    }

    pub fn set_model(&mut self, model: ModelChoice) {
        self.model = model;
    }

    pub fn cycle_model(&mut self) {
        self.set_model(self.model.next());
    }

    /// 類似度フォームを検証し、ローディング状態に入る。
    ///
    /// 必須項目が欠けていればエラーをセットしてNoneを返す（この場合は送信しない）。
    pub fn begin_check(&mut self) -> Option<CheckRequest> {
        let image = match &self.check_image {
            Some(p) if !self.product_code.is_empty() => p.clone(),
            _ => {
                self.error = Some(CHECK_REQUIRED_MSG.into());
                return None;
            }
        };
        self.error = None;
        self.result = None;
        self.loading = true;
        Some(CheckRequest {
            id: Uuid::new_v4(),
            product_code: self.product_code.clone(),
            image,
            model: self.model,
        })
    }

    /// 類似度リクエストの結果を反映し、ローディングを解除する。
    pub fn finish_check(&mut self, outcome: Result<Value, String>) {
        match outcome {
            Ok(body) => self.result = Some(body),
            Err(msg) => self.error = Some(non_empty_or(msg, CHECK_UNKNOWN_MSG)),
        }
        self.loading = false;
    }

    /// アップロードフォームを検証する。ローディングフラグには触れない。
    pub fn begin_upload(&mut self) -> Option<UploadRequest> {
        let image = match &self.upload_image {
            Some(p) if !self.product_code.is_empty() => p.clone(),
            _ => {
                self.error = Some(UPLOAD_REQUIRED_MSG.into());
                return None;
            }
        };
        Some(UploadRequest {
            id: Uuid::new_v4(),
            product_code: self.product_code.clone(),
            image,
        })
    }

    /// アップロード結果を反映する。成功通知を出すべきときはtrueを返す。
    pub fn finish_upload(&mut self, outcome: Result<(), String>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(msg) => {
                self.error = Some(non_empty_or(msg, UPLOAD_UNKNOWN_MSG));
                false
            }
        }
    }
}

fn non_empty_or(msg: String, fallback: &str) -> String {
    if msg.trim().is_empty() {
        fallback.to_string()
    } else {
        msg
    }
}
