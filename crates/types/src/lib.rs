//! # LexDrop 共有型定義
//!
//! フォーム入力、Azure Translator APIのリクエスト/レスポンス、
//! 翻訳パイプラインの処理結果（レシート）をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - 翻訳レコード・ファイル内容はすべてUTF-8
//! - `StepOutcome` は `status` タグ付きのJSONとしてシリアライズされる

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// フォーム入力
// ---------------------------------------------------------------------------

/// `POST /` のフォーム入力、および `POST /api/translations` のJSONボディ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateForm {
    /// 翻訳元テキスト（空文字列も許容）
    pub text: String,
    /// 翻訳先の言語コード (例: "fr", "ja", "zh-Hans")
    pub language: String,
}

// ---------------------------------------------------------------------------
// Azure Translator API (v3.0)
// ---------------------------------------------------------------------------

/// `/translate` リクエストボディの要素。ボディはこの配列となる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorRequestItem {
    /// 翻訳対象テキスト
    pub text: String,
}

/// `/translate` レスポンスの要素。入力テキストごとに1要素。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorResponseItem {
    /// 翻訳先言語ごとの翻訳結果
    pub translations: Vec<TranslatedText>,
}

/// 個別の翻訳結果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedText {
    /// 翻訳後テキスト
    pub text: String,
    /// 翻訳先言語コード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

// ---------------------------------------------------------------------------
// パイプライン結果
// ---------------------------------------------------------------------------

/// ソフト失敗を許容するステップの実行結果。
///
/// 「失敗したため値がない」と「実行されなかったため値がない」を区別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    /// ステップが成功した
    Succeeded {
        /// 成功時の値
        value: T,
    },
    /// ステップを実行したが失敗した（ログ出力済み）
    Failed {
        /// 失敗理由
        reason: String,
    },
    /// ステップを実行しなかった
    Skipped {
        /// 実行しなかった理由
        reason: String,
    },
}

impl<T> StepOutcome<T> {
    /// 成功時の値を返す。失敗・スキップ時は `None`。
    pub fn value(&self) -> Option<&T> {
        match self {
            StepOutcome::Succeeded { value } => Some(value),
            StepOutcome::Failed { .. } | StepOutcome::Skipped { .. } => None,
        }
    }

    /// 成功したかどうか。
    pub fn is_succeeded(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }

    /// 失敗・スキップの理由を返す。
    pub fn reason(&self) -> Option<&str> {
        match self {
            StepOutcome::Succeeded { .. } => None,
            StepOutcome::Failed { reason } | StepOutcome::Skipped { reason } => Some(reason),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for StepOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => StepOutcome::Succeeded { value },
            Err(e) => StepOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// 翻訳パイプライン1回分の処理結果。
///
/// 翻訳とローカル追記はハード失敗のため、レシートが存在する時点で成功している。
/// アップロードとSASトークン発行はソフト失敗として `StepOutcome` で表す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationReceipt {
    /// 翻訳元テキスト
    pub original_text: String,
    /// 翻訳後テキスト
    pub translated_text: String,
    /// 翻訳先言語コード
    pub language: String,
    /// アップロード先BlobのURL
    pub storage_url: StepOutcome<String>,
    /// 読み取り専用SASトークン（先頭の `?` を含まないクエリ文字列）
    pub sas_token: StepOutcome<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Translatorレスポンスの余分なフィールドを無視してパースできることを確認
    #[test]
    fn test_translator_response_ignores_extra_fields() {
        let body = r#"[{"detectedLanguage":{"language":"en","score":1.0},
            "translations":[{"text":"bonjour","to":"fr"}]}]"#;
        let items: Vec<TranslatorResponseItem> = serde_json::from_str(body).unwrap();
        assert_eq!(items[0].translations[0].text, "bonjour");
        assert_eq!(items[0].translations[0].to.as_deref(), Some("fr"));
    }

    /// translationsキーが欠けたレスポンスはパースエラーになることを確認
    #[test]
    fn test_translator_response_requires_translations() {
        let body = r#"[{"error":{"code":400036,"message":"The target language is not valid."}}]"#;
        assert!(serde_json::from_str::<Vec<TranslatorResponseItem>>(body).is_err());
    }

    /// StepOutcomeがstatusタグ付きでシリアライズされることを確認
    #[test]
    fn test_step_outcome_json_shape() {
        let ok: StepOutcome<String> = StepOutcome::Succeeded {
            value: "https://example".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "succeeded", "value": "https://example"})
        );

        let skipped: StepOutcome<String> = StepOutcome::Skipped {
            reason: "upload failed".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            serde_json::json!({"status": "skipped", "reason": "upload failed"})
        );
    }

    /// ResultからStepOutcomeへの変換で失敗理由が保持されることを確認
    #[test]
    fn test_step_outcome_from_result() {
        let failed: StepOutcome<String> = Err::<String, _>("接続文字列が不正です").into();
        assert!(!failed.is_succeeded());
        assert_eq!(failed.value(), None);
        assert_eq!(failed.reason(), Some("接続文字列が不正です"));

        let ok: StepOutcome<u32> = Ok::<u32, String>(7).into();
        assert_eq!(ok.value(), Some(&7));
        assert_eq!(ok.reason(), None);
    }
}
