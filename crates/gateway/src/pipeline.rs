//! # 翻訳パイプライン
//!
//! 1リクエスト分の処理を直列に実行する。
//!
//! ```text
//! フォーム受信 → 翻訳 → ローカル追記 → アップロード → SASトークン発行 → 描画
//! ```
//!
//! - 翻訳・ローカル追記の失敗はハード失敗としてリクエストを中断する
//!   （翻訳に失敗した場合、ファイルには何も書き込まれない）。
//! - アップロード・SASトークン発行の失敗はログ出力のうえ `StepOutcome::Failed`
//!   としてレシートに記録し、処理を継続する。
//! - SASトークン発行はデフォルトではアップロード結果に関わらず実行する。
//!   `sas_require_upload` が有効な場合、アップロード失敗時は発行しない。

use lexdrop_types::{StepOutcome, TranslateForm, TranslationReceipt};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::journal;
use crate::token;

/// フォーム入力1件を処理し、レシートを返す。
pub async fn run(state: &GatewayState, form: TranslateForm) -> Result<TranslationReceipt, GatewayError> {
    let TranslateForm { text, language } = form;
    journal::validate_language(&language)?;

    let translated_text = state.translator.translate(&text, &language).await?;
    tracing::info!(language = %language, "翻訳が完了しました");

    let blob_name = journal::file_name(&language);

    // 追記からアップロード完了まで同一言語の書き込み権を保持し、
    // アップロードされる内容が常にレコード境界で揃うようにする
    let writer = state.journal.open(&language).await?;
    writer.append(&text, &translated_text).await?;

    let storage_url: StepOutcome<String> = state
        .blob_storage
        .upload(writer.path(), &blob_name)
        .await
        .inspect_err(|e| {
            tracing::error!(
                blob = %blob_name,
                path = %writer.path().display(),
                error = %e,
                "翻訳ファイルのアップロードに失敗しました"
            );
        })
        .into();
    drop(writer);

    let sas_token: StepOutcome<String> = if state.sas_require_upload && !storage_url.is_succeeded() {
        tracing::warn!(blob = %blob_name, "アップロードに失敗したためSASトークンを発行しません");
        StepOutcome::Skipped {
            reason: "アップロードが成功していないため発行しませんでした".to_string(),
        }
    } else {
        token::issue_token(&blob_name, state.sas_lifetime_months, &state.storage)
            .map(|issued| {
                tracing::debug!(
                    blob = %blob_name,
                    expires_at = %issued.expires_at,
                    "結果にSASトークンを付与します"
                );
                issued.token
            })
            .inspect_err(|e| {
                tracing::error!(
                    blob = %blob_name,
                    error = %e,
                    "SASトークンの発行に失敗しました"
                );
            })
            .into()
    };

    Ok(TranslationReceipt {
        original_text: text,
        translated_text,
        language,
        storage_url,
        sas_token,
    })
}
