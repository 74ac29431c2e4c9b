//! # 翻訳ジャーナル（ローカル追記ストア）
//!
//! 翻訳先言語ごとに `translated_file_<language>.txt` を追記専用で保持する。
//! 各レコードは改行の後に `原文:訳文` を書き込む。
//!
//! 同一言語への書き込みは言語ごとの非同期Mutexで直列化する。
//! 書き込み権（`JournalWriter`）を保持している間は、他のリクエストが
//! 同じファイルに追記することはない。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::sync::OwnedMutexGuard;

use crate::error::GatewayError;

/// 言語コードの最大長（BCP 47の実用範囲）
const MAX_LANGUAGE_LEN: usize = 35;

/// 言語コードに対応するファイル名（＝Blob名）。
pub fn file_name(language: &str) -> String {
    format!("translated_file_{language}.txt")
}

/// 言語コードがファイル名の一部として安全かを検査する。
///
/// 翻訳APIが受け付けるかどうかは検査しない。
pub fn validate_language(language: &str) -> Result<(), GatewayError> {
    let valid = !language.is_empty()
        && language.len() <= MAX_LANGUAGE_LEN
        && language
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(GatewayError::BadRequest(format!(
            "言語コードは翻訳ファイル名に使用するため、英数字とハイフン（最大{MAX_LANGUAGE_LEN}文字）に\
             限られます。対応言語かどうかの判定ではありません: {language:?}"
        )))
    }
}

/// 言語ごとの翻訳ファイルを管理する。
pub struct TranslationJournal {
    dir: PathBuf,
    writers: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TranslationJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// ジャーナルのディレクトリ。
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 言語コードに対応するファイルパス。
    pub fn path_for(&self, language: &str) -> PathBuf {
        self.dir.join(file_name(language))
    }

    /// 指定言語の書き込み権を取得する。他の書き込み権が解放されるまで待機する。
    pub async fn open(&self, language: &str) -> Result<JournalWriter, GatewayError> {
        validate_language(language)?;

        let lock = {
            let mut writers = self
                .writers
                .lock()
                .map_err(|e| GatewayError::Internal(format!("ジャーナルのロック取得に失敗: {e}")))?;
            writers
                .entry(language.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;

        Ok(JournalWriter {
            dir: self.dir.clone(),
            path: self.path_for(language),
            _guard: guard,
        })
    }
}

/// 1言語分の排他的な書き込み権。ドロップ時に解放される。
pub struct JournalWriter {
    dir: PathBuf,
    path: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl JournalWriter {
    /// 書き込み先のファイルパス。
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 改行に続けて `original_text:translated_text` を追記する。
    pub async fn append(&self, original_text: &str, translated_text: &str) -> Result<(), GatewayError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            GatewayError::Journal(format!("ディレクトリ作成失敗 {}: {e}", self.dir.display()))
        })?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                GatewayError::Journal(format!("ファイルオープン失敗 {}: {e}", self.path.display()))
            })?;

        let record = format!("\n{original_text}:{translated_text}");
        file.write_all(record.as_bytes())
            .await
            .map_err(|e| GatewayError::Journal(format!("書き込み失敗 {}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| GatewayError::Journal(format!("書き込み失敗 {}: {e}", self.path.display())))?;

        tracing::debug!(path = %self.path.display(), "翻訳レコードを追記しました");
        Ok(())
    }
}
