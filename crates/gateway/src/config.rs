//! # Gateway設定・共有状態
//!
//! 環境変数（および任意の `.env` ファイル）からの設定読み込みと
//! Gatewayの共有状態の定義。設定は起動時に一度だけ構築し、
//! 各リクエストには `Arc<GatewayState>` 経由で参照として渡す。

use std::path::PathBuf;

use anyhow::Context;

use crate::journal::TranslationJournal;
use crate::storage::BlobStorage;
use crate::translator::Translator;

/// 待ち受けアドレスのデフォルト値
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// 翻訳ファイルを置くディレクトリ名（カレントディレクトリ直下）
const DEFAULT_TRANSLATIONS_DIR: &str = "translations";

/// Azure Translatorの接続設定。
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// サブスクリプションキー (`KEY`)
    pub key: String,
    /// エンドポイントURL (`ENDPOINT`)
    pub endpoint: String,
    /// リソースのリージョン (`LOCATION`)。グローバルリソースの場合はNone。
    pub region: Option<String>,
}

/// Azure Storageの接続設定。
///
/// 接続文字列の解釈はアップロード・トークン発行のたびに行う。
/// 不正な接続文字列は起動を妨げず、該当ステップのソフト失敗となる。
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// ストレージアカウント接続文字列 (`STORAGEACCOUNT_CONNECTION_STRING`)
    pub connection_string: String,
    /// コンテナ名 (`CONTAINER_NAME`)
    pub container_name: String,
    /// 公開URLに使用するアカウント名 (`STORAGE_ACCOUNT_NAME`)
    pub account_name: String,
}

/// Gateway全体の設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 翻訳API設定
    pub translator: TranslatorConfig,
    /// Blob Storage設定
    pub storage: StorageConfig,
    /// SASトークンの有効期間（月数） (`SASTOKEN_LIFE`)
    pub sas_lifetime_months: u32,
    /// trueの場合、アップロード失敗時はSASトークンを発行しない (`SAS_REQUIRE_UPLOAD`)
    pub sas_require_upload: bool,
    /// 翻訳ファイルの保存先 (`TRANSLATIONS_DIR`)
    pub translations_dir: PathBuf,
    /// 待ち受けアドレス (`BIND_ADDR`)
    pub bind_addr: String,
    /// ログの追加出力先ファイル (`LOG_FILE`)
    pub log_file: Option<PathBuf>,
}

impl GatewayConfig {
    /// プロセス環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から構築する。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            non_empty(key).with_context(|| format!("環境変数 {key} が設定されていません"))
        };

        let translator = TranslatorConfig {
            key: required("KEY")?,
            endpoint: required("ENDPOINT")?,
            region: non_empty("LOCATION"),
        };

        let storage = StorageConfig {
            connection_string: non_empty("STORAGEACCOUNT_CONNECTION_STRING").unwrap_or_default(),
            container_name: non_empty("CONTAINER_NAME").unwrap_or_default(),
            account_name: non_empty("STORAGE_ACCOUNT_NAME").unwrap_or_default(),
        };
        let sas_lifetime_raw = required("SASTOKEN_LIFE")?;
        let sas_lifetime_months: u32 = sas_lifetime_raw.trim().parse().with_context(|| {
            format!("SASTOKEN_LIFEは0以上の整数（月数）である必要があります: {sas_lifetime_raw}")
        })?;

        let sas_require_upload = match non_empty("SAS_REQUIRE_UPLOAD") {
            Some(v) => parse_bool(&v)
                .with_context(|| format!("SAS_REQUIRE_UPLOADはtrue/falseで指定してください: {v}"))?,
            None => false,
        };

        let translations_dir = match non_empty("TRANSLATIONS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()
                .context("カレントディレクトリの取得に失敗")?
                .join(DEFAULT_TRANSLATIONS_DIR),
        };

        Ok(Self {
            translator,
            storage,
            sas_lifetime_months,
            sas_require_upload,
            translations_dir,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_file: non_empty("LOG_FILE").map(PathBuf::from),
        })
    }
}

impl GatewayConfig {
    /// 未設定のストレージ関連環境変数名。
    pub fn missing_storage_settings(&self) -> Vec<&'static str> {
        [
            ("STORAGEACCOUNT_CONNECTION_STRING", &self.storage.connection_string),
            ("CONTAINER_NAME", &self.storage.container_name),
            ("STORAGE_ACCOUNT_NAME", &self.storage.account_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    /// 未設定のストレージ設定を警告として出力する。
    ///
    /// 起動は継続し、該当ステップはリクエストごとにソフト失敗となる。
    /// ログ出力の初期化後に呼び出すこと。
    pub fn warn_missing_storage_settings(&self) {
        for key in self.missing_storage_settings() {
            tracing::warn!(
                variable = key,
                "ストレージ設定が未設定です。アップロード・SASトークン発行は失敗します"
            );
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 翻訳クライアント（トレイトで抽象化）
    pub translator: Box<dyn Translator>,
    /// Blobアップローダー（トレイトで抽象化）
    pub blob_storage: Box<dyn BlobStorage>,
    /// 言語ごとの追記専用ローカルファイル
    pub journal: TranslationJournal,
    /// SASトークン発行に使用するストレージ設定
    pub storage: StorageConfig,
    /// SASトークンの有効期間（月数）
    pub sas_lifetime_months: u32,
    /// アップロード失敗時にSASトークン発行をスキップするか
    pub sas_require_upload: bool,
}
