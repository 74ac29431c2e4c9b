//! # LexDrop Gateway
//!
//! 入力テキストを翻訳し、言語ごとのローカルファイルに追記し、
//! そのファイルをAzure Blob Storageへアップロードして
//! 読み取り専用のSASトークンを発行するWebサービス。
//!
//! ## 役割
//! - Azure Translatorによる翻訳（失敗時はリクエストを中断）
//! - 言語ごとの追記専用ファイルへの記録（言語単位で直列化）
//! - Blobへの上書きアップロード（失敗はソフト失敗）
//! - 共有キー署名による読み取り専用SASトークンの発行（失敗はソフト失敗）
//!
//! ## API エンドポイント
//! - `GET /` — 入力フォーム
//! - `POST /` — 翻訳 + 保存 + 結果ページ
//! - `POST /api/translations` — 同上（JSON）
//! - `GET /healthz` — 死活確認

mod config;
mod endpoints;
mod error;
mod journal;
mod pipeline;
mod render;
mod storage;
mod token;
mod translator;

#[cfg(test)]
mod test_helpers;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{GatewayConfig, GatewayState};
use crate::journal::TranslationJournal;
use crate::storage::AzureBlobStorage;
use crate::translator::AzureTranslator;

/// `LOG_FILE` 向けの非同期ライターを作成する。
///
/// ファイルはローテーションせず追記する。返り値のガードがドロップされると
/// 未出力のログが書き出される。
fn file_log_writer(
    path: &Path,
) -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("LOG_FILEにファイル名がありません: {}", path.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .with_context(|| format!("ログファイルを開けません: {}", path.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// ログ出力を初期化する。
///
/// `LOG_FILE` が指定されている場合は標準出力に加えてファイルにも書き出す。
/// 返り値のガードはプロセス終了まで保持すること。
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_log_writer(path)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("ログ出力の初期化に失敗: {e}"))?;

    Ok(guard)
}

/// ルーターを構築する。
fn build_router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route(
            "/",
            axum::routing::get(endpoints::handle_form).post(endpoints::handle_translate_form),
        )
        .route(
            "/api/translations",
            axum::routing::post(endpoints::handle_translate_json),
        )
        .route("/healthz", axum::routing::get(endpoints::handle_health))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .envは任意
    let dotenv = dotenvy::dotenv();

    let config = GatewayConfig::from_env()?;
    let _log_guard = init_tracing(config.log_file.as_deref())?;
    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), ".envを読み込みました");
    }
    config.warn_missing_storage_settings();

    let http_client = reqwest::Client::new();
    let state = Arc::new(GatewayState {
        translator: Box::new(AzureTranslator::new(
            http_client.clone(),
            config.translator.clone(),
        )),
        blob_storage: Box::new(AzureBlobStorage::new(http_client, config.storage.clone())),
        journal: TranslationJournal::new(&config.translations_dir),
        storage: config.storage.clone(),
        sas_lifetime_months: config.sas_lifetime_months,
        sas_require_upload: config.sas_require_upload,
    });
    tracing::info!(
        translations_dir = %state.journal.dir().display(),
        container = %config.storage.container_name,
        sas_lifetime_months = config.sas_lifetime_months,
        sas_require_upload = config.sas_require_upload,
        "Gatewayの設定を読み込みました"
    );

    let app = build_router(state);

    tracing::info!("Gatewayを {} で起動します", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("{} で待ち受けできません", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        start_mock_server, start_mock_translator, test_state, test_storage_config, MockBlobService,
    };

    /// LOG_FILEのディレクトリ・ファイル名に書き出されることを確認
    #[test]
    fn test_file_log_writer_writes_to_path() {
        use std::io::Write;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lexdrop.log");

        let (mut writer, guard) = file_log_writer(&path).unwrap();
        writer.write_all(b"gateway started\n").unwrap();
        drop(guard);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "gateway started\n");
    }

    /// ファイル名を持たないパスはエラーになることを確認
    #[test]
    fn test_file_log_writer_rejects_path_without_file_name() {
        for path in ["/", ".."] {
            let error = file_log_writer(Path::new(path)).err().unwrap();
            assert!(error.to_string().contains("LOG_FILE"), "{path}: {error}");
        }
    }

    /// 起動したGatewayに対し、フォームの表示から送信までHTTP経由で通ることを確認
    #[tokio::test]
    async fn test_router_end_to_end() {
        let (translator_port, _) =
            start_mock_translator(serde_json::json!([{"translations": [{"text": "bonjour"}]}])).await;
        let blobs = MockBlobService::new();
        let blob_port = start_mock_server(blobs.router()).await;
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(translator_port, test_storage_config(blob_port), tmp.path(), false);
        let gateway_port = start_mock_server(build_router(state)).await;
        let base = format!("http://127.0.0.1:{gateway_port}");
        let client = reqwest::Client::new();

        let form = client.get(format!("{base}/")).send().await.unwrap();
        assert!(form.status().is_success());
        assert!(form.text().await.unwrap().contains("name=\"language\""));

        let health = client.get(format!("{base}/healthz")).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let result = client
            .post(format!("{base}/"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("text=hello&language=fr")
            .send()
            .await
            .unwrap();
        assert!(result.status().is_success());
        let html = result.text().await.unwrap();
        assert!(html.contains(
            "https://lexdrop.blob.core.windows.net/translations/translated_file_fr.txt"
        ));
        assert!(html.contains("<code id=\"sas_token\">se="));

        let bad_language = client
            .post(format!("{base}/api/translations"))
            .json(&serde_json::json!({"text": "hello", "language": "../fr"}))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_language.status(), reqwest::StatusCode::BAD_REQUEST);

        assert_eq!(
            blobs.get("translations", "translated_file_fr.txt").unwrap(),
            b"\nhello:bonjour"
        );
    }
}
