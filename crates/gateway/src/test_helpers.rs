//! # テスト用共通ヘルパー
//!
//! 翻訳API・Blob Storageのモックサーバーと、テスト用GatewayStateの構築。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use lexdrop_crypto::{decode_account_key, shared_key_authorization, SharedKeyRequest};

use crate::config::{GatewayState, StorageConfig, TranslatorConfig};
use crate::journal::TranslationJournal;
use crate::storage::AzureBlobStorage;
use crate::translator::AzureTranslator;

/// テスト用アカウントキー（`lexdrop-test-account-key-0123456789` のBase64）
pub const TEST_ACCOUNT_KEY: &str = "bGV4ZHJvcC10ZXN0LWFjY291bnQta2V5LTAxMjM0NTY3ODk=";

/// テスト用モックHTTPサーバーを起動し、ポート番号を返す。
pub async fn start_mock_server(app: axum::Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    port
}

/// 固定のJSONを返すモック翻訳APIを起動する。受信した `to` パラメータを記録する。
pub async fn start_mock_translator(response: serde_json::Value) -> (u16, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let app = axum::Router::new().route(
        "/translate",
        axum::routing::post(
            move |axum::extract::Query(query): axum::extract::Query<HashMap<String, String>>| {
                let response = response.clone();
                let recorded = recorded.clone();
                async move {
                    recorded
                        .lock()
                        .unwrap()
                        .push(query.get("to").cloned().unwrap_or_default());
                    Json(response)
                }
            },
        ),
    );
    (start_mock_server(app).await, calls)
}

/// Put Blobを受け付けるモックBlob Storage。
///
/// Shared Key署名を `TEST_ACCOUNT_KEY` で検証し、不一致なら403を返す。
#[derive(Clone, Default)]
pub struct MockBlobService {
    blobs: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
}

impl MockBlobService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みBlobの内容。
    pub fn get(&self, container: &str, blob: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .route("/{container}/{blob}", axum::routing::put(mock_put_blob))
            .with_state(self.clone())
    }
}

async fn mock_put_blob(
    State(service): State<MockBlobService>,
    UrlPath((container, blob)): UrlPath<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    if header("x-ms-blob-type") != "BlockBlob" {
        return StatusCode::BAD_REQUEST;
    }

    let authorization = header("authorization");
    let Some((account, _)) = authorization
        .strip_prefix("SharedKey ")
        .and_then(|rest| rest.split_once(':'))
    else {
        return StatusCode::FORBIDDEN;
    };

    let date = header("x-ms-date");
    let version = header("x-ms-version");
    let content_type = header("content-type");
    let ms_headers = [
        ("x-ms-blob-type", "BlockBlob"),
        ("x-ms-date", date.as_str()),
        ("x-ms-version", version.as_str()),
    ];
    let resource = format!("/{account}{}", uri.path());
    let key = decode_account_key(TEST_ACCOUNT_KEY).unwrap();
    let expected = shared_key_authorization(
        account,
        &key,
        &SharedKeyRequest {
            method: "PUT",
            content_length: body.len(),
            content_type: &content_type,
            ms_headers: &ms_headers,
            canonicalized_resource: &resource,
        },
    )
    .unwrap();
    if expected != authorization {
        return StatusCode::FORBIDDEN;
    }

    service
        .blobs
        .lock()
        .unwrap()
        .insert((container, blob), body.to_vec());
    StatusCode::CREATED
}

/// モックBlob Storageを指すストレージ設定。
pub fn test_storage_config(blob_port: u16) -> StorageConfig {
    StorageConfig {
        connection_string: format!(
            "DefaultEndpointsProtocol=http;AccountName=devaccount;\
             AccountKey={TEST_ACCOUNT_KEY};BlobEndpoint=http://127.0.0.1:{blob_port}"
        ),
        container_name: "translations".to_string(),
        account_name: "lexdrop".to_string(),
    }
}

/// モックサーバー群を指すテスト用GatewayStateを構築する。
pub fn test_state(
    translator_port: u16,
    storage: StorageConfig,
    journal_dir: &Path,
    sas_require_upload: bool,
) -> Arc<GatewayState> {
    let http_client = reqwest::Client::new();
    Arc::new(GatewayState {
        translator: Box::new(AzureTranslator::new(
            http_client.clone(),
            TranslatorConfig {
                key: "test-key".to_string(),
                endpoint: format!("http://127.0.0.1:{translator_port}"),
                region: Some("westeurope".to_string()),
            },
        )),
        blob_storage: Box::new(AzureBlobStorage::new(http_client, storage.clone())),
        journal: TranslationJournal::new(journal_dir),
        storage,
        sas_lifetime_months: 6,
        sas_require_upload,
    })
}
