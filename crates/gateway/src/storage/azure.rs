//! # Azure Blob Storage 実装
//!
//! Blob REST APIの Put Blob をShared Key認可で呼び出す。
//! Put Blobは既存Blobを常に置き換えるため、アップロードは上書きとなる。

use std::path::Path;

use lexdrop_crypto::{decode_account_key, shared_key_authorization, SharedKeyRequest};

use super::{public_blob_url, BlobStorage, ConnectionString};
use crate::config::StorageConfig;
use crate::error::GatewayError;

/// Blob REST APIのバージョン
pub const STORAGE_API_VERSION: &str = "2022-11-02";

/// 翻訳ファイルのContent-Type
const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Azure Blob Storageによるアップロード実装。
pub struct AzureBlobStorage {
    http_client: reqwest::Client,
    config: StorageConfig,
}

impl AzureBlobStorage {
    pub fn new(http_client: reqwest::Client, config: StorageConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Put Blobを1回発行する。
    async fn put_blob(
        &self,
        connection: &ConnectionString,
        blob_name: &str,
        data: Vec<u8>,
    ) -> Result<(), GatewayError> {
        let url = reqwest::Url::parse(&format!(
            "{}/{}/{}",
            connection.blob_endpoint, self.config.container_name, blob_name
        ))
        .map_err(|e| GatewayError::Storage(format!("BlobのURL構築に失敗: {e}")))?;

        let account_key = decode_account_key(&connection.account_key)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let canonicalized_resource = format!("/{}{}", connection.account_name, url.path());
        let ms_headers = [
            ("x-ms-blob-type", "BlockBlob"),
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];
        let authorization = shared_key_authorization(
            &connection.account_name,
            &account_key,
            &SharedKeyRequest {
                method: "PUT",
                content_length: data.len(),
                content_type: CONTENT_TYPE,
                ms_headers: &ms_headers,
                canonicalized_resource: &canonicalized_resource,
            },
        )
        .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let response = self
            .http_client
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .body(data)
            .send()
            .await
            .map_err(|e| GatewayError::Storage(format!("HTTP送信失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Storage(format!(
                "Put Blobが失敗しました: HTTP {} - {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStorage for AzureBlobStorage {
    async fn upload(&self, local_path: &Path, blob_name: &str) -> Result<String, GatewayError> {
        if self.config.container_name.is_empty() {
            return Err(GatewayError::Storage(
                "CONTAINER_NAMEが設定されていません".to_string(),
            ));
        }
        let connection = ConnectionString::parse(&self.config.connection_string)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            GatewayError::Storage(format!("ファイル読み込み失敗 {}: {e}", local_path.display()))
        })?;
        let size = data.len();

        self.put_blob(&connection, blob_name, data).await?;

        let account_name = if self.config.account_name.is_empty() {
            &connection.account_name
        } else {
            &self.config.account_name
        };
        let url = public_blob_url(account_name, &self.config.container_name, blob_name);
        tracing::info!(
            blob = %blob_name,
            bytes = size,
            url = %url,
            "翻訳ファイルをアップロードしました"
        );
        Ok(url)
    }
}
