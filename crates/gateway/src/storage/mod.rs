//! # Blob Storage
//!
//! 翻訳ファイルのアップロード先の抽象インターフェース。
//! Azure Blob Storage実装は `azure` サブモジュールを参照。

pub mod azure;
pub mod connection;

pub use azure::AzureBlobStorage;
pub use connection::ConnectionString;

use std::path::Path;

use crate::error::GatewayError;

/// Blob Storageの抽象インターフェース。
///
/// アップロードは常に上書きとなる。Blobはローカルファイル全体の写しであり、
/// 最新レコードだけを送る追記型の動作はしない。
#[async_trait::async_trait]
pub trait BlobStorage: Send + Sync {
    /// `local_path` の内容全体を `blob_name` としてアップロードし、公開URLを返す。
    async fn upload(&self, local_path: &Path, blob_name: &str) -> Result<String, GatewayError>;
}

/// Blobの公開URL `https://{account}.blob.core.windows.net/{container}/{blob}`。
pub fn public_blob_url(account_name: &str, container_name: &str, blob_name: &str) -> String {
    format!("https://{account_name}.blob.core.windows.net/{container_name}/{blob_name}")
}
