//! # Azure Storage 接続文字列
//!
//! `DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=core.windows.net`
//! 形式の接続文字列を解釈する。`BlobEndpoint=` が指定されている場合は
//! そのエンドポイントを使用する（Azurite等のエミュレータ向け）。

/// 接続文字列の解釈エラー
#[derive(Debug, thiserror::Error)]
pub enum ConnectionStringError {
    /// 接続文字列が空
    #[error("接続文字列が設定されていません")]
    Empty,
    /// `key=value` 形式でない要素
    #[error("接続文字列の要素が不正です: {0}")]
    MalformedSegment(String),
    /// 必須キーの欠落
    #[error("接続文字列に {0} がありません")]
    MissingKey(&'static str),
}

/// 解釈済みの接続文字列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    /// ストレージアカウント名
    pub account_name: String,
    /// Base64エンコードされたアカウントキー
    pub account_key: String,
    /// Blobサービスのエンドポイント（末尾 `/` なし）
    pub blob_endpoint: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        if raw.trim().is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(value),
                "accountname" => account_name = Some(value),
                "accountkey" => account_key = Some(value),
                "endpointsuffix" => endpoint_suffix = Some(value),
                "blobendpoint" => blob_endpoint = Some(value),
                // QueueEndpoint, SharedAccessSignature 等は使用しない
                _ => {}
            }
        }

        let account_name = account_name
            .filter(|v| !v.is_empty())
            .ok_or(ConnectionStringError::MissingKey("AccountName"))?;
        let account_key = account_key
            .filter(|v| !v.is_empty())
            .ok_or(ConnectionStringError::MissingKey("AccountKey"))?;

        let blob_endpoint = match blob_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or("https"),
                account_name,
                endpoint_suffix.as_deref().unwrap_or("core.windows.net")
            ),
        };

        Ok(Self {
            account_name,
            account_key,
            blob_endpoint,
        })
    }
}
