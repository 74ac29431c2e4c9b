//! # Gateway エラー型
//!
//! 翻訳・ローカル追記の失敗はリクエストを中断するハード失敗としてこの型で返す。
//! アップロード・SASトークン発行の失敗もこの型で表すが、
//! パイプライン側で `StepOutcome::Failed` に変換される（ソフト失敗）。

use axum::http::StatusCode;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 翻訳APIの呼び出し、またはレスポンスの解釈に失敗
    #[error("翻訳に失敗: {0}")]
    Translation(String),
    /// ローカル翻訳ファイルへの追記に失敗
    #[error("翻訳ファイルへの追記に失敗: {0}")]
    Journal(String),
    /// Blob Storage操作に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
    /// SASトークンの署名に失敗
    #[error("SASトークンの発行に失敗: {0}")]
    Signing(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Translation(_) | GatewayError::Storage(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Journal(_) | GatewayError::Signing(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

impl From<lexdrop_crypto::CryptoError> for GatewayError {
    fn from(e: lexdrop_crypto::CryptoError) -> Self {
        GatewayError::Signing(e.to_string())
    }
}
