//! # LexDrop 署名処理
//!
//! Azure Storageのアカウント共有キーを用いた署名プリミティブを提供する。
//!
//! ## 署名アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | Put Blob等のリクエスト認可 | Shared Key (HMAC-SHA256) |
//! | Blob単位の読み取りトークン | Service SAS (HMAC-SHA256) |
//!
//! 共有キーは接続文字列の `AccountKey`（Base64）をデコードしたバイト列。
//! ユーザー委任キーは扱わない。

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// SASクエリ値のエンコード対象。RFC 3986の非予約文字以外をすべてエンコードする。
const SAS_QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// 署名処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// アカウントキーのBase64デコードエラー
    #[error("アカウントキーのBase64デコードに失敗しました: {0}")]
    InvalidAccountKey(String),
    /// HMACの鍵設定エラー
    #[error("HMAC鍵の設定に失敗しました: {0}")]
    HmacKey(String),
    /// 署名パラメータの不足
    #[error("署名パラメータが不足しています: {0}")]
    MissingParameter(&'static str),
}

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// 接続文字列の `AccountKey` をデコードする。
pub fn decode_account_key(account_key: &str) -> Result<Vec<u8>, CryptoError> {
    b64()
        .decode(account_key.trim())
        .map_err(|e| CryptoError::InvalidAccountKey(e.to_string()))
}

/// HMAC-SHA256を計算し、Base64エンコードして返す。
pub fn hmac_sha256_base64(key: &[u8], message: &[u8]) -> Result<String, CryptoError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::HmacKey(e.to_string()))?;
    mac.update(message);
    Ok(b64().encode(mac.finalize().into_bytes()))
}

// ---------------------------------------------------------------------------
// Shared Key 認可
// ---------------------------------------------------------------------------

/// Shared Key認可の署名対象となるリクエスト要素。
pub struct SharedKeyRequest<'a> {
    /// HTTPメソッド (例: "PUT")
    pub method: &'a str,
    /// Content-Length。0の場合は空文字列として署名する。
    pub content_length: usize,
    /// Content-Type
    pub content_type: &'a str,
    /// `x-ms-` ヘッダー（順不同、名前は小文字化して正規化する）
    pub ms_headers: &'a [(&'a str, &'a str)],
    /// 正規化リソース `/{account}{エンコード済みURLパス}`
    pub canonicalized_resource: &'a str,
}

/// Shared Key認可の署名対象文字列を構築する。
///
/// ```text
/// VERB\nContent-Encoding\nContent-Language\nContent-Length\nContent-MD5\n
/// Content-Type\nDate\nIf-Modified-Since\nIf-Match\nIf-None-Match\n
/// If-Unmodified-Since\nRange\nCanonicalizedHeaders\nCanonicalizedResource
/// ```
pub fn shared_key_string_to_sign(request: &SharedKeyRequest<'_>) -> String {
    let content_length = match request.content_length {
        0 => String::new(),
        len => len.to_string(),
    };

    let mut headers: Vec<(String, &str)> = request
        .ms_headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .filter(|(name, _)| name.starts_with("x-ms-"))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let mut canonicalized_headers = String::new();
    for (name, value) in &headers {
        canonicalized_headers.push_str(name);
        canonicalized_headers.push(':');
        canonicalized_headers.push_str(value);
        canonicalized_headers.push('\n');
    }

    format!(
        "{}\n\n\n{}\n\n{}\n\n\n\n\n\n\n{}{}",
        request.method,
        content_length,
        request.content_type,
        canonicalized_headers,
        request.canonicalized_resource
    )
}

/// `Authorization` ヘッダー値 `SharedKey {account}:{signature}` を生成する。
pub fn shared_key_authorization(
    account: &str,
    account_key: &[u8],
    request: &SharedKeyRequest<'_>,
) -> Result<String, CryptoError> {
    let string_to_sign = shared_key_string_to_sign(request);
    let signature = hmac_sha256_base64(account_key, string_to_sign.as_bytes())?;
    Ok(format!("SharedKey {account}:{signature}"))
}

// ---------------------------------------------------------------------------
// Service SAS
// ---------------------------------------------------------------------------

/// Blob単位のService SASパラメータ。
pub struct BlobSasParams<'a> {
    /// ストレージアカウント名
    pub account: &'a str,
    /// コンテナ名
    pub container: &'a str,
    /// Blob名
    pub blob: &'a str,
    /// 権限 (`sp`)。読み取り専用なら "r"。
    pub permissions: &'a str,
    /// 有効期限 (`se`)。`YYYY-MM-DDThh:mm:ssZ` 形式のUTC時刻。
    pub signed_expiry: &'a str,
    /// サービスバージョン (`sv`)。2020-12-06以降の署名形式。
    pub version: &'a str,
}

/// Blob SASの署名対象文字列を構築する（サービスバージョン2020-12-06以降）。
///
/// 開始時刻・IP・プロトコル・スナップショット・暗号化スコープ・
/// レスポンスヘッダー上書きは使用しないため空欄となる。
pub fn blob_sas_string_to_sign(params: &BlobSasParams<'_>) -> String {
    let canonicalized_resource = format!(
        "/blob/{}/{}/{}",
        params.account, params.container, params.blob
    );
    [
        params.permissions,
        "", // signedStart
        params.signed_expiry,
        canonicalized_resource.as_str(),
        "", // signedIdentifier
        "", // signedIP
        "", // signedProtocol
        params.version,
        "b", // signedResource
        "", // signedSnapshotTime
        "", // signedEncryptionScope
        "", // rscc
        "", // rscd
        "", // rsce
        "", // rscl
        "", // rsct
    ]
    .join("\n")
}

/// Blob SASトークンを生成する。
///
/// 返り値は先頭の `?` を含まないクエリ文字列
/// (`se=..&sp=..&sv=..&sr=b&sig=..`)。
pub fn generate_blob_sas(
    params: &BlobSasParams<'_>,
    account_key: &[u8],
) -> Result<String, CryptoError> {
    if params.account.is_empty() {
        return Err(CryptoError::MissingParameter("account"));
    }
    if params.container.is_empty() {
        return Err(CryptoError::MissingParameter("container"));
    }
    if params.blob.is_empty() {
        return Err(CryptoError::MissingParameter("blob"));
    }

    let string_to_sign = blob_sas_string_to_sign(params);
    let signature = hmac_sha256_base64(account_key, string_to_sign.as_bytes())?;

    let encode = |value: &str| utf8_percent_encode(value, SAS_QUERY_ENCODE_SET).to_string();
    Ok(format!(
        "se={}&sp={}&sv={}&sr=b&sig={}",
        encode(params.signed_expiry),
        encode(params.permissions),
        encode(params.version),
        encode(&signature)
    ))
}
