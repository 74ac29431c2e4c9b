//! # SASトークン発行
//!
//! アップロードしたBlobに対して、アカウント共有キーで署名した
//! 読み取り専用のService SASを発行する。有効期限は発行時刻に
//! 設定された月数を加えた時刻（暦月単位、月末は切り詰め）。
//!
//! Blobの存在確認は行わない。

use chrono::{DateTime, Months, SubsecRound, Utc};
use lexdrop_crypto::{decode_account_key, generate_blob_sas, BlobSasParams};

use crate::config::StorageConfig;
use crate::error::GatewayError;
use crate::storage::ConnectionString;

/// SASのサービスバージョン (`sv`)
pub const SAS_VERSION: &str = "2022-11-02";

/// SASの権限。読み取りのみ。
const SAS_PERMISSIONS: &str = "r";

/// `se` の時刻形式
const SAS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 発行済みSASトークン。
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// 先頭の `?` を含まないクエリ文字列
    pub token: String,
    /// 有効期限（秒単位に切り詰め済み）
    pub expires_at: DateTime<Utc>,
}

/// 有効期限を計算する。
pub fn sas_expiry(now: DateTime<Utc>, lifetime_months: u32) -> Result<DateTime<Utc>, GatewayError> {
    now.trunc_subsecs(0)
        .checked_add_months(Months::new(lifetime_months))
        .ok_or_else(|| {
            GatewayError::Signing(format!("有効期限が表現可能な範囲を超えています: {lifetime_months}か月"))
        })
}

/// 現在時刻を基準にSASトークンを発行する。
pub fn issue_token(
    blob_name: &str,
    lifetime_months: u32,
    storage: &StorageConfig,
) -> Result<IssuedToken, GatewayError> {
    issue_token_at(blob_name, lifetime_months, storage, Utc::now())
}

/// 指定時刻を基準にSASトークンを発行する。
pub fn issue_token_at(
    blob_name: &str,
    lifetime_months: u32,
    storage: &StorageConfig,
    now: DateTime<Utc>,
) -> Result<IssuedToken, GatewayError> {
    let connection = ConnectionString::parse(&storage.connection_string)
        .map_err(|e| GatewayError::Signing(e.to_string()))?;
    let account_key = decode_account_key(&connection.account_key)?;

    let expires_at = sas_expiry(now, lifetime_months)?;
    let signed_expiry = expires_at.format(SAS_TIME_FORMAT).to_string();

    let token = generate_blob_sas(
        &BlobSasParams {
            account: &connection.account_name,
            container: &storage.container_name,
            blob: blob_name,
            permissions: SAS_PERMISSIONS,
            signed_expiry: &signed_expiry,
            version: SAS_VERSION,
        },
        &account_key,
    )?;

    tracing::info!(
        blob = %blob_name,
        container = %storage.container_name,
        expires_at = %signed_expiry,
        "SASトークンを発行しました"
    );

    Ok(IssuedToken { token, expires_at })
}
