//! # GET /healthz

/// GET /healthz — 死活確認。外部サービスへの疎通は確認しない。
pub async fn handle_health() -> &'static str {
    "ok"
}
