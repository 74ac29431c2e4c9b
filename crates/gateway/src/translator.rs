//! # 翻訳クライアント
//!
//! Azure Translator API v3.0 の `/translate` を1回呼び出し、
//! 最初の翻訳結果を取り出す。言語コードの妥当性はリモート側に委ねる。
//! 失敗はすべてハード失敗（`GatewayError::Translation`）として返す。

use lexdrop_types::{TranslatorRequestItem, TranslatorResponseItem};

use crate::config::TranslatorConfig;
use crate::error::GatewayError;

/// Translator APIのバージョン
const API_VERSION: &str = "3.0";

/// 翻訳クライアントの抽象インターフェース。
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// `text` を `target_language` に翻訳する。
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, GatewayError>;
}

/// Azure Translatorによる翻訳クライアント実装。
pub struct AzureTranslator {
    http_client: reqwest::Client,
    config: TranslatorConfig,
}

impl AzureTranslator {
    pub fn new(http_client: reqwest::Client, config: TranslatorConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn translate_url(&self) -> String {
        format!("{}/translate", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl Translator for AzureTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, GatewayError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let body = [TranslatorRequestItem {
            text: text.to_string(),
        }];

        let mut request = self
            .http_client
            .post(self.translate_url())
            .query(&[("api-version", API_VERSION), ("to", target_language)])
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("X-ClientTraceId", &trace_id)
            .json(&body);
        if let Some(region) = &self.config.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        tracing::debug!(
            language = %target_language,
            trace_id = %trace_id,
            "翻訳APIを呼び出します"
        );

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Translation(format!("HTTP送信失敗: {e}")))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| GatewayError::Translation(format!("レスポンス読み取り失敗: {e}")))?;

        if !status.is_success() {
            return Err(GatewayError::Translation(format!(
                "翻訳APIがエラーを返しました: HTTP {} - {}",
                status, response_body
            )));
        }

        extract_translation(&response_body)
    }
}

/// レスポンスボディから `[0].translations[0].text` を取り出す。
pub(crate) fn extract_translation(response_body: &str) -> Result<String, GatewayError> {
    let items: Vec<TranslatorResponseItem> = serde_json::from_str(response_body)
        .map_err(|e| GatewayError::Translation(format!("レスポンスのパースに失敗: {e}")))?;

    items
        .into_iter()
        .next()
        .and_then(|item| item.translations.into_iter().next())
        .map(|translation| translation.text)
        .ok_or_else(|| GatewayError::Translation("レスポンスに翻訳結果がありません".to_string()))
}
