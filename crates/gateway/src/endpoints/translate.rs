//! # POST / と POST /api/translations
//!
//! フォーム（またはJSON）で受け取ったテキストを翻訳パイプラインに通し、
//! 結果をHTML（またはJSON）で返す。

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use lexdrop_types::{TranslateForm, TranslationReceipt};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::{pipeline, render};

/// POST / — フォーム送信を処理し、結果ページを返す。
///
/// ストレージURL・SASトークンの取得に失敗しても結果ページは返し、
/// 失敗理由をページ上に表示する。
pub async fn handle_translate_form(
    State(state): State<Arc<GatewayState>>,
    Form(form): Form<TranslateForm>,
) -> Result<Html<String>, GatewayError> {
    let receipt = pipeline::run(&state, form).await?;
    Ok(Html(render::result_page(&receipt)))
}

/// POST /api/translations — JSONで受け取り、レシートをJSONで返す。
pub async fn handle_translate_json(
    State(state): State<Arc<GatewayState>>,
    Json(form): Json<TranslateForm>,
) -> Result<Json<TranslationReceipt>, GatewayError> {
    let receipt = pipeline::run(&state, form).await?;
    Ok(Json(receipt))
}
