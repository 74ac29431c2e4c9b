//! # GET /
//!
//! 翻訳テキストと言語コードの入力フォーム。

use axum::response::Html;

use crate::render;

/// GET / — 入力フォームを返す。
pub async fn handle_form() -> Html<String> {
    Html(render::form_page())
}
