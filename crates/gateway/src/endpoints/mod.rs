//! # Gatewayエンドポイント

pub mod form;
pub mod health;
pub mod translate;

pub use form::handle_form;
pub use health::handle_health;
pub use translate::{handle_translate_form, handle_translate_json};
