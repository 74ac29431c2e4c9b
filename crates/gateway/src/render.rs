//! # HTML描画
//!
//! 入力フォームと結果ページ。ユーザー入力はすべてエスケープして埋め込む。

use lexdrop_types::{StepOutcome, TranslationReceipt};

/// 翻訳先として選択肢に出す言語 (コード, 表示名)
const LANGUAGE_OPTIONS: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh-Hans", "Chinese (Simplified)"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ru", "Russian"),
];

/// HTMLの特殊文字をエスケープする。
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// `GET /` の入力フォーム。
pub fn form_page() -> String {
    let options: String = LANGUAGE_OPTIONS
        .iter()
        .map(|(code, name)| format!("<option value=\"{code}\">{name}</option>\n"))
        .collect();
    page(
        "Translator",
        &format!(
            "<h1>Translate and store</h1>\n\
             <form method=\"post\" action=\"/\">\n\
             <label for=\"text\">Text</label>\n\
             <textarea id=\"text\" name=\"text\" rows=\"6\" cols=\"60\"></textarea>\n\
             <label for=\"language\">Language</label>\n\
             <select id=\"language\" name=\"language\">\n{options}</select>\n\
             <button type=\"submit\">Translate</button>\n\
             </form>\n"
        ),
    )
}

fn outcome_row(label: &str, id: &str, outcome: &StepOutcome<String>) -> String {
    let value = match outcome.value() {
        Some(value) => format!("<code id=\"{id}\">{}</code>", escape_html(value)),
        None => {
            let class = match outcome {
                StepOutcome::Skipped { .. } => "skipped",
                _ => "failed",
            };
            format!(
                "<span id=\"{id}\" class=\"{class}\">{class}: {}</span>",
                escape_html(outcome.reason().unwrap_or_default())
            )
        }
    };
    format!("<dt>{label}</dt>\n<dd>{value}</dd>\n")
}

/// `POST /` の結果ページ。
pub fn result_page(receipt: &TranslationReceipt) -> String {
    let download = match (receipt.storage_url.value(), receipt.sas_token.value()) {
        (Some(url), Some(token)) => format!(
            "<p><a id=\"download\" href=\"{}\">Download</a></p>\n",
            escape_html(&format!("{url}?{token}"))
        ),
        _ => String::new(),
    };
    page(
        "Translation result",
        &format!(
            "<h1>Translation result</h1>\n<dl>\n\
             <dt>Original</dt>\n<dd id=\"original\">{}</dd>\n\
             <dt>Translated ({})</dt>\n<dd id=\"translated\">{}</dd>\n\
             {}{}</dl>\n{download}<p><a href=\"/\">Translate another</a></p>\n",
            escape_html(&receipt.original_text),
            escape_html(&receipt.language),
            escape_html(&receipt.translated_text),
            outcome_row("Storage path", "storagepath", &receipt.storage_url),
            outcome_row("SAS token", "sas_token", &receipt.sas_token),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(storage_url: StepOutcome<String>, sas_token: StepOutcome<String>) -> TranslationReceipt {
        TranslationReceipt {
            original_text: "<b>hello</b>".to_string(),
            translated_text: "bonjour & salut".to_string(),
            language: "fr".to_string(),
            storage_url,
            sas_token,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    /// フォームが text と language を送信することを確認
    #[test]
    fn test_form_page_fields() {
        let html = form_page();
        assert!(html.contains("name=\"text\""));
        assert!(html.contains("name=\"language\""));
        assert!(html.contains("<option value=\"fr\">French</option>"));
        assert!(html.contains("method=\"post\""));
    }

    /// 成功時はURLとトークン、ダウンロードリンクが表示されることを確認
    #[test]
    fn test_result_page_success() {
        let html = result_page(&receipt(
            StepOutcome::Succeeded {
                value: "https://a.blob.core.windows.net/c/translated_file_fr.txt".to_string(),
            },
            StepOutcome::Succeeded {
                value: "se=x&sp=r&sig=y".to_string(),
            },
        ));
        assert!(html.contains("&lt;b&gt;hello&lt;/b&gt;"));
        assert!(html.contains("bonjour &amp; salut"));
        assert!(html.contains(
            "<code id=\"storagepath\">https://a.blob.core.windows.net/c/translated_file_fr.txt</code>"
        ));
        assert!(html.contains("<code id=\"sas_token\">se=x&amp;sp=r&amp;sig=y</code>"));
        assert!(html.contains("id=\"download\""));
    }

    /// 失敗・スキップ時は理由が表示され、ダウンロードリンクは出ないことを確認
    #[test]
    fn test_result_page_failures() {
        let html = result_page(&receipt(
            StepOutcome::Failed {
                reason: "接続文字列が不正".to_string(),
            },
            StepOutcome::Skipped {
                reason: "アップロード未完了".to_string(),
            },
        ));
        assert!(html.contains("class=\"failed\">failed: 接続文字列が不正"));
        assert!(html.contains("class=\"skipped\">skipped: アップロード未完了"));
        assert!(!html.contains("id=\"download\""));
    }
}
