use super::{Provider, SummaryError};

/// Extract the generated text from a provider response and fit it into
/// `target_length` characters.
pub fn normalize(
    provider: &dyn Provider,
    raw_body: &str,
    target_length: usize,
) -> Result<String, SummaryError> {
    let text = provider.extract_text(raw_body)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(SummaryError::MalformedResponse {
            provider: provider.name(),
            detail: "generated text is empty".to_string(),
        });
    }
    Ok(truncate_on_word_boundary(text, target_length))
}

/// Cut `text` to at most `max_chars` codepoints, backing up to the last space
/// when there is one so no word is split.
pub fn truncate_on_word_boundary(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let prefix = &text[..cut];
    match prefix.rfind(' ') {
        Some(space) => prefix[..space].trim_end().to_string(),
        None => prefix.to_string(),
    }
}
