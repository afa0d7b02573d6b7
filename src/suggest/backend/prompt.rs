use super::BackendRequest;

/// Prompt for a first draft when nothing is translated yet, otherwise a
/// prompt asking only for the continuation.
pub fn build_prompt(request: &BackendRequest) -> String {
    let BackendRequest {
        source_text,
        current_translation,
        source_lang,
        target_lang,
    } = request;

    if current_translation.trim().is_empty() {
        format!(
            "Translate the following text from {source_lang} to {target_lang}. \
             Provide only the translation without explanations.\n\n\
             Source: {source_text}\n\n\
             Translation:"
        )
    } else {
        format!(
            "You are helping with translation from {source_lang} to {target_lang}.\n\n\
             Source: {source_text}\n\
             Current translation (incomplete): {current_translation}\n\n\
             Suggest how to continue or complete the translation. \
             Provide only the continuation text, no explanations:"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(current: &str) -> BackendRequest {
        BackendRequest {
            source_text: "Hello world".into(),
            current_translation: current.into(),
            source_lang: "en".into(),
            target_lang: "ko".into(),
        }
    }

    #[test]
    fn blank_translation_asks_for_full_translation() {
        let prompt = build_prompt(&request("  "));
        assert!(prompt.starts_with("Translate the following text from en to ko."));
        assert!(prompt.contains("Source: Hello world"));
        assert!(!prompt.contains("incomplete"));
    }

    #[test]
    fn partial_translation_asks_for_continuation() {
        let prompt = build_prompt(&request("안녕"));
        assert!(prompt.contains("Current translation (incomplete): 안녕"));
        assert!(prompt.ends_with("no explanations:"));
    }
}
