//! Sanitize provider error strings before they reach logs.

const MAX_API_ERROR_CHARS: usize = 200;

const SECRET_MARKERS: [&str; 5] = [
    "Bearer ",
    "bearer ",
    "api_key=",
    "\"api_key\":\"",
    "Api-Key: ",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn redact_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let mut end = content_start;
        for (i, c) in scrubbed[content_start..].char_indices() {
            if is_secret_char(c) {
                end = content_start + i + c.len_utf8();
            } else {
                break;
            }
        }

        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Redact key-looking tokens and truncate: upstream error bodies are logged
/// server-side only and must never carry credentials.
pub fn sanitize_api_error(input: &str) -> String {
    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        redact_after_marker(&mut scrubbed, marker);
    }

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized upstream error from a failed HTTP response.
pub async fn api_error(upstream: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read upstream error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{upstream} API error ({status}): {sanitized}")
}
