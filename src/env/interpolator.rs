/// A placeholder found in a string: `(start_byte, end_byte, name)` where the
/// range covers the delimiters.
pub type Span = (usize, usize, String);

/// Parse all `{{var}}` spans in `input`.
/// Empty names and unclosed braces are skipped.
pub fn parse_vars(input: &str) -> Vec<Span> {
    let mut result = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i + 1 < len {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            let start = i;
            let inner_start = i + 2;
            let mut j = inner_start;
            let mut found = false;
            while j + 1 < len {
                if bytes[j] == b'}' && bytes[j + 1] == b'}' {
                    found = true;
                    break;
                }
                j += 1;
            }
            if !found {
                break;
            }
            let trimmed = input[inner_start..j].trim();
            if !trimmed.is_empty() {
                result.push((start, j + 2, trimmed.to_string()));
            }
            i = j + 2;
        } else {
            i += 1;
        }
    }

    result
}

/// Parse all `$env.NAME$` spans in `input`. `NAME` is ASCII alphanumerics and
/// underscores; anything else leaves the text untouched.
pub fn parse_env_tokens(input: &str) -> Vec<Span> {
    const PREFIX: &str = "$env.";
    let mut result = Vec::new();
    let mut offset = 0;

    while let Some(found) = input[offset..].find(PREFIX) {
        let start = offset + found;
        let name_start = start + PREFIX.len();
        let name_len = input[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let name_end = name_start + name_len;
        if name_len > 0 && input[name_end..].starts_with('$') {
            result.push((start, name_end + 1, input[name_start..name_end].to_string()));
            offset = name_end + 1;
        } else {
            offset = name_start;
        }
    }

    result
}

/// Replace every span with `lookup(name)`. Spans whose lookup returns `None`
/// keep their original text. Replacement text is never re-scanned.
pub fn substitute<F>(input: &str, spans: &[Span], mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    if spans.is_empty() {
        return input.to_string();
    }
    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    for (start, end, name) in spans {
        output.push_str(&input[last..*start]);
        match lookup(name) {
            Some(value) => output.push_str(&value),
            None => output.push_str(&input[*start..*end]),
        }
        last = *end;
    }
    output.push_str(&input[last..]);
    output
}
