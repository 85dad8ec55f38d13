//! Character stepping over text that may contain markup.
//!
//! Indices are byte offsets and always land on `char` boundaries. With tag
//! awareness enabled, a whole `<...>` tag is one step in either direction so
//! every prefix handed to the renderer is free of half-written tags.

/// Advance one step from `index`.
///
/// An unterminated tag is consumed through the end of the text.
pub fn step_forward(text: &str, index: usize, tag_aware: bool) -> usize {
    let rest = &text[index..];
    let Some(ch) = rest.chars().next() else {
        return index;
    };
    if tag_aware && ch == '<' {
        return rest.find('>').map_or(text.len(), |close| index + close + 1);
    }
    index + ch.len_utf8()
}

/// Retreat one step from `index`, landing where [`step_forward`] would have.
///
/// A `>` closes a tag only when a `<` opens after the previous `>`; forward
/// stepping resumes after every `>`, so no tag can start earlier. Any other
/// `>` is an ordinary character. An unterminated tag at the end of the text
/// is removed whole.
pub fn step_backward(text: &str, index: usize, tag_aware: bool) -> usize {
    let head = &text[..index];
    let Some(ch) = head.chars().next_back() else {
        return 0;
    };
    let prev = index - ch.len_utf8();
    if !tag_aware {
        return prev;
    }
    let segment_start = text[..prev].rfind('>').map_or(0, |close| close + 1);
    let scan_end = if ch == '>' { prev } else { index };
    text[segment_start..scan_end]
        .find('<')
        .map_or(prev, |open| segment_start + open)
}

/// Drop every `<...>` tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Decode the handful of entities an HTML serializer escapes.
pub fn decode_entities(text: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#x27;", "'"),
        ("&nbsp;", " "),
        ("&amp;", "&"),
    ];
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        for (entity, replacement) in ENTITIES {
            if let Some(tail) = rest.strip_prefix(entity) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}
