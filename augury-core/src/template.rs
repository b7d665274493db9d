//! Placeholder rendering for resolved texts and insight templates.
//!
//! Tokens look like `{name}`. Only a closed vocabulary is substituted; any
//! other token is left verbatim so rendering stays total. The locked schema
//! validator rejects unknown tokens before an edition is published.

/// Every placeholder the renderer understands.
pub const PLACEHOLDERS: &[&str] = &["name", "subject", "value", "category", "percent", "count"];

pub fn is_known_placeholder(token: &str) -> bool {
    PLACEHOLDERS.contains(&token)
}

/// Values available while rendering one text. Unset fields leave their token as-is.
#[derive(Debug, Clone, Default)]
pub struct RenderContext<'a> {
    pub name: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub value: Option<i64>,
    pub category: Option<&'a str>,
    pub percent: Option<i64>,
    pub count: Option<i64>,
}

impl RenderContext<'_> {
    fn lookup(&self, token: &str) -> Option<String> {
        match token {
            "name" => self.name.map(str::to_owned),
            "subject" => self.subject.map(str::to_owned),
            "category" => self.category.map(str::to_owned),
            "value" => self.value.map(|v| v.to_string()),
            "percent" => self.percent.map(|v| v.to_string()),
            "count" => self.count.map(|v| v.to_string()),
            _ => None,
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Iterate `(byte_offset, token)` for every `{token}` in `text`.
///
/// A token is a non-empty run of ASCII alphanumerics and underscores between
/// braces; `{ spaced }` or `{}` are plain text.
pub fn placeholders(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        while let Some(rel) = text[cursor..].find('{') {
            let open = cursor + rel;
            let rest = &text[open + 1..];
            let len = rest.find(|c: char| !is_token_char(c)).unwrap_or(rest.len());
            if len > 0 && rest[len..].starts_with('}') {
                cursor = open + len + 2;
                return Some((open, &rest[..len]));
            }
            cursor = open + 1;
        }
        None
    })
}

/// Substitute known placeholders from `ctx`.
pub fn render(text: &str, ctx: &RenderContext<'_>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (offset, token) in placeholders(text) {
        if let Some(replacement) = ctx.lookup(token) {
            out.push_str(&text[last..offset]);
            out.push_str(&replacement);
            last = offset + token.len() + 2;
        }
    }
    out.push_str(&text[last..]);
    out
}
