//! Command template expansion.
//!
//! Two passes in a fixed order: `&`-placeholders are replaced with feed
//! metadata, then `$NAME` / `${NAME}` references are resolved against the
//! environment over the whole substituted string. Feed values are never
//! rescanned for placeholders, but they do see the env pass, so a `$VAR` in
//! an entry title is expanded and `${&title}` can name a variable. Env values
//! are inserted last and never scanned for anything. There is no escaping
//! and no shell quoting.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::fetch::{Entry, FeedDocument};

pub const PLACEHOLDERS: [&str; 9] = [
    "&title",
    "&desc",
    "&lang",
    "&item_title",
    "&item_link",
    "&item_pubDate",
    "&item_desc",
    "&item_authorName",
    "&item_authorEmail",
];

pub fn expand(template: &str, doc: &FeedDocument) -> String {
    expand_with(template, doc, |name| std::env::var(name).ok())
}

pub fn expand_with<F>(template: &str, doc: &FeedDocument, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let substituted = substitute_placeholders(template, &token_values(doc));
    expand_env(&substituted, &env)
}

/// Fixed (token, value) table. Order is irrelevant to the result: the
/// scanner picks the longest token at each `&`.
fn token_values(doc: &FeedDocument) -> [(&'static str, &str); 9] {
    let newest = doc.newest();
    let field = |pick: fn(&Entry) -> &str| newest.map(pick).unwrap_or_default();
    [
        (PLACEHOLDERS[0], doc.title.as_str()),
        (PLACEHOLDERS[1], doc.description.as_str()),
        (PLACEHOLDERS[2], doc.language.as_str()),
        (PLACEHOLDERS[3], field(|e| e.title.as_str())),
        (PLACEHOLDERS[4], field(|e| e.link.as_str())),
        (PLACEHOLDERS[5], field(|e| e.published.as_str())),
        (PLACEHOLDERS[6], field(|e| e.description.as_str())),
        (PLACEHOLDERS[7], field(|e| e.author_name.as_str())),
        (PLACEHOLDERS[8], field(|e| e.author_email.as_str())),
    ]
}

fn substitute_placeholders(template: &str, values: &[(&'static str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        let hit = values
            .iter()
            .filter(|(tok, _)| tail.starts_with(tok))
            .max_by_key(|(tok, _)| tok.len());
        match hit {
            Some((tok, val)) => {
                out.push_str(val);
                rest = &tail[tok.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand_env<F>(text: &str, env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\$(?:\{([A-Za-z0-9_]+)\}|([A-Za-z0-9_]+))").expect("static regex"));

    re.replace_all(text, |c: &Captures| {
        let name = c.get(1).or_else(|| c.get(2)).map_or("", |m| m.as_str());
        env(name).unwrap_or_default()
    })
    .into_owned()
}
