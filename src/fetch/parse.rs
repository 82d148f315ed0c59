use std::sync::OnceLock;

use atom_syndication::Feed as AtomFeed;
use bytes::Bytes;
use regex::Regex;
use rss::{Channel, Item};
use serde::Deserialize;

use super::types::{Entry, FeedDocument};

/// Parses RSS, then Atom, then JSON Feed. The error carries every parser
/// message.
pub fn parse_document(body: &Bytes) -> Result<FeedDocument, String> {
    let rss_err = match Channel::read_from(&body[..]) {
        Ok(ch) => return Ok(from_channel(&ch)),
        Err(e) => e,
    };
    let atom_err = match AtomFeed::read_from(&body[..]) {
        Ok(feed) => return Ok(from_atom(&feed)),
        Err(e) => e,
    };
    match serde_json::from_slice::<JsonFeed>(body) {
        Ok(feed) if feed.version.starts_with("https://jsonfeed.org/version/") => Ok(from_json_feed(feed)),
        Ok(feed) => Err(format!(
            "not RSS ({rss_err}), Atom ({atom_err}) nor JSON Feed (unknown version {:?})",
            feed.version
        )),
        Err(json_err) => Err(format!("not RSS ({rss_err}), Atom ({atom_err}) nor JSON Feed ({json_err})")),
    }
}

fn from_channel(ch: &Channel) -> FeedDocument {
    FeedDocument {
        title: ch.title().to_string(),
        description: ch.description().to_string(),
        language: ch.language().unwrap_or_default().to_string(),
        entries: ch.items().iter().map(rss_entry).collect(),
    }
}

fn rss_entry(item: &Item) -> Entry {
    let link = item
        .link()
        .filter(|l| !l.is_empty())
        .or_else(|| item.guid().map(|g| g.value()))
        .unwrap_or_default();

    let published = item
        .pub_date()
        .map(str::to_string)
        .or_else(|| item.dublin_core_ext().and_then(|dc| dc.dates().first().cloned()))
        .unwrap_or_default();

    let (author_name, author_email) = match item.author() {
        Some(raw) => split_rss_author(raw),
        None => {
            let creator = item.dublin_core_ext().and_then(|dc| dc.creators().first().cloned());
            (creator.unwrap_or_default(), String::new())
        }
    };

    Entry {
        title: item.title().unwrap_or_default().to_string(),
        link: link.to_string(),
        published,
        description: item.description().unwrap_or_default().to_string(),
        author_name,
        author_email,
    }
}

// RSS <author> is conventionally "jane@example.com (Jane Doe)"
fn split_rss_author(raw: &str) -> (String, String) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\s*(\S+@\S+)\s*\((.*)\)\s*$").expect("static regex"));

    let raw = raw.trim();
    if let Some(c) = re.captures(raw) {
        return (c[2].trim().to_string(), c[1].to_string());
    }
    if !raw.contains(char::is_whitespace) && raw.contains('@') {
        return (String::new(), raw.to_string());
    }
    (raw.to_string(), String::new())
}

fn from_atom(feed: &AtomFeed) -> FeedDocument {
    FeedDocument {
        title: feed.title().value.clone(),
        description: feed.subtitle().map(|t| t.value.clone()).unwrap_or_default(),
        language: feed.lang().unwrap_or_default().to_string(),
        entries: feed.entries().iter().map(atom_entry).collect(),
    }
}

fn atom_entry(e: &atom_syndication::Entry) -> Entry {
    let link = e
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| e.links().first())
        .map(|l| l.href().to_string())
        .unwrap_or_else(|| e.id().to_string());

    let published = e.published().unwrap_or_else(|| e.updated()).to_rfc3339();
    let author = e.authors().first();

    Entry {
        title: e.title().value.clone(),
        link,
        published,
        description: e.summary().map(|t| t.value.clone()).unwrap_or_default(),
        author_name: author.map(|a| a.name().to_string()).unwrap_or_default(),
        author_email: author.and_then(|a| a.email()).unwrap_or_default().to_string(),
    }
}

// JSON Feed 1.0 and 1.1; 1.1 moved `author` to `authors`
#[derive(Deserialize)]
struct JsonFeed {
    version: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    items: Vec<JsonItem>,
}

#[derive(Deserialize)]
struct JsonItem {
    #[serde(default)]
    id: serde_json::Value,
    url: Option<String>,
    #[serde(default)]
    title: String,
    summary: Option<String>,
    content_text: Option<String>,
    date_published: Option<String>,
    date_modified: Option<String>,
    #[serde(default)]
    authors: Vec<JsonAuthor>,
    author: Option<JsonAuthor>,
}

#[derive(Deserialize)]
struct JsonAuthor {
    #[serde(default)]
    name: String,
}

fn from_json_feed(feed: JsonFeed) -> FeedDocument {
    FeedDocument {
        title: feed.title,
        description: feed.description,
        language: feed.language,
        entries: feed.items.into_iter().map(json_entry).collect(),
    }
}

fn json_entry(item: JsonItem) -> Entry {
    // 1.0 allowed numeric ids
    let id = match item.id {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };
    let author = item.authors.into_iter().next().or(item.author);

    Entry {
        title: item.title,
        link: item.url.filter(|u| !u.is_empty()).unwrap_or(id),
        published: item.date_published.or(item.date_modified).unwrap_or_default(),
        description: item.summary.or(item.content_text).unwrap_or_default(),
        author_name: author.map(|a| a.name).unwrap_or_default(),
        author_email: String::new(),
    }
}
