/// Normalized view of a fetched feed. `entries[0]` is the newest entry and
/// always exists once a document leaves the fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub language: String,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub description: String,
    pub author_name: String,
    pub author_email: String,
}

impl FeedDocument {
    pub fn newest(&self) -> Option<&Entry> {
        self.entries.first()
    }
}
