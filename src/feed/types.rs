use serde::Serialize;

#[derive(Serialize)]
pub struct FeedAddResult {
    pub url: String,
    pub watched: usize,
}

#[derive(Serialize)]
pub struct FeedRow {
    pub url: String,
    pub last: String,
}

#[derive(Serialize)]
pub struct FeedList {
    pub command_template: String,
    pub feeds: Vec<FeedRow>,
}
