// src/acquire/providers/reddit.rs
use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::Deserialize;
use serde_json::Value;

use crate::acquire::normalize_title;
use crate::acquire::types::{AcquireError, MemePost, MemeSource};

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    url: Option<String>,
    subreddit: Option<String>,
    ups: Option<u64>,
    post_hint: Option<String>,
    #[serde(default)]
    over_18: bool,
}

const IMAGE_SUFFIXES: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

fn has_image_suffix(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Reddit hot-listing provider. Highest-trust source: real community posts
/// with scores, filtered down to safe direct-image links.
pub struct RedditProvider;

impl RedditProvider {
    fn eligible(post: &Post) -> bool {
        post.post_hint.as_deref() == Some("image")
            && !post.over_18
            && post.url.as_deref().map(has_image_suffix).unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl MemeSource for RedditProvider {
    fn name(&self) -> &'static str {
        "Reddit"
    }

    fn endpoint(&self, topic: &str) -> String {
        format!("https://www.reddit.com/r/{topic}/hot.json?limit=50")
    }

    fn normalize(&self, raw: &Value, rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        let listing: Listing = serde_json::from_value(raw.clone())
            .map_err(|e| AcquireError::Normalization(format!("reddit listing shape: {e}")))?;

        let candidates: Vec<Post> = listing
            .data
            .children
            .into_iter()
            .map(|c| c.data)
            .filter(Self::eligible)
            .collect();

        let pick = candidates
            .choose(rng)
            .ok_or_else(|| AcquireError::Normalization("no safe image posts in listing".into()))?;
        let media_url = pick
            .url
            .clone()
            .ok_or_else(|| AcquireError::Normalization("missing url on selected post".into()))?;

        Ok(MemePost {
            title: normalize_title(pick.title.as_deref().unwrap_or("Funny Meme")),
            media_url,
            community: pick.subreddit.clone().unwrap_or_else(|| "memes".to_string()),
            upvotes: pick.ups.unwrap_or(1000),
            source: self.name().to_string(),
        })
    }
}
