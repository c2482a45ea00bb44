// src/acquire/providers/meme_api.rs
use rand::RngCore;
use serde::Deserialize;
use serde_json::Value;

use crate::acquire::normalize_title;
use crate::acquire::types::{AcquireError, MemePost, MemeSource};

#[derive(Debug, Deserialize)]
struct Gimme {
    url: Option<String>,
    title: Option<String>,
    subreddit: Option<String>,
    ups: Option<u64>,
    #[serde(default)]
    nsfw: bool,
}

/// meme-api.com provider. Returns a single pre-picked post, so no candidate
/// selection happens here; the safety predicate is the `nsfw` flag.
pub struct MemeApiProvider;

#[async_trait::async_trait]
impl MemeSource for MemeApiProvider {
    fn name(&self) -> &'static str {
        "MemeAPI"
    }

    fn endpoint(&self, _topic: &str) -> String {
        "https://meme-api.com/gimme".to_string()
    }

    fn normalize(&self, raw: &Value, _rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        let gimme: Gimme = serde_json::from_value(raw.clone())
            .map_err(|e| AcquireError::Normalization(format!("meme-api shape: {e}")))?;

        if gimme.nsfw {
            return Err(AcquireError::Normalization("post flagged nsfw".into()));
        }
        let url = gimme
            .url
            .ok_or_else(|| AcquireError::Normalization("missing url field".into()))?;

        Ok(MemePost {
            title: normalize_title(gimme.title.as_deref().unwrap_or("Random Meme")),
            media_url: url,
            community: gimme.subreddit.unwrap_or_else(|| "memes".to_string()),
            upvotes: gimme.ups.unwrap_or(5000),
            source: self.name().to_string(),
        })
    }
}
