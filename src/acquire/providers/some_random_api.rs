// src/acquire/providers/some_random_api.rs
use rand::RngCore;
use serde::Deserialize;
use serde_json::Value;

use crate::acquire::normalize_title;
use crate::acquire::types::{AcquireError, MemePost, MemeSource};

#[derive(Debug, Deserialize)]
struct RandomMeme {
    image: Option<String>,
    caption: Option<String>,
}

/// some-random-api.com provider. Sparse payload; last upstream in the default
/// chain before the local corpus takes over.
pub struct SomeRandomApiProvider;

#[async_trait::async_trait]
impl MemeSource for SomeRandomApiProvider {
    fn name(&self) -> &'static str {
        "SomeRandomAPI"
    }

    fn endpoint(&self, _topic: &str) -> String {
        "https://some-random-api.com/meme".to_string()
    }

    fn normalize(&self, raw: &Value, _rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        let meme: RandomMeme = serde_json::from_value(raw.clone())
            .map_err(|e| AcquireError::Normalization(format!("some-random-api shape: {e}")))?;

        let image = meme
            .image
            .ok_or_else(|| AcquireError::Normalization("missing image field".into()))?;

        Ok(MemePost {
            title: normalize_title(meme.caption.as_deref().unwrap_or("Funny Meme")),
            media_url: image,
            community: "memes".to_string(),
            upvotes: 3000,
            source: self.name().to_string(),
        })
    }
}
