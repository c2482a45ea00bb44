// src/acquire/corpus.rs
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::Deserialize;

use crate::acquire::types::{MemePost, FALLBACK_SOURCE};

/// Pre-vetted posts served when every upstream provider is exhausted.
/// Memory-resident, always available, never empty.
#[derive(Debug, Clone)]
pub struct LocalCorpus {
    items: Vec<MemePost>,
}

#[derive(Debug, Deserialize)]
struct CorpusEntry {
    title: String,
    media_url: String,
    community: String,
    upvotes: u64,
}

impl LocalCorpus {
    /// The built-in dataset, curated for the default deployment.
    pub fn builtin() -> Self {
        let seed: [(&str, &str, &str, u64); 10] = [
            ("When you finally fix that bug", "https://i.imgur.com/8Wr0D8a.png", "programmerhumor", 42000),
            ("Minecraft in a nutshell", "https://i.imgur.com/3JQ1p0q.png", "minecraft", 69000),
            ("Discord mod life", "https://i.imgur.com/5X2m3b9.png", "discord", 35000),
            ("The hacker known as 4chan", "https://i.imgur.com/2m2m2m2.png", "programming", 78000),
            ("When the code works on first try", "https://i.imgur.com/9W9W9W9.png", "developers", 45000),
            ("Stack Overflow in real life", "https://i.imgur.com/1m2m3m4.png", "ProgrammerHumor", 52000),
            ("Git be like", "https://i.imgur.com/5m6m7m8.png", "programmingmemes", 38000),
            ("Debugging be like", "https://i.imgur.com/9m0m1m2.png", "programming", 41000),
            ("When the prod server crashes", "https://i.imgur.com/3m4m5m6.png", "sysadmin", 29000),
            ("AI taking over", "https://i.imgur.com/7m8m9m0.png", "artificial", 33000),
        ];
        let items = seed
            .into_iter()
            .map(|(title, url, community, upvotes)| MemePost {
                title: title.to_string(),
                media_url: url.to_string(),
                community: community.to_string(),
                upvotes,
                source: FALLBACK_SOURCE.to_string(),
            })
            .collect();
        Self { items }
    }

    /// Load a replacement dataset from a JSON array of
    /// `{title, media_url, community, upvotes}` entries.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading corpus from {}", path.display()))?;
        let entries: Vec<CorpusEntry> =
            serde_json::from_str(&content).context("parsing corpus json")?;
        ensure!(!entries.is_empty(), "corpus file holds no entries");

        let items = entries
            .into_iter()
            .map(|e| MemePost {
                title: e.title,
                media_url: e.media_url,
                community: e.community,
                upvotes: e.upvotes,
                source: FALLBACK_SOURCE.to_string(),
            })
            .collect();
        Ok(Self { items })
    }

    /// Draw one post uniformly. Total: the corpus is never empty.
    pub fn pick(&self, rng: &mut dyn RngCore) -> MemePost {
        self.items
            .choose(rng)
            .cloned()
            .expect("corpus is never empty")
    }

    pub fn items(&self) -> &[MemePost] {
        &self.items
    }

    pub fn contains_media_url(&self, url: &str) -> bool {
        self.items.iter().any(|m| m.media_url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn builtin_posts_carry_fallback_source() {
        let corpus = LocalCorpus::builtin();
        assert_eq!(corpus.items().len(), 10);
        assert!(corpus.items().iter().all(|m| m.source == FALLBACK_SOURCE));
    }

    #[test]
    fn seeded_pick_is_deterministic() {
        let corpus = LocalCorpus::builtin();
        let a = corpus.pick(&mut StdRng::seed_from_u64(7));
        let b = corpus.pick(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(corpus.contains_media_url(&a.media_url));
    }
}
