// src/acquire/providers/mod.rs
pub mod meme_api;
pub mod reddit;
pub mod some_random_api;

use anyhow::{anyhow, Result};

use crate::acquire::types::MemeSource;

/// Build the provider chain in the configured priority order. The order of
/// `names` is the trust ranking and is preserved verbatim.
pub fn build_chain(names: &[String]) -> Result<Vec<Box<dyn MemeSource>>> {
    let mut out: Vec<Box<dyn MemeSource>> = Vec::with_capacity(names.len());
    for name in names {
        match name.as_str() {
            "Reddit" => out.push(Box::new(reddit::RedditProvider)),
            "MemeAPI" => out.push(Box::new(meme_api::MemeApiProvider)),
            "SomeRandomAPI" => out.push(Box::new(some_random_api::SomeRandomApiProvider)),
            other => return Err(anyhow!("unknown meme provider '{other}'")),
        }
    }
    Ok(out)
}
