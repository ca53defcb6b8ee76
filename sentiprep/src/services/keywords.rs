//! Default keyword lists
//!
//! Two comma-separated resources, "positives" and "negatives", read from the
//! object store. Each one is loaded independently: a missing or unreadable
//! list is logged and left out.

use super::storage::ObjectStore;
use crate::labeling::keyword::parse_keyword_list;
use crate::labeling::KeywordMap;
use crate::table::decode_bytes;
use sentiprep_common::config::KeywordConfig;
use tracing::{debug, warn};

pub const POSITIVES: &str = "positives";
pub const NEGATIVES: &str = "negatives";

pub async fn load_default_keywords(store: &dyn ObjectStore, config: &KeywordConfig) -> KeywordMap {
    let mut map = KeywordMap::new();
    for (class, path) in [(POSITIVES, &config.positives), (NEGATIVES, &config.negatives)] {
        match store.download(path).await {
            Ok(bytes) => {
                let (text, _) = decode_bytes(&bytes, None);
                let words = parse_keyword_list(&text);
                debug!(class, path = %path, words = words.len(), "Loaded keyword list");
                if !words.is_empty() {
                    map.insert(class.to_string(), words);
                }
            }
            Err(e) => warn!(class, path = %path, error = %e, "Keyword list unavailable"),
        }
    }
    map
}
