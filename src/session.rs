//! Run setup shared by every command.
//!
//! The corpus index and keyword map are fully built here, before any
//! document is processed.

use crate::config::InterlinkConfig;
use crate::corpus::{Corpus, CorpusStore, Document, Failure, FsStore};
use crate::log;
use anyhow::{Context, Result};
use chrono::Utc;
use interlink_core::{CorpusIndex, Engine, EngineError, KeywordMap, KeywordMapBuilder};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub struct Session {
    pub store: FsStore,
    pub documents: Vec<Document>,
    /// Documents that could not be loaded.
    pub failures: Vec<Failure>,
    pub engine: Engine,
}

impl Session {
    /// Load the corpus and build the engine. Keywords are only loaded when
    /// `with_keywords` is set.
    pub fn open(config: &InterlinkConfig, with_keywords: bool) -> Result<Self> {
        let store = FsStore::new(&config.corpus);
        let Corpus {
            documents,
            index,
            failures,
        } = Corpus::load(&store)?;
        log!(
            "corpus";
            "{} documents in {}", documents.len(), config.corpus.content.display()
        );

        let map = if with_keywords {
            keyword_map(config, &index)?
        } else {
            KeywordMap::default()
        };

        let policy = config.linking.policy(Utc::now());
        let engine = Engine::new(map, index, policy, config.linking.rewriter)
            .context("invalid link policy")?;

        Ok(Self {
            store,
            documents,
            failures,
            engine,
        })
    }
}

/// Merge every phrase table of the config into one map. Rejected entries
/// and phrases pointing outside the corpus are logged, never fatal.
fn keyword_map(config: &InterlinkConfig, index: &CorpusIndex) -> Result<KeywordMap> {
    let mut builder = KeywordMapBuilder::new();
    for (source, table) in config.phrase_tables()? {
        for (phrase, target) in table.iter() {
            if let Err(err) = builder.insert(phrase, target) {
                log!("warn"; "{source}: {err}");
            }
        }
    }
    let map = builder.finish();

    for entry in map.entries() {
        if !index.contains(&entry.target) {
            let err = EngineError::BrokenTarget {
                phrase: entry.phrase.clone(),
                target: entry.target.clone(),
            };
            log!("warn"; "{err}");
        }
    }

    log!("keywords"; "{} phrases", map.len());
    Ok(map)
}

/// Install a Ctrl+C handler and return the flag it raises.
///
/// Workers check the flag before each document; documents not yet started
/// when it is raised are left untouched.
pub fn cancel_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        if !handler_flag.swap(true, Ordering::SeqCst) {
            log!("warn"; "interrupted, finishing documents in progress...");
        }
    })
    .context("Failed to set Ctrl+C handler")?;
    Ok(flag)
}
