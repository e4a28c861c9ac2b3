//! Hugging Face Hub file loaders.
//!
//! Downloads go through the blocking hf-hub client and land in the shared
//! Hub cache, so a file is only fetched once per machine.
//!
//! ```rust,no_run
//! use comment_sentiment::loaders::{HfLoader, TokenizerLoader};
//!
//! let config = HfLoader::new("clapAI/modernBERT-base-multilingual-sentiment", "config.json").load()?;
//! let tokenizer =
//!     TokenizerLoader::new("clapAI/modernBERT-base-multilingual-sentiment", "tokenizer.json").load()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::PathBuf;
use std::time::Duration;

use hf_hub::api::sync::ApiBuilder;
use tokenizers::Tokenizer;
use tracing::debug;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    /// Fetch the file and return its local path. Concurrent downloads of the
    /// same file contend for a cache lock; those failures are retried with
    /// exponential backoff.
    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let api = ApiBuilder::new().with_progress(false).build()?;
        let repo = api.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match repo.get(&self.filename) {
                Ok(path) => return Ok(path),
                Err(e) if e.to_string().contains("Lock acquisition failed")
                    && attempt + 1 < MAX_RETRIES =>
                {
                    let wait = Duration::from_millis(100 * (1 << attempt));
                    debug!(
                        "lock busy for {}/{}, retrying in {wait:?}",
                        self.repo, self.filename
                    );
                    std::thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, filename),
        }
    }

    pub fn load(&self) -> anyhow::Result<Tokenizer> {
        let path = self.tokenizer_file_loader.load()?;
        Tokenizer::from_file(path).map_err(anyhow::Error::msg)
    }
}

/// Fetch the first of `filenames` the repository provides.
pub fn load_first_available(repo: &str, filenames: &[&str]) -> anyhow::Result<PathBuf> {
    let mut last_error = None;
    for filename in filenames {
        match HfLoader::new(repo, filename).load() {
            Ok(path) => return Ok(path),
            Err(e) => last_error = Some(e),
        }
    }
    let error = last_error.unwrap_or_else(|| anyhow::anyhow!("no file names given"));
    Err(error.context(format!("none of {filenames:?} found in {repo}")))
}
