//! Command-line toggles shared by mongod and mongos

use serde::{Deserialize, Serialize};

/// Verbosity, auth, journaling and storage toggles
///
/// Defaults favour throwaway instances: no preallocation, small files and
/// no journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct CmdOptions {
    pub sync_delay: Option<u32>,
    pub storage_engine: Option<String>,
    pub verbose: bool,
    pub no_prealloc: bool,
    pub small_files: bool,
    pub no_journal: bool,
    pub enable_text_search: bool,
    pub auth: bool,
    pub master: bool,
}

impl Default for CmdOptions {
    fn default() -> Self {
        Self {
            sync_delay: Some(0),
            storage_engine: None,
            verbose: false,
            no_prealloc: true,
            small_files: true,
            no_journal: true,
            enable_text_search: false,
            auth: false,
            master: false,
        }
    }
}

impl CmdOptions {
    pub fn builder() -> CmdOptionsBuilder {
        CmdOptionsBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct CmdOptionsBuilder {
    options: CmdOptions,
}

impl CmdOptionsBuilder {
    pub fn sync_delay(mut self, seconds: Option<u32>) -> Self {
        self.options.sync_delay = seconds;
        self
    }

    pub fn storage_engine(mut self, engine: impl Into<String>) -> Self {
        self.options.storage_engine = Some(engine.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    pub fn use_no_prealloc(mut self, value: bool) -> Self {
        self.options.no_prealloc = value;
        self
    }

    pub fn use_small_files(mut self, value: bool) -> Self {
        self.options.small_files = value;
        self
    }

    pub fn use_no_journal(mut self, value: bool) -> Self {
        self.options.no_journal = value;
        self
    }

    pub fn enable_text_search(mut self, value: bool) -> Self {
        self.options.enable_text_search = value;
        self
    }

    pub fn enable_auth(mut self, value: bool) -> Self {
        self.options.auth = value;
        self
    }

    pub fn master(mut self, value: bool) -> Self {
        self.options.master = value;
        self
    }

    pub fn build(self) -> CmdOptions {
        self.options
    }
}
