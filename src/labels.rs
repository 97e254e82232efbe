use std::fs;
use std::path::Path;

use crate::error::StartupError;

/// Class vocabulary of the network, indexed by output position.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// One label per line; surrounding whitespace is dropped.
    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let text = fs::read_to_string(path).map_err(|source| StartupError::Labels {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> Self {
        let mut names: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
        while names.last().map_or(false, |l| l.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Falls back to the index itself when the vocabulary has no entry for it.
    pub fn label_for(&self, index: usize) -> String {
        match self.names.get(index) {
            Some(name) => name.clone(),
            None => index.to_string(),
        }
    }
}
