use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lineconfig::ConfigDocument;

use crate::paths::AppPaths;

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Explicit paths must exist; the default path may be absent.
    pub explicit: bool,
}

impl ConfigSource {
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self {
                path: path.to_path_buf(),
                explicit: true,
            }),
            None => {
                let paths = AppPaths::discover()?;
                tracing::debug!(
                    config_dir = %paths.config_dir().display(),
                    "resolved wavelines paths"
                );
                Ok(Self {
                    path: paths.config_file(),
                    explicit: false,
                })
            }
        }
    }

    /// Reads the raw file contents, `None` when an optional file is absent.
    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !self.explicit => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read config {}", self.path.display())),
        }
    }

    pub fn parse(&self, contents: Option<&str>) -> Result<ConfigDocument> {
        let Some(contents) = contents else {
            return Ok(ConfigDocument::default());
        };
        let document = if self.is_json() {
            ConfigDocument::from_json_str(contents)
        } else {
            ConfigDocument::from_toml_str(contents)
        };
        document.with_context(|| format!("failed to load config {}", self.path.display()))
    }

    pub fn load(&self) -> Result<ConfigDocument> {
        let contents = self.read()?;
        let document = self.parse(contents.as_deref())?;
        if contents.is_none() {
            tracing::debug!(
                path = %self.path.display(),
                "no config file; using defaults"
            );
        }
        Ok(document)
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

/// Polls a [`ConfigSource`] and reports documents whose contents changed.
#[derive(Debug)]
pub struct ConfigWatcher {
    source: ConfigSource,
    last_contents: Option<String>,
}

impl ConfigWatcher {
    pub fn new(source: ConfigSource, initial: Option<String>) -> Self {
        Self {
            source,
            last_contents: initial,
        }
    }

    /// Returns the new document when the file changed since the last poll.
    ///
    /// A file that fails to parse is reported once and then skipped until it
    /// changes again.
    pub fn poll(&mut self) -> Result<Option<ConfigDocument>> {
        let contents = self.source.read()?;
        if contents == self.last_contents {
            return Ok(None);
        }
        let document = self.source.parse(contents.as_deref());
        self.last_contents = contents;
        document.map(Some)
    }
}
