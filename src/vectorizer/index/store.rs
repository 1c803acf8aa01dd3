use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    utils::fs::StagedFile,
};

use super::TermDictionary;

const INDEX_FILE: &str = "term_index.cbor";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    version: u32,
    dictionary: &'a TermDictionary,
}

#[derive(Deserialize)]
struct IndexFile {
    version: u32,
    dictionary: TermDictionary,
}

/// Directory holding the persisted term dictionary.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Write the dictionary. The previous file is replaced only once the new
    /// one is fully on disk.
    pub fn save(&self, dictionary: &TermDictionary) -> Result<()> {
        let staged = self.stage(dictionary)?;
        let target = staged.target().display().to_string();
        staged
            .commit()
            .map_err(|e| Error::IndexBuild(format!("{}: {}", target, e)))?;
        debug!(path = %target, "term index persisted");
        Ok(())
    }

    /// Write the dictionary beside the current file without replacing it
    pub fn stage(&self, dictionary: &TermDictionary) -> Result<StagedFile> {
        let bytes = serde_cbor::to_vec(&IndexFileRef {
            version: FORMAT_VERSION,
            dictionary,
        })
        .map_err(|e| Error::IndexBuild(format!("encode term index: {}", e)))?;
        StagedFile::write(&self.file_path(), &bytes)
            .map_err(|e| Error::IndexBuild(format!("{}: {}", self.dir.display(), e)))
    }

    /// Read the stored dictionary, `None` when nothing has been built yet
    pub fn load(&self) -> Result<Option<TermDictionary>> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)
            .map_err(|e| Error::IndexBuild(format!("{}: {}", path.display(), e)))?;
        let file: IndexFile = serde_cbor::from_slice(&bytes)
            .map_err(|e| Error::IndexBuild(format!("decode {}: {}", path.display(), e)))?;
        if file.version != FORMAT_VERSION {
            return Err(Error::IndexBuild(format!(
                "unsupported term index version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(Some(file.dictionary))
    }
}
