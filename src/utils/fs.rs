use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// A file written beside its destination but not yet visible there.
///
/// `commit` renames it into place. Dropping it uncommitted removes the
/// temporary file and leaves the destination as it was.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `bytes` to `<target>.tmp`, creating missing parent directories
    pub fn write(target: &Path, bytes: &[u8]) -> io::Result<Self> {
        if target.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", target.display()),
            ));
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = target.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
            committed: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp
    }

    /// Replace the destination with the staged content
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.tmp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("a.bin");
        StagedFile::write(&target, b"old").unwrap().commit().unwrap();
        let staged = StagedFile::write(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"old");
        let tmp = staged.tmp_path().to_path_buf();
        staged.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!tmp.exists());
    }

    #[test]
    fn drop_without_commit_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.bin");
        fs::write(&target, b"old").unwrap();
        let staged = StagedFile::write(&target, b"new").unwrap();
        let tmp = staged.tmp_path().to_path_buf();
        assert!(tmp.exists());
        drop(staged);
        assert!(!tmp.exists());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn directory_target_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StagedFile::write(dir.path(), b"x").is_err());
    }
}
