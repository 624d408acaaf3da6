use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes as reported by the listing
    pub size: u64,
}

impl DirEntry {
    /// Extension of the entry's file name without the leading dot
    pub fn extension(&self) -> &str {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }
}

/// Filesystem capabilities consumed by the dispatcher.
///
/// Listings are not recursive; the dispatcher decides per subdirectory how to
/// descend.
pub trait FileSystem: Send + Sync {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`FileSystem`] backed by the local disk.
///
/// Symbolic links are not followed when listing, so a link to a directory is
/// reported as a file and never descended into.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path)?.map(|entry| -> io::Result<DirEntry> {
            let entry = entry?;
            let metadata = entry.metadata()?;
            Ok(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
            })
        });
        Ok(collect_entries(path, entries))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Keeps the entries that could be read, sorted by name.
///
/// An entry can vanish or become unreadable between the directory read and
/// its `stat`; only that entry is dropped, not the listing.
fn collect_entries<I>(dir: &Path, entries: I) -> Vec<DirEntry>
where
    I: IntoIterator<Item = io::Result<DirEntry>>,
{
    let mut listed: Vec<DirEntry> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();
    listed.sort_by(|a, b| a.name.cmp(&b.name));
    listed
}
