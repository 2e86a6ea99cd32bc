//! Page sources: identifiers for raw page bytes and the capability to read them.
//!
//! A document is an ordered `Vec<PageId>`. Paths are read lazily on the
//! decode worker; in-memory blobs are shared with the worker by `Arc`.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use walkdir::WalkDir;

/// File extensions treated as pages when scanning a directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Opaque handle to the raw bytes of one page.
#[derive(Clone, PartialEq, Eq)]
pub enum PageId {
    Path(PathBuf),
    Memory { name: String, data: Arc<[u8]> },
}

impl PageId {
    pub fn memory(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        PageId::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Short name for logs and listings.
    pub fn label(&self) -> String {
        match self {
            PageId::Path(p) => p.display().to_string(),
            PageId::Memory { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageId::Path(p) => f.debug_tuple("Path").field(p).finish(),
            PageId::Memory { name, data } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Reads the raw bytes behind a [`PageId`]. Runs on the decode worker thread.
pub trait PageSource: Send + 'static {
    fn read_bytes(&self, id: &PageId) -> io::Result<Vec<u8>>;
}

/// Reads paths from the local filesystem and copies in-memory blobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl PageSource for FsSource {
    fn read_bytes(&self, id: &PageId) -> io::Result<Vec<u8>> {
        match id {
            PageId::Path(path) => fs::read(path),
            PageId::Memory { data, .. } => Ok(data.to_vec()),
        }
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Collect image files under `dir` in natural order.
///
/// With `recursive`, subdirectories are walked too and the whole set is
/// ordered by full path, so `ch1/p10.png` sorts after `ch1/p2.png` and before
/// `ch2/p1.png`.
pub fn scan_dir(dir: &Path, recursive: bool) -> io::Result<Vec<PageId>> {
    let depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(depth) {
        let entry = entry?;
        if entry.file_type().is_file() && is_image_path(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    info!("source: {} image(s) in {}", files.len(), dir.display());
    Ok(files.into_iter().map(PageId::Path).collect())
}

/// Read every path-backed page into memory.
pub fn preload(pages: Vec<PageId>, source: &dyn PageSource) -> io::Result<Vec<PageId>> {
    pages
        .into_iter()
        .map(|id| match id {
            PageId::Path(ref path) => {
                let bytes = source.read_bytes(&id)?;
                debug!("source: preloaded {} ({} bytes)", path.display(), bytes.len());
                Ok(PageId::memory(path.display().to_string(), bytes))
            }
            memory => Ok(memory),
        })
        .collect()
}

/// Numeric-aware, case-insensitive string ordering: digit runs compare by value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                let ord = compare_digit_runs(&na, &nb);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.peek().copied().filter(|c| c.is_ascii_digit()) {
        run.push(c);
        it.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let ta = a.trim_start_matches('0');
    let tb = b.trim_start_matches('0');
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        // "007" after "7" so equal values still order deterministically
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_compares_numbers_by_value() {
        let mut names = vec!["p10.png", "p2.png", "p1.png", "P3.png", "p02.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["p1.png", "p2.png", "p02.png", "P3.png", "p10.png"]);
    }

    #[test]
    fn natural_order_prefix_is_smaller() {
        assert_eq!(natural_cmp("page", "page1"), Ordering::Less);
        assert_eq!(natural_cmp("a9b", "a10a"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.jpg", "2.PNG", "1.png", "notes.txt", "cover.webp"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("extra")).unwrap();
        fs::write(dir.path().join("extra").join("3.png"), b"x").unwrap();

        let flat = scan_dir(dir.path(), false).unwrap();
        let names: Vec<String> = flat
            .iter()
            .map(|id| match id {
                PageId::Path(p) => p.file_name().unwrap().to_string_lossy().into_owned(),
                PageId::Memory { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["1.png", "2.PNG", "10.jpg", "cover.webp"]);

        let deep = scan_dir(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 5);
    }

    #[test]
    fn recursive_scan_orders_by_full_path() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["ch2", "ch1"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        for name in ["ch1/p10.png", "ch1/p2.png", "ch2/p1.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pages = scan_dir(dir.path(), true).unwrap();
        let rel: Vec<PathBuf> = pages
            .iter()
            .map(|id| match id {
                PageId::Path(p) => p.strip_prefix(dir.path()).unwrap().to_path_buf(),
                PageId::Memory { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("ch1/p2.png"),
                PathBuf::from("ch1/p10.png"),
                PathBuf::from("ch2/p1.png"),
            ]
        );
        assert!(scan_dir(dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn scan_of_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_dir(&dir.path().join("absent"), false).is_err());
    }

    #[test]
    fn preload_reads_into_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        fs::write(&path, b"abc").unwrap();
        let pages = preload(vec![PageId::Path(path)], &FsSource).unwrap();
        match &pages[0] {
            PageId::Memory { data, .. } => assert_eq!(&data[..], b"abc"),
            PageId::Path(_) => panic!("expected in-memory page"),
        }
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let err = FsSource
            .read_bytes(&PageId::Path(PathBuf::from("/definitely/not/here.png")))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
