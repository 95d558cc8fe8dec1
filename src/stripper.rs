use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

/// The UTF-8 encoding of U+FEFF.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Suffix carried by every in-flight replacement file.
pub const TEMP_SUFFIX: &str = ".debom";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

// Bytes of the target's name kept in the temporary name, so that the
// temporary stays under NAME_MAX whatever the target is called.
const TEMP_NAME_PART_MAX: usize = 64;

/// What the first bytes of a file say about its BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomState {
    /// Fewer bytes than a BOM.
    TooSmall,
    Absent,
    /// The file is the BOM and nothing else.
    BomOnly,
    BomWithData,
}

/// Terminal success states of [`strip_bom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripOutcome {
    TooSmall,
    NoBom,
    Truncated,
    Stripped,
}

impl StripOutcome {
    pub const fn modified(self) -> bool {
        matches!(self, Self::Truncated | Self::Stripped)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TooSmall => "too small",
            Self::NoBom => "no bom",
            Self::Truncated => "truncated",
            Self::Stripped => "stripped",
        }
    }
}

/// Classifies a file head. Pass at least `UTF8_BOM.len() + 1` bytes (or the
/// whole file if shorter) to tell `BomOnly` from `BomWithData`.
pub fn detect_bom(head: &[u8]) -> BomState {
    if head.len() < UTF8_BOM.len() {
        return BomState::TooSmall;
    }
    if head[..UTF8_BOM.len()] != UTF8_BOM {
        BomState::Absent
    } else if head.len() == UTF8_BOM.len() {
        BomState::BomOnly
    } else {
        BomState::BomWithData
    }
}

/// Reads up to four bytes from `reader` and classifies them.
///
/// # Errors
/// Returns an error if reading fails.
pub fn detect_bom_in<R: Read + ?Sized>(reader: &mut R) -> io::Result<BomState> {
    let mut head = [0u8; UTF8_BOM.len() + 1];
    let n = read_head(reader, &mut head)?;
    Ok(detect_bom(&head[..n]))
}

fn read_head<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Removes a leading UTF-8 BOM from `path` in place.
///
/// The file is opened read-write even when nothing needs to change, so a file
/// the caller may not modify is reported as an error. When data follows the
/// BOM, the remainder is written to a uniquely named sibling file, synced, and
/// renamed over the original; the original is untouched until that rename.
///
/// # Errors
/// Returns an error if the file cannot be opened, read, or replaced.
pub fn strip_bom(path: &Path) -> Result<StripOutcome> {
    let target = rewrite_target(path)?;
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&target)
        .with_context(|| format!("open file: {}", path.display()))?;

    let state = detect_bom_in(&mut file).with_context(|| format!("read: {}", path.display()))?;
    match state {
        BomState::TooSmall => Ok(StripOutcome::TooSmall),
        BomState::Absent => Ok(StripOutcome::NoBom),
        BomState::BomOnly => {
            file.set_len(0)
                .with_context(|| format!("truncate: {}", path.display()))?;
            file.sync_all()
                .with_context(|| format!("sync: {}", path.display()))?;
            Ok(StripOutcome::Truncated)
        }
        BomState::BomWithData => {
            replace_without_bom(&target, file)?;
            Ok(StripOutcome::Stripped)
        }
    }
}

// Renaming over a symlink would replace the link itself, so rewrite its target.
fn rewrite_target(path: &Path) -> Result<PathBuf> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("open file: {}", path.display()))?;
    if meta.file_type().is_symlink() {
        return std::fs::canonicalize(path)
            .with_context(|| format!("resolve link: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn replace_without_bom(path: &Path, mut source: File) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("not a file path: {}", path.display()))?;

    let permissions = source
        .metadata()
        .with_context(|| format!("metadata: {}", path.display()))?
        .permissions();
    source
        .seek(SeekFrom::Start(UTF8_BOM.len() as u64))
        .with_context(|| format!("seek: {}", path.display()))?;

    let prefix = temp_prefix(name);
    // Dropped on every early return below, which deletes the partial copy.
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .with_context(|| format!("create temporary file in: {}", parent.display()))?;

    {
        let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, &mut source);
        let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, temp.as_file_mut());
        io::copy(&mut reader, &mut writer)
            .with_context(|| format!("copy: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("write: {}", path.display()))?;
    }
    temp.as_file()
        .set_permissions(permissions)
        .with_context(|| format!("set permissions: {}", temp.path().display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("sync: {}", temp.path().display()))?;

    drop(source);
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace: {}", path.display()))?;

    sync_dir(parent);
    Ok(())
}

fn temp_prefix(name: &std::ffi::OsStr) -> String {
    let name = name.to_string_lossy();
    let mut end = name.len().min(TEMP_NAME_PART_MAX);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!(".{}.", &name[..end])
}

// Best effort: makes the rename durable on Unix.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Ok(d) = File::open(dir) {
            let _ = d.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
