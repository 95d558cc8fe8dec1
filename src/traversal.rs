use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use globset::{GlobBuilder, GlobMatcher};
use ignore::{DirEntry, Walk, WalkBuilder};

use crate::stripper::TEMP_SUFFIX;

const WILDCARDS: [char; 2] = ['*', '?'];

/// A file-name pattern where `*` matches any run of characters and `?` exactly
/// one. Every other character is literal.
#[derive(Debug, Clone)]
pub struct FilePattern {
    original: String,
    matcher: GlobMatcher,
}

impl FilePattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    /// Returns an error if the translated glob is rejected by `globset`.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut glob = String::with_capacity(pattern.len() + 8);
        let mut literal = String::new();
        for ch in pattern.chars() {
            if WILDCARDS.contains(&ch) {
                glob.push_str(&globset::escape(&literal));
                literal.clear();
                // `**` means something else to globset; in a file name it is just `*`.
                if ch == '*' && glob.ends_with('*') {
                    continue;
                }
                glob.push(ch);
            } else {
                literal.push(ch);
            }
        }
        glob.push_str(&globset::escape(&literal));

        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .backslash_escape(false)
            .case_insensitive(cfg!(windows))
            .build()?
            .compile_matcher();
        Ok(Self {
            original: pattern.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, file_name: &OsStr) -> bool {
        self.matcher.is_match(Path::new(file_name))
    }

    pub fn pattern(&self) -> &str {
        &self.original
    }
}

/// Lazy sequence of files produced for one command-line argument.
///
/// Walk errors for single entries are yielded as `Err` items; the walk goes on
/// after them.
pub struct Candidates {
    source: Source,
}

enum Source {
    Single(Option<PathBuf>),
    Walk {
        walk: Walk,
        pattern: Option<FilePattern>,
    },
}

impl Candidates {
    fn single(path: PathBuf) -> Self {
        Self {
            source: Source::Single(Some(path)),
        }
    }

    fn walk(root: &Path, pattern: Option<FilePattern>, recursive: bool) -> Self {
        let mut builder = WalkBuilder::new(root);
        builder.standard_filters(false);
        builder.follow_links(false);
        builder.max_depth(if recursive { None } else { Some(1) });
        builder.sort_by_file_name(|a, b| a.cmp(b));
        Self {
            source: Source::Walk {
                walk: builder.build(),
                pattern,
            },
        }
    }
}

impl Iterator for Candidates {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Single(path) => path.take().map(Ok),
            Source::Walk { walk, pattern } => loop {
                let dent = match walk.next()? {
                    Ok(d) => d,
                    Err(err) => return Some(Err(err.into())),
                };
                if !is_regular_file(&dent) || is_temp_file(dent.file_name()) {
                    continue;
                }
                if let Some(pattern) = pattern {
                    if !pattern.matches(dent.file_name()) {
                        continue;
                    }
                }
                return Some(Ok(dent.into_path()));
            },
        }
    }
}

/// Expands one command-line argument into the files to process.
///
/// A wildcard in the last component makes it a pattern searched for under the
/// parent directory (`.` when there is none). Otherwise an existing file is
/// returned as is, and an existing directory is walked with no filter.
///
/// # Errors
/// Returns an error if neither a file nor a directory exists at the resolved
/// location, or if a wildcard name is not valid UTF-8.
pub fn resolve(arg: &Path, recursive: bool) -> Result<Candidates> {
    let pattern = match arg.file_name() {
        Some(name) if has_wildcard(name) => match name.to_str() {
            Some(name) => Some(name),
            None => bail!("Unsupported pattern (not valid UTF-8): {}", arg.display()),
        },
        _ => None,
    };

    let (root, pattern) = match pattern {
        Some(name) => {
            let root = match arg.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (root, Some(FilePattern::new(name)?))
        }
        None => {
            if arg.is_file() {
                return Ok(Candidates::single(arg.to_path_buf()));
            }
            (arg.to_path_buf(), None)
        }
    };

    if !root.is_dir() {
        bail!("No such file or directory: {}", root.display());
    }
    Ok(Candidates::walk(&root, pattern, recursive))
}

fn has_wildcard(name: &OsStr) -> bool {
    name.as_encoded_bytes()
        .iter()
        .any(|b| matches!(b, b'*' | b'?'))
}

fn is_regular_file(dent: &DirEntry) -> bool {
    match dent.file_type() {
        Some(ft) if ft.is_file() => true,
        // Links are not walked through, but a link to a file is still a file.
        Some(ft) if ft.is_symlink() => dent.path().is_file(),
        _ => false,
    }
}

fn is_temp_file(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with('.') && n.ends_with(TEMP_SUFFIX))
}
