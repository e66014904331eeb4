//! Batch source resolution
//!
//! Expands a load request into an ordered list of byte sources: one file in
//! single mode, or every recognized image inside a directory or zip archive
//! in batch mode. File references are resolved against the input root by an
//! ordered chain of strategies; the first existing match wins.

use crate::config::LoadMode;
use crate::error::{MaskLoadError, Result};
use crate::utils::PathValidator;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use walkdir::WalkDir;
use zip::ZipArchive;

/// A single image's bytes, read on demand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// A regular file
    File(PathBuf),
    /// One entry of a zip archive
    ZipEntry { archive: PathBuf, entry: String },
}

impl ImageSource {
    /// Read the full contents
    ///
    /// The file or archive handle is opened for this read only and released
    /// before returning.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => std::fs::read(path)
                .map_err(|e| MaskLoadError::file_io_error("read image file", path, &e)),
            Self::ZipEntry { archive, entry } => {
                let file = File::open(archive)
                    .map_err(|e| MaskLoadError::file_io_error("open zip archive", archive, &e))?;
                let mut zip = ZipArchive::new(file)?;
                let mut zipped = zip.by_name(entry)?;
                let mut data = Vec::with_capacity(usize::try_from(zipped.size()).unwrap_or(0));
                zipped.read_to_end(&mut data)?;
                Ok(data)
            },
        }
    }

    /// Short display name (file or entry name)
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            Self::ZipEntry { entry, .. } => entry.clone(),
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::ZipEntry { archive, entry } => write!(f, "{}!{}", archive.display(), entry),
        }
    }
}

/// One way of turning a user-supplied locator into a candidate path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Literal join against the input root
    Direct,
    /// The locator itself, when absolute
    Absolute,
    /// Join against the input root after normalizing `/` and `\`
    SeparatorNormalized,
}

impl ResolveStrategy {
    /// Strategies in the order they are tried
    pub const ORDER: [Self; 3] = [Self::Direct, Self::Absolute, Self::SeparatorNormalized];

    /// Candidate path for `locator`, if this strategy applies
    #[must_use]
    pub fn candidate(self, input_root: &Path, locator: &str) -> Option<PathBuf> {
        match self {
            Self::Direct => Some(input_root.join(locator)),
            Self::Absolute => {
                let path = Path::new(locator);
                path.is_absolute().then(|| path.to_path_buf())
            },
            Self::SeparatorNormalized => {
                let normalized = locator.replace(['/', '\\'], MAIN_SEPARATOR_STR);
                Some(input_root.join(normalized))
            },
        }
    }
}

/// Resolves file references against the input root
#[derive(Debug, Clone)]
pub struct PathResolver {
    input_root: PathBuf,
}

impl PathResolver {
    pub fn new<P: Into<PathBuf>>(input_root: P) -> Self {
        Self {
            input_root: input_root.into(),
        }
    }

    #[must_use]
    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// First existing candidate across [`ResolveStrategy::ORDER`]
    #[must_use]
    pub fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let locator = locator.trim();
        if locator.is_empty() {
            return None;
        }
        for strategy in ResolveStrategy::ORDER {
            if let Some(candidate) = strategy.candidate(&self.input_root, locator) {
                if candidate.exists() {
                    log::trace!(
                        "Resolved '{}' via {:?} to {}",
                        locator,
                        strategy,
                        candidate.display()
                    );
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Resolve or fail with `MaskLoadError::SourceNotFound`
    pub fn resolve_existing(&self, locator: &str) -> Result<PathBuf> {
        self.resolve(locator).ok_or_else(|| {
            MaskLoadError::source_not_found(format!(
                "'{}' (input root: {})",
                locator,
                self.input_root.display()
            ))
        })
    }
}

/// Expands load requests into ordered image sources
#[derive(Debug, Clone)]
pub struct SourceResolver {
    paths: PathResolver,
}

impl SourceResolver {
    #[must_use]
    pub fn new(paths: PathResolver) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Resolve the sources for one invocation
    ///
    /// # Errors
    ///
    /// Configuration errors for a missing reference, an unresolvable path, a
    /// batch location that is neither a directory nor a zip archive, or a
    /// location without recognized images.
    pub fn resolve(
        &self,
        mode: LoadMode,
        image: Option<&str>,
        batch_path: Option<&str>,
    ) -> Result<Vec<ImageSource>> {
        match mode {
            LoadMode::Single => {
                let image = non_empty(image)
                    .ok_or_else(|| MaskLoadError::invalid_config("No image selected in single mode"))?;
                let path = self.paths.resolve_existing(image)?;
                Ok(vec![ImageSource::File(path)])
            },
            LoadMode::Batch => {
                let locator = non_empty(batch_path).ok_or_else(|| {
                    MaskLoadError::invalid_config("Batch path is required in batch mode")
                })?;
                let location = self.paths.resolve_existing(locator)?;
                Self::enumerate_location(&location)
            },
        }
    }

    /// Enumerate a resolved batch location
    pub fn enumerate_location(location: &Path) -> Result<Vec<ImageSource>> {
        let sources = if location.is_dir() {
            Self::enumerate_directory(location)?
        } else if location.is_file() && PathValidator::is_zip_archive(location) {
            Self::enumerate_archive(location)?
        } else {
            return Err(MaskLoadError::invalid_config(format!(
                "Batch path must be a directory or a zip archive: {}",
                location.display()
            )));
        };

        if sources.is_empty() {
            return Err(MaskLoadError::NoImagesFound(location.display().to_string()));
        }
        log::debug!("Found {} image(s) in {}", sources.len(), location.display());
        Ok(sources)
    }

    /// Recognized image files directly inside `dir`, sorted by file name
    pub fn enumerate_directory(dir: &Path) -> Result<Vec<ImageSource>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                MaskLoadError::processing(format!("Failed to list {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() && PathValidator::is_supported_image_format(entry.path()) {
                files.push(ImageSource::File(entry.into_path()));
            }
        }
        Ok(files)
    }

    /// Recognized image entries of a zip archive, sorted by entry name
    pub fn enumerate_archive(archive_path: &Path) -> Result<Vec<ImageSource>> {
        let file = File::open(archive_path)
            .map_err(|e| MaskLoadError::file_io_error("open zip archive", archive_path, &e))?;
        let archive = ZipArchive::new(file)?;

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/') && PathValidator::is_supported_image_format(name))
            .map(str::to_owned)
            .collect();
        names.sort();

        Ok(names
            .into_iter()
            .map(|entry| ImageSource::ZipEntry {
                archive: archive_path.to_path_buf(),
                entry,
            })
            .collect())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_directory_enumeration_sorted_and_filtered() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("b.png"), b"b").unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp_dir.path().join("c.webp"), b"c").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"t").unwrap();
        fs::create_dir(temp_dir.path().join("nested.png")).unwrap();

        let sources = SourceResolver::enumerate_directory(temp_dir.path()).unwrap();
        let names: Vec<String> = sources.iter().map(ImageSource::name).collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.webp"]);
    }

    #[test]
    fn test_archive_enumeration_sorted_and_filtered() {
        let temp_dir = tempdir().unwrap();
        let archive = temp_dir.path().join("frames.zip");
        write_zip(
            &archive,
            &[
                ("frame_2.png", b"2"),
                ("readme.md", b"r"),
                ("frame_1.PNG", b"1"),
                ("sub/frame_0.jpg", b"0"),
            ],
        );

        let sources = SourceResolver::enumerate_archive(&archive).unwrap();
        let names: Vec<String> = sources.iter().map(ImageSource::name).collect();
        assert_eq!(names, vec!["frame_1.PNG", "frame_2.png", "sub/frame_0.jpg"]);

        assert_eq!(sources[1].read_bytes().unwrap(), b"2");
        assert_eq!(sources[2].read_bytes().unwrap(), b"0");
    }

    #[test]
    fn test_resolution_strategies_in_order() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("batch")).unwrap();
        fs::write(temp_dir.path().join("batch").join("x.png"), b"x").unwrap();
        let resolver = PathResolver::new(temp_dir.path());

        // Direct join
        assert_eq!(
            resolver.resolve("batch").unwrap(),
            temp_dir.path().join("batch")
        );

        // Absolute path as given
        let absolute = temp_dir.path().join("batch").join("x.png");
        let other_root = PathResolver::new("/definitely/not/a/root");
        assert_eq!(
            other_root.resolve(absolute.to_str().unwrap()).unwrap(),
            absolute
        );

        // Foreign separators normalized against the root
        let foreign = if cfg!(windows) { "batch/x.png" } else { "batch\\x.png" };
        assert_eq!(
            resolver.resolve(foreign).unwrap(),
            temp_dir.path().join("batch").join("x.png")
        );

        assert!(resolver.resolve("missing").is_none());
        assert!(resolver.resolve("   ").is_none());
    }

    #[test]
    fn test_candidates() {
        let root = Path::new("/input");
        assert_eq!(
            ResolveStrategy::Direct.candidate(root, "a.png"),
            Some(PathBuf::from("/input/a.png"))
        );
        assert_eq!(ResolveStrategy::Absolute.candidate(root, "a.png"), None);
    }

    #[test]
    fn test_resolve_single_and_batch() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("photo.png"), b"p").unwrap();
        fs::create_dir(temp_dir.path().join("set")).unwrap();
        fs::write(temp_dir.path().join("set").join("one.png"), b"1").unwrap();
        let resolver = SourceResolver::new(PathResolver::new(temp_dir.path()));

        let single = resolver
            .resolve(LoadMode::Single, Some("photo.png"), None)
            .unwrap();
        assert_eq!(single, vec![ImageSource::File(temp_dir.path().join("photo.png"))]);

        let batch = resolver.resolve(LoadMode::Batch, None, Some("set")).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_resolve_errors_are_distinguishable() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("plain.txt"), b"t").unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();
        let resolver = SourceResolver::new(PathResolver::new(temp_dir.path()));

        let err = resolver.resolve(LoadMode::Batch, None, None).unwrap_err();
        assert!(matches!(err, MaskLoadError::InvalidConfig(_)));

        let err = resolver.resolve(LoadMode::Batch, None, Some("nowhere")).unwrap_err();
        assert!(matches!(err, MaskLoadError::SourceNotFound(_)));

        let err = resolver.resolve(LoadMode::Batch, None, Some("plain.txt")).unwrap_err();
        assert!(matches!(err, MaskLoadError::InvalidConfig(_)));

        let err = resolver.resolve(LoadMode::Batch, None, Some("empty")).unwrap_err();
        assert!(matches!(err, MaskLoadError::NoImagesFound(_)));

        let err = resolver.resolve(LoadMode::Single, Some("gone.png"), None).unwrap_err();
        assert!(matches!(err, MaskLoadError::SourceNotFound(_)));
    }
}
