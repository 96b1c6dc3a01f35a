//! File intake: candidate files, validation, drag state and preview bookkeeping.

use crate::preview::Preview;
use anyhow::{Context, Result, bail};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Largest accepted upload, inclusive.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Declared media types the analysis server understands. Matched case-sensitively.
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";
const FALLBACK_FILE_NAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    InMemory(Vec<u8>),
    OnDisk(PathBuf),
}

/// A file the user picked or dropped, not yet validated.
///
/// Files picked from disk are only stat-ed on construction; their bytes are read
/// by [`read_content`](Self::read_content) once the file has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    name: String,
    media_type: String,
    size: u64,
    content: Content,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: content.len() as u64,
            content: Content::InMemory(content),
        }
    }

    /// Describe a file on disk, declaring its media type from the extension.
    /// Only metadata is read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path)
            .with_context(|| format!("cannot access file: {}", path.display()))?;
        if !meta.is_file() {
            bail!("not a regular file: {}", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        Ok(Self {
            media_type: media_type_for_name(&name).to_string(),
            name,
            size: meta.len(),
            content: Content::OnDisk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.content, Content::InMemory(_))
    }

    /// The file's bytes. Blocks on disk I/O for files built with
    /// [`from_path`](Self::from_path), so keep it off the UI thread.
    pub fn read_content(&self) -> io::Result<Cow<'_, [u8]>> {
        match &self.content {
            Content::InMemory(bytes) => Ok(Cow::Borrowed(bytes)),
            Content::OnDisk(path) => fs::read(path).map(Cow::Owned),
        }
    }
}

/// Media type a file picker would declare for `name`.
pub fn media_type_for_name(name: &str) -> &'static str {
    let ext = match Path::new(name).extension().and_then(|s| s.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return FALLBACK_MEDIA_TYPE,
    };
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

/// Why a candidate was refused. The display text is the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Please upload a PNG or JPEG image")]
    UnsupportedType { media_type: String },
    #[error("File size must be less than 10MB")]
    TooLarge { size: u64 },
}

/// Outcome of submitting a candidate to the intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted(Arc<CandidateFile>),
    Rejected(RejectReason),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted(_))
    }
}

/// Check type first, then size.
pub fn validate(candidate: &CandidateFile) -> std::result::Result<(), RejectReason> {
    if !ACCEPTED_MEDIA_TYPES.contains(&candidate.media_type()) {
        return Err(RejectReason::UnsupportedType {
            media_type: candidate.media_type().to_string(),
        });
    }
    if candidate.size() > MAX_FILE_SIZE {
        return Err(RejectReason::TooLarge {
            size: candidate.size(),
        });
    }
    Ok(())
}

/// Holds the current selection and its preview.
///
/// Previews are rendered off-thread. Every accepted file and every `clear()` bumps
/// the preview generation, so a preview finishing for an older selection can be
/// recognised and dropped in [`FileIntake::complete_preview`].
#[derive(Debug, Default)]
pub struct FileIntake {
    current: Option<Arc<CandidateFile>>,
    preview: Option<Preview>,
    drag_active: bool,
    generation: u64,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a candidate. On acceptance it replaces the current selection and
    /// is handed back for forwarding; a rejection leaves the selection untouched.
    pub fn submit(&mut self, candidate: CandidateFile) -> Validation {
        match validate(&candidate) {
            Ok(()) => {
                tracing::info!(
                    "accepted {} ({}, {} bytes)",
                    candidate.name(),
                    candidate.media_type(),
                    candidate.size()
                );
                let file = Arc::new(candidate);
                self.generation += 1;
                self.preview = None;
                self.current = Some(Arc::clone(&file));
                Validation::Accepted(file)
            }
            Err(reason) => {
                tracing::warn!("rejected {}: {:?}", candidate.name(), reason);
                Validation::Rejected(reason)
            }
        }
    }

    /// Drop the selection and its preview. Does not touch any running analysis.
    pub fn clear(&mut self) {
        self.current = None;
        self.preview = None;
        self.generation += 1;
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// A file was released over the drop surface.
    pub fn drop_file(&mut self, candidate: CandidateFile) -> Validation {
        self.drag_active = false;
        self.submit(candidate)
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn current(&self) -> Option<&Arc<CandidateFile>> {
        self.current.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Token to hand to the preview worker for the current selection.
    pub fn preview_generation(&self) -> u64 {
        self.generation
    }

    /// Store a finished preview. Returns false when the selection it was
    /// rendered for has since been replaced or cleared.
    pub fn complete_preview(&mut self, generation: u64, preview: Preview) -> bool {
        if generation != self.generation || self.current.is_none() {
            tracing::debug!(
                "dropping stale preview (generation {generation}, current {})",
                self.generation
            );
            return false;
        }
        self.preview = Some(preview);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn candidate(media_type: &str, size: usize) -> CandidateFile {
        CandidateFile::new("scan.png", media_type, vec![0u8; size])
    }

    fn tiny_preview() -> Preview {
        Preview {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
        }
    }

    #[rstest]
    #[case("image/png")]
    #[case("image/jpeg")]
    #[case("image/jpg")]
    fn accepts_supported_types(#[case] media_type: &str) {
        let mut intake = FileIntake::new();
        assert!(intake.submit(candidate(media_type, 128)).is_accepted());
        assert!(intake.current().is_some());
    }

    #[rstest]
    #[case("image/gif")]
    #[case("image/webp")]
    #[case("IMAGE/PNG")]
    #[case("image/Jpeg")]
    #[case("application/pdf")]
    #[case("")]
    fn rejects_other_types(#[case] media_type: &str) {
        let mut intake = FileIntake::new();
        let outcome = intake.submit(candidate(media_type, 128));
        assert_eq!(
            outcome,
            Validation::Rejected(RejectReason::UnsupportedType {
                media_type: media_type.to_string()
            })
        );
        assert!(intake.current().is_none());
    }

    #[test]
    fn size_limit_is_inclusive() {
        let mut intake = FileIntake::new();
        let exact = candidate("image/png", MAX_FILE_SIZE as usize);
        assert!(intake.submit(exact).is_accepted());

        let over = candidate("image/png", MAX_FILE_SIZE as usize + 1);
        assert_eq!(
            intake.submit(over),
            Validation::Rejected(RejectReason::TooLarge {
                size: MAX_FILE_SIZE + 1
            })
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        let too_big_gif = candidate("image/gif", MAX_FILE_SIZE as usize + 1);
        assert!(matches!(
            validate(&too_big_gif),
            Err(RejectReason::UnsupportedType { .. })
        ));
    }

    #[test]
    fn rejection_keeps_previous_selection() {
        let mut intake = FileIntake::new();
        intake.submit(candidate("image/png", 4));
        let generation = intake.preview_generation();
        intake.submit(candidate("text/plain", 4));
        assert_eq!(intake.current().map(|f| f.media_type()), Some("image/png"));
        assert_eq!(intake.preview_generation(), generation);
    }

    #[test]
    fn reject_reasons_render_user_notices() {
        let unsupported = RejectReason::UnsupportedType {
            media_type: "image/gif".into(),
        };
        assert_eq!(unsupported.to_string(), "Please upload a PNG or JPEG image");
        let too_large = RejectReason::TooLarge { size: 1 };
        assert_eq!(too_large.to_string(), "File size must be less than 10MB");
    }

    #[test]
    fn drag_flag_follows_events_and_never_affects_validation() {
        let mut intake = FileIntake::new();
        assert!(!intake.is_drag_active());
        intake.drag_enter();
        assert!(intake.is_drag_active());
        intake.drag_over();
        assert!(intake.is_drag_active());
        intake.drag_leave();
        assert!(!intake.is_drag_active());

        intake.drag_enter();
        let outcome = intake.drop_file(candidate("image/gif", 1));
        assert!(!outcome.is_accepted());
        assert!(!intake.is_drag_active());

        intake.drag_over();
        assert!(intake.drop_file(candidate("image/jpeg", 1)).is_accepted());
        assert!(!intake.is_drag_active());
    }

    #[test]
    fn clear_discards_selection_and_preview() {
        let mut intake = FileIntake::new();
        intake.submit(candidate("image/png", 4));
        let generation = intake.preview_generation();
        assert!(intake.complete_preview(generation, tiny_preview()));
        assert!(intake.preview().is_some());

        intake.clear();
        assert!(intake.current().is_none());
        assert!(intake.preview().is_none());
    }

    #[test]
    fn stale_previews_are_dropped() {
        let mut intake = FileIntake::new();
        intake.submit(candidate("image/png", 4));
        let first = intake.preview_generation();
        intake.submit(candidate("image/jpeg", 4));
        assert!(!intake.complete_preview(first, tiny_preview()));
        assert!(intake.preview().is_none());

        let second = intake.preview_generation();
        intake.clear();
        assert!(!intake.complete_preview(second, tiny_preview()));
        assert!(intake.preview().is_none());
    }

    #[rstest]
    #[case("a.png", "image/png")]
    #[case("b.JPG", "image/jpeg")]
    #[case("c.jpeg", "image/jpeg")]
    #[case("d.gif", "application/octet-stream")]
    #[case("noext", "application/octet-stream")]
    fn media_type_comes_from_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(media_type_for_name(name), expected);
    }

    #[test]
    fn from_path_declares_type_and_reads_lazily() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scan.JPEG");
        let mut file = File::create(&path)?;
        file.write_all(b"jpegbytes")?;
        drop(file);

        let candidate = CandidateFile::from_path(&path)?;
        assert_eq!(candidate.name(), "scan.JPEG");
        assert_eq!(candidate.media_type(), "image/jpeg");
        assert_eq!(candidate.size(), 9);
        assert!(!candidate.is_in_memory());
        assert_eq!(candidate.read_content()?.as_ref(), b"jpegbytes");
        Ok(())
    }

    #[test]
    fn oversized_file_is_rejected_without_reading_it() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("huge.png");
        let file = File::create(&path)?;
        // Sparse: reports 256 MiB without allocating it.
        file.set_len(256 * 1024 * 1024)?;
        drop(file);

        let candidate = CandidateFile::from_path(&path)?;
        assert!(!candidate.is_in_memory());
        assert_eq!(candidate.size(), 256 * 1024 * 1024);

        // Validation must not touch the disk again.
        fs::remove_file(&path)?;
        let mut intake = FileIntake::new();
        assert_eq!(
            intake.submit(candidate),
            Validation::Rejected(RejectReason::TooLarge {
                size: 256 * 1024 * 1024
            })
        );
        Ok(())
    }

    #[test]
    fn unsupported_file_on_disk_is_rejected_from_metadata() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello")?;
        let candidate = CandidateFile::from_path(&path)?;
        fs::remove_file(&path)?;
        assert!(matches!(
            validate(&candidate),
            Err(RejectReason::UnsupportedType { .. })
        ));
        Ok(())
    }

    #[test]
    fn from_path_missing_file_errors() {
        let dir = tempdir().unwrap();
        assert!(CandidateFile::from_path(dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = tempdir().unwrap();
        assert!(CandidateFile::from_path(dir.path()).is_err());
    }

    #[test]
    fn in_memory_content_is_borrowed() {
        let candidate = CandidateFile::new("a.png", "image/png", vec![7, 8, 9]);
        assert!(candidate.is_in_memory());
        assert!(matches!(candidate.read_content(), Ok(Cow::Borrowed(&[7, 8, 9]))));
    }
}
