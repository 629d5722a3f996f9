//! Run lifecycle data types.
//!
//! # Design
//! - Runs are identified by an opaque UUID v4 token; the token is the only client-facing handle.
//! - Every path belonging to a run is derived from its directory, never from client input alone.
//! - State only moves forward; `Failed` is terminal.

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{RunError, RunResult};

/// Upload extensions accepted for separation (matched case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "flac", "ogg"];

/// Opaque, unguessable identifier for a single separation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Directory exists, nothing written yet.
    Created,
    /// Upload bytes persisted to the run directory.
    InputReceived,
    /// Separator returned successfully.
    Separated,
    /// Both stems verified on disk.
    Ready,
    /// Run aborted; terminal.
    Failed,
}

impl RunState {
    /// Stable lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InputReceived => "input_received",
            Self::Separated => "separated",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::InputReceived => 1,
            Self::Separated => 2,
            Self::Ready => 3,
            Self::Failed => 4,
        }
    }

    /// Whether a run in this state may move to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Failed | Self::Ready, _) => false,
            (_, Self::Failed) => true,
            _ => next.rank() == self.rank() + 1,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named output produced by the two-stem separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stem {
    /// Isolated vocal track.
    Vocals,
    /// Everything except the vocals.
    Accompaniment,
}

impl Stem {
    /// Every stem a successful run must produce.
    pub const ALL: [Self; 2] = [Self::Vocals, Self::Accompaniment];

    /// File name the separator writes for this stem.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Vocals => "vocals.wav",
            Self::Accompaniment => "accompaniment.wav",
        }
    }
}

/// Validated upload filename.
///
/// Only the final path segment of the client-supplied name is kept, so the
/// name can be joined onto a run directory without leaving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    file_name: String,
    base_name: String,
}

impl UploadName {
    /// Validate a client-supplied filename.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnsupportedFormat`] when the extension is not on the
    /// allow-list and [`RunError::InvalidPath`] when no usable final segment
    /// remains.
    pub fn parse(raw: &str) -> RunResult<Self> {
        if !has_allowed_extension(raw) {
            return Err(RunError::UnsupportedFormat {
                filename: raw.to_string(),
            });
        }

        let file_name = final_segment(raw);
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(RunError::invalid_path("filename", "no_final_segment", raw));
        }
        if file_name.contains('\0') {
            return Err(RunError::invalid_path("filename", "nul_byte", raw));
        }

        let base_name = Path::new(file_name)
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        if base_name.is_empty() {
            return Err(RunError::invalid_path("filename", "empty_base_name", raw));
        }

        Ok(Self {
            file_name: file_name.to_string(),
            base_name,
        })
    }

    /// Final path segment of the upload, used as the input file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name with its final extension removed.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }
}

fn has_allowed_extension(raw: &str) -> bool {
    let lowered = raw.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .any(|ext| lowered.ends_with(&format!(".{ext}")))
}

pub(crate) fn final_segment(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Handle to a run whose directory has been created.
#[derive(Debug, Clone)]
pub struct RunHandle {
    id: RunId,
    directory: PathBuf,
    state: RunState,
}

impl RunHandle {
    pub(crate) const fn new(id: RunId, directory: PathBuf) -> Self {
        Self {
            id,
            directory,
            state: RunState::Created,
        }
    }

    /// Identifier of the run.
    #[must_use]
    pub const fn id(&self) -> RunId {
        self.id
    }

    /// Directory exclusively owned by the run.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Path the upload is written to.
    #[must_use]
    pub fn input_path(&self, upload: &UploadName) -> PathBuf {
        self.directory.join(upload.file_name())
    }

    /// Location where the separator is expected to leave `stem`.
    #[must_use]
    pub fn expected_output(&self, base_name: &str, stem: Stem) -> PathBuf {
        self.directory.join(base_name).join(stem.file_name())
    }

    /// Move to `next` if the transition is allowed; returns whether it was applied.
    pub fn advance(&mut self, next: RunState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}

/// Verified locations of both stems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedOutputs {
    /// Absolute path of the vocals stem.
    pub vocals: PathBuf,
    /// Absolute path of the accompaniment stem.
    pub accompaniment: PathBuf,
}

impl SeparatedOutputs {
    /// Path of the requested stem.
    #[must_use]
    pub fn path(&self, stem: Stem) -> &Path {
        match stem {
            Stem::Vocals => &self.vocals,
            Stem::Accompaniment => &self.accompaniment,
        }
    }
}

/// A run that reached the ready state.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    /// Run identifier.
    pub id: RunId,
    /// Run directory.
    pub directory: PathBuf,
    /// Persisted upload.
    pub input: PathBuf,
    /// Verified stems.
    pub outputs: SeparatedOutputs,
}

impl CompletedRun {
    /// Relative download path for `stem`, in the form `{id}/{file}`.
    #[must_use]
    pub fn download_path(&self, stem: Stem) -> String {
        format!("{}/{}", self.id, stem.file_name())
    }
}
