//! Generation modes, credit costs, and submission validation.
//!
//! The cost table is static: the cost of a mode is looked up once at
//! submission time and frozen into the media record, so later pricing
//! changes never affect existing records.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Generation modes
// ---------------------------------------------------------------------------

/// What kind of generation a media record represents.
///
/// Discriminants match the seeded `generation_modes` lookup table (1-based).
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Single image from a text prompt.
    Image = 1,
    /// Video from a text prompt.
    Video = 2,
    /// Video interpolated between a start and an end reference image.
    FirstLastFrameVideo = 3,
}

impl GenerationMode {
    /// Return the database mode ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a mode by its database ID.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Image),
            2 => Some(Self::Video),
            3 => Some(Self::FirstLastFrameVideo),
            _ => None,
        }
    }

    /// Wire name used in API requests and dispatch payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::FirstLastFrameVideo => "first_last_frame_video",
        }
    }

    /// Parse a wire name into a mode.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "first_last_frame_video" => Some(Self::FirstLastFrameVideo),
            _ => None,
        }
    }

    /// Credit cost charged at submission time.
    pub fn credit_cost(self) -> i64 {
        match self {
            Self::Image => 10,
            Self::Video => 100,
            Self::FirstLastFrameVideo => 100,
        }
    }

    /// Broad media type of the produced artifact (`image` or `video`).
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video | Self::FirstLastFrameVideo => "video",
        }
    }

    /// File extension of the produced artifact.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Video | Self::FirstLastFrameVideo => "mp4",
        }
    }

    /// Content type of the produced artifact.
    pub fn output_content_type(self) -> &'static str {
        match self {
            Self::Image => "image/png",
            Self::Video | Self::FirstLastFrameVideo => "video/mp4",
        }
    }
}

// ---------------------------------------------------------------------------
// Submission validation
// ---------------------------------------------------------------------------

/// Maximum accepted prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Validate a generation submission before any credit is debited.
///
/// First/last-frame video jobs require both reference image URLs. Other
/// modes may carry them optionally (the dispatcher forwards whatever is
/// present to the backend).
pub fn validate_submission(
    mode: GenerationMode,
    prompt: &str,
    start_image_url: Option<&str>,
    end_image_url: Option<&str>,
) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".into()));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(CoreError::Validation(format!(
            "Prompt must be at most {MAX_PROMPT_CHARS} characters"
        )));
    }

    if mode == GenerationMode::FirstLastFrameVideo {
        if start_image_url.map_or(true, str::is_empty) {
            return Err(CoreError::Validation("Missing start image URL".into()));
        }
        if end_image_url.map_or(true, str::is_empty) {
            return Err(CoreError::Validation("Missing end image URL".into()));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Prefix length used when deriving labels/descriptions from a prompt.
const PROMPT_PREVIEW_CHARS: usize = 30;

/// Shorten a prompt to a preview suitable for ledger descriptions and
/// selection labels, appending an ellipsis when truncated.
pub fn prompt_preview(prompt: &str) -> String {
    let truncated: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
        format!("{truncated}...")
    } else {
        truncated
    }
}

/// Whether a stored file name looks like a selectable input image.
pub fn is_image_filename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["jpg", "jpeg", "png", "webp", "gif"]
        .iter()
        .any(|ext| lower.rsplit('.').next() == Some(*ext) && lower.contains('.'))
}
