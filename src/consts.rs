//! Shared numeric constants for the interaction engine.

// ── Drawing ─────────────────────────────────────────────────────

/// Screen-space distance in pixels within which the cursor snaps to the first drawn vertex.
pub const SNAP_THRESHOLD_PX: f64 = 10.0;

// ── Overlays ────────────────────────────────────────────────────

/// Screen-space distance in pixels below which a segment label is considered to overlap the title.
pub const LABEL_OVERLAP_PX: f64 = 24.0;

/// Horizontal nudge in pixels applied to an overlapping segment label.
pub const LABEL_NUDGE_X_PX: f64 = 0.0;

/// Vertical nudge in pixels applied to an overlapping segment label.
pub const LABEL_NUDGE_Y_PX: f64 = 18.0;

/// Text shown in place of a sample that has not arrived (or failed).
pub const SAMPLE_PLACEHOLDER: &str = "-";

// ── Handles ─────────────────────────────────────────────────────

/// Rotation ring radius as a multiple of the object's bounding radius.
pub const ROTATION_HANDLE_SCALE: f64 = 1.5;

/// Smallest rotation ring radius in world units (metres).
pub const ROTATION_HANDLE_MIN_RADIUS: f64 = 5.0;

// ── Geodesy ─────────────────────────────────────────────────────

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in metres.
pub const WGS84_B: f64 = 6_356_752.314_245_179;

/// Floating tolerance used when comparing world positions.
pub const POSITION_EPSILON: f64 = 1e-9;
