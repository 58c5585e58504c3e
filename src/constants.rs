//! Shared application-wide constants.
//! Centralizes tweakable values used across the model, interactions, and rendering.

// Node dimensions
/// Default node width in world units.
pub const NODE_WIDTH: f32 = 64.0;
/// Default node height in world units.
pub const NODE_HEIGHT: f32 = 32.0;

// Hit-testing
/// Half-extent (in world units) of the pick box around a reaction centroid.
pub const REACTION_PICK_EXTENT: f32 = 10.0;

// Canvas interactions
/// Squared device-space distance a planting gesture must travel before it
/// becomes a compartment-rectangle drag instead of a single node placement.
pub const PLANT_COMPARTMENT_THRESHOLD_SQ: f32 = 500.0;
/// Offset (in world units) applied to a freshly created alias node so it does
/// not sit exactly on top of its source.
pub const ALIAS_OFFSET: f32 = 24.0;

// Viewport
/// Lower bound on the resolved (composed) zoom factor.
pub const ZOOM_MIN: f32 = 0.01;
/// Upper bound on the resolved (composed) zoom factor.
pub const ZOOM_MAX: f32 = 40.0;
/// Divisor applied to wheel deltas before exponentiation when zooming.
pub const WHEEL_ZOOM_DIVISOR: f32 = 600.0;
/// Padding (in device units) kept around the diagram when fitting it to a region.
pub const FIT_PADDING: f32 = 20.0;

// Rendering
/// Radius of the reaction centroid mark in world units.
pub const CENTROID_MARK_RADIUS: f32 = 5.0;
/// Radius of the beacon highlight drawn around connect-gesture candidates.
pub const BEACON_RADIUS: f32 = 20.0;
