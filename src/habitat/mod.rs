//! Habitat partitioning of gridded variables.
//!
//! Cells are labelled either by depth (shelf / slope inside the EEZ) or by membership of a
//! feature mask (canyon, seamount, cold-water coral). Labels are exclusive within the depth
//! buckets only: a slope cell can also show up again under a canyon label.

pub mod depth;
pub mod masker;
pub mod table;

pub use depth::{CONTOUR_BAND, DepthClass, DepthThresholds, depth_contours};
pub use masker::{EmptyMaskPolicy, HabitatMasker, HabitatMasks, mask_habitat};
pub use table::{HabitatLabel, HabitatRecord, HabitatTable};
