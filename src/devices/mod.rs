//! Physical components of a commercial PV installation.

/// Stationary battery storage model.
pub mod battery;
/// Commercial load profile archetypes.
pub mod load;
/// PV array output model.
pub mod solar;
pub mod sun;

pub use battery::Battery;
pub use load::{LoadPattern, LoadPatterns, LoadProfileGenerator, LoadProfileType};
pub use solar::{ModelError, PvArray, PvModelParams, PvOutput, PvOutputModel};
