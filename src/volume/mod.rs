/// Volume Appearance
///
/// Coefficients handed to the external ray marcher and the Worley detail
/// field it erodes the density with. The detail field is built once on the
/// CPU and uploaded as a plain scalar field.

pub mod cloud_detail;
pub mod params;

pub use cloud_detail::CloudDetail;
pub use params::VolumeParams;

/// Edge length of the cubic detail field
pub const DETAIL_DIMENSION: u32 = 128;
