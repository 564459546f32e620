mod backend;
pub mod backends;
pub mod normalize;
mod registry;
mod result;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::{CustomApiBackend, FixtureBackend, GeminiBackend};
pub use normalize::{normalize, NormalizedItem, PixelPrediction, ProviderItem};
pub use registry::{BackendRegistry, SharedBackend};
pub use result::{BoundingBox, Detection, DetectionResult, NORMALIZED_MAX};
