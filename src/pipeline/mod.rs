//! AdaIN style transfer pipeline.

mod adain;
mod backend;
mod blend;
mod stats;
mod stylize;

pub use adain::{align, align_to_stats, EPSILON};
pub use backend::{FeatureTensor, InferenceBackend, OnnxBackend, SharedBackend};
pub use blend::blend;
pub use stats::{channel_stats, ChannelStats};
pub use stylize::{Config, Outcome, Stylizer};
