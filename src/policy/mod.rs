pub mod loader;
pub mod merge;
pub mod model;
pub mod value;

pub use loader::ProfileLoader;
pub use merge::merge_profiles;
pub use model::{EffectivePolicy, PolicyDocument};
pub use value::{Value, ValueMap};
