//! Struct `Sample` represents a batch sample.  

// Provides feature struct.
pub(crate) mod feature;
// Provides sample struct.
pub(crate) mod sample_struct;


pub use sample_struct::Sample;
pub use feature::DenseFeature;
