pub mod feature;
pub mod fields;
pub mod geo;
pub mod loader;
pub mod normalize;
pub mod visibility;
