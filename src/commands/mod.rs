pub mod burst;
pub mod compress;
pub mod convert;
pub mod info;
pub mod merge;
pub mod split;
