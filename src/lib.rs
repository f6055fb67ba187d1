pub mod config;
pub mod constraint;
pub mod filter;
pub mod gestures;
pub mod math;
pub mod orient;
pub mod pipeline;
pub mod pose;
pub mod session;
pub mod skeleton;
pub mod source;
