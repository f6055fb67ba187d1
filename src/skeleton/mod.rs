pub mod body;
pub mod joint;

pub use body::{BodyData, BodyFrame, HandState, JointData, TrackingConfidence, MAX_BODY_COUNT};
pub use joint::{JointType, TrackingState};
