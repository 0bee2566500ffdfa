//! Avatar skeleton: the rig hierarchy and bone role classification.

pub mod classify;
pub mod rig;

pub use classify::{classify, Binding, Role, RoleAssignment, Side};
pub use rig::{Axis, Joint, JointId, MorphTargets, Rig};
