//! Name-based bone role discovery.
//!
//! Walks the rig once and assigns semantic roles to joints by lower-cased name
//! substrings. Unknown naming schemes simply leave roles empty.

use std::fmt;
use std::str::FromStr;

use super::rig::{JointId, Rig};
use crate::error::AvatarError;

/// Body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Side marker in a lower-cased joint name. Left markers win.
    pub fn from_name(name: &str) -> Option<Self> {
        if contains_any(name, &["left", "l_", "_l"]) {
            Some(Side::Left)
        } else if contains_any(name, &["right", "r_", "_r"]) {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = AvatarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            _ => Err(AvatarError::UnknownSide(s.to_string())),
        }
    }
}

/// Semantic bone role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    LeftEye,
    RightEye,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    Spine,
    Chest,
    Neck,
    Head,
}

impl Role {
    pub const COUNT: usize = 12;

    pub const ALL: [Role; Role::COUNT] = [
        Role::LeftEye,
        Role::RightEye,
        Role::LeftUpperArm,
        Role::RightUpperArm,
        Role::LeftLowerArm,
        Role::RightLowerArm,
        Role::LeftHand,
        Role::RightHand,
        Role::Spine,
        Role::Chest,
        Role::Neck,
        Role::Head,
    ];

    pub fn eye(side: Side) -> Self {
        match side {
            Side::Left => Role::LeftEye,
            Side::Right => Role::RightEye,
        }
    }

    pub fn upper_arm(side: Side) -> Self {
        match side {
            Side::Left => Role::LeftUpperArm,
            Side::Right => Role::RightUpperArm,
        }
    }

    pub fn lower_arm(side: Side) -> Self {
        match side {
            Side::Left => Role::LeftLowerArm,
            Side::Right => Role::RightLowerArm,
        }
    }

    pub fn hand(side: Side) -> Self {
        match side {
            Side::Left => Role::LeftHand,
            Side::Right => Role::RightHand,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LeftEye => "left-eye",
            Role::RightEye => "right-eye",
            Role::LeftUpperArm => "left-upper-arm",
            Role::RightUpperArm => "right-upper-arm",
            Role::LeftLowerArm => "left-lower-arm",
            Role::RightLowerArm => "right-lower-arm",
            Role::LeftHand => "left-hand",
            Role::RightHand => "right-hand",
            Role::Spine => "spine",
            Role::Chest => "chest",
            Role::Neck => "neck",
            Role::Head => "head",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A joint bound to a role, with the joint's vertical scale at binding time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub joint: JointId,
    pub rest_scale_y: f32,
}

/// Role → joint table. Every slot may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleAssignment {
    slots: [Option<Binding>; Role::COUNT],
}

impl RoleAssignment {
    pub fn get(&self, role: Role) -> Option<JointId> {
        self.slots[role.slot()].map(|b| b.joint)
    }

    pub fn binding(&self, role: Role) -> Option<Binding> {
        self.slots[role.slot()]
    }

    pub fn contains(&self, role: Role) -> bool {
        self.slots[role.slot()].is_some()
    }

    /// Number of bound roles.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, Binding)> + '_ {
        Role::ALL
            .iter()
            .filter_map(move |&role| self.binding(role).map(|b| (role, b)))
    }

    fn bind(&mut self, role: Role, rig: &Rig, joint: JointId) {
        let rest_scale_y = rig.joint(joint).scale().y;
        self.slots[role.slot()] = Some(Binding {
            joint,
            rest_scale_y,
        });
        tracing::debug!("Bound {} to joint {:?}", role, rig.joint(joint).name());
    }

    fn bind_if_empty(&mut self, role: Role, rig: &Rig, joint: JointId) {
        if !self.contains(role) {
            self.bind(role, rig, joint);
        }
    }
}

/// Assign roles to the rig's skeleton joints in a single pass.
pub fn classify(rig: &Rig) -> RoleAssignment {
    let mut roles = RoleAssignment::default();

    for id in rig.traverse() {
        let joint = rig.joint(id);
        if !joint.is_joint() {
            continue;
        }
        let name = joint.name().to_lowercase();
        classify_joint(&mut roles, rig, id, &name);
    }

    let eyes = [Role::LeftEye, Role::RightEye]
        .iter()
        .filter(|&&r| roles.contains(r))
        .count();
    tracing::info!(
        "Classified skeleton: {} of {} roles bound, {} eye bones for blinking",
        roles.len(),
        Role::COUNT,
        eyes
    );

    roles
}

fn classify_joint(roles: &mut RoleAssignment, rig: &Rig, id: JointId, name: &str) {
    let side = Side::from_name(name);

    if name.contains("eye") {
        match side {
            Some(side) => roles.bind(Role::eye(side), rig, id),
            // No side marker: first such eye is left, the next is right
            None if !roles.contains(Role::LeftEye) => roles.bind(Role::LeftEye, rig, id),
            None if !roles.contains(Role::RightEye) => roles.bind(Role::RightEye, rig, id),
            None => {}
        }
    }

    if contains_any(name, &["upperarm", "upper_arm", "shoulder"]) {
        if let Some(side) = side {
            roles.bind(Role::upper_arm(side), rig, id);
        }
    } else if contains_any(name, &["lowerarm", "lower_arm", "forearm"]) {
        if let Some(side) = side {
            roles.bind(Role::lower_arm(side), rig, id);
        }
    } else if name.contains("hand") {
        if let Some(side) = side {
            roles.bind(Role::hand(side), rig, id);
        }
    } else if name.contains("spine") || name.contains("chest") {
        if name.contains("spine") {
            roles.bind_if_empty(Role::Spine, rig, id);
        }
        if name.contains("chest") {
            roles.bind_if_empty(Role::Chest, rig, id);
        }
    } else if name.contains("neck") {
        roles.bind_if_empty(Role::Neck, rig, id);
    } else if name.contains("head") {
        roles.bind_if_empty(Role::Head, rig, id);
    }

    // Bare arm names used by some VRM exporters
    if name.contains("l_arm") || name == "leftarm" || name == "left_arm" {
        roles.bind_if_empty(Role::LeftUpperArm, rig, id);
    }
    if name.contains("r_arm") || name == "rightarm" || name == "right_arm" {
        roles.bind_if_empty(Role::RightUpperArm, rig, id);
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn rig_from_names(names: &[&str]) -> Rig {
        let mut rig = Rig::new();
        let mut parent = None;
        for name in names {
            parent = Some(rig.add_joint(name, parent));
        }
        rig
    }

    fn bound_name(rig: &Rig, roles: &RoleAssignment, role: Role) -> Option<String> {
        roles.get(role).map(|id| rig.joint(id).name().to_string())
    }

    #[test]
    fn test_mixamo_names() {
        let rig = rig_from_names(&[
            "mixamorig:Hips",
            "mixamorig:Spine",
            "mixamorig:Spine1",
            "mixamorig:Neck",
            "mixamorig:Head",
            "mixamorig:LeftEye",
            "mixamorig:RightEye",
            "mixamorig:LeftUpperArm",
            "mixamorig:LeftForeArm",
            "mixamorig:LeftHand",
            "mixamorig:RightUpperArm",
            "mixamorig:RightForeArm",
            "mixamorig:RightHand",
        ]);
        let roles = classify(&rig);

        let expect = [
            (Role::Spine, "mixamorig:Spine"),
            (Role::Neck, "mixamorig:Neck"),
            (Role::Head, "mixamorig:Head"),
            (Role::LeftEye, "mixamorig:LeftEye"),
            (Role::RightEye, "mixamorig:RightEye"),
            (Role::LeftUpperArm, "mixamorig:LeftUpperArm"),
            (Role::LeftLowerArm, "mixamorig:LeftForeArm"),
            (Role::LeftHand, "mixamorig:LeftHand"),
            (Role::RightUpperArm, "mixamorig:RightUpperArm"),
            (Role::RightLowerArm, "mixamorig:RightForeArm"),
            (Role::RightHand, "mixamorig:RightHand"),
        ];
        for (role, name) in expect {
            assert_eq!(bound_name(&rig, &roles, role).as_deref(), Some(name), "{role}");
        }
        assert!(!roles.contains(Role::Chest));
        assert_eq!(roles.len(), 11);
    }

    #[test]
    fn test_vrm_names_prefer_upper_arm_over_shoulder() {
        let rig = rig_from_names(&[
            "J_Bip_C_Hips",
            "J_Bip_C_Spine",
            "J_Bip_C_Chest",
            "J_Bip_C_UpperChest",
            "J_Bip_L_Shoulder",
            "J_Bip_L_UpperArm",
        ]);
        let roles = classify(&rig);

        assert_eq!(bound_name(&rig, &roles, Role::Spine).as_deref(), Some("J_Bip_C_Spine"));
        assert_eq!(bound_name(&rig, &roles, Role::Chest).as_deref(), Some("J_Bip_C_Chest"));
        assert_eq!(
            bound_name(&rig, &roles, Role::LeftUpperArm).as_deref(),
            Some("J_Bip_L_UpperArm")
        );
    }

    #[test]
    fn test_unmarked_eyes_fill_left_then_right() {
        let rig = rig_from_names(&["Head", "EyeA", "EyeB", "EyeC"]);
        let roles = classify(&rig);

        assert_eq!(bound_name(&rig, &roles, Role::LeftEye).as_deref(), Some("EyeA"));
        assert_eq!(bound_name(&rig, &roles, Role::RightEye).as_deref(), Some("EyeB"));
    }

    #[test]
    fn test_first_match_wins_for_spine_neck_head() {
        let rig = rig_from_names(&["Spine", "Spine1", "Neck", "Neck1", "Head", "HeadTop_End"]);
        let roles = classify(&rig);

        assert_eq!(bound_name(&rig, &roles, Role::Spine).as_deref(), Some("Spine"));
        assert_eq!(bound_name(&rig, &roles, Role::Neck).as_deref(), Some("Neck"));
        assert_eq!(bound_name(&rig, &roles, Role::Head).as_deref(), Some("Head"));
    }

    #[test]
    fn test_bare_arm_fallback() {
        let rig = rig_from_names(&["Root", "LeftArm", "Right_Arm"]);
        let roles = classify(&rig);

        assert_eq!(bound_name(&rig, &roles, Role::LeftUpperArm).as_deref(), Some("LeftArm"));
        assert_eq!(bound_name(&rig, &roles, Role::RightUpperArm).as_deref(), Some("Right_Arm"));
    }

    #[test]
    fn test_non_joint_nodes_ignored() {
        let mut rig = Rig::new();
        let root = rig.add_joint("Root", None);
        let mesh = rig.add_node("LeftEye_Mesh", false);
        rig.set_parent(mesh, root);

        let roles = classify(&rig);
        assert!(roles.is_empty());
    }

    #[test]
    fn test_unrecognised_names_leave_roles_empty() {
        let rig = rig_from_names(&["Bone001", "Bone002", "Bone003"]);
        let roles = classify(&rig);
        assert!(roles.is_empty());
        assert_eq!(roles.iter().count(), 0);
    }

    #[test]
    fn test_rest_scale_cached() {
        let mut rig = Rig::new();
        let head = rig.add_joint("Head", None);
        let eye = rig.add_joint("LeftEye", Some(head));
        rig.joint_mut(eye).set_scale(Vec3::new(1.0, 0.8, 1.0));

        let roles = classify(&rig);
        let binding = roles.binding(Role::LeftEye).unwrap();
        assert_eq!(binding.joint, eye);
        assert_eq!(binding.rest_scale_y, 0.8);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let rig = rig_from_names(&["Hips", "Spine", "Chest", "Neck", "Head", "LeftEye", "RightEye"]);
        assert_eq!(classify(&rig), classify(&rig));
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("Right".parse::<Side>().unwrap(), Side::Right);
        assert_eq!(
            "middle".parse::<Side>().unwrap_err(),
            AvatarError::UnknownSide("middle".to_string())
        );
    }
}
