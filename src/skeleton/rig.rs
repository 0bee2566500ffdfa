//! In-memory avatar rig: a named joint hierarchy plus the face mesh morph weights.
//!
//! Each joint keeps its local rotation both as an XYZ Euler triple and as the
//! equivalent quaternion. Writing either one refreshes the other, so a single
//! Euler axis can be overwritten without disturbing the other two.

use glam::{EulerRot, Quat, Vec3};

/// Index of a node inside a [`Rig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Euler axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A node of the avatar hierarchy.
#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    /// Whether the node is a skeleton joint (referenced by a skin)
    is_joint: bool,
    parent: Option<JointId>,
    children: Vec<JointId>,
    translation: Vec3,
    /// Local rotation as XYZ Euler angles (radians)
    euler: Vec3,
    /// Local rotation, always equal to `euler` composed in XYZ order
    rotation: Quat,
    scale: Vec3,
}

impl Joint {
    fn new(name: &str, is_joint: bool) -> Self {
        Self {
            name: name.to_string(),
            is_joint,
            parent: None,
            children: Vec::new(),
            translation: Vec3::ZERO,
            euler: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_joint(&self) -> bool {
        self.is_joint
    }

    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }

    pub fn children(&self) -> &[JointId] {
        &self.children
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    /// Local rotation as a quaternion.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local rotation as XYZ Euler angles in radians.
    pub fn euler(&self) -> Vec3 {
        self.euler
    }

    /// Set the rotation from an XYZ Euler triple, composed into one orientation.
    pub fn set_rotation_euler(&mut self, euler: Vec3) {
        self.euler = euler;
        self.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
    }

    /// Set the rotation from a quaternion.
    pub fn set_rotation(&mut self, rotation: Quat) {
        let rotation = rotation.normalize();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.rotation = rotation;
        self.euler = Vec3::new(x, y, z);
    }

    /// Overwrite one Euler axis, keeping the other two.
    pub fn set_rotation_axis(&mut self, axis: Axis, angle: f32) {
        let mut euler = self.euler;
        match axis {
            Axis::X => euler.x = angle,
            Axis::Y => euler.y = angle,
            Axis::Z => euler.z = angle,
        }
        self.set_rotation_euler(euler);
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn set_scale_y(&mut self, y: f32) {
        self.scale.y = y;
    }
}

/// Named morph target weights of one mesh.
#[derive(Debug, Clone, Default)]
pub struct MorphTargets {
    mesh_name: String,
    names: Vec<String>,
    weights: Vec<f32>,
}

impl MorphTargets {
    /// Create a morph set with every weight at zero.
    pub fn new(mesh_name: &str, names: Vec<String>) -> Self {
        let weights = vec![0.0; names.len()];
        Self {
            mesh_name: mesh_name.to_string(),
            names,
            weights,
        }
    }

    pub fn mesh_name(&self) -> &str {
        &self.mesh_name
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Exact (case-sensitive) lookup of a morph target index.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn weight(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|i| self.weights[i])
    }

    pub fn weight_at(&self, index: usize) -> f32 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    pub fn set_weight_at(&mut self, index: usize, weight: f32) {
        if let Some(w) = self.weights.get_mut(index) {
            *w = weight;
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

/// The loaded avatar: node hierarchy plus the face mesh morph targets.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    joints: Vec<Joint>,
    face: Option<MorphTargets>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node. Use [`Rig::set_parent`] to link it.
    pub fn add_node(&mut self, name: &str, is_joint: bool) -> JointId {
        let id = JointId(self.joints.len());
        self.joints.push(Joint::new(name, is_joint));
        id
    }

    /// Add a skeleton joint under `parent`.
    pub fn add_joint(&mut self, name: &str, parent: Option<JointId>) -> JointId {
        let id = self.add_node(name, true);
        if let Some(parent) = parent {
            self.set_parent(id, parent);
        }
        id
    }

    /// Link `child` under `parent`, detaching it from any previous parent.
    pub fn set_parent(&mut self, child: JointId, parent: JointId) {
        if child == parent || child.0 >= self.joints.len() || parent.0 >= self.joints.len() {
            return;
        }
        if let Some(old) = self.joints[child.0].parent.take() {
            self.joints[old.0].children.retain(|&c| c != child);
        }
        self.joints[child.0].parent = Some(parent);
        self.joints[parent.0].children.push(child);
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    pub fn joint_mut(&mut self, id: JointId) -> &mut Joint {
        &mut self.joints[id.0]
    }

    /// First node with exactly this name.
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.joints.iter().position(|j| j.name == name).map(JointId)
    }

    /// Number of nodes flagged as skeleton joints.
    pub fn joint_count(&self) -> usize {
        self.joints.iter().filter(|j| j.is_joint).count()
    }

    /// Depth-first pre-order walk over every node: roots in insertion order,
    /// parents before children, siblings in insertion order.
    pub fn traverse(&self) -> Vec<JointId> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut stack: Vec<JointId> = self
            .joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.parent.is_none())
            .map(|(i, _)| JointId(i))
            .rev()
            .collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.joints[id.0].children.iter().rev().copied());
        }
        order
    }

    pub fn face(&self) -> Option<&MorphTargets> {
        self.face.as_ref()
    }

    pub fn face_mut(&mut self) -> Option<&mut MorphTargets> {
        self.face.as_mut()
    }

    pub fn set_face(&mut self, face: MorphTargets) {
        self.face = Some(face);
    }
}
