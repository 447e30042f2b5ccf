//! The [`JointGraph`]: storage for joints and the bodies they connect.

use crate::{
    data_structures::IdPool,
    dynamics::rigid_body::BodyId,
    dynamics::solver::joints::Joint,
};

/// An opaque handle identifying a joint stored in a [`JointGraph`].
///
/// Handles of removed joints are reused for joints added later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct JointId(pub u32);

impl JointId {
    /// Returns the handle as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A graph where bodies are nodes and joints are edges.
///
/// Joints live in an arena indexed by [`JointId`], and each body carries the
/// list of joint handles attached to it, so that the joints of one body can
/// be enumerated without walking the whole arena. Removal is `O(1)` in the
/// arena and `O(joints per body)` in the adjacency lists.
#[derive(Clone, Debug, Default)]
pub struct JointGraph {
    joints: Vec<Option<Joint>>,
    ids: IdPool,
    /// Joint handles per body, indexed by [`BodyId`].
    body_joints: Vec<Vec<JointId>>,
}

impl JointGraph {
    /// Creates an empty joint graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of joints in the graph.
    pub fn len(&self) -> usize {
        self.ids.capacity() as usize - self.ids.free_count()
    }

    /// Returns `true` if the graph contains no joints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a joint to the graph, returning its handle.
    pub fn add(&mut self, joint: Joint) -> JointId {
        let id = JointId(self.ids.alloc());

        let max_body = joint.body_a.index().max(joint.body_b.index());
        if max_body >= self.body_joints.len() {
            self.body_joints.resize_with(max_body + 1, Vec::new);
        }
        self.body_joints[joint.body_a.index()].push(id);
        self.body_joints[joint.body_b.index()].push(id);

        if id.index() >= self.joints.len() {
            self.joints.resize_with(id.index() + 1, || None);
        }
        self.joints[id.index()] = Some(joint);

        id
    }

    /// Removes a joint from the graph, returning it.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, id: JointId) -> Option<Joint> {
        let joint = self.joints.get_mut(id.index())?.take()?;

        for body in [joint.body_a, joint.body_b] {
            let attached = &mut self.body_joints[body.index()];
            if let Some(position) = attached.iter().position(|&other| other == id) {
                attached.swap_remove(position);
            }
        }

        self.ids.free(id.0);

        Some(joint)
    }

    /// Removes every joint attached to the given body, returning them.
    ///
    /// Called when a body is destroyed so that no joint is left dangling.
    pub fn remove_attached(&mut self, body: BodyId) -> Vec<Joint> {
        let ids = match self.body_joints.get_mut(body.index()) {
            Some(attached) => core::mem::take(attached),
            None => return Vec::new(),
        };

        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Returns a reference to the joint with the given handle.
    pub fn get(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.index())?.as_ref()
    }

    /// Returns a mutable reference to the joint with the given handle.
    pub fn get_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(id.index())?.as_mut()
    }

    /// Returns the handles of the joints attached to the given body.
    pub fn attached(&self, body: BodyId) -> &[JointId] {
        self.body_joints
            .get(body.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over the joints connecting the two given bodies.
    pub fn between<'a>(
        &'a self,
        body_a: BodyId,
        body_b: BodyId,
    ) -> impl Iterator<Item = (JointId, &'a Joint)> {
        self.attached(body_a).iter().filter_map(move |&id| {
            let joint = self.get(id)?;
            (joint.other_body(body_a) == Some(body_b)).then_some((id, joint))
        })
    }

    /// Returns `true` if the two bodies should collide with each other.
    ///
    /// Bodies connected by a joint skip collision unless every connecting
    /// joint opts into it.
    pub fn should_collide(&self, body_a: BodyId, body_b: BodyId) -> bool {
        self.between(body_a, body_b)
            .all(|(_, joint)| joint.collide_connected)
    }

    /// Iterates over all joints in the graph.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((JointId(index as u32), slot.as_ref()?)))
    }

    /// Iterates over all joints in the graph mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (JointId, &mut Joint)> {
        self.joints
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| Some((JointId(index as u32), slot.as_mut()?)))
    }

    /// Iterates over the joints that have disabled themselves, typically by
    /// breaking under load.
    ///
    /// The owning system polls this after solving to react to broken joints,
    /// for example by removing them or spawning effects.
    pub fn disabled(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.iter().filter(|(_, joint)| !joint.enabled)
    }
}
