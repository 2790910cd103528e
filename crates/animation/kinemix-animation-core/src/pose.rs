//! Poses and the skeleton capability consumed by clips and the pose blender.
//!
//! Skeleton storage and skin-matrix computation live outside this crate; the
//! core only needs a bone count, mutable access to the current local pose and
//! a hook to tell the skeleton its pose changed.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::Result;

/// Local transform of one bone, split to TRS for blending.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub position: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl BoneTransform {
    pub const IDENTITY: BoneTransform = BoneTransform {
        position: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Column-major 4x4 matrix `T * R * S`.
    ///
    /// The rotation is used as stored; blended rotations should be normalized
    /// first if the consumer needs a pure rotation.
    pub fn to_matrix(&self) -> [[f32; 4]; 4] {
        let [x, y, z, w] = self.rotation;
        let [sx, sy, sz] = self.scale;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        [
            [(1.0 - (yy + zz)) * sx, (xy + wz) * sx, (xz - wy) * sx, 0.0],
            [(xy - wz) * sy, (1.0 - (xx + zz)) * sy, (yz + wx) * sy, 0.0],
            [(xz + wy) * sz, (yz - wx) * sz, (1.0 - (xx + yy)) * sz, 0.0],
            [self.position[0], self.position[1], self.position[2], 1.0],
        ]
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-bone local transforms indexed by bone id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    bones: Vec<BoneTransform>,
}

impl Pose {
    /// Pose of `bone_count` identity transforms.
    pub fn new(bone_count: usize) -> Self {
        Self {
            bones: vec![BoneTransform::IDENTITY; bone_count],
        }
    }

    pub fn from_bones(bones: Vec<BoneTransform>) -> Self {
        Self { bones }
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn bone(&self, bone: usize) -> Option<&BoneTransform> {
        self.bones.get(bone)
    }

    #[inline]
    pub fn bones(&self) -> &[BoneTransform] {
        &self.bones
    }

    #[inline]
    pub fn bones_mut(&mut self) -> &mut [BoneTransform] {
        &mut self.bones
    }

    pub fn set_bone(&mut self, bone: usize, transform: BoneTransform) -> Result<()> {
        let bone_count = self.bones.len();
        let slot = self
            .bones
            .get_mut(bone)
            .ok_or(AnimationError::BoneOutOfRange { bone, bone_count })?;
        *slot = transform;
        Ok(())
    }

    /// Copy `other` into this pose, reusing the allocation.
    pub fn copy_from(&mut self, other: &Pose) {
        self.bones.clear();
        self.bones.extend_from_slice(&other.bones);
    }
}

/// Skeleton capability used by clips and the pose blender.
pub trait Skeleton {
    fn bone_count(&self) -> usize;

    /// Current local pose; `pose().bone_count() == bone_count()`.
    fn pose(&self) -> &Pose;

    fn pose_mut(&mut self) -> &mut Pose;

    /// Called after a full pose write so derived bone/skin matrices can refresh.
    fn notify_pose_changed(&mut self);
}

/// Skeleton handle shared by the animations driving it (single-threaded).
pub type SharedSkeleton<S> = Rc<RefCell<S>>;

/// Wrap a skeleton for sharing between clip targets and a blender.
pub fn share<S: Skeleton>(skeleton: S) -> SharedSkeleton<S> {
    Rc::new(RefCell::new(skeleton))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix() {
        let m = BoneTransform::IDENTITY.to_matrix();
        for (c, col) in m.iter().enumerate() {
            for (r, v) in col.iter().enumerate() {
                let expected = if c == r { 1.0 } else { 0.0 };
                assert_eq!(*v, expected);
            }
        }
    }

    #[test]
    fn trs_matrix_columns() {
        let h = std::f32::consts::FRAC_1_SQRT_2;
        // 90 degrees about Z, scale 2 on x, translate (1,2,3)
        let t = BoneTransform {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, h, h],
            scale: [2.0, 1.0, 1.0],
        };
        let m = t.to_matrix();
        // x axis -> +y, scaled by 2
        assert!((m[0][0]).abs() < 1e-6);
        assert!((m[0][1] - 2.0).abs() < 1e-6);
        // y axis -> -x
        assert!((m[1][0] + 1.0).abs() < 1e-6);
        assert_eq!(m[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn set_bone_out_of_range() {
        let mut pose = Pose::new(2);
        let err = pose.set_bone(2, BoneTransform::IDENTITY).unwrap_err();
        assert_eq!(
            err,
            AnimationError::BoneOutOfRange {
                bone: 2,
                bone_count: 2
            }
        );
    }
}
