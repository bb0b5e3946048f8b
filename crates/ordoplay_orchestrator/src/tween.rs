// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform tweens: move, rotate, scale and look-at.

use crate::scene::{EntityId, Transform};
use crate::step::{Step, StepContext, StepStatus};
use serde::{Deserialize, Serialize};

/// Easing curve applied to tween progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Hold the start value, jump at the end
    Constant,
    /// Linear progress
    #[default]
    Linear,
    /// Quadratic ease in
    EaseIn,
    /// Quadratic ease out
    EaseOut,
    /// Smoothstep ease in/out
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Constant => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Interpolate Vec3
    pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Spherical linear interpolation for quaternions
    pub fn slerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        let mut dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];

        // Take the short way round
        let mut b = b;
        if dot < 0.0 {
            b = [-b[0], -b[1], -b[2], -b[3]];
            dot = -dot;
        }

        if dot > 0.9995 {
            return normalize_quat([
                Self::lerp(a[0], b[0], t),
                Self::lerp(a[1], b[1], t),
                Self::lerp(a[2], b[2], t),
                Self::lerp(a[3], b[3], t),
            ]);
        }

        let theta_0 = dot.acos();
        let theta = theta_0 * t;
        let sin_theta_0 = theta_0.sin();

        let s0 = (theta_0 - theta).sin() / sin_theta_0;
        let s1 = theta.sin() / sin_theta_0;

        [
            a[0] * s0 + b[0] * s1,
            a[1] * s0 + b[1] * s1,
            a[2] * s0 + b[2] * s1,
            a[3] * s0 + b[3] * s1,
        ]
    }

    /// Rotation that turns the +Z forward axis towards `direction`
    pub fn look_rotation(direction: [f32; 3]) -> Option<[f32; 4]> {
        let len = (direction[0] * direction[0]
            + direction[1] * direction[1]
            + direction[2] * direction[2])
            .sqrt();
        if len < 1e-6 {
            return None;
        }
        let d = [direction[0] / len, direction[1] / len, direction[2] / len];

        // Shortest arc from (0, 0, 1) to d
        let dot = d[2];
        if dot < -0.9999 {
            return Some([0.0, 1.0, 0.0, 0.0]);
        }
        let axis = [-d[1], d[0], 0.0];
        Some(normalize_quat([axis[0], axis[1], axis[2], 1.0 + dot]))
    }
}

fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len < 1e-6 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
}

/// What a tween animates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TweenTarget {
    /// Move to a position
    Position([f32; 3]),
    /// Rotate to a quaternion (x, y, z, w)
    Rotation([f32; 4]),
    /// Scale to a size
    Scale([f32; 3]),
    /// Turn to face a world point
    LookAt([f32; 3]),
}

impl TweenTarget {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Position(_) => "move-to",
            Self::Rotation(_) => "rotate-to",
            Self::Scale(_) => "scale-to",
            Self::LookAt(_) => "look-at",
        }
    }
}

/// Interpolate one channel of an entity transform over time.
///
/// The start value is sampled on enter, so re-entering restarts the tween
/// from wherever the entity currently is. Each tick rewrites only the animated
/// channel, so tweens on different channels of one entity can run side by
/// side. A missing entity fails the step.
#[derive(Debug, Clone)]
pub struct TweenStep {
    /// Animated entity
    pub entity: EntityId,
    /// Channel and end value
    pub target: TweenTarget,
    /// Duration in seconds
    pub duration: f32,
    /// Easing curve
    pub easing: Easing,
    elapsed: f32,
    from: Option<Transform>,
    look_rotation: Option<[f32; 4]>,
}

impl TweenStep {
    /// Create a tween for any channel
    pub fn new(entity: EntityId, target: TweenTarget, duration: f32, easing: Easing) -> Self {
        Self {
            entity,
            target,
            duration,
            easing,
            elapsed: 0.0,
            from: None,
            look_rotation: None,
        }
    }

    /// Move to a position
    pub fn move_to(entity: EntityId, position: [f32; 3], duration: f32, easing: Easing) -> Self {
        Self::new(entity, TweenTarget::Position(position), duration, easing)
    }

    /// Rotate to a quaternion
    pub fn rotate_to(entity: EntityId, rotation: [f32; 4], duration: f32, easing: Easing) -> Self {
        Self::new(entity, TweenTarget::Rotation(rotation), duration, easing)
    }

    /// Scale to a size
    pub fn scale_to(entity: EntityId, scale: [f32; 3], duration: f32, easing: Easing) -> Self {
        Self::new(entity, TweenTarget::Scale(scale), duration, easing)
    }

    /// Turn to face a point
    pub fn look_at(entity: EntityId, point: [f32; 3], duration: f32, easing: Easing) -> Self {
        Self::new(entity, TweenTarget::LookAt(point), duration, easing)
    }

    /// Write the animated channel into `current`, leaving the others alone
    fn sample(&self, from: &Transform, current: Transform, t: f32) -> Transform {
        let mut out = current;
        match self.target {
            TweenTarget::Position(to) => {
                out.position = Interpolation::lerp_vec3(from.position, to, t);
            }
            TweenTarget::Scale(to) => {
                out.scale = Interpolation::lerp_vec3(from.scale, to, t);
            }
            TweenTarget::Rotation(to) => {
                out.rotation = Interpolation::slerp(from.rotation, to, t);
            }
            TweenTarget::LookAt(_) => {
                if let Some(to) = self.look_rotation {
                    out.rotation = Interpolation::slerp(from.rotation, to, t);
                }
            }
        }
        out
    }
}

impl Step for TweenStep {
    fn label(&self) -> &str {
        self.target.name()
    }

    fn on_enter(&mut self, ctx: &StepContext<'_>) {
        self.elapsed = 0.0;
        self.from = ctx.scene().transform(self.entity);
        self.look_rotation = match (self.target, self.from) {
            (TweenTarget::LookAt(point), Some(from)) => Interpolation::look_rotation([
                point[0] - from.position[0],
                point[1] - from.position[1],
                point[2] - from.position[2],
            ]),
            _ => None,
        };
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        let (Some(from), Some(current)) = (self.from, ctx.scene().transform(self.entity)) else {
            tracing::warn!(
                "Sequence '{}': {} target {:?} not found",
                ctx.sequence,
                self.target.name(),
                self.entity
            );
            return StepStatus::Failed;
        };

        self.elapsed += dt;
        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };

        let transform = self.sample(&from, current, self.easing.apply(progress));
        if !ctx.scene().set_transform(self.entity, transform) {
            tracing::warn!(
                "Sequence '{}': {} could not write transform of {:?}",
                ctx.sequence,
                self.target.name(),
                self.entity
            );
            return StepStatus::Failed;
        }

        if progress >= 1.0 {
            StepStatus::Succeeded
        } else {
            StepStatus::Running
        }
    }
}
