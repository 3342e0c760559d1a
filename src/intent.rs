//! Movement intent components.
//!
//! Intents carry raw player (or AI) input. The input system samples them once
//! per rendered frame and hands the result to the controller, which consumes
//! it at the fixed physics rate.

use bevy::prelude::*;

/// Raw movement input for a character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_move(Vec2::new(3.0, 4.0));
/// // Input is clamped to unit length
/// assert!((intent.axis.length() - 1.0).abs() < 1e-5);
///
/// intent.set_jump_pressed(true);
/// assert!(intent.is_jump_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Movement axis: `x` = right, `y` = forward. Never longer than 1.
    pub axis: Vec2,
    /// Whether the jump button is currently held.
    pub jump_pressed: bool,
    /// Held state seen by the previous sample (for edge detection).
    pub(crate) jump_pressed_prev: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axis, clamped to unit length.
    pub fn set_move(&mut self, axis: Vec2) {
        self.axis = axis.clamp_length_max(1.0);
    }

    /// Clear the movement axis.
    pub fn clear(&mut self) {
        self.axis = Vec2::ZERO;
    }

    /// Whether there is active movement input.
    pub fn is_moving(&self) -> bool {
        self.axis.length_squared() > 1e-6
    }

    /// Set the held state of the jump button.
    ///
    /// Call this every frame. A jump is requested on the frame the button goes
    /// from released to pressed.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Whether the jump button is currently held.
    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    /// Consume the rising edge of the jump button.
    ///
    /// Returns `true` once per press.
    pub(crate) fn take_jump_edge(&mut self) -> bool {
        let edge = self.jump_pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        edge
    }
}

/// Right/forward reference frame that 2D input maps onto.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct InputBasis {
    /// World direction of positive `x` input.
    pub right: Vec3,
    /// World direction of positive `y` input.
    pub forward: Vec3,
}

impl Default for InputBasis {
    fn default() -> Self {
        Self {
            right: Vec3::X,
            forward: Vec3::NEG_Z,
        }
    }
}

impl InputBasis {
    /// Create a basis from explicit axes.
    pub fn new(right: Vec3, forward: Vec3) -> Self {
        Self { right, forward }
    }

    /// Use a transform's right and forward directions.
    pub fn from_transform(transform: &GlobalTransform) -> Self {
        Self {
            right: *transform.right(),
            forward: *transform.forward(),
        }
    }
}

/// Makes input relative to another entity, usually the camera.
///
/// Without this component, input maps onto world `+X` (right) and `-Z`
/// (forward).
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct InputSpace(pub Entity);
