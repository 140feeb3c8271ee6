//! Collision layer system for filtering collision detection
//!
//! Bodies carry a layer (what they are) and a mask (what they collide
//! with); a candidate pair from the broad phase is only resolved when each
//! body's layer is present in the other's mask.

/// Collision layer definitions for pair filtering
pub struct CollisionLayers;

impl CollisionLayers {
    /// No collision layer
    pub const NONE: u32 = 0;

    /// All collision layers
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// Default layer for ordinary dynamic bodies
    pub const DEFAULT: u32 = 1 << 0;

    /// Static world geometry (floors, walls)
    pub const WORLD: u32 = 1 << 1;

    /// Debris and small bodies that may skip expensive pairs
    pub const DEBRIS: u32 = 1 << 2;

    /// Trigger volumes (detection only, no physical response)
    pub const TRIGGER: u32 = 1 << 3;

    /// Check if two bodies should collide based on their layers and masks
    ///
    /// `true` only when A's layer is in B's mask and B's layer is in A's
    /// mask — filtering is mutual.
    pub fn should_collide(layer_a: u32, mask_a: u32, layer_b: u32, mask_b: u32) -> bool {
        (layer_a & mask_b) != 0 && (layer_b & mask_a) != 0
    }

    /// Helper to create a mask from multiple layers
    pub fn mask(layers: &[u32]) -> u32 {
        layers.iter().fold(0, |acc, &layer| acc | layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collide_mutual() {
        assert!(CollisionLayers::should_collide(
            CollisionLayers::DEFAULT,
            CollisionLayers::WORLD,
            CollisionLayers::WORLD,
            CollisionLayers::DEFAULT,
        ));
    }

    #[test]
    fn test_should_not_collide_one_way() {
        // A wants B, but B's mask excludes A.
        assert!(!CollisionLayers::should_collide(
            CollisionLayers::DEFAULT,
            CollisionLayers::WORLD,
            CollisionLayers::WORLD,
            CollisionLayers::DEBRIS,
        ));
    }

    #[test]
    fn test_mask_creation() {
        let mask = CollisionLayers::mask(&[CollisionLayers::DEFAULT, CollisionLayers::WORLD]);
        assert_eq!(mask, CollisionLayers::DEFAULT | CollisionLayers::WORLD);
    }
}
