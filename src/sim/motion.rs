//! Reference motion updater
//!
//! Linear fall for objects, straight-line crawl with edge bounce for worms.
//! Hosts with their own animation loop can skip this and move things
//! themselves.

use super::state::GameObject;
use super::worm::WormObject;

/// Advance falling objects by `dt` seconds and cull those below the
/// viewport. Returns how many were culled.
pub fn step_objects(pool: &mut Vec<GameObject>, dt: f32, viewport_height_px: f32) -> usize {
    for obj in pool.iter_mut() {
        obj.y += obj.fall_speed * dt;
    }
    let before = pool.len();
    pool.retain(|obj| obj.y <= viewport_height_px);
    before - pool.len()
}

fn reflect(pos: &mut f32, vel: &mut f32) {
    if *pos < 0.0 {
        *pos = -*pos;
        *vel = vel.abs();
    } else if *pos > 100.0 {
        *pos = 200.0 - *pos;
        *vel = -vel.abs();
    }
    *pos = pos.clamp(0.0, 100.0);
}

/// Move live worms by `dt` seconds, scaled by the session speed factor
pub fn step_worms(worms: &mut [WormObject], speed_factor: f32, dt: f32) {
    for worm in worms.iter_mut().filter(|w| w.alive) {
        worm.pos += worm.velocity * speed_factor * dt;
        reflect(&mut worm.pos.x, &mut worm.velocity.x);
        reflect(&mut worm.pos.y, &mut worm.velocity.y);
        worm.angle = worm.velocity.y.atan2(worm.velocity.x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::VocabularyItem;
    use crate::sim::state::Lane;
    use glam::Vec2;

    #[test]
    fn test_objects_fall_and_cull() {
        let item = VocabularyItem::new("🍎", "apple");
        let mut pool = vec![
            GameObject {
                id: 1,
                item,
                lane: Lane::Left,
                x: 20.0,
                y: -50.0,
                fall_speed: 100.0,
                size: 80.0,
            },
            GameObject {
                id: 2,
                item,
                lane: Lane::Right,
                x: 70.0,
                y: 760.0,
                fall_speed: 100.0,
                size: 80.0,
            },
        ];
        let culled = step_objects(&mut pool, 0.5, 768.0);
        assert_eq!(culled, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].y, 0.0);
    }

    #[test]
    fn test_worm_bounces_off_edge() {
        let mut worms = vec![WormObject {
            id: 1,
            pos: Vec2::new(98.0, 50.0),
            velocity: Vec2::new(10.0, 0.0),
            alive: true,
            angle: 0.0,
        }];
        step_worms(&mut worms, 1.0, 0.5);
        assert!((worms[0].pos.x - 97.0).abs() < 1e-4);
        assert!(worms[0].velocity.x < 0.0);
        assert!((worms[0].angle - std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn test_speed_factor_scales_and_dead_worms_stay() {
        let mut worms = vec![
            WormObject {
                id: 1,
                pos: Vec2::new(50.0, 50.0),
                velocity: Vec2::new(2.0, 0.0),
                alive: true,
                angle: 0.0,
            },
            WormObject {
                id: 2,
                pos: Vec2::new(50.0, 50.0),
                velocity: Vec2::new(2.0, 0.0),
                alive: false,
                angle: 0.0,
            },
        ];
        step_worms(&mut worms, 2.0, 1.0);
        assert_eq!(worms[0].pos.x, 54.0);
        assert_eq!(worms[1].pos.x, 50.0);
    }
}
