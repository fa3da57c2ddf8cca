//! Force-directed placement behind a pluggable physics provider.
//!
//! The layout engine only seeds starting positions and respects pins; the
//! provider decides how nodes move. [`ForceSimulation`] is the built-in
//! provider: a bounded number of steps of
//!
//! - repulsion between all node pairs (inverse square)
//! - collision separation inside `collision_radius`
//! - spring attraction along links towards `link_distance`
//! - attraction to the viewport center
//!
//! with damping, a velocity cap and a cooling factor so it always settles.

use crate::config::LayoutSettings;
use crate::model::{Link, Node, Position};
use std::collections::HashMap;

/// Physics simulation used for force layout.
///
/// Implementations must leave pinned nodes (`fx`/`fy` set) where they are
/// and must terminate. Nodes arrive with positions already seeded.
pub trait PhysicsProvider: Send + Sync {
    fn simulate(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings);
}

/// Built-in force simulation.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    /// Velocity damping per step (0 = frozen, 1 = no damping)
    pub damping: f64,

    /// Minimum distance for force calculation (prevents explosion)
    pub min_distance: f64,

    /// Maximum velocity per step (prevents instability)
    pub max_velocity: f64,

    /// Spring stiffness multiplier applied to link strength
    pub spring: f64,

    /// Kinetic energy below which the simulation stops early
    pub energy_threshold: f64,
}

impl Default for ForceSimulation {
    fn default() -> Self {
        Self {
            damping: 0.6,
            min_distance: 1.0,
            max_velocity: 50.0,
            spring: 0.1,
            energy_threshold: 0.01,
        }
    }
}

impl PhysicsProvider for ForceSimulation {
    fn simulate(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings) {
        let n = nodes.len();
        if n == 0 {
            return;
        }

        let (cx, cy) = settings.center();
        let center = Position::new(cx, cy);
        let mut positions: Vec<Position> = nodes
            .iter()
            .map(|node| node.position.unwrap_or(center))
            .collect();
        let fixed: Vec<bool> = nodes.iter().map(Node::is_pinned).collect();
        let mut velocities = vec![(0.0f64, 0.0f64); n];

        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();
        let springs: Vec<(usize, usize, f64)> = links
            .iter()
            .filter_map(|link| {
                let s = *index.get(link.source.as_str())?;
                let t = *index.get(link.target.as_str())?;
                (s != t).then_some((s, t, link.strength))
            })
            .collect();

        let iterations = settings.force_iterations;
        let mut steps = 0;
        for step in 0..iterations {
            steps += 1;
            // cooling: forces fade linearly towards the last step
            let alpha = 1.0 - step as f64 / iterations as f64;
            let mut forces = vec![(0.0f64, 0.0f64); n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let (dx, dy) = separation(&positions, i, j);
                    let dist = (dx * dx + dy * dy).sqrt().max(self.min_distance);
                    let (ux, uy) = (dx / dist, dy / dist);

                    let mut magnitude = settings.force_strength * alpha / (dist * dist) * 10.0;
                    let overlap = 2.0 * settings.collision_radius - dist;
                    if overlap > 0.0 {
                        magnitude += overlap * 0.5;
                    }
                    forces[i].0 += ux * magnitude;
                    forces[i].1 += uy * magnitude;
                    forces[j].0 -= ux * magnitude;
                    forces[j].1 -= uy * magnitude;
                }
            }

            for &(s, t, strength) in &springs {
                let (dx, dy) = separation(&positions, t, s);
                let dist = (dx * dx + dy * dy).sqrt().max(self.min_distance);
                let stretch = (dist - settings.link_distance) * self.spring * strength.max(0.05);
                let (fx, fy) = (dx / dist * stretch, dy / dist * stretch);
                forces[s].0 += fx;
                forces[s].1 += fy;
                forces[t].0 -= fx;
                forces[t].1 -= fy;
            }

            let mut energy = 0.0;
            for i in 0..n {
                if fixed[i] {
                    velocities[i] = (0.0, 0.0);
                    continue;
                }
                let to_center = (center.x - positions[i].x, center.y - positions[i].y);
                forces[i].0 += to_center.0 * settings.centering_strength;
                forces[i].1 += to_center.1 * settings.centering_strength;

                let (mut vx, mut vy) = velocities[i];
                vx = (vx + forces[i].0) * self.damping;
                vy = (vy + forces[i].1) * self.damping;
                let speed = (vx * vx + vy * vy).sqrt();
                if speed > self.max_velocity {
                    vx = vx / speed * self.max_velocity;
                    vy = vy / speed * self.max_velocity;
                }
                if !(vx.is_finite() && vy.is_finite()) {
                    vx = 0.0;
                    vy = 0.0;
                }
                velocities[i] = (vx, vy);
                positions[i].x += vx;
                positions[i].y += vy;
                energy += vx * vx + vy * vy;
            }

            if energy < self.energy_threshold {
                break;
            }
        }
        tracing::trace!(steps, nodes = n, "force simulation settled");

        for (node, pos) in nodes.iter_mut().zip(positions) {
            if !node.is_pinned() {
                node.place(pos.x, pos.y);
            }
        }
    }
}

/// Vector from `j` to `i`, nudged apart deterministically when they coincide.
fn separation(positions: &[Position], i: usize, j: usize) -> (f64, f64) {
    let dx = positions[i].x - positions[j].x;
    let dy = positions[i].y - positions[j].y;
    if dx.abs() < 1e-9 && dy.abs() < 1e-9 {
        let angle = (i * 31 + j * 17) as f64;
        (angle.cos() * 1e-3, angle.sin() * 1e-3)
    } else {
        (dx, dy)
    }
}
