//! Deterministic hit-testing over the network.
//!
//! All picks scan entities in reverse creation order so the most recently
//! created overlapping entity wins ties, matching the draw order where later
//! entities appear on top. A miss is an ordinary `None`, never an error.

use crate::constants::REACTION_PICK_EXTENT;
use crate::types::{CompartmentId, Network, NodeId, ReactionId};

fn interval_contains(lo: f32, hi: f32, x: f32) -> bool {
    lo <= x && x <= hi
}

impl Network {
    /// Picks the topmost node whose box contains the given world point.
    ///
    /// # Arguments
    ///
    /// * `x` - World-space x coordinate
    /// * `y` - World-space y coordinate
    pub fn pick_node(&self, x: f32, y: f32) -> Option<NodeId> {
        for node in self.nodes.iter().rev() {
            let (cx, cy) = node.centroid;
            let hw = node.width / 2.0;
            let hh = node.height / 2.0;
            if interval_contains(cx - hw, cx + hw, x) && interval_contains(cy - hh, cy + hh, y) {
                return Some(node.id);
            }
        }
        None
    }

    /// Picks the topmost reaction whose fixed-size centroid box contains the
    /// given world point.
    pub fn pick_reaction(&self, x: f32, y: f32) -> Option<ReactionId> {
        for rxn in self.reactions.iter().rev() {
            let (cx, cy) = rxn.centroid;
            if interval_contains(cx - REACTION_PICK_EXTENT, cx + REACTION_PICK_EXTENT, x)
                && interval_contains(cy - REACTION_PICK_EXTENT, cy + REACTION_PICK_EXTENT, y)
            {
                return Some(rxn.id);
            }
        }
        None
    }

    /// Picks the topmost compartment whose rectangle contains the given world
    /// point.
    pub fn pick_compartment(&self, x: f32, y: f32) -> Option<CompartmentId> {
        for comp in self.compartments.iter().rev() {
            if interval_contains(comp.min_corner.0, comp.max_corner.0, x)
                && interval_contains(comp.min_corner.1, comp.max_corner.1, y)
            {
                return Some(comp.id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_node_prefers_most_recently_created() {
        let mut net = Network::new();
        let a = net.new_node("A".to_string(), (10.0, 10.0));
        let b = net.new_node("B".to_string(), (10.0, 10.0));

        assert_eq!(net.pick_node(10.0, 10.0), Some(b));

        net.remove_node(b);
        assert_eq!(net.pick_node(10.0, 10.0), Some(a));
    }

    #[test]
    fn pick_node_miss_is_none() {
        let mut net = Network::new();
        net.new_node("A".to_string(), (0.0, 0.0));
        assert_eq!(net.pick_node(1000.0, 1000.0), None);
    }

    #[test]
    fn pick_node_respects_box_extents() {
        let mut net = Network::new();
        let n = net.new_node("A".to_string(), (0.0, 0.0));
        let node = net.node(n).unwrap();
        let hw = node.width / 2.0;
        let hh = node.height / 2.0;

        assert_eq!(net.pick_node(hw, hh), Some(n));
        assert_eq!(net.pick_node(hw + 0.1, 0.0), None);
        assert_eq!(net.pick_node(0.0, -hh - 0.1), None);
    }

    #[test]
    fn pick_reaction_uses_fixed_extent() {
        let mut net = Network::new();
        let r = net.new_reaction("J0".to_string(), (100.0, 100.0));

        assert_eq!(
            net.pick_reaction(100.0 + REACTION_PICK_EXTENT, 100.0),
            Some(r)
        );
        assert_eq!(
            net.pick_reaction(100.0 + REACTION_PICK_EXTENT + 0.1, 100.0),
            None
        );
    }

    #[test]
    fn pick_compartment_topmost_wins() {
        let mut net = Network::new();
        let outer = net.new_compartment("outer".to_string(), (0.0, 0.0), (200.0, 200.0));
        let inner = net.new_compartment("inner".to_string(), (50.0, 50.0), (150.0, 150.0));

        assert_eq!(net.pick_compartment(100.0, 100.0), Some(inner));
        assert_eq!(net.pick_compartment(10.0, 10.0), Some(outer));
        assert_eq!(net.pick_compartment(-5.0, 10.0), None);
    }
}
