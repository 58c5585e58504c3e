//! Seam to the autolayout engine.
//!
//! The engine is an opaque, blocking collaborator that bulk-mutates node and
//! reaction geometry. The force-directed physics itself lives outside this
//! crate; [`GridLayout`] is the deterministic in-tree engine used by default,
//! and anything implementing [`LayoutEngine`] can be plugged in instead.

use eframe::egui;
use rand::Rng;

use crate::constants::{FIT_PADDING, NODE_HEIGHT, NODE_WIDTH};
use crate::types::Network;
use crate::viewport::{fit_descriptor, FitDescriptor};

/// A pluggable diagram layout engine.
///
/// Calls are synchronous and may take arbitrarily long; the caller treats
/// them as opaque blocking operations with no partial-progress visibility.
pub trait LayoutEngine {
    /// Scatters unlocked node centroids across the given world-space canvas,
    /// then recenters every reaction onto its participants.
    fn randomize(&mut self, network: &mut Network, canvas: egui::Rect);

    /// Arranges the network in place.
    ///
    /// # Arguments
    ///
    /// * `stiffness` - Spring stiffness (here: spacing driver)
    /// * `gravity` - Attraction toward the layout center
    ///
    /// # Returns
    ///
    /// `Ok(())` on success; on error the network passed in may be left in an
    /// arbitrary state, which is why callers go through
    /// [`run_guarded_autolayout`].
    fn autolayout(&mut self, network: &mut Network, stiffness: f64, gravity: f64)
        -> Result<(), String>;

    /// Computes the pan/zoom that fits the whole network inside `target`.
    ///
    /// # Returns
    ///
    /// `None` for an empty network.
    fn fit_window(&self, network: &Network, target: egui::Rect) -> Option<FitDescriptor> {
        let (min, max) = network.bounding_box()?;
        let world = egui::Rect::from_min_max(egui::pos2(min.0, min.1), egui::pos2(max.0, max.1));
        Some(fit_descriptor(world, target, FIT_PADDING))
    }
}

impl Default for Box<dyn LayoutEngine> {
    fn default() -> Self {
        Box::new(GridLayout)
    }
}

/// Runs an engine against a scratch copy of the network and commits the
/// result only on success, so a failed layout leaves the model unmodified.
///
/// # Arguments
///
/// * `network` - The live network; untouched unless the engine succeeds
/// * `engine` - The layout engine to run
/// * `stiffness` - Spring stiffness forwarded to the engine
/// * `gravity` - Gravity forwarded to the engine
pub fn run_guarded_autolayout(
    network: &mut Network,
    engine: &mut dyn LayoutEngine,
    stiffness: f64,
    gravity: f64,
) -> Result<(), String> {
    let mut scratch = network.clone();
    engine.autolayout(&mut scratch, stiffness, gravity)?;
    *network = scratch;
    Ok(())
}

/// Deterministic grid arrangement shipped as the default engine.
///
/// Unlocked nodes are placed row-major in creation order on a grid whose
/// spacing grows with stiffness and shrinks under gravity; locked nodes keep
/// their positions. Reactions are recentered onto their participants
/// afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

impl LayoutEngine for GridLayout {
    fn randomize(&mut self, network: &mut Network, canvas: egui::Rect) {
        let mut rng = rand::thread_rng();
        for node in &mut network.nodes {
            if node.locked {
                continue;
            }
            node.centroid = (
                rng.gen_range(canvas.min.x..=canvas.max.x),
                rng.gen_range(canvas.min.y..=canvas.max.y),
            );
        }
        let nodes = network.nodes.clone();
        for rxn in &mut network.reactions {
            rxn.recenter(&nodes);
        }
    }

    fn autolayout(
        &mut self,
        network: &mut Network,
        stiffness: f64,
        gravity: f64,
    ) -> Result<(), String> {
        if network.nodes.is_empty() {
            return Err("network has no nodes to lay out".to_string());
        }

        let gap = (stiffness.max(1.0) / (1.0 + gravity.max(0.0) / 100.0)) as f32;
        let cell_w = NODE_WIDTH + 2.0 * gap;
        let cell_h = NODE_HEIGHT + 2.0 * gap;
        let unlocked = network.nodes.iter().filter(|n| !n.locked).count();
        let columns = (unlocked as f32).sqrt().ceil().max(1.0) as usize;

        let mut slot = 0usize;
        for node in &mut network.nodes {
            if node.locked {
                continue;
            }
            let col = slot % columns;
            let row = slot / columns;
            node.centroid = (col as f32 * cell_w, row as f32 * cell_h);
            slot += 1;
        }

        let nodes = network.nodes.clone();
        for rxn in &mut network.reactions {
            rxn.recenter(&nodes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RxnRole;

    struct FailingEngine;

    impl LayoutEngine for FailingEngine {
        fn randomize(&mut self, _network: &mut Network, _canvas: egui::Rect) {}

        fn autolayout(
            &mut self,
            network: &mut Network,
            _stiffness: f64,
            _gravity: f64,
        ) -> Result<(), String> {
            // scribble over the model before failing, as a hostile engine might
            for node in &mut network.nodes {
                node.centroid = (f32::NAN, f32::NAN);
            }
            Err("engine exploded".to_string())
        }
    }

    #[test]
    fn guarded_autolayout_commits_on_success() {
        let mut net = Network::new();
        net.new_node("A".to_string(), (500.0, 500.0));
        net.new_node("B".to_string(), (600.0, 600.0));

        run_guarded_autolayout(&mut net, &mut GridLayout, 50.0, 0.0).unwrap();

        assert_eq!(net.nodes[0].centroid, (0.0, 0.0));
        assert_ne!(net.nodes[1].centroid, (600.0, 600.0));
    }

    #[test]
    fn guarded_autolayout_failure_leaves_model_unmodified() {
        let mut net = Network::new();
        net.new_node("A".to_string(), (123.0, 456.0));

        let err = run_guarded_autolayout(&mut net, &mut FailingEngine, 50.0, 0.0).unwrap_err();

        assert_eq!(err, "engine exploded");
        assert_eq!(net.nodes[0].centroid, (123.0, 456.0));
    }

    #[test]
    fn autolayout_on_empty_network_is_error() {
        let mut net = Network::new();
        assert!(GridLayout.autolayout(&mut net, 50.0, 0.0).is_err());
    }

    #[test]
    fn grid_layout_skips_locked_nodes() {
        let mut net = Network::new();
        let locked = net.new_node("L".to_string(), (999.0, 999.0));
        net.new_node("A".to_string(), (1.0, 1.0));
        net.node_mut(locked).unwrap().lock();

        GridLayout.autolayout(&mut net, 50.0, 0.0).unwrap();

        assert_eq!(net.node(locked).unwrap().centroid, (999.0, 999.0));
    }

    #[test]
    fn grid_layout_recenters_reactions() {
        let mut net = Network::new();
        let a = net.new_node("A".to_string(), (500.0, 0.0));
        let b = net.new_node("B".to_string(), (700.0, 0.0));
        let r = net.new_reaction("J0".to_string(), (-50.0, -50.0));
        net.connect(a, r, RxnRole::Substrate).unwrap();
        net.connect(b, r, RxnRole::Product).unwrap();

        GridLayout.autolayout(&mut net, 50.0, 0.0).unwrap();

        let rxn = net.reaction(r).unwrap();
        let pa = net.node(a).unwrap().centroid;
        let pb = net.node(b).unwrap().centroid;
        assert_eq!(rxn.centroid, ((pa.0 + pb.0) / 2.0, (pa.1 + pb.1) / 2.0));
    }

    #[test]
    fn randomize_keeps_nodes_inside_canvas() {
        let mut net = Network::new();
        for i in 0..20 {
            net.new_node(format!("N{i}"), (0.0, 0.0));
        }
        let canvas = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(200.0, 100.0));

        GridLayout.randomize(&mut net, canvas);

        for node in &net.nodes {
            assert!(canvas.contains(egui::pos2(node.centroid.0, node.centroid.1)));
        }
    }

    #[test]
    fn fit_window_none_for_empty_network() {
        let net = Network::new();
        let target = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0));
        assert!(GridLayout.fit_window(&net, target).is_none());
    }
}
