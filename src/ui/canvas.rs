//! Canvas interaction: the tool-driven pointer state machine.
//!
//! Pointer events arrive in device space, are mapped to world space through
//! the viewport transform, and are dispatched on the active tool and the
//! current gesture. Hit-test misses are ordinary control flow here, never
//! errors: a miss simply selects the empty-canvas branch of the transition
//! table.

use super::state::{Entity, GestureState, PathwayApp, ToolMode};
use crate::config::keys;
use crate::constants::PLANT_COMPARTMENT_THRESHOLD_SQ;
use crate::layout::run_guarded_autolayout;
use crate::types::RxnRole;
use crate::viewport::ViewportTransform;
use eframe::egui;

impl PathwayApp {
    /// Processes one frame of canvas input: wheel zoom, then pointer
    /// press/move/release edges in event order.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_canvas_interactions(&mut self, ui: &egui::Ui, response: &egui::Response) {
        self.handle_wheel_zoom(ui, response);

        let pointer = ui
            .input(|i| i.pointer.latest_pos())
            .or_else(|| response.interact_pointer_pos());
        let Some(pos) = pointer else {
            return;
        };

        let (pressed, released) = ui.input(|i| {
            (
                [
                    i.pointer.button_pressed(egui::PointerButton::Primary),
                    i.pointer.button_pressed(egui::PointerButton::Middle),
                    i.pointer.button_pressed(egui::PointerButton::Secondary),
                ],
                [
                    i.pointer.button_released(egui::PointerButton::Primary),
                    i.pointer.button_released(egui::PointerButton::Middle),
                    i.pointer.button_released(egui::PointerButton::Secondary),
                ],
            )
        });
        let buttons = [
            egui::PointerButton::Primary,
            egui::PointerButton::Middle,
            egui::PointerButton::Secondary,
        ];

        // Presses only count inside the canvas; moves and releases are always
        // processed so a gesture that wanders off the widget still resolves.
        if response.rect.contains(pos) {
            for (button, down) in buttons.iter().zip(pressed) {
                if down {
                    self.pointer_down(*button, pos);
                }
            }
        }

        self.pointer_move(pos);

        for (button, up) in buttons.iter().zip(released) {
            if up {
                self.pointer_up(*button, pos);
            }
        }
    }

    /// Applies wheel input as a multiplicative zoom on the live transform.
    pub fn handle_wheel_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll == 0.0 {
            return;
        }
        if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
            if response.rect.contains(pos) {
                self.viewport
                    .apply_zoom_delta(ViewportTransform::zoom_multiplier(scroll));
            }
        }
    }

    /// Pointer-press transition, dispatched on the active tool.
    ///
    /// # Arguments
    ///
    /// * `button` - Which pointer button went down
    /// * `device` - Press position in device space
    pub fn pointer_down(&mut self, button: egui::PointerButton, device: egui::Pos2) {
        match button {
            egui::PointerButton::Middle => {
                // middle button pans regardless of the active tool
                if self.interaction.gesture == GestureState::Idle {
                    self.interaction.gesture = GestureState::Panning { anchor: device };
                }
                return;
            }
            egui::PointerButton::Secondary => {
                let world = self.viewport.to_world(device);
                self.interaction.plant_reaction_anchor = Some(world);
                return;
            }
            egui::PointerButton::Primary => {}
            _ => return,
        }

        if self.interaction.gesture != GestureState::Idle {
            return;
        }
        let world = self.viewport.to_world(device);

        match self.tool {
            ToolMode::Select => {
                if let Some(id) = self.network.pick_node(world.x, world.y) {
                    let centroid = self.network.node(id).map(|n| n.centroid).unwrap_or_default();
                    self.interaction.gesture = GestureState::DraggingEntity {
                        entity: Entity::Node(id),
                        anchor_world: world,
                        entity_anchor: centroid,
                    };
                } else if let Some(id) = self.network.pick_reaction(world.x, world.y) {
                    let centroid = self
                        .network
                        .reaction(id)
                        .map(|r| r.centroid)
                        .unwrap_or_default();
                    self.interaction.gesture = GestureState::DraggingEntity {
                        entity: Entity::Reaction(id),
                        anchor_world: world,
                        entity_anchor: centroid,
                    };
                } else {
                    self.interaction.gesture = GestureState::Panning { anchor: device };
                }
            }
            ToolMode::Lock => {
                if let Some(node) = self
                    .network
                    .pick_node(world.x, world.y)
                    .and_then(|id| self.network.node_mut(id))
                {
                    if node.is_locked() {
                        node.unlock();
                    } else {
                        node.lock();
                    }
                }
            }
            ToolMode::Erase => {
                if let Some(id) = self.network.pick_node(world.x, world.y) {
                    self.network.remove_node(id);
                } else if let Some(id) = self.network.pick_reaction(world.x, world.y) {
                    self.network.remove_reaction(id);
                } else if let Some(id) = self.network.pick_compartment(world.x, world.y) {
                    self.network.remove_compartment(id);
                }
            }
            ToolMode::Alias => {
                if let Some(id) = self.network.pick_node(world.x, world.y) {
                    self.network.alias_node(id);
                }
            }
            ToolMode::CreateNode | ToolMode::CreateLink => {
                if let Some(id) = self.network.pick_node(world.x, world.y) {
                    self.interaction.beacons.insert(id);
                    self.interaction.gesture = GestureState::Connecting {
                        source: Entity::Node(id),
                        candidate: None,
                    };
                } else if let Some(id) = self.network.pick_reaction(world.x, world.y) {
                    self.interaction.beacons.insert(id);
                    self.interaction.gesture = GestureState::Connecting {
                        source: Entity::Reaction(id),
                        candidate: None,
                    };
                } else {
                    self.interaction.gesture = GestureState::PlantingNode {
                        anchor_device: device,
                        anchor_world: world,
                    };
                }
            }
        }
    }

    /// Pointer-move transition, dispatched on the current gesture.
    pub fn pointer_move(&mut self, device: egui::Pos2) {
        let world = self.viewport.to_world(device);

        match self.interaction.gesture {
            GestureState::Panning { anchor } => {
                self.viewport.set_post_pan(device - anchor);
            }
            GestureState::DraggingEntity {
                entity,
                anchor_world,
                entity_anchor,
            } => {
                let delta = world - anchor_world;
                let auto_recenter = self
                    .configs
                    .current()
                    .get_bool(keys::AUTO_RECENTER_JUNCTIONS);
                match entity {
                    Entity::Node(id) => {
                        if let Some(node) = self.network.node_mut(id) {
                            node.centroid =
                                (entity_anchor.0 + delta.x, entity_anchor.1 + delta.y);
                        }
                        self.network.update_incident_reactions(id, auto_recenter);
                        // live highlight only; membership changes on release
                        self.interaction.drop_target =
                            self.network.pick_compartment(world.x, world.y);
                    }
                    Entity::Reaction(id) => {
                        let nodes = self.network.nodes.clone();
                        if let Some(rxn) = self.network.reaction_mut(id) {
                            rxn.centroid =
                                (entity_anchor.0 + delta.x, entity_anchor.1 + delta.y);
                            if auto_recenter {
                                rxn.recenter(&nodes);
                            } else {
                                rxn.recalc_control_points(&nodes);
                            }
                        }
                    }
                }
            }
            GestureState::Connecting { source, candidate } => {
                // hit-test the opposite kind from the source; the candidate
                // only changes when something is actually hit
                let hit = if source.is_node() {
                    self.network
                        .pick_reaction(world.x, world.y)
                        .map(Entity::Reaction)
                } else {
                    self.network.pick_node(world.x, world.y).map(Entity::Node)
                };
                if let Some(new) = hit {
                    if candidate != Some(new) {
                        if let Some(old) = candidate {
                            self.interaction.beacons.remove(&old.id());
                        }
                        self.interaction.beacons.insert(new.id());
                        self.interaction.gesture = GestureState::Connecting {
                            source,
                            candidate: Some(new),
                        };
                    }
                }
            }
            GestureState::PlantingNode {
                anchor_device,
                anchor_world,
            } => {
                if (device - anchor_device).length_sq() > PLANT_COMPARTMENT_THRESHOLD_SQ {
                    self.interaction.gesture = GestureState::PlantingCompartment { anchor_world };
                }
            }
            GestureState::PlantingCompartment { .. } | GestureState::Idle => {}
        }
    }

    /// Pointer-release transition, resolving the current gesture.
    ///
    /// # Arguments
    ///
    /// * `button` - Which pointer button went up
    /// * `device` - Release position in device space
    pub fn pointer_up(&mut self, button: egui::PointerButton, device: egui::Pos2) {
        let world = self.viewport.to_world(device);

        match button {
            egui::PointerButton::Middle => {
                if matches!(self.interaction.gesture, GestureState::Panning { .. }) {
                    self.viewport.commit_pan();
                    self.interaction.gesture = GestureState::Idle;
                }
                return;
            }
            egui::PointerButton::Secondary => {
                if self.interaction.plant_reaction_anchor.take().is_some() {
                    let name = self.next_reaction_name();
                    self.network.new_reaction(name, (world.x, world.y));
                }
                return;
            }
            egui::PointerButton::Primary => {}
            _ => return,
        }

        match std::mem::take(&mut self.interaction.gesture) {
            GestureState::Idle => {}
            GestureState::Panning { .. } => {
                self.viewport.commit_pan();
            }
            GestureState::DraggingEntity { entity, .. } => {
                if let Entity::Node(node_id) = entity {
                    if let Some(comp_id) = self.interaction.drop_target {
                        if let Some(comp) = self.network.compartment_mut(comp_id) {
                            if !comp.contains_member(node_id) {
                                comp.add(node_id);
                            }
                        }
                    }
                }
                self.interaction.drop_target = None;
                self.interaction.beacons.clear();
            }
            GestureState::Connecting { source, candidate } => {
                self.interaction.beacons.clear();
                let link = match (source, candidate) {
                    (Entity::Node(n), Some(Entity::Reaction(r))) => {
                        Some((n, r, RxnRole::Substrate))
                    }
                    (Entity::Reaction(r), Some(Entity::Node(n))) => Some((n, r, RxnRole::Product)),
                    _ => None,
                };
                if let Some((node, rxn, role)) = link {
                    if let Err(err) = self.network.connect(node, rxn, role) {
                        log::warn!("connect failed: {err}");
                    }
                }
            }
            GestureState::PlantingNode { .. } => {
                let name = self.next_node_name();
                self.network.new_node(name, (world.x, world.y));
            }
            GestureState::PlantingCompartment { anchor_world } => {
                let name = self.next_compartment_name();
                self.network.new_compartment(
                    name,
                    (anchor_world.x, anchor_world.y),
                    (world.x, world.y),
                );
            }
        }
    }

    /// Runs the layout engine's randomize pass over the world region
    /// currently visible in the canvas.
    pub fn randomize_layout(&mut self) {
        let Some(rect) = self.last_canvas_rect else {
            return;
        };
        let canvas = egui::Rect::from_min_max(
            self.viewport.to_world(rect.min),
            self.viewport.to_world(rect.max),
        );
        self.layout_engine.randomize(&mut self.network, canvas);
    }

    /// Runs the blocking autolayout call with stiffness and gravity taken
    /// from the active configuration, then refits the view. A failure is
    /// reported in the toolbar status and leaves the network unmodified.
    pub fn run_autolayout(&mut self) {
        let config = self.configs.current();
        let stiffness = config.get_number(keys::STIFFNESS);
        let gravity = config.get_number(keys::GRAVITY);
        match run_guarded_autolayout(
            &mut self.network,
            self.layout_engine.as_mut(),
            stiffness,
            gravity,
        ) {
            Ok(()) => {
                self.status = None;
                self.fit_to_window();
            }
            Err(err) => {
                log::error!("autolayout failed: {err}");
                self.status = Some(format!("Autolayout failed: {err}"));
            }
        }
    }

    /// Replaces the network with an empty one and resets the view.
    pub fn new_network(&mut self) {
        self.network = crate::types::Network::default();
        self.viewport.reset();
        self.interaction = super::state::InteractionState::default();
        self.status = None;
    }

    /// Loads a network document from disk and fits it into the canvas.
    ///
    /// # Returns
    ///
    /// `Ok(())` on success, or the load error with the current network left
    /// untouched.
    pub fn load_network(&mut self, path: &std::path::Path) -> Result<(), String> {
        let network = crate::types::Network::load_file(path)?;
        log::info!("loaded network from {}", path.display());
        self.network = network;
        self.interaction = super::state::InteractionState::default();
        self.fit_to_window();
        Ok(())
    }

    /// Fits the whole diagram into the canvas.
    pub fn fit_to_window(&mut self) {
        let Some(rect) = self.last_canvas_rect else {
            return;
        };
        if let Some(fit) = self.layout_engine.fit_window(&self.network, rect) {
            self.viewport.apply_fit(fit);
        }
    }
}
