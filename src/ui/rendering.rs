//! Canvas rendering for compartments, reaction curves, and species nodes.
//!
//! Every visual parameter comes from the active configuration session, so a
//! preferences edit shows up immediately while the dialog is open and
//! vanishes again if it is cancelled.

use super::state::PathwayApp;
use crate::config::{edge_color_key, edge_dashed_key, edge_width_key, keys, Config, Rgba};
use crate::constants::{BEACON_RADIUS, CENTROID_MARK_RADIUS};
use crate::types::{Curve, Node, Reaction};
use eframe::egui;
use eframe::epaint::StrokeKind;

fn rgba_to_color32(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (c[0] * 255.0) as u8,
        (c[1] * 255.0) as u8,
        (c[2] * 255.0) as u8,
        (c[3] * 255.0) as u8,
    )
}

const BEACON_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(64, 64, 180, 128);

impl PathwayApp {
    /// Renders the network in layers: compartments, then reaction curves and
    /// centroid marks, then nodes and labels on top.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `canvas_rect` - The device-space rectangle of the canvas area
    pub fn render_network(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let config = self.configs.current();

        let background = if self.dark_mode {
            egui::Color32::from_gray(25)
        } else {
            egui::Color32::from_gray(245)
        };
        painter.rect_filled(canvas_rect, 0.0, background);

        if config.get_bool(keys::COMPARTMENT_ENABLED) {
            self.draw_compartments(painter, &config);
        }
        for rxn in &self.network.reactions {
            self.draw_reaction(painter, &config, rxn);
        }
        for node in &self.network.nodes {
            self.draw_node(painter, &config, node);
        }
        for node in &self.network.nodes {
            self.draw_node_label(painter, &config, node);
        }
    }

    fn draw_compartments(&self, painter: &egui::Painter, config: &Config) {
        let outline_enabled = config.get_bool(keys::COMPARTMENT_OUTLINE_ENABLED);
        let outline_width = config.get_number(keys::COMPARTMENT_OUTLINE_WIDTH) as f32;
        let outline_color = rgba_to_color32(config.get_color(keys::COMPARTMENT_OUTLINE_COLOR));

        for comp in &self.network.compartments {
            let rect = egui::Rect::from_min_max(
                self.viewport
                    .to_device(egui::pos2(comp.min_corner.0, comp.min_corner.1)),
                self.viewport
                    .to_device(egui::pos2(comp.max_corner.0, comp.max_corner.1)),
            );

            let mut fill = config.get_color(keys::COMPARTMENT_COLOR);
            if self.interaction.drop_target == Some(comp.id) {
                // brighten the drop target while a drag hovers over it
                fill[3] = (fill[3] * 2.0).min(1.0);
            }
            painter.rect_filled(rect, 0.0, rgba_to_color32(fill));
            if outline_enabled {
                painter.rect_stroke(
                    rect,
                    0.0,
                    egui::Stroke::new(outline_width, outline_color),
                    StrokeKind::Inside,
                );
            }
        }
    }

    fn draw_reaction(&self, painter: &egui::Painter, config: &Config, rxn: &Reaction) {
        let zoom = self.viewport.resolved_zoom();
        let centroid = self
            .viewport
            .to_device(egui::pos2(rxn.centroid.0, rxn.centroid.1));

        if self.interaction.beacons.contains(&rxn.id) {
            painter.circle_filled(centroid, BEACON_RADIUS * zoom, BEACON_COLOR);
        }

        for curve in &rxn.curves {
            self.draw_curve(painter, config, curve);
        }

        if config.get_bool(keys::CENTROID_ENABLED) {
            let radius = CENTROID_MARK_RADIUS * zoom;
            painter.circle_filled(
                centroid,
                radius,
                rgba_to_color32(config.get_color(keys::CENTROID_COLOR)),
            );
            if config.get_bool(keys::CENTROID_OUTLINE_ENABLED) {
                painter.circle_stroke(
                    centroid,
                    radius,
                    egui::Stroke::new(
                        config.get_number(keys::CENTROID_OUTLINE_WIDTH) as f32,
                        rgba_to_color32(config.get_color(keys::CENTROID_OUTLINE_COLOR)),
                    ),
                );
            }
        }
    }

    fn draw_curve(&self, painter: &egui::Painter, config: &Config, curve: &Curve) {
        let color = rgba_to_color32(config.get_color(edge_color_key(curve.role)));
        let width = config.get_number(edge_width_key(curve.role)) as f32;
        let dashed = config.get_bool(edge_dashed_key(curve.role));
        let stroke = egui::Stroke::new(width, color);

        // flatten the cubic into a short polyline; plenty at canvas scale
        let points: Vec<egui::Pos2> = (0..=16)
            .map(|i| {
                let t = i as f32 / 16.0;
                let p = cubic_point(curve, t);
                self.viewport.to_device(p)
            })
            .collect();

        if dashed {
            painter.add(egui::Shape::dashed_line(&points, stroke, 6.0, 4.0));
        } else {
            painter.add(egui::Shape::line(points, stroke));
        }
    }

    fn draw_node(&self, painter: &egui::Painter, config: &Config, node: &Node) {
        let zoom = self.viewport.resolved_zoom();
        let center = self
            .viewport
            .to_device(egui::pos2(node.centroid.0, node.centroid.1));
        let size = egui::vec2(node.width * zoom, node.height * zoom);
        let rect = egui::Rect::from_center_size(center, size);
        let corner = config.get_number(keys::NODE_CORNER_RADIUS) as f32 * zoom;

        if self.interaction.beacons.contains(&node.id) {
            painter.circle_filled(center, BEACON_RADIUS * zoom + size.x / 2.0, BEACON_COLOR);
        }

        let color1 = rgba_to_color32(config.get_color(keys::NODE_COLOR1));
        if config.get_choice(keys::NODE_EFFECT) == "advanced" {
            let color2 = rgba_to_color32(config.get_color(keys::NODE_COLOR2));
            let mut mesh = egui::Mesh::default();
            mesh.colored_vertex(rect.left_top(), color1);
            mesh.colored_vertex(rect.right_top(), color1);
            mesh.colored_vertex(rect.right_bottom(), color2);
            mesh.colored_vertex(rect.left_bottom(), color2);
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            painter.add(egui::Shape::mesh(mesh));
        } else {
            painter.rect_filled(rect, corner, color1);
        }

        let outline = egui::Stroke::new(
            config.get_number(keys::NODE_OUTLINE_WIDTH) as f32,
            rgba_to_color32(config.get_color(keys::NODE_OUTLINE_COLOR)),
        );
        if node.is_alias() {
            // aliases get a dashed outline so duplicates of a species stand out
            let corners = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
                rect.left_top(),
            ];
            painter.add(egui::Shape::dashed_line(&corners, outline, 4.0, 3.0));
        } else {
            painter.rect_stroke(rect, corner, outline, StrokeKind::Inside);
        }

        if node.is_locked() {
            painter.circle_filled(
                rect.right_top(),
                (3.0 * zoom).clamp(2.0, 6.0),
                egui::Color32::from_rgb(180, 60, 60),
            );
        }
    }

    fn draw_node_label(&self, painter: &egui::Painter, config: &Config, node: &Node) {
        let zoom = self.viewport.resolved_zoom();
        let center = self
            .viewport
            .to_device(egui::pos2(node.centroid.0, node.centroid.1));
        let font = egui::FontId::proportional((12.0 * zoom).clamp(8.0, 24.0));

        if config.get_bool(keys::TEXT_HALO_ENABLED) {
            let halo = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 90);
            for dx in [-1.0, 1.0] {
                for dy in [-1.0, 1.0] {
                    painter.text(
                        center + egui::vec2(dx, dy),
                        egui::Align2::CENTER_CENTER,
                        &node.name,
                        font.clone(),
                        halo,
                    );
                }
            }
        }

        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            &node.name,
            font,
            rgba_to_color32(config.get_color(keys::TEXT_COLOR)),
        );
    }
}

fn cubic_point(curve: &Curve, t: f32) -> egui::Pos2 {
    let u = 1.0 - t;
    let p0 = egui::vec2(curve.start.0, curve.start.1);
    let p1 = egui::vec2(curve.control1.0, curve.control1.1);
    let p2 = egui::vec2(curve.control2.0, curve.control2.1);
    let p3 = egui::vec2(curve.end.0, curve.end.1);
    let v = p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t);
    v.to_pos2()
}
