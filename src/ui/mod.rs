//! User interface components for the pathway tool.
//!
//! This module contains the main application struct and all UI plumbing:
//! the toolbar with its exclusive tool toggles, the canvas, and the modal
//! preferences window that edits configuration through a pushed session so
//! Cancel discards and Ok commits atomically.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main PathwayApp
//! - `canvas` - The tool-driven pointer interaction state machine
//! - `rendering` - Drawing compartments, reaction curves, and nodes

mod canvas;
mod rendering;
mod state;


pub use state::{Entity, GestureState, InteractionState, PathwayApp, ToolMode};

use crate::config::{keys, Config, OptionValue};
use crate::types::RxnRole;
use eframe::egui;

impl eframe::App for PathwayApp {
    /// Persist app state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::warn!("failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Lays out the toolbar and canvas, and shows the preferences window
    /// while a modal configuration session is open.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.config_dirty.replace(false) {
            ctx.request_repaint();
        }

        if self.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        self.draw_preferences_window(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}

impl PathwayApp {
    /// Draws the tool toggles, layout controls, and status readout.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for (mode, label) in [
                (ToolMode::Select, "Select"),
                (ToolMode::CreateNode, "Node"),
                (ToolMode::CreateLink, "Link"),
                (ToolMode::Erase, "Erase"),
                (ToolMode::Lock, "Lock"),
                (ToolMode::Alias, "Alias"),
            ] {
                if ui.selectable_label(self.tool == mode, label).clicked() {
                    self.tool = mode;
                }
            }

            ui.separator();

            let config = self.configs.current();
            let mut stiffness = config.get_number(keys::STIFFNESS);
            if ui
                .add(egui::Slider::new(&mut stiffness, 1.0..=200.0).text("Stiffness"))
                .changed()
            {
                config.set(keys::STIFFNESS, OptionValue::Number(stiffness));
            }
            let mut gravity = config.get_number(keys::GRAVITY);
            if ui
                .add(egui::Slider::new(&mut gravity, 0.0..=100.0).text("Gravity"))
                .changed()
            {
                config.set(keys::GRAVITY, OptionValue::Number(gravity));
            }

            ui.separator();

            if ui.button("Randomize").clicked() {
                self.randomize_layout();
            }
            if ui.button("Autolayout").clicked() {
                self.run_autolayout();
            }
            if ui.button("Fit").clicked() {
                self.fit_to_window();
            }

            ui.separator();

            if ui.button("New").clicked() {
                self.new_network();
            }
            if ui.button("Preferences…").clicked() {
                self.open_preferences();
            }

            let mode_icon = if self.dark_mode { "☀" } else { "🌙" };
            if ui.button(mode_icon).clicked() {
                self.dark_mode = !self.dark_mode;
            }

            if let Some(status) = &self.status {
                ui.separator();
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), status);
            }
        });
    }

    /// Allocates the canvas, runs the interaction controller over this
    /// frame's input, and renders the network.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.last_canvas_rect = Some(response.rect);
        self.handle_canvas_interactions(ui, &response);
        self.render_network(&painter, response.rect);
    }

    /// Opens the preferences window, branching a modal session off the
    /// active configuration and pushing it on the stack.
    pub fn open_preferences(&mut self) {
        if !self.configs.has_open_session() {
            let session = self.configs.current().derive();
            self.configs.push(session);
        }
        self.show_preferences = true;
    }

    /// Closes the preferences window, confirming or discarding the modal
    /// session.
    pub fn close_preferences(&mut self, confirm: bool) {
        if self.configs.has_open_session() {
            if confirm {
                self.configs.confirm();
            } else {
                self.configs.pop();
            }
        }
        self.show_preferences = false;
    }

    fn draw_preferences_window(&mut self, ctx: &egui::Context) {
        if !self.show_preferences {
            return;
        }

        let session = self.configs.current();
        let mut confirm: Option<bool> = None;

        egui::Window::new("Preferences")
            .collapsible(false)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let active = session.get_choice(keys::ACTIVE_CONFIG_SECTION);
                    for (value, label) in [
                        ("rendering", "Rendering"),
                        ("draw_style", "Draw Style"),
                        ("other", "Other"),
                    ] {
                        if ui.selectable_label(active == value, label).clicked() {
                            session.set(
                                keys::ACTIVE_CONFIG_SECTION,
                                OptionValue::Choice(value.to_string()),
                            );
                        }
                    }
                });
                ui.separator();

                match session.get_choice(keys::ACTIVE_CONFIG_SECTION).as_str() {
                    "draw_style" => draw_style_page(ui, &session),
                    "other" => other_page(ui, &session),
                    _ => rendering_page(ui, &session),
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Reset").clicked() {
                        session.reset_defaults();
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Ok").clicked() {
                            confirm = Some(true);
                        }
                        if ui.button("Cancel").clicked() {
                            confirm = Some(false);
                        }
                    });
                });
            });

        if let Some(confirm) = confirm {
            self.close_preferences(confirm);
        }
    }
}

fn config_checkbox(ui: &mut egui::Ui, session: &Config, key: &str, label: &str) {
    let mut value = session.get_bool(key);
    if ui.checkbox(&mut value, label).changed() {
        session.set(key, OptionValue::Bool(value));
    }
}

fn config_color(ui: &mut egui::Ui, session: &Config, key: &str, label: &str) {
    ui.horizontal(|ui| {
        let mut rgba = session.get_color(key);
        if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
            session.set(key, OptionValue::Color(rgba));
        }
        ui.label(label);
    });
}

fn config_width(ui: &mut egui::Ui, session: &Config, key: &str, label: &str) {
    let mut value = session.get_number(key);
    if ui
        .add(egui::Slider::new(&mut value, 0.5..=8.0).text(label))
        .changed()
    {
        session.set(key, OptionValue::Number(value));
    }
}

fn rendering_page(ui: &mut egui::Ui, session: &Config) {
    ui.horizontal(|ui| {
        ui.label("Node effect");
        for effect in ["advanced", "basic"] {
            let selected = session.get_choice(keys::NODE_EFFECT) == effect;
            if ui.selectable_label(selected, effect).clicked() {
                session.set(keys::NODE_EFFECT, OptionValue::Choice(effect.to_string()));
            }
        }
    });
    let mut radius = session.get_number(keys::NODE_CORNER_RADIUS);
    if ui
        .add(egui::Slider::new(&mut radius, 0.0..=16.0).text("Corner radius"))
        .changed()
    {
        session.set(keys::NODE_CORNER_RADIUS, OptionValue::Number(radius));
    }

    config_color(ui, session, keys::NODE_COLOR1, "Node color 1");
    config_color(ui, session, keys::NODE_COLOR2, "Node color 2");
    config_color(ui, session, keys::NODE_OUTLINE_COLOR, "Node outline");
    config_color(ui, session, keys::COMPARTMENT_COLOR, "Compartment");
    config_color(
        ui,
        session,
        keys::COMPARTMENT_OUTLINE_COLOR,
        "Compartment outline",
    );
    config_color(ui, session, keys::CENTROID_COLOR, "Centroid");
    config_color(ui, session, keys::CENTROID_OUTLINE_COLOR, "Centroid outline");
    config_color(ui, session, keys::TEXT_COLOR, "Text");

    config_checkbox(ui, session, keys::CENTROID_ENABLED, "Draw centroids");
    config_checkbox(ui, session, keys::COMPARTMENT_ENABLED, "Draw compartments");
    config_checkbox(
        ui,
        session,
        keys::COMPARTMENT_OUTLINE_ENABLED,
        "Compartment outlines",
    );
    config_checkbox(
        ui,
        session,
        keys::CENTROID_OUTLINE_ENABLED,
        "Centroid outlines",
    );
    config_checkbox(ui, session, keys::TEXT_HALO_ENABLED, "Text halo");

    config_width(ui, session, keys::NODE_OUTLINE_WIDTH, "Node outline width");
    config_width(
        ui,
        session,
        keys::COMPARTMENT_OUTLINE_WIDTH,
        "Compartment outline width",
    );
    config_width(
        ui,
        session,
        keys::CENTROID_OUTLINE_WIDTH,
        "Centroid outline width",
    );
}

fn draw_style_page(ui: &mut egui::Ui, session: &Config) {
    for role in [
        RxnRole::Substrate,
        RxnRole::Product,
        RxnRole::Activator,
        RxnRole::Inhibitor,
        RxnRole::Modifier,
    ] {
        ui.label(role.as_str());
        config_color(ui, session, crate::config::edge_color_key(role), "Color");
        config_width(ui, session, crate::config::edge_width_key(role), "Width");
        config_checkbox(ui, session, crate::config::edge_dashed_key(role), "Dashed");
        ui.separator();
    }
}

fn other_page(ui: &mut egui::Ui, session: &Config) {
    config_checkbox(
        ui,
        session,
        keys::AUTO_RECENTER_JUNCTIONS,
        "Auto-recenter junctions while dragging",
    );
    let mut stiffness = session.get_number(keys::STIFFNESS);
    if ui
        .add(egui::Slider::new(&mut stiffness, 1.0..=200.0).text("Stiffness"))
        .changed()
    {
        session.set(keys::STIFFNESS, OptionValue::Number(stiffness));
    }
    let mut gravity = session.get_number(keys::GRAVITY);
    if ui
        .add(egui::Slider::new(&mut gravity, 0.0..=100.0).text("Gravity"))
        .changed()
    {
        session.set(keys::GRAVITY, OptionValue::Number(gravity));
    }
}
