//! Application state structures.
//!
//! This module contains the main application struct together with the tool
//! and gesture state the interaction controller runs on. Transient gesture
//! state lives here, in side tables owned by the controller, never on the
//! graph entities themselves.

use crate::config::{Config, ConfigStack};
use crate::layout::{GridLayout, LayoutEngine};
use crate::types::*;
use crate::viewport::ViewportTransform;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use uuid::Uuid;

/// The active editing tool. Exactly one tool is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolMode {
    /// Drag entities, pan the canvas, drop nodes into compartments
    Select,
    /// Plant nodes/compartments, or connect an existing entity
    CreateNode,
    /// Connect species to reactions by dragging between them
    CreateLink,
    /// Delete the entity under the pointer
    Erase,
    /// Toggle the autolayout lock of the node under the pointer
    Lock,
    /// Create an alias of the node under the pointer
    Alias,
}

/// A canvas entity a gesture can grab: a species node or a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A species node
    Node(NodeId),
    /// A reaction junction
    Reaction(ReactionId),
}

impl Entity {
    /// Returns the underlying entity id.
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Node(id) => *id,
            Entity::Reaction(id) => *id,
        }
    }

    /// Returns true for the node variant.
    pub fn is_node(&self) -> bool {
        matches!(self, Entity::Node(_))
    }
}

/// The pointer-gesture state machine driven by the interaction controller.
///
/// One pointer event is fully processed before the next is accepted, so at
/// most one gesture is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress
    #[default]
    Idle,
    /// Panning the canvas; `anchor` is the device-space press position
    Panning {
        /// Device-space position where the pan began
        anchor: egui::Pos2,
    },
    /// Dragging a node or reaction
    DraggingEntity {
        /// The grabbed entity
        entity: Entity,
        /// World-space pointer position at press time
        anchor_world: egui::Pos2,
        /// The entity's centroid at press time
        entity_anchor: (f32, f32),
    },
    /// Connect gesture from a source entity toward the opposite kind
    Connecting {
        /// The entity the gesture started on
        source: Entity,
        /// The current opposite-kind hover candidate, if any
        candidate: Option<Entity>,
    },
    /// A press on empty canvas that will place a node unless it travels far
    /// enough to become a compartment drag
    PlantingNode {
        /// Device-space press position, used for the promotion threshold
        anchor_device: egui::Pos2,
        /// World-space press position, one corner if promoted
        anchor_world: egui::Pos2,
    },
    /// Dragging out a compartment rectangle
    PlantingCompartment {
        /// World-space position of the fixed rectangle corner
        anchor_world: egui::Pos2,
    },
}

/// Transient interaction state owned by the controller.
///
/// Highlight flags are kept in side tables keyed by entity identity rather
/// than on the entities, so gestures never dirty the graph model.
#[derive(Default)]
pub struct InteractionState {
    /// Current gesture
    pub gesture: GestureState,
    /// World-space anchor of a pending right-button reaction plant
    pub plant_reaction_anchor: Option<egui::Pos2>,
    /// Entities carrying the connect-gesture hover highlight
    pub beacons: HashSet<Uuid>,
    /// Compartment the dragged entity would join if released now
    pub drop_target: Option<CompartmentId>,
}

/// The main application structure containing UI state and the network
/// being edited.
///
/// This struct implements the `eframe::App` trait and drives all user
/// interaction logic.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayApp {
    /// The reaction network being edited
    pub network: Network,
    /// The active editing tool
    pub tool: ToolMode,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Counter for generating unique default species names
    pub node_counter: u32,
    /// Counter for generating unique default reaction names
    pub reaction_counter: u32,
    /// Counter for generating unique default compartment names
    pub compartment_counter: u32,
    /// World/device coordinate mapping for the canvas
    #[serde(skip)]
    pub viewport: ViewportTransform,
    /// Transient gesture state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Layered configuration sessions; top of the stack is active
    #[serde(skip)]
    pub configs: ConfigStack,
    /// The autolayout engine collaborator
    #[serde(skip)]
    pub layout_engine: Box<dyn LayoutEngine>,
    /// Whether the preferences window is open
    #[serde(skip)]
    pub show_preferences: bool,
    /// Set by the config change listener to request a redraw
    #[serde(skip)]
    pub config_dirty: Rc<Cell<bool>>,
    /// Last reported layout failure, shown in the toolbar
    #[serde(skip)]
    pub status: Option<String>,
    /// Canvas rectangle from the last frame, used by fit operations
    #[serde(skip)]
    pub last_canvas_rect: Option<egui::Rect>,
}

impl Default for PathwayApp {
    fn default() -> Self {
        let app = Self {
            network: Network::default(),
            tool: ToolMode::Select,
            dark_mode: true,
            node_counter: 0,
            reaction_counter: 0,
            compartment_counter: 0,
            viewport: ViewportTransform::default(),
            interaction: InteractionState::default(),
            configs: ConfigStack::default(),
            layout_engine: Box::new(GridLayout),
            show_preferences: false,
            config_dirty: Rc::new(Cell::new(false)),
            status: None,
            last_canvas_rect: None,
        };
        app.install_config_listener();
        app
    }
}

impl PathwayApp {
    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the path of the persisted configuration record, next to the
    /// user's home directory when one is known.
    pub fn config_file_path() -> PathBuf {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_default();
        home.join(".pathway_tool.json")
    }

    /// Replaces the in-memory configuration root with one backed by the
    /// persisted record, re-registering the redraw listener.
    pub fn attach_persistent_config(&mut self) {
        self.configs = ConfigStack::new(Config::standalone(Self::config_file_path()));
        self.install_config_listener();
    }

    /// Registers a listener on the root session that flags the app for a
    /// redraw whenever any option changes.
    pub fn install_config_listener(&self) {
        let dirty = Rc::clone(&self.config_dirty);
        self.configs
            .current()
            .install_listener(move || dirty.set(true));
    }

    /// Returns a fresh default species name.
    pub fn next_node_name(&mut self) -> String {
        self.node_counter += 1;
        format!("Species {}", self.node_counter)
    }

    /// Returns a fresh default reaction name.
    pub fn next_reaction_name(&mut self) -> String {
        self.reaction_counter += 1;
        format!("Reaction {}", self.reaction_counter)
    }

    /// Returns a fresh default compartment name.
    pub fn next_compartment_name(&mut self) -> String {
        self.compartment_counter += 1;
        format!("Compartment {}", self.compartment_counter)
    }
}
