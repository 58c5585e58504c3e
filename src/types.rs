//! Core data types for reaction-network diagrams.
//!
//! This module defines the graph model edited on the canvas: species nodes,
//! reactions with role-tagged curves, and compartments. Entities are stored in
//! creation order, which hit-testing and rendering both rely on.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ALIAS_OFFSET, NODE_HEIGHT, NODE_WIDTH};

/// Unique identifier for species nodes.
pub type NodeId = Uuid;

/// Unique identifier for reactions.
pub type ReactionId = Uuid;

/// Unique identifier for compartments.
pub type CompartmentId = Uuid;

/// Role a species plays in a reaction it is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RxnRole {
    /// Consumed by the reaction
    Substrate,
    /// Produced by the reaction
    Product,
    /// Increases the reaction rate
    Activator,
    /// Decreases the reaction rate
    Inhibitor,
    /// Modifies the reaction in an unspecified way
    Modifier,
}

impl RxnRole {
    /// Returns the canonical uppercase name used in serialized documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            RxnRole::Substrate => "SUBSTRATE",
            RxnRole::Product => "PRODUCT",
            RxnRole::Activator => "ACTIVATOR",
            RxnRole::Inhibitor => "INHIBITOR",
            RxnRole::Modifier => "MODIFIER",
        }
    }
}

/// A species node drawn as a box on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// User-displayable species name
    pub name: String,
    /// Center position in world units as (x, y)
    pub centroid: (f32, f32),
    /// Box width in world units
    pub width: f32,
    /// Box height in world units
    pub height: f32,
    /// Whether autolayout may move this node
    pub locked: bool,
    /// When this node is an alias, the identity of the original node
    #[serde(default)]
    pub alias_of: Option<NodeId>,
}

impl Node {
    /// Creates a new node with a fresh identity and default dimensions.
    ///
    /// # Arguments
    ///
    /// * `name` - The display name for the species
    /// * `centroid` - The (x, y) center position in world units
    pub fn new(name: String, centroid: (f32, f32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            centroid,
            width: NODE_WIDTH,
            height: NODE_HEIGHT,
            locked: false,
            alias_of: None,
        }
    }

    /// Marks the node as immovable for autolayout.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Clears the autolayout lock.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Returns true if the node is locked against autolayout movement.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns true if this node is an alias of another node.
    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

/// A cubic spline connecting one species node to a reaction centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    /// Role the connected species plays in the reaction
    pub role: RxnRole,
    /// The species node this curve attaches to
    pub node: NodeId,
    /// Endpoint at the species node, world units
    pub start: (f32, f32),
    /// First control point
    pub control1: (f32, f32),
    /// Second control point
    pub control2: (f32, f32),
    /// Endpoint at the reaction centroid, world units
    pub end: (f32, f32),
}

fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// A reaction junction with role-tagged curves out to its participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Unique identifier for this reaction
    pub id: ReactionId,
    /// User-displayable reaction name
    pub name: String,
    /// Junction position in world units as (x, y)
    pub centroid: (f32, f32),
    /// Ordered curves out to the participating species
    pub curves: Vec<Curve>,
}

impl Reaction {
    /// Creates a new reaction with no participants.
    pub fn new(name: String, centroid: (f32, f32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            centroid,
            curves: Vec::new(),
        }
    }

    /// Returns true if the given node participates in this reaction.
    pub fn is_incident_to(&self, node: NodeId) -> bool {
        self.curves.iter().any(|c| c.node == node)
    }

    /// Moves the centroid to the average of all participating node centroids,
    /// then recomputes curve geometry. A reaction with no participants keeps
    /// its current centroid.
    ///
    /// # Arguments
    ///
    /// * `nodes` - The node table used to resolve participant positions
    pub fn recenter(&mut self, nodes: &[Node]) {
        let positions: Vec<(f32, f32)> = self
            .curves
            .iter()
            .filter_map(|c| nodes.iter().find(|n| n.id == c.node))
            .map(|n| n.centroid)
            .collect();
        if !positions.is_empty() {
            let count = positions.len() as f32;
            let sum = positions
                .iter()
                .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
            self.centroid = (sum.0 / count, sum.1 / count);
        }
        self.recalc_control_points(nodes);
    }

    /// Recomputes every curve's endpoints and control points from the current
    /// node and centroid positions. The centroid itself is left untouched, so
    /// this is the geometry-preserving counterpart of [`Reaction::recenter`].
    ///
    /// # Arguments
    ///
    /// * `nodes` - The node table used to resolve participant positions
    pub fn recalc_control_points(&mut self, nodes: &[Node]) {
        let centroid = self.centroid;
        for curve in &mut self.curves {
            if let Some(node) = nodes.iter().find(|n| n.id == curve.node) {
                curve.start = node.centroid;
                curve.end = centroid;
                curve.control1 = lerp(curve.start, curve.end, 1.0 / 3.0);
                curve.control2 = lerp(curve.start, curve.end, 2.0 / 3.0);
            }
        }
    }
}

/// A rectangular compartment that species nodes can be members of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compartment {
    /// Unique identifier for this compartment
    pub id: CompartmentId,
    /// User-displayable compartment name
    pub name: String,
    /// Smallest corner of the rectangle, world units
    pub min_corner: (f32, f32),
    /// Largest corner of the rectangle, world units
    pub max_corner: (f32, f32),
    /// Species nodes belonging to this compartment
    pub members: Vec<NodeId>,
}

impl Compartment {
    /// Creates a compartment spanning the normalized rectangle between two
    /// corner points given in any order.
    pub fn new(name: String, a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            min_corner: (a.0.min(b.0), a.1.min(b.1)),
            max_corner: (a.0.max(b.0), a.1.max(b.1)),
            members: Vec::new(),
        }
    }

    /// Adds a node to this compartment. Adding an existing member is a no-op.
    pub fn add(&mut self, node: NodeId) {
        if !self.members.contains(&node) {
            self.members.push(node);
        }
    }

    /// Returns true if the node is a member of this compartment.
    pub fn contains_member(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }
}

/// The reaction network being edited: nodes, reactions, and compartments in
/// stable creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    /// All species nodes, in creation order
    pub nodes: Vec<Node>,
    /// All reactions, in creation order
    pub reactions: Vec<Reaction>,
    /// All compartments, in creation order
    pub compartments: Vec<Compartment>,
}

impl Network {
    /// Creates a new empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the network to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a network from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Writes the network document to the given path.
    pub fn save_file(&self, path: &std::path::Path) -> Result<(), String> {
        let json = self.to_json().map_err(|err| err.to_string())?;
        std::fs::write(path, json).map_err(|err| err.to_string())
    }

    /// Reads a network document from the given path.
    pub fn load_file(path: &std::path::Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        Self::from_json(&text).map_err(|err| err.to_string())
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Looks up a reaction by id.
    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id == id)
    }

    /// Looks up a reaction by id, mutably.
    pub fn reaction_mut(&mut self, id: ReactionId) -> Option<&mut Reaction> {
        self.reactions.iter_mut().find(|r| r.id == id)
    }

    /// Looks up a compartment by id.
    pub fn compartment(&self, id: CompartmentId) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.id == id)
    }

    /// Looks up a compartment by id, mutably.
    pub fn compartment_mut(&mut self, id: CompartmentId) -> Option<&mut Compartment> {
        self.compartments.iter_mut().find(|c| c.id == id)
    }

    /// Adds a new species node at the given world position.
    ///
    /// # Returns
    ///
    /// The ID of the newly created node.
    pub fn new_node(&mut self, name: String, centroid: (f32, f32)) -> NodeId {
        let node = Node::new(name, centroid);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Adds a new reaction at the given world position.
    ///
    /// # Returns
    ///
    /// The ID of the newly created reaction.
    pub fn new_reaction(&mut self, name: String, centroid: (f32, f32)) -> ReactionId {
        let rxn = Reaction::new(name, centroid);
        let id = rxn.id;
        self.reactions.push(rxn);
        id
    }

    /// Adds a new compartment spanning the rectangle between two corner
    /// points given in any order.
    ///
    /// # Returns
    ///
    /// The ID of the newly created compartment.
    pub fn new_compartment(
        &mut self,
        name: String,
        a: (f32, f32),
        b: (f32, f32),
    ) -> CompartmentId {
        let comp = Compartment::new(name, a, b);
        let id = comp.id;
        self.compartments.push(comp);
        id
    }

    /// Creates an alias of an existing node: a new identity that displays the
    /// same species but holds its own position. Aliasing an alias points the
    /// new node at the original root identity.
    ///
    /// # Returns
    ///
    /// The ID of the alias node, or `None` if the source node does not exist.
    pub fn alias_node(&mut self, id: NodeId) -> Option<NodeId> {
        let src = self.node(id)?.clone();
        let root = src.alias_of.unwrap_or(src.id);
        let mut alias = src;
        alias.id = Uuid::new_v4();
        alias.alias_of = Some(root);
        alias.centroid = (alias.centroid.0 + ALIAS_OFFSET, alias.centroid.1 + ALIAS_OFFSET);
        let alias_id = alias.id;
        self.nodes.push(alias);
        Some(alias_id)
    }

    /// Removes a node, every curve attached to it, and its compartment
    /// memberships.
    ///
    /// # Returns
    ///
    /// `true` if the node was found and removed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        for rxn in &mut self.reactions {
            rxn.curves.retain(|c| c.node != id);
        }
        for comp in &mut self.compartments {
            comp.members.retain(|m| *m != id);
        }
        true
    }

    /// Removes a reaction and all of its curves.
    ///
    /// # Returns
    ///
    /// `true` if the reaction was found and removed.
    pub fn remove_reaction(&mut self, id: ReactionId) -> bool {
        let before = self.reactions.len();
        self.reactions.retain(|r| r.id != id);
        self.reactions.len() != before
    }

    /// Removes a compartment. Member nodes survive and simply lose the
    /// membership.
    ///
    /// # Returns
    ///
    /// `true` if the compartment was found and removed.
    pub fn remove_compartment(&mut self, id: CompartmentId) -> bool {
        let before = self.compartments.len();
        self.compartments.retain(|c| c.id != id);
        self.compartments.len() != before
    }

    /// Connects a species node to a reaction with the given role, appending a
    /// curve whose geometry is computed immediately.
    ///
    /// # Arguments
    ///
    /// * `node` - The participating species node
    /// * `reaction` - The reaction to connect to
    /// * `role` - The role the species plays in the reaction
    ///
    /// # Returns
    ///
    /// `Ok(())` on success, or an error message if either endpoint does not
    /// exist.
    pub fn connect(
        &mut self,
        node: NodeId,
        reaction: ReactionId,
        role: RxnRole,
    ) -> Result<(), String> {
        if self.node(node).is_none() {
            return Err("Species node does not exist".to_string());
        }
        let nodes = self.nodes.clone();
        let Some(rxn) = self.reaction_mut(reaction) else {
            return Err("Reaction does not exist".to_string());
        };
        rxn.curves.push(Curve {
            role,
            node,
            start: (0.0, 0.0),
            control1: (0.0, 0.0),
            control2: (0.0, 0.0),
            end: (0.0, 0.0),
        });
        rxn.recalc_control_points(&nodes);
        Ok(())
    }

    /// Recenters or recomputes every reaction incident to the given node,
    /// depending on whether junction auto-recentering is enabled.
    ///
    /// # Arguments
    ///
    /// * `node` - The node whose incident reactions should update
    /// * `auto_recenter` - When true, incident reactions move to the centroid
    ///   of their participants; otherwise only curve geometry is recomputed
    pub fn update_incident_reactions(&mut self, node: NodeId, auto_recenter: bool) {
        let nodes = self.nodes.clone();
        for rxn in &mut self.reactions {
            if rxn.is_incident_to(node) {
                if auto_recenter {
                    rxn.recenter(&nodes);
                } else {
                    rxn.recalc_control_points(&nodes);
                }
            }
        }
    }

    /// Computes the axis-aligned bounding box of everything in the network.
    ///
    /// # Returns
    ///
    /// `(min, max)` corners in world units, or `None` for an empty network.
    pub fn bounding_box(&self) -> Option<((f32, f32), (f32, f32))> {
        let mut bounds: Option<((f32, f32), (f32, f32))> = None;
        let mut extend = |min: (f32, f32), max: (f32, f32)| {
            bounds = Some(match bounds {
                None => (min, max),
                Some((bmin, bmax)) => (
                    (bmin.0.min(min.0), bmin.1.min(min.1)),
                    (bmax.0.max(max.0), bmax.1.max(max.1)),
                ),
            });
        };
        for node in &self.nodes {
            let (hw, hh) = (node.width / 2.0, node.height / 2.0);
            extend(
                (node.centroid.0 - hw, node.centroid.1 - hh),
                (node.centroid.0 + hw, node.centroid.1 + hh),
            );
        }
        for rxn in &self.reactions {
            extend(rxn.centroid, rxn.centroid);
        }
        for comp in &self.compartments {
            extend(comp.min_corner, comp.max_corner);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new("ATP".to_string(), (100.0, 200.0));
        assert_eq!(node.name, "ATP");
        assert_eq!(node.centroid, (100.0, 200.0));
        assert_eq!(node.width, NODE_WIDTH);
        assert!(!node.locked);
        assert!(node.alias_of.is_none());
        assert!(!node.id.is_nil());
    }

    #[test]
    fn test_node_lock_toggle() {
        let mut node = Node::new("S1".to_string(), (0.0, 0.0));
        assert!(!node.is_locked());
        node.lock();
        assert!(node.is_locked());
        node.unlock();
        assert!(!node.is_locked());
    }

    #[test]
    fn test_compartment_normalizes_corners() {
        let comp = Compartment::new("cytosol".to_string(), (50.0, -10.0), (-20.0, 30.0));
        assert_eq!(comp.min_corner, (-20.0, -10.0));
        assert_eq!(comp.max_corner, (50.0, 30.0));
    }

    #[test]
    fn test_compartment_add_is_idempotent() {
        let mut comp = Compartment::new("c".to_string(), (0.0, 0.0), (10.0, 10.0));
        let id = Uuid::new_v4();
        comp.add(id);
        comp.add(id);
        assert_eq!(comp.members.len(), 1);
        assert!(comp.contains_member(id));
    }

    #[test]
    fn test_connect_creates_role_tagged_curve() {
        let mut net = Network::new();
        let n = net.new_node("S1".to_string(), (0.0, 0.0));
        let r = net.new_reaction("J0".to_string(), (90.0, 0.0));

        net.connect(n, r, RxnRole::Substrate).unwrap();

        let rxn = net.reaction(r).unwrap();
        assert_eq!(rxn.curves.len(), 1);
        assert_eq!(rxn.curves[0].role, RxnRole::Substrate);
        assert_eq!(rxn.curves[0].node, n);
        assert_eq!(rxn.curves[0].start, (0.0, 0.0));
        assert_eq!(rxn.curves[0].end, (90.0, 0.0));
        assert!(rxn.is_incident_to(n));
    }

    #[test]
    fn test_connect_missing_endpoint_is_error() {
        let mut net = Network::new();
        let n = net.new_node("S1".to_string(), (0.0, 0.0));
        let bogus = Uuid::new_v4();

        assert!(net.connect(bogus, bogus, RxnRole::Product).is_err());
        assert!(net.connect(n, bogus, RxnRole::Product).is_err());
    }

    #[test]
    fn test_recenter_averages_participant_centroids() {
        let mut net = Network::new();
        let a = net.new_node("A".to_string(), (0.0, 0.0));
        let b = net.new_node("B".to_string(), (100.0, 40.0));
        let r = net.new_reaction("J0".to_string(), (500.0, 500.0));
        net.connect(a, r, RxnRole::Substrate).unwrap();
        net.connect(b, r, RxnRole::Product).unwrap();

        let nodes = net.nodes.clone();
        net.reaction_mut(r).unwrap().recenter(&nodes);

        assert_eq!(net.reaction(r).unwrap().centroid, (50.0, 20.0));
    }

    #[test]
    fn test_recalc_control_points_preserves_centroid() {
        let mut net = Network::new();
        let a = net.new_node("A".to_string(), (0.0, 0.0));
        let r = net.new_reaction("J0".to_string(), (60.0, 0.0));
        net.connect(a, r, RxnRole::Substrate).unwrap();

        net.node_mut(a).unwrap().centroid = (30.0, 30.0);
        let nodes = net.nodes.clone();
        net.reaction_mut(r).unwrap().recalc_control_points(&nodes);

        let rxn = net.reaction(r).unwrap();
        assert_eq!(rxn.centroid, (60.0, 0.0));
        assert_eq!(rxn.curves[0].start, (30.0, 30.0));
        assert_eq!(rxn.curves[0].end, (60.0, 0.0));
        assert_eq!(rxn.curves[0].control1, (40.0, 20.0));
        assert_eq!(rxn.curves[0].control2, (50.0, 10.0));
    }

    #[test]
    fn test_alias_node_references_root_identity() {
        let mut net = Network::new();
        let n = net.new_node("Glucose".to_string(), (10.0, 10.0));

        let a1 = net.alias_node(n).unwrap();
        let a2 = net.alias_node(a1).unwrap();

        let alias1 = net.node(a1).unwrap();
        let alias2 = net.node(a2).unwrap();
        assert_eq!(alias1.alias_of, Some(n));
        // aliasing an alias still points at the original root identity
        assert_eq!(alias2.alias_of, Some(n));
        assert_eq!(alias1.name, "Glucose");
        assert_ne!(alias1.centroid, net.node(n).unwrap().centroid);
    }

    #[test]
    fn test_alias_of_missing_node_returns_none() {
        let mut net = Network::new();
        assert!(net.alias_node(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_remove_node_drops_curves_and_memberships() {
        let mut net = Network::new();
        let a = net.new_node("A".to_string(), (0.0, 0.0));
        let b = net.new_node("B".to_string(), (100.0, 0.0));
        let r = net.new_reaction("J0".to_string(), (50.0, 0.0));
        net.connect(a, r, RxnRole::Substrate).unwrap();
        net.connect(b, r, RxnRole::Product).unwrap();
        let c = net.new_compartment("cyt".to_string(), (-50.0, -50.0), (200.0, 50.0));
        net.compartment_mut(c).unwrap().add(a);

        assert!(net.remove_node(a));

        assert!(net.node(a).is_none());
        let rxn = net.reaction(r).unwrap();
        assert_eq!(rxn.curves.len(), 1);
        assert_eq!(rxn.curves[0].node, b);
        assert!(!net.compartment(c).unwrap().contains_member(a));
    }

    #[test]
    fn test_remove_nonexistent_entities() {
        let mut net = Network::new();
        assert!(!net.remove_node(Uuid::new_v4()));
        assert!(!net.remove_reaction(Uuid::new_v4()));
        assert!(!net.remove_compartment(Uuid::new_v4()));
    }

    #[test]
    fn test_remove_compartment_keeps_members() {
        let mut net = Network::new();
        let n = net.new_node("A".to_string(), (0.0, 0.0));
        let c = net.new_compartment("cyt".to_string(), (0.0, 0.0), (10.0, 10.0));
        net.compartment_mut(c).unwrap().add(n);

        assert!(net.remove_compartment(c));
        assert!(net.node(n).is_some());
    }

    #[test]
    fn test_bounding_box_spans_all_entities() {
        let mut net = Network::new();
        assert!(net.bounding_box().is_none());

        net.new_node("A".to_string(), (0.0, 0.0));
        net.new_reaction("J0".to_string(), (300.0, -100.0));
        net.new_compartment("c".to_string(), (-200.0, 50.0), (-100.0, 150.0));

        let (min, max) = net.bounding_box().unwrap();
        assert_eq!(min, (-200.0, -100.0));
        assert_eq!(max, (300.0, 150.0));
    }

    #[test]
    fn test_network_json_roundtrip() {
        let mut net = Network::new();
        let n = net.new_node("S1".to_string(), (25.0, 75.0));
        let r = net.new_reaction("J0".to_string(), (80.0, 75.0));
        net.connect(n, r, RxnRole::Substrate).unwrap();
        net.new_compartment("cyt".to_string(), (0.0, 0.0), (200.0, 200.0));

        let json = net.to_json().unwrap();
        let restored = Network::from_json(&json).unwrap();

        assert_eq!(restored.nodes.len(), 1);
        assert_eq!(restored.reactions.len(), 1);
        assert_eq!(restored.compartments.len(), 1);
        assert_eq!(restored.nodes[0].id, n);
        assert_eq!(restored.reactions[0].curves[0].role, RxnRole::Substrate);
    }
}
