//! Transactional configuration overlays.
//!
//! Options live in layered sessions: each session holds a sparse map of
//! overrides resolved against a process-wide default table, and a session
//! derived from a parent starts as a copy of the parent's state. Edits stay
//! private to the session until [`Config::propagate`] or [`Config::finalize`]
//! pushes them into the parent; dropping a session (or popping it off a
//! [`ConfigStack`]) discards them. This gives modal dialogs commit-or-discard
//! semantics without ever touching the live configuration.
//!
//! Listener broadcast is synchronous and runs on the caller's stack. A
//! listener must not call `set` on the session that is notifying it; that
//! reentrancy is a caller obligation, not a guarded error.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::OnceLock;

use crate::types::RxnRole;

/// An RGBA color with all channels in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Well-known option names. Every key listed here has an entry in the default
/// table, so lookups through [`Config::get`] can never fail.
pub mod keys {
    /// When true, dragging a node recenters incident reactions to the
    /// centroid of their participants; otherwise only curve geometry updates.
    pub const AUTO_RECENTER_JUNCTIONS: &str = "auto_recenter_junctions";
    /// Spring stiffness handed to the autolayout engine.
    pub const STIFFNESS: &str = "stiffness";
    /// Gravity handed to the autolayout engine.
    pub const GRAVITY: &str = "gravity";
    /// Whether reaction centroid marks are drawn.
    pub const CENTROID_ENABLED: &str = "centroid_enabled";
    /// Whether compartments are drawn.
    pub const COMPARTMENT_ENABLED: &str = "compartment_enabled";
    /// Whether compartment outlines are drawn.
    pub const COMPARTMENT_OUTLINE_ENABLED: &str = "compartment_outline_enabled";
    /// Whether centroid outlines are drawn.
    pub const CENTROID_OUTLINE_ENABLED: &str = "centroid_outline_enabled";
    /// Whether node labels get a halo for readability.
    pub const TEXT_HALO_ENABLED: &str = "text_halo_enabled";
    /// Node fill effect: "advanced" (gradient) or "basic" (flat).
    pub const NODE_EFFECT: &str = "node_effect";
    /// Corner radius of node boxes, world units.
    pub const NODE_CORNER_RADIUS: &str = "node_corner_radius";
    /// Top gradient color / flat fill color of nodes.
    pub const NODE_COLOR1: &str = "node_color1";
    /// Bottom gradient color of nodes.
    pub const NODE_COLOR2: &str = "node_color2";
    /// Node outline color.
    pub const NODE_OUTLINE_COLOR: &str = "node_outline_color";
    /// Compartment fill color.
    pub const COMPARTMENT_COLOR: &str = "compartment_color";
    /// Compartment outline color.
    pub const COMPARTMENT_OUTLINE_COLOR: &str = "compartment_outline_color";
    /// Label text color.
    pub const TEXT_COLOR: &str = "text_color";
    /// Reaction centroid mark color.
    pub const CENTROID_COLOR: &str = "centroid_color";
    /// Reaction centroid outline color.
    pub const CENTROID_OUTLINE_COLOR: &str = "centroid_outline_color";
    /// Substrate edge color.
    pub const SUBSTRATE_EDGE_COLOR: &str = "substrate_edge_color";
    /// Product edge color.
    pub const PRODUCT_EDGE_COLOR: &str = "product_edge_color";
    /// Activator edge color.
    pub const ACTIVATOR_EDGE_COLOR: &str = "activator_edge_color";
    /// Inhibitor edge color.
    pub const INHIBITOR_EDGE_COLOR: &str = "inhibitor_edge_color";
    /// Modifier edge color.
    pub const MODIFIER_EDGE_COLOR: &str = "modifier_edge_color";
    /// Node outline stroke width.
    pub const NODE_OUTLINE_WIDTH: &str = "node_outline_width";
    /// Compartment outline stroke width.
    pub const COMPARTMENT_OUTLINE_WIDTH: &str = "compartment_outline_width";
    /// Centroid outline stroke width.
    pub const CENTROID_OUTLINE_WIDTH: &str = "centroid_outline_width";
    /// Substrate edge stroke width.
    pub const SUBSTRATE_EDGE_WIDTH: &str = "substrate_edge_width";
    /// Product edge stroke width.
    pub const PRODUCT_EDGE_WIDTH: &str = "product_edge_width";
    /// Activator edge stroke width.
    pub const ACTIVATOR_EDGE_WIDTH: &str = "activator_edge_width";
    /// Inhibitor edge stroke width.
    pub const INHIBITOR_EDGE_WIDTH: &str = "inhibitor_edge_width";
    /// Modifier edge stroke width.
    pub const MODIFIER_EDGE_WIDTH: &str = "modifier_edge_width";
    /// Whether substrate edges are dashed.
    pub const SUBSTRATE_EDGE_DASHED: &str = "substrate_edge_dashed";
    /// Whether product edges are dashed.
    pub const PRODUCT_EDGE_DASHED: &str = "product_edge_dashed";
    /// Whether activator edges are dashed.
    pub const ACTIVATOR_EDGE_DASHED: &str = "activator_edge_dashed";
    /// Whether inhibitor edges are dashed.
    pub const INHIBITOR_EDGE_DASHED: &str = "inhibitor_edge_dashed";
    /// Whether modifier edges are dashed.
    pub const MODIFIER_EDGE_DASHED: &str = "modifier_edge_dashed";
    /// Which preferences section was last open.
    pub const ACTIVE_CONFIG_SECTION: &str = "active_config_section";
}

/// Returns the edge color option name for a reaction role.
pub fn edge_color_key(role: RxnRole) -> &'static str {
    match role {
        RxnRole::Substrate => keys::SUBSTRATE_EDGE_COLOR,
        RxnRole::Product => keys::PRODUCT_EDGE_COLOR,
        RxnRole::Activator => keys::ACTIVATOR_EDGE_COLOR,
        RxnRole::Inhibitor => keys::INHIBITOR_EDGE_COLOR,
        RxnRole::Modifier => keys::MODIFIER_EDGE_COLOR,
    }
}

/// Returns the edge width option name for a reaction role.
pub fn edge_width_key(role: RxnRole) -> &'static str {
    match role {
        RxnRole::Substrate => keys::SUBSTRATE_EDGE_WIDTH,
        RxnRole::Product => keys::PRODUCT_EDGE_WIDTH,
        RxnRole::Activator => keys::ACTIVATOR_EDGE_WIDTH,
        RxnRole::Inhibitor => keys::INHIBITOR_EDGE_WIDTH,
        RxnRole::Modifier => keys::MODIFIER_EDGE_WIDTH,
    }
}

/// Returns the edge dash option name for a reaction role.
pub fn edge_dashed_key(role: RxnRole) -> &'static str {
    match role {
        RxnRole::Substrate => keys::SUBSTRATE_EDGE_DASHED,
        RxnRole::Product => keys::PRODUCT_EDGE_DASHED,
        RxnRole::Activator => keys::ACTIVATOR_EDGE_DASHED,
        RxnRole::Inhibitor => keys::INHIBITOR_EDGE_DASHED,
        RxnRole::Modifier => keys::MODIFIER_EDGE_DASHED,
    }
}

/// The value of a single option.
///
/// Serialized untagged, so the persisted configuration record is a flat
/// name-to-scalar/tuple JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A boolean toggle
    Bool(bool),
    /// A numeric value
    Number(f64),
    /// An RGBA color, channels in [0, 1]
    Color(Rgba),
    /// One of a small set of named choices
    Choice(String),
}

impl OptionValue {
    /// Returns the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric value, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the color value, if this is a `Color`.
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            OptionValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the choice string, if this is a `Choice`.
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            OptionValue::Choice(s) => Some(s),
            _ => None,
        }
    }
}

fn color(r: f32, g: f32, b: f32, a: f32) -> OptionValue {
    OptionValue::Color([r, g, b, a])
}

/// Returns the process-wide default option table.
///
/// The table is total: every key in [`keys`] resolves to a documented
/// default. It is initialized once and never mutated afterwards.
pub fn default_options() -> &'static BTreeMap<&'static str, OptionValue> {
    static TABLE: OnceLock<BTreeMap<&'static str, OptionValue>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = BTreeMap::new();
        // dialog
        t.insert(
            keys::ACTIVE_CONFIG_SECTION,
            OptionValue::Choice("rendering".to_string()),
        );
        // global toggles
        t.insert(keys::CENTROID_ENABLED, OptionValue::Bool(true));
        t.insert(keys::COMPARTMENT_ENABLED, OptionValue::Bool(true));
        t.insert(keys::COMPARTMENT_OUTLINE_ENABLED, OptionValue::Bool(true));
        t.insert(keys::CENTROID_OUTLINE_ENABLED, OptionValue::Bool(true));
        t.insert(keys::TEXT_HALO_ENABLED, OptionValue::Bool(true));
        // effects
        t.insert(
            keys::NODE_EFFECT,
            OptionValue::Choice("advanced".to_string()),
        );
        t.insert(keys::NODE_CORNER_RADIUS, OptionValue::Number(4.0));
        // colors
        t.insert(keys::NODE_COLOR1, color(0.8, 0.9, 0.95, 1.0));
        t.insert(keys::NODE_COLOR2, color(0.1, 0.4, 0.9, 1.0));
        t.insert(keys::NODE_OUTLINE_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::COMPARTMENT_COLOR, color(0.6, 0.3, 0.8, 0.3));
        t.insert(keys::COMPARTMENT_OUTLINE_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::TEXT_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::CENTROID_COLOR, color(0.5, 0.9, 0.5, 0.5));
        t.insert(keys::CENTROID_OUTLINE_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::SUBSTRATE_EDGE_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::PRODUCT_EDGE_COLOR, color(0.0, 0.0, 0.0, 1.0));
        t.insert(keys::ACTIVATOR_EDGE_COLOR, color(0.2, 0.2, 0.4, 1.0));
        t.insert(keys::INHIBITOR_EDGE_COLOR, color(1.0, 0.5, 0.5, 1.0));
        t.insert(keys::MODIFIER_EDGE_COLOR, color(0.2, 0.2, 0.4, 1.0));
        // outline and edge widths
        t.insert(keys::NODE_OUTLINE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::COMPARTMENT_OUTLINE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::CENTROID_OUTLINE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::SUBSTRATE_EDGE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::PRODUCT_EDGE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::ACTIVATOR_EDGE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::INHIBITOR_EDGE_WIDTH, OptionValue::Number(1.0));
        t.insert(keys::MODIFIER_EDGE_WIDTH, OptionValue::Number(1.0));
        // dashes
        t.insert(keys::SUBSTRATE_EDGE_DASHED, OptionValue::Bool(false));
        t.insert(keys::PRODUCT_EDGE_DASHED, OptionValue::Bool(false));
        t.insert(keys::ACTIVATOR_EDGE_DASHED, OptionValue::Bool(true));
        t.insert(keys::INHIBITOR_EDGE_DASHED, OptionValue::Bool(true));
        t.insert(keys::MODIFIER_EDGE_DASHED, OptionValue::Bool(true));
        // interaction and layout
        t.insert(keys::AUTO_RECENTER_JUNCTIONS, OptionValue::Bool(false));
        t.insert(keys::STIFFNESS, OptionValue::Number(50.0));
        t.insert(keys::GRAVITY, OptionValue::Number(0.0));
        t
    })
}

/// The sparse override map of one session. Unknown keys resolve through the
/// default table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigState {
    overrides: BTreeMap<String, OptionValue>,
}

impl ConfigState {
    /// Resolves a key: the local override if present, else the default.
    ///
    /// # Panics
    ///
    /// Panics on a key that is not in the default table; that is a
    /// programming error, not a runtime condition.
    pub fn get(&self, key: &str) -> OptionValue {
        if let Some(v) = self.overrides.get(key) {
            return v.clone();
        }
        default_options()
            .get(key)
            .cloned()
            .unwrap_or_else(|| panic!("unknown option `{key}`"))
    }

    /// Writes a local override.
    pub fn set(&mut self, key: &str, value: OptionValue) {
        self.overrides.insert(key.to_string(), value);
    }

    /// Returns the override map merged over the full default table.
    pub fn resolved(&self) -> BTreeMap<String, OptionValue> {
        let mut out: BTreeMap<String, OptionValue> = default_options()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (k, v) in &self.overrides {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// Returns a copy of the override map only.
    pub fn overrides(&self) -> BTreeMap<String, OptionValue> {
        self.overrides.clone()
    }
}

struct Listener {
    id: u64,
    callback: Box<dyn FnMut()>,
}

/// Handle returned by [`Config::install_listener`]; pass it back to
/// [`Config::remove_listener`] to unsubscribe.
#[derive(Debug)]
pub struct ListenerHandle(u64);

struct Session {
    state: ConfigState,
    parent: Option<Weak<RefCell<Session>>>,
    listeners: Vec<Listener>,
    next_listener: u64,
    file_path: Option<PathBuf>,
}

/// One branch of configuration overrides, shared by handle.
///
/// Cloning a `Config` clones the handle, not the session; use
/// [`Config::derive`] to branch a private copy.
#[derive(Clone)]
pub struct Config {
    inner: Rc<RefCell<Session>>,
}

impl Config {
    fn from_session(session: Session) -> Self {
        Self {
            inner: Rc::new(RefCell::new(session)),
        }
    }

    /// Creates a root session with no backing file and no overrides.
    pub fn new_root() -> Self {
        Self::from_session(Session {
            state: ConfigState::default(),
            parent: None,
            listeners: Vec::new(),
            next_listener: 0,
            file_path: None,
        })
    }

    /// Creates a root session backed by the given file.
    ///
    /// The file is read immediately; a missing or unreadable file falls back
    /// to the full default table. [`Config::finalize`] on this session (or on
    /// any session derived from it) writes the resolved state back.
    pub fn standalone(path: PathBuf) -> Self {
        let config = Self::new_root();
        config.inner.borrow_mut().file_path = Some(path.clone());
        match std::fs::read_to_string(&path) {
            Ok(text) => match config.deserialize(&text) {
                Ok(()) => log::info!("read configuration from {}", path.display()),
                Err(err) => {
                    log::warn!("ignoring malformed config file {}: {err}", path.display());
                    config.reset_defaults();
                }
            },
            Err(_) => {
                log::info!(
                    "config file {} does not exist - using defaults",
                    path.display()
                );
                config.reset_defaults();
            }
        }
        config
    }

    /// Branches a child session whose state is a copy of this session's state
    /// at the time of the call. Later writes on either side stay private
    /// until the child propagates.
    pub fn derive(&self) -> Self {
        let state = self.inner.borrow().state.clone();
        Self::from_session(Session {
            state,
            parent: Some(Rc::downgrade(&self.inner)),
            listeners: Vec::new(),
            next_listener: 0,
            file_path: None,
        })
    }

    /// Returns true if this session has no parent.
    pub fn is_root(&self) -> bool {
        self.inner.borrow().parent.is_none()
    }

    /// Resolves an option: local override first, then the default table.
    /// Never fails for a known key.
    pub fn get(&self, key: &str) -> OptionValue {
        self.inner.borrow().state.get(key)
    }

    /// Resolves a boolean option. A type-mismatched override falls back to
    /// the documented default.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .as_bool()
            .or_else(|| default_options().get(key).and_then(OptionValue::as_bool))
            .unwrap_or(false)
    }

    /// Resolves a numeric option. A type-mismatched override falls back to
    /// the documented default.
    pub fn get_number(&self, key: &str) -> f64 {
        self.get(key)
            .as_number()
            .or_else(|| default_options().get(key).and_then(OptionValue::as_number))
            .unwrap_or(0.0)
    }

    /// Resolves a color option. A type-mismatched override falls back to the
    /// documented default.
    pub fn get_color(&self, key: &str) -> Rgba {
        self.get(key)
            .as_color()
            .or_else(|| default_options().get(key).and_then(OptionValue::as_color))
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }

    /// Resolves a choice option. A type-mismatched override falls back to the
    /// documented default.
    pub fn get_choice(&self, key: &str) -> String {
        match self.get(key) {
            OptionValue::Choice(s) => s,
            _ => default_options()
                .get(key)
                .and_then(|v| v.as_choice().map(str::to_string))
                .unwrap_or_default(),
        }
    }

    /// Writes an override into this session and synchronously notifies every
    /// registered listener.
    pub fn set(&self, key: &str, value: OptionValue) {
        self.inner.borrow_mut().state.set(key, value);
        self.notify();
    }

    /// Merges a batch of overrides, then notifies listeners once.
    pub fn set_options(&self, opts: BTreeMap<String, OptionValue>) {
        {
            let mut inner = self.inner.borrow_mut();
            for (k, v) in opts {
                inner.state.set(&k, v);
            }
        }
        self.notify();
    }

    /// Overwrites the session with the full default table and notifies
    /// listeners.
    pub fn reset_defaults(&self) {
        let defaults = default_options()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.set_options(defaults);
    }

    /// Registers a callback invoked synchronously after every write.
    ///
    /// # Returns
    ///
    /// A handle that can be passed to [`Config::remove_listener`].
    pub fn install_listener(&self, callback: impl FnMut() + 'static) -> ListenerHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.push(Listener {
            id,
            callback: Box::new(callback),
        });
        ListenerHandle(id)
    }

    /// Unsubscribes a previously installed listener.
    pub fn remove_listener(&self, handle: ListenerHandle) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|l| l.id != handle.0);
    }

    // Listeners are moved out for the duration of the broadcast so a callback
    // may read this session without tripping the borrow.
    fn notify(&self) {
        let mut listeners = std::mem::take(&mut self.inner.borrow_mut().listeners);
        for listener in &mut listeners {
            (listener.callback)();
        }
        let mut inner = self.inner.borrow_mut();
        let added = std::mem::take(&mut inner.listeners);
        listeners.extend(added);
        inner.listeners = listeners;
    }

    fn parent(&self) -> Option<Config> {
        let weak = self.inner.borrow().parent.clone()?;
        weak.upgrade().map(|inner| Config { inner })
    }

    /// Merges this session's overrides into the parent (local values win) and
    /// notifies the parent's listeners. No-op on a root session.
    pub fn propagate(&self) {
        if let Some(parent) = self.parent() {
            let overrides = self.inner.borrow().state.overrides();
            parent.set_options(overrides);
        }
    }

    /// Propagates, then persists: a child delegates persistence up the parent
    /// chain, and the root writes the full resolved state to its backing file
    /// (if it has one). A write failure is logged, never fatal.
    pub fn finalize(&self) {
        self.propagate();
        match self.parent() {
            Some(parent) => parent.finalize(),
            None => {
                let path = self.inner.borrow().file_path.clone();
                if let Some(path) = path {
                    match std::fs::write(&path, self.serialize()) {
                        Ok(()) => log::info!("wrote configuration to {}", path.display()),
                        Err(err) => {
                            log::warn!("unable to write config file {}: {err}", path.display())
                        }
                    }
                }
            }
        }
    }

    /// Serializes the full resolved state as a flat JSON document.
    pub fn serialize(&self) -> String {
        let resolved = self.inner.borrow().state.resolved();
        // a BTreeMap of plain scalars/tuples cannot fail to serialize
        serde_json::to_string_pretty(&resolved).unwrap_or_default()
    }

    /// Merges options parsed from a flat JSON document into this session.
    pub fn deserialize(&self, text: &str) -> Result<(), serde_json::Error> {
        let opts: BTreeMap<String, OptionValue> = serde_json::from_str(text)?;
        self.set_options(opts);
        Ok(())
    }
}

/// Push/pop/confirm discipline over nested sessions.
///
/// The top of the stack is the active session. At most one session may be
/// open (pushed but not yet popped or confirmed) at a time; that discipline
/// is the caller's responsibility and is not runtime-locked.
pub struct ConfigStack {
    stack: Vec<Config>,
}

impl Default for ConfigStack {
    fn default() -> Self {
        Self::new(Config::new_root())
    }
}

impl ConfigStack {
    /// Creates a stack whose bottom (and initial current) session is `root`.
    pub fn new(root: Config) -> Self {
        Self { stack: vec![root] }
    }

    /// Returns a handle to the active session.
    pub fn current(&self) -> Config {
        self.stack
            .last()
            .expect("config stack is never empty")
            .clone()
    }

    /// Returns true if a modal session is currently open.
    pub fn has_open_session(&self) -> bool {
        self.stack.len() > 1
    }

    /// Makes `session` the active session, parented to the previous current.
    pub fn push(&mut self, session: Config) {
        let top = self.current();
        session.inner.borrow_mut().parent = Some(Rc::downgrade(&top.inner));
        self.stack.push(session);
    }

    /// Discards the active session and restores the previous one.
    ///
    /// # Panics
    ///
    /// Panics if no session has been pushed; popping the root is a
    /// precondition violation.
    pub fn pop(&mut self) -> Config {
        assert!(
            self.stack.len() > 1,
            "pop with no matching push on config stack"
        );
        self.stack.pop().expect("stack checked non-empty")
    }

    /// Finalizes the active session (merging its edits into the parent and
    /// persisting through the root), then pops it.
    ///
    /// # Panics
    ///
    /// Panics if no session has been pushed.
    pub fn confirm(&mut self) {
        assert!(
            self.stack.len() > 1,
            "confirm with no open session on config stack"
        );
        self.current().finalize();
        self.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_returns_documented_default_for_untouched_key() {
        let config = Config::new_root();
        assert!(!config.get_bool(keys::AUTO_RECENTER_JUNCTIONS));
        assert_eq!(config.get_number(keys::STIFFNESS), 50.0);
        assert_eq!(config.get_color(keys::NODE_COLOR1), [0.8, 0.9, 0.95, 1.0]);
        assert_eq!(config.get_choice(keys::NODE_EFFECT), "advanced");
    }

    #[test]
    #[should_panic(expected = "unknown option")]
    fn get_unknown_key_panics() {
        let config = Config::new_root();
        config.get("no_such_option");
    }

    #[test]
    fn child_edits_never_reach_parent_before_propagate() {
        let parent = Config::new_root();
        let child = parent.derive();

        child.set(keys::STIFFNESS, OptionValue::Number(80.0));
        child.set(keys::CENTROID_ENABLED, OptionValue::Bool(false));

        assert_eq!(parent.get_number(keys::STIFFNESS), 50.0);
        assert!(parent.get_bool(keys::CENTROID_ENABLED));
        assert_eq!(child.get_number(keys::STIFFNESS), 80.0);
    }

    #[test]
    fn parent_edits_after_branch_do_not_appear_in_child() {
        let parent = Config::new_root();
        parent.set(keys::STIFFNESS, OptionValue::Number(10.0));
        let child = parent.derive();

        parent.set(keys::STIFFNESS, OptionValue::Number(99.0));

        // the child keeps the copy it branched from
        assert_eq!(child.get_number(keys::STIFFNESS), 10.0);
    }

    #[test]
    fn propagate_merges_child_overrides_and_keeps_untouched_keys() {
        let parent = Config::new_root();
        parent.set(keys::GRAVITY, OptionValue::Number(5.0));
        let child = parent.derive();
        child.set(keys::STIFFNESS, OptionValue::Number(75.0));

        child.propagate();

        assert_eq!(parent.get_number(keys::STIFFNESS), 75.0);
        assert_eq!(parent.get_number(keys::GRAVITY), 5.0);
    }

    #[test]
    fn propagate_on_root_is_noop() {
        let root = Config::new_root();
        root.set(keys::STIFFNESS, OptionValue::Number(60.0));
        root.propagate();
        assert_eq!(root.get_number(keys::STIFFNESS), 60.0);
    }

    #[test]
    fn dropping_child_leaves_parent_unaffected() {
        let parent = Config::new_root();
        {
            let child = parent.derive();
            child.set(keys::TEXT_HALO_ENABLED, OptionValue::Bool(false));
            drop(child);
        }
        assert!(parent.get_bool(keys::TEXT_HALO_ENABLED));
    }

    #[test]
    fn set_notifies_listeners_synchronously() {
        let config = Config::new_root();
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        config.install_listener(move || seen.set(seen.get() + 1));

        config.set(keys::STIFFNESS, OptionValue::Number(1.0));
        config.set(keys::STIFFNESS, OptionValue::Number(2.0));

        assert_eq!(count.get(), 2);
    }

    #[test]
    fn listener_may_read_config_during_broadcast() {
        let config = Config::new_root();
        let observed = Rc::new(Cell::new(0.0));
        let reader = config.clone();
        let slot = Rc::clone(&observed);
        config.install_listener(move || slot.set(reader.get_number(keys::STIFFNESS)));

        config.set(keys::STIFFNESS, OptionValue::Number(33.0));

        assert_eq!(observed.get(), 33.0);
    }

    #[test]
    fn set_options_broadcasts_once() {
        let config = Config::new_root();
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        config.install_listener(move || seen.set(seen.get() + 1));

        let mut opts = BTreeMap::new();
        opts.insert(keys::STIFFNESS.to_string(), OptionValue::Number(1.0));
        opts.insert(keys::GRAVITY.to_string(), OptionValue::Number(2.0));
        config.set_options(opts);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removed_listener_stops_firing() {
        let config = Config::new_root();
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        let handle = config.install_listener(move || seen.set(seen.get() + 1));

        config.set(keys::STIFFNESS, OptionValue::Number(1.0));
        config.remove_listener(handle);
        config.set(keys::STIFFNESS, OptionValue::Number(2.0));

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn propagate_notifies_parent_listeners() {
        let parent = Config::new_root();
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        parent.install_listener(move || seen.set(seen.get() + 1));

        let child = parent.derive();
        child.set(keys::STIFFNESS, OptionValue::Number(75.0));
        assert_eq!(count.get(), 0);

        child.propagate();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn stack_pop_restores_pre_push_state_key_for_key() {
        let mut stack = ConfigStack::default();
        let before = stack.current().serialize();

        let session = stack.current().derive();
        stack.push(session);
        let top = stack.current();
        top.set(keys::STIFFNESS, OptionValue::Number(99.0));
        top.set(keys::CENTROID_ENABLED, OptionValue::Bool(false));
        top.set(keys::NODE_EFFECT, OptionValue::Choice("basic".to_string()));
        stack.pop();

        assert_eq!(stack.current().serialize(), before);
    }

    #[test]
    fn stack_confirm_makes_edits_permanent() {
        let mut stack = ConfigStack::default();
        let session = stack.current().derive();
        stack.push(session);
        stack
            .current()
            .set(keys::STIFFNESS, OptionValue::Number(42.0));

        stack.confirm();

        assert!(!stack.has_open_session());
        assert_eq!(stack.current().get_number(keys::STIFFNESS), 42.0);
    }

    #[test]
    #[should_panic(expected = "pop with no matching push")]
    fn stack_pop_without_push_panics() {
        let mut stack = ConfigStack::default();
        stack.pop();
    }

    #[test]
    #[should_panic(expected = "confirm with no open session")]
    fn stack_confirm_without_push_panics() {
        let mut stack = ConfigStack::default();
        stack.confirm();
    }

    #[test]
    fn standalone_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let first = Config::standalone(path.clone());
        first.set(keys::STIFFNESS, OptionValue::Number(12.5));
        first.set(keys::INHIBITOR_EDGE_COLOR, OptionValue::Color([1.0, 0.0, 0.0, 1.0]));
        first.finalize();

        let second = Config::standalone(path);
        assert_eq!(second.get_number(keys::STIFFNESS), 12.5);
        assert_eq!(
            second.get_color(keys::INHIBITOR_EDGE_COLOR),
            [1.0, 0.0, 0.0, 1.0]
        );
        // untouched keys still resolve to defaults
        assert!(second.get_bool(keys::COMPARTMENT_ENABLED));
    }

    #[test]
    fn standalone_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::standalone(dir.path().join("absent.json"));
        assert_eq!(config.get_number(keys::STIFFNESS), 50.0);
    }

    #[test]
    fn child_finalize_persists_through_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let root = Config::standalone(path.clone());
        let mut stack = ConfigStack::new(root);
        let session = stack.current().derive();
        stack.push(session);
        stack
            .current()
            .set(keys::GRAVITY, OptionValue::Number(9.8));
        stack.confirm();

        let reloaded = Config::standalone(path);
        assert_eq!(reloaded.get_number(keys::GRAVITY), 9.8);
    }

    #[test]
    fn reset_defaults_overwrites_edits() {
        let config = Config::new_root();
        config.set(keys::STIFFNESS, OptionValue::Number(1.0));
        config.reset_defaults();
        assert_eq!(config.get_number(keys::STIFFNESS), 50.0);
    }

    #[test]
    fn serialized_record_is_flat_json() {
        let config = Config::new_root();
        config.set(keys::CENTROID_ENABLED, OptionValue::Bool(false));
        let doc: serde_json::Value = serde_json::from_str(&config.serialize()).unwrap();
        assert_eq!(doc[keys::CENTROID_ENABLED], serde_json::json!(false));
        assert_eq!(doc[keys::STIFFNESS], serde_json::json!(50.0));
        assert_eq!(
            doc[keys::NODE_EFFECT],
            serde_json::json!("advanced")
        );
    }
}
