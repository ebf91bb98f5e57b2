//! Debug switches and action logging
//!
//! [`DebugConfig`] is the single switch hosts consult for debug-only work
//! (build reports, lifecycle tracing). Action logging for stores is done by
//! [`ActionLoggerMiddleware`], filtered with glob patterns:
//!
//! ```
//! use tui_lifecycle_core::debug::ActionLoggerConfig;
//!
//! let config = ActionLoggerConfig::new(Some("Search*,Connect"), Some("Tick,Render"));
//! assert!(config.should_log("SearchAddChar"));
//! assert!(config.should_log("Connect"));
//! assert!(!config.should_log("Tick"));
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use serde::Deserialize;

use crate::store::Middleware;
use crate::Action;

fn default_excludes() -> Vec<String> {
    vec!["Tick".to_string(), "Render".to_string()]
}

/// Include/exclude glob filters over action and lifecycle names
///
/// Patterns support `*` (any run of characters) and `?` (one character).
/// If `include_patterns` is non-empty a name must match one of them;
/// `exclude_patterns` are applied afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log names matching these patterns
    #[serde(rename = "include")]
    pub include_patterns: Vec<String>,
    /// Never log names matching these patterns
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
}

impl Default for ActionLoggerConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: default_excludes(),
        }
    }
}

impl ActionLoggerConfig {
    /// Build from comma-separated pattern lists
    ///
    /// `None` for `exclude` keeps the default excludes (`Tick`, `Render`).
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |s: &str| -> Vec<String> {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            include_patterns: include.map(split).unwrap_or_default(),
            exclude_patterns: exclude.map(split).unwrap_or_else(default_excludes),
        }
    }

    /// A filter that lets everything through
    pub fn log_all() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Whether `name` passes the filters
    pub fn should_log(&self, name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, name))
        {
            return false;
        }
        !self.exclude_patterns.iter().any(|p| glob_match(p, name))
    }
}

/// Debug switches shared by hosts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Report every fresh build and trace lifecycle events
    pub enabled: bool,
    /// Which lifecycle event names get traced when enabled
    pub lifecycle: ActionLoggerConfig,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
            lifecycle: ActionLoggerConfig::log_all(),
        }
    }
}

impl DebugConfig {
    /// Debug work switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Debug work switched on
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Whether a lifecycle event with this name should be traced
    pub fn traces(&self, name: &str) -> bool {
        self.enabled && self.lifecycle.should_log(name)
    }
}

/// One logged action
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    /// Action name
    pub name: &'static str,
    /// Sequence number, increasing across the log's lifetime
    pub sequence: u64,
    /// When the action was logged
    pub timestamp: Instant,
    /// Whether the reducer reported a change; `None` until it has run
    pub state_changed: Option<bool>,
}

/// Bounded in-memory log of recent actions
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    capacity: usize,
    next_sequence: u64,
}

/// Shared handle to an [`ActionLog`] kept by a middleware
pub type SharedActionLog = Rc<RefCell<ActionLog>>;

impl ActionLog {
    /// Create a log keeping at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    fn push(&mut self, name: &'static str) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActionLogEntry {
            name,
            sequence: self.next_sequence,
            timestamp: Instant::now(),
            state_changed: None,
        });
        self.next_sequence += 1;
    }

    fn finish_last(&mut self, changed: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.state_changed = Some(changed);
        }
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Store middleware that traces filtered actions and optionally records them
#[derive(Debug, Clone)]
pub struct ActionLoggerMiddleware {
    config: ActionLoggerConfig,
    log: Option<SharedActionLog>,
    last_logged: bool,
    active: bool,
}

impl ActionLoggerMiddleware {
    /// Trace through `tracing` only
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            last_logged: false,
            active: true,
        }
    }

    /// Also keep the last `capacity` matching actions in memory
    pub fn with_log(config: ActionLoggerConfig, capacity: usize) -> Self {
        Self {
            log: Some(Rc::new(RefCell::new(ActionLog::new(capacity)))),
            ..Self::new(config)
        }
    }

    /// Turn the middleware into a no-op when `active` is false
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Handle to the in-memory log, if enabled
    ///
    /// Grab this before handing the middleware to a store.
    pub fn log(&self) -> Option<SharedActionLog> {
        self.log.clone()
    }

    /// Active filter
    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl<A: Action> Middleware<A> for ActionLoggerMiddleware {
    fn before(&mut self, action: &A) {
        self.last_logged = false;
        if !self.active {
            return;
        }
        let name = action.name();
        if !self.config.should_log(name) {
            return;
        }
        tracing::debug!(action = %name, "action");
        if let Some(log) = &self.log {
            log.borrow_mut().push(name);
            self.last_logged = true;
        }
    }

    fn after(&mut self, _action: &A, state_changed: bool) {
        if !self.last_logged {
            return;
        }
        if let Some(log) = &self.log {
            log.borrow_mut().finish_last(state_changed);
        }
    }
}

/// Glob match supporting `*` and `?`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
