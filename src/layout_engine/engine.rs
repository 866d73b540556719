use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{BuildError, Direction, LayoutError, LayoutTree, SplitError, SwallowError, swallow};
use crate::common::collections::HashMap;
use crate::common::config::LayoutSettings;
use crate::sys::host::{Host, LayoutUpdate, WindowId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    /// Grow the focused window over its neighbor. Without `aggressive` the
    /// configured default applies.
    Swallow {
        direction: Direction,
        #[serde(default)]
        aggressive: Option<bool>,
    },
    /// Split the focused window and focus the new half.
    Split { direction: Direction },
    Focus { window: WindowId },
}

#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventResponse {
    pub removed_windows: Vec<WindowId>,
    pub created_window: Option<WindowId>,
    pub focus_window: Option<WindowId>,
}

/// Owns the layout of one host and applies commands to it.
///
/// Every command first checks that the host still looks the way the tree
/// remembers it, works on a copy of the tree, commits the result to the host,
/// and only then keeps the copy.
pub struct LayoutEngine {
    tree: LayoutTree,
    layout_settings: LayoutSettings,
}

impl LayoutEngine {
    pub fn new(tree: LayoutTree, settings: &LayoutSettings) -> Self {
        LayoutEngine {
            tree,
            layout_settings: settings.clone(),
        }
    }

    /// Builds the tree from the host's current windows.
    pub fn from_host(host: &impl Host, settings: &LayoutSettings) -> Result<Self, BuildError> {
        Ok(Self::new(Self::snapshot(host)?, settings))
    }

    pub fn tree(&self) -> &LayoutTree { &self.tree }

    pub fn layout_settings(&self) -> &LayoutSettings { &self.layout_settings }

    pub fn set_layout_settings(&mut self, settings: &LayoutSettings) {
        self.layout_settings = settings.clone();
    }

    /// Throws the tree away and rebuilds it from the host, e.g. after a
    /// [`SwallowError::StaleLayout`].
    pub fn rebuild(&mut self, host: &impl Host) -> Result<(), BuildError> {
        self.tree = Self::snapshot(host)?;
        info!(windows = self.tree.window_count(), "Rebuilt layout from host");
        Ok(())
    }

    fn snapshot(host: &impl Host) -> Result<LayoutTree, BuildError> {
        let windows = host.windows();
        let focus = host.focused().filter(|f| windows.iter().any(|(w, _)| w == f));
        LayoutTree::from_rects(host.frame(), &windows, focus)
    }

    pub fn handle_command(
        &mut self,
        host: &mut impl Host,
        command: LayoutCommand,
    ) -> Result<EventResponse, LayoutError> {
        let _span = tracing::debug_span!("handle_command", ?command).entered();
        let result = self.apply(host, &command);
        match &result {
            Ok(response) => debug!(?response, "Command applied"),
            Err(LayoutError::Swallow(e @ SwallowError::InvariantViolation(_))) => {
                error!(%e, "Layout invariant violated; layout left unchanged")
            }
            Err(e) => debug!(%e, "Command failed"),
        }
        if self.layout_settings.log_tree {
            debug!("Layout tree:\n{}", self.tree.draw_tree());
        }
        result
    }

    fn apply(&mut self, host: &mut impl Host, command: &LayoutCommand) -> Result<EventResponse, LayoutError> {
        self.check_fresh(host)?;
        let mut tree = self.tree.clone();
        if let Some(focus) = host.focused() {
            tree.set_focus(focus);
        }

        let mut response = EventResponse::default();
        match *command {
            LayoutCommand::Swallow { direction, aggressive } => {
                let policy = self.layout_settings.policy(aggressive);
                let outcome = swallow(&mut tree, direction, policy)?;
                response.removed_windows = outcome.removed;
            }
            LayoutCommand::Split { direction } => {
                let window = next_window_id(host)?;
                tree.split(tree.focus(), direction, window)?;
                response.created_window = Some(window);
            }
            LayoutCommand::Focus { window } => {
                if !tree.set_focus(window) {
                    return Err(LayoutError::UnknownWindow(window));
                }
            }
        }
        response.focus_window = Some(tree.focus());

        let update = LayoutUpdate {
            frames: tree.layout(),
            removed: response.removed_windows.clone(),
            focus: tree.focus(),
        };
        host.commit(&update)?;
        self.tree = tree;
        Ok(response)
    }

    /// Fails with [`SwallowError::StaleLayout`] if the host's frame or
    /// windows differ from the ones the tree was built from.
    pub fn check_fresh(&self, host: &impl Host) -> Result<(), SwallowError> {
        let stale = |msg: String| Err(SwallowError::StaleLayout(msg));
        if host.frame() != self.tree.frame() {
            return stale(format!(
                "frame changed from {} to {}",
                self.tree.frame(),
                host.frame()
            ));
        }
        let live: HashMap<WindowId, _> = host.windows().into_iter().collect();
        for (window, rect) in self.tree.layout() {
            match live.get(&window) {
                None => return stale(format!("window {window} no longer exists")),
                Some(now) if *now != rect => {
                    return stale(format!("window {window} moved from {rect} to {now}"));
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = live.keys().find(|w| !self.tree.contains(**w)) {
            return stale(format!("window {extra} is not in the layout"));
        }
        Ok(())
    }
}

/// One past the largest id the host uses.
fn next_window_id(host: &impl Host) -> Result<WindowId, SplitError> {
    let Some(max) = host.windows().iter().map(|(w, _)| *w).max() else {
        return Ok(WindowId(1));
    };
    max.0.checked_add(1).map(WindowId).ok_or(SplitError::OutOfWindowIds(max))
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::host::{HostError, MemoryHost};

    const A: WindowId = WindowId(1);
    const B: WindowId = WindowId(2);
    const C: WindowId = WindowId(3);

    fn host() -> MemoryHost {
        MemoryHost::new(
            Rect::new(0, 0, 20, 20),
            vec![
                (A, Rect::new(0, 0, 10, 20)),
                (B, Rect::new(10, 0, 10, 10)),
                (C, Rect::new(10, 10, 10, 10)),
            ],
            Some(A),
        )
    }

    fn engine(host: &MemoryHost) -> LayoutEngine {
        LayoutEngine::from_host(host, &LayoutSettings::default()).unwrap()
    }

    fn swallow_right(aggressive: Option<bool>) -> LayoutCommand {
        LayoutCommand::Swallow { direction: Direction::Right, aggressive }
    }

    #[test]
    fn swallow_commits_to_the_host() {
        let mut host = host();
        let mut engine = engine(&host);
        let response = engine.handle_command(&mut host, swallow_right(None)).unwrap();
        assert_eq!(response.removed_windows, vec![B]);
        assert_eq!(response.focus_window, Some(A));
        assert_eq!(host.commits(), 1);
        assert_eq!(host.window_rect(B), None);
        assert_eq!(host.window_rect(C), Some(Rect::new(10, 0, 10, 20)));
    }

    #[test]
    fn configured_aggressive_mode_is_the_default() {
        let mut host = host();
        let settings = LayoutSettings { aggressive: true, ..Default::default() };
        let mut engine = LayoutEngine::from_host(&host, &settings).unwrap();
        let response = engine.handle_command(&mut host, swallow_right(None)).unwrap();
        assert_eq!(response.removed_windows.len(), 2);
        assert_eq!(host.windows(), vec![(A, Rect::new(0, 0, 20, 20))]);

        // An explicit flag wins over the setting.
        let mut host = self::host();
        let mut engine = LayoutEngine::from_host(&host, &settings).unwrap();
        let response = engine.handle_command(&mut host, swallow_right(Some(false))).unwrap();
        assert_eq!(response.removed_windows, vec![B]);
    }

    #[test]
    fn stale_host_is_refused_until_rebuilt() {
        let mut host = host();
        let mut engine = engine(&host);
        host.close_window(B);
        host.move_window(C, Rect::new(10, 0, 10, 20));

        let err = engine.handle_command(&mut host, swallow_right(None)).unwrap_err();
        assert!(matches!(err, LayoutError::Swallow(SwallowError::StaleLayout(_))));
        assert_eq!(host.commits(), 0);

        engine.rebuild(&host).unwrap();
        let response = engine.handle_command(&mut host, swallow_right(None)).unwrap();
        assert_eq!(response.removed_windows, vec![C]);
    }

    #[test]
    fn new_and_moved_windows_are_stale() {
        let mut host = host();
        let engine = engine(&host);
        host.move_window(A, Rect::new(0, 0, 9, 20));
        assert!(matches!(engine.check_fresh(&host), Err(SwallowError::StaleLayout(_))));

        let mut host = self::host();
        host.open_window(WindowId(9), Rect::new(0, 0, 1, 1));
        assert!(matches!(engine.check_fresh(&host), Err(SwallowError::StaleLayout(_))));

        let mut host = self::host();
        host.set_frame(Rect::new(0, 0, 40, 20));
        assert!(matches!(engine.check_fresh(&host), Err(SwallowError::StaleLayout(_))));
    }

    #[test]
    fn expected_failures_leave_everything_alone() {
        let mut host = host();
        let mut engine = engine(&host);
        let before = engine.tree().layout();
        let err = engine
            .handle_command(&mut host, LayoutCommand::Swallow { direction: Direction::Left, aggressive: None })
            .unwrap_err();
        assert_eq!(err, LayoutError::Swallow(SwallowError::NoNeighborInDirection(Direction::Left)));
        assert_eq!(engine.tree().layout(), before);
        assert_eq!(host.commits(), 0);
    }

    #[test]
    fn host_focus_is_followed() {
        let mut host = host();
        let mut engine = engine(&host);
        host.focus(C);
        let response = engine
            .handle_command(&mut host, LayoutCommand::Swallow { direction: Direction::Up, aggressive: None })
            .unwrap();
        assert_eq!(response.removed_windows, vec![B]);
        assert_eq!(engine.tree().focus(), C);
    }

    #[test]
    fn split_creates_a_window_on_the_host() {
        let mut host = host();
        let mut engine = engine(&host);
        let response = engine
            .handle_command(&mut host, LayoutCommand::Split { direction: Direction::Down })
            .unwrap();
        let new = response.created_window.unwrap();
        assert_eq!(new, WindowId(4));
        assert_eq!(host.window_rect(new), Some(Rect::new(0, 10, 10, 10)));
        assert_eq!(host.focused(), Some(new));
        engine.check_fresh(&host).unwrap();
    }

    #[test]
    fn split_fails_cleanly_when_ids_run_out() {
        let last = WindowId(u32::MAX);
        let mut host = MemoryHost::new(
            Rect::new(0, 0, 20, 20),
            vec![(last, Rect::new(0, 0, 20, 20))],
            Some(last),
        );
        let mut engine = engine(&host);
        let err = engine
            .handle_command(&mut host, LayoutCommand::Split { direction: Direction::Right })
            .unwrap_err();
        assert_eq!(err, LayoutError::Split(SplitError::OutOfWindowIds(last)));
        assert_eq!(host.commits(), 0);
        assert_eq!(engine.tree().window_count(), 1);
    }

    #[test]
    fn focus_command() {
        let mut host = host();
        let mut engine = engine(&host);
        let response = engine.handle_command(&mut host, LayoutCommand::Focus { window: B }).unwrap();
        assert_eq!(response.focus_window, Some(B));
        assert_eq!(host.focused(), Some(B));
        assert_eq!(
            engine.handle_command(&mut host, LayoutCommand::Focus { window: WindowId(42) }),
            Err(LayoutError::UnknownWindow(WindowId(42)))
        );
    }

    #[test]
    fn host_commit_errors_are_reported() {
        struct Refusing(MemoryHost);
        impl Host for Refusing {
            fn frame(&self) -> Rect { self.0.frame() }
            fn windows(&self) -> Vec<(WindowId, Rect)> { self.0.windows() }
            fn focused(&self) -> Option<WindowId> { self.0.focused() }
            fn commit(&mut self, update: &LayoutUpdate) -> Result<(), HostError> {
                Err(HostError::UnknownWindow(update.focus))
            }
        }
        let mut host = Refusing(host());
        let mut engine = LayoutEngine::from_host(&host, &LayoutSettings::default()).unwrap();
        let err = engine.handle_command(&mut host, swallow_right(None)).unwrap_err();
        assert_eq!(err, LayoutError::Host(HostError::UnknownWindow(A)));
        assert_eq!(engine.tree().window_count(), 3);
    }

    #[test]
    fn commands_use_snake_case() {
        let command: LayoutCommand =
            serde_json::from_str(r#"{"swallow":{"direction":"up"}}"#).unwrap();
        assert_eq!(command, LayoutCommand::Swallow { direction: Direction::Up, aggressive: None });
        assert_eq!(
            serde_json::to_string(&LayoutCommand::Focus { window: A }).unwrap(),
            r#"{"focus":{"window":1}}"#
        );
    }
}
