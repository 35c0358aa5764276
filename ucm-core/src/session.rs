//! Interactive session
//!
//! [`Session`] is the context object built once at startup. It owns both list
//! controllers, the filter engine, the focus cycle, the executor and the
//! transient UI state, and it is the single dispatch point for inbound
//! [`Event`]s. Front ends feed it events and paint the [`Frame`] it renders.
//!
//! Key routing order: an open overlay takes every key, then the filter
//! engine decides whether the key is a filter edit, and only keys it ignores
//! are dispatched as focus moves, selection moves or commands.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::AppSettings;
use crate::docker::ContainerListController;
use crate::execute::{ssh_command, Action, Executor, Launcher};
use crate::filter::{
    FilterEngine, FilterResponse, SearchField, CONNECTION_FIELDS, CONTAINER_FIELDS,
};
use crate::focus::{Direction, FocusChange, FocusController};
use crate::input::{Event, Key, View};
use crate::list::{ConnectionListController, Row, SortPolicy};
use crate::models::{Connection, Container};
use crate::render::{Frame, FrameRows, Panel, Renderer, StatusLevel, StatusMessage};
use crate::stream::LogSubscription;

/// Focus region holding the view tabs
pub const REGION_TABS: &str = "tabs";
/// Focus region holding the active list
pub const REGION_LIST: &str = "list";
/// Focus region holding the filter entry
pub const REGION_FILTER: &str = "filter";
/// Focus region holding the action buttons
pub const REGION_ACTIONS: &str = "actions";

const ORDER_TABS: i32 = 0;
const ORDER_LIST: i32 = 10;
const ORDER_FILTER: i32 = 20;
const ORDER_ACTIONS: i32 = 30;

const PAGE: usize = 10;

/// What a focus region routes input to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// View tabs
    Tabs,
    /// The list of a view
    List(View),
    /// The filter entry of a view
    Filter(View),
    /// The action buttons of a view
    Actions(View),
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep running
    Continue,
    /// Leave the interactive session
    Quit,
}

/// A user command bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Connect to the selected connection or open a shell in the container
    Connect,
    /// Toggle the selected connection's favorite flag
    ToggleFavorite,
    /// Show only favorites
    ToggleFavoritesOnly,
    /// Sort by last use
    ToggleSortRecent,
    /// Connect to the most recently used connection
    QuickConnect,
    /// Show connection details or `docker inspect` output
    Info,
    /// Stop the selected container
    Stop,
    /// Start the selected container
    Start,
    /// Restart the selected container
    Restart,
    /// Remove the selected container, after confirmation
    Remove,
    /// Follow the selected container's logs
    Logs,
    /// List stopped containers too
    ToggleShowAll,
    /// Reload connections or refresh containers
    Reload,
    /// Activate the filter
    Filter,
    /// Show key bindings
    Help,
    /// Quit
    Quit,
}

impl Command {
    /// Returns the command bound to `key` in `view`
    #[must_use]
    pub const fn for_key(view: View, key: Key) -> Option<Self> {
        let command = match (view, key) {
            (_, Key::Char('q')) => Self::Quit,
            (_, Key::Char('?')) => Self::Help,
            (_, Key::Char('/')) => Self::Filter,
            (_, Key::Ctrl('r')) => Self::Reload,
            (_, Key::Enter | Key::Char('c')) => Self::Connect,
            (_, Key::Char('i')) => Self::Info,
            (View::Ssh, Key::Char('f')) => Self::ToggleFavorite,
            (View::Ssh, Key::Char('F')) => Self::ToggleFavoritesOnly,
            (View::Ssh, Key::Char('r')) => Self::ToggleSortRecent,
            (View::Ssh, Key::Char('L')) => Self::QuickConnect,
            (View::Docker, Key::Char('S')) => Self::Stop,
            (View::Docker, Key::Char('s')) => Self::Start,
            (View::Docker, Key::Char('R')) => Self::Restart,
            (View::Docker, Key::Char('D')) => Self::Remove,
            (View::Docker, Key::Char('l')) => Self::Logs,
            (View::Docker, Key::Char('a')) => Self::ToggleShowAll,
            _ => return None,
        };
        Some(command)
    }

    const fn container_action(self) -> Option<Action> {
        match self {
            Self::Stop => Some(Action::Stop),
            Self::Start => Some(Action::Start),
            Self::Restart => Some(Action::Restart),
            Self::Remove => Some(Action::Remove),
            _ => None,
        }
    }
}

/// A key hint shown in the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnemonic {
    /// Key label
    pub key: &'static str,
    /// What the key does
    pub label: &'static str,
    /// Command run when the hint is activated from the actions region
    pub command: Option<Command>,
}

impl Mnemonic {
    const fn new(key: &'static str, label: &'static str, command: Command) -> Self {
        Self {
            key,
            label,
            command: Some(command),
        }
    }

    const fn hint(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            command: None,
        }
    }
}

#[derive(Debug)]
enum Overlay {
    Text {
        title: String,
        body: String,
    },
    Logs {
        title: String,
        lines: VecDeque<String>,
        subscription: LogSubscription,
    },
    Confirm {
        prompt: String,
        container: Container,
    },
}

const fn fields_for(view: View) -> &'static [SearchField] {
    match view {
        View::Ssh => &CONNECTION_FIELDS,
        View::Docker => &CONTAINER_FIELDS,
    }
}

const fn past_tense(action: Action) -> &'static str {
    match action {
        Action::Stop => "Stopped",
        Action::Start => "Started",
        Action::Restart => "Restarted",
        Action::Remove => "Removed",
        _ => "Done",
    }
}

/// Application context and event dispatcher
#[derive(Debug)]
pub struct Session<E: Executor> {
    settings: AppSettings,
    view: View,
    ssh: ConnectionListController,
    docker: ContainerListController,
    filter: FilterEngine,
    focus: FocusController<FocusTarget>,
    executor: E,
    launcher: Launcher,
    ssh_selected: usize,
    docker_selected: usize,
    status: Option<StatusMessage>,
    overlay: Option<Overlay>,
    action_cursor: usize,
}

impl<E: Executor> Session<E> {
    /// Builds the session around an opened connection list
    ///
    /// Focus starts on the list of the SSH view.
    pub fn new(
        settings: AppSettings,
        mut ssh: ConnectionListController,
        executor: E,
        launcher: Launcher,
    ) -> Self {
        if settings.ui.sort_by_recent {
            ssh.set_sort(SortPolicy::Recent);
        }
        let docker = ContainerListController::new(settings.docker.clone());

        let view = View::Ssh;
        let mut focus = FocusController::new();
        focus.register_or_replace(REGION_LIST, ORDER_LIST, FocusTarget::List(view));
        focus.register_or_replace(REGION_TABS, ORDER_TABS, FocusTarget::Tabs);
        focus.register_or_replace(REGION_FILTER, ORDER_FILTER, FocusTarget::Filter(view));
        focus.register_or_replace(REGION_ACTIONS, ORDER_ACTIONS, FocusTarget::Actions(view));

        Self {
            settings,
            view,
            ssh,
            docker,
            filter: FilterEngine::new(fields_for(view)),
            focus,
            executor,
            launcher,
            ssh_selected: 0,
            docker_selected: 0,
            status: None,
            overlay: None,
            action_cursor: 0,
        }
    }

    // ========== Accessors ==========

    /// Returns the active view
    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Returns the filter engine
    #[must_use]
    pub const fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// Returns the focus cycle
    #[must_use]
    pub const fn focus(&self) -> &FocusController<FocusTarget> {
        &self.focus
    }

    /// Returns the current status message
    #[must_use]
    pub const fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Returns the SSH list controller
    #[must_use]
    pub const fn connections(&self) -> &ConnectionListController {
        &self.ssh
    }

    /// Returns the SSH list controller for direct edits
    pub fn connections_mut(&mut self) -> &mut ConnectionListController {
        &mut self.ssh
    }

    /// Returns the Docker list controller
    #[must_use]
    pub const fn containers(&self) -> &ContainerListController {
        &self.docker
    }

    /// Returns the executor
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the selected row position in the active view
    #[must_use]
    pub const fn selected(&self) -> usize {
        match self.view {
            View::Ssh => self.ssh_selected,
            View::Docker => self.docker_selected,
        }
    }

    /// Returns true while an overlay panel is open
    #[must_use]
    pub const fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Title of the open overlay, if any
    #[must_use]
    pub fn overlay_title(&self) -> Option<&str> {
        match self.overlay.as_ref()? {
            Overlay::Text { title, .. } | Overlay::Logs { title, .. } => Some(title),
            Overlay::Confirm { prompt, .. } => Some(prompt),
        }
    }

    /// Opens a text panel that stays until dismissed
    ///
    /// Front ends use this for problems found at startup, such as an
    /// unreadable connections file.
    pub fn show_message(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.overlay = Some(Overlay::Text {
            title: title.into(),
            body: body.into(),
        });
    }

    // ========== Dispatch ==========

    /// Handles one inbound event
    pub fn handle(&mut self, event: Event) -> Outcome {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Select(position) => self.select(position),
            Event::SwitchView(view) => self.switch_view(view),
            Event::Tick(now) => self.tick(now),
        }
        Outcome::Continue
    }

    fn handle_key(&mut self, key: Key) -> Outcome {
        if key == Key::Ctrl('c') {
            return Outcome::Quit;
        }
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return Outcome::Continue;
        }

        match self.filter.handle_key(key) {
            FilterResponse::Activated => {
                self.focus_region(REGION_FILTER);
                return Outcome::Continue;
            }
            FilterResponse::Deactivated => {
                self.focus_region(REGION_LIST);
                return Outcome::Continue;
            }
            FilterResponse::BufferChanged => {
                self.apply_filter();
                return Outcome::Continue;
            }
            FilterResponse::Consumed => return Outcome::Continue,
            FilterResponse::Ignored => {}
        }

        match key {
            Key::Tab => self.advance_focus(Direction::Forward),
            Key::BackTab => self.advance_focus(Direction::Backward),
            Key::Up => self.select_previous(1),
            Key::Down => self.select_next(1),
            Key::PageUp => self.select_previous(PAGE),
            Key::PageDown => self.select_next(PAGE),
            Key::Home => self.select(0),
            Key::End => self.select(usize::MAX),
            Key::Left | Key::Right => self.handle_horizontal(key == Key::Right),
            Key::Enter if self.focus.current() == Some(&FocusTarget::Tabs) => {
                self.focus_region(REGION_LIST);
            }
            Key::Enter if matches!(self.focus.current(), Some(FocusTarget::Actions(_))) => {
                let command = self
                    .mnemonics()
                    .get(self.action_cursor)
                    .and_then(|m| m.command);
                if let Some(command) = command {
                    return self.run(command);
                }
            }
            _ => {
                if let Some(command) = Command::for_key(self.view, key) {
                    return self.run(command);
                }
                debug!(?key, "Unbound key");
            }
        }
        Outcome::Continue
    }

    fn handle_overlay_key(&mut self, key: Key) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };

        match overlay {
            Overlay::Text { .. } => {
                if matches!(key, Key::Esc | Key::Enter | Key::Char('q')) {
                    self.overlay = None;
                }
            }
            Overlay::Logs { subscription, .. } => match key {
                Key::Char('p' | ' ') => {
                    let message = if subscription.toggle_pause() {
                        "Logs paused"
                    } else {
                        "Logs resumed"
                    };
                    self.set_info(message);
                }
                Key::Esc | Key::Char('q') => {
                    // Dropping the subscription stops the producer
                    self.overlay = None;
                }
                _ => {}
            },
            Overlay::Confirm { container, .. } => {
                let container = container.clone();
                self.overlay = None;
                if key == Key::Char('y') {
                    self.container_action(Action::Remove, &container);
                } else {
                    self.set_info("Cancelled");
                }
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.status = None;
        }

        if let Some(Overlay::Logs {
            lines, subscription, ..
        }) = &mut self.overlay
        {
            let capacity = self.settings.docker.log_buffer_lines.max(1);
            for line in subscription.drain(capacity) {
                if lines.len() >= capacity {
                    lines.pop_front();
                }
                lines.push_back(line);
            }
        }
    }

    // ========== Focus ==========

    fn on_focus_change(&mut self, change: &FocusChange) {
        if change.left(REGION_FILTER) {
            self.filter.on_focus_lost();
        }
        if change.entered(REGION_FILTER) {
            self.filter.activate();
        }
        if change.entered(REGION_ACTIONS) {
            self.action_cursor = 0;
        }
    }

    fn advance_focus(&mut self, direction: Direction) {
        match self.focus.advance(direction) {
            Ok(change) => self.on_focus_change(&change),
            Err(e) => error!(error = %e, "Focus cycle broken"),
        }
    }

    fn focus_region(&mut self, name: &str) {
        match self.focus.focus(name) {
            Ok(change) => self.on_focus_change(&change),
            Err(e) => error!(error = %e, "Focus cycle broken"),
        }
    }

    fn handle_horizontal(&mut self, forward: bool) {
        match self.focus.current() {
            Some(FocusTarget::Tabs) => {
                let view = if forward {
                    self.view.next()
                } else {
                    self.view.previous()
                };
                self.switch_view(view);
            }
            Some(FocusTarget::Actions(_)) => {
                let count = self.mnemonics().len();
                if count > 0 {
                    self.action_cursor = if forward {
                        (self.action_cursor + 1) % count
                    } else {
                        (self.action_cursor + count - 1) % count
                    };
                }
            }
            _ => {}
        }
    }

    // ========== Views and selection ==========

    /// Switches the main view
    ///
    /// The list, filter and action regions keep their slots in the focus
    /// cycle and only change targets. The filter is deactivated and cleared;
    /// if it had focus, focus moves to the list so the focused region always
    /// matches the filter state.
    pub fn switch_view(&mut self, view: View) {
        if view == self.view {
            return;
        }
        self.view = view;

        self.focus
            .register_or_replace(REGION_LIST, ORDER_LIST, FocusTarget::List(view));
        self.focus
            .register_or_replace(REGION_FILTER, ORDER_FILTER, FocusTarget::Filter(view));
        self.focus
            .register_or_replace(REGION_ACTIONS, ORDER_ACTIONS, FocusTarget::Actions(view));
        if self.focus.is_focused(REGION_FILTER) {
            self.focus_region(REGION_LIST);
        }

        self.filter.deactivate();
        self.filter.clear();
        self.filter.set_fields(fields_for(view));
        self.ssh.set_filter("");
        self.docker.set_filter("");
        self.action_cursor = 0;

        info!(view = view.label(), "Switched view");
        if view == View::Docker && !self.docker.is_loaded() {
            self.refresh_containers();
        }
    }

    fn apply_filter(&mut self) {
        let buffer = self.filter.buffer().to_string();
        match self.view {
            View::Ssh => self.ssh.set_filter(&buffer),
            View::Docker => self.docker.set_filter(&buffer),
        }
        self.select(0);
    }

    fn visible_len(&mut self) -> usize {
        match self.view {
            View::Ssh => self.ssh.rows().len(),
            View::Docker => self.docker.containers().len(),
        }
    }

    fn select(&mut self, position: usize) {
        let last = self.visible_len().saturating_sub(1);
        let position = position.min(last);
        match self.view {
            View::Ssh => self.ssh_selected = position,
            View::Docker => self.docker_selected = position,
        }
    }

    fn select_next(&mut self, step: usize) {
        self.select(self.selected().saturating_add(step));
    }

    fn select_previous(&mut self, step: usize) {
        self.select(self.selected().saturating_sub(step));
    }

    fn selected_row(&mut self) -> Option<Row> {
        let position = self.ssh_selected;
        self.ssh.row(position).cloned()
    }

    fn selected_container(&mut self) -> Option<Container> {
        let position = self.docker_selected;
        self.docker.container(position).cloned()
    }

    // ========== Status ==========

    fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        let text = text.into();
        debug!(status = %text, ?level, "Status message");
        self.status = Some(StatusMessage {
            text,
            level,
            expires_at: Instant::now() + self.settings.ui.status_timeout(),
        });
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusLevel::Info);
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusLevel::Error);
    }

    // ========== Commands ==========

    /// Runs a command in the active view
    pub fn run(&mut self, command: Command) -> Outcome {
        match command {
            Command::Quit => return Outcome::Quit,
            Command::Help => self.open_help(),
            Command::Filter => {
                self.filter.activate();
                self.focus_region(REGION_FILTER);
            }
            Command::Reload => self.reload(),
            _ => match self.view {
                View::Ssh => self.run_ssh(command),
                View::Docker => self.run_docker(command),
            },
        }
        Outcome::Continue
    }

    fn run_ssh(&mut self, command: Command) {
        match command {
            Command::Connect => match self.selected_row() {
                Some(row) => self.connect_ssh(&row.connection),
                None => self.set_info("No connection selected"),
            },
            Command::QuickConnect => match self.ssh.most_recent().cloned() {
                Some(connection) => self.connect_ssh(&connection),
                None => self.set_info("No recent connection"),
            },
            Command::ToggleFavorite => {
                let Some(row) = self.selected_row() else {
                    return;
                };
                match self.ssh.toggle_favorite(&row.identity()) {
                    Ok(true) => self.set_info(format!("Added {} to favorites", row.connection.name)),
                    Ok(false) => {
                        self.set_info(format!("Removed {} from favorites", row.connection.name));
                    }
                    Err(e) => self.set_error(format!("Favorites not saved: {e}")),
                }
                self.select(self.ssh_selected);
            }
            Command::ToggleFavoritesOnly => {
                let message = if self.ssh.toggle_favorites_only() {
                    "Showing favorites only"
                } else {
                    "Showing all connections"
                };
                self.set_info(message);
                self.select(0);
            }
            Command::ToggleSortRecent => {
                let message = match self.ssh.toggle_sort_by_recent() {
                    SortPolicy::Recent => "Sorted by last use",
                    SortPolicy::Insertion => "Sorted by file order",
                };
                self.set_info(message);
            }
            Command::Info => {
                if let Some(row) = self.selected_row() {
                    self.overlay = Some(Overlay::Text {
                        title: row.connection.name.clone(),
                        body: connection_info(&row),
                    });
                }
            }
            _ => debug!(?command, "Command not available in SSH view"),
        }
    }

    fn connect_ssh(&mut self, connection: &Connection) {
        let result = self
            .ssh
            .connect(connection, &mut self.executor, &self.launcher, Utc::now());
        match result {
            Ok(_) if self.launcher.uses_tmux() => {
                self.set_info(format!("Opened {} in a tmux window", connection.name));
            }
            Ok(_) => self.set_info(format!("Session with {} ended", connection.name)),
            Err(e) => {
                error!(name = %connection.name, error = %e, "Connection failed");
                self.set_error(format!("Connection to {} failed: {e}", connection.name));
            }
        }
    }

    fn run_docker(&mut self, command: Command) {
        if command == Command::ToggleShowAll {
            let all = self.docker.toggle_show_all();
            self.refresh_containers();
            self.set_info(if all {
                "Showing all containers"
            } else {
                "Showing running containers"
            });
            return;
        }

        let Some(container) = self.selected_container() else {
            self.set_info("No container selected");
            return;
        };

        match command {
            Command::Connect => {
                let result = self
                    .docker
                    .connect(&container, &mut self.executor, &self.launcher);
                match result {
                    Ok(_) => self.set_info(format!("Shell in {} ended", container.name)),
                    Err(e) => self.set_error(format!("Exec in {} failed: {e}", container.name)),
                }
            }
            Command::Remove => {
                self.overlay = Some(Overlay::Confirm {
                    prompt: format!("Remove container {}? (y/n)", container.name),
                    container,
                });
            }
            Command::Logs => match self.docker.follow_logs(&container, &mut self.executor) {
                Ok(subscription) => {
                    self.overlay = Some(Overlay::Logs {
                        title: format!("Logs: {}", container.name),
                        lines: VecDeque::new(),
                        subscription,
                    });
                }
                Err(e) => self.set_error(format!("Cannot follow logs of {}: {e}", container.name)),
            },
            Command::Info => match self.docker.inspect(&container, &mut self.executor) {
                Ok(output) => {
                    self.overlay = Some(Overlay::Text {
                        title: format!("Inspect: {}", container.name),
                        body: output,
                    });
                }
                Err(e) => self.set_error(format!("Inspect of {} failed: {e}", container.name)),
            },
            _ => match command.container_action() {
                Some(action) => self.container_action(action, &container),
                None => debug!(?command, "Command not available in Docker view"),
            },
        }
    }

    fn container_action(&mut self, action: Action, container: &Container) {
        match self.docker.run_action(action, container, &mut self.executor) {
            Ok(()) => {
                self.refresh_containers();
                self.set_info(format!("{} {}", past_tense(action), container.name));
            }
            Err(e) => {
                self.set_error(format!("Failed to {} {}: {e}", action.verb(), container.name));
            }
        }
    }

    fn refresh_containers(&mut self) {
        match self.docker.refresh(&mut self.executor) {
            Ok(_) => self.select(self.docker_selected),
            Err(e) => {
                warn!(error = %e, "Container listing failed");
                self.set_error(format!("Docker unavailable: {e}"));
            }
        }
    }

    fn reload(&mut self) {
        match self.view {
            View::Ssh => {
                let result = self.ssh.reload().map(<[_]>::len);
                match result {
                    Ok(0) => {
                        let count = self.ssh.connections().len();
                        self.set_info(format!("Reloaded {count} connection(s)"));
                    }
                    Ok(invalid) => self.set_error(format!("{invalid} invalid connection(s) skipped")),
                    Err(e) => self.set_error(e.to_string()),
                }
                self.select(self.ssh_selected);
            }
            View::Docker => {
                self.refresh_containers();
            }
        }
    }

    fn open_help(&mut self) {
        let mut body = String::new();
        for view in View::ALL {
            let _ = writeln!(body, "{} view", view.label());
            for hint in view_mnemonics(view, &self.ssh, &self.docker) {
                let _ = writeln!(body, "  {:<8} {}", hint.key, hint.label);
            }
            body.push('\n');
        }
        body.push_str("Tab      Next region\nS-Tab    Previous region\nCtrl-r   Reload\nCtrl-c   Quit\n");
        self.overlay = Some(Overlay::Text {
            title: "Help".to_string(),
            body,
        });
    }

    // ========== Rendering ==========

    /// Returns the key hints for the current context
    #[must_use]
    pub fn mnemonics(&self) -> Vec<Mnemonic> {
        match &self.overlay {
            Some(Overlay::Text { .. }) => return vec![Mnemonic::hint("Esc", "Close")],
            Some(Overlay::Logs { subscription, .. }) => {
                let pause = if subscription.is_paused() {
                    "Resume"
                } else {
                    "Pause"
                };
                return vec![Mnemonic::hint("p", pause), Mnemonic::hint("Esc", "Close")];
            }
            Some(Overlay::Confirm { .. }) => {
                return vec![Mnemonic::hint("y", "Confirm"), Mnemonic::hint("n", "Cancel")];
            }
            None => {}
        }

        if self.filter.is_active() {
            return vec![
                Mnemonic::hint("Esc", "Done"),
                Mnemonic::hint("Ctrl-u", "Clear"),
                Mnemonic::hint("Tab", "Leave"),
            ];
        }
        view_mnemonics(self.view, &self.ssh, &self.docker)
    }

    /// Paints the current state
    pub fn render<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        // Rebuild lazily invalidated rows before borrowing them
        let visible = self.visible_len();

        let rows = match self.view {
            View::Ssh => FrameRows::Connections(self.ssh.peek_rows()),
            View::Docker => FrameRows::Containers(self.docker.peek_containers()),
        };
        let panel = self.overlay.as_ref().map(|overlay| match overlay {
            Overlay::Text { title, body } => Panel::Text { title, body },
            Overlay::Logs {
                title,
                lines,
                subscription,
            } => Panel::Logs {
                title,
                lines,
                paused: subscription.is_paused(),
            },
            Overlay::Confirm { prompt, .. } => Panel::Confirm { prompt },
        });
        let focus = self.focus.current().copied();
        let action_cursor =
            matches!(focus, Some(FocusTarget::Actions(_))).then_some(self.action_cursor);

        let frame = Frame {
            view: self.view,
            rows,
            selected: (visible > 0).then(|| self.selected()),
            focus,
            filter_active: self.filter.is_active(),
            filter_buffer: self.filter.buffer(),
            status: self.status.as_ref(),
            mnemonics: self.mnemonics(),
            action_cursor,
            panel,
            sort: self.ssh.sort(),
            favorites_only: self.ssh.favorites_only(),
            show_all: self.docker.show_all(),
        };
        renderer.render(&frame);
    }
}

fn view_mnemonics(
    view: View,
    ssh: &ConnectionListController,
    docker: &ContainerListController,
) -> Vec<Mnemonic> {
    match view {
        View::Ssh => vec![
            Mnemonic::new("c", "Connect", Command::Connect),
            Mnemonic::new("f", "Favorite", Command::ToggleFavorite),
            Mnemonic::new(
                "F",
                if ssh.favorites_only() { "All" } else { "Favorites" },
                Command::ToggleFavoritesOnly,
            ),
            Mnemonic::new(
                "r",
                match ssh.sort() {
                    SortPolicy::Recent => "File order",
                    SortPolicy::Insertion => "Recent",
                },
                Command::ToggleSortRecent,
            ),
            Mnemonic::new("L", "Last", Command::QuickConnect),
            Mnemonic::new("i", "Info", Command::Info),
            Mnemonic::new("/", "Filter", Command::Filter),
            Mnemonic::new("?", "Help", Command::Help),
            Mnemonic::new("q", "Quit", Command::Quit),
        ],
        View::Docker => vec![
            Mnemonic::new("c", "Shell", Command::Connect),
            Mnemonic::new("l", "Logs", Command::Logs),
            Mnemonic::new("i", "Inspect", Command::Info),
            Mnemonic::new("s", "Start", Command::Start),
            Mnemonic::new("S", "Stop", Command::Stop),
            Mnemonic::new("R", "Restart", Command::Restart),
            Mnemonic::new("D", "Remove", Command::Remove),
            Mnemonic::new(
                "a",
                if docker.show_all() { "Running" } else { "All" },
                Command::ToggleShowAll,
            ),
            Mnemonic::new("/", "Filter", Command::Filter),
            Mnemonic::new("q", "Quit", Command::Quit),
        ],
    }
}

fn connection_info(row: &Row) -> String {
    let connection = &row.connection;
    let mut body = String::new();
    let _ = writeln!(body, "Address:   {}", connection.address);
    if let Some(user) = &connection.user {
        let _ = writeln!(body, "User:      {user}");
    }
    if let Some(port) = connection.port {
        let _ = writeln!(body, "Port:      {port}");
    }
    if let Some(identity_file) = &connection.identity_file {
        let _ = writeln!(body, "Key:       {identity_file}");
    }
    if let Some(options) = &connection.options {
        let _ = writeln!(body, "Options:   {options}");
    }
    if let Some(category) = &connection.category {
        let _ = writeln!(body, "Category:  {category}");
    }
    let _ = writeln!(body, "Favorite:  {}", if row.favorite { "yes" } else { "no" });
    match &row.history {
        Some(entry) => {
            let _ = writeln!(body, "Last used: {}", entry.format_age(Utc::now()));
            let _ = writeln!(body, "Uses:      {}", entry.use_count);
        }
        None => {
            let _ = writeln!(body, "Last used: never");
        }
    }
    if let Ok(spec) = ssh_command(connection) {
        let _ = writeln!(body, "Command:   {spec}");
    }
    body
}
