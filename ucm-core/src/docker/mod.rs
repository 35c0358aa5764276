//! Docker container list
//!
//! Containers are fetched with `docker ps` through the [`Executor`], filtered
//! with the same matcher as SSH rows, and managed with lifecycle commands that
//! carry the configured timeout.

use tracing::{debug, error, info};

use crate::config::DockerSettings;
use crate::error::{ExecResult, ExecutionError};
use crate::execute::{
    docker_action, docker_exec, docker_logs, docker_ps, needs_shell_fallback, Action,
    ExecOptions, ExitStatus, Executor, Launcher, FALLBACK_SHELL,
};
use crate::filter::{Matcher, SearchField, CONTAINER_FIELDS};
use crate::models::Container;
use crate::stream::LogSubscription;

/// Parses `docker ps` output produced with the tab-separated format
///
/// Header lines and lines with fewer than three fields are skipped.
#[must_use]
pub fn parse_ps_output(output: &str) -> Vec<Container> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            match fields.as_slice() {
                [id, ..] if id.starts_with("CONTAINER") => None,
                [id, name, image, rest @ ..] if !id.is_empty() && !name.is_empty() => {
                    Some(Container::new(*id, *name, *image, rest.first().copied().unwrap_or("")))
                }
                _ => {
                    debug!(line, "Skipping malformed docker ps line");
                    None
                }
            }
        })
        .collect()
}

/// Container list with filtering and lifecycle actions
#[derive(Debug)]
pub struct ContainerListController {
    settings: DockerSettings,
    containers: Vec<Container>,
    show_all: bool,
    filter: String,
    fields: Vec<SearchField>,
    visible: Option<Vec<Container>>,
    loaded: bool,
}

impl ContainerListController {
    /// Creates an empty controller
    #[must_use]
    pub fn new(settings: DockerSettings) -> Self {
        Self {
            settings,
            containers: Vec::new(),
            show_all: false,
            filter: String::new(),
            fields: CONTAINER_FIELDS.to_vec(),
            visible: None,
            loaded: false,
        }
    }

    /// Returns the Docker settings in use
    #[must_use]
    pub const fn settings(&self) -> &DockerSettings {
        &self.settings
    }

    /// Returns true once a listing succeeded
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn invalidate(&mut self) {
        self.visible = None;
    }

    /// Re-fetches the container list
    ///
    /// On error the previous list is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `docker ps` cannot run, fails, or times out.
    pub fn refresh<E: Executor + ?Sized>(&mut self, executor: &mut E) -> ExecResult<usize> {
        let spec = docker_ps(&self.settings, self.show_all);
        let output = executor.capture(&spec, &ExecOptions::bounded(self.settings.action_timeout()))?;
        self.containers = parse_ps_output(&output);
        self.loaded = true;
        self.invalidate();
        debug!(count = self.containers.len(), all = self.show_all, "Refreshed containers");
        Ok(self.containers.len())
    }

    /// Replaces the container list directly
    pub fn set_containers(&mut self, containers: Vec<Container>) {
        self.containers = containers;
        self.loaded = true;
        self.invalidate();
    }

    /// Returns the containers matching the filter
    pub fn containers(&mut self) -> &[Container] {
        if self.visible.is_none() {
            let matcher = Matcher::new(&self.filter);
            let visible = self
                .containers
                .iter()
                .filter(|c| matcher.matches(*c, &self.fields))
                .cloned()
                .collect();
            self.visible = Some(visible);
        }
        self.visible.as_deref().unwrap_or_default()
    }

    /// Returns the filtered containers as of the last rebuild
    #[must_use]
    pub fn peek_containers(&self) -> &[Container] {
        self.visible.as_deref().unwrap_or_default()
    }

    /// Returns the visible container at `position`
    pub fn container(&mut self, position: usize) -> Option<&Container> {
        self.containers().get(position)
    }

    /// Sets the filter buffer
    pub fn set_filter(&mut self, buffer: &str) {
        if self.filter != buffer {
            self.filter = buffer.to_string();
            self.invalidate();
        }
    }

    /// Switches between running and all containers; refresh to apply
    pub fn toggle_show_all(&mut self) -> bool {
        self.show_all = !self.show_all;
        self.show_all
    }

    /// Returns true if stopped containers are listed too
    #[must_use]
    pub const fn show_all(&self) -> bool {
        self.show_all
    }

    /// Runs stop/start/restart/remove/inspect against a container
    ///
    /// The command is bounded by the configured action timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails, times out, or `action` is not
    /// a single-container action.
    pub fn run_action<E: Executor + ?Sized>(
        &self,
        action: Action,
        container: &Container,
        executor: &mut E,
    ) -> ExecResult<()> {
        let spec = docker_action(&self.settings, action, &container.name).ok_or_else(|| {
            ExecutionError::InvalidCommand {
                program: self.settings.binary.clone(),
                reason: format!("'{}' is not a container action", action.verb()),
            }
        })?;

        info!(container = %container.name, action = action.verb(), "Container action");
        let result = executor
            .execute(&spec, &ExecOptions::bounded(self.settings.action_timeout()))
            .and_then(|status| status.check(&spec.program));

        if let Err(e) = &result {
            error!(container = %container.name, action = action.verb(), error = %e, "Container action failed");
        }
        result
    }

    /// Returns `docker inspect` output for a container
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or times out.
    pub fn inspect<E: Executor + ?Sized>(
        &self,
        container: &Container,
        executor: &mut E,
    ) -> ExecResult<String> {
        let spec = docker_action(&self.settings, Action::Inspect, &container.name)
            .ok_or_else(|| ExecutionError::InvalidCommand {
                program: self.settings.binary.clone(),
                reason: "inspect unavailable".to_string(),
            })?;
        executor.capture(&spec, &ExecOptions::bounded(self.settings.action_timeout()))
    }

    /// Opens an interactive shell in a container
    ///
    /// When the configured shell is missing (exit 126/127) the exec is
    /// retried once with `sh`. Inside tmux the window is opened
    /// asynchronously and no retry is possible.
    ///
    /// # Errors
    ///
    /// Returns an error if docker cannot run or the session fails.
    pub fn connect<E: Executor + ?Sized>(
        &self,
        container: &Container,
        executor: &mut E,
        launcher: &Launcher,
    ) -> ExecResult<ExitStatus> {
        let shell = self.settings.shell.as_str();
        let status = self.exec_shell(container, shell, executor, launcher)?;

        let status = if needs_shell_fallback(status) && shell != FALLBACK_SHELL {
            info!(container = %container.name, shell, "Shell not found, retrying with sh");
            self.exec_shell(container, FALLBACK_SHELL, executor, launcher)?
        } else {
            status
        };

        status.check(&self.settings.binary)?;
        Ok(status)
    }

    fn exec_shell<E: Executor + ?Sized>(
        &self,
        container: &Container,
        shell: &str,
        executor: &mut E,
        launcher: &Launcher,
    ) -> ExecResult<ExitStatus> {
        let spec = docker_exec(&self.settings, &container.name, shell);
        let (spec, options) = launcher.prepare(&spec, &container.name);
        info!(container = %container.name, command = %spec, "Docker exec");
        executor.execute(&spec, &options)
    }

    /// Starts following a container's logs
    ///
    /// # Errors
    ///
    /// Returns an error if `docker logs` cannot be started.
    pub fn follow_logs<E: Executor + ?Sized>(
        &self,
        container: &Container,
        executor: &mut E,
    ) -> ExecResult<LogSubscription> {
        let spec = docker_logs(&self.settings, &container.name);
        info!(container = %container.name, "Following logs");
        executor.stream(&spec, self.settings.log_buffer_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::testing::ScriptedExecutor;

    const PS: &str = "a1b2c3\tapi\tnginx:latest\tUp 2 hours\n\
                      d4e5f6\tdb\tpostgres:16\tExited (0) 3 days ago\n";

    #[test]
    fn test_parse_ps_output() {
        let containers = parse_ps_output(
            "CONTAINER ID\tNAMES\tIMAGE\tSTATUS\n\
             a1b2c3\tapi\tnginx:latest\tUp 2 hours\n\
             \n\
             broken-line\n\
             d4e5f6\tdb\tpostgres:16\n",
        );
        assert_eq!(
            containers,
            vec![
                Container::new("a1b2c3", "api", "nginx:latest", "Up 2 hours"),
                Container::new("d4e5f6", "db", "postgres:16", ""),
            ]
        );
        assert!(containers[0].is_running());
    }

    #[test]
    fn test_refresh_and_filter() {
        let mut exec = ScriptedExecutor::new();
        exec.push_output(PS);
        let mut list = ContainerListController::new(DockerSettings::default());

        assert_eq!(list.refresh(&mut exec).unwrap(), 2);
        list.set_filter("POSTGRES");
        let names: Vec<&str> = list.containers().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["db"]);

        let (spec, opts) = &exec.calls[0];
        assert_eq!(spec.args[0], "ps");
        assert_eq!(opts.timeout, Some(std::time::Duration::from_secs(10)));
    }

    #[test]
    fn test_show_all_adds_flag() {
        let mut exec = ScriptedExecutor::new();
        let mut list = ContainerListController::new(DockerSettings::default());
        assert!(list.toggle_show_all());
        list.refresh(&mut exec).unwrap();
        assert_eq!(exec.calls[0].0.args[..2], ["ps", "-a"]);
    }

    #[test]
    fn test_refresh_failure_keeps_list() {
        let mut exec = ScriptedExecutor::new();
        exec.push_output(PS);
        exec.outputs.push_back(Err(ExecutionError::NonZeroExit {
            program: "docker".to_string(),
            code: Some(1),
            stderr: String::new(),
        }));
        let mut list = ContainerListController::new(DockerSettings::default());
        list.refresh(&mut exec).unwrap();
        assert!(list.refresh(&mut exec).is_err());
        assert_eq!(list.containers().len(), 2);
    }

    #[test]
    fn test_action_timeout_is_reported() {
        let mut exec = ScriptedExecutor::new();
        exec.push_timeout("docker");
        let list = ContainerListController::new(DockerSettings::default());
        let container = Container::new("a1", "api", "nginx", "Up");

        let err = list.run_action(Action::Stop, &container, &mut exec).unwrap_err();
        assert!(matches!(err, ExecutionError::TimedOut { .. }));
        assert_eq!(exec.programs(), vec!["docker stop api"]);
        assert_eq!(exec.calls[0].1.timeout, Some(std::time::Duration::from_secs(10)));
    }

    #[test]
    fn test_non_container_action_rejected() {
        let mut exec = ScriptedExecutor::new();
        let list = ContainerListController::new(DockerSettings::default());
        let container = Container::new("a1", "api", "nginx", "Up");
        assert!(list.run_action(Action::Logs, &container, &mut exec).is_err());
        assert!(exec.calls.is_empty());
    }

    #[test]
    fn test_connect_falls_back_to_sh() {
        let mut exec = ScriptedExecutor::new();
        exec.push_status(126);
        exec.push_status(0);
        let list = ContainerListController::new(DockerSettings::default());
        let container = Container::new("a1", "api", "alpine", "Up");

        list.connect(&container, &mut exec, &Launcher::default()).unwrap();
        assert_eq!(
            exec.programs(),
            vec!["docker exec -it api bash", "docker exec -it api sh"]
        );
    }

    #[test]
    fn test_connect_failure_without_fallback() {
        let mut exec = ScriptedExecutor::new();
        exec.push_status(1);
        let list = ContainerListController::new(DockerSettings::default());
        let container = Container::new("a1", "api", "alpine", "Up");

        assert!(list.connect(&container, &mut exec, &Launcher::default()).is_err());
        assert_eq!(exec.calls.len(), 1);
    }

    #[test]
    fn test_follow_logs_streams_lines() {
        let mut exec = ScriptedExecutor::new();
        let list = ContainerListController::new(DockerSettings::default());
        let container = Container::new("a1", "api", "nginx", "Up");

        let mut sub = list.follow_logs(&container, &mut exec).unwrap();
        exec.streams[0].send("started".to_string());
        assert_eq!(sub.drain(10), vec!["started"]);
        assert_eq!(exec.programs(), vec!["docker logs -f --tail 100 api"]);
    }
}
