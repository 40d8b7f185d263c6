//! Tasks executed by a job

use crate::{CaseInsensitiveString, Configuration, Error, Result};
use serde::Serialize;
use std::fmt;

/// When a task runs relative to the outcome of earlier tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunIfCondition {
    Passed,
    Failed,
    Any,
}

impl RunIfCondition {
    pub const ALL: [&'static str; 3] = ["passed", "failed", "any"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Any => "any",
        }
    }
}

/// Plugin id and version of a pluggable entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginConfiguration {
    pub id: String,
    pub version: String,
}

impl PluginConfiguration {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// Arguments of an exec task: one line or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecArgs {
    Line(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecTask {
    pub command: String,
    pub args: ExecArgs,
    pub working_dir: Option<String>,
}

impl ExecTask {
    pub fn new(command: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: ExecArgs::Line(args.into()),
            working_dir: None,
        }
    }
}

/// Ant and Rake tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildTask {
    pub build_file: Option<String>,
    pub target: Option<String>,
    pub working_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NantTask {
    pub build: BuildTask,
    pub nant_path: Option<String>,
}

/// `a/b/c` path from an ancestor pipeline down to the direct upstream.
///
/// An empty path means the pipeline that owns the fetch task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathFromAncestor(Vec<CaseInsensitiveString>);

impl PathFromAncestor {
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(CaseInsensitiveString::from)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pipeline the artifact is fetched from.
    pub fn ancestor(&self) -> Option<&CaseInsensitiveString> {
        self.0.first()
    }

    /// Direct upstream of the fetching pipeline.
    pub fn parent(&self) -> Option<&CaseInsensitiveString> {
        self.0.last()
    }

    pub fn segments(&self) -> &[CaseInsensitiveString] {
        &self.0
    }
}

impl fmt::Display for PathFromAncestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.iter().map(|p| p.as_str()).collect();
        f.write_str(&parts.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    File(String),
    Dir(String),
}

impl FetchSource {
    pub fn path(&self) -> &str {
        match self {
            FetchSource::File(p) | FetchSource::Dir(p) => p,
        }
    }
}

/// Fetch of a built-in artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchArtifactTask {
    pub pipeline: PathFromAncestor,
    pub stage: CaseInsensitiveString,
    pub job: CaseInsensitiveString,
    pub source: FetchSource,
    pub dest: Option<String>,
}

/// Fetch of an artifact published to an external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchPluggableArtifactTask {
    pub pipeline: PathFromAncestor,
    pub stage: CaseInsensitiveString,
    pub job: CaseInsensitiveString,
    pub artifact_id: String,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluggableTask {
    pub plugin: PluginConfiguration,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    Exec(ExecTask),
    Ant(BuildTask),
    NAnt(NantTask),
    Rake(BuildTask),
    FetchArtifact(FetchArtifactTask),
    FetchPluggableArtifact(FetchPluggableArtifactTask),
    Pluggable(PluggableTask),
    Null,
}

/// A task with its run-if conditions and optional cancel task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub kind: TaskKind,
    run_if: Vec<RunIfCondition>,
    on_cancel: Option<Box<Task>>,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            run_if: Vec::new(),
            on_cancel: None,
        }
    }

    pub fn exec(command: impl Into<String>, args: impl Into<String>) -> Self {
        Self::new(TaskKind::Exec(ExecTask::new(command, args)))
    }

    /// Attach the task that runs when this one is cancelled.
    ///
    /// Fails when `cancel` carries its own cancel task.
    pub fn with_on_cancel(mut self, cancel: Task) -> Result<Self> {
        self.set_on_cancel(cancel)?;
        Ok(self)
    }

    pub fn set_on_cancel(&mut self, cancel: Task) -> Result<()> {
        if cancel.on_cancel.is_some() {
            return Err(Error::NestedOnCancel);
        }
        self.on_cancel = Some(Box::new(cancel));
        Ok(())
    }

    pub fn on_cancel(&self) -> Option<&Task> {
        self.on_cancel.as_deref()
    }

    pub fn on_cancel_mut(&mut self) -> Option<&mut Task> {
        self.on_cancel.as_deref_mut()
    }

    /// Add a run-if condition; repeats are ignored.
    pub fn add_run_if(&mut self, condition: RunIfCondition) {
        if !self.run_if.contains(&condition) {
            self.run_if.push(condition);
        }
    }

    /// Declared run-if conditions. Empty means the default, `passed`.
    pub fn run_if(&self) -> &[RunIfCondition] {
        &self.run_if
    }

    pub fn runs_on(&self, condition: RunIfCondition) -> bool {
        if self.run_if.is_empty() {
            return condition == RunIfCondition::Passed;
        }
        self.run_if.contains(&RunIfCondition::Any) || self.run_if.contains(&condition)
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            TaskKind::Exec(_) => "exec",
            TaskKind::Ant(_) => "ant",
            TaskKind::NAnt(_) => "nant",
            TaskKind::Rake(_) => "rake",
            TaskKind::FetchArtifact(_) | TaskKind::FetchPluggableArtifact(_) => "fetchartifact",
            TaskKind::Pluggable(_) => "task",
            TaskKind::Null => "null",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_on_cancel_is_rejected() {
        let inner = Task::exec("cleanup", "").with_on_cancel(Task::exec("kill", "")).unwrap();
        let err = Task::exec("make", "").with_on_cancel(inner).unwrap_err();
        assert_eq!(err.to_string(), "Cannot nest 'oncancel' within a cancel task");
    }

    #[test]
    fn test_default_run_if_is_passed() {
        let task = Task::exec("ls", "");
        assert!(task.runs_on(RunIfCondition::Passed));
        assert!(!task.runs_on(RunIfCondition::Failed));
    }

    #[test]
    fn test_run_if_any() {
        let mut task = Task::exec("ls", "");
        task.add_run_if(RunIfCondition::Any);
        task.add_run_if(RunIfCondition::Any);
        assert_eq!(task.run_if().len(), 1);
        assert!(task.runs_on(RunIfCondition::Failed));
    }

    #[test]
    fn test_path_from_ancestor() {
        let path = PathFromAncestor::parse("uppest/up/down");
        assert_eq!(path.ancestor().unwrap().as_str(), "uppest");
        assert_eq!(path.parent().unwrap().as_str(), "down");
        assert_eq!(path.to_string(), "uppest/up/down");
        assert!(PathFromAncestor::parse("").is_empty());
    }
}
