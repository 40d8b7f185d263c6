//! Jobs: the unit of work scheduled on an agent

use crate::{
    ArtifactConfig, CaseInsensitiveString, EnvironmentVariable, EnvironmentVariables, Error, Result, Task,
    TaskKind,
};
use serde::Serialize;

/// How many agents a job runs on.
///
/// Run-on-all-agents and run-multiple-instances are mutually exclusive, so
/// they share one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "count", rename_all = "snake_case")]
pub enum RunType {
    #[default]
    Single,
    OnAllAgents,
    Instances(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub name: CaseInsensitiveString,
    /// Minutes before the job is cancelled; `None` uses the server default.
    pub timeout: Option<String>,
    pub run_type: RunType,
    pub elastic_profile_id: Option<String>,
    resources: Vec<String>,
    tasks: Vec<Task>,
    artifacts: Vec<ArtifactConfig>,
    tabs: Vec<Tab>,
    variables: EnvironmentVariables,
}

impl Job {
    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            timeout: None,
            run_type: RunType::Single,
            elastic_profile_id: None,
            resources: Vec::new(),
            tasks: Vec::new(),
            artifacts: Vec::new(),
            tabs: Vec::new(),
            variables: EnvironmentVariables::new(),
        }
    }

    /// Add a required agent resource. Resources are case-insensitive; repeats are ignored.
    pub fn add_resource(&mut self, resource: impl Into<String>) {
        let resource = resource.into();
        let lowered = resource.to_lowercase();
        if !self.resources.iter().any(|r| r.to_lowercase() == lowered) {
            self.resources.push(resource);
        }
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Vec<String> {
        &mut self.resources
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn add_artifact(&mut self, artifact: ArtifactConfig) {
        self.artifacts.push(artifact);
    }

    pub fn artifacts(&self) -> &[ArtifactConfig] {
        &self.artifacts
    }

    pub fn artifacts_mut(&mut self) -> &mut [ArtifactConfig] {
        &mut self.artifacts
    }

    pub fn add_tab(&mut self, tab: Tab) {
        self.tabs.push(tab);
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn add_variable(&mut self, variable: EnvironmentVariable) -> Result<()> {
        let scope = format!("job '{}'", self.name);
        self.variables.insert(variable, "Environment Variable", scope)
    }

    pub fn variables(&self) -> &EnvironmentVariables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut EnvironmentVariables {
        &mut self.variables
    }

    /// Every task including cancel tasks, depth-first.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .flat_map(|t| std::iter::once(t).chain(t.on_cancel()))
    }

    pub fn fetch_tasks(&self) -> impl Iterator<Item = &Task> {
        self.all_tasks().filter(|t| {
            matches!(
                t.kind,
                TaskKind::FetchArtifact(_) | TaskKind::FetchPluggableArtifact(_)
            )
        })
    }
}

/// Add `job` to `jobs`, rejecting case-insensitive duplicates.
pub(crate) fn push_unique_job(jobs: &mut Vec<Job>, job: Job) -> Result<()> {
    if jobs.iter().any(|j| j.name == job.name) {
        return Err(Error::multiple("jobs", "Job", job.name.as_str()));
    }
    jobs.push(job);
    Ok(())
}
