//! Stages: ordered groups of jobs that run in parallel

use crate::job::push_unique_job;
use crate::{
    Authorization, CaseInsensitiveString, EnvironmentVariable, EnvironmentVariables, Error, Job, Result,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    /// Runs automatically once the previous stage passes.
    #[default]
    Success,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Approval {
    pub kind: ApprovalType,
    pub allow_only_on_success: bool,
    pub authorization: Authorization,
}

impl Approval {
    pub fn manual() -> Self {
        Self {
            kind: ApprovalType::Manual,
            ..Self::default()
        }
    }

    pub fn is_manual(&self) -> bool {
        self.kind == ApprovalType::Manual
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: CaseInsensitiveString,
    pub approval: Approval,
    pub artifact_cleanup_prohibited: bool,
    pub clean_working_dir: bool,
    jobs: Vec<Job>,
    variables: EnvironmentVariables,
}

impl Stage {
    /// Build a stage. At least one job is required and job names must be unique.
    pub fn new(name: impl Into<CaseInsensitiveString>, jobs: impl IntoIterator<Item = Job>) -> Result<Self> {
        let mut stage = Self {
            name: name.into(),
            approval: Approval::default(),
            artifact_cleanup_prohibited: false,
            clean_working_dir: false,
            jobs: Vec::new(),
            variables: EnvironmentVariables::new(),
        };
        for job in jobs {
            stage.add_job(job)?;
        }
        if stage.jobs.is_empty() {
            return Err(Error::EmptyJobs {
                stage: stage.name.to_string(),
            });
        }
        Ok(stage)
    }

    pub fn add_job(&mut self, job: Job) -> Result<()> {
        push_unique_job(&mut self.jobs, job)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut [Job] {
        &mut self.jobs
    }

    /// Case-insensitive job lookup.
    pub fn job(&self, name: &str) -> Result<&Job> {
        self.jobs
            .iter()
            .find(|j| j.name.matches(name))
            .ok_or_else(|| Error::not_found("Job", name))
    }

    pub fn has_job(&self, name: &CaseInsensitiveString) -> bool {
        self.jobs.iter().any(|j| &j.name == name)
    }

    pub fn add_variable(&mut self, variable: EnvironmentVariable) -> Result<()> {
        let scope = format!("stage '{}'", self.name);
        self.variables.insert(variable, "Variable", scope)
    }

    pub fn variables(&self) -> &EnvironmentVariables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut EnvironmentVariables {
        &mut self.variables
    }
}

/// Add `stage` to `stages`, rejecting case-insensitive duplicates.
pub(crate) fn push_unique_stage(stages: &mut Vec<Stage>, stage: Stage) -> Result<()> {
    if stages.iter().any(|s| s.name == stage.name) {
        return Err(Error::multiple("stages", "Stage", stage.name.as_str()));
    }
    stages.push(stage);
    Ok(())
}
