//! Pipelines and their parameters, timers and lock behavior

use crate::stage::push_unique_stage;
use crate::{
    CaseInsensitiveString, EnvironmentVariable, EnvironmentVariables, Error, Job, Material, Origin, Result, Stage,
    Task,
};
use serde::Serialize;
use std::fmt;

/// What happens to the pipeline lock between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LockBehavior {
    LockOnFailure,
    UnlockWhenFinished,
    None,
}

impl LockBehavior {
    pub const VALUES: [&'static str; 3] = ["lockOnFailure", "unlockWhenFinished", "none"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lockOnFailure" => Some(Self::LockOnFailure),
            "unlockWhenFinished" => Some(Self::UnlockWhenFinished),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LockOnFailure => "lockOnFailure",
            Self::UnlockWhenFinished => "unlockWhenFinished",
            Self::None => "none",
        }
    }
}

impl fmt::Display for LockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    /// Quartz-style cron expression.
    pub spec: String,
    pub only_on_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: CaseInsensitiveString,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub name: CaseInsensitiveString,
    pub label_template: String,
    pub lock_behavior: Option<LockBehavior>,
    pub timer: Option<Timer>,
    pub origin: Origin,
    template: Option<CaseInsensitiveString>,
    params: Vec<Param>,
    variables: EnvironmentVariables,
    materials: Vec<Material>,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub const DEFAULT_LABEL_TEMPLATE: &'static str = "${COUNT}";

    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            label_template: Self::DEFAULT_LABEL_TEMPLATE.to_string(),
            lock_behavior: None,
            timer: None,
            origin: Origin::File,
            template: None,
            params: Vec::new(),
            variables: EnvironmentVariables::new(),
            materials: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Pipeline with one material and one stage per `(stage, jobs)` entry. Handy for builders.
    pub fn with_stages<I, J>(name: &str, material: Material, stages: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'static str, J)>,
        J: IntoIterator<Item = &'static str>,
    {
        let mut pipeline = Self::new(name);
        pipeline.add_material(material);
        for (stage, jobs) in stages {
            let jobs = jobs.into_iter().map(|j| {
                let mut job = Job::new(j);
                job.add_task(Task::exec("echo", ""));
                job
            });
            pipeline.add_stage(Stage::new(stage, jobs)?)?;
        }
        Ok(pipeline)
    }

    pub fn template(&self) -> Option<&CaseInsensitiveString> {
        self.template.as_ref()
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Point the pipeline at a template. Only allowed while it owns no stages.
    pub fn set_template(&mut self, template: impl Into<CaseInsensitiveString>) -> Result<()> {
        let template = template.into();
        if !self.stages.is_empty() {
            return Err(Error::TemplateOnPipelineWithStages {
                pipeline: self.name.to_string(),
                template: template.to_string(),
            });
        }
        self.template = Some(template);
        Ok(())
    }

    pub fn add_stage(&mut self, stage: Stage) -> Result<()> {
        if let Some(template) = &self.template {
            return Err(Error::StageOnTemplatedPipeline {
                stage: stage.name.to_string(),
                pipeline: self.name.to_string(),
                template: template.to_string(),
            });
        }
        push_unique_stage(&mut self.stages, stage)
    }

    /// Replace the template reference with the template's stages.
    pub fn expand_template(&mut self, stages: Vec<Stage>) {
        self.template = None;
        self.stages = stages;
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }

    /// Stage by position.
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Case-insensitive stage lookup.
    pub fn stage_by_name(&self, name: &str) -> Result<&Stage> {
        self.stages
            .iter()
            .find(|s| s.name.matches(name))
            .ok_or_else(|| Error::not_found("Stage", name))
    }

    /// Position of a stage, used for ordering checks.
    pub fn stage_index(&self, name: &CaseInsensitiveString) -> Option<usize> {
        self.stages.iter().position(|s| &s.name == name)
    }

    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.push(material);
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
    }

    /// Upstream pipeline/stage pairs this pipeline depends on.
    pub fn dependencies(&self) -> impl Iterator<Item = (&CaseInsensitiveString, &CaseInsensitiveString)> {
        self.materials.iter().filter_map(|m| match m {
            Material::Dependency(d) => Some((&d.pipeline, &d.stage)),
            _ => None,
        })
    }

    pub fn depends_on(&self, upstream: &CaseInsensitiveString) -> bool {
        self.dependencies().any(|(p, _)| p == upstream)
    }

    pub fn add_param(&mut self, param: Param) -> Result<()> {
        if self.params.iter().any(|p| p.name == param.name) {
            return Err(Error::not_unique(
                "Param",
                param.name.as_str(),
                format!("pipeline '{}'", self.name),
            ));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.matches(name))
            .map(|p| p.value.as_str())
    }

    pub fn add_variable(&mut self, variable: EnvironmentVariable) -> Result<()> {
        let scope = format!("pipeline '{}'", self.name);
        self.variables.insert(variable, "Variable", scope)
    }

    pub fn variables(&self) -> &EnvironmentVariables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut EnvironmentVariables {
        &mut self.variables
    }

    pub fn is_lockable(&self) -> bool {
        matches!(
            self.lock_behavior,
            Some(LockBehavior::LockOnFailure | LockBehavior::UnlockWhenFinished)
        )
    }
}
