//! Pipeline groups and templates

use crate::stage::push_unique_stage;
use crate::{Authorization, CaseInsensitiveString, Error, Origin, Pipeline, Result, Stage};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineGroup {
    pub name: CaseInsensitiveString,
    pub authorization: Authorization,
    pub origin: Origin,
    pipelines: Vec<Pipeline>,
}

impl PipelineGroup {
    pub const DEFAULT_NAME: &'static str = "defaultGroup";

    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            authorization: Authorization::default(),
            origin: Origin::File,
            pipelines: Vec::new(),
        }
    }

    /// Add a pipeline. Names are unique within the group.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        if self.has_pipeline(&pipeline.name) {
            return Err(Error::multiple("pipelines", "Pipeline", pipeline.name.as_str()));
        }
        self.pipelines.push(pipeline);
        Ok(())
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipelines_mut(&mut self) -> &mut [Pipeline] {
        &mut self.pipelines
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name.matches(name))
    }

    pub fn has_pipeline(&self, name: &CaseInsensitiveString) -> bool {
        self.pipelines.iter().any(|p| &p.name == name)
    }

    pub fn remove_pipeline(&mut self, name: &CaseInsensitiveString) -> Option<Pipeline> {
        let index = self.pipelines.iter().position(|p| &p.name == name)?;
        Some(self.pipelines.remove(index))
    }

    /// Tag the group and its pipelines with `origin`.
    pub fn set_origin(&mut self, origin: Origin) {
        for pipeline in &mut self.pipelines {
            pipeline.origin = origin.clone();
        }
        self.origin = origin;
    }
}

/// Reusable list of stages that pipelines can reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: CaseInsensitiveString,
    pub authorization: Authorization,
    pub origin: Origin,
    stages: Vec<Stage>,
}

impl Template {
    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            authorization: Authorization::default(),
            origin: Origin::File,
            stages: Vec::new(),
        }
    }

    pub fn add_stage(&mut self, stage: Stage) -> Result<()> {
        push_unique_stage(&mut self.stages, stage)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_pipeline_in_group() {
        let mut group = PipelineGroup::new("g");
        group.add_pipeline(Pipeline::new("Test")).unwrap();
        let err = group.add_pipeline(Pipeline::new("test")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You have defined multiple pipelines called 'test'. Pipeline names are case-insensitive and must be unique."
        );
    }

    #[test]
    fn test_set_origin_propagates() {
        use crate::RepoOrigin;
        let mut group = PipelineGroup::new("g");
        group.add_pipeline(Pipeline::new("p")).unwrap();
        group.set_origin(Origin::Repo(RepoOrigin::new("fp")));
        assert!(group.pipelines()[0].origin.is_repo());
    }
}
