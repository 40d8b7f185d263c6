//! Environments: named sets of pipelines and agents

use crate::{CaseInsensitiveString, EnvironmentVariable, EnvironmentVariables, Error, Origin, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    pub name: CaseInsensitiveString,
    pub origin: Origin,
    agents: Vec<String>,
    pipelines: Vec<CaseInsensitiveString>,
    variables: EnvironmentVariables,
}

impl EnvironmentConfig {
    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            origin: Origin::File,
            agents: Vec::new(),
            pipelines: Vec::new(),
            variables: EnvironmentVariables::new(),
        }
    }

    pub fn add_agent(&mut self, uuid: impl Into<String>) -> Result<()> {
        let uuid = uuid.into();
        if self.agents.contains(&uuid) {
            return Err(Error::not_unique(
                "Agent uuid",
                uuid,
                format!("environment '{}'", self.name),
            ));
        }
        self.agents.push(uuid);
        Ok(())
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn add_pipeline(&mut self, name: impl Into<CaseInsensitiveString>) -> Result<()> {
        let name = name.into();
        if self.contains_pipeline(&name) {
            return Err(Error::not_unique(
                "Pipeline",
                name.as_str(),
                format!("environment '{}'", self.name),
            ));
        }
        self.pipelines.push(name);
        Ok(())
    }

    pub fn pipelines(&self) -> &[CaseInsensitiveString] {
        &self.pipelines
    }

    pub fn contains_pipeline(&self, name: &CaseInsensitiveString) -> bool {
        self.pipelines.contains(name)
    }

    pub fn add_variable(&mut self, variable: EnvironmentVariable) -> Result<()> {
        let scope = format!("environment '{}'", self.name);
        self.variables.insert(variable, "Variable", scope)
    }

    pub fn variables(&self) -> &EnvironmentVariables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut EnvironmentVariables {
        &mut self.variables
    }
}
