//! Environments

use crate::property::{read_variables, write_variables};
use crate::schema::{IdentityConstraint, any_number, check_attrs, check_sequence, name_attr, optional, require_attr};
use crate::{DocumentCodec, Result};
use cruise_model::EnvironmentConfig;
use cruise_xml::Element;

/// Read the `<environments>` element. Names are unique by exact spelling here;
/// case-insensitive collisions are left to validation.
pub(crate) fn read_environments(codec: &DocumentCodec<'_>, element: &Element) -> Result<Vec<EnvironmentConfig>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["environment"])])?;
    let mut names = IdentityConstraint::new("environments");
    let mut environments = Vec::new();
    for environment in element.children_named("environment") {
        let environment = read_environment(codec, environment)?;
        names.insert(environment.name.as_str())?;
        environments.push(environment);
    }
    Ok(environments)
}

pub(crate) fn read_environment(codec: &DocumentCodec<'_>, element: &Element) -> Result<EnvironmentConfig> {
    check_attrs(element, &["name"])?;
    check_sequence(
        element,
        &[optional(&["environmentvariables"]), optional(&["agents"]), optional(&["pipelines"])],
    )?;
    let mut environment = EnvironmentConfig::new(name_attr(element, "name", "Environment name")?);
    for variable in read_variables(codec, element)? {
        environment.add_variable(variable)?;
    }
    if let Some(agents) = element.child("agents") {
        check_attrs(agents, &[])?;
        check_sequence(agents, &[any_number(&["physical"])])?;
        let mut uuids = IdentityConstraint::new("agents");
        for agent in agents.children_named("physical") {
            check_attrs(agent, &["uuid"])?;
            let uuid = require_attr(agent, "uuid")?;
            uuids.insert(uuid)?;
            environment.add_agent(uuid)?;
        }
    }
    if let Some(pipelines) = element.child("pipelines") {
        check_attrs(pipelines, &[])?;
        check_sequence(pipelines, &[any_number(&["pipeline"])])?;
        for pipeline in pipelines.children_named("pipeline") {
            check_attrs(pipeline, &["name"])?;
            environment.add_pipeline(name_attr(pipeline, "name", "Name")?)?;
        }
    }
    Ok(environment)
}

pub(crate) fn write_environment(environment: &EnvironmentConfig) -> Element {
    let mut element = Element::new("environment").with_attr("name", environment.name.as_str());
    write_variables(&mut element, environment.variables().iter());
    if !environment.agents().is_empty() {
        let mut agents = Element::new("agents");
        for uuid in environment.agents() {
            agents.push(Element::new("physical").with_attr("uuid", uuid));
        }
        element.push(agents);
    }
    if !environment.pipelines().is_empty() {
        let mut pipelines = Element::new("pipelines");
        for name in environment.pipelines() {
            pipelines.push(Element::new("pipeline").with_attr("name", name.as_str()));
        }
        element.push(pipelines);
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn environments(xml: &str) -> Result<Vec<EnvironmentConfig>> {
        read_environments(&DocumentCodec::new(), &cruise_xml::parse(xml).unwrap())
    }

    #[test]
    fn test_duplicate_environment_names() {
        let err = environments(r#"<environments><environment name="uat" /><environment name="uat" /></environments>"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate unique value [uat] declared for identity constraint of element \"environments\"."
        );
    }

    #[test]
    fn test_duplicate_agent_uuid() {
        let err = environments(
            r#"<environments><environment name="uat"><agents><physical uuid="1" /><physical uuid="1" /></agents></environment></environments>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate unique value [1] declared for identity constraint of element \"agents\"."
        );
    }

    #[test]
    fn test_members_survive_writing() {
        let xml = r#"<environments><environment name="uat"><environmentvariables><variable name="A"><value>1</value></variable></environmentvariables><agents><physical uuid="agent-1" /></agents><pipelines><pipeline name="build" /></pipelines></environment></environments>"#;
        let env = environments(xml).unwrap().remove(0);
        assert_eq!(env.agents(), ["agent-1".to_string()]);
        assert_eq!(env.pipelines()[0].as_str(), "build");
        let written = write_environment(&env);
        assert_eq!(read_environment(&DocumentCodec::new(), &written).unwrap(), env);
    }
}
