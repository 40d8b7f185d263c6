//! Environment membership.

use super::Context;
use crate::error::{Report, path};
use std::collections::HashMap;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;
    let mut owners = HashMap::new();
    for environment in &doc.environments {
        let at = path(&[("environment", environment.name.as_str())]);
        for pipeline in environment.pipelines() {
            if !doc.has_pipeline(pipeline) {
                report.add(
                    at.clone(),
                    format!(
                        "Environment '{}' refers to an unknown pipeline '{}'.",
                        environment.name, pipeline
                    ),
                );
            }
            match owners.get(pipeline.key()) {
                Some(owner) if *owner != &environment.name => report.add(
                    at.clone(),
                    format!("Associating pipeline(s) which is already part of {owner} environment"),
                ),
                Some(_) => {}
                None => {
                    owners.insert(pipeline.key(), &environment.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate;
    use cruise_model::{ConfigurationDocument, EnvironmentConfig, Material, Pipeline};
    use pretty_assertions::assert_eq;

    fn environment(name: &str, pipelines: &[&str]) -> EnvironmentConfig {
        let mut environment = EnvironmentConfig::new(name);
        for pipeline in pipelines {
            environment.add_pipeline(*pipeline).unwrap();
        }
        environment
    }

    #[test]
    fn test_environment_references() {
        let mut doc = ConfigurationDocument::new();
        let pipeline =
            Pipeline::with_stages("build", Material::git("https://example.com/a.git"), [("s", ["j"])]).unwrap();
        doc.add_pipeline("first", pipeline).unwrap();
        doc.environments.push(environment("uat", &["build", "ghost"]));
        doc.environments.push(environment("prod", &["BUILD"]));

        let errors: Vec<(String, String)> = validate(&doc).into_iter().map(|e| (e.path, e.message)).collect();
        assert_eq!(
            errors,
            [
                (
                    "environment[uat]".to_string(),
                    "Environment 'uat' refers to an unknown pipeline 'ghost'.".to_string()
                ),
                (
                    "environment[prod]".to_string(),
                    "Associating pipeline(s) which is already part of uat environment".to_string()
                ),
            ]
        );
    }
}
