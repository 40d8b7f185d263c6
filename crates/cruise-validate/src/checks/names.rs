//! Global name uniqueness and reserved job names.
//!
//! Uniqueness inside one pipeline, stage or job (stages, jobs, variables,
//! params) is enforced when the model is built and cannot reach this point.

use super::{Context, all_jobs, repeated};
use crate::error::{Report, path};
use regex::Regex;
use std::sync::LazyLock;

static RESERVED_JOB_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(runOnAll|runInstance)-\d+").unwrap());

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;

    for group in repeated(&doc.groups, |g| &g.name) {
        report.add(
            path(&[("group", group.name.as_str())]),
            format!("Group with name '{}' already exists", group.name),
        );
    }

    for pipeline in repeated(doc.all_pipelines(), |p| &p.name) {
        report.add(
            path(&[("pipeline", pipeline.name.as_str())]),
            format!(
                "You have defined multiple pipelines called '{}'. Pipeline names are case-insensitive and must be unique.",
                pipeline.name
            ),
        );
    }

    for template in repeated(&doc.templates, |t| &t.name) {
        report.add(
            path(&[("template", template.name.as_str())]),
            format!("Template name '{}' is not unique", template.name),
        );
    }

    for environment in repeated(&doc.environments, |e| &e.name) {
        report.add(
            path(&[("environment", environment.name.as_str())]),
            format!("Environment with name '{}' already exists.", environment.name),
        );
    }

    for (at, _, job) in all_jobs(doc) {
        if let Some(found) = RESERVED_JOB_SUFFIX.captures(job.name.as_str()) {
            report.add(
                at,
                format!(
                    "A job cannot have '{}' in it's name: {} because it is a reserved keyword",
                    &found[1], job.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate;
    use cruise_model::{ConfigurationDocument, EnvironmentConfig, Job, Material, Pipeline, PipelineGroup, Stage, Template};
    use rstest::rstest;

    fn messages(doc: &ConfigurationDocument) -> Vec<String> {
        validate(doc).into_iter().map(|e| e.message).collect()
    }

    fn pipeline(name: &str) -> Pipeline {
        Pipeline::with_stages(name, Material::git(format!("https://example.com/{name}.git")), [("build", ["unit"])])
            .unwrap()
    }

    #[test]
    fn test_pipeline_names_unique_across_groups() {
        let mut doc = ConfigurationDocument::new();
        doc.add_pipeline("first", pipeline("build")).unwrap();
        let mut second = PipelineGroup::new("second");
        second.add_pipeline(pipeline("BUILD")).unwrap();
        doc.groups.push(second);

        assert_eq!(
            messages(&doc),
            ["You have defined multiple pipelines called 'BUILD'. Pipeline names are case-insensitive and must be unique."]
        );
    }

    #[test]
    fn test_group_and_template_and_environment_names() {
        let mut doc = ConfigurationDocument::new();
        doc.groups.push(PipelineGroup::new("first"));
        doc.groups.push(PipelineGroup::new("First"));
        for name in ["deploy", "Deploy"] {
            let mut template = Template::new(name);
            template.add_stage(Stage::new("s", [Job::new("j")]).unwrap()).unwrap();
            doc.templates.push(template);
        }
        doc.environments.push(EnvironmentConfig::new("uat"));
        doc.environments.push(EnvironmentConfig::new("UAT"));

        assert_eq!(
            messages(&doc),
            [
                "Group with name 'First' already exists",
                "Template name 'Deploy' is not unique",
                "Environment with name 'UAT' already exists.",
            ]
        );
    }

    #[rstest]
    #[case("unit-runOnAll-1", Some("runOnAll"))]
    #[case("unit-runInstance-12", Some("runInstance"))]
    #[case("unit-runOnAll", None)]
    #[case("runInstance", None)]
    fn test_reserved_job_names(#[case] job: &'static str, #[case] marker: Option<&str>) {
        let mut doc = ConfigurationDocument::new();
        let p = Pipeline::with_stages("build", Material::git("https://example.com/a.git"), [("test", [job])]).unwrap();
        doc.add_pipeline("first", p).unwrap();

        let expected: Vec<String> = marker
            .map(|m| format!("A job cannot have '{m}' in it's name: {job} because it is a reserved keyword"))
            .into_iter()
            .collect();
        assert_eq!(messages(&doc), expected);
    }
}
