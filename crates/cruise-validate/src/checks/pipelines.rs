//! Pipeline shape: stages or a resolvable template, timer syntax.

use super::{Context, pipeline_path};
use crate::error::Report;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;
    for pipeline in doc.all_pipelines() {
        match pipeline.template() {
            Some(template) if doc.template_by_name(template.as_str()).is_err() => report.add(
                pipeline_path(pipeline),
                format!("Pipeline '{}' refers to non-existent template '{}'.", pipeline.name, template),
            ),
            Some(_) => {}
            None if pipeline.stages().is_empty() => report.add(
                pipeline_path(pipeline),
                format!(
                    "Pipeline '{}' does not have any stages configured. A pipeline must have at least one stage.",
                    pipeline.name
                ),
            ),
            None => {}
        }

        let Some(timer) = &pipeline.timer else { continue };
        if !matches!(timer.spec.split_whitespace().count(), 6 | 7) {
            report.add(
                pipeline_path(pipeline),
                format!("Invalid cron syntax for timer: {}", timer.spec),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate;
    use cruise_model::{ConfigurationDocument, Material, Pipeline, Timer};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_unknown_template() {
        let mut pipeline = Pipeline::new("deploy");
        pipeline.add_material(Material::git("https://example.com/a.git"));
        pipeline.set_template("missing").unwrap();
        let mut doc = ConfigurationDocument::new();
        doc.add_pipeline("first", pipeline).unwrap();

        let errors = validate(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "pipeline[deploy]");
        assert_eq!(errors[0].message, "Pipeline 'deploy' refers to non-existent template 'missing'.");
    }

    #[rstest]
    #[case("0 0 22 ? * MON-FRI", true)]
    #[case("0 0 22 ? * MON-FRI 2030", true)]
    #[case("0 22 * * *", false)]
    #[case("", false)]
    fn test_timer_field_count(#[case] spec: &str, #[case] valid: bool) {
        let mut pipeline =
            Pipeline::with_stages("nightly", Material::git("https://example.com/a.git"), [("build", ["unit"])])
                .unwrap();
        pipeline.timer = Some(Timer {
            spec: spec.to_string(),
            only_on_changes: false,
        });
        let mut doc = ConfigurationDocument::new();
        doc.add_pipeline("first", pipeline).unwrap();

        let messages: Vec<String> = validate(&doc).into_iter().map(|e| e.message).collect();
        if valid {
            assert!(messages.is_empty(), "{messages:?}");
        } else {
            assert_eq!(messages, [format!("Invalid cron syntax for timer: {spec}")]);
        }
    }
}
