//! Validation of parsed documents.

use cruise_codec::parse_document;
use cruise_model::{ConfigurationDocument, GitMaterial, Job, Material, Pipeline, Stage};
use cruise_test_utils::builders::{PipelineXml, group};
use cruise_test_utils::fixtures;
use cruise_validate::validate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn messages(xml: &str) -> Vec<String> {
    let doc = parse_document(xml.as_bytes()).unwrap();
    validate(&doc).into_iter().map(|e| e.message).collect()
}

#[test]
fn test_valid_fixture_has_no_errors() {
    assert_eq!(messages(&fixtures::two_stage_pipeline()), Vec::<String>::new());
}

#[test]
fn test_fetch_from_stage_after_dependency() {
    let doc = parse_document(fixtures::fetch_from_later_stage().as_bytes()).unwrap();
    let errors = validate(&doc);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "pipeline[downstream]/stage[test]/job[verify]");
    assert_eq!(
        errors[0].message,
        r#""downstream :: test :: verify" tries to fetch artifact from stage "upstream :: deploy" which does not complete before "downstream" pipeline's dependencies."#
    );
}

#[test]
fn test_errors_accumulate_across_checks() {
    let body = group(
        "first",
        &[
            PipelineXml::new("empty"),
            PipelineXml::new("templated").attr("template", "missing"),
            PipelineXml::new("orphan")
                .depends_on("ghost", "build")
                .stage("build", &["unit-runOnAll-1"]),
        ],
    );
    let xml = fixtures::current(&format!(
        r#"{body}<environments><environment name="uat"><pipelines><pipeline name="nowhere" /></pipelines></environment></environments>"#
    ));

    assert_eq!(
        messages(&xml),
        [
            "A job cannot have 'runOnAll' in it's name: unit-runOnAll-1 because it is a reserved keyword",
            "Pipeline 'empty' does not have any stages configured. A pipeline must have at least one stage.",
            "Pipeline 'templated' refers to non-existent template 'missing'.",
            "Environment 'uat' refers to an unknown pipeline 'nowhere'.",
            "Pipeline with name 'ghost' does not exist, it is defined as a dependency for pipeline 'orphan'",
        ]
    );
}

#[test]
fn test_pipeline_names_collide_case_insensitively_across_groups() {
    let xml = fixtures::current(&format!(
        "{}{}",
        group("first", &[PipelineXml::new("build").stage("s", &["j"])]),
        group("second", &[PipelineXml::new("Build").stage("s", &["j"])]),
    ));

    assert_eq!(
        messages(&xml),
        ["You have defined multiple pipelines called 'Build'. Pipeline names are case-insensitive and must be unique."]
    );
}

fn with_git(name: &str, url: &str, auto_update: bool) -> Pipeline {
    let mut git = GitMaterial::new(url);
    git.options.auto_update = auto_update;
    let mut pipeline = Pipeline::new(name);
    pipeline.add_material(Material::Git(git));
    pipeline.add_stage(Stage::new("build", [Job::new("unit")]).unwrap()).unwrap();
    pipeline
}

proptest! {
    #[test]
    fn prop_shared_material_must_agree_on_auto_update(
        repo in "[a-z]{1,12}",
        first in any::<bool>(),
        second in any::<bool>(),
    ) {
        let url = format!("https://example.com/{repo}.git");
        let mut doc = ConfigurationDocument::new();
        doc.add_pipeline("g", with_git("alpha", &url, first)).unwrap();
        doc.add_pipeline("g", with_git("beta", &url, second)).unwrap();

        let errors = validate(&doc);
        if first == second {
            prop_assert!(errors.is_empty());
        } else {
            prop_assert_eq!(errors.len(), 1);
            prop_assert!(errors[0].message.contains(" alpha (auto update"));
            prop_assert!(errors[0].message.contains(" beta (auto update"));
        }
    }

    #[test]
    fn prop_template_names_are_case_insensitive(name in "[a-zA-Z][a-zA-Z0-9_]{0,15}") {
        let mut doc = ConfigurationDocument::new();
        for spelling in [name.to_lowercase(), name.to_uppercase()] {
            let mut template = cruise_model::Template::new(spelling);
            template.add_stage(Stage::new("s", [Job::new("j")]).unwrap()).unwrap();
            doc.templates.push(template);
        }

        let errors = validate(&doc);
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(&errors[0].message, &format!("Template name '{}' is not unique", name.to_uppercase()));
    }
}
