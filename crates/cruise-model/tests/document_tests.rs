//! Behavioural tests for building and querying configuration documents

use cruise_model::{
    ConfigurationDocument, EnvironmentConfig, Error, Job, Material, Origin, PartialConfig, Pipeline, PipelineGroup,
    RepoOrigin, Stage, SvnMaterial, Task, Template,
};
use pretty_assertions::assert_eq;

fn plan_pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new("pipeline1");
    pipeline.add_material(Material::Svn(SvnMaterial::new("svn:///user:pass@tmp/foo")));

    let mut plan1 = Job::new("plan1");
    plan1.add_resource("tiger");
    plan1.add_resource("lion");
    plan1.add_task(Task::exec("ls", "-la"));
    pipeline.add_stage(Stage::new("mingle", [plan1]).unwrap()).unwrap();

    let mut cardlist = Job::new("cardlist");
    cardlist.add_task(Task::exec("ls", ""));
    pipeline.add_stage(Stage::new("deploy", [cardlist]).unwrap()).unwrap();
    pipeline
}

#[test]
fn test_basic_pipeline_shape() {
    let mut doc = ConfigurationDocument::new();
    doc.add_pipeline("defaultGroup", plan_pipeline()).unwrap();

    let pipeline = doc.pipeline_by_name("PIPELINE1").unwrap();
    let resources = pipeline.stage(0).unwrap().job("plan1").unwrap().resources();
    assert_eq!(resources, ["tiger", "lion"]);
    assert_eq!(pipeline.stages().len(), 2);
    assert_eq!(pipeline.materials()[0].type_name(), "Subversion");
}

#[test]
fn test_resources_deduplicate_case_insensitively() {
    let mut job = Job::new("j");
    job.add_resource("Tiger");
    job.add_resource("tiger");
    assert_eq!(job.resources(), ["Tiger"]);
}

#[test]
fn test_lookup_failures_name_the_missing_entity() {
    let mut doc = ConfigurationDocument::new();
    doc.add_pipeline("g", plan_pipeline()).unwrap();

    assert_eq!(
        doc.stage_by_name("pipeline1", "nope").unwrap_err().to_string(),
        "Stage 'nope' not found."
    );
    assert_eq!(
        doc.job_by_name("pipeline1", "mingle", "ghost").unwrap_err().to_string(),
        "Job 'ghost' not found."
    );
    assert!(matches!(doc.template_by_name("t"), Err(Error::NotFound { .. })));
    assert!(matches!(doc.environment_by_name("e"), Err(Error::NotFound { .. })));
}

#[test]
fn test_templated_pipeline_rejects_stages() {
    let mut pipeline = Pipeline::new("p");
    pipeline.set_template("abc").unwrap();
    let mut job = Job::new("j");
    job.add_task(Task::exec("ls", ""));
    let err = pipeline.add_stage(Stage::new("s", [job]).unwrap()).unwrap_err();
    assert!(err.to_string().contains("'p'"));
    assert!(err.to_string().contains("'abc'"));
}

#[test]
fn test_environment_membership() {
    let mut doc = ConfigurationDocument::new();
    doc.add_pipeline("g", plan_pipeline()).unwrap();
    let mut env = EnvironmentConfig::new("uat");
    env.add_pipeline("Pipeline1").unwrap();
    doc.environments.push(env);

    let found = doc.environment_for_pipeline(&"pipeline1".into()).unwrap();
    assert_eq!(found.name.as_str(), "uat");
}

#[test]
fn test_unique_materials_by_fingerprint() {
    let mut doc = ConfigurationDocument::new();
    let a = Pipeline::with_stages("a", Material::git("https://example.com/r.git"), [("s", ["j"])]).unwrap();
    let b = Pipeline::with_stages("b", Material::git("https://example.com/r.git"), [("s", ["j"])]).unwrap();
    doc.add_pipeline("g", a).unwrap();
    doc.add_pipeline("g", b).unwrap();

    assert_eq!(doc.all_unique_materials().len(), 1);
    let fingerprint = doc.all_unique_materials()[0].fingerprint();
    assert_eq!(doc.pipelines_with_material(&fingerprint).len(), 2);
}

#[test]
fn test_partial_origins_survive_clone_for_edit() {
    let mut group = PipelineGroup::new("remote");
    group.add_pipeline(Pipeline::new("from-repo")).unwrap();
    let mut partial = PartialConfig::new(RepoOrigin::new("fp"));
    partial.groups.push(group);
    partial.templates.push(Template::new("t"));
    partial.set_origin(RepoOrigin::new("fp").with_repo_id("repo1"));

    let mut doc = ConfigurationDocument::new();
    doc.groups.extend(partial.groups.clone());
    let copy = doc.clone_for_edit();

    let origin = &copy.pipeline_by_name("from-repo").unwrap().origin;
    assert!(origin.is_repo());
    assert_eq!(copy.local_pipelines().count(), 0);
    assert_eq!(doc.origin, Origin::File);
}
