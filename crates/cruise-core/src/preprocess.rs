//! Template expansion and `#{param}` substitution
//!
//! Runs on the processed copy of a document only. The editable copy keeps
//! template references, parameters and `##` escapes exactly as written.

use cruise_model::{
    ArtifactConfig, Authorization, BuildTask, CaseInsensitiveString, Configuration, ConfigurationDocument, EnvironmentVariables, ExecArgs, FetchSource, Material,
    Param, Pipeline, Principal, PropertyValue, Stage, Task, TaskKind,
};
use cruise_validate::ValidationError;
use std::collections::HashMap;
use tracing::debug;

/// Expand templates into their pipelines, then substitute parameters.
///
/// Substitution problems are returned as validation errors; the offending
/// field keeps its original text.
pub fn preprocess(doc: &mut ConfigurationDocument) -> Vec<ValidationError> {
    expand_templates(doc);
    let mut errors = Vec::new();
    for pipeline in doc.all_pipelines_mut() {
        let params = pipeline.params().to_vec();
        let mut resolver = ParamResolver {
            pipeline: format!("pipeline[{}]", pipeline.name),
            params: &params,
            errors: &mut errors,
        };
        resolver.pipeline(pipeline);
    }
    errors
}

fn expand_templates(doc: &mut ConfigurationDocument) {
    let templates: HashMap<String, Vec<Stage>> = doc
        .templates
        .iter()
        .map(|t| (t.name.key().to_string(), t.stages().to_vec()))
        .collect();
    for pipeline in doc.all_pipelines_mut() {
        let Some(name) = pipeline.template() else {
            continue;
        };
        // Unknown templates stay referenced so validation can report them.
        if let Some(stages) = templates.get(name.key()) {
            debug!(pipeline = %pipeline.name, template = %name, "Expanding template");
            pipeline.expand_template(stages.clone());
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ParamError {
    Undefined(String),
    Malformed,
}

/// Replace `#{name}` with the parameter value and `##` with `#`.
fn substitute(value: &str, params: &[Param]) -> Result<String, ParamError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('#') {
            out.push('#');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ParamError::Malformed)?;
            let name = &tail[..end];
            let param = params
                .iter()
                .find(|p| p.name.matches(name))
                .ok_or_else(|| ParamError::Undefined(name.to_string()))?;
            out.push_str(&param.value);
            rest = &tail[end + 1..];
        } else {
            return Err(ParamError::Malformed);
        }
    }
    out.push_str(rest);
    Ok(out)
}

struct ParamResolver<'a> {
    pipeline: String,
    params: &'a [Param],
    errors: &'a mut Vec<ValidationError>,
}

impl ParamResolver<'_> {
    fn apply(&mut self, field: &str, value: &mut String) {
        if !value.contains('#') {
            return;
        }
        match substitute(value, self.params) {
            Ok(resolved) => *value = resolved,
            Err(ParamError::Undefined(name)) => self.errors.push(ValidationError::new(
                self.pipeline.clone(),
                format!(
                    "Parameter '{name}' is not defined. All pipelines using this parameter directly or via a template must define it."
                ),
            )),
            Err(ParamError::Malformed) => self.errors.push(ValidationError::new(
                self.pipeline.clone(),
                format!(
                    "Error when processing params for '{value}' used in field '{field}', # must be followed by a parameter pattern or escaped by another #"
                ),
            )),
        }
    }

    fn apply_opt(&mut self, field: &str, value: &mut Option<String>) {
        if let Some(value) = value {
            self.apply(field, value);
        }
    }

    fn pipeline(&mut self, pipeline: &mut Pipeline) {
        self.apply("labeltemplate", &mut pipeline.label_template);
        self.variables(pipeline.variables_mut());
        for material in pipeline.materials_mut() {
            self.material(material);
        }
        for stage in pipeline.stages_mut() {
            self.authorization(&mut stage.approval.authorization);
            self.variables(stage.variables_mut());
            for job in stage.jobs_mut() {
                self.apply_opt("timeout", &mut job.timeout);
                for resource in job.resources_mut() {
                    self.apply("resources", resource);
                }
                self.variables(job.variables_mut());
                for task in job.tasks_mut() {
                    self.task(task);
                }
                for artifact in job.artifacts_mut() {
                    match artifact {
                        ArtifactConfig::Build(a) | ArtifactConfig::Test(a) => {
                            self.apply("src", &mut a.src);
                            self.apply_opt("dest", &mut a.dest);
                        }
                        ArtifactConfig::External(a) => self.configuration(&mut a.configuration),
                    }
                }
            }
        }
    }

    fn material(&mut self, material: &mut Material) {
        match material {
            Material::Svn(m) => {
                self.apply("url", &mut m.url);
                self.apply_opt("username", &mut m.username);
            }
            Material::Git(m) => {
                self.apply("url", &mut m.url);
                self.apply("branch", &mut m.branch);
            }
            Material::Hg(m) => {
                self.apply("url", &mut m.url);
                self.apply_opt("branch", &mut m.branch);
            }
            Material::P4(m) => {
                self.apply("port", &mut m.server_and_port);
                self.apply_opt("username", &mut m.username);
                self.apply("view", &mut m.view);
            }
            Material::Tfs(m) => {
                self.apply("url", &mut m.url);
                self.apply("username", &mut m.username);
                self.apply_opt("domain", &mut m.domain);
                self.apply("projectPath", &mut m.project_path);
            }
            Material::Dependency(_) | Material::Package(_) | Material::PluggableScm(_) => {}
        }
        if let Some(options) = material.options_mut() {
            self.apply_opt("dest", &mut options.dest);
        }
    }

    fn task(&mut self, task: &mut Task) {
        match &mut task.kind {
            TaskKind::Exec(exec) => {
                self.apply("command", &mut exec.command);
                match &mut exec.args {
                    ExecArgs::Line(line) => self.apply("args", line),
                    ExecArgs::List(args) => {
                        for arg in args {
                            self.apply("arg", arg);
                        }
                    }
                }
                self.apply_opt("workingdir", &mut exec.working_dir);
            }
            TaskKind::Ant(build) | TaskKind::Rake(build) => self.build(build),
            TaskKind::NAnt(nant) => {
                self.build(&mut nant.build);
                self.apply_opt("nantpath", &mut nant.nant_path);
            }
            TaskKind::FetchArtifact(fetch) => {
                match &mut fetch.source {
                    FetchSource::File(path) => self.apply("srcfile", path),
                    FetchSource::Dir(path) => self.apply("srcdir", path),
                }
                self.apply_opt("dest", &mut fetch.dest);
            }
            TaskKind::FetchPluggableArtifact(fetch) => self.configuration(&mut fetch.configuration),
            TaskKind::Pluggable(plugin) => self.configuration(&mut plugin.configuration),
            TaskKind::Null => {}
        }
        if let Some(cancel) = task.on_cancel_mut() {
            self.task(cancel);
        }
    }

    fn build(&mut self, build: &mut BuildTask) {
        self.apply_opt("buildfile", &mut build.build_file);
        self.apply_opt("target", &mut build.target);
        self.apply_opt("workingdir", &mut build.working_dir);
    }

    fn configuration(&mut self, configuration: &mut Configuration) {
        for property in configuration.iter_mut() {
            if let PropertyValue::Plain(value) = &mut property.value {
                let field = property.key.clone();
                self.apply(&field, value);
            }
        }
    }

    fn authorization(&mut self, authorization: &mut Authorization) {
        let principals = authorization
            .view
            .iter_mut()
            .chain(&mut authorization.operate)
            .chain(&mut authorization.admins);
        for principal in principals {
            let (field, name) = match principal {
                Principal::User(name) => ("user", name),
                Principal::Role(name) => ("role", name),
            };
            let mut value = name.as_str().to_string();
            self.apply(field, &mut value);
            *name = CaseInsensitiveString::new(value);
        }
    }

    fn variables(&mut self, variables: &mut EnvironmentVariables) {
        for variable in variables.iter_mut() {
            if let PropertyValue::Plain(value) = &mut variable.value {
                self.apply("value", value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cruise_model::{GitMaterial, Job, Template};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> Vec<Param> {
        pairs
            .iter()
            .map(|(name, value)| Param {
                name: (*name).into(),
                value: value.to_string(),
            })
            .collect()
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("#{branch}", "main")]
    #[case("release-#{VERSION}-#{branch}", "release-1.2-main")]
    #[case("issue ##42", "issue #42")]
    #[case("####{branch}", "##{branch}")]
    fn test_substitute(#[case] input: &str, #[case] expected: &str) {
        let params = params(&[("branch", "main"), ("version", "1.2")]);
        assert_eq!(substitute(input, &params).unwrap(), expected);
    }

    #[rstest]
    #[case("#{missing}", ParamError::Undefined("missing".into()))]
    #[case("cost #5", ParamError::Malformed)]
    #[case("trailing #", ParamError::Malformed)]
    #[case("#{unclosed", ParamError::Malformed)]
    fn test_substitute_errors(#[case] input: &str, #[case] expected: ParamError) {
        assert_eq!(substitute(input, &params(&[])).unwrap_err(), expected);
    }

    proptest::proptest! {
        #[test]
        fn prop_text_without_hash_is_unchanged(text in "[^#]*") {
            proptest::prop_assert_eq!(substitute(&text, &params(&[])).unwrap(), text);
        }

        #[test]
        fn prop_doubled_hashes_unescape(text in "[^#]*") {
            let escaped = text.replace('x', "##");
            proptest::prop_assert_eq!(substitute(&escaped, &params(&[])).unwrap(), text.replace('x', "#"));
        }
    }

    fn pipeline_with(material: Material, job: Job) -> Pipeline {
        let mut pipeline = Pipeline::new("build");
        pipeline.add_param(Param { name: "ref".into(), value: "main".into() }).unwrap();
        pipeline.add_material(material);
        pipeline.add_stage(Stage::new("compile", [job]).unwrap()).unwrap();
        pipeline
    }

    #[test]
    fn test_preprocess_replaces_fields_and_reports_errors() {
        let mut git = GitMaterial::new("https://example.com/app.git");
        git.branch = "#{ref}".into();
        let mut job = Job::new("unit");
        job.add_resource("#{ref}-agent");
        job.add_task(Task::exec("make", "#{target}"));
        let mut pipeline = pipeline_with(Material::Git(git), job);
        pipeline.label_template = "${COUNT}-##-#oops".into();

        let mut doc = ConfigurationDocument::new();
        doc.add_pipeline("g", pipeline).unwrap();
        let errors = preprocess(&mut doc);

        let pipeline = doc.pipeline_by_name("build").unwrap();
        let Material::Git(git) = &pipeline.materials()[0] else { panic!("expected git") };
        assert_eq!(git.branch, "main");
        let job = pipeline.stage(0).unwrap().job("unit").unwrap();
        assert_eq!(job.resources(), ["main-agent".to_string()]);
        assert_eq!(pipeline.label_template, "${COUNT}-##-#oops");

        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Error when processing params for '${COUNT}-##-#oops' used in field 'labeltemplate', # must be followed by a parameter pattern or escaped by another #",
                "Parameter 'target' is not defined. All pipelines using this parameter directly or via a template must define it.",
            ]
        );
        assert!(errors.iter().all(|e| e.path == "pipeline[build]"));
    }

    #[test]
    fn test_templates_expand_with_pipeline_params() {
        let mut job = Job::new("deploy");
        job.add_task(Task::exec("deploy.sh", "#{env}"));
        let mut template = Template::new("deployment");
        template.add_stage(Stage::new("release", [job]).unwrap()).unwrap();

        let mut doc = ConfigurationDocument::new();
        doc.templates.push(template);
        for (name, env) in [("to-uat", "uat"), ("to-prod", "prod")] {
            let mut pipeline = Pipeline::new(name);
            pipeline.add_material(Material::git("https://example.com/app.git"));
            pipeline.add_param(Param { name: "env".into(), value: env.into() }).unwrap();
            pipeline.set_template("DEPLOYMENT").unwrap();
            doc.add_pipeline("g", pipeline).unwrap();
        }
        let mut orphan = Pipeline::new("orphan");
        orphan.set_template("missing").unwrap();
        doc.add_pipeline("g", orphan).unwrap();

        assert!(preprocess(&mut doc).is_empty());

        for (name, env) in [("to-uat", "uat"), ("to-prod", "prod")] {
            let pipeline = doc.pipeline_by_name(name).unwrap();
            assert!(!pipeline.has_template());
            let task = &pipeline.stage(0).unwrap().job("deploy").unwrap().tasks()[0];
            let TaskKind::Exec(exec) = &task.kind else { panic!("expected exec") };
            assert_eq!(exec.args, ExecArgs::Line(env.to_string()));
        }
        assert!(doc.pipeline_by_name("orphan").unwrap().has_template());
        assert_eq!(doc.templates[0].stages()[0].jobs()[0].tasks()[0], Task::exec("deploy.sh", "#{env}"));
    }

    #[test]
    fn test_approval_principals_take_params() {
        let mut stage = Stage::new("deploy", [Job::new("push")]).unwrap();
        stage.approval.authorization.operate.push(Principal::Role("#{ROLE}".into()));
        stage.approval.authorization.operate.push(Principal::User("#{owner}".into()));
        let mut template = Template::new("release");
        template.add_stage(stage).unwrap();

        let mut pipeline = Pipeline::new("app");
        pipeline.add_material(Material::git("https://example.com/app.git"));
        pipeline.add_param(Param { name: "role".into(), value: "deployers".into() }).unwrap();
        pipeline.add_param(Param { name: "owner".into(), value: "ann".into() }).unwrap();
        pipeline.set_template("release").unwrap();
        let mut doc = ConfigurationDocument::new();
        doc.templates.push(template);
        doc.add_pipeline("g", pipeline).unwrap();

        assert!(preprocess(&mut doc).is_empty());
        let operate = &doc.stage_by_name("app", "deploy").unwrap().approval.authorization.operate;
        assert_eq!(
            operate,
            &[Principal::Role("deployers".into()), Principal::User("ann".into())]
        );
    }
}
