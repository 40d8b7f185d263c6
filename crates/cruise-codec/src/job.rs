//! Jobs, stages and approvals

use crate::property::{read_configuration, read_variables, text_element, write_configuration, write_variables};
use crate::schema::{
    IdentityConstraint, at_least_one, bool_attr, check_attrs, check_enum, check_sequence, name_attr, optional,
    parse_integer, parse_positive, require_attr, required, text_of,
};
use crate::security::{read_principals, write_principals};
use crate::task::{read_tasks, write_tasks};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{
    Approval, ApprovalType, ArtifactConfig, Authorization, BuiltinArtifact, Job, PluggableArtifact, RunType, Stage,
    Tab,
};
use cruise_xml::Element;

const JOB_ATTRS: &[&str] = &["name", "timeout", "runOnAllAgents", "runInstanceCount", "elasticProfileId"];

pub(crate) fn read_job(codec: &DocumentCodec<'_>, element: &Element) -> Result<Job> {
    check_attrs(element, JOB_ATTRS)?;
    check_sequence(
        element,
        &[
            optional(&["environmentvariables"]),
            optional(&["tasks"]),
            optional(&["tabs"]),
            optional(&["resources"]),
            optional(&["artifacts"]),
        ],
    )?;

    let mut job = Job::new(name_attr(element, "name", "Name")?);
    if let Some(timeout) = element.attr("timeout") {
        parse_integer(element, timeout)?;
        job.timeout = Some(timeout.trim().to_string());
    }
    let on_all = bool_attr(element, "runOnAllAgents", false)?;
    let instances = element
        .attr("runInstanceCount")
        .map(|count| parse_positive(element, count))
        .transpose()?;
    job.run_type = match (on_all, instances) {
        (true, Some(_)) => {
            return Err(Error::structural(
                "job",
                "Job cannot be set to 'run on all agents' when it is set to 'run multiple instances'",
            ));
        }
        (true, None) => RunType::OnAllAgents,
        (false, Some(count)) => RunType::Instances(count),
        (false, None) => RunType::Single,
    };
    job.elastic_profile_id = element.attr("elasticProfileId").map(str::to_string);

    for variable in read_variables(codec, element)? {
        job.add_variable(variable)?;
    }
    for task in read_tasks(element)? {
        job.add_task(task);
    }
    if let Some(tabs) = element.child("tabs") {
        check_attrs(tabs, &[])?;
        check_sequence(tabs, &[at_least_one(&["tab"])])?;
        for tab in tabs.children_named("tab") {
            check_attrs(tab, &["name", "path"])?;
            job.add_tab(Tab {
                name: require_attr(tab, "name")?.to_string(),
                path: require_attr(tab, "path")?.to_string(),
            });
        }
    }
    if let Some(resources) = element.child("resources") {
        check_attrs(resources, &[])?;
        check_sequence(resources, &[at_least_one(&["resource"])])?;
        for resource in resources.children_named("resource") {
            let value = text_of(resource).ok_or_else(|| Error::structural("resource", "Resource name cannot be empty."))?;
            job.add_resource(value);
        }
    }
    if let Some(artifacts) = element.child("artifacts") {
        check_attrs(artifacts, &[])?;
        check_sequence(artifacts, &[at_least_one(&["artifact"])])?;
        for artifact in artifacts.children_named("artifact") {
            job.add_artifact(read_artifact(artifact)?);
        }
    }
    Ok(job)
}

const ARTIFACT_TYPES: [&str; 3] = ["build", "test", "external"];

fn read_artifact(element: &Element) -> Result<ArtifactConfig> {
    let kind = check_enum(element, require_attr(element, "type")?, &ARTIFACT_TYPES)?;
    if kind == "external" {
        check_attrs(element, &["type", "id", "storeId"])?;
        check_sequence(element, &[optional(&["configuration"])])?;
        return Ok(ArtifactConfig::External(PluggableArtifact {
            id: require_attr(element, "id")?.to_string(),
            store_id: require_attr(element, "storeId")?.to_string(),
            configuration: read_configuration(element)?,
        }));
    }
    check_attrs(element, &["type", "src", "dest"])?;
    check_sequence(element, &[])?;
    let artifact = BuiltinArtifact {
        src: require_attr(element, "src")?.to_string(),
        dest: element.attr("dest").map(str::to_string),
    };
    Ok(if kind == "test" {
        ArtifactConfig::Test(artifact)
    } else {
        ArtifactConfig::Build(artifact)
    })
}

pub(crate) fn write_job(job: &Job) -> Element {
    let mut element = Element::new("job").with_attr("name", job.name.as_str());
    element.set_opt_attr("timeout", job.timeout.as_deref());
    match job.run_type {
        RunType::Single => {}
        RunType::OnAllAgents => element.set_attr("runOnAllAgents", "true"),
        RunType::Instances(count) => element.set_attr("runInstanceCount", count.to_string()),
    }
    element.set_opt_attr("elasticProfileId", job.elastic_profile_id.as_deref());

    write_variables(&mut element, job.variables().iter());
    write_tasks(&mut element, job.tasks());
    if !job.tabs().is_empty() {
        let mut tabs = Element::new("tabs");
        for tab in job.tabs() {
            tabs.push(Element::new("tab").with_attr("name", &tab.name).with_attr("path", &tab.path));
        }
        element.push(tabs);
    }
    if !job.resources().is_empty() {
        let mut resources = Element::new("resources");
        for resource in job.resources() {
            resources.push(text_element("resource", resource));
        }
        element.push(resources);
    }
    if !job.artifacts().is_empty() {
        let mut artifacts = Element::new("artifacts");
        for artifact in job.artifacts() {
            artifacts.push(write_artifact(artifact));
        }
        element.push(artifacts);
    }
    element
}

fn write_artifact(artifact: &ArtifactConfig) -> Element {
    match artifact {
        ArtifactConfig::Build(a) | ArtifactConfig::Test(a) => {
            let mut e = Element::new("artifact")
                .with_attr("type", artifact.type_name())
                .with_attr("src", &a.src);
            e.set_opt_attr("dest", a.dest.as_deref());
            e
        }
        ArtifactConfig::External(a) => {
            let mut e = Element::new("artifact")
                .with_attr("type", "external")
                .with_attr("id", &a.id)
                .with_attr("storeId", &a.store_id);
            if !a.configuration.is_empty() {
                write_configuration(&mut e, &a.configuration);
            }
            e
        }
    }
}

const APPROVAL_TYPES: [&str; 2] = ["success", "manual"];

pub(crate) fn read_stage(codec: &DocumentCodec<'_>, element: &Element) -> Result<Stage> {
    check_attrs(
        element,
        &["name", "artifactCleanupProhibited", "cleanWorkingDir", "fetchMaterials"],
    )?;
    if element.child("job").is_some() {
        return Err(Error::structural("stage", "Unable to parse element <stage> for class JobConfig"));
    }
    check_sequence(
        element,
        &[optional(&["approval"]), optional(&["environmentvariables"]), required(&["jobs"])],
    )?;
    let name = name_attr(element, "name", "Name")?;

    let jobs_element = element
        .child("jobs")
        .ok_or_else(|| Error::structural("stage", "The content of element 'stage' is not complete. One of '{jobs}' is expected."))?;
    check_attrs(jobs_element, &[])?;
    check_sequence(jobs_element, &[at_least_one(&["job"])])?;
    let mut names = IdentityConstraint::new("jobs");
    let mut jobs = Vec::new();
    for job in jobs_element.children_named("job") {
        let job = read_job(codec, job)?;
        names.insert(job.name.as_str())?;
        jobs.push(job);
    }

    let mut stage = Stage::new(name, jobs)?;
    stage.artifact_cleanup_prohibited = bool_attr(element, "artifactCleanupProhibited", false)?;
    stage.clean_working_dir = bool_attr(element, "cleanWorkingDir", false)?;
    if let Some(approval) = element.child("approval") {
        stage.approval = read_approval(approval)?;
    }
    for variable in read_variables(codec, element)? {
        stage.add_variable(variable)?;
    }
    Ok(stage)
}

fn read_approval(element: &Element) -> Result<Approval> {
    check_attrs(element, &["type", "allowOnlyOnSuccess"])?;
    check_sequence(element, &[optional(&["authorization"])])?;
    let kind = match check_enum(element, require_attr(element, "type")?, &APPROVAL_TYPES)? {
        "manual" => ApprovalType::Manual,
        _ => ApprovalType::Success,
    };
    let mut authorization = Authorization::default();
    if let Some(auth) = element.child("authorization") {
        check_attrs(auth, &[])?;
        authorization.operate = read_principals(auth)?;
    }
    Ok(Approval {
        kind,
        allow_only_on_success: bool_attr(element, "allowOnlyOnSuccess", false)?,
        authorization,
    })
}

pub(crate) fn write_stage(stage: &Stage) -> Element {
    let mut element = Element::new("stage").with_attr("name", stage.name.as_str());
    if stage.artifact_cleanup_prohibited {
        element.set_attr("artifactCleanupProhibited", "true");
    }
    if stage.clean_working_dir {
        element.set_attr("cleanWorkingDir", "true");
    }
    if stage.approval != Approval::default() {
        let kind = match stage.approval.kind {
            ApprovalType::Manual => "manual",
            ApprovalType::Success => "success",
        };
        let mut approval = Element::new("approval").with_attr("type", kind);
        if stage.approval.allow_only_on_success {
            approval.set_attr("allowOnlyOnSuccess", "true");
        }
        if !stage.approval.authorization.operate.is_empty() {
            let mut auth = Element::new("authorization");
            write_principals(&mut auth, &stage.approval.authorization.operate);
            approval.push(auth);
        }
        element.push(approval);
    }
    write_variables(&mut element, stage.variables().iter());
    let mut jobs = Element::new("jobs");
    for job in stage.jobs() {
        jobs.push(write_job(job));
    }
    element.push(jobs);
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage(xml: &str) -> Result<Stage> {
        read_stage(&DocumentCodec::new(), &cruise_xml::parse(xml).unwrap())
    }

    #[test]
    fn test_stage_with_resources() {
        let stage = stage(
            r#"<stage name="mingle"><jobs><job name="plan1"><tasks><exec command="ls" /></tasks><resources><resource>tiger</resource><resource>lion</resource></resources></job></jobs></stage>"#,
        )
        .unwrap();
        assert_eq!(stage.job("plan1").unwrap().resources(), ["tiger", "lion"]);
    }

    #[test]
    fn test_job_directly_under_stage() {
        let err = stage(r#"<stage name="s"><job name="j" /></stage>"#).unwrap_err();
        assert_eq!(err.to_string(), "Unable to parse element <stage> for class JobConfig");
    }

    #[test]
    fn test_empty_jobs_element() {
        let err = stage(r#"<stage name="s"><jobs /></stage>"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The content of element 'jobs' is not complete. One of '{job}' is expected."
        );
    }

    #[test]
    fn test_duplicate_job_names() {
        let err = stage(r#"<stage name="s"><jobs><job name="unit" /><job name="unit" /></jobs></stage>"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate unique value [unit] declared for identity constraint of element \"jobs\"."
        );
    }

    #[test]
    fn test_run_on_all_and_instances() {
        let err = stage(r#"<stage name="s"><jobs><job name="j" runOnAllAgents="true" runInstanceCount="2" /></jobs></stage>"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Job cannot be set to 'run on all agents' when it is set to 'run multiple instances'"
        );
    }

    #[test]
    fn test_stage_write_read() {
        let original = stage(
            r#"<stage name="deploy" cleanWorkingDir="true"><approval type="manual"><authorization><role>ops</role></authorization></approval><jobs><job name="j" runInstanceCount="3" timeout="10"><artifacts><artifact type="test" src="reports" /></artifacts></job></jobs></stage>"#,
        )
        .unwrap();
        assert_eq!(read_stage(&DocumentCodec::new(), &write_stage(&original)).unwrap(), original);
    }
}
