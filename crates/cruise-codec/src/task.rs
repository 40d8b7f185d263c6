//! Tasks, run-if conditions and cancel tasks

use crate::property::{read_configuration, read_plugin_configuration, write_configuration, write_plugin_configuration};
use crate::schema::{
    any_number, check_attrs, check_command, check_enum, check_name, check_sequence, optional, require_attr, required,
};
use crate::{Error, Result};
use cruise_model::{
    BuildTask, CaseInsensitiveString, ExecArgs, ExecTask, FetchArtifactTask, FetchPluggableArtifactTask, FetchSource,
    NantTask, PathFromAncestor, PluggableTask, RunIfCondition, Task, TaskKind,
};
use cruise_xml::Element;

pub(crate) const TASK_ELEMENTS: &[&str] = &["exec", "ant", "nant", "rake", "fetchartifact", "task"];

pub(crate) fn read_tasks(parent: &Element) -> Result<Vec<Task>> {
    let Some(list) = parent.child("tasks") else {
        return Ok(Vec::new());
    };
    check_attrs(list, &[])?;
    check_sequence(list, &[any_number(TASK_ELEMENTS)])?;
    list.elements().map(|e| read_task(e, false)).collect()
}

/// Read one task. `in_cancel` is set while reading the body of an `<oncancel>`.
pub(crate) fn read_task(element: &Element, in_cancel: bool) -> Result<Task> {
    let tail = [any_number(&["runif"]), optional(&["oncancel"])];
    let kind = match element.name.as_str() {
        "exec" => {
            check_attrs(element, &["command", "args", "workingdir"])?;
            check_sequence(element, &[any_number(&["arg"]), tail[0], tail[1]])?;
            let command = check_command(element, require_attr(element, "command")?)?;
            let arg_elements: Vec<String> = element.children_named("arg").map(Element::text).collect();
            let args = match element.attr("args") {
                Some(_) if !arg_elements.is_empty() => {
                    return Err(Error::structural(
                        "exec",
                        "Can not use both 'args' attribute and 'arg' sub element in 'exec' element!",
                    ));
                }
                Some(line) => ExecArgs::Line(line.to_string()),
                None if arg_elements.is_empty() => ExecArgs::Line(String::new()),
                None => ExecArgs::List(arg_elements),
            };
            TaskKind::Exec(ExecTask {
                command: command.to_string(),
                args,
                working_dir: element.attr("workingdir").map(str::to_string),
            })
        }
        "ant" | "rake" => {
            check_attrs(element, &["buildfile", "target", "workingdir"])?;
            check_sequence(element, &tail)?;
            let build = read_build(element);
            if element.name == "ant" { TaskKind::Ant(build) } else { TaskKind::Rake(build) }
        }
        "nant" => {
            check_attrs(element, &["buildfile", "target", "workingdir", "nantpath"])?;
            check_sequence(element, &tail)?;
            TaskKind::NAnt(NantTask {
                build: read_build(element),
                nant_path: element.attr("nantpath").map(str::to_string),
            })
        }
        "fetchartifact" => read_fetch(element)?,
        "task" => {
            check_attrs(element, &[])?;
            check_sequence(
                element,
                &[required(&["pluginConfiguration"]), optional(&["configuration"]), tail[0], tail[1]],
            )?;
            TaskKind::Pluggable(PluggableTask {
                plugin: read_plugin_configuration(element)?,
                configuration: read_configuration(element)?,
            })
        }
        other => {
            return Err(Error::structural(
                other,
                format!("Invalid content was found starting with element '{}'.", other),
            ));
        }
    };

    let mut task = Task::new(kind);
    for runif in element.children_named("runif") {
        check_attrs(runif, &["status"])?;
        let status = check_enum(runif, require_attr(runif, "status")?, &RunIfCondition::ALL)?;
        if let Some(condition) = RunIfCondition::parse(status) {
            task.add_run_if(condition);
        }
    }
    if let Some(cancel) = element.child("oncancel") {
        if in_cancel {
            return Err(cruise_model::Error::NestedOnCancel.into());
        }
        check_attrs(cancel, &[])?;
        check_sequence(cancel, &[required(TASK_ELEMENTS)])?;
        if let Some(body) = cancel.elements().next() {
            task.set_on_cancel(read_task(body, true)?)?;
        }
    }
    Ok(task)
}

fn read_build(element: &Element) -> BuildTask {
    BuildTask {
        build_file: element.attr("buildfile").map(str::to_string),
        target: element.attr("target").map(str::to_string),
        working_dir: element.attr("workingdir").map(str::to_string),
    }
}

const FETCH_ORIGINS: [&str; 2] = ["gocd", "external"];

fn read_fetch(element: &Element) -> Result<TaskKind> {
    let origin = element.attr("artifactOrigin").unwrap_or("gocd");
    check_enum(element, origin, &FETCH_ORIGINS)?;
    let pipeline = PathFromAncestor::parse(element.attr("pipeline").unwrap_or_default());
    let stage: CaseInsensitiveString = check_name(element, "Stage name", require_attr(element, "stage")?)?.into();
    let job: CaseInsensitiveString = check_name(element, "Job name", require_attr(element, "job")?)?.into();

    if origin == "external" {
        check_attrs(element, &["artifactOrigin", "pipeline", "stage", "job", "artifactId"])?;
        check_sequence(
            element,
            &[optional(&["configuration"]), any_number(&["runif"]), optional(&["oncancel"])],
        )?;
        return Ok(TaskKind::FetchPluggableArtifact(FetchPluggableArtifactTask {
            pipeline,
            stage,
            job,
            artifact_id: require_attr(element, "artifactId")?.to_string(),
            configuration: read_configuration(element)?,
        }));
    }

    check_attrs(element, &["artifactOrigin", "pipeline", "stage", "job", "srcfile", "srcdir", "dest"])?;
    check_sequence(element, &[any_number(&["runif"]), optional(&["oncancel"])])?;
    let source = match (element.attr("srcfile"), element.attr("srcdir")) {
        (Some(file), None) => FetchSource::File(file.to_string()),
        (None, Some(dir)) => FetchSource::Dir(dir.to_string()),
        _ => {
            return Err(Error::structural(
                "fetchartifact",
                "Only one of srcfile or srcdir is allowed at a time",
            ));
        }
    };
    Ok(TaskKind::FetchArtifact(FetchArtifactTask {
        pipeline,
        stage,
        job,
        source,
        dest: element.attr("dest").map(str::to_string),
    }))
}

pub(crate) fn write_tasks(parent: &mut Element, tasks: &[Task]) {
    if tasks.is_empty() {
        return;
    }
    let mut list = Element::new("tasks");
    for task in tasks {
        list.push(write_task(task));
    }
    parent.push(list);
}

pub(crate) fn write_task(task: &Task) -> Element {
    let mut element = match &task.kind {
        TaskKind::Exec(exec) => {
            let mut e = Element::new("exec").with_attr("command", &exec.command);
            match &exec.args {
                ExecArgs::Line(line) if !line.is_empty() => e.set_attr("args", line),
                ExecArgs::Line(_) => {}
                ExecArgs::List(args) => {
                    for arg in args {
                        e.push(Element::new("arg").with_text(arg));
                    }
                }
            }
            e.set_opt_attr("workingdir", exec.working_dir.as_deref());
            e
        }
        TaskKind::Ant(build) => write_build(Element::new("ant"), build),
        TaskKind::Rake(build) => write_build(Element::new("rake"), build),
        TaskKind::NAnt(nant) => {
            let mut e = write_build(Element::new("nant"), &nant.build);
            e.set_opt_attr("nantpath", nant.nant_path.as_deref());
            e
        }
        TaskKind::FetchArtifact(fetch) => {
            let mut e = Element::new("fetchartifact").with_attr("artifactOrigin", "gocd");
            if !fetch.pipeline.is_empty() {
                e.set_attr("pipeline", fetch.pipeline.to_string());
            }
            e.set_attr("stage", fetch.stage.as_str());
            e.set_attr("job", fetch.job.as_str());
            match &fetch.source {
                FetchSource::File(path) => e.set_attr("srcfile", path),
                FetchSource::Dir(path) => e.set_attr("srcdir", path),
            }
            e.set_opt_attr("dest", fetch.dest.as_deref());
            e
        }
        TaskKind::FetchPluggableArtifact(fetch) => {
            let mut e = Element::new("fetchartifact").with_attr("artifactOrigin", "external");
            if !fetch.pipeline.is_empty() {
                e.set_attr("pipeline", fetch.pipeline.to_string());
            }
            e.set_attr("stage", fetch.stage.as_str());
            e.set_attr("job", fetch.job.as_str());
            e.set_attr("artifactId", &fetch.artifact_id);
            if !fetch.configuration.is_empty() {
                write_configuration(&mut e, &fetch.configuration);
            }
            e
        }
        TaskKind::Pluggable(pluggable) => {
            let mut e = Element::new("task");
            write_plugin_configuration(&mut e, &pluggable.plugin);
            write_configuration(&mut e, &pluggable.configuration);
            e
        }
        // Null tasks only exist in memory as placeholders.
        TaskKind::Null => Element::new("exec").with_attr("command", "true"),
    };
    for condition in task.run_if() {
        element.push(Element::new("runif").with_attr("status", condition.as_str()));
    }
    if let Some(cancel) = task.on_cancel() {
        element.push(Element::new("oncancel").with_child(write_task(cancel)));
    }
    element
}

fn write_build(mut element: Element, build: &BuildTask) -> Element {
    element.set_opt_attr("buildfile", build.build_file.as_deref());
    element.set_opt_attr("target", build.target.as_deref());
    element.set_opt_attr("workingdir", build.working_dir.as_deref());
    element
}
