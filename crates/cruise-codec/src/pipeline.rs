//! Pipelines, pipeline groups and templates

use crate::job::{read_stage, write_stage};
use crate::material::{read_materials, write_materials};
use crate::property::{read_params, read_variables, text_element, write_params, write_variables};
use crate::schema::{
    IdentityConstraint, any_number, at_least_one, bool_attr, check_attrs, check_enum, check_name, check_sequence,
    name_attr, optional, required, text_of,
};
use crate::security::{read_authorization, write_authorization};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{LockBehavior, Pipeline, PipelineGroup, Template, Timer};
use cruise_xml::Element;

const PIPELINE_ATTRS: &[&str] = &["name", "labeltemplate", "lockBehavior", "template"];

pub(crate) fn read_pipeline(codec: &DocumentCodec<'_>, element: &Element) -> Result<Pipeline> {
    check_attrs(element, PIPELINE_ATTRS)?;
    check_sequence(
        element,
        &[
            optional(&["params"]),
            optional(&["timer"]),
            optional(&["environmentvariables"]),
            required(&["materials"]),
            any_number(&["stage"]),
        ],
    )?;

    let mut pipeline = Pipeline::new(name_attr(element, "name", "Name")?);
    if let Some(label) = element.attr("labeltemplate") {
        pipeline.label_template = label.to_string();
    }
    if let Some(lock) = element.attr("lockBehavior") {
        let lock = check_enum(element, lock, &LockBehavior::VALUES)?;
        pipeline.lock_behavior = LockBehavior::parse(lock);
    }
    if let Some(template) = element.attr("template") {
        pipeline.set_template(check_name(element, "Template name", template)?)?;
    }
    for param in read_params(element)? {
        pipeline.add_param(param)?;
    }
    if let Some(timer) = element.child("timer") {
        check_attrs(timer, &["onlyOnChanges"])?;
        pipeline.timer = Some(Timer {
            spec: text_of(timer).unwrap_or_default(),
            only_on_changes: bool_attr(timer, "onlyOnChanges", false)?,
        });
    }
    for variable in read_variables(codec, element)? {
        pipeline.add_variable(variable)?;
    }
    for material in read_materials(codec, element)? {
        pipeline.add_material(material);
    }
    for stage in element.children_named("stage") {
        pipeline.add_stage(read_stage(codec, stage)?)?;
    }
    Ok(pipeline)
}

pub(crate) fn write_pipeline(pipeline: &Pipeline) -> Element {
    let mut element = Element::new("pipeline").with_attr("name", pipeline.name.as_str());
    if pipeline.label_template != Pipeline::DEFAULT_LABEL_TEMPLATE {
        element.set_attr("labeltemplate", &pipeline.label_template);
    }
    element.set_opt_attr("lockBehavior", pipeline.lock_behavior.map(|l| l.as_str()));
    element.set_opt_attr("template", pipeline.template().map(|t| t.as_str()));

    write_params(&mut element, pipeline.params());
    if let Some(timer) = &pipeline.timer {
        let mut e = text_element("timer", &timer.spec);
        if timer.only_on_changes {
            e.set_attr("onlyOnChanges", "true");
        }
        element.push(e);
    }
    write_variables(&mut element, pipeline.variables().iter());
    write_materials(&mut element, pipeline.materials());
    for stage in pipeline.stages() {
        element.push(write_stage(stage));
    }
    element
}

/// Read a `<pipelines>` element.
pub(crate) fn read_group(codec: &DocumentCodec<'_>, element: &Element) -> Result<PipelineGroup> {
    check_attrs(element, &["group"])?;
    check_sequence(element, &[optional(&["authorization"]), any_number(&["pipeline"])])?;
    let name = match element.attr("group") {
        Some(group) => check_name(element, "Name", group)?,
        None => PipelineGroup::DEFAULT_NAME,
    };
    let mut group = PipelineGroup::new(name);
    group.authorization = read_authorization(element)?;
    for pipeline in element.children_named("pipeline") {
        group.add_pipeline(read_pipeline(codec, pipeline)?)?;
    }
    Ok(group)
}

pub(crate) fn write_group(group: &PipelineGroup) -> Element {
    let mut element = Element::new("pipelines").with_attr("group", group.name.as_str());
    write_authorization(&mut element, &group.authorization);
    for pipeline in group.pipelines() {
        element.push(write_pipeline(pipeline));
    }
    element
}

/// Read the `<templates>` element.
pub(crate) fn read_templates(codec: &DocumentCodec<'_>, element: &Element) -> Result<Vec<Template>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[at_least_one(&["pipeline"])])?;
    let mut names = IdentityConstraint::new("templates");
    let mut templates = Vec::new();
    for template in element.children_named("pipeline") {
        let template = read_template(codec, template)?;
        names.insert(template.name.as_str())?;
        templates.push(template);
    }
    Ok(templates)
}

pub(crate) fn read_template(codec: &DocumentCodec<'_>, element: &Element) -> Result<Template> {
    check_attrs(element, &["name"])?;
    if element.children_named("stage").next().is_none() {
        return Err(Error::structural(
            "pipeline",
            "The content of element 'pipeline' is not complete. One of '{authorization, stage}' is expected.",
        ));
    }
    check_sequence(element, &[optional(&["authorization"]), at_least_one(&["stage"])])?;
    let mut template = Template::new(name_attr(element, "name", "Name")?);
    template.authorization = read_authorization(element)?;
    for stage in element.children_named("stage") {
        template.add_stage(read_stage(codec, stage)?)?;
    }
    Ok(template)
}

pub(crate) fn write_template(template: &Template) -> Element {
    let mut element = Element::new("pipeline").with_attr("name", template.name.as_str());
    write_authorization(&mut element, &template.authorization);
    for stage in template.stages() {
        element.push(write_stage(stage));
    }
    element
}
