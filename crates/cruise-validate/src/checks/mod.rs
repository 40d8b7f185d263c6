//! The check battery. Each check reads the whole document and appends to the report.

mod environments;
mod fetch;
mod jobs;
mod materials;
mod names;
mod pipelines;
mod plugins;
mod security;
mod server;

use crate::error::{Report, path};
use cruise_model::{CaseInsensitiveString, ConfigurationDocument, Job, Pipeline, Stage};
use cruise_secure::SecurePropertyLookup;
use std::collections::HashSet;

pub(crate) struct Context<'a> {
    pub doc: &'a ConfigurationDocument,
    pub lookup: &'a dyn SecurePropertyLookup,
}

pub(crate) type Check = fn(&Context<'_>, &mut Report);

pub(crate) const CHECKS: &[(&str, Check)] = &[
    ("names", names::check),
    ("pipelines", pipelines::check),
    ("jobs", jobs::check),
    ("environments", environments::check),
    ("materials", materials::check),
    ("fetch", fetch::check),
    ("plugins", plugins::check),
    ("security", security::check),
    ("server", server::check),
];

/// Items whose name was already taken by an earlier item.
pub(crate) fn repeated<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    name: impl Fn(&T) -> &CaseInsensitiveString,
) -> Vec<&'a T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !seen.insert(name(item).key().to_string()))
        .collect()
}

/// Every job of the document with the path of its stage, templates included.
pub(crate) fn all_jobs(doc: &ConfigurationDocument) -> Vec<(String, &Stage, &Job)> {
    let pipelines = doc.all_pipelines().map(|p| ("pipeline", &p.name, p.stages()));
    let templates = doc.templates.iter().map(|t| ("template", &t.name, t.stages()));
    pipelines
        .chain(templates)
        .flat_map(|(kind, owner, stages)| {
            stages.iter().flat_map(move |stage| {
                stage.jobs().iter().map(move |job| {
                    let at = path(&[
                        (kind, owner.as_str()),
                        ("stage", stage.name.as_str()),
                        ("job", job.name.as_str()),
                    ]);
                    (at, stage, job)
                })
            })
        })
        .collect()
}

pub(crate) fn pipeline_path(pipeline: &Pipeline) -> String {
    path(&[("pipeline", pipeline.name.as_str())])
}
