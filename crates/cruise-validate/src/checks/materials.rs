//! Materials: shared auto-update, destinations, dependency and plugin references,
//! config repositories.

use super::{Context, pipeline_path};
use crate::error::{Report, path};
use cruise_model::{Material, Pipeline};
use std::collections::HashSet;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    auto_update_agreement(ctx, report);
    for pipeline in ctx.doc.all_pipelines() {
        destinations(pipeline, report);
        references(ctx, pipeline, report);
    }
    if let Err(cycle) = ctx.doc.dependency_order() {
        report.add("pipelines", cycle.to_string());
    }
    config_repos(ctx, report);
}

/// Materials with one fingerprint must all poll or all not poll.
fn auto_update_agreement(ctx: &Context<'_>, report: &mut Report) {
    let mut users: Vec<(String, Vec<(&Pipeline, &Material, bool)>)> = Vec::new();
    for pipeline in ctx.doc.all_pipelines() {
        for material in pipeline.materials() {
            let Some(auto_update) = material.auto_update() else {
                continue;
            };
            let fingerprint = material.fingerprint();
            match users.iter_mut().find(|(f, _)| *f == fingerprint) {
                Some((_, list)) => list.push((pipeline, material, auto_update)),
                None => users.push((fingerprint, vec![(pipeline, material, auto_update)])),
            }
        }
    }

    for (_, list) in users {
        let values: HashSet<bool> = list.iter().map(|(_, _, a)| *a).collect();
        if values.len() < 2 {
            continue;
        }
        let (first, material, auto_update) = list[0];
        let pipelines: Vec<String> = list
            .iter()
            .map(|(p, _, a)| format!(" {} (auto update {})", p.name, if *a { "enabled" } else { "disabled" }))
            .collect();
        report.add(
            path(&[("pipeline", first.name.as_str()), ("material", &material.display_name())]),
            format!(
                "The material of type {} ({}) is used elsewhere with a different value for autoUpdate ({}). Those values should be the same. Pipelines:\n{}",
                material.type_name(),
                material.location(),
                if auto_update { "poll for changes" } else { "not poll" },
                pipelines.join(",\n")
            ),
        );
    }
}

fn destinations(pipeline: &Pipeline, report: &mut Report) {
    let scms: Vec<&Material> = pipeline.materials().iter().filter(|m| m.is_scm()).collect();
    if scms.len() < 2 {
        return;
    }
    if scms.iter().any(|m| m.dest().is_none_or(|d| d.trim().is_empty())) {
        report.add(
            pipeline_path(pipeline),
            "Destination directory is required when a pipeline has multiple SCM materials.",
        );
        return;
    }
    for (index, material) in scms.iter().enumerate() {
        let here = components(material.dest().unwrap_or_default());
        let clash = scms[..index]
            .iter()
            .any(|other| nested(&here, &components(other.dest().unwrap_or_default())));
        if clash {
            report.add(
                path(&[("pipeline", pipeline.name.as_str()), ("material", &material.display_name())]),
                "Invalid destination directory. Every material needs a different destination directory and the directories should not be nested",
            );
        }
    }
}

fn components(dest: &str) -> Vec<&str> {
    dest.split(['/', '\\']).filter(|c| !c.is_empty() && *c != ".").collect()
}

fn nested(a: &[&str], b: &[&str]) -> bool {
    let shared = a.len().min(b.len());
    a[..shared] == b[..shared]
}

fn references(ctx: &Context<'_>, pipeline: &Pipeline, report: &mut Report) {
    let doc = ctx.doc;
    for material in pipeline.materials() {
        match material {
            Material::Dependency(dep) => match doc.pipeline_by_name(dep.pipeline.as_str()) {
                Err(_) => report.add(
                    pipeline_path(pipeline),
                    format!(
                        "Pipeline with name '{}' does not exist, it is defined as a dependency for pipeline '{}'",
                        dep.pipeline, pipeline.name
                    ),
                ),
                Ok(upstream) if upstream.stage_index(&dep.stage).is_none() && !upstream.has_template() => report.add(
                    pipeline_path(pipeline),
                    format!(
                        "Stage with name '{}' does not exist on pipeline '{}', it is being referred to from pipeline '{}'",
                        dep.stage, dep.pipeline, pipeline.name
                    ),
                ),
                Ok(_) => {}
            },
            Material::Package(package) if doc.package(&package.package_id).is_none() => report.add(
                pipeline_path(pipeline),
                format!("Could not find repository for given package id:[{}]", package.package_id),
            ),
            Material::PluggableScm(scm) if doc.scm(&scm.scm_id).is_none() => report.add(
                pipeline_path(pipeline),
                format!("Could not find SCM for given scm id:[{}]", scm.scm_id),
            ),
            _ => {}
        }
    }
}

fn config_repos(ctx: &Context<'_>, report: &mut Report) {
    let mut ids = HashSet::new();
    let mut fingerprints = HashSet::new();
    for repo in &ctx.doc.config_repos {
        let at = path(&[("config-repo", &repo.id)]);
        if !ids.insert(repo.id.as_str()) {
            report.add(
                at.clone(),
                format!("You have defined multiple configuration repositories with the same id - {}.", repo.id),
            );
        }
        if !fingerprints.insert(repo.material.fingerprint()) {
            report.add(
                at,
                format!(
                    "You have defined multiple configuration repositories with the same repository - {}.",
                    repo.material.location()
                ),
            );
        }
    }
}
