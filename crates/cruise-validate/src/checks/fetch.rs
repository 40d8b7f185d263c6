//! Fetch-artifact reachability and ordering.
//!
//! A fetch names its source as a path of pipelines ending in a direct upstream
//! of the fetching pipeline (`grandparent/parent`). Each hop must be a real
//! dependency, and the fetched stage of the ancestor must not run after the
//! stage its direct downstream waits on. An empty path fetches from an earlier
//! stage of the same pipeline.

use super::Context;
use crate::error::{Report, path};
use cruise_model::{CaseInsensitiveString, Job, PathFromAncestor, Pipeline, Stage, TaskKind};

struct Fetch<'a> {
    from: &'a PathFromAncestor,
    stage: &'a CaseInsensitiveString,
    job: &'a CaseInsensitiveString,
}

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    for pipeline in ctx.doc.all_pipelines() {
        for (index, stage) in pipeline.stages().iter().enumerate() {
            for job in stage.jobs() {
                let at = Location { pipeline, index, stage, job };
                for fetch in job.all_tasks().filter_map(|t| fetch_of(&t.kind)) {
                    check_fetch(ctx, &at, &fetch, report);
                }
            }
        }
    }
}

fn fetch_of(kind: &TaskKind) -> Option<Fetch<'_>> {
    match kind {
        TaskKind::FetchArtifact(t) => Some(Fetch {
            from: &t.pipeline,
            stage: &t.stage,
            job: &t.job,
        }),
        TaskKind::FetchPluggableArtifact(t) => Some(Fetch {
            from: &t.pipeline,
            stage: &t.stage,
            job: &t.job,
        }),
        _ => None,
    }
}

struct Location<'a> {
    pipeline: &'a Pipeline,
    index: usize,
    stage: &'a Stage,
    job: &'a Job,
}

impl Location<'_> {
    fn path(&self) -> String {
        path(&[
            ("pipeline", self.pipeline.name.as_str()),
            ("stage", self.stage.name.as_str()),
            ("job", self.job.name.as_str()),
        ])
    }

    fn quoted(&self) -> String {
        format!("\"{} :: {} :: {}\"", self.pipeline.name, self.stage.name, self.job.name)
    }
}

fn check_fetch(ctx: &Context<'_>, at: &Location<'_>, fetch: &Fetch<'_>, report: &mut Report) {
    let segments = fetch.from.segments();
    let same_pipeline = match segments {
        [] => true,
        [only] => *only == at.pipeline.name && !at.pipeline.depends_on(only),
        _ => false,
    };
    if same_pipeline {
        return check_own_stage(at, fetch, report);
    }

    let mut dependent = at.pipeline;
    let mut current = at.pipeline;
    for upstream in segments.iter().rev() {
        if !current.depends_on(upstream) {
            report.add(
                at.path(),
                format!(
                    "{} tries to fetch artifact from pipeline \"{}\" which is not an upstream pipeline",
                    at.quoted(),
                    fetch.from
                ),
            );
            return;
        }
        let Ok(next) = ctx.doc.pipeline_by_name(upstream.as_str()) else {
            report.add(
                at.path(),
                format!(
                    "{} tries to fetch artifact from pipeline \"{}\" which does not exist.",
                    at.quoted(),
                    upstream
                ),
            );
            return;
        };
        dependent = current;
        current = next;
    }
    let ancestor = current;

    let Some(fetched) = ancestor.stage_index(fetch.stage) else {
        report.add(
            at.path(),
            format!(
                "{} tries to fetch artifact from stage \"{} :: {}\" which does not exist.",
                at.quoted(),
                ancestor.name,
                fetch.stage
            ),
        );
        return;
    };

    let awaited = dependent
        .dependencies()
        .filter(|(p, _)| *p == &ancestor.name)
        .filter_map(|(_, s)| ancestor.stage_index(s))
        .max();
    if awaited.is_some_and(|awaited| fetched > awaited) {
        report.add(
            at.path(),
            format!(
                "{} tries to fetch artifact from stage \"{} :: {}\" which does not complete before \"{}\" pipeline's dependencies.",
                at.quoted(),
                ancestor.name,
                fetch.stage,
                dependent.name
            ),
        );
        return;
    }

    check_job(at, ancestor, &ancestor.stages()[fetched], fetch, report);
}

fn check_own_stage(at: &Location<'_>, fetch: &Fetch<'_>, report: &mut Report) {
    let pipeline = at.pipeline;
    match pipeline.stage_index(fetch.stage) {
        None => report.add(
            at.path(),
            format!(
                "{} tries to fetch artifact from stage \"{} :: {}\" which does not exist.",
                at.quoted(),
                pipeline.name,
                fetch.stage
            ),
        ),
        Some(index) if index >= at.index => report.add(
            at.path(),
            format!(
                "{} tries to fetch artifact from its stage \"{}\" which does not complete before the current stage \"{}\".",
                at.quoted(),
                fetch.stage,
                at.stage.name
            ),
        ),
        Some(index) => check_job(at, pipeline, &pipeline.stages()[index], fetch, report),
    }
}

fn check_job(at: &Location<'_>, source: &Pipeline, stage: &Stage, fetch: &Fetch<'_>, report: &mut Report) {
    if !stage.has_job(fetch.job) {
        report.add(
            at.path(),
            format!(
                "{} tries to fetch artifact from job \"{} :: {} :: {}\" which does not exist.",
                at.quoted(),
                source.name,
                stage.name,
                fetch.job
            ),
        );
    }
}
