//! Job placement: resources versus elastic profiles, artifact stores.

use super::{Context, all_jobs};
use crate::error::Report;
use cruise_model::ArtifactConfig;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;
    for (at, _, job) in all_jobs(doc) {
        if let Some(profile) = &job.elastic_profile_id {
            if !job.resources().is_empty() {
                report.add(at.clone(), "Job cannot have both `resource` and `elasticProfileId`");
            }
            if doc.elastic.profile(profile).is_none() {
                report.add(
                    at.clone(),
                    format!("No profile defined corresponding to profile_id '{profile}'"),
                );
            }
        }

        for artifact in job.artifacts() {
            if let ArtifactConfig::External(external) = artifact {
                if doc.artifact_store(&external.store_id).is_none() {
                    report.add(
                        at.clone(),
                        format!("Artifact store with id `{}` does not exist", external.store_id),
                    );
                }
            }
        }
    }
}
