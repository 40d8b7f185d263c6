//! Server-wide settings.

use super::Context;
use crate::error::Report;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let purge = &ctx.doc.server.purge;
    match (purge.start, purge.upto) {
        (None, Some(_)) => report.add(
            "server/artifacts",
            "Error in artifact cleanup values. The trigger value has to be specified when a goal is set",
        ),
        (Some(start), Some(upto)) if start > upto => report.add(
            "server/artifacts",
            format!(
                "Error in artifact cleanup values. The trigger value ({start}GB) should be less than the goal ({upto}GB)"
            ),
        ),
        _ => {}
    }
}
