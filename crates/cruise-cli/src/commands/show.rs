//! Show command implementation
//!
//! Prints the processed configuration: templates expanded and parameters
//! resolved.

use std::path::Path;

use colored::Colorize;
use cruise_model::{ConfigurationDocument, Pipeline};

use super::read_file;
use crate::context::CliContext;
use crate::error::Result;

pub fn run_show(ctx: &CliContext, file: &Path, pipeline: Option<&str>, json: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let cipher = ctx.cipher(Some(file))?;
    let loaded = ctx.loader(&cipher).load(&bytes, Vec::new())?;
    let config = &loaded.holder.config;

    match (pipeline, json) {
        (Some(name), true) => {
            let pipeline = config.pipeline_by_name(name)?;
            println!("{}", serde_json::to_string_pretty(pipeline)?);
        }
        (Some(name), false) => print_pipeline(config.pipeline_by_name(name)?, true),
        (None, true) => println!("{}", serde_json::to_string_pretty(config)?),
        (None, false) => print_document(config),
    }
    Ok(())
}

fn print_document(config: &ConfigurationDocument) {
    for group in &config.groups {
        println!("{} {}", "Group".blue().bold(), group.name.as_str().yellow());
        for pipeline in group.pipelines() {
            print_pipeline(pipeline, false);
        }
    }
    if !config.templates.is_empty() {
        let names: Vec<&str> = config.templates.iter().map(|t| t.name.as_str()).collect();
        println!("{} {}", "Templates".blue().bold(), names.join(", "));
    }
    for environment in &config.environments {
        let pipelines: Vec<&str> = environment.pipelines().iter().map(|p| p.as_str()).collect();
        println!(
            "{} {} [{}]",
            "Environment".blue().bold(),
            environment.name.as_str().yellow(),
            pipelines.join(", ")
        );
    }
}

fn print_pipeline(pipeline: &Pipeline, detailed: bool) {
    println!("  {} (label {})", pipeline.name.as_str().cyan().bold(), pipeline.label_template);
    if detailed {
        for material in pipeline.materials() {
            println!("    {} {} ({})", "material".dimmed(), material.display_name(), material.type_name());
        }
    }
    for stage in pipeline.stages() {
        let jobs: Vec<&str> = stage.jobs().iter().map(|j| j.name.as_str()).collect();
        let approval = if stage.approval.is_manual() { " [manual]" } else { "" };
        println!("    {}{}: {}", stage.name.as_str(), approval, jobs.join(", "));
        if detailed {
            for job in stage.jobs() {
                for task in job.tasks() {
                    println!("      {} {}", job.name.as_str().dimmed(), task.type_name());
                }
            }
        }
    }
}
