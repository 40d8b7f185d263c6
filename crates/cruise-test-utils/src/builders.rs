//! Builders for pipeline markup.

/// Builds a `<pipeline>` element with one git material.
///
/// ```
/// use cruise_test_utils::builders::PipelineXml;
///
/// let xml = PipelineXml::new("build").stage("compile", &["unit"]).to_string();
/// assert!(xml.contains(r#"<job name="unit" />"#));
/// ```
#[derive(Debug, Clone)]
pub struct PipelineXml {
    name: String,
    attributes: Vec<(String, String)>,
    materials: Vec<String>,
    stages: Vec<String>,
}

impl PipelineXml {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            materials: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// Add raw material markup. Without any, a git material is written.
    pub fn material(mut self, markup: &str) -> Self {
        self.materials.push(markup.to_string());
        self
    }

    pub fn depends_on(self, pipeline: &str, stage: &str) -> Self {
        self.material(&format!(r#"<pipeline pipelineName="{pipeline}" stageName="{stage}" />"#))
    }

    pub fn stage(mut self, name: &str, jobs: &[&str]) -> Self {
        let jobs: String = jobs.iter().map(|j| format!(r#"<job name="{j}" />"#)).collect();
        self.stages
            .push(format!(r#"<stage name="{name}"><jobs>{jobs}</jobs></stage>"#));
        self
    }

    /// Add raw stage markup.
    pub fn raw_stage(mut self, markup: &str) -> Self {
        self.stages.push(markup.to_string());
        self
    }
}

impl std::fmt::Display for PipelineXml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, r#"<pipeline name="{}""#, self.name)?;
        for (key, value) in &self.attributes {
            write!(f, r#" {key}="{value}""#)?;
        }
        f.write_str("><materials>")?;
        if self.materials.is_empty() {
            write!(f, r#"<git url="https://example.com/{}.git" />"#, self.name)?;
        }
        for material in &self.materials {
            f.write_str(material)?;
        }
        f.write_str("</materials>")?;
        for stage in &self.stages {
            f.write_str(stage)?;
        }
        f.write_str("</pipeline>")
    }
}

/// A `<pipelines>` group holding `pipelines`.
pub fn group(name: &str, pipelines: &[PipelineXml]) -> String {
    let body: String = pipelines.iter().map(ToString::to_string).collect();
    format!(r#"<pipelines group="{name}">{body}</pipelines>"#)
}
