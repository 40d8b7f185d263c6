//! Materials

use crate::schema::{
    at_least_one, bool_attr, check_attrs, check_name, check_sequence, optional, require_attr, required, text_of,
};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{
    DependencyMaterial, GitMaterial, HgMaterial, Material, P4Material, PackageMaterial, PluggableScmMaterial,
    PropertyValue, ScmOptions, SvnMaterial, TfsMaterial,
};
use cruise_xml::Element;

pub(crate) const MATERIAL_ELEMENTS: &[&str] = &["svn", "git", "hg", "p4", "tfs", "pipeline", "package", "scm"];
pub(crate) const SCM_ELEMENTS: &[&str] = &["git", "hg", "svn", "p4", "tfs"];

const COMMON_ATTRS: &[&str] = &["dest", "materialName", "autoUpdate", "invertFilter"];

pub(crate) fn read_materials(codec: &DocumentCodec<'_>, parent: &Element) -> Result<Vec<Material>> {
    let list = parent.child("materials").ok_or_else(|| {
        Error::structural(
            &parent.name,
            format!("The content of element '{}' is not complete. One of '{{materials}}' is expected.", parent.name),
        )
    })?;
    check_attrs(list, &[])?;
    check_sequence(list, &[at_least_one(MATERIAL_ELEMENTS)])?;
    list.elements().map(|e| read_material(codec, e)).collect()
}

pub(crate) fn read_material(codec: &DocumentCodec<'_>, element: &Element) -> Result<Material> {
    let material = match element.name.as_str() {
        "svn" => {
            check_attrs(element, &with_common(&["url", "username", "password", "encryptedPassword", "checkexternals"]))?;
            check_sequence(element, &[optional(&["filter"])])?;
            Material::Svn(SvnMaterial {
                url: require_attr(element, "url")?.to_string(),
                username: element.attr("username").map(str::to_string),
                password: read_password(codec, element)?,
                check_externals: bool_attr(element, "checkexternals", false)?,
                options: read_options(element)?,
            })
        }
        "git" => {
            check_attrs(element, &with_common(&["url", "branch", "shallowClone"]))?;
            check_sequence(element, &[optional(&["filter"])])?;
            let mut git = GitMaterial::new(require_attr(element, "url")?);
            if let Some(branch) = element.attr("branch").filter(|b| !b.trim().is_empty()) {
                git.branch = branch.to_string();
            }
            git.shallow_clone = bool_attr(element, "shallowClone", false)?;
            git.options = read_options(element)?;
            Material::Git(git)
        }
        "hg" => {
            check_attrs(element, &with_common(&["url", "branch"]))?;
            check_sequence(element, &[optional(&["filter"])])?;
            Material::Hg(HgMaterial {
                url: require_attr(element, "url")?.to_string(),
                branch: element.attr("branch").map(str::to_string),
                options: read_options(element)?,
            })
        }
        "p4" => {
            check_attrs(element, &with_common(&["port", "username", "password", "encryptedPassword", "useTickets"]))?;
            check_sequence(element, &[required(&["view"]), optional(&["filter"])])?;
            let view = element
                .child("view")
                .and_then(text_of)
                .ok_or_else(|| Error::structural("view", "P4 view cannot be empty."))?;
            Material::P4(P4Material {
                server_and_port: require_attr(element, "port")?.to_string(),
                username: element.attr("username").map(str::to_string),
                password: read_password(codec, element)?,
                use_tickets: bool_attr(element, "useTickets", false)?,
                view,
                options: read_options(element)?,
            })
        }
        "tfs" => {
            check_attrs(
                element,
                &with_common(&["url", "username", "domain", "password", "encryptedPassword", "projectPath"]),
            )?;
            check_sequence(element, &[optional(&["filter"])])?;
            Material::Tfs(TfsMaterial {
                url: require_attr(element, "url")?.to_string(),
                username: require_attr(element, "username")?.to_string(),
                domain: element.attr("domain").map(str::to_string),
                password: read_password(codec, element)?,
                project_path: require_attr(element, "projectPath")?.to_string(),
                options: read_options(element)?,
            })
        }
        "pipeline" => {
            check_attrs(element, &["pipelineName", "stageName", "materialName"])?;
            check_sequence(element, &[])?;
            Material::Dependency(DependencyMaterial {
                name: element.attr("materialName").map(Into::into),
                pipeline: check_name(element, "Pipeline name", require_attr(element, "pipelineName")?)?.into(),
                stage: check_name(element, "Stage name", require_attr(element, "stageName")?)?.into(),
            })
        }
        "package" => {
            check_attrs(element, &["ref"])?;
            check_sequence(element, &[])?;
            Material::Package(PackageMaterial {
                package_id: require_attr(element, "ref")?.to_string(),
            })
        }
        "scm" => {
            check_attrs(element, &["ref", "dest", "invertFilter"])?;
            check_sequence(element, &[optional(&["filter"])])?;
            Material::PluggableScm(PluggableScmMaterial {
                scm_id: require_attr(element, "ref")?.to_string(),
                options: read_options(element)?,
            })
        }
        other => {
            return Err(Error::structural(
                other,
                format!("Invalid content was found starting with element '{}'.", other),
            ));
        }
    };
    Ok(material)
}

fn with_common(attrs: &[&'static str]) -> Vec<&'static str> {
    attrs.iter().chain(COMMON_ATTRS).copied().collect()
}

fn read_options(element: &Element) -> Result<ScmOptions> {
    let mut filter = Vec::new();
    if let Some(list) = element.child("filter") {
        check_attrs(list, &[])?;
        check_sequence(list, &[at_least_one(&["ignore"])])?;
        for ignore in list.children_named("ignore") {
            check_attrs(ignore, &["pattern"])?;
            filter.push(require_attr(ignore, "pattern")?.to_string());
        }
    }
    Ok(ScmOptions {
        dest: element.attr("dest").map(str::to_string),
        name: element
            .attr("materialName")
            .map(|n| check_name(element, "Material name", n))
            .transpose()?
            .map(Into::into),
        auto_update: bool_attr(element, "autoUpdate", true)?,
        filter,
        invert_filter: bool_attr(element, "invertFilter", false)?,
    })
}

pub(crate) fn read_password(codec: &DocumentCodec<'_>, element: &Element) -> Result<Option<PropertyValue>> {
    match (element.attr("password"), element.attr("encryptedPassword")) {
        (Some(_), Some(_)) => Err(Error::structural(
            &element.name,
            "You may only specify `password` or `encryptedPassword`, not both!",
        )),
        (None, Some(token)) => Ok(Some(PropertyValue::Encrypted(token.to_string()))),
        (Some(plain), None) => match codec.cipher() {
            Some(cipher) if !plain.is_empty() => Ok(Some(PropertyValue::secure(plain, cipher)?)),
            _ => Ok(Some(PropertyValue::Plain(plain.to_string()))),
        },
        (None, None) => Ok(None),
    }
}

pub(crate) fn write_materials(parent: &mut Element, materials: &[Material]) {
    let mut list = Element::new("materials");
    for material in materials {
        list.push(write_material(material));
    }
    parent.push(list);
}

pub(crate) fn write_material(material: &Material) -> Element {
    match material {
        Material::Svn(m) => {
            let mut e = Element::new("svn").with_attr("url", &m.url);
            e.set_opt_attr("username", m.username.as_deref());
            write_password(&mut e, m.password.as_ref());
            if m.check_externals {
                e.set_attr("checkexternals", "true");
            }
            write_options(e, &m.options)
        }
        Material::Git(m) => {
            let mut e = Element::new("git").with_attr("url", &m.url);
            if m.branch != GitMaterial::DEFAULT_BRANCH {
                e.set_attr("branch", &m.branch);
            }
            if m.shallow_clone {
                e.set_attr("shallowClone", "true");
            }
            write_options(e, &m.options)
        }
        Material::Hg(m) => {
            let mut e = Element::new("hg").with_attr("url", &m.url);
            e.set_opt_attr("branch", m.branch.as_deref());
            write_options(e, &m.options)
        }
        Material::P4(m) => {
            let mut e = Element::new("p4").with_attr("port", &m.server_and_port);
            e.set_opt_attr("username", m.username.as_deref());
            write_password(&mut e, m.password.as_ref());
            if m.use_tickets {
                e.set_attr("useTickets", "true");
            }
            let mut view = Element::new("view");
            view.push_cdata(&m.view);
            let mut e = write_options(e, &m.options);
            e.insert(0, view);
            e
        }
        Material::Tfs(m) => {
            let mut e = Element::new("tfs").with_attr("url", &m.url);
            e.set_opt_attr("domain", m.domain.as_deref());
            e.set_attr("username", &m.username);
            write_password(&mut e, m.password.as_ref());
            e.set_attr("projectPath", &m.project_path);
            write_options(e, &m.options)
        }
        Material::Dependency(m) => {
            let mut e = Element::new("pipeline")
                .with_attr("pipelineName", m.pipeline.as_str())
                .with_attr("stageName", m.stage.as_str());
            e.set_opt_attr("materialName", m.name.as_ref().map(|n| n.as_str()));
            e
        }
        Material::Package(m) => Element::new("package").with_attr("ref", &m.package_id),
        Material::PluggableScm(m) => {
            let mut e = Element::new("scm").with_attr("ref", &m.scm_id);
            e.set_opt_attr("dest", m.options.dest.as_deref());
            if m.options.invert_filter {
                e.set_attr("invertFilter", "true");
            }
            write_filter(&mut e, &m.options.filter);
            e
        }
    }
}

pub(crate) fn write_password(element: &mut Element, password: Option<&PropertyValue>) {
    match password {
        Some(PropertyValue::Plain(p)) => element.set_attr("password", p),
        Some(PropertyValue::Encrypted(token)) => element.set_attr("encryptedPassword", token),
        None => {}
    }
}

fn write_options(mut element: Element, options: &ScmOptions) -> Element {
    element.set_opt_attr("dest", options.dest.as_deref());
    element.set_opt_attr("materialName", options.name.as_ref().map(|n| n.as_str()));
    if !options.auto_update {
        element.set_attr("autoUpdate", "false");
    }
    if options.invert_filter {
        element.set_attr("invertFilter", "true");
    }
    write_filter(&mut element, &options.filter);
    element
}

fn write_filter(element: &mut Element, patterns: &[String]) {
    if patterns.is_empty() {
        return;
    }
    let mut filter = Element::new("filter");
    for pattern in patterns {
        filter.push(Element::new("ignore").with_attr("pattern", pattern));
    }
    element.push(filter);
}
