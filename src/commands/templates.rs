//! Implementation of the `render`, `check-template` and `templates` commands.

use super::runtime::Runtime;
use crate::cli::RenderArgs;
use crate::error::{ExforgeError, Result};
use crate::template::{TemplateCatalog, TemplateParams};
use std::collections::BTreeMap;
use tracing::warn;

/// Build template parameters from `--param`, `--field` and `--extra` values.
///
/// Fields are grouped by the part before the first dot.
pub fn params_from_args(args: &RenderArgs) -> Result<TemplateParams> {
    let mut params = TemplateParams::new();
    for (name, value) in &args.params {
        params.set(name.as_str(), value.as_str());
    }

    let mut structured: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
    for (path, value) in &args.fields {
        let (name, field) = path
            .split_once('.')
            .filter(|(name, field)| !name.is_empty() && !field.is_empty())
            .ok_or_else(|| {
                ExforgeError::UserError(format!(
                    "structured field '{}' must look like NAME.FIELD",
                    path
                ))
            })?;
        structured.entry(name).or_default().push((field, value.as_str()));
    }
    for (name, fields) in structured {
        params.set_structured(name, fields);
    }

    for (name, value) in &args.extras {
        params.set_extra(name.as_str(), value.as_str());
    }
    Ok(params)
}

/// Templates from the taxonomy, or the built-ins when it cannot be loaded.
fn catalog(runtime: &Runtime) -> TemplateCatalog {
    match runtime.registry.snapshot() {
        Ok(index) => index.templates().clone(),
        Err(e) => {
            warn!(error = %e, "taxonomy unavailable; using built-in templates");
            TemplateCatalog::with_builtins()
        }
    }
}

/// Execute the `exforge render` command.
pub fn cmd_render(runtime: &Runtime, args: RenderArgs) -> Result<()> {
    let params = params_from_args(&args)?;
    let rendered = catalog(runtime).render_report(&args.template_id, &params)?;

    for token in &rendered.unresolved {
        eprintln!("Warning: placeholder '{{{{{}}}}}' left unresolved", token);
    }
    println!("{}", rendered.text);
    Ok(())
}

/// Execute the `exforge check-template` command.
pub fn cmd_check_template(runtime: &Runtime, args: RenderArgs) -> Result<()> {
    let params = params_from_args(&args)?;
    let validation = catalog(runtime).validate(&args.template_id, &params)?;

    if validation.is_valid {
        println!("Template '{}': all required parameters present.", args.template_id);
    } else {
        println!("Template '{}': missing parameters:", args.template_id);
        for name in &validation.missing_parameter_names {
            println!("  - {}", name);
        }
    }
    validation.into_result()
}

/// Execute the `exforge templates` command.
pub fn cmd_templates(runtime: &Runtime) -> Result<()> {
    let catalog = catalog(runtime);
    if catalog.is_empty() {
        println!("No templates.");
        return Ok(());
    }

    for template in catalog.iter() {
        println!(
            "{:<28} v{:<6} {}",
            template.id, template.version, template.name
        );
        if !template.required_parameters.is_empty() {
            println!("    requires: {}", template.required_parameters.join(", "));
        }
    }
    Ok(())
}
