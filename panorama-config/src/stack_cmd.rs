use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use panorama_config::check::{build_stack_report, render_stack_report};
use panorama_config::object::PanoramaObject;
use panorama_config::template_stack::TemplateStack;
use panorama_config::variables::VariableBlock;
use serde_json::{json, Value};

use crate::cli::{OutputFormat, RenderArgs, SetVarArgs, ValidateArgs, VarsArgs};
use crate::path_guard::ensure_distinct_output;

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let raw = read_stack_document(&args.file)?;
    let report = build_stack_report(&raw);

    match args.format {
        OutputFormat::Text => println!("{}", render_stack_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.pass() {
        bail!("validate failed: {} error(s)", report.errors);
    }
    if args.strict && report.warnings > 0 {
        bail!("validate failed in strict mode: {} warning(s)", report.warnings);
    }
    Ok(())
}

pub fn run_vars(args: VarsArgs) -> Result<()> {
    let stack = load_stack(&args.file)?;

    match args.format {
        OutputFormat::Json => {
            let devices: Vec<Value> = stack
                .devices()
                .iter()
                .map(|d| json!({"@name": d.serial, "variable": d.variable}))
                .collect();
            let out = json!({"definitions": stack.variables(), "devices": devices});
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("definitions");
            print_block(stack.variables(), "- ");
            println!("devices");
            for device in stack.devices() {
                println!("- {}", device.serial);
                if let Some(block) = &device.variable {
                    print_block(block, "    ");
                }
            }
        }
    }
    Ok(())
}

fn print_block(block: &VariableBlock, indent: &str) {
    for var in block.iter() {
        println!(
            "{indent}{} {} {}",
            var.name,
            var.value.tag(),
            var.value.value()
        );
    }
}

pub fn run_set_var(args: SetVarArgs) -> Result<()> {
    let mut stack = load_stack(&args.file)?;

    let applied = stack
        .set_device_variable_value(&args.device, &args.name, args.value.as_str(), !args.no_create_device)
        .with_context(|| format!("failed to set {} on device {}", args.name, args.device))?;
    if !applied {
        bail!(
            "device {} is not in stack {} (drop --no-create-device to add it)",
            args.device,
            stack.name()
        );
    }

    let rendered = serde_json::to_string_pretty(&stack.to_value()?)?;
    match args.output {
        Some(out_path) => {
            ensure_distinct_output(&out_path, &args.file)?;
            fs::write(&out_path, rendered + "\n")
                .with_context(|| format!("failed to write {}", out_path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub fn run_render(args: RenderArgs) -> Result<()> {
    let stack = load_stack(&args.file)?;
    let xml = pan_xml::write(&stack.to_xml()?).context("failed to render XML")?;
    println!("{}", String::from_utf8(xml).context("rendered XML is not UTF-8")?);
    Ok(())
}

fn load_stack(path: &Path) -> Result<TemplateStack> {
    let raw = read_stack_document(path)?;
    TemplateStack::from_value(raw)
        .with_context(|| format!("{} is not a valid template stack", path.display()))
}

/// Read a stack document: either a bare entry or a REST-style
/// `{"entry": ...}` wrapper holding exactly one stack. `.xml` files hold an
/// `<entry>` element or an XML API `<response>` around one.
fn read_stack_document(path: &Path) -> Result<Value> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml")) {
        return read_stack_xml(path);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if raw.get("@name").is_some() {
        return Ok(raw);
    }
    match raw.get("entry") {
        Some(Value::Array(items)) if items.len() == 1 => Ok(items[0].clone()),
        Some(Value::Array(items)) => {
            bail!("{} holds {} stacks; expected one", path.display(), items.len())
        }
        Some(entry @ Value::Object(_)) => Ok(entry.clone()),
        _ => Ok(raw),
    }
}

fn read_stack_xml(path: &Path) -> Result<Value> {
    let root = pan_xml::parse_file(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let entry = if root.tag == "entry" {
        &root
    } else {
        root.get_child("result")
            .and_then(|result| result.get_child("entry"))
            .with_context(|| format!("{} has no template stack entry", path.display()))?
    };
    Ok(TemplateStack::xml_to_value(entry))
}
