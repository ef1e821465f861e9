//! Whole-stack checks over a raw template-stack payload.
//!
//! The structural validators answer "is this shape acceptable"; this module
//! collects every finding for one stack so a caller can see all problems at
//! once, including cross-level ones the typed setters never enforce (device
//! assignments whose type differs from the stack definition).

use std::collections::BTreeSet;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::object::{validate_description, validate_name, PanoramaObject};
use crate::template_stack::TemplateStack;
use crate::validate::{
    validate_devices_structure, validate_templates_structure, validate_variable_structure,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    pub name: Option<String>,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<StackIssue>,
}

impl StackReport {
    pub fn pass(&self) -> bool {
        self.errors == 0
    }
}

pub fn build_stack_report(raw: &Value) -> StackReport {
    let name = raw.get("@name").and_then(Value::as_str).map(str::to_string);
    let mut issues = Vec::new();

    match &name {
        Some(n) => {
            if let Err(e) = validate_name(n) {
                issues.push(err("invalid_name", e.to_string()));
            }
        }
        None => issues.push(err("missing_name", "stack has no @name")),
    }
    if let Some(desc) = raw.get("description").and_then(Value::as_str) {
        if let Err(e) = validate_description(desc) {
            issues.push(err("invalid_description", e.to_string()));
        }
    }

    issues.extend(structure_issues(raw));
    if issues.iter().any(|i| i.severity == Severity::Error) {
        return finish(name, issues);
    }

    match TemplateStack::from_value(raw.clone()) {
        Ok(stack) => issues.extend(stack_issues(&stack)),
        Err(e) => issues.push(err("decode_failed", e.to_string())),
    }
    finish(name, issues)
}

fn structure_issues(raw: &Value) -> Vec<StackIssue> {
    let mut issues = Vec::new();
    let checks: [(&str, fn(&Value) -> bool); 3] = [
        ("templates", validate_templates_structure),
        ("devices", validate_devices_structure),
        ("variable", validate_variable_structure),
    ];
    for (field, check) in checks {
        if let Some(block) = raw.get(field) {
            if !check(block) {
                issues.push(err(
                    &format!("invalid_{field}_structure"),
                    format!("{field} block does not have the expected shape"),
                ));
            }
        }
    }
    issues
}

fn stack_issues(stack: &TemplateStack) -> Vec<StackIssue> {
    let mut issues = Vec::new();

    if stack.templates().is_empty() {
        issues.push(warn("no_templates", "stack has no template members"));
    }
    for dup in duplicates(stack.templates().iter().map(String::as_str)) {
        issues.push(warn(
            "duplicate_template",
            format!("template {dup} is listed more than once"),
        ));
    }
    for dup in duplicates(stack.devices().iter().map(|d| d.serial.as_str())) {
        issues.push(warn(
            "duplicate_device",
            format!("device {dup} is assigned more than once"),
        ));
    }
    for conflict in stack.type_conflicts() {
        issues.push(err(
            "variable_type_mismatch",
            format!(
                "device {} assigns {} as {} but the stack defines it as {}",
                conflict.device, conflict.variable, conflict.assigned, conflict.defined
            ),
        ));
    }
    for (device, variable) in stack.undefined_assignments() {
        issues.push(warn(
            "undefined_variable",
            format!("device {device} assigns {variable}, which the stack does not define"),
        ));
    }
    issues
}

fn duplicates<'a>(items: impl Iterator<Item = &'a str>) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for item in items {
        if !seen.insert(item) {
            dups.insert(item);
        }
    }
    dups
}

fn finish(name: Option<String>, issues: Vec<StackIssue>) -> StackReport {
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    StackReport {
        name,
        errors,
        warnings: issues.len() - errors,
        issues,
    }
}

fn err(code: &str, message: impl Into<String>) -> StackIssue {
    StackIssue {
        severity: Severity::Error,
        code: code.to_string(),
        message: message.into(),
    }
}

fn warn(code: &str, message: impl Into<String>) -> StackIssue {
    StackIssue {
        severity: Severity::Warning,
        code: code.to_string(),
        message: message.into(),
    }
}

/// Render a report for the terminal.
pub fn render_stack_report(report: &StackReport) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "stack {}",
        report.name.as_deref().unwrap_or("<unnamed>")
    ));
    for issue in &report.issues {
        let line = format!("- {}: {}", issue.code, issue.message);
        out.push(match issue.severity {
            Severity::Error => line.red().to_string(),
            Severity::Warning => line.yellow().to_string(),
        });
    }
    out.push(format!(
        "result errors={} warnings={}",
        report.errors, report.warnings
    ));
    out.join("\n")
}
