use anyhow::{bail, Context, Result};
use panorama_config::client::PanoramaClient;
use panorama_config::config::load_config;
use panorama_config::device_group::DeviceGroup;

use crate::cli::{ParentDgArgs, StacksForTemplateArgs};

fn connect(config: &std::path::Path) -> Result<PanoramaClient> {
    let config = load_config(config)?;
    PanoramaClient::from_config(&config)
        .with_context(|| format!("failed to set up client for {}", config.host))
}

pub fn run_parent_dg(args: ParentDgArgs) -> Result<()> {
    let client = connect(&args.config)?;
    let device_group = DeviceGroup::new(args.device_group.as_str())?;

    match client.parent_device_group(&device_group) {
        Some(parent) => {
            println!("{parent}");
            Ok(())
        }
        None => bail!(
            "could not determine the parent of device group {}",
            args.device_group
        ),
    }
}

pub fn run_stacks_for_template(args: StacksForTemplateArgs) -> Result<()> {
    let client = connect(&args.config)?;
    let stacks = client
        .template_stacks_containing(&args.template)
        .with_context(|| format!("failed to list template stacks on {}", client.base_url()))?;
    for name in stacks {
        println!("{name}");
    }
    Ok(())
}
