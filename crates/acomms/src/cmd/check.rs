//! Check command - validate configuration and try sample lines
//!
//! Prints the compiled identifier registry so operators can confirm queue
//! numbers and asset ids before a dive, then decodes any `--line` samples
//! exactly as the filter would.

use acomms_config::Config;
use acomms_protocol::{Decoder, FieldSpec};
use acomms_routing::{IdentifierRegistry, profile_from_config, registry_from_config};
use anyhow::{Context, Result, bail};
use clap::Args;

use super::filter::ProfileArg;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Framing profile (overrides config)
    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Raw line to decode; repeat for several
    #[arg(long = "line")]
    pub lines: Vec<String>,
}

/// Run the check command
pub fn run(args: CheckArgs, mut config: Config) -> Result<()> {
    if let Some(profile) = args.profile {
        config.filter.profile = profile.into();
    }
    config.validate().context("invalid configuration")?;

    let registry = registry_from_config(&config).context("failed to build identifier registry")?;
    print!("{}", describe(&config, &registry));

    if args.lines.is_empty() {
        return Ok(());
    }

    let decoder = Decoder::new(profile_from_config(&config), &registry);
    let mut failed = 0usize;

    println!();
    for line in &args.lines {
        match decoder.decode_str(line) {
            Ok(record) => {
                let category = registry
                    .category(record.category())
                    .map(|c| c.name())
                    .unwrap_or("?");
                println!("ok    {category}: {}", record.to_line().trim_end());
            }
            Err(reason) => {
                failed += 1;
                println!("skip  {} ({reason})", reason.kind());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} sample lines were skipped", args.lines.len());
    }
    Ok(())
}

/// Human-readable registry summary
fn describe(config: &Config, registry: &IdentifierRegistry) -> String {
    let mut out = format!(
        "profile: {}\ncategories: {}\nidentifiers: {}\n",
        config.filter.profile.as_str(),
        registry.category_count(),
        registry.identifier_count()
    );

    for entry in registry.categories() {
        let identifiers: Vec<&str> = registry
            .identifiers_for(entry.id())
            .into_iter()
            .map(|i| i.as_str())
            .collect();
        let fields: Vec<String> = entry.schema().fields().iter().map(FieldSpec::to_string).collect();

        out.push_str(&format!(
            "\n[{}]\n  identifiers: {}\n  separator: {:?}\n  fields: {}\n",
            entry.name(),
            identifiers.join(", "),
            entry.schema().separator(),
            fields.join(", ")
        ));
    }

    out
}
