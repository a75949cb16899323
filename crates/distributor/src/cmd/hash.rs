//! Hash command - show where attribute values are routed
//!
//! For each value prints `<value>\t<hash>\t<channel>`, where `<hash>` is the
//! signed 32-bit routing hash.

use anyhow::Result;
use clap::Args;
use distributor_config::Config;
use distributor_routing::{ChannelSet, stable_hash32};

use super::RoutingArgs;

/// Hash command arguments
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Attribute values to hash
    #[arg(required = true)]
    pub values: Vec<String>,

    #[command(flatten)]
    pub routing: RoutingArgs,
}

/// Run the hash command
pub fn run(args: HashArgs, config: &Config) -> Result<()> {
    let channels = ChannelSet::new(args.routing.channel_count(config)?, 0);

    for value in &args.values {
        println!("{}", describe(value, &channels));
    }

    Ok(())
}

fn describe(value: &str, channels: &ChannelSet) -> String {
    format!(
        "{}\t{}\t{}",
        value,
        stable_hash32(value),
        channels.channel_for_value(value)
    )
}
