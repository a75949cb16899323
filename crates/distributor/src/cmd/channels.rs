//! Channels command - list the declared output channels
//!
//! Prints one channel name per line: the numbered channels in order, then
//! `Failure`.

use anyhow::Result;
use clap::Args;
use distributor_config::Config;
use distributor_routing::ChannelSet;

use super::RoutingArgs;

/// Channels command arguments
#[derive(Args, Debug, Default)]
pub struct ChannelsArgs {
    #[command(flatten)]
    pub routing: RoutingArgs,
}

/// Run the channels command
pub fn run(args: ChannelsArgs, config: &Config) -> Result<()> {
    let channels = ChannelSet::new(args.routing.channel_count(config)?, 0);

    for line in channel_lines(&channels) {
        println!("{}", line);
    }

    Ok(())
}

fn channel_lines(channels: &ChannelSet) -> Vec<String> {
    channels.channel_names()
}
