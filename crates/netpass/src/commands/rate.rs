//! `rate`: encode a bandwidth policy without touching any state.

use netpass_core::{BandwidthPolicy, encoder};

use crate::cli::{GlobalOpts, RateArgs};
use crate::output;

pub fn handle(args: &RateArgs, global: &GlobalOpts) {
    let mut policy = BandwidthPolicy::new(args.download, args.upload);
    if let Some(limit) = args.burst_limit {
        policy = policy.with_burst(
            limit,
            args.burst_threshold.unwrap_or(0),
            args.burst_time.unwrap_or(0),
        );
    }
    output::print_output(&encoder::rate_limit(&policy), global.quiet);
}
