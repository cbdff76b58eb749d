//! Subscriber setup for the detection binary. Library code only ever emits
//! `tracing` events; only the binary entry point calls [`init`].

use tracing_subscriber::{
    fmt::{self, format, time},
    prelude::*,
    EnvFilter,
};

struct Guard;

impl Drop for Guard {
    fn drop(&mut self) {}
}

/// Install a compact, uptime-timed subscriber reading its filter from
/// `RUST_LOG`. Returns a guard that must be kept alive for the process
/// lifetime.
pub fn init() -> impl Drop {
    let evt_fmt = format().with_timer(time::Uptime::default()).compact();
    let fmt_layer = fmt::layer().event_format(evt_fmt);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EnvFilter::from_default_env())
        .init();

    Guard
}
