//! Test suites for the pagecount daemon.

mod dispatch_behaviour;
mod process_behaviour;
mod support;
