//! Test suites for the printer inventory.

mod support;
