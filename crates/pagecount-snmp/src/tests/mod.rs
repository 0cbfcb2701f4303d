//! Test suites for counter reads and polling.
