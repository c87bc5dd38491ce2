//! Scenario tests driving the interpreter over hand-built script trees.

mod support;

mod call_tests;
mod output_tests;
mod thread_tests;
