//! Unit tests for the analysis context.

mod support;
