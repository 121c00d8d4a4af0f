//! Consolidated test modules.
//!
//! Unit tests live next to the code they cover; the tests here drive whole
//! flows, from dataset and config files through the services and out through
//! the report renderers.
