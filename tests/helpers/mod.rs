// ABOUTME: Shared helper modules for integration tests
// ABOUTME: Exposes the axum oneshot request utilities

#![allow(dead_code)]

pub mod axum_test;
