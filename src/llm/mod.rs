// ABOUTME: Generative model client module for vision extraction and image synthesis
// ABOUTME: Hosts the OpenAI provider used by the structured extraction client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # LLM Providers
//!
//! HTTP clients for the generative models the pipeline calls: a
//! vision-capable chat model for structured extraction, a text model for
//! writing image-synthesis prompts, and an image model for rendering recipe
//! covers.

/// `OpenAI` chat-completions and images client
pub mod openai;

pub use openai::OpenAiProvider;
