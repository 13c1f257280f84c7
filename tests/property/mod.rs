// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod connection_urls;
mod ingress_rules;
mod platform_ingress;
mod subnet_split;
