// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod route_tables;
mod subnet_layout;
