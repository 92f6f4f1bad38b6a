// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Reconciler - a generic operator-style reconciliation controller
//!
//! This crate drives declaratively-managed resources from an observed
//! `spec` to a converged state through pluggable action executors, the
//! way a Kubernetes operator drives a custom resource to its desired
//! state, but without any dependency on the Kubernetes API.
//!
//! ## Overview
//!
//! - [`model`] - resource, condition, history and webhook record types
//! - [`store`] - the persistence trait and its in-memory/Postgres backends
//! - [`admission`] - the mutating-then-validating webhook chain
//! - [`plugins`] - action executor, input source and reconciler plugin traits
//! - [`dispatcher`] - the poll loop, requeue loop and per-resource reconcile task
//! - [`reconciler_host`] - lifecycle management for long-running reconciler plugins
//! - [`api`] - a thin invariant-preserving facade over the store and event bus
//! - [`event_bus`] - in-process fan-out of resource lifecycle events
//! - [`metrics`] - Prometheus instrumentation
//! - [`shutdown`] - the cooperative shutdown signal shared by every loop

pub mod admission;
pub mod api;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod event_bus;
pub mod metrics;
pub mod model;
pub mod plugins;
pub mod reconciler_host;
pub mod shutdown;
pub mod store;
