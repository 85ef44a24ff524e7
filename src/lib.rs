//! Core Rust implementation of a chain-agnostic transaction lifecycle engine.
//!
//! This crate provides the building blocks for submitting, resubmitting,
//! and monitoring blockchain transactions to completion: a pluggable
//! [`ChainAdapter`](chain_adapter::ChainAdapter) per chain, a node pool with
//! primary/fallback failover, a multi-node quorum-read / single-node-write
//! dispatcher, a fee-bump resubmission loop, a durable lifecycle scheduler,
//! and a concurrent health probe.
//!
//! # Overview
//!
//! A caller submits a transaction once through the [`scheduler::Scheduler`];
//! from then on the scheduler's background task owns resubmission (bumping
//! the adaptable fee per gas as blocks pass without inclusion) and reports a
//! terminal `Confirmed`/`Reverted` status once the required confirmation
//! depth is reached. Everything below that — reading chain state, building
//! and signing a transaction, deciding whether a node error should abort the
//! task or retry — is delegated to a [`chain_adapter::ChainAdapter`].
//!
//! # Modules
//!
//! - [`chain_id`] — Closed set of supported chains and their EVM/non-EVM family.
//! - [`chain_adapter`] — The [`ChainAdapter`](chain_adapter::ChainAdapter) trait every concrete adapter implements.
//! - [`evm`] — The reference EVM adapter built on `alloy`.
//! - [`stub`] — A non-EVM stub adapter that can never receive write traffic.
//! - [`registry`] — Process-wide `ChainId -> ChainAdapter` registry.
//! - [`node_pool`] — Primary/fallback endpoint pool construction.
//! - [`protocol`] — The closed set of supported Pantos protocol versions.
//! - [`dispatcher`] — Multi-node quorum-read / single-node-write dispatch.
//! - [`submission`] — Chain-agnostic request validation and send-error classification.
//! - [`resubmission`] — The chain-agnostic fee-bump resubmission loop.
//! - [`scheduler`] — The durable, pollable Lifecycle Scheduler.
//! - [`health`] — Concurrent connectivity health probe across registered chains.
//! - [`abi`] — Contract ABI resource loader and cache.
//! - [`types`] — Core data model shared across components.
//! - [`error`] — The structured error taxonomy.
//! - [`config`] — Process configuration: chains, endpoints, signing keys.
//! - [`telemetry`] — Tracing/logging bootstrap.

pub mod abi;
pub mod chain_adapter;
pub mod chain_id;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod evm;
pub mod health;
pub mod node_pool;
pub mod protocol;
pub mod registry;
pub mod resubmission;
pub mod scheduler;
pub mod stub;
pub mod submission;
pub mod telemetry;
pub mod types;
