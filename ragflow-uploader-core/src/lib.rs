#![doc = "ragflow-uploader-core: core logic library for ragflow-uploader."]

//! This crate holds everything that does not depend on a concrete transport:
//! configuration resolution, directory scanning, dedup, batched dispatch and the
//! run report. The remote service is reached only through
//! [`contract::KnowledgeBase`].
//!
//! # Usage
//! Build an [`config::EffectiveConfig`] with [`config::resolve`], then hand a
//! `KnowledgeBase` implementation to [`pipeline::upload_directory`].

pub mod config;
pub mod contract;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod report;
pub mod scan;

pub use error::AppError;
