//! Client code for frost.
//!
//! This crate provides the network transport, the URL admission policy, and
//! the offline resource cache component driven by the hosting runtime.

pub mod fetch;
pub mod worker;

pub use fetch::{
    AdmissionError, AdmissionPolicy, Destination, FetchClient, FetchConfig, Request, Response, ResponseType,
    Transport,
};

pub use worker::{
    ActivateReport, Disposition, InstallReport, PassthroughReason, ResponseSource, ServiceWorker, WorkerConfig,
    WorkerState,
};
