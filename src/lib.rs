//! Facegate client library
//!
//! The camera side of a facial access-control gate. While the camera is
//! on, a scheduler periodically samples the live video, submits the
//! snapshot to a remote recognition service and turns the answer into a
//! small status state machine for display.
//!
//! # Architecture
//!
//! ```text
//! CameraLifecycle ──active──▶ ValidationScheduler
//!                                  │ tick
//!                                  ▼
//!                 FrameCapture → ValidationTransport → StatusStateMachine
//! ```
//!
//! # Design Principles
//!
//! - **One request at a time**: a new snapshot is never sent while one is outstanding
//! - **Bounded load**: a minimum gap between attempts, independent of the tick period
//! - **Nothing is fatal**: capture and transport failures become status transitions
//! - **Opaque recognition**: liveness and matching happen behind `POST /api/validate`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use facegate::{
//!     camera::{CameraLifecycle, SharedSource},
//!     capture::{CaptureConfig, MockVideoSource},
//!     metrics::MetricsRegistry,
//!     scheduler::{SchedulerConfig, ValidationScheduler},
//!     transport::{HttpTransport, TransportConfig},
//! };
//!
//! # async fn demo() {
//! let source: SharedSource = Arc::new(Mutex::new(MockVideoSource::new()));
//! let mut camera = CameraLifecycle::new(Arc::clone(&source), CaptureConfig::default());
//! let transport = Arc::new(HttpTransport::new(&TransportConfig::default()));
//!
//! let scheduler = ValidationScheduler::new(
//!     SchedulerConfig::default(),
//!     source,
//!     transport,
//!     MetricsRegistry::new().unwrap(),
//! )
//! .unwrap();
//! let mut status = scheduler.subscribe_status();
//! let states = camera.subscribe();
//! tokio::spawn(scheduler.run(states, std::future::pending()));
//!
//! camera.start().unwrap();
//! while status.changed().await.is_ok() {
//!     println!("{:?}", *status.borrow());
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod camera;
pub mod capture;
pub mod config;
pub mod metrics;
pub mod scheduler;
pub mod status;
pub mod transport;

// Re-export commonly used types at crate root
pub use camera::{CameraLifecycle, CameraState, MediaHandle, SharedSource};
pub use capture::{CaptureConfig, CaptureFrame, FrameCapture, MockVideoSource, VideoSource};
pub use config::FileConfig;
pub use scheduler::{SchedulerConfig, SchedulerState, ValidationScheduler};
pub use status::{StatusStateMachine, StatusView, ValidationStatus};
pub use transport::{HttpTransport, ValidationOutcome, ValidationResult, ValidationTransport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
