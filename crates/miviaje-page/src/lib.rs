//! Page controller for the Mi Viaje PWA.
//!
//! The page talks to the platform through `Platform` and owns its document
//! (`SharedDocument`) and local storage. It never shares memory with the
//! service worker; it only asks the platform to register the worker script.
//!
//! - `controller`: `PageController` and the `PageEvent`s it handles
//! - `api`: API calls with offline queueing
//! - `ui`: Toasts, loading indicator, forms, tabs, expense chart
//! - `dom`: The in-memory document model
//! - `platform`: Navigator and window services

pub mod api;
pub mod controller;
pub mod debounce;
pub mod dom;
pub mod platform;
pub mod share;
pub mod ui;

pub use api::{ApiClient, ApiError, NetworkTransport, OfflineQueue, PendingAction, RequestOptions, Transport};
pub use controller::{PageController, PageEvent, SyncReport};
pub use debounce::Debouncer;
pub use dom::{Document, Element, NodeId, SharedDocument};
pub use platform::{InstallPrompt, Platform, RegistrationError, ShareData, UserChoice};
pub use share::share_content;
