//! # Event Bus Module
//!
//! Decoupled notification between the dowel controller and whatever observes
//! it (preview, status output, logging).
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by [`EventCategory`] and receive events of interest
//! - Handlers run synchronously on the publishing thread
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dowelkit_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Settings]),
//!     |event| println!("{}", event.description()),
//! );
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
