//! Business logic services for webhook dispatch.

pub mod dispatcher;
pub mod event_publisher;
pub mod webhook_service;
