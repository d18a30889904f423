//! # Topic subscriptions: handlers, merging, and inclusion filtering.
//!
//! A subscription binds a bus topic to a [`Handler`]. Bindings come from
//! two sources:
//!
//! - **static**: registered one by one through `AppBuilder::listen`
//!   (the declarative source, analogous to event-decorator registration);
//! - **dynamic**: a whole map supplied at construction through
//!   `AppBuilder::with_subscriptions`.
//!
//! [`build_subscriptions`] merges the two (dynamic wins on collision) and
//! applies the optional topic-inclusion filter. Filtered-out topics are
//! never registered with the bus at all, so messages on them are never
//! delivered to the process.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DeliveryError;

/// Result of handling one delivered message.
///
/// `Ok(Some(value))` is published back when the delivery carried a reply
/// subject; `Ok(None)` acknowledges without replying.
pub type HandlerResult = Result<Option<Value>, DeliveryError>;

/// Shared handle to a message handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Final topic→handler mapping handed to the bus client.
pub type Subscriptions = BTreeMap<String, HandlerRef>;

/// # A message handler bound to one topic.
///
/// Receives the topic the message arrived on and its JSON payload.
/// Handlers run concurrently with every other unit; a failure is local to
/// that one delivery.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Processes one delivered message.
    async fn handle(&self, topic: &str, message: Value) -> HandlerResult;
}

/// Function-backed handler implementation.
///
/// Wraps a closure that creates a fresh future per delivery; shared state
/// goes through an explicit `Arc` inside the closure.
///
/// ## Example
/// ```rust
/// use colony::{HandlerFn, HandlerRef};
///
/// let h: HandlerRef = HandlerFn::arc(|_topic, _message| async move {
///     Ok(Some(serde_json::json!({ "data": 2 })))
/// });
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared [`HandlerRef`].
    pub fn arc(f: F) -> HandlerRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, topic: &str, message: Value) -> HandlerResult {
        (self.f)(topic.to_string(), message).await
    }
}

/// Merges static and dynamic bindings and applies the inclusion filter.
///
/// - Static bindings come first; dynamic bindings overlay them, so on a
///   topic collision the dynamic entry wins regardless of declaration
///   order.
/// - With `include_filter = Some(substrings)`, a topic survives only if it
///   **contains** at least one of the substrings. This is containment, not
///   prefix or exact match: topic `"foo.bar"` matches filter `["foo"]`,
///   and filter `["foo"]` also matches topic `"barfoo"`.
/// - `include_filter = None` performs no filtering.
///
/// An empty result is valid and yields a process with no subscriptions.
pub fn build_subscriptions(
    static_bindings: Subscriptions,
    dynamic_bindings: Subscriptions,
    include_filter: Option<&[String]>,
) -> Subscriptions {
    let mut bindings = static_bindings;
    bindings.extend(dynamic_bindings);

    if let Some(filter) = include_filter {
        bindings.retain(|topic, _| filter.iter().any(|needle| topic.contains(needle)));
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(tag: i64) -> HandlerRef {
        HandlerFn::arc(move |_topic, _message| async move {
            Ok(Some(serde_json::json!({ "data": tag })))
        })
    }

    async fn tag_of(h: &HandlerRef) -> i64 {
        h.handle("t", Value::Null).await.unwrap().unwrap()["data"]
            .as_i64()
            .unwrap()
    }

    fn bindings(entries: &[(&str, i64)]) -> Subscriptions {
        entries
            .iter()
            .map(|(topic, tag)| (topic.to_string(), handler(*tag)))
            .collect()
    }

    #[test]
    fn test_filter_retains_only_matching_topics() {
        let statics = bindings(&[("foo.x", 1), ("bar.y", 2), ("start", 3)]);
        let filter = vec!["foo".to_string(), "bar".to_string()];

        let out = build_subscriptions(statics, Subscriptions::new(), Some(&filter));
        let topics: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(topics, vec!["bar.y", "foo.x"]);
    }

    #[test]
    fn test_filter_is_substring_containment() {
        // filter "foo" matches "barfoo" too; containment is intentional
        let statics = bindings(&[("barfoo", 1), ("prefix", 2)]);
        let filter = vec!["foo".to_string()];

        let out = build_subscriptions(statics, Subscriptions::new(), Some(&filter));
        assert!(out.contains_key("barfoo"));
        assert!(!out.contains_key("prefix"));
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let statics = bindings(&[("a", 1), ("b", 2)]);
        let out = build_subscriptions(statics, Subscriptions::new(), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_result_after_filtering_is_valid() {
        let statics = bindings(&[("alpha", 1)]);
        let filter = vec!["zzz".to_string()];
        let out = build_subscriptions(statics, Subscriptions::new(), Some(&filter));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_overrides_static_on_collision() {
        let statics = bindings(&[("foo", 1), ("bar", 2)]);
        let dynamics = bindings(&[("foo", 10)]);

        let out = build_subscriptions(statics, dynamics, None);
        assert_eq!(tag_of(&out["foo"]).await, 10);
        assert_eq!(tag_of(&out["bar"]).await, 2);
    }
}
