//! # Mock Clients
//!
//! `MockClient<T>` hands out a real `ResourceClient<T>` whose requests are answered from a
//! queue of scripted expectations instead of an actor. Use it to test code that sits *around*
//! a client (an aggregate whose `on_create` consults another actor, a client wrapper that
//! interprets action results) without spawning the dependency.
//!
//! | | MockClient | Real actor |
//! |---|---|---|
//! | **State** | none, scripted replies | real store |
//! | **Error injection** | `return_err(..)` | needs a crafted state |
//! | **Use case** | logic around the client | the aggregate itself, end-to-end flows |
//!
//! ## Scripted replies
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Room { id: u32, seats: u32 }
//! #[derive(Debug)] struct RoomCreate;
//! #[derive(Debug)] struct RoomUpdate;
//! #[derive(Debug)] enum RoomAction {}
//! #[derive(Debug, thiserror::Error)] #[error("room error")] struct RoomError;
//!
//! #[async_trait]
//! impl ActorEntity for Room {
//!     type Id = u32; type Create = RoomCreate; type Update = RoomUpdate; type Delete = ();
//!     type Filter = (); type Action = RoomAction; type ActionResult = (); type Context = ();
//!     type Error = RoomError;
//!     fn from_create_params(id: u32, _: RoomCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, seats: 0 })
//!     }
//!     fn matches(&self, _: &()) -> bool { true }
//!     async fn on_update(&mut self, _: RoomUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     async fn handle_action(&mut self, _: RoomAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Room>::new();
//!     mock.expect_get(1).return_ok(Some(Room { id: 1, seats: 4 }));
//!     mock.expect_list().return_err(FrameworkError::ActorClosed);
//!
//!     let client = mock.client();
//!     assert_eq!(client.get(1).await.unwrap().unwrap().seats, 4);
//!     assert!(matches!(client.list(()).await, Err(FrameworkError::ActorClosed)));
//!     mock.verify();
//! }
//! ```
//!
//! ## Inspecting requests
//!
//! [`create_mock_client`] returns the raw receiver instead, for tests that need to assert on
//! the payload a wrapper sends (see [`expect_action`]).

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// One scripted reply, consumed in FIFO order.
enum Expectation<T: ActorEntity> {
    Get(Result<Option<T>, FrameworkError>),
    Create(Result<T::Id, FrameworkError>),
    List(Result<Vec<T>, FrameworkError>),
    Update(Result<T, FrameworkError>),
    Delete(Result<(), FrameworkError>),
    Action(Result<T::ActionResult, FrameworkError>),
}

impl<T: ActorEntity> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::Get(_) => "get",
            Expectation::Create(_) => "create",
            Expectation::List(_) => "list",
            Expectation::Update(_) => "update",
            Expectation::Delete(_) => "delete",
            Expectation::Action(_) => "action",
        }
    }
}

type ExpectationQueue<T> = Arc<Mutex<VecDeque<(Option<<T as ActorEntity>::Id>, Expectation<T>)>>>;

/// A mock client with expectation tracking.
///
/// Expectations are matched in order. A request that does not match the next expectation (by
/// kind, and by id when the expectation names one) panics the responder task, which surfaces
/// in the test as `FrameworkError::ActorDropped`.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: ExpectationQueue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: ExpectationQueue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().unwrap().pop_front();
                let Some((expected_id, expectation)) = next else {
                    panic!("Unexpected request: no expectations left");
                };
                let check_id = |actual: &T::Id| {
                    if let Some(expected) = &expected_id {
                        assert_eq!(expected, actual, "request for unexpected id");
                    }
                };

                match (request, expectation) {
                    (ResourceRequest::Get { id, respond_to }, Expectation::Get(response)) => {
                        check_id(&id);
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Create { respond_to, .. }, Expectation::Create(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to, .. }, Expectation::List(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Update { id, respond_to, .. },
                        Expectation::Update(response),
                    ) => {
                        check_id(&id);
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Delete { id, respond_to, .. },
                        Expectation::Delete(response),
                    ) => {
                        check_id(&id);
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action { id, respond_to, .. },
                        Expectation::Action(response),
                    ) => {
                        check_id(&id);
                        let _ = respond_to.send(response);
                    }
                    (_, expectation) => {
                        panic!(
                            "Expectation mismatch: next expectation was `{}`",
                            expectation.kind()
                        );
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(Some(id), Expectation::Get)
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(None, Expectation::Create)
    }

    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(None, Expectation::List)
    }

    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(Some(id), Expectation::Update)
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(Some(id), Expectation::Delete)
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(Some(id), Expectation::Action)
    }

    /// Panics unless every expectation has been consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn builder<R>(
        &self,
        id: Option<T::Id>,
        wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            id,
            wrap,
            expectations: self.expectations.clone(),
        }
    }
}

/// Completes an expectation with the reply the mock should send.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    id: Option<T::Id>,
    wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    expectations: ExpectationQueue<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.id, (self.wrap)(response)));
    }
}

// =============================================================================
// RAW RECEIVER HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// Lets a test drive the actor side by hand: read the request, assert on its payload, then
/// answer through the embedded responder.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is an Action.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is a List.
pub async fn expect_list<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Filter, oneshot::Sender<Result<Vec<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Badge {
        id: u32,
        label: String,
    }

    #[derive(Debug)]
    struct BadgeCreate {
        label: String,
    }

    #[derive(Debug)]
    struct BadgeUpdate;

    #[derive(Debug)]
    enum BadgeAction {
        Award,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Badge error")]
    struct BadgeError;

    #[async_trait]
    impl ActorEntity for Badge {
        type Id = u32;
        type Create = BadgeCreate;
        type Update = BadgeUpdate;
        type Delete = ();
        type Filter = Option<String>;
        type Action = BadgeAction;
        type ActionResult = u32;
        type Context = ();
        type Error = BadgeError;

        fn from_create_params(id: u32, params: BadgeCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                label: params.label,
            })
        }

        fn matches(&self, filter: &Option<String>) -> bool {
            filter.as_ref().map_or(true, |label| &self.label == label)
        }

        async fn on_update(&mut self, _: BadgeUpdate, _: &()) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn handle_action(&mut self, _: BadgeAction, _: &()) -> Result<u32, Self::Error> {
            Ok(1)
        }
    }

    fn badge(id: u32, label: &str) -> Badge {
        Badge {
            id,
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn test_raw_receiver_exposes_action_payload() {
        let (client, mut receiver) = create_mock_client::<Badge>(10);

        let task = tokio::spawn(async move { client.perform_action(7, BadgeAction::Award).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, 7);
        assert!(matches!(action, BadgeAction::Award));
        responder.send(Ok(3)).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_raw_receiver_exposes_list_filter() {
        let (client, mut receiver) = create_mock_client::<Badge>(10);

        let task = tokio::spawn(async move { client.list(Some("gold".to_string())).await });

        let (filter, responder) = expect_list(&mut receiver)
            .await
            .expect("Expected List request");
        assert_eq!(filter.as_deref(), Some("gold"));
        responder.send(Ok(vec![badge(1, "gold")])).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), vec![badge(1, "gold")]);
    }

    #[tokio::test]
    async fn test_expectations_are_served_in_order() {
        let mut mock = MockClient::<Badge>::new();
        mock.expect_create().return_ok(1);
        mock.expect_get(1).return_ok(Some(badge(1, "gold")));
        mock.expect_update(1).return_ok(badge(1, "gold"));
        mock.expect_delete(1).return_ok(());
        mock.expect_list().return_ok(vec![]);

        let client = mock.client();
        let id = client
            .create(BadgeCreate {
                label: "gold".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(client.get(1).await.unwrap(), Some(badge(1, "gold")));
        assert_eq!(client.update(1, BadgeUpdate).await.unwrap().label, "gold");
        client.delete(1, ()).await.unwrap();
        assert!(client.list(None).await.unwrap().is_empty());

        mock.verify();
    }

    #[tokio::test]
    async fn test_injected_error_reaches_caller() {
        let mut mock = MockClient::<Badge>::new();
        mock.expect_action(4)
            .return_err(FrameworkError::NotFound("4".to_string()));

        let result = mock.client().perform_action(4, BadgeAction::Award).await;
        assert!(matches!(result, Err(FrameworkError::NotFound(_))));
        mock.verify();
    }

    #[tokio::test]
    async fn test_mismatched_request_surfaces_as_dropped_reply() {
        let mut mock = MockClient::<Badge>::new();
        mock.expect_get(1).return_ok(None);

        let result = mock.client().list(None).await;
        assert!(matches!(result, Err(FrameworkError::ActorDropped)));
    }
}
