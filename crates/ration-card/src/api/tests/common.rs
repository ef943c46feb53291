use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use serde_json::Value;

use crate::access::{PortalPorts, Principal, RationPortal};
use crate::api::{ration_card_router, ApiState, StaticSessions};
use crate::cards::{
    ApplicationDetails, InMemoryCardStore, SequentialCardNumbers, VerificationAdapter,
    VerificationError, Verdict,
};
use crate::config::{DistributionConfig, RegistryConfig};
use crate::tokens::{InMemoryDeliveryLedger, MessageTransport, TransportError};
use crate::users::{InMemoryUserDirectory, Role, User, UserId};

pub(super) const CITIZEN_TOKEN: &str = "citizen-token";
pub(super) const OTHER_CITIZEN_TOKEN: &str = "other-citizen-token";
pub(super) const ADMIN_TOKEN: &str = "admin-token";

pub(super) struct GenuineVerifier;

#[async_trait]
impl VerificationAdapter for GenuineVerifier {
    async fn verify(&self, _details: &ApplicationDetails) -> Result<Verdict, VerificationError> {
        Ok(Verdict::Genuine("GENUINE: details consistent".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryTransport {
    pub(super) failing: HashSet<String>,
    pub(super) sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
        if self.failing.contains(phone) {
            return Err(TransportError::Rejected("number blocked".to_string()));
        }
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push((phone.to_string(), body.to_string()));
        Ok(())
    }
}

pub(super) fn user(id: &str, role: Role, phone: &str) -> User {
    User {
        id: UserId::new(id),
        name: format!("Resident {id}"),
        email: format!("{id}@example.org"),
        phone: phone.to_string(),
        role,
        created_at: Utc::now(),
    }
}

pub(super) fn details() -> ApplicationDetails {
    ApplicationDetails {
        name: "A".to_string(),
        address: "12 Market Road, Ward 4".to_string(),
        family_members: 3,
        aadhaar: "123456789012".to_string(),
        income_proof: "uploads/income-u1.pdf".to_string(),
        photo: "uploads/photo-u1.jpg".to_string(),
    }
}

pub(super) fn app_with_transport(transport: MemoryTransport) -> (Router, Arc<MemoryTransport>) {
    let transport = Arc::new(transport);
    let users = Arc::new(InMemoryUserDirectory::with_users([
        user("u1", Role::User, "+919000000001"),
        user("u2", Role::User, "+919000000002"),
        user("admin", Role::Admin, "+919000000099"),
    ]));

    let portal = RationPortal::from_ports(
        PortalPorts {
            cards: Arc::new(InMemoryCardStore::default()),
            numbers: Arc::new(SequentialCardNumbers::new("RC", 1)),
            verifier: Arc::new(GenuineVerifier),
            users,
            transport: transport.clone(),
            ledger: Arc::new(InMemoryDeliveryLedger::default()),
        },
        &RegistryConfig::default(),
        DistributionConfig::default(),
    );

    let sessions = StaticSessions::with_sessions([
        (CITIZEN_TOKEN.to_string(), Principal::citizen("u1")),
        (OTHER_CITIZEN_TOKEN.to_string(), Principal::citizen("u2")),
        (ADMIN_TOKEN.to_string(), Principal::admin("admin")),
    ]);

    let router = ration_card_router(ApiState::new(Arc::new(portal), Arc::new(sessions)));
    (router, transport)
}

pub(super) fn app() -> Router {
    app_with_transport(MemoryTransport::default()).0
}

pub(super) fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&payload).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
