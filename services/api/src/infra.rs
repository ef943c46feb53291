use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use ration_card::access::{PortalPorts, Principal, RationPortal};
use ration_card::api::StaticSessions;
use ration_card::cards::{
    generator_for, ApplicationDetails, InMemoryCardStore, VerificationAdapter, VerificationError,
    Verdict,
};
use ration_card::config::{DistributionConfig, RegistryConfig};
use ration_card::error::AppError;
use ration_card::tokens::{InMemoryDeliveryLedger, MessageTransport, TransportError};
use ration_card::users::{InMemoryUserDirectory, User, UserDirectory, UserId};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the in-memory adapters into a portal.
pub(crate) fn build_portal(
    registry: &RegistryConfig,
    distribution: DistributionConfig,
    users: Arc<dyn UserDirectory>,
    transport: Arc<dyn MessageTransport>,
) -> RationPortal {
    RationPortal::from_ports(
        PortalPorts {
            cards: Arc::new(InMemoryCardStore::default()),
            numbers: generator_for(registry),
            verifier: Arc::new(ScreeningRulesVerifier::default()),
            users,
            transport,
            ledger: Arc::new(InMemoryDeliveryLedger::default()),
        },
        registry,
        distribution,
    )
}

/// Writes outgoing SMS to the log instead of a carrier gateway.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingTransport;

#[async_trait]
impl MessageTransport for LoggingTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
        info!(phone = %mask_phone(phone), body, "sms dispatched");
        Ok(())
    }
}

fn mask_phone(phone: &str) -> String {
    let visible: String = phone
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{visible}")
}

/// Rule-based stand-in for the hosted fraud model.
///
/// Flags repeated-digit aadhaar numbers, implausible household sizes,
/// incomplete addresses, and names carrying digits.
#[derive(Debug, Clone)]
pub(crate) struct ScreeningRulesVerifier {
    max_plausible_family: u32,
    min_address_words: usize,
}

impl Default for ScreeningRulesVerifier {
    fn default() -> Self {
        Self {
            max_plausible_family: 20,
            min_address_words: 3,
        }
    }
}

impl ScreeningRulesVerifier {
    fn findings(&self, details: &ApplicationDetails) -> Vec<String> {
        let mut findings = Vec::new();

        let aadhaar = details.aadhaar.trim();
        if aadhaar.len() != 12 || !aadhaar.bytes().all(|byte| byte.is_ascii_digit()) {
            findings.push("aadhaar is not a 12 digit number".to_string());
        } else if aadhaar.bytes().all(|byte| byte == aadhaar.as_bytes()[0]) {
            findings.push("aadhaar is a repeated-digit placeholder".to_string());
        }

        if details.family_members > self.max_plausible_family {
            findings.push(format!(
                "family of {} exceeds plausible household size",
                details.family_members
            ));
        }

        if details.address.split_whitespace().count() < self.min_address_words {
            findings.push("address looks incomplete".to_string());
        }

        if details.name.chars().any(|c| c.is_ascii_digit()) {
            findings.push("name contains digits".to_string());
        }

        findings
    }
}

#[async_trait]
impl VerificationAdapter for ScreeningRulesVerifier {
    async fn verify(&self, details: &ApplicationDetails) -> Result<Verdict, VerificationError> {
        let findings = self.findings(details);
        if findings.is_empty() {
            Ok(Verdict::Genuine(
                "GENUINE: aadhaar format, household size and address look consistent".to_string(),
            ))
        } else {
            Ok(Verdict::Fraud(format!("FAKE: {}", findings.join("; "))))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    sessions: Vec<SeedSession>,
}

#[derive(Debug, Deserialize)]
struct SeedSession {
    token: String,
    user_id: UserId,
}

/// Identity records and bearer tokens loaded at startup.
#[derive(Debug, Default)]
pub(crate) struct SeedData {
    pub(crate) users: InMemoryUserDirectory,
    pub(crate) sessions: StaticSessions,
}

pub(crate) fn load_seed(path: &Path) -> Result<SeedData, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_seed(&raw)
}

/// Sessions take the role of the user they point at.
pub(crate) fn parse_seed(raw: &str) -> Result<SeedData, AppError> {
    let seed: SeedFile = serde_json::from_str(raw)?;
    let users = InMemoryUserDirectory::with_users(seed.users);

    let mut sessions = Vec::with_capacity(seed.sessions.len());
    for session in seed.sessions {
        let user = users
            .find(&session.user_id)
            .map_err(|err| AppError::Seed(err.to_string()))?
            .ok_or_else(|| {
                AppError::Seed(format!("session refers to unknown user {}", session.user_id))
            })?;
        sessions.push((
            session.token,
            Principal {
                user_id: user.id,
                role: user.role,
            },
        ));
    }

    Ok(SeedData {
        users,
        sessions: StaticSessions::with_sessions(sessions),
    })
}
