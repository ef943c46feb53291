//! Role-gated capability surfaces over the card and distribution services.
//!
//! Handlers never branch on a role string: they ask [`RationPortal`] for the
//! surface matching the verified [`Principal`]. Status transitions exist only
//! on [`AdminCapabilities`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cards::{
    AdminWorkflowEngine, ApplicationDetails, CardError, CardId, CardNumber, CardNumberGenerator,
    CardRepository, CardUpdate, RationCard, RationCardRegistry, Submission, VerificationAdapter,
};
use crate::config::{DistributionConfig, RegistryConfig};
use crate::tokens::{
    DeliveryLedger, DeliveryRecord, DistributionError, DistributionRequest, DistributionSummary,
    LedgerError, MessageTransport, TokenDistributionService,
};
use crate::users::{DirectoryError, Role, User, UserDirectory, UserId};

/// Verified caller identity supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn citizen(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("admin access required")]
    AdminRequired,
}

/// Adapters the portal is assembled from.
pub struct PortalPorts {
    pub cards: Arc<dyn CardRepository>,
    pub numbers: Arc<dyn CardNumberGenerator>,
    pub verifier: Arc<dyn VerificationAdapter>,
    pub users: Arc<dyn UserDirectory>,
    pub transport: Arc<dyn MessageTransport>,
    pub ledger: Arc<dyn DeliveryLedger>,
}

/// Entry point that hands out capability surfaces by role.
pub struct RationPortal {
    registry: RationCardRegistry,
    workflow: AdminWorkflowEngine,
    tokens: TokenDistributionService,
    users: Arc<dyn UserDirectory>,
}

impl RationPortal {
    pub fn new(
        registry: RationCardRegistry,
        workflow: AdminWorkflowEngine,
        tokens: TokenDistributionService,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            registry,
            workflow,
            tokens,
            users,
        }
    }

    pub fn from_ports(
        ports: PortalPorts,
        registry: &RegistryConfig,
        distribution: DistributionConfig,
    ) -> Self {
        let PortalPorts {
            cards,
            numbers,
            verifier,
            users,
            transport,
            ledger,
        } = ports;

        Self::new(
            RationCardRegistry::new(Arc::clone(&cards), verifier, registry),
            AdminWorkflowEngine::new(cards, numbers),
            TokenDistributionService::new(Arc::clone(&users), transport, ledger, distribution),
            users,
        )
    }

    /// Card-owner operations, scoped to the caller's own record.
    pub fn citizen(&self, principal: &Principal) -> CitizenCapabilities<'_> {
        CitizenCapabilities {
            portal: self,
            user_id: principal.user_id.clone(),
        }
    }

    pub fn admin(&self, principal: &Principal) -> Result<AdminCapabilities<'_>, AccessError> {
        match principal.role {
            Role::Admin => Ok(AdminCapabilities {
                portal: self,
                admin_id: principal.user_id.clone(),
            }),
            Role::User => {
                warn!(user_id = %principal.user_id, "admin surface requested without admin role");
                Err(AccessError::AdminRequired)
            }
        }
    }
}

pub struct CitizenCapabilities<'a> {
    portal: &'a RationPortal,
    user_id: UserId,
}

impl CitizenCapabilities<'_> {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn submit_application(
        &self,
        details: ApplicationDetails,
    ) -> Result<Submission, CardError> {
        self.portal
            .registry
            .submit_application(&self.user_id, details)
            .await
    }

    pub fn my_card(&self) -> Result<RationCard, CardError> {
        self.portal.registry.get_by_user(&self.user_id)
    }

    pub fn update_card(&self, update: CardUpdate) -> Result<RationCard, CardError> {
        self.portal.registry.update_details(&self.user_id, update)
    }
}

pub struct AdminCapabilities<'a> {
    portal: &'a RationPortal,
    admin_id: UserId,
}

impl AdminCapabilities<'_> {
    pub fn admin_id(&self) -> &UserId {
        &self.admin_id
    }

    pub fn list_cards(&self) -> Result<Vec<RationCard>, CardError> {
        self.portal.registry.list_all()
    }

    pub fn card(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.portal.registry.get(card_id)
    }

    pub fn approve(&self, card_id: &CardId) -> Result<CardNumber, CardError> {
        self.portal.workflow.approve(card_id)
    }

    pub fn reject(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.portal.workflow.reject(card_id)
    }

    pub fn flag_fake(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.portal.workflow.flag_fake(card_id)
    }

    pub fn delete_card(&self, card_id: &CardId) -> Result<RationCard, CardError> {
        self.portal.workflow.delete_card(card_id)
    }

    /// Citizens offered for recipient selection, read straight from the directory.
    pub fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        self.portal.users.list_citizens()
    }

    pub async fn distribute_tokens(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionSummary, DistributionError> {
        self.portal.tokens.distribute(request).await
    }

    pub fn deliveries(&self) -> Result<Vec<DeliveryRecord>, LedgerError> {
        self.portal.tokens.deliveries()
    }
}
