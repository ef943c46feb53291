use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::UserId;

/// Identifier wrapper for stored ration cards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number printed on an approved card.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(pub String);

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Pending,
    Approved,
    Rejected,
    Fake,
}

impl CardStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CardStatus::Pending => "pending",
            CardStatus::Approved => "approved",
            CardStatus::Rejected => "rejected",
            CardStatus::Fake => "fake",
        }
    }

    /// Resolves the status reached by `action`, or the reason it is refused.
    ///
    /// Only `pending` cards move; `approved`, `rejected` and `fake` are terminal
    /// apart from deletion, which is record removal rather than a status.
    pub fn after(self, action: CardAction) -> Result<CardStatus, TransitionError> {
        let next = match (self, action) {
            (CardStatus::Pending, CardAction::Approve) => CardStatus::Approved,
            (CardStatus::Pending, CardAction::Reject) => CardStatus::Rejected,
            (CardStatus::Pending, CardAction::FlagFake) => CardStatus::Fake,
            (CardStatus::Pending | CardStatus::Approved, CardAction::Update) => self,
            (from, action) => return Err(TransitionError { from, action }),
        };
        Ok(next)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operations that are checked against the status state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Approve,
    Reject,
    FlagFake,
    Update,
}

impl CardAction {
    pub const fn label(self) -> &'static str {
        match self {
            CardAction::Approve => "approve",
            CardAction::Reject => "reject",
            CardAction::FlagFake => "flag as fake",
            CardAction::Update => "update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a card that is {from}", .action.label())]
pub struct TransitionError {
    pub from: CardStatus,
    pub action: CardAction,
}

/// Input validation failures for applications and updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("aadhaar must be exactly 12 digits")]
    InvalidAadhaar,
    #[error("family members must be at least 1")]
    NoFamilyMembers,
    #[error("update contains no fields")]
    EmptyUpdate,
}

/// Applicant-provided details captured on submission.
///
/// `income_proof` and `photo` are references into external document storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub name: String,
    pub address: String,
    pub family_members: u32,
    pub aadhaar: String,
    pub income_proof: String,
    pub photo: String,
}

impl ApplicationDetails {
    /// Trims text fields and checks every field is usable.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required("name", self.name)?,
            address: required("address", self.address)?,
            family_members: family_members(self.family_members)?,
            aadhaar: aadhaar(self.aadhaar)?,
            income_proof: required("income_proof", self.income_proof)?,
            photo: required("photo", self.photo)?,
        })
    }
}

/// Partial update sent by the card owner; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub family_members: Option<u32>,
    #[serde(default)]
    pub aadhaar: Option<String>,
    #[serde(default)]
    pub income_proof: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl CardUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let update = Self {
            name: self.name.map(|value| required("name", value)).transpose()?,
            address: self
                .address
                .map(|value| required("address", value))
                .transpose()?,
            family_members: self.family_members.map(family_members).transpose()?,
            aadhaar: self.aadhaar.map(aadhaar).transpose()?,
            income_proof: self
                .income_proof
                .map(|value| required("income_proof", value))
                .transpose()?,
            photo: self.photo.map(|value| required("photo", value)).transpose()?,
        };

        if update == Self::default() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(update)
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn family_members(count: u32) -> Result<u32, ValidationError> {
    if count == 0 {
        return Err(ValidationError::NoFamilyMembers);
    }
    Ok(count)
}

fn aadhaar(value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() == 12 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidAadhaar)
    }
}

/// Authoritative ration card record.
///
/// `status` and `card_number` are private so that every change goes through
/// the transition methods, which keep `card_number` present exactly when the
/// card is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RationCard {
    pub id: CardId,
    pub user_id: UserId,
    pub name: String,
    pub address: String,
    pub family_members: u32,
    pub aadhaar: String,
    pub income_proof: String,
    pub photo: String,
    status: CardStatus,
    card_number: Option<CardNumber>,
    pub ai_verification_result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RationCard {
    /// Opens a new application in `pending`, or in `fake` when the intake
    /// screening flagged it.
    pub fn open(
        user_id: UserId,
        details: ApplicationDetails,
        verification: Option<String>,
        flagged: bool,
    ) -> Self {
        let now = Utc::now();
        let ApplicationDetails {
            name,
            address,
            family_members,
            aadhaar,
            income_proof,
            photo,
        } = details;

        Self {
            id: CardId::generate(),
            user_id,
            name,
            address,
            family_members,
            aadhaar,
            income_proof,
            photo,
            status: if flagged {
                CardStatus::Fake
            } else {
                CardStatus::Pending
            },
            card_number: None,
            ai_verification_result: verification,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> CardStatus {
        self.status
    }

    pub fn card_number(&self) -> Option<&CardNumber> {
        self.card_number.as_ref()
    }

    /// Checks `action` is permitted without changing the record.
    pub fn check(&self, action: CardAction) -> Result<(), TransitionError> {
        self.status.after(action).map(|_| ())
    }

    /// Moves a pending card to `approved` together with its number.
    pub fn approve(&mut self, number: CardNumber) -> Result<(), TransitionError> {
        self.status = self.status.after(CardAction::Approve)?;
        self.card_number = Some(number);
        self.touch();
        Ok(())
    }

    /// Applies a transition that does not issue a number (reject, flag as fake).
    pub fn settle(&mut self, action: CardAction) -> Result<(), TransitionError> {
        if matches!(action, CardAction::Approve | CardAction::Update) {
            return Err(TransitionError {
                from: self.status,
                action,
            });
        }
        self.status = self.status.after(action)?;
        self.touch();
        Ok(())
    }

    /// Applies owner-provided changes; status and number are left untouched.
    pub fn revise(&mut self, update: CardUpdate) -> Result<(), TransitionError> {
        self.check(CardAction::Update)?;

        let CardUpdate {
            name,
            address,
            family_members,
            aadhaar,
            income_proof,
            photo,
        } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(count) = family_members {
            self.family_members = count;
        }
        if let Some(aadhaar) = aadhaar {
            self.aadhaar = aadhaar;
        }
        if let Some(reference) = income_proof {
            self.income_proof = reference;
        }
        if let Some(reference) = photo {
            self.photo = reference;
        }
        self.touch();
        Ok(())
    }

    /// `card_number` is present if and only if the card is approved.
    pub fn number_matches_status(&self) -> bool {
        self.card_number.is_some() == (self.status == CardStatus::Approved)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
