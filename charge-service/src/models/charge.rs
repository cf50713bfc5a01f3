//! Charge entities and the status transition table.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserSummary;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
    Boleto,
}

impl PaymentMethod {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::CreditCard => "CREDIT_CARD",
            Self::Boleto => "BOLETO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PIX" => Some(Self::Pix),
            "CREDIT_CARD" => Some(Self::CreditCard),
            "BOLETO" => Some(Self::Boleto),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Brl,
    Usd,
    Eur,
}

impl Default for Currency {
    fn default() -> Self {
        Self::Brl
    }
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brl => "BRL",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BRL" => Some(Self::Brl),
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Charge lifecycle status.
///
/// PENDING is the only initial state; FAILED, EXPIRED, CANCELLED and REFUNDED
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    Cancelled,
    Refunded,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "FAILED" => Some(Self::Failed),
            "EXPIRED" => Some(Self::Expired),
            "CANCELLED" => Some(Self::Cancelled),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Statuses reachable from this one.
    pub fn allowed_transitions(self) -> &'static [ChargeStatus] {
        match self {
            Self::Pending => &[Self::Paid, Self::Failed, Self::Expired, Self::Cancelled],
            Self::Paid => &[Self::Refunded],
            Self::Failed | Self::Expired | Self::Cancelled | Self::Refunded => &[],
        }
    }

    pub fn can_transition_to(self, requested: ChargeStatus) -> bool {
        self.allowed_transitions().contains(&requested)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One payment obligation tied to one user and one payment method.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Charge {
    pub charge_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub user_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub paid_utc: Option<DateTime<Utc>>,
    pub expires_utc: Option<DateTime<Utc>>,
}

impl Charge {
    pub fn parsed_status(&self) -> Option<ChargeStatus> {
        ChargeStatus::parse(&self.status)
    }

    pub fn parsed_method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.payment_method)
    }
}

/// PIX sub-record, owned 1:1 by a charge with `payment_method = PIX`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PixData {
    pub pix_id: Uuid,
    pub charge_id: Uuid,
    pub pix_key: Option<String>,
    pub expires_utc: DateTime<Utc>,
    pub qr_code: String,
    pub emv_code: String,
    pub created_utc: DateTime<Utc>,
}

/// Credit-card sub-record, owned 1:1 by a charge with `payment_method = CREDIT_CARD`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CreditCardData {
    pub card_id: Uuid,
    pub charge_id: Uuid,
    pub card_holder_name: String,
    pub card_last_digits: String,
    pub card_brand: String,
    pub installments: i32,
    pub installment_amount: Decimal,
    pub card_token: String,
    pub created_utc: DateTime<Utc>,
}

/// Boleto sub-record, owned 1:1 by a charge with `payment_method = BOLETO`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BoletoData {
    pub boleto_id: Uuid,
    pub charge_id: Uuid,
    pub due_date: NaiveDate,
    pub barcode: String,
    pub digitable_line: String,
    pub boleto_url: String,
    pub created_utc: DateTime<Utc>,
}

/// Charge joined with its payment sub-record and the owner projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeDetails {
    pub charge: Charge,
    pub pix_data: Option<PixData>,
    pub credit_card_data: Option<CreditCardData>,
    pub boleto_data: Option<BoletoData>,
    pub user: UserSummary,
}

/// Input for the transactional charge + sub-record insert. All derived
/// fields (expiry, installment amount, provider artifacts) are computed by
/// the service before this reaches the repository.
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub user_id: Uuid,
    pub expires_utc: Option<DateTime<Utc>>,
    pub payment_data: NewPaymentData,
}

/// Method-specific sub-record to insert alongside the charge.
#[derive(Debug, Clone)]
pub enum NewPaymentData {
    Pix {
        pix_key: Option<String>,
        expires_utc: DateTime<Utc>,
        qr_code: String,
        emv_code: String,
    },
    CreditCard {
        card_holder_name: String,
        card_last_digits: String,
        card_brand: String,
        installments: i32,
        installment_amount: Decimal,
        card_token: String,
    },
    Boleto {
        due_date: NaiveDate,
        barcode: String,
        digitable_line: String,
        boleto_url: String,
    },
}

/// Exact-match predicates for the charge listing; `None` applies no predicate.
#[derive(Debug, Clone, Default)]
pub struct ChargeFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<ChargeStatus>,
    pub payment_method: Option<PaymentMethod>,
}
