//! Charge orchestration: creation flow, read paths, status transitions.

use std::sync::Arc;

use charge_core::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::dtos::{ChargeQuery, ChargeResponse, CreateChargeRequest};
use crate::models::{ChargeFilter, ChargeStatus, NewCharge, NewPaymentData, PaymentMethod};
use crate::services::metrics::{CHARGES_CREATED, ERRORS_TOTAL, STATUS_TRANSITIONS};
use crate::services::provider::PaymentProvider;
use crate::services::repository::ChargeRepository;
use crate::services::validation::validate_payment_method_data;

/// Installment amount with banker's rounding to 2 decimals
/// (`MidpointNearestEven`, rust_decimal's default).
fn installment_amount(amount: Decimal, installments: i32) -> Decimal {
    (amount / Decimal::from(installments)).round_dp(2)
}

/// Count errors leaving the service, labeled by kind.
fn observe<T>(result: Result<T, AppError>) -> Result<T, AppError> {
    if let Err(ref err) = result {
        ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
    }
    result
}

#[derive(Clone)]
pub struct ChargeService {
    repository: ChargeRepository,
    provider: Arc<dyn PaymentProvider>,
}

impl ChargeService {
    pub fn new(repository: ChargeRepository, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            repository,
            provider,
        }
    }

    /// Create a charge with its payment sub-record: user check, idempotency
    /// fast path, payload matching, derived fields, then the transactional
    /// insert with initial status PENDING.
    pub async fn create(&self, request: CreateChargeRequest) -> Result<ChargeResponse, AppError> {
        observe(self.create_inner(request).await)
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, payment_method = %request.payment_method))]
    async fn create_inner(&self, request: CreateChargeRequest) -> Result<ChargeResponse, AppError> {
        let user = self
            .repository
            .find_user(request.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

        // Fast path only; the INSERT's unique constraint is the authority.
        if let Some(key) = &request.idempotency_key {
            if self.repository.idempotency_key_exists(key).await? {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Idempotency key already used"
                )));
            }
        }

        validate_payment_method_data(&request)?;

        let expires_utc = expiration_date(&request);
        let payment_data = self.build_payment_data(&request)?;

        let new_charge = NewCharge {
            amount: request.amount,
            currency: request.currency.unwrap_or_default(),
            payment_method: request.payment_method,
            description: request.description,
            idempotency_key: request.idempotency_key,
            user_id: user.user_id,
            expires_utc,
            payment_data,
        };

        let details = self.repository.create_charge(&new_charge).await?;

        CHARGES_CREATED
            .with_label_values(&[new_charge.payment_method.as_str()])
            .inc();
        tracing::info!(
            charge_id = %details.charge.charge_id,
            amount = %details.charge.amount,
            "Charge created"
        );

        Ok(details.into())
    }

    /// Filtered listing, newest first. Ownership scoping is the caller's
    /// responsibility.
    #[instrument(skip(self, query))]
    pub async fn find_all(&self, query: &ChargeQuery) -> Result<Vec<ChargeResponse>, AppError> {
        let filter = ChargeFilter {
            user_id: query.user_id,
            status: query.status,
            payment_method: query.payment_method,
        };

        let charges = observe(self.repository.list_charges(&filter).await)?;
        Ok(charges.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, charge_id: Uuid) -> Result<ChargeResponse, AppError> {
        let details = observe(self.repository.get_charge(charge_id).await.and_then(
            |charge| charge.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Charge not found"))),
        ))?;

        Ok(details.into())
    }

    /// Apply a status transition. The guard runs before the write; the write
    /// itself repeats the expected current status, so a lost race also
    /// surfaces as an invalid transition.
    pub async fn update_status(
        &self,
        charge_id: Uuid,
        requested: ChargeStatus,
    ) -> Result<ChargeResponse, AppError> {
        observe(self.update_status_inner(charge_id, requested).await)
    }

    #[instrument(skip(self), fields(charge_id = %charge_id, requested = %requested))]
    async fn update_status_inner(
        &self,
        charge_id: Uuid,
        requested: ChargeStatus,
    ) -> Result<ChargeResponse, AppError> {
        let details = self
            .repository
            .get_charge(charge_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Charge not found")))?;

        let current = details.charge.parsed_status().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Charge {charge_id} has unrecognized status '{}'",
                details.charge.status
            ))
        })?;

        if !current.can_transition_to(requested) {
            return Err(invalid_transition(current, requested));
        }

        let paid_utc: Option<DateTime<Utc>> =
            (requested == ChargeStatus::Paid).then(Utc::now);

        let updated = self
            .repository
            .update_status(charge_id, current, requested, paid_utc)
            .await?;
        if !updated {
            // Status changed under us between the read and the write.
            return Err(invalid_transition(current, requested));
        }

        STATUS_TRANSITIONS
            .with_label_values(&[requested.as_str()])
            .inc();
        tracing::info!(from = %current, to = %requested, "Charge status updated");

        self.find_one(charge_id).await
    }

    fn build_payment_data(
        &self,
        request: &CreateChargeRequest,
    ) -> Result<NewPaymentData, AppError> {
        let data = match request.payment_method {
            PaymentMethod::Pix => {
                let pix = request.pix_data.as_ref().ok_or_else(|| {
                    AppError::validation_field("pixData", "pixData is required")
                })?;
                let artifacts = self.provider.pix_artifacts();
                NewPaymentData::Pix {
                    pix_key: pix.pix_key.clone(),
                    expires_utc: pix.expires_at,
                    qr_code: artifacts.qr_code,
                    emv_code: artifacts.emv_code,
                }
            }
            PaymentMethod::CreditCard => {
                let card = request.credit_card_data.as_ref().ok_or_else(|| {
                    AppError::validation_field("creditCardData", "creditCardData is required")
                })?;
                let installments = card.installments.unwrap_or(1);
                NewPaymentData::CreditCard {
                    card_holder_name: card.card_holder_name.clone(),
                    card_last_digits: card.card_last_digits.clone(),
                    card_brand: card.card_brand.clone(),
                    installments,
                    installment_amount: installment_amount(request.amount, installments),
                    card_token: card.card_token.clone(),
                }
            }
            PaymentMethod::Boleto => {
                let boleto = request.boleto_data.as_ref().ok_or_else(|| {
                    AppError::validation_field("boletoData", "boletoData is required")
                })?;
                let artifacts = self.provider.boleto_artifacts();
                NewPaymentData::Boleto {
                    due_date: boleto.due_date,
                    barcode: artifacts.barcode,
                    digitable_line: artifacts.digitable_line,
                    boleto_url: artifacts.boleto_url,
                }
            }
        };

        Ok(data)
    }
}

/// PIX charges expire with the QR code, boleto charges on the due date,
/// credit-card charges never.
fn expiration_date(request: &CreateChargeRequest) -> Option<DateTime<Utc>> {
    match request.payment_method {
        PaymentMethod::Pix => request.pix_data.as_ref().map(|p| p.expires_at),
        PaymentMethod::Boleto => request
            .boleto_data
            .as_ref()
            .and_then(|b| b.due_date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc()),
        PaymentMethod::CreditCard => None,
    }
}

fn invalid_transition(current: ChargeStatus, requested: ChargeStatus) -> AppError {
    AppError::validation(format!(
        "Cannot change status from {current} to {requested}"
    ))
}
