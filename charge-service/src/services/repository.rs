//! Persistence adapter for charges and their payment sub-records.
//!
//! All sqlx errors are translated to the [`AppError`] taxonomy here; a unique
//! violation on `idempotency_key` becomes a Conflict whether it is caught by
//! the fast-path lookup or by the INSERT itself.

use charge_core::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    BoletoData, Charge, ChargeDetails, ChargeFilter, ChargeStatus, CreditCardData, NewCharge,
    NewPaymentData, PixData, UserSummary,
};
use crate::services::metrics::DB_QUERY_DURATION;

const CHARGE_DETAILS_SELECT: &str = r#"
    SELECT c.charge_id, c.amount, c.currency, c.payment_method, c.status,
           c.description, c.idempotency_key, c.user_id,
           c.created_utc, c.updated_utc, c.paid_utc, c.expires_utc,
           u.name AS user_name, u.email AS user_email,
           p.pix_id, p.pix_key, p.expires_utc AS pix_expires_utc,
           p.qr_code AS pix_qr_code, p.emv_code AS pix_emv_code,
           p.created_utc AS pix_created_utc,
           cc.card_id, cc.card_holder_name, cc.card_last_digits, cc.card_brand,
           cc.installments, cc.installment_amount, cc.card_token,
           cc.created_utc AS card_created_utc,
           b.boleto_id, b.due_date, b.barcode, b.digitable_line, b.boleto_url,
           b.created_utc AS boleto_created_utc
    FROM charges c
    JOIN users u ON u.user_id = c.user_id
    LEFT JOIN pix_data p ON p.charge_id = c.charge_id
    LEFT JOIN credit_card_data cc ON cc.charge_id = c.charge_id
    LEFT JOIN boleto_data b ON b.charge_id = c.charge_id
"#;

/// Flat projection of the charge + sub-record + owner join.
#[derive(Debug, FromRow)]
struct ChargeDetailsRow {
    charge_id: Uuid,
    amount: Decimal,
    currency: String,
    payment_method: String,
    status: String,
    description: Option<String>,
    idempotency_key: Option<String>,
    user_id: Uuid,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
    paid_utc: Option<DateTime<Utc>>,
    expires_utc: Option<DateTime<Utc>>,
    user_name: String,
    user_email: String,
    pix_id: Option<Uuid>,
    pix_key: Option<String>,
    pix_expires_utc: Option<DateTime<Utc>>,
    pix_qr_code: Option<String>,
    pix_emv_code: Option<String>,
    pix_created_utc: Option<DateTime<Utc>>,
    card_id: Option<Uuid>,
    card_holder_name: Option<String>,
    card_last_digits: Option<String>,
    card_brand: Option<String>,
    installments: Option<i32>,
    installment_amount: Option<Decimal>,
    card_token: Option<String>,
    card_created_utc: Option<DateTime<Utc>>,
    boleto_id: Option<Uuid>,
    due_date: Option<NaiveDate>,
    barcode: Option<String>,
    digitable_line: Option<String>,
    boleto_url: Option<String>,
    boleto_created_utc: Option<DateTime<Utc>>,
}

impl ChargeDetailsRow {
    fn into_details(self) -> ChargeDetails {
        let charge = Charge {
            charge_id: self.charge_id,
            amount: self.amount,
            currency: self.currency,
            payment_method: self.payment_method,
            status: self.status,
            description: self.description,
            idempotency_key: self.idempotency_key,
            user_id: self.user_id,
            created_utc: self.created_utc,
            updated_utc: self.updated_utc,
            paid_utc: self.paid_utc,
            expires_utc: self.expires_utc,
        };

        let pix_data = match (self.pix_id, self.pix_expires_utc) {
            (Some(pix_id), Some(expires_utc)) => Some(PixData {
                pix_id,
                charge_id: charge.charge_id,
                pix_key: self.pix_key,
                expires_utc,
                qr_code: self.pix_qr_code.unwrap_or_default(),
                emv_code: self.pix_emv_code.unwrap_or_default(),
                created_utc: self.pix_created_utc.unwrap_or(charge.created_utc),
            }),
            _ => None,
        };

        let credit_card_data = self.card_id.map(|card_id| CreditCardData {
            card_id,
            charge_id: charge.charge_id,
            card_holder_name: self.card_holder_name.unwrap_or_default(),
            card_last_digits: self.card_last_digits.unwrap_or_default(),
            card_brand: self.card_brand.unwrap_or_default(),
            installments: self.installments.unwrap_or(1),
            installment_amount: self.installment_amount.unwrap_or(charge.amount),
            card_token: self.card_token.unwrap_or_default(),
            created_utc: self.card_created_utc.unwrap_or(charge.created_utc),
        });

        let boleto_data = match (self.boleto_id, self.due_date) {
            (Some(boleto_id), Some(due_date)) => Some(BoletoData {
                boleto_id,
                charge_id: charge.charge_id,
                due_date,
                barcode: self.barcode.unwrap_or_default(),
                digitable_line: self.digitable_line.unwrap_or_default(),
                boleto_url: self.boleto_url.unwrap_or_default(),
                created_utc: self.boleto_created_utc.unwrap_or(charge.created_utc),
            }),
            _ => None,
        };

        let user = UserSummary {
            user_id: charge.user_id,
            name: self.user_name,
            email: self.user_email,
        };

        ChargeDetails {
            charge,
            pix_data,
            credit_card_data,
            boleto_data,
            user,
        }
    }
}

#[derive(Clone)]
pub struct ChargeRepository {
    pool: PgPool,
}

impl ChargeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a user owned by the auth collaborator.
    #[instrument(skip(self))]
    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<UserSummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user"])
            .start_timer();

        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT user_id, name, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to look up user: {e}")))?;

        timer.observe_duration();
        Ok(user)
    }

    /// Fast-path idempotency lookup. The unique constraint remains the
    /// authority; a race between this check and the insert is handled in
    /// [`Self::create_charge`].
    #[instrument(skip(self, key))]
    pub async fn idempotency_key_exists(&self, key: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["idempotency_key_exists"])
            .start_timer();

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT charge_id FROM charges WHERE idempotency_key = $1 LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to check idempotency: {e}")))?;

        timer.observe_duration();
        Ok(existing.is_some())
    }

    /// Insert the charge and its payment sub-record in one transaction with
    /// initial status PENDING.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, payment_method = %input.payment_method))]
    pub async fn create_charge(&self, input: &NewCharge) -> Result<ChargeDetails, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_charge"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to begin transaction: {e}")))?;

        let charge_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO charges
                (charge_id, amount, currency, payment_method, status,
                 description, idempotency_key, user_id, expires_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(charge_id)
        .bind(input.amount)
        .bind(input.currency.as_str())
        .bind(input.payment_method.as_str())
        .bind(ChargeStatus::Pending.as_str())
        .bind(&input.description)
        .bind(&input.idempotency_key)
        .bind(input.user_id)
        .bind(input.expires_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            // Idempotency race: another request won between check and insert.
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Idempotency key already used"))
            }
            _ => AppError::Database(anyhow::anyhow!("Failed to insert charge: {e}")),
        })?;

        match &input.payment_data {
            NewPaymentData::Pix {
                pix_key,
                expires_utc,
                qr_code,
                emv_code,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO pix_data
                        (pix_id, charge_id, pix_key, expires_utc, qr_code, emv_code)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(charge_id)
                .bind(pix_key)
                .bind(expires_utc)
                .bind(qr_code)
                .bind(emv_code)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::Database(anyhow::anyhow!("Failed to insert pix data: {e}"))
                })?;
            }
            NewPaymentData::CreditCard {
                card_holder_name,
                card_last_digits,
                card_brand,
                installments,
                installment_amount,
                card_token,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO credit_card_data
                        (card_id, charge_id, card_holder_name, card_last_digits,
                         card_brand, installments, installment_amount, card_token)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(charge_id)
                .bind(card_holder_name)
                .bind(card_last_digits)
                .bind(card_brand)
                .bind(installments)
                .bind(installment_amount)
                .bind(card_token)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::Database(anyhow::anyhow!("Failed to insert card data: {e}"))
                })?;
            }
            NewPaymentData::Boleto {
                due_date,
                barcode,
                digitable_line,
                boleto_url,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO boleto_data
                        (boleto_id, charge_id, due_date, barcode, digitable_line, boleto_url)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(charge_id)
                .bind(due_date)
                .bind(barcode)
                .bind(digitable_line)
                .bind(boleto_url)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::Database(anyhow::anyhow!("Failed to insert boleto data: {e}"))
                })?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to commit charge: {e}")))?;

        timer.observe_duration();

        self.get_charge(charge_id).await?.ok_or_else(|| {
            AppError::Database(anyhow::anyhow!("Charge vanished after insert: {charge_id}"))
        })
    }

    /// Filtered listing, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_charges(&self, filter: &ChargeFilter) -> Result<Vec<ChargeDetails>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_charges"])
            .start_timer();

        let query = format!(
            r#"{CHARGE_DETAILS_SELECT}
            WHERE ($1::uuid IS NULL OR c.user_id = $1)
              AND ($2::text IS NULL OR c.status = $2)
              AND ($3::text IS NULL OR c.payment_method = $3)
            ORDER BY c.created_utc DESC
            "#
        );

        let rows = sqlx::query_as::<_, ChargeDetailsRow>(&query)
            .bind(filter.user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.payment_method.map(|m| m.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to list charges: {e}")))?;

        timer.observe_duration();
        Ok(rows.into_iter().map(ChargeDetailsRow::into_details).collect())
    }

    /// Single charge with sub-record and owner projection.
    #[instrument(skip(self))]
    pub async fn get_charge(&self, charge_id: Uuid) -> Result<Option<ChargeDetails>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_charge"])
            .start_timer();

        let query = format!("{CHARGE_DETAILS_SELECT} WHERE c.charge_id = $1");

        let row = sqlx::query_as::<_, ChargeDetailsRow>(&query)
            .bind(charge_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to fetch charge: {e}")))?;

        timer.observe_duration();
        Ok(row.map(ChargeDetailsRow::into_details))
    }

    /// Guarded status write. The WHERE clause repeats the expected current
    /// status, so a concurrent transition surfaces as zero rows (treated as
    /// an invalid transition by the caller) instead of a silent overwrite.
    #[instrument(skip(self), fields(charge_id = %charge_id, to = %to))]
    pub async fn update_status(
        &self,
        charge_id: Uuid,
        from: ChargeStatus,
        to: ChargeStatus,
        paid_utc: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_status"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE charges
            SET status = $2,
                paid_utc = COALESCE($4, paid_utc),
                updated_utc = now()
            WHERE charge_id = $1 AND status = $3
            "#,
        )
        .bind(charge_id)
        .bind(to.as_str())
        .bind(from.as_str())
        .bind(paid_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to update status: {e}")))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
