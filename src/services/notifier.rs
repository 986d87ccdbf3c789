use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{PaymentType, RevenueEntry, RevenueKind};
use crate::utils::period::YearMonth;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[axum::async_trait]
pub trait MailSink: Send + Sync {
    async fn send(&self, message: &MailMessage) -> AppResult<()>;
}

pub struct HttpMailSink {
    config: Config,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailSink {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[axum::async_trait]
impl MailSink for HttpMailSink {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        if !self.config.mail_enabled {
            tracing::info!(
                "Mail disabled. Message for {}: {}",
                message.to,
                message.subject
            );
            return Ok(());
        }

        let request = MailApiRequest {
            from: &self.config.mail_sender,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.config.mail_api_url)
            .bearer_auth(&self.config.mail_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Mail API error: {} - {}", status, body);
            return Err(AppError::Mail(format!("Mail API error: {}", status)));
        }

        tracing::info!("Mail sent to {}", message.to);
        Ok(())
    }
}

/// Adjustment carried from the previous month's rent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarryOver {
    pub payment_type: PaymentType,
    pub prepaid_amount: Decimal,
    pub adjusted_amount: Decimal,
}

/// Prepaid last month reduces what is due now; postpaid adds to it.
/// Nothing carries over without a previous rent entry that records both fields.
pub fn carry_over(entry: &RevenueEntry, previous: Option<&RevenueEntry>) -> Option<CarryOver> {
    if entry.kind != RevenueKind::Rent {
        return None;
    }
    let previous = previous.filter(|p| p.kind == RevenueKind::Rent)?;
    let payment_type = previous.payment_type?;
    let prepaid_amount = previous.prepaid_amount?;

    let adjusted_amount = match payment_type {
        PaymentType::Prepaid => entry.total_amount - prepaid_amount,
        PaymentType::Postpaid => entry.total_amount + prepaid_amount,
    };

    Some(CarryOver {
        payment_type,
        prepaid_amount,
        adjusted_amount,
    })
}

fn kind_label(kind: RevenueKind) -> &'static str {
    match kind {
        RevenueKind::RegistrationFee => "Registration fee",
        RevenueKind::Rent => "Rent",
    }
}

fn push_amount(lines: &mut Vec<String>, label: &str, amount: Option<Decimal>) {
    if let Some(amount) = amount {
        lines.push(format!("{}: {}", label, amount));
    }
}

pub fn compose_revenue_message(
    to: &str,
    entry: &RevenueEntry,
    customer_name: &str,
    previous: Option<&RevenueEntry>,
) -> MailMessage {
    let period = YearMonth {
        year: entry.year,
        month: entry.month as u32,
    };
    let subject = format!(
        "[Revenue] {} {} - {}",
        kind_label(entry.kind),
        period,
        customer_name
    );

    let mut lines = vec![
        format!("Customer: {}", customer_name),
        format!("Period: {}", period),
        format!("Kind: {}", kind_label(entry.kind)),
    ];

    match entry.kind {
        RevenueKind::RegistrationFee => {
            push_amount(&mut lines, "Deposit", entry.deposit);
            push_amount(&mut lines, "Deposit discount (%)", entry.deposit_discount_pct);
            push_amount(&mut lines, "Deposit after discount", entry.deposit_after);
            push_amount(&mut lines, "Initial fee", entry.initial_fee);
            push_amount(
                &mut lines,
                "Initial fee discount (%)",
                entry.initial_fee_discount_pct,
            );
            push_amount(&mut lines, "Initial fee after discount", entry.initial_fee_after);
        }
        RevenueKind::Rent => {
            push_amount(&mut lines, "Rent", entry.rent);
            push_amount(&mut lines, "Rent discount (%)", entry.rent_discount_pct);
            push_amount(&mut lines, "Rent after discount", entry.rent_after);
            push_amount(&mut lines, "Internet", entry.internet);
            push_amount(&mut lines, "Utilities", entry.utilities);
        }
    }

    lines.push(format!("Total: {}", entry.total_amount));

    if let Some(carry) = carry_over(entry, previous) {
        let label = match carry.payment_type {
            PaymentType::Prepaid => "Prepaid last month",
            PaymentType::Postpaid => "Unpaid from last month",
        };
        lines.push(format!("{}: {}", label, carry.prepaid_amount));
        lines.push(format!("Adjusted amount to pay: {}", carry.adjusted_amount));
    }

    if let Some(memo) = entry.memo.as_deref().filter(|m| !m.trim().is_empty()) {
        lines.push(format!("Memo: {}", memo));
    }

    MailMessage {
        to: to.to_string(),
        subject,
        body: lines.join("\n"),
    }
}

/// Best-effort dispatch of ledger notifications.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MailSink>,
    recipient: String,
    timeout: Duration,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MailSink>, recipient: String, timeout: Duration) -> Self {
        Self {
            sink,
            recipient,
            timeout,
        }
    }

    /// Returns whether the message was delivered. Failures and timeouts are
    /// logged here and never reach the caller.
    pub async fn revenue_posted(
        &self,
        entry: &RevenueEntry,
        customer_name: &str,
        previous: Option<&RevenueEntry>,
    ) -> bool {
        let message = compose_revenue_message(&self.recipient, entry, customer_name, previous);

        match tokio::time::timeout(self.timeout, self.sink.send(&message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Revenue notification for entry {} failed: {}", entry.id, e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "Revenue notification for entry {} timed out after {:?}",
                    entry.id,
                    self.timeout
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditStamps;
    use std::str::FromStr;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rent_entry(month: i32, total: &str) -> RevenueEntry {
        let now = chrono::Utc::now();
        RevenueEntry {
            id: Uuid::new_v4(),
            kind: RevenueKind::Rent,
            customer_id: Uuid::nil(),
            year: 2025,
            month,
            deposit: None,
            deposit_discount_pct: None,
            deposit_after: None,
            initial_fee: None,
            initial_fee_discount_pct: None,
            initial_fee_after: None,
            rent: Some(dec("50000")),
            rent_discount_pct: Some(dec("10")),
            rent_after: Some(dec("45000.00")),
            internet: Some(dec("3000")),
            utilities: Some(dec("2000")),
            total_amount: dec(total),
            payment_type: None,
            prepaid_amount: None,
            memo: Some("promo".to_string()),
            audit: AuditStamps {
                created_at: now,
                created_by: None,
                updated_at: now,
                updated_by: None,
            },
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<MailMessage>>,
    }

    #[axum::async_trait]
    impl MailSink for RecordingSink {
        async fn send(&self, message: &MailMessage) -> AppResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[axum::async_trait]
    impl MailSink for FailingSink {
        async fn send(&self, _message: &MailMessage) -> AppResult<()> {
            Err(AppError::Mail("smtp down".to_string()))
        }
    }

    struct SlowSink;

    #[axum::async_trait]
    impl MailSink for SlowSink {
        async fn send(&self, _message: &MailMessage) -> AppResult<()> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[test]
    fn test_prepaid_carry_over_subtracts() {
        let mut previous = rent_entry(2, "50000.00");
        previous.payment_type = Some(PaymentType::Prepaid);
        previous.prepaid_amount = Some(dec("10000"));
        let current = rent_entry(3, "50000.00");

        let carry = carry_over(&current, Some(&previous)).unwrap();
        assert_eq!(carry.adjusted_amount, dec("40000.00"));
    }

    #[test]
    fn test_postpaid_carry_over_adds() {
        let mut previous = rent_entry(2, "50000.00");
        previous.payment_type = Some(PaymentType::Postpaid);
        previous.prepaid_amount = Some(dec("5000"));
        let current = rent_entry(3, "50000.00");

        let carry = carry_over(&current, Some(&previous)).unwrap();
        assert_eq!(carry.adjusted_amount, dec("55000.00"));
    }

    #[test]
    fn test_no_carry_over_without_previous_fields() {
        let current = rent_entry(3, "50000.00");
        assert!(carry_over(&current, None).is_none());

        let mut previous = rent_entry(2, "50000.00");
        previous.payment_type = Some(PaymentType::Prepaid);
        assert!(carry_over(&current, Some(&previous)).is_none());
    }

    #[test]
    fn test_message_renders_carry_over_line() {
        let mut previous = rent_entry(2, "50000.00");
        previous.payment_type = Some(PaymentType::Prepaid);
        previous.prepaid_amount = Some(dec("10000"));
        let current = rent_entry(3, "50000.00");

        let message =
            compose_revenue_message("office@hostel.local", &current, "Tanaka", Some(&previous));
        assert_eq!(message.subject, "[Revenue] Rent 2025-03 - Tanaka");
        assert!(message.body.contains("Rent after discount: 45000.00"));
        assert!(message.body.contains("Adjusted amount to pay: 40000.00"));
        assert!(message.body.contains("Memo: promo"));

        let plain = compose_revenue_message("office@hostel.local", &current, "Tanaka", None);
        assert!(!plain.body.contains("Adjusted amount to pay"));
    }

    #[test]
    fn test_notifier_delivers_once() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(
            sink.clone(),
            "office@hostel.local".to_string(),
            Duration::from_secs(1),
        );
        let entry = rent_entry(3, "50000.00");

        let delivered = tokio_test::block_on(notifier.revenue_posted(&entry, "Tanaka", None));

        assert!(delivered);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_notifier_swallows_failure_and_timeout() {
        let entry = rent_entry(3, "50000.00");

        let failing = Notifier::new(
            Arc::new(FailingSink),
            "office@hostel.local".to_string(),
            Duration::from_secs(1),
        );
        assert!(!tokio_test::block_on(failing.revenue_posted(&entry, "Tanaka", None)));

        let slow = Notifier::new(
            Arc::new(SlowSink),
            "office@hostel.local".to_string(),
            Duration::from_millis(20),
        );
        assert!(!tokio_test::block_on(slow.revenue_posted(&entry, "Tanaka", None)));
    }
}
