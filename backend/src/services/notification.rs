//! Notification service for submission and lot emails
//!
//! Sends:
//! - a confirmation to the submitter
//! - a summary to the operator
//! - a "lot complete" notice to every participant of each lot closed
//!
//! Delivery failures are logged and swallowed: the intentions and lot
//! closures they announce are already written.

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::types::format_whole_euros;

use crate::config::MailConfig;
use crate::external::Mailer;
use crate::services::lot::ClosedLot;

/// One line of a submission recap
#[derive(Debug, Clone, PartialEq)]
pub struct RecapLine {
    pub case_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl RecapLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Per-unit lot progress reported to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct UnitProgress {
    pub case_slug: String,
    pub unit: u32,
    pub lot_number: i32,
    pub count: i64,
    pub min_participants: i32,
}

/// Everything the submission emails talk about
#[derive(Debug, Clone)]
pub struct SubmissionSummary {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub recap: Vec<RecapLine>,
    pub units: Vec<UnitProgress>,
    pub lots_completed: usize,
}

impl SubmissionSummary {
    pub fn total_quantity(&self) -> u32 {
        self.recap.iter().map(|l| l.quantity).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.recap.iter().map(RecapLine::subtotal).sum()
    }
}

/// A rendered email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// Notification service over a [`Mailer`]
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    operator_address: String,
    club_name: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, config: &MailConfig) -> Self {
        Self {
            mailer,
            operator_address: config.operator_address.clone(),
            club_name: config.club_name.clone(),
        }
    }

    /// Tell every participant of `lot` that it is complete.
    /// Returns how many notices were delivered.
    pub async fn notify_lot_completed(&self, lot: &ClosedLot) -> usize {
        let mut delivered = 0;
        for participant in &lot.participants {
            let content = lot_complete_email(&self.club_name, lot, &participant.name);
            if self.deliver(&participant.email, &content).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Confirm the submission to the submitter
    pub async fn send_confirmation(&self, summary: &SubmissionSummary) -> bool {
        let content = confirmation_email(&self.club_name, summary);
        self.deliver(&summary.email, &content).await
    }

    /// Summarize the submission for the operator
    pub async fn send_operator_summary(&self, summary: &SubmissionSummary) -> bool {
        let content = operator_summary_email(summary);
        self.deliver(&self.operator_address, &content).await
    }

    async fn deliver(&self, to: &str, content: &EmailContent) -> bool {
        match self.mailer.send(to, &content.subject, &content.body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(to = to, subject = %content.subject, error = %e, "Failed to send email");
                false
            }
        }
    }
}

fn plural(quantity: u32) -> &'static str {
    if quantity > 1 {
        "s"
    } else {
        ""
    }
}

fn recap_text(summary: &SubmissionSummary) -> String {
    summary
        .recap
        .iter()
        .map(|line| {
            format!(
                "• {}× {} - {} TTC",
                line.quantity,
                line.case_name,
                format_whole_euros(line.subtotal())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn total_text(summary: &SubmissionSummary) -> String {
    let quantity = summary.total_quantity();
    format!(
        "{} caisse{} - {} TTC",
        quantity,
        plural(quantity),
        format_whole_euros(summary.total_price())
    )
}

/// Email sent to each participant of a completed lot
pub fn lot_complete_email(club_name: &str, lot: &ClosedLot, participant_name: &str) -> EmailContent {
    let count = lot.participants.len();
    EmailContent {
        subject: format!(
            "Lot #{} {} complet ! {} intéressés atteints",
            lot.lot_number, lot.case.name, count
        ),
        body: format!(
            "Bonjour {},\n\n\
             Bonne nouvelle : le lot #{} pour {} est complet !\n\
             {} personnes sont maintenant intéressées par cette caisse. \
             Nous allons vous envoyer très prochainement le lien de paiement.\n\n\
             Prix : {} TTC\n\n\
             {}",
            participant_name,
            lot.lot_number,
            lot.case.name,
            count,
            format_whole_euros(lot.case.price),
            club_name
        ),
    }
}

/// Confirmation sent to the submitter
pub fn confirmation_email(club_name: &str, summary: &SubmissionSummary) -> EmailContent {
    EmailContent {
        subject: format!("Intention enregistrée - {}", club_name),
        body: format!(
            "Merci {} !\n\n\
             Votre intention de commande a bien été enregistrée.\n\n\
             Caisse(s) sélectionnée(s) :\n{}\n\n\
             Total : {}\n\n\
             Prochaines étapes : dès qu'un lot est complet, vous recevrez un lien de paiement par email.\n\n\
             {}",
            summary.name,
            recap_text(summary),
            total_text(summary),
            club_name
        ),
    }
}

/// Summary sent to the operator
pub fn operator_summary_email(summary: &SubmissionSummary) -> EmailContent {
    let quantity = summary.total_quantity();
    let mut body = format!(
        "Nouvelle intention de commande\n\n\
         Nom : {}\n\
         Email : {}\n\
         Téléphone : {}\n\n\
         Caisse(s) :\n{}\n\n\
         Total : {}\n",
        summary.name,
        summary.email,
        summary.phone.as_deref().unwrap_or("Non renseigné"),
        recap_text(summary),
        total_text(summary),
    );

    if let Some(message) = &summary.message {
        body.push_str(&format!("\nMessage : {}\n", message));
    }

    body.push_str("\nDétails des lots :\n");
    for unit in &summary.units {
        body.push_str(&format!(
            "- {} (unité {}) : Lot #{} - {}/{}\n",
            unit.case_slug, unit.unit, unit.lot_number, unit.count, unit.min_participants
        ));
    }

    if summary.lots_completed > 0 {
        body.push_str(&format!("\n{} lot(s) complété(s) !\n", summary.lots_completed));
    }

    EmailContent {
        subject: format!(
            "Nouvelle intention - {} ({} caisse{})",
            summary.name,
            quantity,
            plural(quantity)
        ),
        body,
    }
}
