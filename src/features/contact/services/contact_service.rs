use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientIdentifier;
use crate::features::contact::dtos::{ContactReceiptDto, ContactRequestDto};
use crate::features::rate_limits::{AdmissionController, PolicyKind};

use super::contact_notifier::{ContactNotifier, ContactSubmission};

pub struct ContactService {
    admission: Arc<AdmissionController>,
    notifier: Arc<dyn ContactNotifier>,
}

impl ContactService {
    pub fn new(admission: Arc<AdmissionController>, notifier: Arc<dyn ContactNotifier>) -> Self {
        Self {
            admission,
            notifier,
        }
    }

    /// Admit the caller under the contact policy and hand the request off.
    ///
    /// Expects an already validated DTO.
    pub async fn submit(
        &self,
        client: &ClientIdentifier,
        dto: ContactRequestDto,
    ) -> Result<ContactReceiptDto> {
        let decision = self.admission.admit(PolicyKind::Contact, client.as_str())?;

        let submission = ContactSubmission {
            id: Uuid::now_v7(),
            received_at: self.admission.now(),
            client: client.as_str().to_string(),
            name: dto.name,
            email: dto.email,
            phone: dto.phone.filter(|p| !p.trim().is_empty()),
            company: dto.company.filter(|c| !c.trim().is_empty()),
            message: dto.message,
        };

        self.notifier
            .notify(&submission)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        info!(
            id = %submission.id,
            remaining = decision.remaining,
            "Contact request accepted"
        );

        Ok(ContactReceiptDto {
            id: submission.id,
            received_at: submission.received_at,
        })
    }
}
