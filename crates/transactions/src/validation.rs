//! Pre-commit validation.

use std::collections::HashSet;

use dealroom_auth::normalize_email;
use dealroom_core::{DomainError, DomainResult};

use crate::model::{CoreFields, TransactionRecord, TransactionType};

const TITLE_MAX: usize = 200;
const ADDRESS_MAX: usize = 255;
const EMAIL_MAX: usize = 254;

fn required_text(field: &str, value: &str, max: Option<usize>) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_field(field, format!("{field} is required")));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(DomainError::invalid_field(
                field,
                format!("{field} must be at most {max} characters"),
            ));
        }
    }
    Ok(())
}

impl CoreFields {
    pub fn validate(&self) -> DomainResult<()> {
        required_text("title", &self.title, Some(TITLE_MAX))?;
        required_text("property_description", &self.property_description, None)?;
        if let Some(address) = &self.property_address {
            if address.chars().count() > ADDRESS_MAX {
                return Err(DomainError::invalid_field(
                    "property_address",
                    format!("property_address must be at most {ADDRESS_MAX} characters"),
                ));
            }
        }
        if self.earnest_deposit > self.purchase_price {
            return Err(DomainError::invalid_field(
                "earnest_deposit",
                "Earnest deposit cannot exceed purchase price.",
            ));
        }
        if self.estimated_closing_date <= self.due_diligence_end_date {
            return Err(DomainError::invalid_field(
                "estimated_closing_date",
                "Estimated closing must be after due diligence end date.",
            ));
        }
        Ok(())
    }
}

/// Basic shape check for an invited address. Returns the normalized form.
pub fn validate_email(field: &str, value: &str) -> DomainResult<String> {
    let email = normalize_email(value);
    let invalid = || DomainError::invalid_field(field, format!("{field} must be a valid email address"));

    if email.is_empty() || email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(email)
}

impl TransactionRecord {
    /// Structural check run before every commit.
    pub fn validate(&self) -> DomainResult<()> {
        self.transaction.core.validate()?;

        match (self.transaction.kind, &self.commission_split) {
            (TransactionType::DoubleBrokerSplit, Some(split)) => split.check()?,
            (TransactionType::DoubleBrokerSplit, None) => {
                return Err(DomainError::invalid_state("double broker split without commission split"));
            }
            (_, Some(_)) => {
                return Err(DomainError::invalid_state(
                    "commission split only applies to double broker split transactions",
                ));
            }
            (_, None) => {}
        }

        let mut roles = HashSet::new();
        for participant in &self.participants {
            if participant.transaction_id != self.transaction.id {
                return Err(DomainError::invalid_state("participant belongs to another transaction"));
            }
            if !roles.insert(participant.role) {
                return Err(DomainError::invalid_state(format!(
                    "duplicate participant role {}",
                    participant.role
                )));
            }
            if participant.joined_at.is_some() && participant.user_id.is_none() {
                return Err(DomainError::invalid_state("joined participant has no bound user"));
            }
        }

        let mut invited = HashSet::new();
        let mut tokens = HashSet::new();
        for invitation in &self.invitations {
            if invitation.transaction_id != self.transaction.id
                || self.participant(invitation.participant_id).is_none()
            {
                return Err(DomainError::invalid_state("invitation has no matching participant"));
            }
            if !invited.insert(invitation.participant_id) {
                return Err(DomainError::invalid_state("participant has more than one invitation"));
            }
            if !tokens.insert(invitation.token.as_str()) {
                return Err(DomainError::invalid_state("duplicate invitation token"));
            }
        }

        let ordered = self
            .events
            .iter()
            .enumerate()
            .all(|(i, e)| e.sequence == i as u64 + 1 && e.transaction_id == self.transaction.id);
        if !ordered {
            return Err(DomainError::invalid_state("event log is out of order"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dealroom_core::Money;

    fn fields() -> CoreFields {
        CoreFields {
            title: "Deal".to_string(),
            property_description: "Lot".to_string(),
            purchase_price: Money::from_units(100_000),
            earnest_deposit: Money::from_units(100_000),
            due_diligence_end_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            estimated_closing_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            depositor_name: None,
            property_address: None,
        }
    }

    #[test]
    fn deposit_equal_to_price_is_allowed() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn deposit_above_price_names_earnest_deposit() {
        let mut f = fields();
        f.earnest_deposit = Money::from_cents(10_000_001);
        assert_eq!(f.validate().unwrap_err().field(), Some("earnest_deposit"));
    }

    #[test]
    fn closing_must_follow_due_diligence() {
        let mut f = fields();
        f.estimated_closing_date = f.due_diligence_end_date;
        assert_eq!(f.validate().unwrap_err().field(), Some("estimated_closing_date"));
    }

    #[test]
    fn title_is_required_and_bounded() {
        let mut f = fields();
        f.title = "   ".to_string();
        assert_eq!(f.validate().unwrap_err().field(), Some("title"));
        f.title = "x".repeat(201);
        assert_eq!(f.validate().unwrap_err().field(), Some("title"));
    }

    #[test]
    fn emails_are_normalized_and_checked() {
        assert_eq!(validate_email("buyer_email", " Buyer@Example.COM ").unwrap(), "buyer@example.com");
        for bad in ["", "buyer", "@example.com", "buyer@example", "a b@example.com", "a@b@c.com"] {
            assert_eq!(validate_email("buyer_email", bad).unwrap_err().field(), Some("buyer_email"));
        }
    }
}
