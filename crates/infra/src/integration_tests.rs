//! Integration tests for the full lifecycle pipeline.
//!
//! Tests: LifecycleService → TransactionStore → EventBus
//!
//! Verifies:
//! - Creation and acceptance scenarios end in the expected status/stage
//! - Failed operations persist nothing (except invitation expiry)
//! - Concurrent accepts of one token serialize
//! - Concurrent accepts of different invitations both land

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use serde_json::{Value as JsonValue, json};

    use dealroom_auth::Actor;
    use dealroom_core::{AggregateRoot, DomainError, FixedClock, Money, TransactionId};
    use dealroom_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
    use dealroom_transactions::{
        CoreFields, CreateTransaction, InvitationStatus, ParticipantRole, Stage,
        TransactionEventType, TransactionRecord, TransactionStatus,
    };

    use crate::config::LifecycleConfig;
    use crate::lifecycle::{LifecycleError, LifecycleService};
    use crate::store::{InMemoryTransactionStore, TransactionStore};

    type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
    type Service = LifecycleService<Arc<InMemoryTransactionStore>, Bus, Arc<FixedClock>>;

    struct Harness {
        service: Service,
        store: Arc<InMemoryTransactionStore>,
        clock: Arc<FixedClock>,
        events: Subscription<EventEnvelope<JsonValue>>,
    }

    fn setup() -> Harness {
        let store = Arc::new(InMemoryTransactionStore::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()));
        let service = LifecycleService::with_clock(store.clone(), bus, clock.clone(), LifecycleConfig::default());
        Harness {
            service,
            store,
            clock,
            events,
        }
    }

    fn core_fields() -> CoreFields {
        CoreFields {
            title: "Oak Avenue".to_string(),
            property_description: "Detached house with garden".to_string(),
            purchase_price: Money::from_units(100_000),
            earnest_deposit: Money::from_units(5_000),
            due_diligence_end_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            estimated_closing_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            depositor_name: Some("First Escrow".to_string()),
            property_address: Some("12 Oak Avenue".to_string()),
        }
    }

    fn single_sale() -> CreateTransaction {
        CreateTransaction {
            kind: "single_broker_sale".to_string(),
            core: core_fields(),
            payload: json!({ "buyer_email": "buyer@example.com", "seller_email": "seller@example.com" })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    fn double_split() -> CreateTransaction {
        CreateTransaction {
            kind: "double_broker_split".to_string(),
            core: core_fields(),
            payload: json!({
                "known_party_role": "seller",
                "known_party_email": "seller@example.com",
                "secondary_broker_email": "second@example.com",
            })
            .as_object()
            .cloned()
            .unwrap(),
        }
    }

    fn token(record: &TransactionRecord, role: ParticipantRole) -> String {
        let participant = record.participant_by_role(role).unwrap();
        record.invitation_for(participant.id).unwrap().token.clone()
    }

    fn stored(h: &Harness, id: TransactionId) -> TransactionRecord {
        h.store.load(id).unwrap().unwrap()
    }

    fn domain_err(err: LifecycleError) -> DomainError {
        match err {
            LifecycleError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn non_broker_creation_is_forbidden_and_persists_nothing() {
        let h = setup();
        let err = h
            .service
            .create_transaction(&Actor::user("buyer@example.com"), &single_sale())
            .unwrap_err();

        assert!(matches!(domain_err(err), DomainError::Forbidden(_)));
        assert!(h.store.is_empty());
        assert!(h.events.drain().is_empty());
    }

    #[test]
    fn invalid_deposit_persists_nothing() {
        let h = setup();
        let mut request = single_sale();
        request.core.earnest_deposit = Money::from_units(100_001);

        let err = domain_err(
            h.service
                .create_transaction(&Actor::broker("b@example.com"), &request)
                .unwrap_err(),
        );
        assert_eq!(err.field(), Some("earnest_deposit"));
        assert!(h.store.is_empty());
    }

    #[test]
    fn single_broker_sale_scenario() {
        let h = setup();
        let broker = Actor::broker("b@example.com");
        let created = h.service.create_transaction(&broker, &single_sale()).unwrap();
        let id = created.transaction().id;

        assert_eq!(created.participants().len(), 3);
        assert_eq!(created.invitations().len(), 2);
        assert_eq!(created.transaction().status, TransactionStatus::Inviting);

        h.service
            .accept_invitation(&token(&created, ParticipantRole::Buyer), &Actor::user("buyer@example.com"))
            .unwrap();
        let accepted = h
            .service
            .accept_invitation(&token(&created, ParticipantRole::Seller), &Actor::user("seller@example.com"))
            .unwrap();

        assert_eq!(accepted.transaction.status, TransactionStatus::Active);
        assert_eq!(accepted.transaction.stage, Stage::PendingUserInformation);

        let record = stored(&h, id);
        assert_eq!(record.events_of_type(TransactionEventType::StageChanged).count(), 1);
        assert_eq!(record.events_of_type(TransactionEventType::InvitationAccepted).count(), 2);

        let published = h.events.drain();
        assert_eq!(published.len(), record.events().len());
        let sequences: Vec<u64> = published.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequences, (1..=record.events().len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn double_broker_scenario() {
        let h = setup();
        let primary = Actor::broker("b@example.com");
        let secondary = Actor::broker("second@example.com");
        let created = h.service.create_transaction(&primary, &double_split()).unwrap();
        let id = created.transaction().id;
        assert_eq!(created.participants().len(), 3);
        assert_eq!(created.invitations().len(), 2);
        assert!(!created.has_role(ParticipantRole::Buyer));

        h.service
            .accept_invitation(&token(&created, ParticipantRole::BrokerSecondary), &secondary)
            .unwrap();
        h.service
            .accept_invitation(&token(&created, ParticipantRole::Seller), &Actor::user("seller@example.com"))
            .unwrap();
        assert_eq!(stored(&h, id).transaction().stage, Stage::PendingInvitations);

        let invited = h
            .service
            .invite_counterparty(id, &secondary, "buyer@example.com")
            .unwrap();
        assert_eq!(invited.participant.role, ParticipantRole::Buyer);

        let accepted = h
            .service
            .accept_invitation(&invited.invitation.token, &Actor::user("buyer@example.com"))
            .unwrap();
        assert_eq!(accepted.transaction.status, TransactionStatus::Active);

        let record = stored(&h, id);
        assert!(record.events_of_type(TransactionEventType::InvitationSent).count() >= 3);
        assert!(record.events_of_type(TransactionEventType::InvitationAccepted).count() >= 3);
        assert_eq!(record.events_of_type(TransactionEventType::CounterpartyInvited).count(), 1);
        assert_eq!(record.events_of_type(TransactionEventType::StageChanged).count(), 1);
        assert_eq!(record.transaction().stage, Stage::PendingUserInformation);
    }

    #[test]
    fn secondary_broker_invitation_rejects_non_broker_without_consuming_it() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &double_split())
            .unwrap();
        let secondary_token = token(&created, ParticipantRole::BrokerSecondary);

        let err = h
            .service
            .accept_invitation(&secondary_token, &Actor::user("second@example.com"))
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::Forbidden(_)));

        let record = stored(&h, created.transaction().id);
        assert_eq!(
            record.invitation_by_token(&secondary_token).unwrap().status,
            InvitationStatus::Pending
        );
        assert_eq!(record.version(), created.version());
    }

    #[test]
    fn expired_invitation_fails_once_then_is_invalid_state() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &single_sale())
            .unwrap();
        let buyer_token = token(&created, ParticipantRole::Buyer);
        let buyer = Actor::user("buyer@example.com");

        h.clock.advance(Duration::days(7) + Duration::seconds(1));
        let err = h.service.accept_invitation(&buyer_token, &buyer).unwrap_err();
        assert_eq!(domain_err(err), DomainError::Expired);

        let record = stored(&h, created.transaction().id);
        assert_eq!(
            record.invitation_by_token(&buyer_token).unwrap().status,
            InvitationStatus::Expired
        );

        let err = h.service.accept_invitation(&buyer_token, &buyer).unwrap_err();
        assert!(matches!(domain_err(err), DomainError::InvalidState(_)));
    }

    #[test]
    fn invitation_is_still_valid_at_expiry_instant() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &single_sale())
            .unwrap();

        h.clock.advance(Duration::days(7));
        assert!(
            h.service
                .accept_invitation(&token(&created, ParticipantRole::Buyer), &Actor::user("buyer@example.com"))
                .is_ok()
        );
    }

    #[test]
    fn unknown_token_is_not_found() {
        let h = setup();
        let err = h
            .service
            .accept_invitation("does-not-exist", &Actor::user("x@example.com"))
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::NotFound(_)));
    }

    #[test]
    fn concurrent_accepts_of_one_token_serialize() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &single_sale())
            .unwrap();
        let buyer_token = token(&created, ParticipantRole::Buyer);
        let barrier = Barrier::new(2);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|i| {
                    let service = &h.service;
                    let barrier = &barrier;
                    let buyer_token = &buyer_token;
                    scope.spawn(move || {
                        let user = Actor::user(format!("racer{i}@example.com"));
                        barrier.wait();
                        service.accept_invitation(buyer_token, &user)
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        let loser = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(domain_err(loser), DomainError::InvalidState(_)));

        let record = stored(&h, created.transaction().id);
        assert_eq!(record.events_of_type(TransactionEventType::InvitationAccepted).count(), 1);
    }

    #[test]
    fn visibility_follows_acceptance() {
        let h = setup();
        let broker = Actor::broker("b@example.com");
        let buyer = Actor::user("buyer@example.com");
        let created = h.service.create_transaction(&broker, &single_sale()).unwrap();
        let id = created.transaction().id;

        assert!(h.service.list_transactions(&buyer).unwrap().is_empty());
        let err = h.service.get_transaction(id, &buyer).unwrap_err();
        assert!(matches!(domain_err(err), DomainError::NotFound(_)));

        h.service
            .accept_invitation(&token(&created, ParticipantRole::Buyer), &buyer)
            .unwrap();

        let summaries = h.service.list_transactions(&buyer).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].my_role, Some(ParticipantRole::Buyer));
        assert_eq!(summaries[0].pending_invites_count, 1);
        assert!(h.service.get_transaction(id, &buyer).is_ok());
    }

    #[test]
    fn list_is_newest_first() {
        let h = setup();
        let broker = Actor::broker("b@example.com");
        let first = h.service.create_transaction(&broker, &single_sale()).unwrap();
        h.clock.advance(Duration::minutes(5));
        let second = h.service.create_transaction(&broker, &single_sale()).unwrap();

        let ids: Vec<_> = h
            .service
            .list_transactions(&broker)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![second.transaction().id, first.transaction().id]);
    }

    #[test]
    fn merge_details_updates_payload_for_participants_only() {
        let h = setup();
        let broker = Actor::broker("b@example.com");
        let created = h.service.create_transaction(&broker, &single_sale()).unwrap();
        let id = created.transaction().id;
        let patch = json!({ "inspection_date": "2026-01-20" }).as_object().cloned().unwrap();

        let updated = h.service.merge_details(id, &broker, patch.clone()).unwrap();
        assert_eq!(updated.details().data["inspection_date"], "2026-01-20");
        assert_eq!(updated.details().data["seller_email"], "seller@example.com");

        let err = h
            .service
            .merge_details(id, &Actor::user("stranger@example.com"), patch)
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::Forbidden(_)));
    }

    #[test]
    fn invite_counterparty_by_anyone_but_joined_secondary_is_forbidden() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &double_split())
            .unwrap();
        let id = created.transaction().id;

        // Secondary broker invited but not yet joined, then an unrelated broker.
        for actor in [Actor::broker("second@example.com"), Actor::broker("stranger@example.com")] {
            let err = h
                .service
                .invite_counterparty(id, &actor, "buyer@example.com")
                .unwrap_err();
            assert!(matches!(domain_err(err), DomainError::Forbidden(_)));
        }

        let record = stored(&h, id);
        assert_eq!(record.version(), created.version());
        assert!(!record.has_role(ParticipantRole::Buyer));
    }

    #[test]
    fn concurrent_accepts_of_different_invitations_both_land() {
        let h = setup();
        let created = h
            .service
            .create_transaction(&Actor::broker("b@example.com"), &single_sale())
            .unwrap();
        let id = created.transaction().id;
        let tokens = [
            (token(&created, ParticipantRole::Buyer), Actor::user("buyer@example.com")),
            (token(&created, ParticipantRole::Seller), Actor::user("seller@example.com")),
        ];
        let barrier = Barrier::new(2);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = tokens
                .iter()
                .map(|(token, user)| {
                    let service = &h.service;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        service.accept_invitation(token, user)
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        assert!(results.iter().all(Result::is_ok));

        let record = stored(&h, id);
        assert_eq!(record.transaction().status, TransactionStatus::Active);
        assert_eq!(record.transaction().stage, Stage::PendingUserInformation);
        assert_eq!(record.events_of_type(TransactionEventType::InvitationAccepted).count(), 2);
        assert_eq!(record.events_of_type(TransactionEventType::StageChanged).count(), 1);
    }

    #[test]
    fn invite_counterparty_on_unknown_transaction_is_not_found() {
        let h = setup();
        let err = h
            .service
            .invite_counterparty(TransactionId::new(), &Actor::broker("x@example.com"), "a@example.com")
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::NotFound(_)));
    }
}
