use stayhub_core::{
    Entity, EntityId, FacadeError, InMemoryFacade, NewAmenity, NewPlace, NewReview, NewUser,
    PlacePatch, ReviewPatch, UserPatch,
};
use uuid::Uuid;

fn user_req(email: &str) -> NewUser {
    NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        is_admin: false,
    }
}

fn admin_req(email: &str) -> NewUser {
    NewUser {
        is_admin: true,
        ..user_req(email)
    }
}

fn place_req(owner_id: EntityId) -> NewPlace {
    NewPlace {
        title: "Harbor loft".to_string(),
        description: Some("Two rooms over the water".to_string()),
        price: 120.0,
        latitude: 59.44,
        longitude: 24.75,
        owner_id,
        amenity_ids: Vec::new(),
    }
}

fn review_req(user_id: EntityId, place_id: EntityId) -> NewReview {
    NewReview {
        text: "Quiet and clean".to_string(),
        rating: 4,
        user_id,
        place_id,
    }
}

#[test]
fn create_user_rejects_duplicate_email_case_insensitively() {
    let mut facade = InMemoryFacade::in_memory();
    facade.create_user(user_req("Ada@Example.com")).unwrap();

    let err = facade.create_user(user_req("ada@example.com")).unwrap_err();
    assert!(matches!(err, FacadeError::EmailTaken(email) if email == "ada@example.com"));
    assert_eq!(facade.get_all_users().unwrap().len(), 1);
}

#[test]
fn get_user_by_email_matches_normalized_form() {
    let mut facade = InMemoryFacade::in_memory();
    let user = facade.create_user(user_req("Ada@Example.com")).unwrap();
    assert_eq!(user.email, "ada@example.com");

    let found = facade.get_user_by_email(" ADA@EXAMPLE.COM ").unwrap().unwrap();
    assert_eq!(found.id(), user.id());

    assert!(facade.get_user_by_email("missing@example.com").unwrap().is_none());
    assert!(facade.get_user_by_email("not-an-email").unwrap().is_none());
}

#[test]
fn update_user_enforces_email_uniqueness() {
    let mut facade = InMemoryFacade::in_memory();
    facade.create_user(user_req("first@b.co")).unwrap();
    let second = facade.create_user(user_req("second@b.co")).unwrap();

    let patch = UserPatch {
        email: Some("FIRST@b.co".to_string()),
        ..UserPatch::default()
    };
    let err = facade.update_user(second.id(), &patch).unwrap_err();
    assert!(matches!(err, FacadeError::EmailTaken(_)));

    // Re-submitting the user's own address is not a conflict.
    let patch = UserPatch {
        email: Some("second@b.co".to_string()),
        first_name: Some("Grace".to_string()),
        ..UserPatch::default()
    };
    let updated = facade.update_user(second.id(), &patch).unwrap().unwrap();
    assert_eq!(updated.first_name, "Grace");
}

#[test]
fn update_user_unknown_id_returns_none() {
    let mut facade = InMemoryFacade::in_memory();
    let result = facade
        .update_user(Uuid::new_v4(), &UserPatch::default())
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn create_place_requires_existing_owner() {
    let mut facade = InMemoryFacade::in_memory();
    let ghost = Uuid::new_v4();

    let err = facade.create_place(place_req(ghost)).unwrap_err();
    assert!(matches!(err, FacadeError::UnknownUser(id) if id == ghost));
    assert!(facade.get_all_places().unwrap().is_empty());
}

#[test]
fn create_place_validation_failure_stores_nothing() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();

    let mut req = place_req(owner.id());
    req.price = -1.0;
    let err = facade.create_place(req).unwrap_err();
    assert!(matches!(err, FacadeError::Validation(_)));
    assert!(facade.get_all_places().unwrap().is_empty());
}

#[test]
fn create_place_skips_amenities_that_do_not_resolve() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let wifi = facade
        .create_amenity(NewAmenity {
            name: "Wifi".to_string(),
        })
        .unwrap();

    let mut req = place_req(owner.id());
    req.amenity_ids = vec![wifi.id(), Uuid::new_v4()];
    let place = facade.create_place(req).unwrap();

    assert_eq!(place.amenity_ids.len(), 1);
    assert!(place.amenity_ids.contains(&wifi.id()));
}

#[test]
fn update_place_drops_unresolvable_references() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();

    let patch = PlacePatch {
        owner_id: Some(Uuid::new_v4()),
        amenity_ids: Some(vec![Uuid::new_v4()]),
        price: Some(99.0),
        ..PlacePatch::default()
    };
    let updated = facade.update_place(place.id(), &patch).unwrap().unwrap();

    assert_eq!(updated.owner_id, owner.id());
    assert!(updated.amenity_ids.is_empty());
    assert_eq!(updated.price, 99.0);
}

#[test]
fn owner_cannot_review_their_own_place() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();

    let err = facade
        .create_review(review_req(owner.id(), place.id()))
        .unwrap_err();
    assert!(matches!(err, FacadeError::SelfReview { .. }));
    assert!(facade.get_all_reviews().unwrap().is_empty());
}

#[test]
fn second_review_for_same_pair_is_rejected() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();

    facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap();
    let err = facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap_err();

    assert!(matches!(err, FacadeError::DuplicateReview { .. }));
    assert_eq!(facade.get_all_reviews().unwrap().len(), 1);
}

#[test]
fn review_requires_existing_user_and_place() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();

    let ghost = Uuid::new_v4();
    let err = facade.create_review(review_req(ghost, place.id())).unwrap_err();
    assert!(matches!(err, FacadeError::UnknownUser(id) if id == ghost));

    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let err = facade.create_review(review_req(guest.id(), ghost)).unwrap_err();
    assert!(matches!(err, FacadeError::UnknownPlace(id) if id == ghost));
}

#[test]
fn reviews_by_place_filters_and_requires_the_place() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest_a = facade.create_user(user_req("a@b.co")).unwrap();
    let guest_b = facade.create_user(user_req("b@b.co")).unwrap();
    let first = facade.create_place(place_req(owner.id())).unwrap();
    let second = facade.create_place(place_req(owner.id())).unwrap();

    facade
        .create_review(review_req(guest_a.id(), first.id()))
        .unwrap();
    facade
        .create_review(review_req(guest_b.id(), first.id()))
        .unwrap();
    facade
        .create_review(review_req(guest_a.id(), second.id()))
        .unwrap();

    let reviews = facade.get_reviews_by_place(first.id()).unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].user_id, guest_a.id());
    assert_eq!(reviews[1].user_id, guest_b.id());

    let err = facade.get_reviews_by_place(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, FacadeError::UnknownPlace(_)));
}

#[test]
fn update_review_merges_fields() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();
    let review = facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap();

    let patch = ReviewPatch {
        rating: Some(5),
        ..ReviewPatch::default()
    };
    let updated = facade.update_review(review.id(), &patch).unwrap().unwrap();
    assert_eq!(updated.rating, 5);
    assert_eq!(updated.text, "Quiet and clean");
}

#[test]
fn deleting_a_user_cascades_to_places_and_reviews() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let other_owner = facade.create_user(user_req("other@b.co")).unwrap();

    let place = facade.create_place(place_req(owner.id())).unwrap();
    let other_place = facade.create_place(place_req(other_owner.id())).unwrap();
    facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap();
    let owner_review = facade
        .create_review(review_req(owner.id(), other_place.id()))
        .unwrap();

    assert!(facade.delete_user(owner.id()).unwrap());

    assert!(facade.get_user(owner.id()).unwrap().is_none());
    assert!(facade.get_place(place.id()).unwrap().is_none());
    assert!(facade.get_review(owner_review.id()).unwrap().is_none());
    // The unrelated owner's place survives with no reviews left.
    assert!(facade.get_place(other_place.id()).unwrap().is_some());
    assert!(facade.get_all_reviews().unwrap().is_empty());

    assert!(!facade.delete_user(owner.id()).unwrap());
}

#[test]
fn deleting_a_place_cascades_to_its_reviews() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();
    facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap();

    assert!(facade.delete_place(place.id()).unwrap());
    assert!(facade.get_all_reviews().unwrap().is_empty());
    assert!(!facade.delete_place(place.id()).unwrap());
}

#[test]
fn place_mutation_is_gated_on_owner_or_admin() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let stranger = facade.create_user(user_req("stranger@b.co")).unwrap();
    let admin = facade.create_user(admin_req("admin@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();

    let patch = PlacePatch {
        price: Some(150.0),
        ..PlacePatch::default()
    };

    let err = facade
        .update_place_authorized(place.id(), &patch, stranger.id())
        .unwrap_err();
    assert!(matches!(err, FacadeError::Forbidden { actor_id } if actor_id == stranger.id()));

    let updated = facade
        .update_place_authorized(place.id(), &patch, owner.id())
        .unwrap()
        .unwrap();
    assert_eq!(updated.price, 150.0);

    assert!(facade
        .delete_place_authorized(place.id(), admin.id())
        .unwrap());
}

#[test]
fn review_mutation_is_gated_on_author_or_admin() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let guest = facade.create_user(user_req("guest@b.co")).unwrap();
    let admin = facade.create_user(admin_req("admin@b.co")).unwrap();
    let place = facade.create_place(place_req(owner.id())).unwrap();
    let review = facade
        .create_review(review_req(guest.id(), place.id()))
        .unwrap();

    let patch = ReviewPatch {
        text: Some("Edited by someone else".to_string()),
        ..ReviewPatch::default()
    };
    let err = facade
        .update_review_authorized(review.id(), &patch, owner.id())
        .unwrap_err();
    assert!(matches!(err, FacadeError::Forbidden { .. }));

    assert!(facade
        .update_review_authorized(review.id(), &patch, guest.id())
        .unwrap()
        .is_some());
    assert!(facade
        .delete_review_authorized(review.id(), admin.id())
        .unwrap());
}

#[test]
fn authenticate_user_checks_credentials() {
    let mut facade = InMemoryFacade::in_memory();
    facade.create_user(user_req("login@b.co")).unwrap();

    assert!(facade
        .authenticate_user("Login@B.CO", "s3cret-pass")
        .unwrap()
        .is_some());
    assert!(facade
        .authenticate_user("login@b.co", "wrong")
        .unwrap()
        .is_none());
    assert!(facade
        .authenticate_user("unknown@b.co", "s3cret-pass")
        .unwrap()
        .is_none());
}

#[test]
fn amenity_update_merges_name_and_reports_unknown_ids() {
    let mut facade = InMemoryFacade::in_memory();
    let wifi = facade
        .create_amenity(NewAmenity {
            name: "Wifi".to_string(),
        })
        .unwrap();

    let patch = stayhub_core::AmenityPatch {
        name: Some("Fast wifi".to_string()),
    };
    let updated = facade.update_amenity(wifi.id(), &patch).unwrap().unwrap();
    assert_eq!(updated.name, "Fast wifi");

    assert!(facade.update_amenity(Uuid::new_v4(), &patch).unwrap().is_none());
    assert_eq!(facade.get_all_amenities().unwrap().len(), 1);
}

#[test]
fn deleting_an_amenity_detaches_it_from_places() {
    let mut facade = InMemoryFacade::in_memory();
    let owner = facade.create_user(user_req("owner@b.co")).unwrap();
    let wifi = facade
        .create_amenity(NewAmenity {
            name: "Wifi".to_string(),
        })
        .unwrap();

    let mut req = place_req(owner.id());
    req.amenity_ids = vec![wifi.id()];
    let place = facade.create_place(req).unwrap();
    assert!(place.amenity_ids.contains(&wifi.id()));

    assert!(facade.delete_amenity(wifi.id()).unwrap());
    let place = facade.get_place(place.id()).unwrap().unwrap();
    assert!(place.amenity_ids.is_empty());

    assert!(!facade.delete_amenity(wifi.id()).unwrap());
}
