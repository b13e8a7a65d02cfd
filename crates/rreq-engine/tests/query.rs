//! Listing filters and tenant isolation.

use chrono::Utc;
use rreq_engine::{EngineError, RequestService};
use rreq_model::{NewRequest, Priority, RequestFilter, RequestStatus, ResourceRequest};
use rreq_store::{RequestStore, insert_request_tx};
use rreq_validate::ValidationError;

fn request(title: &str, priority: &str, status: &str, justification: Option<&str>) -> NewRequest {
    NewRequest {
        title: title.to_string(),
        requesting_section: "Logistics".to_string(),
        priority: priority.to_string(),
        status: Some(status.to_string()),
        created_by_id: "logs-1".to_string(),
        needed_by_utc: None,
        justification: justification.map(str::to_string),
        delivery_location: None,
        comms_requirements: None,
        links: None,
    }
}

fn populated_service() -> RequestService {
    let mut svc = RequestService::open_in_memory("INC-300").expect("open service");
    svc.create_request(
        &request("Tarps", "ROUTINE", "DRAFT", Some("shelter repair")),
        &[],
    )
    .expect("create");
    svc.create_request(
        &request("Water tender", "URGENT", "SUBMITTED", None),
        &[],
    )
    .expect("create");
    svc.create_request(
        &request("Fuel truck", "URGENT", "APPROVED", Some("night operations")),
        &[],
    )
    .expect("create");
    svc.create_request(
        &request("Portable repeater", "IMMEDIATE", "SUBMITTED", None),
        &[],
    )
    .expect("create");
    svc
}

#[test]
fn unfiltered_list_is_newest_first() {
    let svc = populated_service();
    let listed = svc
        .queries()
        .list(&RequestFilter::default())
        .expect("list");
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].title, "Portable repeater");
    assert_eq!(listed[3].title, "Tarps");
}

#[test]
fn status_filter_narrows_alone_and_with_lists() {
    let svc = populated_service();
    let submitted = svc
        .queries()
        .list(&RequestFilter {
            statuses: vec!["submitted".to_string()],
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(submitted.len(), 2);
    assert!(
        submitted
            .iter()
            .all(|r| r.status == RequestStatus::Submitted)
    );

    let submitted_or_approved = svc
        .queries()
        .list(&RequestFilter {
            statuses: vec!["SUBMITTED".to_string(), "APPROVED".to_string()],
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(submitted_or_approved.len(), 3);
}

#[test]
fn priority_filter_narrows() {
    let svc = populated_service();
    let urgent = svc
        .queries()
        .list(&RequestFilter {
            priority: Some("urgent".to_string()),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(urgent.len(), 2);
    assert!(urgent.iter().all(|r| r.priority == Priority::Urgent));
}

#[test]
fn text_filter_searches_title_and_justification() {
    let svc = populated_service();
    let by_title = svc
        .queries()
        .list(&RequestFilter {
            text: Some("tender".to_string()),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title, "Water tender");

    let by_justification = svc
        .queries()
        .list(&RequestFilter {
            text: Some("NIGHT".to_string()),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(by_justification.len(), 1);
    assert_eq!(by_justification[0].title, "Fuel truck");
}

#[test]
fn created_range_filter_narrows() {
    let mut svc = RequestService::open_in_memory("INC-301").expect("open service");
    svc.create_request(&request("Early", "ROUTINE", "DRAFT", None), &[])
        .expect("create");
    let boundary = Utc::now();
    svc.create_request(&request("Late", "ROUTINE", "DRAFT", None), &[])
        .expect("create");

    let late = svc
        .queries()
        .list(&RequestFilter {
            created_from: Some(boundary),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].title, "Late");

    let early = svc
        .queries()
        .list(&RequestFilter {
            created_to: Some(boundary),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].title, "Early");
}

#[test]
fn filters_combine_conjunctively() {
    let svc = populated_service();
    let narrowed = svc
        .queries()
        .list(&RequestFilter {
            statuses: vec!["SUBMITTED".to_string()],
            priority: Some("URGENT".to_string()),
            text: Some("water".to_string()),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].title, "Water tender");

    let nothing = svc
        .queries()
        .list(&RequestFilter {
            statuses: vec!["DRAFT".to_string()],
            priority: Some("URGENT".to_string()),
            ..RequestFilter::default()
        })
        .expect("list");
    assert!(nothing.is_empty());
}

#[test]
fn bad_filter_values_are_validation_errors() {
    let svc = populated_service();
    assert!(matches!(
        svc.queries().list(&RequestFilter {
            statuses: vec!["SHIPPED".to_string()],
            ..RequestFilter::default()
        }),
        Err(EngineError::Validation(ValidationError::UnknownValue { .. }))
    ));
    assert!(matches!(
        svc.queries().list(&RequestFilter {
            priority: Some("critical".to_string()),
            ..RequestFilter::default()
        }),
        Err(EngineError::Validation(ValidationError::UnknownValue { .. }))
    ));
}

#[test]
fn listings_never_cross_the_tenant_boundary() {
    // Seed a foreign incident's row into the same database file, then make
    // sure the service bound to INC-A can never see it.
    let mut store = RequestStore::open_in_memory("INC-A").expect("open store");
    let now = Utc::now();
    let foreign = ResourceRequest {
        id: 0,
        incident_id: "INC-B".to_string(),
        title: "Foreign request".to_string(),
        requesting_section: "Operations".to_string(),
        priority: Priority::Routine,
        status: RequestStatus::Draft,
        created_by_id: "other".to_string(),
        created_utc: now,
        last_updated_utc: now,
        needed_by_utc: None,
        justification: None,
        delivery_location: None,
        comms_requirements: None,
        links: None,
        version: 1,
    };
    let tx = store.transaction().expect("tx");
    let foreign_id = insert_request_tx(&tx, &foreign).expect("insert foreign");
    tx.commit().expect("commit");

    let mut svc = RequestService::new(store);
    let ours = svc
        .create_request(&request("Ours", "ROUTINE", "DRAFT", None), &[])
        .expect("create");

    let listed = svc
        .queries()
        .list(&RequestFilter::default())
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, ours);
    assert!(listed.iter().all(|r| r.incident_id == "INC-A"));

    assert!(matches!(
        svc.queries().get(foreign_id),
        Err(EngineError::NotFound { .. })
    ));
}
