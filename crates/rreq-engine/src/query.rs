//! Read-side service: tenant-scoped listings and aggregate assembly.

use rreq_model::{RequestAggregate, RequestFilter, ResourceRequest};
use rreq_store::{
    HeaderFilter, RequestStore, approvals_for, audit_for_request, fulfillments_for, get_request,
    items_for, list_requests,
};
use rreq_validate::{parse_priority, parse_status};

use crate::error::{EngineError, Result};

/// Queries over one incident's store. Pure reader: never mutates state.
#[derive(Debug)]
pub struct RequestQueries<'a> {
    store: &'a RequestStore,
}

impl<'a> RequestQueries<'a> {
    pub fn new(store: &'a RequestStore) -> Self {
        Self { store }
    }

    /// List request headers, newest first, always constrained to this
    /// store's incident. Raw status/priority filter values are validated
    /// before the query runs.
    pub fn list(&self, filter: &RequestFilter) -> Result<Vec<ResourceRequest>> {
        let statuses = filter
            .statuses
            .iter()
            .map(|raw| parse_status(raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let priority = filter
            .priority
            .as_deref()
            .map(parse_priority)
            .transpose()?;
        let header_filter = HeaderFilter {
            statuses,
            priority,
            text: filter.text.clone(),
            created_from: filter.created_from,
            created_to: filter.created_to,
        };
        Ok(list_requests(
            self.store.connection(),
            self.store.incident_id(),
            &header_filter,
        )?)
    }

    /// Load the full aggregate for one request: header, items, approvals
    /// and fulfillments in chronological order, and the audit trail.
    pub fn get(&self, id: i64) -> Result<RequestAggregate> {
        let conn = self.store.connection();
        let request = get_request(conn, self.store.incident_id(), id)?.ok_or(
            EngineError::NotFound {
                entity: "request",
                id,
            },
        )?;
        Ok(RequestAggregate {
            items: items_for(conn, id)?,
            approvals: approvals_for(conn, id)?,
            fulfillments: fulfillments_for(conn, id)?,
            audit: audit_for_request(conn, id)?,
            request,
        })
    }
}
