//! Command implementations: argument handling around the engine calls plus
//! terminal output.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};

use rreq_engine::RequestService;
use rreq_model::{
    FulfillmentPatch, NewFulfillment, NewItem, NewRequest, RequestAggregate, RequestFilter,
    RequestPatch, ResourceRequest,
};

use crate::cli::{
    ApproveArgs, CreateArgs, FulfillAssignArgs, FulfillUpdateArgs, ItemArgs, ListArgs, ShowArgs,
    StatusArgs, UpdateArgs,
};

fn parse_when(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp {value:?} (expected RFC 3339)"))
}

/// Parse a `KIND:QTY:UNIT:DESCRIPTION` item spec.
fn parse_item_spec(spec: &str) -> Result<NewItem> {
    let mut parts = spec.splitn(4, ':');
    let kind = parts.next().unwrap_or_default();
    let quantity = parts.next().unwrap_or_default();
    let unit = parts.next().unwrap_or_default();
    let description = parts
        .next()
        .ok_or_else(|| anyhow!("invalid item spec {spec:?} (expected KIND:QTY:UNIT:DESCRIPTION)"))?;
    let quantity: f64 = quantity
        .parse()
        .with_context(|| format!("invalid quantity {quantity:?} in item spec {spec:?}"))?;
    Ok(NewItem {
        kind: kind.to_string(),
        ref_id: None,
        description: description.to_string(),
        quantity,
        unit: unit.to_string(),
        special_instructions: None,
    })
}

fn parse_item_specs(specs: &[String]) -> Result<Vec<NewItem>> {
    specs.iter().map(|spec| parse_item_spec(spec)).collect()
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn fmt_when(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn run_create(svc: &mut RequestService, args: &CreateArgs) -> Result<()> {
    let items = parse_item_specs(&args.items)?;
    let needed_by = args.needed_by.as_deref().map(parse_when).transpose()?;
    let new = NewRequest {
        title: args.title.clone(),
        requesting_section: args.section.clone(),
        priority: args.priority.clone(),
        status: args.status.clone(),
        created_by_id: args.actor.clone(),
        needed_by_utc: needed_by,
        justification: args.justification.clone(),
        delivery_location: args.delivery_location.clone(),
        comms_requirements: args.comms_requirements.clone(),
        links: args.links.clone(),
    };
    let id = svc.create_request(&new, &items)?;
    println!("created request {id}");
    Ok(())
}

pub fn run_list(svc: &RequestService, args: &ListArgs) -> Result<()> {
    let filter = RequestFilter {
        statuses: args.statuses.clone(),
        priority: args.priority.clone(),
        text: args.text.clone(),
        created_from: args.since.as_deref().map(parse_when).transpose()?,
        created_to: args.until.as_deref().map(parse_when).transpose()?,
    };
    let requests = svc.queries().list(&filter)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }
    print_header_table(&requests);
    Ok(())
}

fn print_header_table(requests: &[ResourceRequest]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Title", "Section", "Priority", "Status", "Version", "Created",
    ]);
    apply_table_style(&mut table);
    for request in requests {
        table.add_row(vec![
            request.id.to_string(),
            request.title.clone(),
            request.requesting_section.clone(),
            request.priority.to_string(),
            request.status.to_string(),
            request.version.to_string(),
            fmt_when(request.created_utc),
        ]);
    }
    println!("{table}");
}

pub fn run_show(svc: &RequestService, args: &ShowArgs) -> Result<()> {
    let aggregate = svc.queries().get(args.id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&aggregate)?);
        return Ok(());
    }
    print_aggregate(&aggregate);
    Ok(())
}

fn print_aggregate(aggregate: &RequestAggregate) {
    let request = &aggregate.request;
    println!(
        "Request {} [{}] {} ({}, v{})",
        request.id, request.status, request.title, request.priority, request.version
    );
    println!(
        "  section: {}  created by {} at {}",
        request.requesting_section,
        request.created_by_id,
        fmt_when(request.created_utc)
    );
    if let Some(needed_by) = request.needed_by_utc {
        println!("  needed by: {}", fmt_when(needed_by));
    }
    if let Some(justification) = &request.justification {
        println!("  justification: {justification}");
    }
    if let Some(location) = &request.delivery_location {
        println!("  deliver to: {location}");
    }
    if let Some(comms) = &request.comms_requirements {
        println!("  comms: {comms}");
    }
    if let Some(links) = &request.links {
        println!("  links: {links}");
    }

    if !aggregate.items.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Item", "Kind", "Qty", "Unit", "Description"]);
        apply_table_style(&mut table);
        for item in &aggregate.items {
            table.add_row(vec![
                item.id.to_string(),
                item.kind.to_string(),
                item.quantity.to_string(),
                item.unit.clone(),
                item.description.clone(),
            ]);
        }
        println!("{table}");
    }

    for approval in &aggregate.approvals {
        println!(
            "  decision: {} by {} at {}{}",
            approval.action,
            approval.actor_id,
            fmt_when(approval.ts_utc),
            approval
                .note
                .as_deref()
                .map(|note| format!(" - {note}"))
                .unwrap_or_default()
        );
    }
    for fulfillment in &aggregate.fulfillments {
        let source = fulfillment
            .supplier_id
            .as_deref()
            .or(fulfillment.assigned_team_id.as_deref())
            .or(fulfillment.assigned_vehicle_id.as_deref())
            .unwrap_or("-");
        println!(
            "  fulfillment {}: {} via {}{}",
            fulfillment.id,
            fulfillment.status,
            source,
            fulfillment
                .eta_utc
                .map(|eta| format!(", eta {}", fmt_when(eta)))
                .unwrap_or_default()
        );
    }
    if !aggregate.audit.is_empty() {
        println!("  audit:");
        for row in &aggregate.audit {
            println!(
                "    {} {} {}: {} -> {}",
                fmt_when(row.ts_utc),
                row.entity_type,
                row.field,
                row.old_value.as_deref().unwrap_or("-"),
                row.new_value.as_deref().unwrap_or("-"),
            );
        }
    }
}

pub fn run_update(svc: &mut RequestService, args: &UpdateArgs) -> Result<()> {
    let needed_by = args.needed_by.as_deref().map(parse_when).transpose()?;
    let patch = RequestPatch {
        title: args.title.clone(),
        requesting_section: args.section.clone(),
        priority: args.priority.clone(),
        status: None,
        needed_by_utc: needed_by.map(Some),
        justification: args.justification.clone().map(Some),
        delivery_location: args.delivery_location.clone().map(Some),
        comms_requirements: args.comms_requirements.clone().map(Some),
        links: args.links.clone().map(Some),
    };
    if patch.is_empty() {
        println!("nothing to update");
        return Ok(());
    }
    let aggregate = svc.update_request(args.id, &patch, Some(&args.actor), args.expect_version)?;
    println!(
        "updated request {} (v{})",
        aggregate.request.id, aggregate.request.version
    );
    Ok(())
}

pub fn run_item_add(svc: &mut RequestService, args: &ItemArgs) -> Result<()> {
    let items = parse_item_specs(&args.items)?;
    let ids = svc.add_items(args.id, &items)?;
    println!("added {} item(s) to request {}", ids.len(), args.id);
    Ok(())
}

pub fn run_item_replace(svc: &mut RequestService, args: &ItemArgs) -> Result<()> {
    let items = parse_item_specs(&args.items)?;
    let aggregate = svc.replace_items(args.id, &items)?;
    println!(
        "request {} now has {} item(s)",
        args.id,
        aggregate.items.len()
    );
    Ok(())
}

pub fn run_status(svc: &mut RequestService, args: &StatusArgs) -> Result<()> {
    let aggregate = svc.change_status(
        args.id,
        &args.status,
        &args.actor,
        args.note.as_deref(),
        args.expect_version,
    )?;
    println!(
        "request {} is now {} (v{})",
        aggregate.request.id, aggregate.request.status, aggregate.request.version
    );
    Ok(())
}

pub fn run_approve(svc: &mut RequestService, args: &ApproveArgs) -> Result<()> {
    let approval_id = svc.record_approval(args.id, &args.action, &args.actor, args.note.as_deref())?;
    let aggregate = svc.queries().get(args.id)?;
    println!(
        "recorded decision {} on request {}; status is now {}",
        approval_id, args.id, aggregate.request.status
    );
    Ok(())
}

pub fn run_fulfill_assign(svc: &mut RequestService, args: &FulfillAssignArgs) -> Result<()> {
    let new = NewFulfillment {
        supplier_id: args.supplier.clone(),
        assigned_team_id: args.team.clone(),
        assigned_vehicle_id: args.vehicle.clone(),
        eta_utc: args.eta.as_deref().map(parse_when).transpose()?,
        note: args.note.clone(),
    };
    let fulfillment_id = svc.assign_fulfillment(args.id, &new)?;
    println!("opened fulfillment {fulfillment_id} for request {}", args.id);
    Ok(())
}

pub fn run_fulfill_update(svc: &mut RequestService, args: &FulfillUpdateArgs) -> Result<()> {
    let patch = FulfillmentPatch {
        status: args.status.clone(),
        note: args.note.clone().map(Some),
        eta_utc: args.eta.as_deref().map(parse_when).transpose()?.map(Some),
    };
    let record = svc.update_fulfillment(args.fulfillment_id, &patch)?;
    println!(
        "fulfillment {} is now {}",
        record.id, record.status
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_spec_parses() {
        let item = parse_item_spec("SUPPLY:5:roll:Tarps, heavy duty").expect("parse");
        assert_eq!(item.kind, "SUPPLY");
        assert_eq!(item.quantity, 5.0);
        assert_eq!(item.unit, "roll");
        assert_eq!(item.description, "Tarps, heavy duty");
    }

    #[test]
    fn item_spec_rejects_short_forms() {
        assert!(parse_item_spec("SUPPLY:5:roll").is_err());
        assert!(parse_item_spec("SUPPLY:five:roll:Tarps").is_err());
    }
}
