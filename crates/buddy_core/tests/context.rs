use buddy_core::{
    EventType, Mode, PendingScanContext, ScanContext, Severity, StoredQuantity,
    UnknownBarcodeRecord,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn context(mode: Mode) -> ScanContext {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ScanContext::new(mode, PendingScanContext::default(), now)
}

#[test]
fn untouched_context_commits_nothing() {
    let changes = context(Mode::Open).into_changes();
    assert!(changes.is_empty());
    assert!(changes.events.is_empty());
}

#[test]
fn mode_change_is_staged_even_when_equal() {
    let mut ctx = context(Mode::Consume);
    ctx.set_mode(Mode::Consume);
    assert_eq!(ctx.into_changes().mode, Some(Mode::Consume));
}

#[test]
fn notes_and_events_keep_emission_order() {
    let mut ctx = context(Mode::Open);
    ctx.emit(EventType::AddKnownBarcode, "opened")
        .severity(Severity::Success)
        .display("Opening 1");
    ctx.note("Reverting back to Consume", true);
    ctx.set_mode(Mode::Consume);

    let changes = ctx.into_changes();
    let messages: Vec<_> = changes.log.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["opened", "Reverting back to Consume"]);
    assert!(changes.log[1].verbose);
    assert_eq!(changes.events.len(), 1);
    assert_eq!(changes.events[0].notification_text(), "Opening 1");
    assert_eq!(changes.mode, Some(Mode::Consume));
}

#[test]
fn upserts_replace_staged_records_for_same_barcode() {
    let mut ctx = context(Mode::Purchase);
    ctx.upsert_unknown(UnknownBarcodeRecord::new("111", 1.0));
    ctx.upsert_unknown(UnknownBarcodeRecord::new("111", 3.0));
    ctx.upsert_quantity(StoredQuantity {
        barcode: "111".to_string(),
        amount: 2.5,
        product_name: None,
    });
    assert_eq!(ctx.staged_unknown("111").map(|r| r.amount), Some(3.0));

    let changes = ctx.into_changes();
    assert_eq!(changes.unknown, vec![UnknownBarcodeRecord::new("111", 3.0)]);
    assert_eq!(changes.quantities.len(), 1);
}

#[test]
fn remembered_barcode_describes_itself() {
    let mut ctx = context(Mode::Consume);
    ctx.remember_barcode("400", Some("Milk".to_string()));
    assert_eq!(ctx.pending().describe(), "400 (Milk)");
    ctx.remember_barcode("401", None);
    assert_eq!(ctx.pending().describe(), "401");
    assert_eq!(
        ctx.into_changes().pending,
        Some(PendingScanContext::new("401", None))
    );
}
