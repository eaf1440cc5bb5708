//! Property-based tests for listing order.

use chrono::{DateTime, TimeZone, Utc};
use grievance_shared::types::ComplaintId;
use proptest::prelude::*;

use super::types::{Complaint, sort_newest_first};

fn complaint_at(seq: usize, timestamp: DateTime<Utc>) -> Complaint {
    Complaint {
        id: ComplaintId::new(seq.to_string()),
        student_name: format!("resident {seq}"),
        floor_number: 1,
        flat_number: "1A".to_string(),
        issue_type: "other".to_string(),
        description: None,
        timestamp,
        resolved: false,
        attachments: Vec::new(),
    }
}

/// Strategy for timestamps within a few days, with frequent ties.
fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..500).prop_map(|minutes| {
        Utc.timestamp_opt(1_760_000_000 + minutes * 60, 0)
            .single()
            .unwrap_or_default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whatever the insertion order, the listing is non-increasing by timestamp.
    #[test]
    fn prop_sorted_listing_is_non_increasing(stamps in prop::collection::vec(arb_timestamp(), 0..40)) {
        let mut complaints: Vec<Complaint> = stamps
            .into_iter()
            .enumerate()
            .map(|(seq, ts)| complaint_at(seq, ts))
            .collect();

        sort_newest_first(&mut complaints);

        for pair in complaints.windows(2) {
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    /// Sorting keeps every record exactly once.
    #[test]
    fn prop_sorting_preserves_ids(stamps in prop::collection::vec(arb_timestamp(), 0..40)) {
        let mut complaints: Vec<Complaint> = stamps
            .into_iter()
            .enumerate()
            .map(|(seq, ts)| complaint_at(seq, ts))
            .collect();
        let mut before: Vec<ComplaintId> = complaints.iter().map(|c| c.id.clone()).collect();

        sort_newest_first(&mut complaints);

        let mut after: Vec<ComplaintId> = complaints.iter().map(|c| c.id.clone()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }
}
