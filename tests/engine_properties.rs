//! Property tests for the patch engine's matching and sequencing guarantees.

use anchor_patcher::{
    apply_insert_before_anchor, apply_replace, InsertBeforeAnchorOperation, Outcome, PatchPlan,
    ReplaceOperation,
};
use proptest::prelude::*;

/// Documents over a small alphabet so generated needles actually collide.
fn doc() -> impl Strategy<Value = String> {
    "[abc \n]{0,40}"
}

fn literal() -> impl Strategy<Value = String> {
    "[abc]{1,4}"
}

proptest! {
    #[test]
    fn absent_needle_is_noop(d in "[ab \n]{0,40}", r in ".{0,10}") {
        // 'x' never occurs in d
        let step = apply_replace(&d, &ReplaceOperation::new("x", r));
        prop_assert_eq!(step.outcome, Outcome::NotFound);
        prop_assert_eq!(step.document, d);
    }

    #[test]
    fn replace_touches_only_first_occurrence(d in doc(), n in literal(), r in "[xyz]{0,5}") {
        let step = apply_replace(&d, &ReplaceOperation::new(n.clone(), r.clone()));
        match d.find(&n) {
            Some(start) => {
                prop_assert_eq!(step.outcome, Outcome::Applied { offset: start });
                let expected = format!("{}{}{}", &d[..start], r, &d[start + n.len()..]);
                prop_assert_eq!(step.document, expected);
            }
            None => {
                prop_assert_eq!(step.outcome, Outcome::NotFound);
                prop_assert_eq!(step.document, d);
            }
        }
    }

    #[test]
    fn insertion_is_local(
        prefix in "[ab \n]{0,20}",
        suffix in "[ab \n]{0,20}",
        insertion in "[xyz\n]{0,10}",
    ) {
        // 'c' appears exactly once, as the anchor
        let d = format!("{prefix}c{suffix}");
        let op = InsertBeforeAnchorOperation::new("c", insertion.clone());
        let step = apply_insert_before_anchor(&d, &op);

        prop_assert_eq!(step.outcome, Outcome::Applied { offset: prefix.len() });
        prop_assert!(step.document.starts_with(&prefix));
        let tail = format!("c{suffix}");
        prop_assert!(step.document.ends_with(&tail));
        let inserted = &step.document[prefix.len()..prefix.len() + insertion.len()];
        prop_assert_eq!(inserted, insertion.as_str());
        prop_assert_eq!(step.document.len(), d.len() + insertion.len());
    }

    #[test]
    fn second_replace_is_noop_when_replacement_drops_needle(
        prefix in "[ab \n]{0,20}",
        suffix in "[ab \n]{0,20}",
        r in "[xyz]{0,5}",
    ) {
        // needle 'c' occurs once and the replacement cannot reintroduce it
        let d = format!("{prefix}c{suffix}");
        let op = ReplaceOperation::new("c", r);
        let once = apply_replace(&d, &op);
        let twice = apply_replace(&once.document, &op);

        prop_assert!(once.outcome.is_applied());
        prop_assert_eq!(twice.outcome, Outcome::NotFound);
        prop_assert_eq!(twice.document, once.document);
    }

    #[test]
    fn plan_is_left_to_right_fold(
        d in doc(),
        n in literal(),
        a in literal(),
        r in "[xyz]{0,4}",
        i in "[xyz]{0,4}",
    ) {
        let replace = ReplaceOperation::new(n, r);
        let insert = InsertBeforeAnchorOperation::new(a, i);
        let plan = PatchPlan::default().then(replace.clone()).then(insert.clone());

        let intermediate = apply_replace(&d, &replace).document;
        let folded = apply_insert_before_anchor(&intermediate, &insert).document;
        prop_assert_eq!(plan.apply(&d).document, folded);
    }
}

#[test]
fn swapping_operations_changes_result_when_needle_overlaps_anchor() {
    // The replace consumes the text the insert anchors on
    let replace = ReplaceOperation::new("</div>\n}", "</section>\n}");
    let insert = InsertBeforeAnchorOperation::new("</div>", "<Modal />\n");
    let d = "<div>\n</div>\n}";

    let replace_first = PatchPlan::default()
        .then(replace.clone())
        .then(insert.clone())
        .apply(d);
    let insert_first = PatchPlan::default().then(insert).then(replace).apply(d);

    assert_eq!(replace_first.document, "<div>\n</section>\n}");
    assert!(!replace_first.is_complete());
    assert_eq!(insert_first.document, "<div>\n<Modal />\n</section>\n}");
    assert!(insert_first.is_complete());
}
