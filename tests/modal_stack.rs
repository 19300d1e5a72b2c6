//! Integration tests for the overlay stack: the nested-modal scenarios and
//! a model-based property check over arbitrary open/close sequences.

use pledgeboard_client::NodeId;
use pledgeboard_client::dom::{Document, ElementBuilder, Overflow};
use pledgeboard_client::overlay::{ClassToggleBridge, Key, ModalStack};
use proptest::prelude::*;

// ============================================================================
// Fixture
// ============================================================================

const MODAL_IDS: [&str; 3] = ["pledge", "share", "report"];

/// A page with a focused trigger button and three modals, each holding two
/// focusable controls.
fn build_page() -> (Document, NodeId, Vec<NodeId>) {
    let mut doc = Document::new();
    let body = doc.body();

    let trigger = ElementBuilder::new("button")
        .attr("id", "page-trigger")
        .size(80.0, 32.0)
        .append_to(&mut doc, body);

    let modals = MODAL_IDS
        .iter()
        .map(|id| {
            let modal = ElementBuilder::new("div")
                .attr("id", *id)
                .attr("class", "modal")
                .size(480.0, 320.0)
                .append_to(&mut doc, body);
            ElementBuilder::new("input")
                .size(200.0, 24.0)
                .append_to(&mut doc, modal);
            ElementBuilder::new("button")
                .size(80.0, 32.0)
                .append_to(&mut doc, modal);
            modal
        })
        .collect();

    doc.focus(trigger);
    (doc, trigger, modals)
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn nested_open_escape_escape_restores_page_state() {
    let (mut doc, trigger, modals) = build_page();
    doc.set_scroll_offset(0.0, 640.0);
    let style_before = doc.body_style();
    let mut stack = ModalStack::new();

    stack.open(&mut doc, "pledge");
    stack.open(&mut doc, "share");
    assert_eq!(stack.topmost(), Some(modals[1]));

    stack.handle_key(&mut doc, Key::Escape);
    assert_eq!(stack.topmost(), Some(modals[0]));

    stack.handle_key(&mut doc, Key::Escape);
    assert!(stack.is_empty());
    assert_eq!(doc.body_style(), style_before);
    assert_eq!(doc.scroll_offset(), (0.0, 640.0));
    assert_eq!(doc.active_element(), Some(trigger));
}

#[test]
fn legacy_toggle_and_explicit_api_cooperate() {
    let (mut doc, trigger, modals) = build_page();
    let mut stack = ModalStack::new();
    let mut bridge = ClassToggleBridge::new();

    // Legacy code toggles the class; the bridge opens it.
    doc.set_attribute(modals[0], "class", "modal open");
    bridge.sync(&mut stack, &mut doc);
    assert!(stack.is_open(modals[0]));

    // A controller opens a second modal through the API.
    stack.open(&mut doc, "share");
    assert_eq!(stack.len(), 2);

    // Escape closes the API-opened modal; a sweep changes nothing.
    stack.handle_key(&mut doc, Key::Escape);
    assert_eq!(bridge.sync(&mut stack, &mut doc), 0);

    // Legacy code removes the class; the bridge closes the first modal.
    doc.set_attribute(modals[0], "class", "modal");
    bridge.sync(&mut stack, &mut doc);
    assert!(stack.is_empty());
    assert_eq!(doc.active_element(), Some(trigger));
}

#[test]
fn tab_cycle_survives_content_mutation_while_open() {
    let (mut doc, _, modals) = build_page();
    let mut stack = ModalStack::new();
    stack.open(&mut doc, "report");

    // Grow the focusable set while the modal is open; the next keypress
    // must see the new control.
    let late_control = ElementBuilder::new("select")
        .size(120.0, 24.0)
        .append_to(&mut doc, modals[2]);

    stack.handle_key(&mut doc, Key::tab());
    stack.handle_key(&mut doc, Key::tab());
    assert_eq!(doc.active_element(), Some(late_control));
}

// ============================================================================
// Property: model-based open/close sequences
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Op {
    Open(usize),
    Close(usize),
    Escape,
    Tab,
    ShiftTab,
    CloseAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..MODAL_IDS.len()).prop_map(Op::Open),
        (0..MODAL_IDS.len()).prop_map(Op::Close),
        Just(Op::Escape),
        Just(Op::Tab),
        Just(Op::ShiftTab),
        Just(Op::CloseAll),
    ]
}

proptest! {
    /// For every op sequence: the scroll lock is held iff the stack is
    /// non-empty, the stack order matches a shadow model, and emptying the
    /// stack restores focus to the pre-nesting element.
    #[test]
    fn stack_invariants_hold_for_all_sequences(
        ops in proptest::collection::vec(op_strategy(), 1..48)
    ) {
        let (mut doc, trigger, modals) = build_page();
        let mut stack = ModalStack::new();
        let mut model: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Open(i) => {
                    stack.open(&mut doc, MODAL_IDS[i]);
                    if !model.contains(&i) {
                        model.push(i);
                    }
                }
                Op::Close(i) => {
                    stack.close_surface(&mut doc, modals[i]);
                    model.retain(|&open| open != i);
                }
                Op::Escape => {
                    stack.handle_key(&mut doc, Key::Escape);
                    model.pop();
                }
                Op::Tab => {
                    stack.handle_key(&mut doc, Key::tab());
                }
                Op::ShiftTab => {
                    stack.handle_key(&mut doc, Key::shift_tab());
                }
                Op::CloseAll => {
                    stack.close_all(&mut doc);
                    model.clear();
                }
            }

            // Scroll lock iff non-empty, reflected in the body style.
            prop_assert_eq!(stack.scroll_locked(), !stack.is_empty());
            prop_assert_eq!(
                doc.body_style().overflow == Overflow::Hidden,
                !stack.is_empty()
            );

            // Stack order matches the shadow model exactly.
            let expected: Vec<NodeId> = model.iter().map(|&i| modals[i]).collect();
            prop_assert_eq!(stack.surfaces().collect::<Vec<_>>(), expected);

            if stack.is_empty() {
                // Emptying always returns focus to the pre-nesting element.
                prop_assert_eq!(doc.active_element(), Some(trigger));
                prop_assert_eq!(doc.body_style().padding_right, 0.0);
            } else {
                // Focus is trapped somewhere at or below an open surface.
                let active = doc.active_element().expect("focus held while open");
                prop_assert!(
                    stack.surfaces().any(|s| doc.contains(s, active)),
                    "focus escaped the open surfaces"
                );
            }
        }
    }
}
