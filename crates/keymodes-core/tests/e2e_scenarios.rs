// Keymodes End-to-End Test Scenarios
//
// These tests drive the dispatcher the way an editor's command loop would:
// keys are read from a queue, replays are pushed back onto its front, and
// keys no mode claims fall through to the host's global keymap.
//
// Run with: cargo test --test e2e_scenarios

use std::collections::VecDeque;
use std::sync::Arc;

use keymodes_core::{
    parse_combo_string, parse_key_sequence, BindingEntry, BindingTarget, Combo, DispatchResult,
    Dispatcher, Host, InlineExpr, KeySequence, Keymap, ModeDefinition, PrefixArg, TargetSpec,
};
use parking_lot::Mutex;

// =========================================================================
// Test Helpers
// =========================================================================

type CallLog = Arc<Mutex<Vec<(String, i64)>>>;

struct EditorHost {
    queue: VecDeque<Combo>,
    global: Keymap,
    labels: Vec<Option<String>>,
    preserved: usize,
    self_inserted: Vec<KeySequence>,
}

impl EditorHost {
    fn new(global: &[(&str, &str)]) -> Self {
        let mut keymap = Keymap::new("global");
        for (desc, command) in global {
            keymap.insert(keys(desc), BindingTarget::Command(command.to_string()));
        }
        Self {
            queue: VecDeque::new(),
            global: keymap,
            labels: Vec::new(),
            preserved: 0,
            self_inserted: Vec::new(),
        }
    }
}

impl Host for EditorHost {
    fn push_pending_events(&mut self, events: &KeySequence) {
        for combo in events.iter().rev() {
            self.queue.push_front(combo.clone());
        }
    }

    fn preserve_prefix_state(&mut self) {
        self.preserved += 1;
    }

    fn global_keymap(&self) -> &Keymap {
        &self.global
    }

    fn status_label_changed(&mut self, label: Option<&str>) {
        self.labels.push(label.map(String::from));
    }
}

fn keys(desc: &str) -> KeySequence {
    parse_key_sequence(desc).unwrap()
}

fn combo(desc: &str) -> Combo {
    parse_combo_string(desc).unwrap().into_combo()
}

/// Define host commands that record their name and prefix value
fn define_recorded(dispatcher: &mut Dispatcher, names: &[&str]) -> CallLog {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    for name in names {
        let log = Arc::clone(&log);
        dispatcher
            .commands_mut()
            .define_fn(*name, move |invocation| {
                log.lock()
                    .push((invocation.name().to_string(), invocation.prefix_value()));
                Ok(())
            })
            .unwrap();
    }
    log
}

/// Type a key description and run the host loop until the queue drains
fn type_keys(dispatcher: &mut Dispatcher, host: &mut EditorHost, desc: &str) -> Vec<DispatchResult> {
    host.queue.extend(keys(desc).iter().cloned());
    let mut results = Vec::new();
    while let Some(next) = host.queue.pop_front() {
        let result = dispatcher.process_key(host, next).unwrap();
        if let DispatchResult::Unhandled(unhandled) = &result {
            match host.global.get(unhandled).and_then(|t| t.command_name()).map(String::from) {
                Some(command) => {
                    results.push(dispatcher.run_command(host, &command).unwrap());
                    continue;
                }
                None => host.self_inserted.push(unhandled.clone()),
            }
        }
        results.push(result);
    }
    results
}

fn navigation_setup() -> (Dispatcher, EditorHost, CallLog) {
    let mut dispatcher = Dispatcher::new();
    let log = define_recorded(
        &mut dispatcher,
        &["next-line", "previous-line", "forward-char", "delete-char"],
    );
    let trampoline_log = Arc::clone(&log);
    dispatcher
        .define_mode(
            ModeDefinition::new("nav")
                .label("NAV")
                .bind(BindingEntry::new("j", TargetSpec::Keys("C-n".into())))
                .bind(BindingEntry::new("k", TargetSpec::Keys("C-p".into())))
                .bind(BindingEntry::new(
                    "d",
                    TargetSpec::Inline(InlineExpr::new("(delete-char arg)", move |invocation| {
                        trampoline_log
                            .lock()
                            .push((invocation.name().to_string(), invocation.prefix_value()));
                        Ok(())
                    })),
                ))
                .bind(BindingEntry::new(
                    "x",
                    TargetSpec::Run(vec!["forward-char".into(), "delete-char".into()]),
                )),
        )
        .unwrap();
    let host = EditorHost::new(&[
        ("C-n", "next-line"),
        ("C-p", "previous-line"),
        ("F2", "nav"),
    ]);
    (dispatcher, host, log)
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_translate_replays_exactly_once() {
    let (mut dispatcher, mut host, log) = navigation_setup();
    type_keys(&mut dispatcher, &mut host, "F2");

    let results = type_keys(&mut dispatcher, &mut host, "j");
    assert_eq!(results[0], DispatchResult::Replayed(keys("C-n")));
    assert_eq!(*log.lock(), vec![("next-line".to_string(), 1)]);
}

#[test]
fn test_translate_carries_prefix_to_replayed_command() {
    let (mut dispatcher, mut host, log) = navigation_setup();
    type_keys(&mut dispatcher, &mut host, "F2");

    type_keys(&mut dispatcher, &mut host, "4 k");
    assert_eq!(*log.lock(), vec![("previous-line".to_string(), 4)]);
    assert_eq!(dispatcher.prefix_arg(), PrefixArg::None);
}

#[test]
fn test_prefix_then_inline_expression() {
    let (mut dispatcher, mut host, log) = navigation_setup();
    type_keys(&mut dispatcher, &mut host, "F2");

    let results = type_keys(&mut dispatcher, &mut host, "3 d");
    assert_eq!(
        results,
        vec![
            DispatchResult::Accumulated(PrefixArg::Number(3)),
            DispatchResult::Executed("nav/delete-char-arg".into()),
        ]
    );
    assert_eq!(*log.lock(), vec![("nav/delete-char-arg".to_string(), 3)]);
}

#[test]
fn test_universal_argument_chain() {
    let (mut dispatcher, mut host, log) = navigation_setup();
    type_keys(&mut dispatcher, &mut host, "F2");

    type_keys(&mut dispatcher, &mut host, "C-u u d");
    type_keys(&mut dispatcher, &mut host, "- 1 2 d");
    assert_eq!(
        *log.lock(),
        vec![
            ("nav/delete-char-arg".to_string(), 16),
            ("nav/delete-char-arg".to_string(), -12),
        ]
    );
}

#[test]
fn test_run_list_invokes_each_command_in_order() {
    let (mut dispatcher, mut host, log) = navigation_setup();
    type_keys(&mut dispatcher, &mut host, "F2");

    type_keys(&mut dispatcher, &mut host, "2 x");
    assert_eq!(
        *log.lock(),
        vec![
            ("nav/forward-char-delete-char".to_string(), 2),
            ("nav/forward-char-delete-char".to_string(), 2),
        ]
    );
}

#[test]
fn test_escape_sequence_disables_every_mode() {
    let (mut dispatcher, mut host, _log) = navigation_setup();
    dispatcher
        .define_mode(ModeDefinition::new("extra").label("EXTRA"))
        .unwrap();
    type_keys(&mut dispatcher, &mut host, "F2");
    dispatcher.toggle_mode(&mut host, "extra").unwrap();
    assert_eq!(dispatcher.current_status_label(), Some("EXTRA"));

    let results = type_keys(&mut dispatcher, &mut host, "ESC ESC ESC");
    assert_eq!(
        results,
        vec![
            DispatchResult::Pending,
            DispatchResult::Pending,
            DispatchResult::Executed("disable-all-modes".into()),
        ]
    );
    assert_eq!(dispatcher.modes().enabled().count(), 0);
    assert_eq!(dispatcher.current_status_label(), None);

    // Mode keys fall through to the host once nothing is enabled
    type_keys(&mut dispatcher, &mut host, "j");
    assert_eq!(host.self_inserted, vec![keys("j")]);
}

#[test]
fn test_status_label_follows_last_transition() {
    let (mut dispatcher, mut host, _log) = navigation_setup();
    dispatcher
        .define_mode(ModeDefinition::new("insert").label("INS"))
        .unwrap();

    type_keys(&mut dispatcher, &mut host, "F2");
    dispatcher.toggle_mode(&mut host, "insert").unwrap();
    assert_eq!(dispatcher.current_status_label(), Some("INS"));

    // Disabling clears the label even though "nav" is still on
    dispatcher.toggle_mode(&mut host, "insert").unwrap();
    assert_eq!(dispatcher.current_status_label(), None);
    assert!(dispatcher.modes().is_enabled("nav"));
    assert_eq!(
        host.labels,
        vec![Some("NAV".to_string()), Some("INS".to_string()), None]
    );
}

#[test]
fn test_unresolved_translation_is_swallowed() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .define_mode(ModeDefinition::new("m").bind(BindingEntry::new(
            "q",
            TargetSpec::Command("translate-key".into()),
        )))
        .unwrap();
    let mut host = EditorHost::new(&[]);
    dispatcher.toggle_mode(&mut host, "m").unwrap();

    let results = type_keys(&mut dispatcher, &mut host, "5 q");
    assert_eq!(results[1], DispatchResult::Swallowed);
    assert!(host.queue.is_empty());
    assert_eq!(dispatcher.prefix_arg(), PrefixArg::None);
}

#[test]
fn test_translation_falls_back_to_global_keymap() {
    let mut dispatcher = Dispatcher::new();
    let log = define_recorded(&mut dispatcher, &["save-buffer"]);
    dispatcher
        .define_mode(ModeDefinition::new("m").bind(BindingEntry::new(
            "s",
            TargetSpec::Command("translate-key".into()),
        )))
        .unwrap();
    let mut host = EditorHost::new(&[]);
    host.global.insert(
        keys("s").prefixed(keymodes_core::Key::TRANSLATE),
        BindingTarget::Command("save-buffer".into()),
    );
    dispatcher.toggle_mode(&mut host, "m").unwrap();

    let results = type_keys(&mut dispatcher, &mut host, "s");
    assert_eq!(results, vec![DispatchResult::Executed("save-buffer".into())]);
    assert_eq!(*log.lock(), vec![("save-buffer".to_string(), 1)]);
}
