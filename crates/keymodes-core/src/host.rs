// Keymodes Host Trait
//
// This module defines the interface to the embedding application:
// its pending-input queue, its transient-state reset and its global keymap.

use crate::mapping::Keymap;
use crate::KeySequence;

/// The application that owns the event loop
///
/// The dispatcher never reads keys itself. The host feeds it one combo at
/// a time and acts on the returned `DispatchResult`.
pub trait Host {
    /// Queue events to be read before any newly typed key
    ///
    /// The events go in front of anything already pending, in order.
    fn push_pending_events(&mut self, events: &KeySequence);

    /// Keep per-command transient state (the prefix argument) alive
    /// for the next command
    fn preserve_prefix_state(&mut self);

    /// The host's own global bindings
    fn global_keymap(&self) -> &Keymap;

    /// Called whenever the status label changes
    ///
    /// Status-line renderers that prefer polling can ignore this and
    /// read `Dispatcher::current_status_label` instead.
    fn status_label_changed(&mut self, _label: Option<&str>) {}
}
