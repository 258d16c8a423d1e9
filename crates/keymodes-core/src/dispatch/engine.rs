// Keymodes Dispatcher
//
// Owns the command table, the mode registry and the prefix argument, and
// turns each key the host reads into a DispatchResult.

use std::sync::Arc;

use crate::command::{Builtin, Command, CommandError, CommandTable, Invocation};
use crate::compiler::compile;
use crate::dispatch::base::base_keymap;
use crate::dispatch::translate::{resolve_translation, Translation};
use crate::dispatch::{DefineError, DispatchError, DispatchResult};
use crate::host::Host;
use crate::mapping::{BindingTarget, KeyLookup, Keymap};
use crate::mode::{Hook, HookSpec, Mode, ModeDefinition, ModeRegistry};
use crate::prefix::{accumulate_digit, accumulate_negative, accumulate_universal, NotADigit, PrefixArg};
use crate::{Combo, KeySequence};

pub struct Dispatcher {
    commands: CommandTable,
    modes: ModeRegistry,
    base: Arc<Keymap>,
    prefix: PrefixArg,
    pending: KeySequence,
}

impl Dispatcher {
    /// Create a dispatcher with the builtin commands and the default base keymap
    pub fn new() -> Self {
        Self::with_commands(CommandTable::with_builtins())
    }

    /// Create a dispatcher over an existing command table
    pub fn with_commands(commands: CommandTable) -> Self {
        Self {
            commands,
            modes: ModeRegistry::new(),
            base: Arc::new(base_keymap()),
            prefix: PrefixArg::None,
            pending: KeySequence::new(),
        }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandTable {
        &mut self.commands
    }

    pub fn define_command(&mut self, name: impl Into<String>, command: Command) -> Result<(), CommandError> {
        self.commands.define(name, command)
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    /// The keymap every mode inherits
    pub fn base_keymap(&self) -> &Keymap {
        &self.base
    }

    pub fn prefix_arg(&self) -> PrefixArg {
        self.prefix
    }

    pub fn reset_prefix_arg(&mut self) {
        self.prefix = PrefixArg::None;
    }

    /// Keys read so far towards a multi-key binding
    pub fn pending_keys(&self) -> &KeySequence {
        &self.pending
    }

    pub fn current_status_label(&self) -> Option<&str> {
        self.modes.status_label()
    }

    /// Compile and register a mode, plus a toggle command under its name
    pub fn define_mode(&mut self, definition: ModeDefinition) -> Result<(), DefineError> {
        let name = definition.name;
        if self.modes.contains(&name) {
            return Err(DefineError::DuplicateMode(name));
        }
        if self.commands.contains(&name) {
            return Err(CommandError::AlreadyDefined(name).into());
        }

        let on_enable = self.resolve_hook(&name, "on-enable", definition.on_enable)?;
        let on_disable = self.resolve_hook(&name, "on-disable", definition.on_disable)?;
        let table = compile(&name, &definition.bindings, &mut self.commands, &self.base)?;

        self.commands.define(name.clone(), Command::ToggleMode(name.clone()))?;
        let mode = Mode::new(name.clone(), definition.label, table, on_enable, on_disable);
        if self.modes.insert(mode).is_err() {
            return Err(DefineError::DuplicateMode(name));
        }
        log::debug!("Defined mode '{}'", name);
        Ok(())
    }

    fn resolve_hook(&self, mode: &str, role: &str, spec: Option<HookSpec>) -> Result<Option<Hook>, DefineError> {
        let hook = match spec {
            None => return Ok(None),
            Some(HookSpec::Function(body)) => Hook {
                name: format!("{}/{}", mode, role),
                body,
            },
            Some(HookSpec::Command(command)) => {
                let body = self
                    .commands
                    .get(&command)
                    .and_then(Command::body)
                    .cloned()
                    .ok_or_else(|| DefineError::InvalidHook {
                        mode: mode.to_string(),
                        command: command.clone(),
                    })?;
                Hook { name: command, body }
            }
        };
        Ok(Some(hook))
    }

    /// Feed one key read by the host
    pub fn process_key(&mut self, host: &mut dyn Host, combo: Combo) -> Result<DispatchResult, DispatchError> {
        self.pending.push(combo);

        let found = match self.modes.lookup(&self.pending) {
            KeyLookup::Unbound => self.base.lookup(&self.pending),
            found => found,
        };
        let target = match found {
            KeyLookup::Prefix => {
                log::trace!("'{}' is a prefix", self.pending);
                return Ok(DispatchResult::Pending);
            }
            KeyLookup::Unbound => {
                log::trace!("'{}' is not bound in any enabled mode or the base", self.pending);
                return Ok(DispatchResult::Unhandled(self.pending.take()));
            }
            KeyLookup::Bound(target) => target.clone(),
        };

        let keys = self.pending.take();
        log::trace!("'{}' -> {}", keys, target);
        let result = match &target {
            BindingTarget::Command(name) | BindingTarget::Trampoline { name, .. } => {
                self.invoke(host, name, &keys)
            }
            BindingTarget::Translate { .. } => self.translate(host, &keys),
            BindingTarget::Keys(replacement) => Ok(self.replay(host, replacement.clone())),
        };
        self.settle(&result);
        result
    }

    /// Run a command by name, as a host's global binding would
    pub fn run_command(&mut self, host: &mut dyn Host, name: &str) -> Result<DispatchResult, DispatchError> {
        self.run_command_with_keys(host, name, &KeySequence::new())
    }

    /// Run a command by name with the keys that triggered it
    ///
    /// Digit and negative arguments read their digit from the last key.
    pub fn run_command_with_keys(
        &mut self,
        host: &mut dyn Host,
        name: &str,
        keys: &KeySequence,
    ) -> Result<DispatchResult, DispatchError> {
        let result = self.invoke(host, name, keys);
        self.settle(&result);
        result
    }

    pub fn toggle_mode(&mut self, host: &mut dyn Host, name: &str) -> Result<bool, DispatchError> {
        let enabled = self.modes.toggle(name, &KeySequence::new(), self.prefix, host);
        self.reset_prefix_arg();
        enabled
    }

    /// Turn every enabled mode off and drop any half-typed key sequence
    pub fn disable_all_modes(&mut self, host: &mut dyn Host) -> Result<(), DispatchError> {
        self.pending = KeySequence::new();
        self.modes.disable_all(&KeySequence::new(), self.prefix, host)?;
        Ok(())
    }

    fn invoke(&mut self, host: &mut dyn Host, name: &str, keys: &KeySequence) -> Result<DispatchResult, DispatchError> {
        let command = self
            .commands
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;

        match command {
            Command::Builtin(builtin) => self.run_builtin(host, builtin, keys),
            Command::ToggleMode(mode) => {
                let enabled = self.modes.toggle(&mode, keys, self.prefix, host)?;
                Ok(DispatchResult::ModeToggled { mode, enabled })
            }
            Command::Function(body) | Command::Trampoline { body, .. } => {
                log::debug!("Running '{}' with prefix {}", name, self.prefix);
                let mut invocation = Invocation::new(name, keys, self.prefix, &mut *host);
                body(&mut invocation).map_err(|source| DispatchError::CommandFailed {
                    name: name.to_string(),
                    source,
                })?;
                Ok(DispatchResult::Executed(name.to_string()))
            }
        }
    }

    fn run_builtin(
        &mut self,
        host: &mut dyn Host,
        builtin: Builtin,
        keys: &KeySequence,
    ) -> Result<DispatchResult, DispatchError> {
        match builtin {
            Builtin::UniversalArgument => Ok(self.accumulated(host, accumulate_universal(self.prefix))),
            Builtin::DigitArgument => {
                let event = keys
                    .last_combo()
                    .ok_or_else(|| NotADigit(builtin.name().to_string()))?;
                let next = accumulate_digit(self.prefix, event)?;
                Ok(self.accumulated(host, next))
            }
            Builtin::NegativeArgument => Ok(self.accumulated(host, accumulate_negative(self.prefix))),
            Builtin::DisableAllModes => {
                self.modes.disable_all(keys, self.prefix, host)?;
                self.pending = KeySequence::new();
                Ok(DispatchResult::Executed(builtin.name().to_string()))
            }
            Builtin::TranslateKey => self.translate(host, keys),
        }
    }

    fn accumulated(&mut self, host: &mut dyn Host, next: PrefixArg) -> DispatchResult {
        log::debug!("Prefix argument {} -> {}", self.prefix, next);
        self.prefix = next;
        host.preserve_prefix_state();
        DispatchResult::Accumulated(next)
    }

    fn translate(&mut self, host: &mut dyn Host, keys: &KeySequence) -> Result<DispatchResult, DispatchError> {
        match resolve_translation(&self.modes, host.global_keymap(), keys) {
            Some(Translation::Replay(replacement)) => Ok(self.replay(host, replacement)),
            Some(Translation::Run(name)) if name != Builtin::TranslateKey.name() => {
                self.invoke(host, &name, keys)
            }
            _ => {
                log::debug!("No translation for '{}', dropping it", keys);
                Ok(DispatchResult::Swallowed)
            }
        }
    }

    fn replay(&mut self, host: &mut dyn Host, replacement: KeySequence) -> DispatchResult {
        log::debug!("Replaying '{}'", replacement);
        host.push_pending_events(&replacement);
        host.preserve_prefix_state();
        DispatchResult::Replayed(replacement)
    }

    /// Reset the prefix argument unless the outcome carries it forward
    fn settle(&mut self, result: &Result<DispatchResult, DispatchError>) {
        match result {
            Ok(DispatchResult::Accumulated(_)) | Ok(DispatchResult::Replayed(_)) => {}
            _ => self.prefix = PrefixArg::None,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{BindingEntry, CompileError, InlineExpr, TargetSpec};
    use crate::config::{parse_combo_string, parse_key_sequence};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct QueueHost {
        queue: VecDeque<Combo>,
        global: Keymap,
        preserved: usize,
    }

    impl Host for QueueHost {
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
    }

    fn combo(desc: &str) -> Combo {
        parse_combo_string(desc).unwrap().into_combo()
    }

    fn nav_dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .commands_mut()
            .define_fn("next-line", |_| Ok(()))
            .unwrap();
        dispatcher
            .define_mode(
                ModeDefinition::new("nav")
                    .label("NAV")
                    .bind(BindingEntry::new("n", TargetSpec::Command("next-line".into())))
                    .bind(BindingEntry::new("j", TargetSpec::Keys("C-n".into())))
                    .bind(BindingEntry::new("C-c C-c", TargetSpec::Command("next-line".into()))),
            )
            .unwrap();
        dispatcher
    }

    #[test]
    fn test_keys_unhandled_while_no_mode_enabled() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();
        assert_eq!(
            dispatcher.process_key(&mut host, combo("n")).unwrap(),
            DispatchResult::Unhandled(parse_key_sequence("n").unwrap())
        );
    }

    #[test]
    fn test_base_bindings_apply_with_no_mode_enabled() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();

        assert_eq!(
            dispatcher.process_key(&mut host, combo("5")).unwrap(),
            DispatchResult::Accumulated(PrefixArg::Number(5))
        );
        assert_eq!(
            dispatcher.process_key(&mut host, combo("2")).unwrap(),
            DispatchResult::Accumulated(PrefixArg::Number(52))
        );
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::Number(52));

        dispatcher.reset_prefix_arg();
        assert_eq!(
            dispatcher.process_key(&mut host, combo("C-u")).unwrap(),
            DispatchResult::Accumulated(PrefixArg::Multiplier(4))
        );

        assert_eq!(dispatcher.process_key(&mut host, combo("ESC")).unwrap(), DispatchResult::Pending);
        assert_eq!(dispatcher.process_key(&mut host, combo("ESC")).unwrap(), DispatchResult::Pending);
        assert_eq!(
            dispatcher.process_key(&mut host, combo("ESC")).unwrap(),
            DispatchResult::Executed("disable-all-modes".into())
        );
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::None);
    }

    #[test]
    fn test_failed_definition_leaves_commands_unchanged() {
        let mut dispatcher = Dispatcher::new();
        let before = dispatcher.commands().len();
        let result = dispatcher.define_mode(
            ModeDefinition::new("ed")
                .bind(BindingEntry::new("a", TargetSpec::Inline(InlineExpr::new("kill line", |_| Ok(())))))
                .bind(BindingEntry::new("b", TargetSpec::Inline(InlineExpr::new("kill-line", |_| Ok(()))))),
        );
        assert!(matches!(
            result,
            Err(DefineError::Compile(CompileError::NameCollision { .. }))
        ));
        assert_eq!(dispatcher.commands().len(), before);
        assert!(!dispatcher.commands().contains("ed/kill-line"));
        assert!(!dispatcher.commands().contains("ed"));

        dispatcher
            .define_mode(
                ModeDefinition::new("ed")
                    .bind(BindingEntry::new("b", TargetSpec::Inline(InlineExpr::new("kill-line", |_| Ok(()))))),
            )
            .unwrap();
        assert!(dispatcher.commands().contains("ed/kill-line"));
    }

    #[test]
    fn test_mode_name_is_a_toggle_command() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();
        assert_eq!(
            dispatcher.run_command(&mut host, "nav").unwrap(),
            DispatchResult::ModeToggled {
                mode: "nav".into(),
                enabled: true
            }
        );
        assert_eq!(dispatcher.current_status_label(), Some("NAV"));
    }

    #[test]
    fn test_multi_key_binding_is_pending_then_executes() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();
        dispatcher.toggle_mode(&mut host, "nav").unwrap();

        assert_eq!(
            dispatcher.process_key(&mut host, combo("C-c")).unwrap(),
            DispatchResult::Pending
        );
        assert_eq!(dispatcher.pending_keys().len(), 1);
        assert_eq!(
            dispatcher.process_key(&mut host, combo("C-c")).unwrap(),
            DispatchResult::Executed("next-line".into())
        );
        assert!(dispatcher.pending_keys().is_empty());
    }

    #[test]
    fn test_prefix_reset_after_command() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();
        dispatcher.toggle_mode(&mut host, "nav").unwrap();

        dispatcher.process_key(&mut host, combo("C-u")).unwrap();
        dispatcher.process_key(&mut host, combo("u")).unwrap();
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::Multiplier(16));
        assert_eq!(host.preserved, 2);

        dispatcher.process_key(&mut host, combo("n")).unwrap();
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::None);
    }

    #[test]
    fn test_replay_queues_keys_and_keeps_prefix() {
        let mut dispatcher = nav_dispatcher();
        let mut host = QueueHost::default();
        dispatcher.toggle_mode(&mut host, "nav").unwrap();
        host.queue.push_back(combo("x"));

        dispatcher.process_key(&mut host, combo("4")).unwrap();
        let result = dispatcher.process_key(&mut host, combo("j")).unwrap();

        assert_eq!(result, DispatchResult::Replayed(parse_key_sequence("C-n").unwrap()));
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::Number(4));
        assert_eq!(host.queue.front(), Some(&combo("C-n")));
        assert_eq!(host.queue.len(), 2);
    }

    #[test]
    fn test_define_mode_rejects_duplicates() {
        let mut dispatcher = nav_dispatcher();
        assert!(matches!(
            dispatcher.define_mode(ModeDefinition::new("nav")),
            Err(DefineError::DuplicateMode(_))
        ));
        assert!(matches!(
            dispatcher.define_mode(ModeDefinition::new("next-line")),
            Err(DefineError::Command(CommandError::AlreadyDefined(_)))
        ));
    }

    #[test]
    fn test_hook_must_be_a_host_command() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.define_mode(
            ModeDefinition::new("nav").on_enable(HookSpec::Command("universal-argument".into())),
        );
        assert!(matches!(result, Err(DefineError::InvalidHook { .. })));
        assert!(!dispatcher.commands().contains("nav"));
    }

    #[test]
    fn test_failing_command_resets_prefix() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .commands_mut()
            .define_fn("explode", |_| Err(anyhow::anyhow!("boom")))
            .unwrap();
        dispatcher
            .define_mode(
                ModeDefinition::new("m").bind(BindingEntry::new("x", TargetSpec::Command("explode".into()))),
            )
            .unwrap();
        let mut host = QueueHost::default();
        dispatcher.toggle_mode(&mut host, "m").unwrap();

        dispatcher.process_key(&mut host, combo("5")).unwrap();
        let err = dispatcher.process_key(&mut host, combo("x")).unwrap_err();
        assert!(matches!(err, DispatchError::CommandFailed { ref name, .. } if name == "explode"));
        assert_eq!(dispatcher.prefix_arg(), PrefixArg::None);
    }

    #[test]
    fn test_digit_argument_without_keys() {
        let mut dispatcher = Dispatcher::new();
        let mut host = QueueHost::default();
        assert!(matches!(
            dispatcher.run_command(&mut host, "digit-argument"),
            Err(DispatchError::NotADigit(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        let mut dispatcher = Dispatcher::new();
        let mut host = QueueHost::default();
        assert!(matches!(
            dispatcher.run_command(&mut host, "nope"),
            Err(DispatchError::UnknownCommand(_))
        ));
    }
}
