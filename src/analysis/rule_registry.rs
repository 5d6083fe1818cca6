use std::rc::Rc;

use log::debug;

use crate::analysis::rule::SyntaxRule;
use crate::walk::{Listener, ListenerRegistry};

/// Rules keyed by id, kept in registration order so listeners subscribe (and
/// therefore run) in a fixed order.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Rc<dyn SyntaxRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registering an id twice replaces the earlier rule in place
    pub fn register<R: SyntaxRule + 'static>(&mut self, rule: R) {
        let rule: Rc<dyn SyntaxRule> = Rc::new(rule);
        match self.rules.iter_mut().find(|r| r.id() == rule.id()) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<&dyn SyntaxRule> {
        self.rules
            .iter()
            .find(|r| r.id() == rule_id)
            .map(|r| r.as_ref())
    }

    pub fn get_all_rules(&self) -> Vec<&dyn SyntaxRule> {
        self.rules.iter().map(|r| r.as_ref()).collect()
    }

    /// Adds a listener for every event of every rule `is_enabled` accepts
    pub fn subscribe(
        &self,
        listeners: &mut ListenerRegistry<'_>,
        is_enabled: impl Fn(&dyn SyntaxRule) -> bool,
    ) {
        for rule in &self.rules {
            if !is_enabled(rule.as_ref()) {
                debug!("rule {} is disabled", rule.id());
                continue;
            }
            for &event in rule.events() {
                let handler = Rc::clone(rule);
                listeners.add(
                    event,
                    Listener::new(rule.id(), move |node, key, ctx| handler.check(node, key, ctx)),
                );
            }
        }
    }
}
