//! Post effects applied from attribute text

use crate::component_base;
use crate::entity::{ComponentState, EntityComponent};
use crate::error::SceneResult;
use crate::render::{CoreBinding, EffectAttributes};
use std::collections::{BTreeMap, BTreeSet};

/// Applies effects parsed from text such as `xray[color:#FF0000]; glow`
/// to a node's effect table and remembers which names it added.
#[derive(Debug, Default)]
pub struct PostEffectComponent {
    state: ComponentState,
    text: String,
    applied: BTreeSet<String>,
}

impl PostEffectComponent {
    /// Component with no effects
    pub fn new() -> Self {
        Self::default()
    }

    /// Text last applied
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Effect names this component added
    pub fn applied(&self) -> impl Iterator<Item = &str> {
        self.applied.iter().map(String::as_str)
    }

    /// Replace the effects added by this component
    ///
    /// The text is parsed before anything changes; a parse error leaves the
    /// table untouched. Effects already present under the same name are kept.
    pub fn set_text(
        &mut self,
        text: &str,
        effects: &mut BTreeMap<String, EffectAttributes>,
    ) -> SceneResult<()> {
        let parsed = EffectAttributes::parse_list(text)?;
        self.clear(effects);
        for attributes in parsed {
            let name = attributes.name().to_string();
            if effects.contains_key(&name) {
                continue;
            }
            effects.insert(name.clone(), attributes);
            self.applied.insert(name);
        }
        self.text = text.to_string();
        Ok(())
    }

    /// Remove every effect this component added
    pub fn clear(&mut self, effects: &mut BTreeMap<String, EffectAttributes>) {
        for name in std::mem::take(&mut self.applied) {
            effects.remove(&name);
        }
        self.text.clear();
    }
}

impl EntityComponent<CoreBinding> for PostEffectComponent {
    component_base!();
}
