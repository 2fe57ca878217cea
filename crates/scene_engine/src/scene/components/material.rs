//! Material binding

use super::require;
use crate::component_base;
use crate::entity::{ComponentState, EntityComponent};
use crate::error::SceneResult;
use crate::render::{CoreBinding, CoreCapabilities, Material, MaterialVariable};

/// Material of a mesh node and the variable registered for it
///
/// The variable id doubles as the secondary sort key, so nodes sharing a
/// material draw next to each other. It is 0 while no variable is bound.
#[derive(Debug)]
pub struct MaterialComponent {
    state: ComponentState,
    material: Option<Material>,
    variable_id: u16,
}

impl MaterialComponent {
    /// Detached component without a material
    pub fn new(capabilities: CoreCapabilities) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::MATERIAL, "MaterialComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            material: None,
            variable_id: 0,
        })
    }

    /// Assigned material
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Bound material variable id, 0 when none
    pub fn variable_id(&self) -> u16 {
        self.variable_id
    }

    /// Replace the material; rebinds when attached
    pub fn set_material(&mut self, material: Option<Material>, binding: Option<&mut CoreBinding>) {
        self.material = material;
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.unbind(binding);
            self.bind(binding);
        }
    }

    fn bind(&mut self, binding: &mut CoreBinding) {
        let (Some(material), Some(effects)) = (self.material.as_ref(), binding.effects.as_ref())
        else {
            return;
        };
        let variable = effects
            .material_variables()
            .register(material, binding.technique_name());
        self.variable_id = variable.id();
        if let Some(core) = binding.core.material() {
            core.set_material_variable(Some(variable.clone()));
        }
        self.state.resources_mut().collect(variable);
    }

    fn unbind(&mut self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.material() {
            core.set_material_variable(None);
        }
        drop(self.state.resources_mut().take::<MaterialVariable>());
        self.variable_id = 0;
    }
}

impl EntityComponent<CoreBinding> for MaterialComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.bind(binding);
        true
    }

    fn on_detach(&mut self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.material() {
            core.set_material_variable(None);
        }
        self.variable_id = 0;
    }
}
