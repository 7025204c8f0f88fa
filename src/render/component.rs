//! Component definitions, instances and the renderer.
//!
//! # Responsibilities
//! - Hold the immutable name → render function registry
//! - Create a fresh instance (token, props, local state) per render call
//! - Normalize the output to one stamped root and run deferred effects
//!
//! # Design Decisions
//! - Instances live only for the duration of one render
//! - Nested components render through the same registry, so every
//!   nested fragment carries its own identity
//! - Stylesheet references bubble up from children to the parent result

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::observability::metrics;
use crate::render::fragment::{normalize, Stamp};
use crate::render::identity::{IdentityRegistry, InstanceId};

/// Props passed to a render function.
pub type Props = Map<String, Value>;

/// A type-erased render function.
pub type RenderFn = Arc<dyn Fn(&mut RenderScope<'_>) -> Result<String, AppError> + Send + Sync>;

type EffectFn = Box<dyn FnOnce(&Rendered) + Send>;

/// A registered component: a unique name and its render function.
#[derive(Clone)]
pub struct ComponentDefinition {
    name: String,
    render: RenderFn,
}

impl ComponentDefinition {
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut RenderScope<'_>) -> Result<String, AppError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A deferred effect recorded during render.
pub struct Effect {
    dependencies: Vec<Value>,
    run: EffectFn,
}

/// Per-render state of one component.
pub struct ComponentInstance {
    id: InstanceId,
    props: Props,
    state: Map<String, Value>,
    effects: Vec<Effect>,
    stylesheets: Vec<String>,
}

impl ComponentInstance {
    fn new(id: InstanceId, props: Props) -> Self {
        Self {
            id,
            props,
            state: Map::new(),
            effects: Vec::new(),
            stylesheets: Vec::new(),
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }
}

/// The handle a render function receives.
pub struct RenderScope<'a> {
    instance: &'a mut ComponentInstance,
    renderer: &'a ComponentRenderer,
}

impl RenderScope<'_> {
    pub fn id(&self) -> &InstanceId {
        &self.instance.id
    }

    pub fn props(&self) -> &Props {
        &self.instance.props
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.instance.props.get(key)
    }

    /// String prop with a fallback. Non-string values use their JSON text.
    pub fn prop_str(&self, key: &str, default: &str) -> String {
        match self.instance.props.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.instance.state
    }

    /// Merge `update` into the instance's local state.
    pub fn set_state(&mut self, update: Map<String, Value>) {
        self.instance.state.extend(update);
    }

    /// Record an effect to run once the fragment has been normalized.
    pub fn use_effect<F>(&mut self, dependencies: Vec<Value>, effect: F)
    where
        F: FnOnce(&Rendered) + Send + 'static,
    {
        self.instance.effects.push(Effect {
            dependencies,
            run: Box::new(effect),
        });
    }

    /// Attach a stylesheet, relative to the static directory.
    pub fn add_stylesheet(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.instance.stylesheets.contains(&path) {
            self.instance.stylesheets.push(path);
        }
    }

    /// Render a nested component and return its stamped markup.
    pub fn render_child(&mut self, name: &str, props: Props) -> Result<String, AppError> {
        let child = self.renderer.render(name, props)?;
        for sheet in child.stylesheets {
            self.add_stylesheet(sheet);
        }
        Ok(child.markup)
    }
}

/// Output of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub markup: String,
    pub instance_id: InstanceId,
    pub stylesheets: Vec<String>,
    /// True when the render output needed a synthetic wrapper.
    pub wrapped: bool,
}

/// Component registry plus identity issuance.
#[derive(Debug, Default)]
pub struct ComponentRenderer {
    components: HashMap<String, ComponentDefinition>,
    identities: IdentityRegistry,
}

impl ComponentRenderer {
    pub fn new(components: HashMap<String, ComponentDefinition>) -> Self {
        Self {
            components,
            identities: IdentityRegistry::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Render a registered component by name.
    pub fn render(&self, name: &str, props: Props) -> Result<Rendered, AppError> {
        let definition = self
            .components
            .get(name)
            .ok_or_else(|| AppError::UnknownComponent(name.to_string()))?;
        self.render_definition(definition, props)
    }

    /// Render a definition: fresh token, invoke, normalize, run effects.
    pub fn render_definition(
        &self,
        definition: &ComponentDefinition,
        props: Props,
    ) -> Result<Rendered, AppError> {
        let mut instance = ComponentInstance::new(self.identities.issue(), props);

        let raw = {
            let mut scope = RenderScope {
                instance: &mut instance,
                renderer: self,
            };
            (definition.render)(&mut scope)?
        };

        let normalized = normalize(
            &raw,
            Stamp {
                component: definition.name(),
                instance: instance.id.as_str(),
            },
        );

        let ComponentInstance {
            id,
            effects,
            stylesheets,
            ..
        } = instance;

        let rendered = Rendered {
            markup: normalized.markup,
            instance_id: id,
            stylesheets,
            wrapped: normalized.wrapped,
        };

        tracing::trace!(
            component = %definition.name(),
            instance = %rendered.instance_id,
            wrapped = rendered.wrapped,
            effects = effects.len(),
            "Component rendered"
        );
        metrics::record_render(definition.name());

        for effect in effects {
            tracing::trace!(dependencies = ?effect.dependencies, "Running deferred effect");
            (effect.run)(&rendered);
        }

        Ok(rendered)
    }
}
