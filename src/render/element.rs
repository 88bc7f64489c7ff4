//! Component-tree descriptors: components, props and elements

use crate::dom::{Lifecycle, LifecycleContext};
use crate::error::EngineError;
use crate::hooks::context::ContextEntry;
use crate::types::PropertySnapshot;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Component body: receives its props, returns the elements it renders
pub type RenderFn = dyn Fn(&Props) -> Result<Vec<Element>, EngineError> + Send + Sync;

/// A named component function
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> Result<Vec<Element>, EngineError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            render: Arc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create an element of this component
    pub fn element(&self, props: Props) -> Element {
        Element {
            kind: ElementKind::Component(self.clone()),
            props,
        }
    }

    pub(crate) fn call(&self, props: &Props) -> Result<Vec<Element>, EngineError> {
        (self.render)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

/// Component input properties
///
/// Besides plain values, props carry an optional reconciliation key, the component's
/// lifecycle callbacks, and the child elements passed to it.
#[derive(Clone, Default)]
pub struct Props {
    values: BTreeMap<String, Value>,
    key: Option<String>,
    lifecycle: Lifecycle,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn on_deploy<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LifecycleContext) + Send + Sync + 'static,
    {
        self.lifecycle.on_deploy = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LifecycleContext) + Send + Sync + 'static,
    {
        self.lifecycle.on_error = Some(Arc::new(callback));
        self
    }

    pub fn on_destroy<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LifecycleContext) + Send + Sync + 'static,
    {
        self.lifecycle.on_destroy = Some(Arc::new(callback));
        self
    }

    /// Value of a prop; missing props are `Undefined`
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn explicit_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Property snapshot with undefined and unresolved values removed
    pub fn snapshot(&self) -> PropertySnapshot {
        self.values
            .iter()
            .filter_map(|(k, v)| v.to_snapshot().map(|json| (k.clone(), json)))
            .collect()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.values)
            .field("key", &self.key)
            .field("children", &self.children.len())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) enum ElementKind {
    Component(Component),
    Provider(ContextEntry),
}

/// One node of the component-tree descriptor
#[derive(Clone)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) props: Props,
}

impl Element {
    pub(crate) fn provider(entry: ContextEntry, children: Vec<Element>) -> Self {
        Self {
            kind: ElementKind::Provider(entry),
            props: Props::new().children(children),
        }
    }

    /// Component name (providers are named `Provider`)
    pub fn name(&self) -> &str {
        match &self.kind {
            ElementKind::Component(c) => c.name(),
            ElementKind::Provider(_) => "Provider",
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.props.explicit_key()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("props", &self.props)
            .finish()
    }
}
